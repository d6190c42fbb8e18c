pub use crate::{
    Bridge, DevTool, DevToolView, DiagnosticQuery, EvalResponse, ExpansionState, GlyphSet,
    InspectedWindow, InspectorConfig, InspectorError, ItemLabelRenderer, ItemTree, PanelAction,
    PushMessage, Screen, SerializedNode, StateValue, TabId, TreeAction, TreeEvent, TreeGlyphs,
    TreeItem, TreeLabelRenderer, TreeListView, TreeModel, TreeRowContext, TreeScrollPolicy,
    TreeViewState, TreeViewStyle, View, materialize, materialize_state,
};

#[cfg(feature = "keymap")]
pub use crate::{KeymapProfile, TreeKeyBindings};
