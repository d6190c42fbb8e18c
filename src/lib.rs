//! Terminal inspector for a UI framework's runtime diagnostics, built on ratatui.
//!
//! The panel shows the last rendered virtual-DOM tree, the event log and store
//! state of an inspected page, plus the messages its diagnostics channel
//! pushes for the inspected tab. Snapshots are turned into trees whose items are
//! addressed by structural paths (`/0/2/1`) and materialized lazily, one level
//! per expansion. Queries to the page go through a [`Bridge`] that fences
//! out-of-order responses.
//!
//! Feature flags:
//! - `keymap`: crossterm-based key bindings, `TreeViewState::handle_key*` and
//!   `DevTool::handle_key`.

mod action;
pub mod bridge;
pub mod channel;
pub mod config;
mod context;
pub mod error;
pub mod event_log;
mod glyphs;
#[cfg(feature = "keymap")]
mod keymap;
pub mod materialize;
mod model;
pub mod panel;
pub mod path;
pub mod prelude;
pub mod properties;
pub mod snapshot;
mod state;
pub mod store;
mod style;
pub mod tracker;
mod tree;
mod widget;

pub use action::{TreeAction, TreeEvent};
pub use bridge::{
    Bridge, DiagnosticQuery, EvalResponse, ExceptionInfo, InspectedWindow, RecordingWindow,
    Ticket,
};
pub use channel::{MessageLog, MessageLogView, PushMessage, TabId};
pub use config::InspectorConfig;
pub use context::TreeRowContext;
pub use error::{InspectorError, Result};
pub use event_log::{EventLogState, EventLogView};
pub use glyphs::{GlyphSet, ItemLabelRenderer, TreeGlyphs, TreeLabelRenderer, tree_prefix_spans};
#[cfg(feature = "keymap")]
pub use keymap::{KeymapProfile, TreeKeyBindings};
pub use materialize::{
    Children, EmbeddedJson, IconClass, ItemLabel, TreeItem, materialize, materialize_at,
    materialize_state,
};
pub use model::TreeModel;
pub use panel::{DevTool, DevToolView, PanelAction, PanelState, Screen};
pub use properties::{PropertyKey, PropertyListState, PropertyListView, PropertyRow};
pub use snapshot::{EventLogEntry, SerializedNode, StateValue};
pub use state::TreeViewState;
pub use store::{Command, Diagnostics, InterfaceState, Store, View};
pub use style::{KindPalette, TreeScrollPolicy, TreeViewStyle};
pub use tracker::{ExpansionState, RootTracker, SelectionState};
pub use tree::{ItemTree, NodeId};
pub use widget::TreeListView;
