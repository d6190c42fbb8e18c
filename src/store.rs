//! Panel state: diagnostics fetched from the page plus interface state.
//!
//! All changes go through [`Command`]s, applied strictly in dispatch order as
//! whole-value replacements.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::snapshot::{EventLogEntry, SerializedNode, StateValue};

/// Content shown in the left pane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Vdom,
    Logs,
    Store,
    Messages,
}

impl View {
    pub const ALL: [Self; 4] = [Self::Vdom, Self::Logs, Self::Store, Self::Messages];

    pub const fn title(self) -> &'static str {
        match self {
            Self::Vdom => "Last Render",
            Self::Logs => "Event Log",
            Self::Store => "Store State",
            Self::Messages => "Diagnostic Messages",
        }
    }

    /// Label of the toolbar button that switches to this view.
    pub const fn button_label(self) -> &'static str {
        match self {
            Self::Vdom => "Display Last Render",
            Self::Logs => "Display Event Logs",
            Self::Store => "Display Store State",
            Self::Messages => "Display Messages",
        }
    }
}

/// Data fetched from the page's diagnostics API.
///
/// Snapshots are shared by reference so root changes can be detected by identity.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    pub event_log: Option<Arc<Vec<EventLogEntry>>>,
    pub projectors: Vec<String>,
    pub last_render: Option<Arc<SerializedNode>>,
    pub stores: Vec<String>,
    pub store_state: Option<Arc<StateValue>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterfaceState {
    pub active_index: usize,
    pub api_version: Option<String>,
    pub highlight_invalidations: bool,
    pub selected_dnode: Option<String>,
    pub selected_event_id: Option<usize>,
    pub selected_message: Option<usize>,
    pub selected_state_node: Option<String>,
    pub view: Option<View>,
}

#[derive(Clone, Debug)]
pub enum Command {
    SetApiVersion(Option<String>),
    SetActiveIndex(usize),
    SetEventLog(Option<Arc<Vec<EventLogEntry>>>),
    SetHighlightInvalidations(bool),
    SetProjectors(Vec<String>),
    SetRender(Option<Arc<SerializedNode>>),
    SetStores(Vec<String>),
    SetStoreState(Option<Arc<StateValue>>),
    SetSelectedDNode(Option<String>),
    SetSelectedEventId(Option<usize>),
    SetSelectedMessage(Option<usize>),
    SetSelectedStateNode(Option<String>),
    SetView(Option<View>),
}

impl Command {
    const fn name(&self) -> &'static str {
        match self {
            Self::SetApiVersion(_) => "set_api_version",
            Self::SetActiveIndex(_) => "set_active_index",
            Self::SetEventLog(_) => "set_event_log",
            Self::SetHighlightInvalidations(_) => "set_highlight_invalidations",
            Self::SetProjectors(_) => "set_projectors",
            Self::SetRender(_) => "set_render",
            Self::SetStores(_) => "set_stores",
            Self::SetStoreState(_) => "set_store_state",
            Self::SetSelectedDNode(_) => "set_selected_dnode",
            Self::SetSelectedEventId(_) => "set_selected_event_id",
            Self::SetSelectedMessage(_) => "set_selected_message",
            Self::SetSelectedStateNode(_) => "set_selected_state_node",
            Self::SetView(_) => "set_view",
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    diagnostics: Diagnostics,
    interface: InterfaceState,
    revision: u64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub const fn interface(&self) -> &InterfaceState {
        &self.interface
    }

    /// Number of commands applied so far.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub fn dispatch(&mut self, command: Command) {
        tracing::trace!(command = command.name(), revision = self.revision, "applying command");
        let diagnostics = &mut self.diagnostics;
        let interface = &mut self.interface;
        match command {
            Command::SetApiVersion(version) => interface.api_version = version,
            Command::SetActiveIndex(index) => interface.active_index = index,
            Command::SetEventLog(log) => diagnostics.event_log = log,
            Command::SetHighlightInvalidations(enabled) => {
                interface.highlight_invalidations = enabled;
            }
            Command::SetProjectors(projectors) => diagnostics.projectors = projectors,
            Command::SetRender(render) => diagnostics.last_render = render,
            Command::SetStores(stores) => diagnostics.stores = stores,
            Command::SetStoreState(state) => diagnostics.store_state = state,
            Command::SetSelectedDNode(path) => interface.selected_dnode = path,
            Command::SetSelectedEventId(id) => interface.selected_event_id = id,
            Command::SetSelectedMessage(index) => interface.selected_message = index,
            Command::SetSelectedStateNode(path) => interface.selected_state_node = path,
            Command::SetView(view) => interface.view = view,
        }
        self.revision += 1;
    }

    pub fn dispatch_all(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.dispatch(command);
        }
    }
}
