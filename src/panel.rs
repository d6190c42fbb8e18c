//! The inspector panel: coordinates the store, the bridge and the per-view tree state.

use std::sync::Arc;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::prelude::Buffer;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, StatefulWidget, TableState, Tabs, Widget};
use serde_json::{Map, Value};

use crate::action::{TreeAction, TreeEvent};
use crate::bridge::{Bridge, DiagnosticQuery, EvalResponse, InspectedWindow, Settled, Ticket};
use crate::channel::{
    HIGHLIGHT_INVALIDATIONS_LABEL, MessageLog, MessageLogView, PushMessage, TabId,
};
use crate::config::InspectorConfig;
use crate::error::{InspectorError, Result};
use crate::event_log::{EventLogState, EventLogView};
use crate::glyphs::{ItemLabelRenderer, TreeGlyphs};
use crate::model::TreeModel;
use crate::path::find_vdom;
use crate::properties::{PropertyKey, PropertyListState, PropertyListView, key_properties};
use crate::snapshot::{EventLogEntry, SerializedNode, StateValue};
use crate::state::TreeViewState;
use crate::store::{Command, Store, View};
use crate::style::TreeViewStyle;
use crate::tracker::RootTracker;
use crate::tree::{ItemTree, NodeId};
use crate::widget::TreeListView;

#[cfg(feature = "keymap")]
use crate::keymap::TreeKeyBindings;
#[cfg(feature = "keymap")]
use crossterm::event::{KeyCode, KeyEvent};

pub const NO_API_BANNER: &str = "No diagnostics detected";
pub const DEFAULT_TITLE: &str = "Development Tool";
pub const PROPERTIES_TAB: &str = "Properties";

/// User-level panel commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelAction {
    Show(View),
    /// Re-check for the diagnostics API.
    Refresh,
    /// Move keyboard focus between the left pane and the properties list.
    SwitchFocus,
    ToggleInvalidationHighlight,
    Quit,
}

impl PanelAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Show(view) => view.button_label(),
            Self::Refresh => "Refresh",
            Self::SwitchFocus => "Switch Focus",
            Self::ToggleInvalidationHighlight => HIGHLIGHT_INVALIDATIONS_LABEL,
            Self::Quit => "Quit",
        }
    }
}

/// What the panel shows: the fallback banner, or the full interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen<'a> {
    NoApi {
        banner: &'static str,
        actions: Vec<PanelAction>,
    },
    Full {
        view: Option<View>,
        title: &'static str,
        api_version: &'a str,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Tree,
    Properties,
}

/// A lazily materialized tree plus its view state and root identity.
struct TreeSlot<R> {
    tree: ItemTree,
    view: TreeViewState<NodeId>,
    root: RootTracker<R>,
}

impl<R> TreeSlot<R> {
    fn new(config: &InspectorConfig) -> Self {
        let mut view = TreeViewState::new();
        view.set_draw_lines(config.draw_lines);
        #[cfg(feature = "keymap")]
        view.keymap_mut().set_profile(config.keymap);
        Self {
            tree: ItemTree::new(),
            view,
            root: RootTracker::default(),
        }
    }

    /// Rebuilds the tree when `root` is a different reference than last time.
    fn observe(&mut self, root: Option<&Arc<R>>, build: impl FnOnce(&R) -> ItemTree) -> bool {
        if !self.root.observe(root) {
            return false;
        }
        tracing::debug!(had_expansion = !self.view.expansion().is_empty(), "snapshot root changed");
        self.tree = root.map_or_else(ItemTree::new, |root| build(root.as_ref()));
        self.view.on_root_changed();
        self.view.sync(&mut self.tree);
        true
    }
}

/// Everything the panel renders, separate from the transport.
pub struct PanelState {
    store: Store,
    config: InspectorConfig,
    vdom: TreeSlot<SerializedNode>,
    state: TreeSlot<StateValue>,
    events: EventLogState,
    messages: MessageLog,
    message_table: TableState,
    properties: PropertyListState,
    focus: Focus,
}

impl PanelState {
    fn new(config: InspectorConfig) -> Self {
        Self {
            store: Store::new(),
            vdom: TreeSlot::new(&config),
            state: TreeSlot::new(&config),
            events: EventLogState::new(),
            messages: MessageLog::with_capacity(config.message_capacity),
            message_table: TableState::default(),
            properties: PropertyListState::new(),
            focus: Focus::Tree,
            config,
        }
    }

    pub const fn store(&self) -> &Store {
        &self.store
    }

    pub const fn config(&self) -> &InspectorConfig {
        &self.config
    }

    pub const fn focus(&self) -> Focus {
        self.focus
    }

    pub const fn vdom_tree(&self) -> &ItemTree {
        &self.vdom.tree
    }

    pub const fn vdom_view(&self) -> &TreeViewState<NodeId> {
        &self.vdom.view
    }

    pub const fn state_tree(&self) -> &ItemTree {
        &self.state.tree
    }

    pub const fn state_view(&self) -> &TreeViewState<NodeId> {
        &self.state.view
    }

    pub const fn properties(&self) -> &PropertyListState {
        &self.properties
    }

    pub const fn messages(&self) -> &MessageLog {
        &self.messages
    }

    pub fn screen(&self) -> Screen<'_> {
        let interface = self.store.interface();
        match interface.api_version.as_deref() {
            None => Screen::NoApi {
                banner: NO_API_BANNER,
                actions: vec![PanelAction::Refresh],
            },
            Some(api_version) => Screen::Full {
                view: interface.view,
                title: interface.view.map_or(DEFAULT_TITLE, View::title),
                api_version,
            },
        }
    }

    /// Properties of the selected item in the current view.
    pub fn property_items(&self) -> Option<Map<String, Value>> {
        let diagnostics = self.store.diagnostics();
        let interface = self.store.interface();
        match interface.view? {
            View::Vdom => {
                let root = diagnostics.last_render.as_deref()?;
                let path = interface.selected_dnode.as_deref()?;
                find_vdom(root, path)?.properties().cloned()
            }
            View::Logs => {
                let log = diagnostics.event_log.as_deref()?;
                log.get(interface.selected_event_id?)?.data.clone()
            }
            View::Store => {
                let state = diagnostics.store_state.as_deref()?;
                let path = interface.selected_state_node.as_deref()?;
                Some(key_properties(state, path))
            }
            View::Messages => self.messages.get(interface.selected_message?)?.data.clone(),
        }
    }

    fn refresh_properties(&mut self) {
        let items = self.property_items();
        self.properties
            .refresh(items.as_ref(), self.config.property_options());
    }

    fn active_slot(&mut self) -> Option<(&mut ItemTree, &mut TreeViewState<NodeId>)> {
        match self.store.interface().view? {
            View::Vdom => Some((&mut self.vdom.tree, &mut self.vdom.view)),
            View::Store => Some((&mut self.state.tree, &mut self.state.view)),
            View::Logs | View::Messages => None,
        }
    }

    fn event_count(&self) -> usize {
        self.store
            .diagnostics()
            .event_log
            .as_ref()
            .map_or(0, |log| log.len())
    }
}

/// Panel coordinator: issues diagnostics queries and applies their results.
pub struct DevTool<W> {
    bridge: Bridge<W>,
    panel: PanelState,
    inspected_tab: Option<TabId>,
}

impl<W: InspectedWindow> DevTool<W> {
    pub fn new(window: W) -> Self {
        Self::with_config(window, InspectorConfig::default())
    }

    pub fn with_config(window: W, config: InspectorConfig) -> Self {
        Self {
            bridge: Bridge::with_root(window, config.diagnostic_root.clone()),
            panel: PanelState::new(config),
            inspected_tab: None,
        }
    }

    /// Restricts push messages to those tagged with `tab`.
    #[must_use]
    pub fn with_inspected_tab(mut self, tab: TabId) -> Self {
        self.inspected_tab = Some(tab);
        self
    }

    pub const fn inspected_tab(&self) -> Option<TabId> {
        self.inspected_tab
    }

    pub const fn panel(&self) -> &PanelState {
        &self.panel
    }

    pub const fn panel_mut(&mut self) -> &mut PanelState {
        &mut self.panel
    }

    pub const fn window(&self) -> &W {
        self.bridge.window()
    }

    pub const fn window_mut(&mut self) -> &mut W {
        self.bridge.window_mut()
    }

    pub fn screen(&self) -> Screen<'_> {
        self.panel.screen()
    }

    /// Asks the page for its diagnostics API version.
    pub fn check_version(&mut self) -> Ticket {
        self.bridge.send(DiagnosticQuery::Version)
    }

    /// Manual retry after the API was not found.
    pub fn refresh(&mut self) -> Ticket {
        self.check_version()
    }

    /// Switches the left pane to `view` and fetches what it displays.
    pub fn show(&mut self, view: View) {
        let interface = self.panel.store.interface();
        let leaving_vdom = interface.view == Some(View::Vdom) && view != View::Vdom;
        if leaving_vdom && interface.selected_dnode.is_some() {
            self.bridge.send(DiagnosticQuery::Unhighlight);
        }
        self.panel.store.dispatch(Command::SetView(Some(view)));
        self.panel.focus = Focus::Tree;
        self.panel.properties.reset();
        self.panel.refresh_properties();
        self.request_view_data(view);
    }

    fn request_view_data(&mut self, view: View) {
        let query = match view {
            View::Vdom => DiagnosticQuery::Projectors,
            View::Logs => DiagnosticQuery::EventLog,
            View::Store => DiagnosticQuery::Stores,
            View::Messages => return,
        };
        self.bridge.send(query);
    }

    /// Selects a vDOM node and asks the page to highlight it.
    pub fn on_vdom_select(&mut self, path: &str) {
        if let Some(projector) = self.panel.store.diagnostics().projectors.first().cloned() {
            self.bridge.send(DiagnosticQuery::Highlight {
                projector,
                path: path.to_owned(),
            });
        }
        self.panel.vdom.view.select(path);
        self.panel
            .store
            .dispatch(Command::SetSelectedDNode(Some(path.to_owned())));
        self.panel.properties.reset();
        self.panel.refresh_properties();
    }

    /// Clears the vDOM selection and removes the page highlight.
    pub fn clear_vdom_selection(&mut self) {
        let had_cursor_selection = self.panel.vdom.view.clear_selection().is_some();
        if !had_cursor_selection && self.panel.store.interface().selected_dnode.is_none() {
            return;
        }
        self.bridge.send(DiagnosticQuery::Unhighlight);
        self.panel.store.dispatch(Command::SetSelectedDNode(None));
        self.panel.properties.reset();
        self.panel.refresh_properties();
    }

    pub fn on_state_select(&mut self, path: &str) {
        self.panel.state.view.select(path);
        self.panel
            .store
            .dispatch(Command::SetSelectedStateNode(Some(path.to_owned())));
        self.panel.properties.reset();
        self.panel.refresh_properties();
    }

    pub fn on_event_select(&mut self, index: usize) {
        self.panel.events.set_cursor(Some(index));
        self.panel
            .store
            .dispatch(Command::SetSelectedEventId(Some(index)));
        self.panel.properties.reset();
        self.panel.refresh_properties();
    }

    pub fn on_message_select(&mut self, index: usize) {
        self.panel.message_table.select(Some(index));
        self.panel
            .store
            .dispatch(Command::SetSelectedMessage(Some(index)));
        self.panel.properties.reset();
        self.panel.refresh_properties();
    }

    /// Flips the invalidation-highlight preference; returns the new value.
    pub fn toggle_invalidation_highlight(&mut self) -> bool {
        let enabled = !self.panel.store.interface().highlight_invalidations;
        self.panel
            .store
            .dispatch(Command::SetHighlightInvalidations(enabled));
        enabled
    }

    /// Appends a pushed diagnostic message unless it belongs to another tab.
    ///
    /// Without an inspected tab every message is accepted. Returns whether the
    /// message was kept.
    pub fn on_push(&mut self, message: PushMessage) -> bool {
        if let Some(tab) = self.inspected_tab
            && message.tab_id != tab
        {
            tracing::trace!(from = %message.tab_id, inspected = %tab, "ignoring message for another tab");
            return false;
        }
        tracing::trace!(event_id = %message.event_id, "diagnostic message received");
        if self.panel.messages.push(message) {
            let shifted = self
                .panel
                .store
                .interface()
                .selected_message
                .map(|index| index.checked_sub(1));
            if let Some(shifted) = shifted {
                self.panel.store.dispatch(Command::SetSelectedMessage(shifted));
                if self.panel.store.interface().view == Some(View::Messages) {
                    self.panel.refresh_properties();
                }
            }
        }
        true
    }

    /// Decodes a raw channel message and passes it to [`on_push`](Self::on_push).
    pub fn on_push_value(&mut self, value: Value) -> Result<bool> {
        let message = PushMessage::from_value(value)?;
        Ok(self.on_push(message))
    }

    /// Toggles expansion of `path` in the current view's tree.
    ///
    /// Returns whether the item is expanded afterwards; embedded JSON that
    /// fails to parse becomes a leaf and is dropped from the expansion set.
    pub fn toggle(&mut self, path: &str) -> bool {
        let Some((tree, view)) = self.panel.active_slot() else {
            return false;
        };
        let expanded = view.toggle(path);
        view.sync(tree);
        if !expanded {
            return false;
        }
        let expandable = tree.find(path).is_some_and(|id| tree.has_children(id));
        if !expandable {
            view.set_expanded(path, false);
            view.sync(tree);
        }
        expandable
    }

    pub fn toggle_property(&mut self, key: &PropertyKey) -> bool {
        let expanded = self.panel.properties.toggle(key);
        self.panel.refresh_properties();
        expanded
    }

    pub fn set_active_index(&mut self, index: usize) {
        self.panel.store.dispatch(Command::SetActiveIndex(index));
    }

    /// Runs a tree action against the current view; activating a row selects it.
    pub fn tree_action(&mut self, action: TreeAction) -> TreeEvent {
        let Some((tree, view)) = self.panel.active_slot() else {
            return TreeEvent::Unhandled;
        };
        let event = view.handle_action(tree, action);
        self.after_tree_event(&event);
        event
    }

    fn after_tree_event(&mut self, event: &TreeEvent) {
        if let TreeEvent::Selected(path) = event {
            match self.panel.store.interface().view {
                Some(View::Vdom) => self.on_vdom_select(path),
                Some(View::Store) => self.on_state_select(path),
                Some(View::Logs | View::Messages) | None => {}
            }
        }
    }

    /// Applies a response from the page.
    ///
    /// A rejected request, or a page without the API, switches the panel to
    /// the banner and returns the error.
    pub fn on_response(&mut self, response: EvalResponse) -> Result<()> {
        match self.bridge.settle(response) {
            Ok(Some(settled)) => self.apply(settled),
            Ok(None) => Ok(()),
            Err(err) if err.disables_panel() => {
                self.panel.store.dispatch(Command::SetApiVersion(None));
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    fn apply(&mut self, settled: Settled) -> Result<()> {
        let Settled { query, value } = settled;
        let view = self.panel.store.interface().view;
        match query {
            DiagnosticQuery::Version => {
                let Some(version) = version_string(&value) else {
                    tracing::info!("diagnostics API not found in inspected page");
                    self.panel.store.dispatch(Command::SetApiVersion(None));
                    return Err(InspectorError::NoApi);
                };
                tracing::info!(%version, "diagnostics API detected");
                self.panel
                    .store
                    .dispatch(Command::SetApiVersion(Some(version)));
                if let Some(view) = view {
                    self.request_view_data(view);
                }
            }
            DiagnosticQuery::EventLog => {
                let log = decode_event_log(value).map(Arc::new);
                self.panel.store.dispatch(Command::SetEventLog(log));
                let count = self.panel.event_count();
                if self
                    .panel
                    .store
                    .interface()
                    .selected_event_id
                    .is_some_and(|id| id >= count)
                {
                    self.panel.store.dispatch(Command::SetSelectedEventId(None));
                }
                self.panel.refresh_properties();
            }
            DiagnosticQuery::Projectors => {
                let projectors = string_list(&value);
                let first = projectors.first().cloned();
                self.panel.store.dispatch(Command::SetProjectors(projectors));
                match first {
                    Some(projector) if view == Some(View::Vdom) => {
                        self.bridge.send(DiagnosticQuery::LastRender(projector));
                    }
                    Some(_) => {}
                    None => self.set_render(None),
                }
            }
            DiagnosticQuery::LastRender(_) => {
                self.set_render(Some(Arc::new(SerializedNode::from_value(value))));
            }
            DiagnosticQuery::Stores => {
                let stores = string_list(&value);
                let first = stores.first().cloned();
                self.panel.store.dispatch(Command::SetStores(stores));
                match first {
                    Some(store) if view == Some(View::Store) => {
                        self.bridge.send(DiagnosticQuery::StoreState(store));
                    }
                    Some(_) => {}
                    None => self.set_store_state(None),
                }
            }
            DiagnosticQuery::StoreState(_) => {
                self.set_store_state(Some(Arc::new(StateValue::from_value(value))));
            }
            DiagnosticQuery::Highlight { .. } | DiagnosticQuery::Unhighlight => {}
        }
        Ok(())
    }

    fn set_render(&mut self, render: Option<Arc<SerializedNode>>) {
        self.panel.vdom.observe(render.as_ref(), ItemTree::from_vdom);
        self.panel.store.dispatch(Command::SetRender(render));
        self.panel.refresh_properties();
    }

    fn set_store_state(&mut self, state: Option<Arc<StateValue>>) {
        self.panel.state.observe(state.as_ref(), ItemTree::from_state);
        self.panel.store.dispatch(Command::SetStoreState(state));
        self.panel.refresh_properties();
    }

    /// Handles a key press; returns the panel action it triggered, if any.
    #[cfg(feature = "keymap")]
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PanelAction> {
        if let Some(action) = TreeKeyBindings::resolve_panel(key) {
            match action {
                PanelAction::Show(view) => self.show(view),
                PanelAction::Refresh => {
                    self.refresh();
                }
                PanelAction::SwitchFocus => {
                    self.panel.focus = match self.panel.focus {
                        Focus::Tree => Focus::Properties,
                        Focus::Properties => Focus::Tree,
                    };
                }
                PanelAction::ToggleInvalidationHighlight => {
                    self.toggle_invalidation_highlight();
                }
                PanelAction::Quit => {}
            }
            return Some(action);
        }

        if self.panel.store.interface().api_version.is_none() {
            if key.code == KeyCode::Enter {
                self.refresh();
                return Some(PanelAction::Refresh);
            }
            return None;
        }

        match self.panel.focus {
            Focus::Properties => self.handle_properties_key(key),
            Focus::Tree => self.handle_tree_key(key),
        }
        None
    }

    #[cfg(feature = "keymap")]
    fn handle_properties_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.panel.properties.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.panel.properties.select_next(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(key) = self.panel.properties.cursor_key().cloned() {
                    self.toggle_property(&key);
                }
            }
            _ => {}
        }
    }

    #[cfg(feature = "keymap")]
    fn handle_tree_key(&mut self, key: KeyEvent) {
        if self.panel.store.interface().view == Some(View::Logs) {
            let count = self.panel.event_count();
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => self.panel.events.select_prev(count),
                KeyCode::Down | KeyCode::Char('j') => self.panel.events.select_next(count),
                KeyCode::Enter => {
                    if let Some(index) = self.panel.events.cursor() {
                        self.on_event_select(index);
                    }
                }
                _ => {}
            }
            return;
        }
        if self.panel.store.interface().view == Some(View::Messages) {
            self.handle_message_key(key);
            return;
        }
        if self.panel.store.interface().view == Some(View::Vdom) && key.code == KeyCode::Backspace {
            self.clear_vdom_selection();
            return;
        }
        let Some((tree, view)) = self.panel.active_slot() else {
            return;
        };
        let event = view.handle_key(tree, key);
        self.after_tree_event(&event);
    }

    #[cfg(feature = "keymap")]
    fn handle_message_key(&mut self, key: KeyEvent) {
        let count = self.panel.messages.len();
        let table = &mut self.panel.message_table;
        match key.code {
            KeyCode::Up | KeyCode::Char('k') if count > 0 => {
                let prev = table.selected().unwrap_or(0).saturating_sub(1);
                table.select(Some(prev));
            }
            KeyCode::Down | KeyCode::Char('j') if count > 0 => {
                let next = table.selected().map_or(0, |idx| idx + 1);
                table.select(Some(next.min(count - 1)));
            }
            KeyCode::Enter => {
                if let Some(index) = table.selected() {
                    self.on_message_select(index);
                }
            }
            _ => {}
        }
    }
}

fn version_string(value: &Value) -> Option<String> {
    match value {
        Value::String(version) if !version.is_empty() => Some(version.clone()),
        Value::Number(version) => Some(version.to_string()),
        _ => None,
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value.as_array().map_or_else(Vec::new, |items| {
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_owned))
            .collect()
    })
}

fn decode_event_log(value: Value) -> Option<Vec<EventLogEntry>> {
    let Value::Array(items) = value else {
        tracing::debug!("event log is not an array, ignoring");
        return None;
    };
    Some(
        items
            .into_iter()
            .filter_map(|item| {
                serde_json::from_value(item)
                    .map_err(|err| tracing::debug!(%err, "skipping malformed event log entry"))
                    .ok()
            })
            .collect(),
    )
}

/// Renders a [`PanelState`]: the banner, or toolbar + left view + properties.
pub struct DevToolView<'a> {
    style: TreeViewStyle<'a>,
    glyphs: TreeGlyphs<'a>,
    focus_style: Style,
}

impl<'a> DevToolView<'a> {
    pub fn new(config: &InspectorConfig) -> Self {
        Self {
            style: TreeViewStyle {
                scroll_policy: config.scroll_policy,
                ..TreeViewStyle::default()
            },
            glyphs: TreeGlyphs::from_set(config.glyphs),
            focus_style: Style::default().add_modifier(Modifier::BOLD),
        }
    }

    #[must_use]
    pub fn style(mut self, style: TreeViewStyle<'a>) -> Self {
        self.style = style;
        self
    }

    fn pane_block(&self, title: &'a str, focused: bool) -> Block<'a> {
        let block = Block::default().borders(Borders::ALL).title(title);
        if focused {
            block.border_style(self.focus_style)
        } else {
            block
        }
    }

    fn render_no_api(area: Rect, buf: &mut Buffer, banner: &str, actions: &[PanelAction]) {
        let [_, banner_area, button_area, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(area);
        Paragraph::new(banner).centered().render(banner_area, buf);
        let buttons: Vec<Span<'_>> = actions
            .iter()
            .map(|action| {
                Span::styled(
                    format!("[ {} ]", action.label()),
                    Style::default().add_modifier(Modifier::REVERSED),
                )
            })
            .collect();
        Paragraph::new(Line::from(buttons))
            .centered()
            .render(button_area, buf);
    }

    fn render_toolbar(area: Rect, buf: &mut Buffer, view: Option<View>, api_version: &str) {
        let mut spans = Vec::with_capacity(View::ALL.len() * 2 + 1);
        for (idx, candidate) in View::ALL.into_iter().enumerate() {
            let style = if view == Some(candidate) {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            spans.push(Span::styled(
                format!(" {} {} ", idx + 1, candidate.button_label()),
                style,
            ));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            format!("API {api_version}"),
            Style::default().add_modifier(Modifier::DIM),
        ));
        Paragraph::new(Line::from(spans)).render(area, buf);
    }

    fn render_left(&self, area: Rect, buf: &mut Buffer, panel: &mut PanelState, title: &'a str) {
        let focused = panel.focus == Focus::Tree;
        let view = panel.store.interface().view;
        match view {
            None => {
                Paragraph::new("Press 1 to 4 to choose a view")
                    .block(self.pane_block(title, focused))
                    .render(area, buf);
            }
            Some(View::Logs) => {
                let selected = panel.store.interface().selected_event_id;
                let entries = panel.store.diagnostics().event_log.as_deref().map(Vec::as_slice);
                EventLogView::new(entries)
                    .selected(selected)
                    .block(self.pane_block(title, focused))
                    .render(area, buf, &mut panel.events);
            }
            Some(View::Messages) => {
                let interface = panel.store.interface();
                MessageLogView::new(&panel.messages)
                    .selected(interface.selected_message)
                    .highlight_invalidations(interface.highlight_invalidations)
                    .block(self.pane_block(title, focused))
                    .render(area, buf, &mut panel.message_table);
            }
            Some(tree_view) => {
                let slot_style = TreeViewStyle {
                    title: Some(Line::from(title)),
                    border_style: if focused {
                        self.focus_style
                    } else {
                        self.style.border_style
                    },
                    ..self.style.clone()
                };
                let label = ItemLabelRenderer::new(&slot_style);
                let (tree, state) = if tree_view == View::Vdom {
                    (&panel.vdom.tree, &mut panel.vdom.view)
                } else {
                    (&panel.state.tree, &mut panel.state.view)
                };
                TreeListView::new(tree, &label, slot_style.clone())
                    .glyphs(self.glyphs)
                    .render(area, buf, state);
            }
        }
    }

    fn render_right(&self, area: Rect, buf: &mut Buffer, panel: &mut PanelState) {
        let focused = panel.focus == Focus::Properties;
        let block = self.pane_block("", focused);
        let inner = block.inner(area);
        block.render(area, buf);
        if !panel.properties.has_items() {
            return;
        }
        let [tabs_area, list_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
        Tabs::new([PROPERTIES_TAB])
            .select(panel.store.interface().active_index)
            .highlight_style(Style::default().add_modifier(Modifier::BOLD))
            .render(tabs_area, buf);
        PropertyListView::default()
            .glyphs(self.glyphs)
            .render(list_area, buf, &mut panel.properties);
    }
}

impl StatefulWidget for DevToolView<'_> {
    type State = PanelState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let (view, title, api_version) = match state.screen() {
            Screen::NoApi { banner, actions } => {
                Self::render_no_api(area, buf, banner, &actions);
                return;
            }
            Screen::Full {
                view,
                title,
                api_version,
            } => (view, title, api_version.to_owned()),
        };

        let [toolbar, content] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
        Self::render_toolbar(toolbar, buf, view, &api_version);
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(content);
        self.render_left(left, buf, state, title);
        self.render_right(right, buf, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{ExceptionInfo, RecordingWindow};
    use serde_json::json;

    fn respond(tool: &mut DevTool<RecordingWindow>, needle: &str, value: Value) -> Result<()> {
        let ticket = tool.window().last_ticket_for(needle);
        let ticket = ticket.unwrap_or_else(|| panic!("no request for {needle}"));
        tool.on_response(EvalResponse::ok(ticket, value))
    }

    fn connected() -> DevTool<RecordingWindow> {
        let mut tool = DevTool::new(RecordingWindow::new());
        tool.check_version();
        respond(&mut tool, ".version", json!("2.0.0")).unwrap();
        tool
    }

    #[test]
    fn starts_on_banner() {
        let tool = DevTool::new(RecordingWindow::new());

        assert_eq!(
            tool.screen(),
            Screen::NoApi {
                banner: NO_API_BANNER,
                actions: vec![PanelAction::Refresh]
            }
        );
    }

    #[test]
    fn version_exception_keeps_banner() {
        let mut tool = DevTool::new(RecordingWindow::new());
        let ticket = tool.check_version();

        let result = tool.on_response(EvalResponse::exception(ticket, ExceptionInfo::default()));

        assert!(matches!(result, Err(InspectorError::Exception(_))));
        assert!(matches!(tool.screen(), Screen::NoApi { .. }));
    }

    #[test]
    fn detected_version_shows_full_screen() {
        let tool = connected();

        assert_eq!(
            tool.screen(),
            Screen::Full {
                view: None,
                title: DEFAULT_TITLE,
                api_version: "2.0.0"
            }
        );
    }

    #[test]
    fn showing_vdom_fetches_first_projector_render() {
        let mut tool = connected();
        tool.show(View::Vdom);
        respond(&mut tool, "getProjectors()", json!(["main", "other"])).unwrap();

        assert!(tool.window().last_ticket_for("getProjectorLastRender('main')").is_some());

        respond(
            &mut tool,
            "getProjectorLastRender",
            json!({ "type": "hnode", "tag": "div", "children": ["hello"] }),
        )
        .unwrap();

        let tree = tool.panel().vdom_tree();
        assert_eq!(tree.len(), 1);
        assert!(matches!(tool.screen(), Screen::Full { title: "Last Render", .. }));
    }

    #[test]
    fn store_selection_lists_key_properties() {
        let mut tool = connected();
        tool.show(View::Store);
        respond(&mut tool, "getStores()", json!(["app"])).unwrap();
        respond(&mut tool, "getStoreState('app')", json!({ "count": 3 })).unwrap();

        tool.on_state_select("/count");

        let items = tool.panel().property_items().unwrap_or_default();
        assert_eq!(items["type"], json!("number"));
        assert_eq!(items["value"], json!(3));
    }

    #[test]
    fn event_selection_lists_event_data() {
        let mut tool = connected();
        tool.show(View::Logs);
        respond(
            &mut tool,
            ".eventLog",
            json!([{ "timestamp": 1, "level": "info", "type": "x", "data": { "k": "v" } }, 7]),
        )
        .unwrap();

        tool.on_event_select(0);

        assert_eq!(tool.panel().store().diagnostics().event_log.as_ref().map(|log| log.len()), Some(1));
        assert_eq!(tool.panel().properties().rows().len(), 1);
    }

    #[test]
    fn toggle_expands_in_active_tree() {
        let mut tool = connected();
        tool.show(View::Store);
        respond(&mut tool, "getStores()", json!(["app"])).unwrap();
        respond(&mut tool, "getStoreState('app')", json!({ "list": [1, 2] })).unwrap();

        assert!(tool.toggle(""));
        assert!(tool.toggle("/list"));
        assert_eq!(tool.panel().state_view().visible_len(), 4);
        assert!(!tool.toggle("/list"));
    }

    #[test]
    fn unparsable_embedded_json_does_not_stay_expanded() {
        let mut tool = connected();
        tool.show(View::Store);
        respond(&mut tool, "getStores()", json!(["app"])).unwrap();
        respond(&mut tool, "getStoreState('app')", json!({ "raw": "[1,,", "ok": "[1]" })).unwrap();
        assert!(tool.toggle(""));

        assert!(!tool.toggle("/raw"));
        assert!(!tool.panel().state_view().is_expanded("/raw"));
        assert!(tool.toggle("/ok"));
        assert_eq!(tool.panel().state_view().visible_len(), 4);
    }

    #[test]
    fn leaving_vdom_unhighlights_the_selection() {
        let mut tool = connected();
        tool.show(View::Vdom);
        respond(&mut tool, "getProjectors()", json!(["main"])).unwrap();
        tool.on_vdom_select("/0");

        tool.show(View::Logs);
        tool.show(View::Store);

        let unhighlights = tool
            .window()
            .calls()
            .iter()
            .filter(|(_, expression)| expression.ends_with("unhighlight()"))
            .count();
        assert_eq!(unhighlights, 1);
    }

    #[test]
    fn clearing_vdom_selection_unhighlights_once() {
        let mut tool = connected();
        tool.show(View::Vdom);
        respond(&mut tool, "getProjectors()", json!(["main"])).unwrap();
        tool.on_vdom_select("/0");

        tool.clear_vdom_selection();
        tool.clear_vdom_selection();

        assert!(tool.window().last_ticket_for("unhighlight()").is_some());
        let calls = tool.window().calls();
        assert_eq!(calls.iter().filter(|(_, e)| e.ends_with("unhighlight()")).count(), 1);
        assert_eq!(tool.panel().store().interface().selected_dnode, None);
        assert_eq!(tool.panel().vdom_view().selected_path(), None);
    }

    #[test]
    fn evicting_messages_shifts_the_selection() {
        let config = InspectorConfig {
            message_capacity: 2,
            ..InspectorConfig::default()
        };
        let mut tool = DevTool::with_config(RecordingWindow::new(), config);
        tool.on_push(PushMessage::new(TabId(1), "a"));
        tool.on_push(PushMessage::new(TabId(1), "b"));
        tool.on_message_select(1);

        tool.on_push(PushMessage::new(TabId(1), "c"));
        assert_eq!(tool.panel().store().interface().selected_message, Some(0));
        tool.on_push(PushMessage::new(TabId(1), "d"));
        assert_eq!(tool.panel().store().interface().selected_message, None);
    }

    #[test]
    fn invalidation_toggle_flips_and_renders() {
        let mut tool = connected();
        tool.show(View::Messages);
        assert!(tool.toggle_invalidation_highlight());

        let area = Rect::new(0, 0, 80, 8);
        let mut buffer = Buffer::empty(area);
        let config = tool.panel().config().clone();
        DevToolView::new(&config).render(area, &mut buffer, tool.panel_mut());
        let text: String = buffer.content().iter().map(ratatui::buffer::Cell::symbol).collect();
        assert!(text.contains("[x] Highlight Widget Invalidations"));

        assert!(!tool.toggle_invalidation_highlight());
        assert!(!tool.panel().store().interface().highlight_invalidations);
    }

    #[test]
    fn renders_banner_and_full_layout() {
        let area = Rect::new(0, 0, 60, 10);
        let mut tool = DevTool::new(RecordingWindow::new());
        let mut buffer = Buffer::empty(area);
        let config = tool.panel().config().clone();
        DevToolView::new(&config).render(area, &mut buffer, tool.panel_mut());
        let text: String = buffer.content().iter().map(ratatui::buffer::Cell::symbol).collect();
        assert!(text.contains(NO_API_BANNER));
        assert!(text.contains("[ Refresh ]"));

        let mut tool = connected();
        tool.show(View::Logs);
        let mut buffer = Buffer::empty(area);
        DevToolView::new(&config).render(area, &mut buffer, tool.panel_mut());
        let text: String = buffer.content().iter().map(ratatui::buffer::Cell::symbol).collect();
        assert!(text.contains("Event Log"));
    }
}
