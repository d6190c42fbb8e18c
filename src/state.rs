use std::hash::Hash;

use ratatui::widgets::TableState;
use rustc_hash::{FxBuildHasher, FxHashMap};
use smallvec::SmallVec;

use crate::action::{TreeAction, TreeEvent};
use crate::model::TreeModel;
use crate::path::ancestors;
use crate::style::TreeScrollPolicy;
use crate::tracker::{ExpansionState, SelectionState};

#[cfg(feature = "keymap")]
use crate::keymap::TreeKeyBindings;
#[cfg(feature = "keymap")]
use crossterm::event::KeyEvent;

/// A visible node row with metadata used for rendering and navigation.
#[derive(Clone)]
pub struct VisibleNode<Id> {
    pub(crate) id: Id,
    pub(crate) level: u16,
    pub(crate) parent: Option<Id>,
    pub(crate) has_children: bool,
    pub(crate) is_tail_stack: SmallVec<[bool; 8]>,
}

/// View state of one tree: expansion and selection by path, plus the cursor and visible-row cache.
///
/// The cursor is the highlighted row used for keyboard navigation; the
/// selection is the item the user activated. They move independently.
pub struct TreeViewState<Id> {
    list_state: TableState,
    expansion: ExpansionState,
    selection: SelectionState,
    // Cached visible rows to avoid recomputing DFS every render.
    visible_nodes: Vec<VisibleNode<Id>>,
    // Fast lookup from node id to visible row index.
    visible_index: FxHashMap<Id, usize>,
    // Marks whether visible_nodes must be rebuilt.
    dirty: bool,
    draw_lines: bool,
    #[cfg(feature = "keymap")]
    keymap: TreeKeyBindings,
}

impl<Id: Copy + Eq + Hash> Default for TreeViewState<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Copy + Eq + Hash> TreeViewState<Id> {
    /// Creates a new empty state with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a state with preallocated capacity for the given number of rows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            list_state: TableState::default(),
            expansion: ExpansionState::new(),
            selection: SelectionState::default(),
            visible_nodes: Vec::with_capacity(capacity),
            visible_index: FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
            dirty: true,
            draw_lines: true,
            #[cfg(feature = "keymap")]
            keymap: TreeKeyBindings::new(),
        }
    }

    #[cfg(feature = "keymap")]
    /// Returns a mutable reference to the key binding set.
    pub const fn keymap_mut(&mut self) -> &mut TreeKeyBindings {
        &mut self.keymap
    }

    pub(crate) const fn list_state(&self) -> &TableState {
        &self.list_state
    }

    pub(crate) const fn list_state_mut(&mut self) -> &mut TableState {
        &mut self.list_state
    }

    pub(crate) fn visible_nodes(&self) -> &[VisibleNode<Id>] {
        &self.visible_nodes
    }

    fn visible_index_of(&self, id: Id) -> Option<usize> {
        self.visible_index.get(&id).copied()
    }

    /// Returns the set of expanded paths.
    pub const fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    /// Returns the current selection.
    pub const fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Returns the selected path, if any.
    pub fn selected_path(&self) -> Option<&str> {
        self.selection.selected()
    }

    #[inline]
    pub fn is_expanded(&self, path: &str) -> bool {
        self.expansion.contains(path)
    }

    /// Returns whether guide lines are drawn.
    #[inline]
    pub const fn draw_lines(&self) -> bool {
        self.draw_lines
    }

    /// Enables or disables drawing of guide lines.
    pub const fn set_draw_lines(&mut self, draw: bool) {
        self.draw_lines = draw;
    }

    /// Marks the visible-node cache as dirty.
    pub const fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Replaces the selection with `path`; returns the previous selection.
    pub fn select(&mut self, path: &str) -> Option<String> {
        self.selection.select(path)
    }

    /// Drops the selection; returns what was selected.
    pub fn clear_selection(&mut self) -> Option<String> {
        self.selection.clear()
    }

    /// Toggles expansion of `path`; returns whether it is expanded afterwards.
    pub fn toggle(&mut self, path: &str) -> bool {
        self.dirty = true;
        self.expansion.toggle(path)
    }

    /// Sets expansion state for the given path.
    pub fn set_expanded(&mut self, path: &str, expand: bool) {
        self.expansion.set(path, expand);
        self.dirty = true;
    }

    /// Collapses all nodes.
    pub fn collapse_all(&mut self) {
        self.expansion.on_root_changed();
        self.dirty = true;
    }

    /// Resets expansion and scrolling for a new snapshot root; the selection is kept.
    pub fn on_root_changed(&mut self) {
        self.expansion.on_root_changed();
        self.visible_nodes.clear();
        self.visible_index.clear();
        *self.list_state.offset_mut() = 0;
        self.list_state.select(None);
        self.dirty = true;
    }

    /// Moves the cursor to the first visible row.
    pub const fn select_first(&mut self) {
        self.list_state.select_first();
    }

    /// Moves the cursor to the last visible row.
    pub const fn select_last(&mut self) {
        self.list_state.select_last();
    }

    /// Scrolls the view down by the given number of rows.
    pub fn scroll_down_by(&mut self, amount: u16) {
        self.list_state.scroll_down_by(amount);
    }

    /// Scrolls the view up by the given number of rows.
    pub fn scroll_up_by(&mut self, amount: u16) {
        self.list_state.scroll_up_by(amount);
    }

    /// Moves the cursor to the previous visible row.
    pub fn select_prev(&mut self) {
        if self.visible_nodes.is_empty() {
            self.list_state.select(None);
            return;
        }
        let selected = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some(selected.saturating_sub(1)));
    }

    /// Moves the cursor to the next visible row.
    pub fn select_next(&mut self) {
        if self.visible_nodes.is_empty() {
            self.list_state.select(None);
            return;
        }
        let selected = self.list_state.selected().unwrap_or(0);
        let new_selected = (selected + 1).min(self.visible_nodes.len().saturating_sub(1));
        self.list_state.select(Some(new_selected));
    }

    /// Adjusts scroll offset so the cursor is within the viewport.
    pub fn ensure_selection_visible(&mut self, viewport_height: usize) {
        self.clamp_selection();
        let Some(selected) = self.list_state.selected() else {
            return;
        };
        let viewport_height = viewport_height.max(1);
        let offset = self.list_state.offset();
        if selected < offset {
            *self.list_state.offset_mut() = selected;
        } else if selected >= offset + viewport_height {
            *self.list_state.offset_mut() = selected + 1 - viewport_height;
        }
    }

    /// Adjusts cursor visibility according to the provided scroll policy.
    pub fn ensure_selection_visible_with_policy(
        &mut self,
        viewport_height: usize,
        policy: TreeScrollPolicy,
    ) {
        match policy {
            TreeScrollPolicy::KeepInView => self.ensure_selection_visible(viewport_height),
            TreeScrollPolicy::CenterOnSelect => {
                self.ensure_selection_visible_centered(viewport_height);
            }
        }
    }

    fn ensure_selection_visible_centered(&mut self, viewport_height: usize) {
        self.clamp_selection();
        let Some(selected) = self.list_state.selected() else {
            return;
        };
        let viewport_height = viewport_height.max(1);
        let total = self.visible_nodes.len();
        if total <= viewport_height {
            *self.list_state.offset_mut() = 0;
            return;
        }

        // Center the cursor, then clamp to valid scroll range.
        let half = viewport_height / 2;
        let max_offset = total.saturating_sub(viewport_height);
        *self.list_state.offset_mut() = selected.saturating_sub(half).min(max_offset);
    }

    /// Returns the id of the node under the cursor, if any.
    pub fn cursor_id(&self) -> Option<Id> {
        self.list_state
            .selected()
            .and_then(|idx| self.visible_nodes.get(idx).map(|node| node.id))
    }

    /// Returns the path of the node under the cursor, if any.
    pub fn cursor_path<'m, T: TreeModel<Id = Id>>(&self, model: &'m T) -> Option<&'m str> {
        self.cursor_id().map(|id| model.path(id))
    }

    /// Returns the number of visible nodes in the current view.
    pub const fn visible_len(&self) -> usize {
        self.visible_nodes.len()
    }

    /// Returns the depth level of the node under the cursor.
    pub fn cursor_level(&self) -> Option<u16> {
        self.list_state
            .selected()
            .and_then(|idx| self.visible_nodes.get(idx).map(|node| node.level))
    }

    /// Expands every ancestor of `path`, materializes them and moves the cursor onto it.
    ///
    /// Returns `false` if the path does not exist in the model.
    pub fn reveal<T: TreeModel<Id = Id>>(&mut self, model: &mut T, path: &str) -> bool {
        let root_len = model.root().map_or(0, |root| model.path(root).len());
        for ancestor in ancestors(path) {
            if ancestor.len() >= root_len {
                self.expansion.set(ancestor, true);
            }
        }
        self.dirty = true;
        self.sync(model);
        let Some(id) = model.find(path) else {
            return false;
        };
        match self.visible_index_of(id) {
            Some(idx) => {
                self.list_state.select(Some(idx));
                true
            }
            None => false,
        }
    }

    /// Materializes expanded nodes and rebuilds the visible rows if anything changed.
    pub fn sync<T: TreeModel<Id = Id>>(&mut self, model: &mut T) {
        if !self.dirty {
            return;
        }
        model.realize(&self.expansion);
        self.update_visible_nodes(model);
    }

    /// Ensures the visible node list is up to date (if marked dirty).
    ///
    /// Only already materialized children are listed; call [`sync`](Self::sync)
    /// first when the model is lazy.
    pub fn ensure_visible_nodes<T: TreeModel<Id = Id>>(&mut self, model: &T) {
        if !self.dirty {
            return;
        }
        self.update_visible_nodes(model);
    }

    /// Handles a tree action and returns the resulting event.
    pub fn handle_action<T: TreeModel<Id = Id>, C>(
        &mut self,
        model: &mut T,
        action: TreeAction<C>,
    ) -> TreeEvent<C> {
        self.sync(model);
        self.handle_action_inner(model, action)
    }

    #[cfg(feature = "keymap")]
    /// Resolves a key event into an action and handles it.
    pub fn handle_key<T: TreeModel<Id = Id>>(&mut self, model: &mut T, key: KeyEvent) -> TreeEvent<()> {
        self.sync(model);
        let Some(action) = self.keymap.resolve(key) else {
            return TreeEvent::Unhandled;
        };
        self.handle_action_inner(model, action)
    }

    #[cfg(feature = "keymap")]
    /// Resolves a key event with a custom mapping and handles it.
    pub fn handle_key_with<T, C, F>(&mut self, model: &mut T, key: KeyEvent, custom: F) -> TreeEvent<C>
    where
        T: TreeModel<Id = Id>,
        F: Fn(KeyEvent) -> Option<C>,
    {
        self.sync(model);
        let Some(action) = self.keymap.resolve_with(key, custom) else {
            return TreeEvent::Unhandled;
        };
        self.handle_action_inner(model, action)
    }

    fn handle_action_inner<T: TreeModel<Id = Id>, C>(
        &mut self,
        model: &mut T,
        action: TreeAction<C>,
    ) -> TreeEvent<C> {
        if matches!(&action, TreeAction::Custom(_)) {
            return TreeEvent::Action(action);
        }

        if self.visible_nodes.is_empty() {
            return TreeEvent::Unhandled;
        }

        match action {
            TreeAction::SelectPrev => {
                self.select_prev();
                TreeEvent::Handled
            }
            TreeAction::SelectNext => {
                self.select_next();
                TreeEvent::Handled
            }
            TreeAction::SelectParent => {
                self.select_parent();
                TreeEvent::Handled
            }
            TreeAction::SelectChild => {
                self.select_child_with_descendants(model);
                TreeEvent::Handled
            }
            TreeAction::ToggleNode => {
                if let Some(selected_idx) = self.list_state.selected()
                    && let Some(node) = self.visible_nodes.get(selected_idx)
                    && node.has_children
                {
                    let path = model.path(node.id).to_owned();
                    let expanded = self.toggle(&path);
                    self.sync(model);
                    return TreeEvent::Toggled { path, expanded };
                }
                TreeEvent::Unhandled
            }
            TreeAction::CollapseAll => {
                self.collapse_all();
                self.sync(model);
                TreeEvent::Handled
            }
            TreeAction::ToggleGuides => {
                self.draw_lines = !self.draw_lines;
                TreeEvent::Handled
            }
            TreeAction::SelectFirst => {
                self.select_first();
                TreeEvent::Handled
            }
            TreeAction::SelectLast => {
                self.select_last();
                TreeEvent::Handled
            }
            TreeAction::Activate => {
                let Some(path) = self.cursor_path(model).map(str::to_owned) else {
                    return TreeEvent::Unhandled;
                };
                self.selection.select(&path);
                TreeEvent::Selected(path)
            }
            TreeAction::Custom(_) => TreeEvent::Action(action),
        }
    }

    fn update_visible_nodes<T: TreeModel<Id = Id>>(&mut self, model: &T) {
        self.visible_nodes.clear();
        self.visible_index.clear();
        self.visible_nodes.reserve(model.size_hint());
        if let Some(root) = model.root() {
            let mut is_tail_stack: SmallVec<[bool; 8]> = SmallVec::new();
            self.build_visible_nodes(model, root, 0, None, &mut is_tail_stack);
        }
        self.dirty = false;
        self.clamp_selection();
    }

    fn build_visible_nodes<T: TreeModel<Id = Id>>(
        &mut self,
        model: &T,
        node_id: Id,
        level: u16,
        parent: Option<Id>,
        is_tail_stack: &mut SmallVec<[bool; 8]>,
    ) {
        let has_children = model.has_children(node_id);
        let idx = self.visible_nodes.len();
        self.visible_nodes.push(VisibleNode {
            id: node_id,
            level,
            parent,
            has_children,
            is_tail_stack: is_tail_stack.clone(),
        });
        self.visible_index.insert(node_id, idx);

        if !has_children || !self.expansion.contains(model.path(node_id)) {
            return;
        }

        let children = model.children(node_id);
        for (i, child) in children.iter().copied().enumerate() {
            let is_last = i == children.len().saturating_sub(1);
            is_tail_stack.push(is_last);
            self.build_visible_nodes(model, child, level + 1, Some(node_id), is_tail_stack);
            is_tail_stack.pop();
        }
    }

    const fn clamp_selection(&mut self) {
        if self.visible_nodes.is_empty() {
            self.list_state.select(None);
            return;
        }

        if let Some(selected) = self.list_state.selected()
            && selected >= self.visible_nodes.len()
        {
            self.list_state
                .select(Some(self.visible_nodes.len().saturating_sub(1)));
        }
    }

    fn select_parent(&mut self) {
        let Some(selected_idx) = self.list_state.selected() else {
            return;
        };

        let Some(parent_id) = self
            .visible_nodes
            .get(selected_idx)
            .and_then(|node| node.parent)
        else {
            return;
        };

        if let Some(parent_idx) = self.visible_index_of(parent_id) {
            self.list_state.select(Some(parent_idx));
        }
    }

    fn select_child_with_descendants<T: TreeModel<Id = Id>>(&mut self, model: &mut T) {
        let Some(mut selected_idx) = self.list_state.selected() else {
            return;
        };
        let Some(selected_node) = self.visible_nodes.get(selected_idx) else {
            return;
        };
        let node_id = selected_node.id;
        let mut level = selected_node.level;

        if selected_node.has_children {
            let path = model.path(node_id).to_owned();
            if !self.expansion.contains(&path) {
                self.set_expanded(&path, true);
                self.sync(model);

                let Some(current_idx) = self.visible_index_of(node_id) else {
                    return;
                };
                selected_idx = current_idx;
                if let Some(node) = self.visible_nodes.get(current_idx) {
                    level = node.level;
                }
                self.list_state.select(Some(current_idx));
            }

            // Prefer children that themselves have descendants.
            for idx in selected_idx + 1..self.visible_nodes.len() {
                let candidate = &self.visible_nodes[idx];
                if candidate.level <= level {
                    break;
                }
                if candidate.level == level + 1 && candidate.has_children {
                    self.list_state.select(Some(idx));
                    return;
                }
            }
        }

        // Fallback: pick the next node in the subtree that has children.
        for idx in selected_idx + 1..self.visible_nodes.len() {
            let candidate = &self.visible_nodes[idx];
            if candidate.level < level {
                break;
            }
            if candidate.has_children {
                self.list_state.select(Some(idx));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestTree {
        children: Vec<Vec<usize>>,
        paths: Vec<&'static str>,
    }

    impl TestTree {
        fn new() -> Self {
            Self {
                children: vec![
                    vec![1, 2], // 0
                    vec![3, 4], // 1
                    vec![],     // 2
                    vec![],     // 3
                    vec![],     // 4
                ],
                paths: vec!["/0", "/0/0", "/0/1", "/0/0/0", "/0/0/1"],
            }
        }
    }

    impl TreeModel for TestTree {
        type Id = usize;

        fn root(&self) -> Option<Self::Id> {
            Some(0)
        }

        fn children(&self, id: Self::Id) -> &[Self::Id] {
            &self.children[id]
        }

        fn path(&self, id: Self::Id) -> &str {
            self.paths[id]
        }

        fn find(&self, path: &str) -> Option<Self::Id> {
            self.paths.iter().position(|candidate| *candidate == path)
        }

        fn contains(&self, id: Self::Id) -> bool {
            id < self.children.len()
        }
    }

    fn visible_ids(state: &TreeViewState<usize>) -> Vec<usize> {
        state.visible_nodes.iter().map(|n| n.id).collect()
    }

    #[test]
    fn builds_visible_nodes_with_expansion() {
        let mut tree = TestTree::new();
        let mut state = TreeViewState::<usize>::new();

        state.set_expanded("/0", true);
        state.set_expanded("/0/0", true);
        state.sync(&mut tree);

        let levels: Vec<_> = state.visible_nodes.iter().map(|n| n.level).collect();
        assert_eq!(visible_ids(&state), vec![0, 1, 3, 4, 2]);
        assert_eq!(levels, vec![0, 1, 2, 2, 1]);
    }

    #[test]
    fn select_prev_clears_selection_when_empty() {
        let mut state = TreeViewState::<usize>::new();
        state.list_state.select(Some(0));

        state.select_prev();

        assert_eq!(state.list_state.selected(), None);
    }

    #[test]
    fn toggle_node_reports_path() {
        let mut tree = TestTree::new();
        let mut state = TreeViewState::<usize>::new();
        state.sync(&mut tree);
        state.select_first();

        let event = state.handle_action::<_, ()>(&mut tree, TreeAction::ToggleNode);

        assert_eq!(
            event,
            TreeEvent::Toggled {
                path: "/0".to_string(),
                expanded: true
            }
        );
        assert_eq!(visible_ids(&state), vec![0, 1, 2]);
    }

    #[test]
    fn activate_selects_cursor_path() {
        let mut tree = TestTree::new();
        let mut state = TreeViewState::<usize>::new();
        state.set_expanded("/0", true);
        state.sync(&mut tree);
        state.list_state.select(Some(2));

        let event = state.handle_action::<_, ()>(&mut tree, TreeAction::Activate);

        assert_eq!(event, TreeEvent::Selected("/0/1".to_string()));
        assert_eq!(state.selected_path(), Some("/0/1"));
    }

    #[test]
    fn reveal_expands_ancestors() {
        let mut tree = TestTree::new();
        let mut state = TreeViewState::<usize>::new();

        assert!(state.reveal(&mut tree, "/0/0/1"));

        assert_eq!(state.cursor_id(), Some(4));
        assert!(state.is_expanded("/0"));
        assert!(state.is_expanded("/0/0"));
        assert!(!state.is_expanded(""));
    }

    #[test]
    fn root_change_keeps_selection() {
        let mut tree = TestTree::new();
        let mut state = TreeViewState::<usize>::new();
        state.set_expanded("/0", true);
        state.select("/0/1");
        state.sync(&mut tree);

        state.on_root_changed();
        state.sync(&mut tree);

        assert!(state.expansion().is_empty());
        assert_eq!(state.selected_path(), Some("/0/1"));
        assert_eq!(visible_ids(&state), vec![0]);
    }
}
