use std::hash::Hash;

use crate::tracker::ExpansionState;

/// Minimal tree contract required by the widget.
///
/// A proper tree is expected (not a DAG):
/// - no cycles (DFS traversal is used directly);
/// - each node has exactly one parent;
/// - every node has a structural path that stays stable for the same snapshot.
pub trait TreeModel {
    /// Node identifier type.
    type Id: Copy + Eq + Hash;

    /// Returns the root node (or `None` if the tree is empty).
    fn root(&self) -> Option<Self::Id>;
    /// Returns the node's materialized children in a deterministic order.
    fn children(&self, id: Self::Id) -> &[Self::Id];
    /// Returns `true` if the node can be expanded, even when its children are not materialized yet.
    fn has_children(&self, id: Self::Id) -> bool {
        !self.children(id).is_empty()
    }
    /// Returns the node's structural path.
    fn path(&self, id: Self::Id) -> &str;
    /// Looks up a node by structural path.
    fn find(&self, path: &str) -> Option<Self::Id>;
    /// Returns `true` if the node exists in the model.
    fn contains(&self, id: Self::Id) -> bool;
    /// Returns an approximate size hint (not required to be exact).
    fn size_hint(&self) -> usize {
        0
    }
    /// Materializes the children of every expanded node reachable from the root.
    ///
    /// Eager models keep the default no-op.
    fn realize(&mut self, _expanded: &ExpansionState) {}
}
