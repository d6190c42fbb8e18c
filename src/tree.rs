//! Arena-backed lazy tree over a snapshot.

use rustc_hash::FxHashMap;

use crate::materialize::{
    Children, Described, IconClass, ItemLabel, Pending, TreeItem, describe_state_root,
    describe_vdom,
};
use crate::model::TreeModel;
use crate::snapshot::{SerializedNode, StateValue};
use crate::tracker::ExpansionState;

/// Arena index of a materialized item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

struct ItemNode {
    path: String,
    label: ItemLabel,
    title: String,
    icon: Option<IconClass>,
    children: Vec<NodeId>,
    // Source of the next level; taken when the children are materialized.
    pending: Option<Pending>,
    expandable: bool,
}

/// Tree of display items that materializes one level at a time.
///
/// Ids handed out by the arena are only meaningful for this tree; the
/// structural path of each node equals the id produced by
/// [`materialize`](crate::materialize) for the same snapshot.
#[derive(Default)]
pub struct ItemTree {
    nodes: Vec<ItemNode>,
    index: FxHashMap<String, NodeId>,
    root: Option<NodeId>,
}

impl ItemTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree whose root is the vDOM node at `/0`.
    pub fn from_vdom(root: &SerializedNode) -> Self {
        let mut tree = Self::new();
        let root = tree.push(describe_vdom(root.clone(), "", 0));
        tree.root = Some(root);
        tree
    }

    /// Builds a tree whose root is the store-state object at the empty path.
    pub fn from_state(state: &StateValue) -> Self {
        let mut tree = Self::new();
        let root = tree.push(describe_state_root(state.clone()));
        tree.root = Some(root);
        tree
    }

    fn push(&mut self, described: Described) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.index.insert(described.id.clone(), id);
        self.nodes.push(ItemNode {
            path: described.id,
            label: described.label,
            title: described.title,
            icon: described.icon,
            children: Vec::new(),
            expandable: described.pending.is_some(),
            pending: described.pending,
        });
        id
    }

    /// Materializes the direct children of `id` if that has not happened yet.
    ///
    /// Returns whether the node still has children; embedded JSON that fails
    /// to parse turns the node into a leaf.
    pub fn realize_children(&mut self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get_mut(id.index()) else {
            return false;
        };
        let Some(pending) = node.pending.take() else {
            return node.expandable;
        };
        let parent_path = node.path.clone();
        let Some(described) = pending.expand(&parent_path) else {
            node.expandable = false;
            return false;
        };
        let mut children = Vec::with_capacity(described.len());
        for child in described {
            children.push(self.push(child));
        }
        let node = &mut self.nodes[id.index()];
        node.expandable = !children.is_empty();
        node.children = children;
        node.expandable
    }

    pub fn label(&self, id: NodeId) -> Option<&ItemLabel> {
        self.nodes.get(id.index()).map(|node| &node.label)
    }

    pub fn title(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.index()).map(|node| node.title.as_str())
    }

    pub fn icon(&self, id: NodeId) -> Option<IconClass> {
        self.nodes.get(id.index()).and_then(|node| node.icon)
    }

    /// Number of materialized nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Copies the materialized part of the subtree rooted at `id` into an owned item graph.
    pub fn to_item(&self, id: NodeId) -> Option<TreeItem> {
        let node = self.nodes.get(id.index())?;
        let children = if !node.children.is_empty() {
            Some(Children::Materialized(
                node.children
                    .iter()
                    .filter_map(|child| self.to_item(*child))
                    .collect(),
            ))
        } else {
            match &node.pending {
                Some(Pending::Embedded(json)) => Some(Children::Deferred(json.clone())),
                Some(_) => Some(Children::Materialized(Vec::new())),
                None => None,
            }
        };
        Some(TreeItem {
            id: node.path.clone(),
            label: node.label.clone(),
            title: node.title.clone(),
            icon: node.icon,
            children,
        })
    }
}

impl TreeModel for ItemTree {
    type Id = NodeId;

    fn root(&self) -> Option<Self::Id> {
        self.root
    }

    fn children(&self, id: Self::Id) -> &[Self::Id] {
        self.nodes
            .get(id.index())
            .map_or(&[], |node| node.children.as_slice())
    }

    fn has_children(&self, id: Self::Id) -> bool {
        self.nodes.get(id.index()).is_some_and(|node| node.expandable)
    }

    fn path(&self, id: Self::Id) -> &str {
        self.nodes.get(id.index()).map_or("", |node| node.path.as_str())
    }

    fn find(&self, path: &str) -> Option<Self::Id> {
        self.index.get(path).copied()
    }

    fn contains(&self, id: Self::Id) -> bool {
        id.index() < self.nodes.len()
    }

    fn size_hint(&self) -> usize {
        self.nodes.len()
    }

    fn realize(&mut self, expanded: &ExpansionState) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = Vec::with_capacity(self.nodes.len().min(64));
        stack.push(root);
        while let Some(id) = stack.pop() {
            if !expanded.contains(self.path(id)) || !self.realize_children(id) {
                continue;
            }
            stack.extend(self.children(id).iter().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::{materialize, materialize_state};
    use serde_json::json;

    fn sample_vdom() -> SerializedNode {
        SerializedNode::from_value(json!({
            "type": "wnode",
            "widgetConstructor": "App",
            "rendered": [{
                "type": "hnode",
                "tag": "ul",
                "children": [
                    { "type": "hnode", "tag": "li", "children": ["one"] },
                    { "type": "hnode", "tag": "li", "children": ["two"] }
                ]
            }]
        }))
    }

    #[test]
    fn only_expanded_nodes_are_materialized() {
        let mut tree = ItemTree::from_vdom(&sample_vdom());
        assert_eq!(tree.len(), 1);

        let expanded: ExpansionState = ["/0"].into_iter().collect();
        tree.realize(&expanded);

        assert_eq!(tree.len(), 2);
        assert!(tree.find("/0/0").is_some());
        assert!(tree.find("/0/0/0").is_none());
    }

    #[test]
    fn slash_keys_do_not_alias_nested_paths() {
        let state = StateValue::from_value(json!({
            "a/b": { "x": 1 },
            "a": { "b": { "y": 2 } }
        }));
        let mut tree = ItemTree::from_state(&state);
        let expanded: ExpansionState = ["", "/a"].into_iter().collect();
        tree.realize(&expanded);

        let top = tree.find("/a~1b").and_then(|id| tree.label(id));
        assert_eq!(top.and_then(|label| label.key.as_deref()), Some("a/b"));
        let nested = tree.find("/a/b").and_then(|id| tree.label(id));
        assert_eq!(nested.and_then(|label| label.key.as_deref()), Some("b"));
        assert!(tree.find("/a~1b/x").is_none());
    }

    #[test]
    fn fully_expanded_tree_matches_pure_materialization() {
        let vdom = sample_vdom();
        let pure = materialize(&vdom, "");
        let expanded: ExpansionState = pure.ids().into_iter().collect();

        let mut tree = ItemTree::from_vdom(&vdom);
        tree.realize(&expanded);
        let root = tree.root().map(|root| tree.to_item(root));

        assert_eq!(root, Some(Some(pure)));
    }

    #[test]
    fn embedded_json_expands_lazily() {
        let state = StateValue::from_value(json!({ "list": "[1,2,3]", "bad": "[1,," }));
        let mut tree = ItemTree::from_state(&state);
        let mut expanded: ExpansionState = [""].into_iter().collect();
        tree.realize(&expanded);

        let list = tree.find("/list").expect("list item");
        assert!(tree.has_children(list));
        assert!(tree.children(list).is_empty());

        expanded.set("/list", true);
        expanded.set("/bad", true);
        tree.realize(&expanded);

        let labels: Vec<_> = tree
            .children(list)
            .iter()
            .filter_map(|child| tree.label(*child))
            .map(|label| (label.key.clone().unwrap_or_default(), label.text.clone()))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("0".to_string(), "1".to_string()),
                ("1".to_string(), "2".to_string()),
                ("2".to_string(), "3".to_string()),
            ]
        );
        let bad = tree.find("/bad").expect("bad item");
        assert!(!tree.has_children(bad));
        assert_eq!(tree.label(bad).map(|label| label.text.as_str()), Some("\"[1,,\""));
    }

    #[test]
    fn state_tree_root_matches_pure_root() {
        let state = StateValue::from_value(json!({ "a": 1 }));
        let tree = ItemTree::from_state(&state);
        let pure = materialize_state(&state);

        assert_eq!(tree.root().map(|root| tree.path(root)), Some(pure.id.as_str()));
    }
}
