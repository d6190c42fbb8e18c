/// Actions that a user or application can initiate on a tree view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeAction<Custom = ()> {
    /// Move the cursor to the previous visible row.
    SelectPrev,
    /// Move the cursor to the next visible row.
    SelectNext,
    /// Move the cursor to the parent node.
    SelectParent,
    /// Expand the cursor node; if possible, move to an expandable descendant.
    SelectChild,
    /// Toggle expansion for the cursor node only.
    ToggleNode,
    /// Collapse all nodes in the tree.
    CollapseAll,
    /// Toggle drawing of guide lines.
    ToggleGuides,
    /// Move the cursor to the first visible row.
    SelectFirst,
    /// Move the cursor to the last visible row.
    SelectLast,
    /// Select the node under the cursor (e.g. to highlight it in the inspected page).
    Activate,
    /// Custom action forwarded to the caller without internal handling.
    Custom(Custom),
}

/// Result of handling an action or key event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeEvent<Custom = ()> {
    /// The action was handled internally and state was updated.
    Handled,
    /// The action was ignored (e.g., nothing under the cursor / nothing to do).
    Unhandled,
    /// A node was expanded or collapsed.
    Toggled { path: String, expanded: bool },
    /// A node became the selection.
    Selected(String),
    /// The action is forwarded to the caller for handling.
    Action(TreeAction<Custom>),
}
