//! Expansion, selection and root-change tracking owned by the coordinator.

use std::sync::Arc;

use rustc_hash::FxHashSet;

/// Set of expanded item paths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: FxHashSet<String>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Flips membership of `id`; returns whether it is expanded afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_owned());
            true
        }
    }

    pub fn set(&mut self, id: &str, expand: bool) {
        if expand {
            if !self.expanded.contains(id) {
                self.expanded.insert(id.to_owned());
            }
        } else {
            self.expanded.remove(id);
        }
    }

    /// Forgets every expanded path; positional paths are meaningless under a new root.
    pub fn on_root_changed(&mut self) {
        self.expanded.clear();
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.expanded.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ExpansionState {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            expanded: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// At most one selected item path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: Option<String>,
}

impl SelectionState {
    /// Replaces the selection; returns the previous one.
    pub fn select(&mut self, id: &str) -> Option<String> {
        self.selected.replace(id.to_owned())
    }

    pub fn clear(&mut self) -> Option<String> {
        self.selected.take()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[inline]
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }
}

/// Detects when the snapshot root is replaced by a different reference.
#[derive(Debug)]
pub struct RootTracker<T> {
    current: Option<Arc<T>>,
}

impl<T> Default for RootTracker<T> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<T> RootTracker<T> {
    /// Records `root` and reports whether it differs (by reference) from the previous one.
    pub fn observe(&mut self, root: Option<&Arc<T>>) -> bool {
        let changed = match (&self.current, root) {
            (Some(previous), Some(next)) => !Arc::ptr_eq(previous, next),
            (None, None) => false,
            _ => true,
        };
        if changed {
            self.current = root.cloned();
        }
        changed
    }

    pub const fn current(&self) -> Option<&Arc<T>> {
        self.current.as_ref()
    }
}
