//! Multi-select tracking for batch operations.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::{CoreError, CoreResult};
use crate::fs::entry::{Item, ItemId};

/// Maximum number of items selected at once.
pub const SELECTION_LIMIT: usize = 10;

/// The set of items checked for a batch operation, keyed by [`ItemId`].
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    entries: HashSet<ItemId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks or unchecks `item`. Returns whether the selection changed.
    ///
    /// # Errors
    ///
    /// [`CoreError::SelectionLimitExceeded`] when checking a new item would
    /// grow the selection past [`SELECTION_LIMIT`]. The selection is unchanged.
    pub fn toggle(&mut self, item: &Item, checked: bool) -> CoreResult<bool> {
        if !checked {
            return Ok(self.entries.remove(item.id()));
        }
        if self.entries.contains(item.id()) {
            return Ok(false);
        }
        if self.entries.len() >= SELECTION_LIMIT {
            return Err(CoreError::SelectionLimitExceeded {
                limit: SELECTION_LIMIT,
            });
        }
        self.entries.insert(item.id().clone());
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Removes every entry whose path is in `paths`. Returns how many were removed.
    pub fn prune(&mut self, paths: &[PathBuf]) -> usize {
        let ids: HashSet<ItemId> = paths.iter().map(|p| ItemId::for_path(p)).collect();
        let before = self.entries.len();
        self.entries.retain(|id| !ids.contains(id));
        before - self.entries.len()
    }

    /// Drops entries whose item is not in `items`. Returns how many were removed.
    pub fn retain_listed(&mut self, items: &[Item]) -> usize {
        let listed: HashSet<&ItemId> = items.iter().map(Item::id).collect();
        let before = self.entries.len();
        self.entries.retain(|id| listed.contains(id));
        before - self.entries.len()
    }

    pub fn is_selected(&self, item: &Item) -> bool {
        self.contains(item.id())
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.entries.contains(id)
    }

    /// The selected items, in listing order.
    pub fn selected_items<'a>(&self, items: &'a [Item]) -> Vec<&'a Item> {
        items.iter().filter(|item| self.is_selected(item)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str) -> Item {
        Item::image(PathBuf::from(format!("/photos/{name}")), "image/png", 1)
    }

    #[test]
    fn toggle_adds_and_removes() {
        let mut sel = SelectionTracker::new();
        let a = image("a.png");

        assert!(sel.toggle(&a, true).unwrap());
        assert!(sel.is_selected(&a));
        assert!(sel.toggle(&a, false).unwrap());
        assert!(!sel.is_selected(&a));
        assert!(sel.is_empty());
    }

    #[test]
    fn rechecking_is_noop() {
        let mut sel = SelectionTracker::new();
        let a = image("a.png");
        sel.toggle(&a, true).unwrap();

        assert!(!sel.toggle(&a, true).unwrap());
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn unchecking_unselected_is_noop() {
        let mut sel = SelectionTracker::new();
        assert!(!sel.toggle(&image("a.png"), false).unwrap());
    }

    #[test]
    fn eleventh_item_is_rejected() {
        let mut sel = SelectionTracker::new();
        for i in 0..SELECTION_LIMIT {
            sel.toggle(&image(&format!("{i}.png")), true).unwrap();
        }
        let err = sel.toggle(&image("extra.png"), true).unwrap_err();

        assert!(matches!(err, CoreError::SelectionLimitExceeded { limit: 10 }));
        assert_eq!(sel.len(), SELECTION_LIMIT);
        assert!(!sel.is_selected(&image("extra.png")));
    }

    #[test]
    fn full_selection_can_still_recheck_and_uncheck() {
        let mut sel = SelectionTracker::new();
        let items: Vec<Item> = (0..SELECTION_LIMIT)
            .map(|i| image(&format!("{i}.png")))
            .collect();
        for item in &items {
            sel.toggle(item, true).unwrap();
        }

        assert!(!sel.toggle(&items[0], true).unwrap());
        assert!(sel.toggle(&items[0], false).unwrap());
        assert!(sel.toggle(&image("new.png"), true).unwrap());
    }

    #[test]
    fn prune_removes_only_given_paths() {
        let mut sel = SelectionTracker::new();
        let (a, b, c) = (image("a.png"), image("b.png"), image("c.png"));
        for item in [&a, &b, &c] {
            sel.toggle(item, true).unwrap();
        }

        let removed = sel.prune(&[b.path().to_path_buf()]);

        assert_eq!(removed, 1);
        assert!(sel.is_selected(&a));
        assert!(!sel.is_selected(&b));
        assert!(sel.is_selected(&c));
    }

    #[test]
    fn prune_matches_unnormalized_paths() {
        let mut sel = SelectionTracker::new();
        let a = image("a.png");
        sel.toggle(&a, true).unwrap();

        sel.prune(&[PathBuf::from("/photos/./x/../a.png")]);
        assert!(sel.is_empty());
    }

    #[test]
    fn retain_listed_drops_vanished_items() {
        let mut sel = SelectionTracker::new();
        let (a, b) = (image("a.png"), image("b.png"));
        sel.toggle(&a, true).unwrap();
        sel.toggle(&b, true).unwrap();

        let removed = sel.retain_listed(std::slice::from_ref(&a));
        assert_eq!(removed, 1);
        assert!(sel.is_selected(&a));
        assert!(!sel.is_selected(&b));
    }

    #[test]
    fn selected_items_follow_listing_order() {
        let mut sel = SelectionTracker::new();
        let items = vec![image("a.png"), image("b.png"), image("c.png")];
        sel.toggle(&items[2], true).unwrap();
        sel.toggle(&items[0], true).unwrap();

        let names: Vec<&str> = sel.selected_items(&items).iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["a.png", "c.png"]);
    }

    #[test]
    fn clear_empties_selection() {
        let mut sel = SelectionTracker::new();
        sel.toggle(&image("a.png"), true).unwrap();
        sel.clear();
        assert!(sel.is_empty());
    }
}
