//! The ordered item list for the directory on screen.

use std::collections::HashMap;
use std::ops::Range;

use crate::fs::entry::{Item, ItemId};

/// Items of the current listing with O(1) lookup by id.
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    items: Vec<Item>,
    index: HashMap<ItemId, usize>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole list and rebuilds the index.
    pub fn replace(&mut self, items: Vec<Item>) {
        self.index = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.id().clone(), i))
            .collect();
        self.items = items;
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, id: &ItemId) -> Option<&mut Item> {
        let i = *self.index.get(id)?;
        self.items.get_mut(i)
    }

    /// Items in `range`, clamped to the list.
    pub fn slice(&self, range: Range<usize>) -> &[Item] {
        let end = range.end.min(self.items.len());
        let start = range.start.min(end);
        &self.items[start..end]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn items() -> Vec<Item> {
        vec![
            Item::folder(PathBuf::from("/p/dir")),
            Item::image(PathBuf::from("/p/a.png"), "image/png", 1),
            Item::image(PathBuf::from("/p/b.png"), "image/png", 2),
        ]
    }

    #[test]
    fn lookup_by_id() {
        let mut store = ItemStore::new();
        store.replace(items());

        let id = ItemId::for_path(&PathBuf::from("/p/a.png"));
        assert_eq!(store.get(&id).map(Item::name), Some("a.png"));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn replace_rebuilds_index() {
        let mut store = ItemStore::new();
        store.replace(items());
        store.replace(vec![Item::folder(PathBuf::from("/q"))]);

        let old = ItemId::for_path(&PathBuf::from("/p/a.png"));
        assert!(store.get(&old).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_mut_allows_caching() {
        let mut store = ItemStore::new();
        store.replace(items());
        let id = ItemId::for_path(&PathBuf::from("/p/b.png"));

        store.get_mut(&id).unwrap().set_preview_url("u".to_string());
        assert_eq!(store.get(&id).and_then(Item::preview_url), Some("u"));
    }

    #[test]
    fn slice_is_clamped() {
        let mut store = ItemStore::new();
        store.replace(items());
        assert_eq!(store.slice(1..50).len(), 2);
        assert!(store.slice(10..50).is_empty());
    }
}
