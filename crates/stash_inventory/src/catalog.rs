//! Item type lookup by stable path

use crate::item::ItemType;
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves a stable type path back to a shared item type
pub trait ItemTypeResolver {
    /// Look up a type; `None` if the path is unknown
    fn resolve(&self, path: &str) -> Option<Arc<ItemType>>;
}

/// In-memory set of item types keyed by path
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    types: HashMap<String, Arc<ItemType>>,
}

impl ItemCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type, returning the shared handle
    ///
    /// Re-registering a path replaces the previous definition; entries already
    /// holding the old `Arc` keep it.
    pub fn register(&mut self, item_type: ItemType) -> Arc<ItemType> {
        let shared = Arc::new(item_type);
        if self
            .types
            .insert(shared.path.clone(), shared.clone())
            .is_some()
        {
            log::warn!("Item type {} registered twice; replacing", shared.path);
        }
        shared
    }

    /// Get a type by path
    pub fn get(&self, path: &str) -> Option<&Arc<ItemType>> {
        self.types.get(path)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate all types
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ItemType>> {
        self.types.values()
    }
}

impl FromIterator<ItemType> for ItemCatalog {
    fn from_iter<I: IntoIterator<Item = ItemType>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for item_type in iter {
            catalog.register(item_type);
        }
        catalog
    }
}

impl ItemTypeResolver for ItemCatalog {
    fn resolve(&self, path: &str) -> Option<Arc<ItemType>> {
        self.types.get(path).cloned()
    }
}

impl<R: ItemTypeResolver + ?Sized> ItemTypeResolver for Arc<R> {
    fn resolve(&self, path: &str) -> Option<Arc<ItemType>> {
        (**self).resolve(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_returns_same_arc() {
        let mut catalog = ItemCatalog::new();
        let apple = catalog.register(ItemType::new("apple", "Apple"));

        let resolved = catalog.resolve("apple").unwrap();
        assert!(ItemType::same(&apple, &resolved));
        assert!(catalog.resolve("pear").is_none());
    }

    #[test]
    fn test_from_iter() {
        let catalog: ItemCatalog = vec![ItemType::new("a", "A"), ItemType::new("b", "B")]
            .into_iter()
            .collect();
        assert_eq!(catalog.len(), 2);
    }
}
