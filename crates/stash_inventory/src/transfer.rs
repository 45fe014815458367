//! Moving entries between containers
//!
//! Every transfer checks the destination before touching the source, so a
//! rejected transfer leaves both containers exactly as they were.

use crate::container::Container;
use crate::item::{InstanceId, ItemType};
use std::sync::Arc;

/// Outcome of a bulk transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferResult {
    /// At least one entry moved
    pub success: bool,
    /// Number of entries moved
    pub moved: usize,
}

/// Check whether `id` could move from `source` to `dest`
pub fn can_transfer(source: &Container, dest: &Container, id: InstanceId) -> bool {
    source
        .get(id)
        .map(|entry| dest.can_accept(entry))
        .unwrap_or(false)
}

/// Move one entry by id
pub fn transfer(source: &mut Container, dest: &mut Container, id: InstanceId) -> bool {
    let Some(entry) = source.get(id) else {
        return false;
    };

    if dest.contains(id) {
        log::warn!(
            "Transfer of {} ({}) skipped: destination already holds this id",
            entry.name(),
            id
        );
        return false;
    }
    if !dest.can_accept(entry) {
        return false;
    }

    let Some(entry) = source.take_by_id(id) else {
        return false;
    };
    let name = entry.name().to_string();
    match dest.try_add(entry.clone()) {
        Some(_) => true,
        None => {
            // Acceptance was checked above; put the entry back where it was.
            log::warn!("Destination refused {} after accepting it; rolling back", name);
            if source.try_add(entry).is_none() {
                log::warn!("Rollback of {} ({}) failed", name, id);
            }
            false
        }
    }
}

/// Move every entry of a type, as many as the destination can take
pub fn move_all_of_type(
    source: &mut Container,
    dest: &mut Container,
    item_type: &Arc<ItemType>,
) -> TransferResult {
    let ids: Vec<InstanceId> = source
        .entries()
        .iter()
        .filter(|e| e.is_of_type(item_type))
        .map(|e| e.id)
        .collect();

    let moved = ids
        .into_iter()
        .filter(|id| transfer(source, dest, *id))
        .count();

    TransferResult {
        success: moved > 0,
        moved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemEntry;

    fn item(volume: f32) -> Arc<ItemType> {
        Arc::new(ItemType::new("thing", "Thing").with_volume(volume))
    }

    #[test]
    fn test_inventory_to_storage() {
        let mut inv = Container::new(10.0);
        let mut chest = Container::new(10.0);
        let ty = item(3.0);
        let id = inv.try_add(ItemEntry::new(ty.clone())).unwrap();

        assert!(can_transfer(&inv, &chest, id));
        assert!(transfer(&mut inv, &mut chest, id));
        assert_eq!(inv.count_by_type(&ty), 0);
        assert_eq!(chest.count_by_type(&ty), 1);
        assert!(chest.contains(id));
    }

    #[test]
    fn test_capacity_blocks_transfer() {
        let mut inv = Container::new(30.0);
        let mut chest = Container::new(2.0);
        let ty = item(3.0);
        let id = inv.try_add(ItemEntry::new(ty.clone())).unwrap();

        assert!(!can_transfer(&inv, &chest, id));
        assert!(!transfer(&mut inv, &mut chest, id));
        assert_eq!(inv.count_by_type(&ty), 1);
        assert_eq!(chest.count_by_type(&ty), 0);
    }

    #[test]
    fn test_unknown_id() {
        let mut a = Container::new(5.0);
        let mut b = Container::new(5.0);
        assert!(!transfer(&mut a, &mut b, InstanceId::new()));
    }

    #[test]
    fn test_id_held_by_both_is_noop() {
        let mut a = Container::new(5.0);
        let mut b = Container::new(5.0);
        let entry = ItemEntry::spawn(item(1.0));
        a.try_add(entry.clone());
        b.try_add(entry.clone());

        assert!(!transfer(&mut a, &mut b, entry.id));
        assert!(a.contains(entry.id));
        assert!(b.contains(entry.id));
    }

    #[test]
    fn test_move_all_partial() {
        let mut inv = Container::new(30.0);
        let mut chest = Container::new(5.0);
        let ty = item(3.0);
        inv.try_add(ItemEntry::new(ty.clone()));
        inv.try_add(ItemEntry::new(ty.clone()));

        let result = move_all_of_type(&mut inv, &mut chest, &ty);
        assert!(result.success);
        assert_eq!(result.moved, 1);
        assert_eq!(inv.count_by_type(&ty), 1);
        assert_eq!(chest.count_by_type(&ty), 1);
    }
}
