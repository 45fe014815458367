//! Saving a container into a parent entry's property bag and back

use crate::error::PayloadError;
use crate::payload::{self, PayloadFormat};
use stash_inventory::{Container, ItemEntry, ItemTypeResolver};

/// Property key holding the encoded entries
pub const STORAGE_DATA_KEY: &str = "StorageData";

/// Property key holding the capacity as a decimal string
pub const STORAGE_CAPACITY_KEY: &str = "StorageMaxVolume";

/// Property key naming the payload format; absent means compact
pub const STORAGE_FORMAT_KEY: &str = "StorageFormat";

/// Write the container into `parent` using the compact format
pub fn save_into_entry(container: &Container, parent: &mut ItemEntry) {
    save_into_entry_as(container, parent, PayloadFormat::Compact);
}

/// Write the container into `parent` using `format`
pub fn save_into_entry_as(container: &Container, parent: &mut ItemEntry, format: PayloadFormat) {
    let data = payload::encode(container.entries(), format);
    let props = &mut parent.properties;
    props.set(STORAGE_DATA_KEY, data);
    props.set(STORAGE_CAPACITY_KEY, format!("{}", container.capacity()));
    match format {
        PayloadFormat::Compact => {
            props.remove(STORAGE_FORMAT_KEY);
        }
        PayloadFormat::Extended => {
            props.set(STORAGE_FORMAT_KEY, format.to_string());
        }
    }

    log::debug!(
        "Saved {} entries ({}) into {}",
        container.len(),
        format,
        parent.name()
    );
}

/// Restore the container from `parent`
///
/// No-op when the entry carries no payload. Otherwise the capacity is applied
/// if it parses and the contents are fully replaced. Entries that no longer fit
/// are returned rather than dropped.
pub fn restore_from_entry(
    parent: &ItemEntry,
    container: &mut Container,
    resolver: &dyn ItemTypeResolver,
) -> Vec<ItemEntry> {
    let props = &parent.properties;
    let data = match props.get(STORAGE_DATA_KEY) {
        Some(data) if !data.is_empty() => data,
        _ => return Vec::new(),
    };

    if let Some(raw) = props.get(STORAGE_CAPACITY_KEY) {
        match parse_capacity(raw) {
            Ok(capacity) => container.set_capacity(capacity),
            Err(e) => log::warn!("Keeping capacity {}: {}", container.capacity(), e),
        }
    }

    let format = match props.get(STORAGE_FORMAT_KEY) {
        Some(tag) => match tag.parse::<PayloadFormat>() {
            Ok(format) => format,
            Err(e) => {
                log::warn!("{}; decoding as compact", e);
                PayloadFormat::Compact
            }
        },
        None => PayloadFormat::Compact,
    };

    let entries = payload::decode(data, format, resolver);
    let overflow = container.replace_entries(entries);

    log::info!(
        "Restored {} entries into {} (capacity {}, {} overflow)",
        container.len(),
        parent.name(),
        container.capacity(),
        overflow.len()
    );
    overflow
}

/// Check whether `entry` carries a non-empty storage payload
pub fn has_storage_payload(entry: &ItemEntry) -> bool {
    entry
        .properties
        .get(STORAGE_DATA_KEY)
        .map(|data| !data.is_empty())
        .unwrap_or(false)
}

/// Remove all storage keys from `entry`
pub fn clear_storage_payload(entry: &mut ItemEntry) {
    entry.properties.remove(STORAGE_DATA_KEY);
    entry.properties.remove(STORAGE_CAPACITY_KEY);
    entry.properties.remove(STORAGE_FORMAT_KEY);
}

fn parse_capacity(raw: &str) -> Result<f32, PayloadError> {
    match raw.trim().parse::<f32>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(PayloadError::InvalidCapacity(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_inventory::{keys, ItemCatalog, ItemType};
    use std::sync::Arc;

    fn setup() -> (ItemCatalog, Arc<ItemType>, Arc<ItemType>) {
        let mut catalog = ItemCatalog::new();
        let backpack = catalog
            .register(ItemType::new("/Game/Items/Backpack", "Backpack").with_volume(10.0));
        let apple = catalog.register(ItemType::new("/Game/Items/Apple", "Apple").with_max_uses(3));
        (catalog, backpack, apple)
    }

    #[test]
    fn test_save_writes_both_keys() {
        let (_, backpack, apple) = setup();
        let mut bag = Container::new(12.5);
        bag.try_add(ItemEntry::new(apple));

        let mut parent = ItemEntry::spawn(backpack);
        save_into_entry(&bag, &mut parent);

        assert!(has_storage_payload(&parent));
        assert!(parent.properties.get(STORAGE_DATA_KEY).unwrap().starts_with("1|"));
        assert_eq!(parent.properties.get(STORAGE_CAPACITY_KEY), Some("12.5"));
        assert!(!parent.properties.contains(STORAGE_FORMAT_KEY));
    }

    #[test]
    fn test_restore_without_payload_is_noop() {
        let (catalog, backpack, apple) = setup();
        let mut bag = Container::new(7.0);
        bag.try_add(ItemEntry::new(apple));

        let mut parent = ItemEntry::spawn(backpack);
        parent.properties.set(STORAGE_DATA_KEY, "");
        parent.properties.set(STORAGE_CAPACITY_KEY, "99");

        assert!(restore_from_entry(&parent, &mut bag, &catalog).is_empty());
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.capacity(), 7.0);
    }

    #[test]
    fn test_restore_replaces_contents_and_capacity() {
        let (catalog, backpack, apple) = setup();
        let mut source = Container::new(4.0);
        let kept = source.try_add(ItemEntry::new(apple.clone())).unwrap();

        let mut parent = ItemEntry::spawn(backpack);
        save_into_entry(&source, &mut parent);

        let mut target = Container::new(60.0);
        target.try_add(ItemEntry::new(apple.clone()));
        target.try_add(ItemEntry::new(apple));

        let overflow = restore_from_entry(&parent, &mut target, &catalog);
        assert!(overflow.is_empty());
        assert_eq!(target.capacity(), 4.0);
        assert_eq!(target.len(), 1);
        assert!(target.contains(kept));
    }

    #[test]
    fn test_bad_capacity_keeps_current() {
        let (catalog, backpack, apple) = setup();
        let mut source = Container::new(4.0);
        source.try_add(ItemEntry::new(apple));

        let mut parent = ItemEntry::spawn(backpack);
        save_into_entry(&source, &mut parent);
        parent.properties.set(STORAGE_CAPACITY_KEY, "-3");

        let mut target = Container::new(9.0);
        restore_from_entry(&parent, &mut target, &catalog);
        assert_eq!(target.capacity(), 9.0);
        assert_eq!(target.len(), 1);
    }

    #[test]
    fn test_extended_restore_keeps_properties() {
        let (catalog, backpack, apple) = setup();
        let mut source = Container::new(5.0);
        let id = source
            .try_add(ItemEntry::new(apple).with_property(keys::USES_REMAINING, "1"))
            .unwrap();

        let mut parent = ItemEntry::spawn(backpack);
        save_into_entry_as(&source, &mut parent, PayloadFormat::Extended);
        assert_eq!(parent.properties.get(STORAGE_FORMAT_KEY), Some("extended"));

        let mut target = Container::default();
        restore_from_entry(&parent, &mut target, &catalog);
        let restored = target.get(id).unwrap();
        assert_eq!(restored.properties.get(keys::USES_REMAINING), Some("1"));
        assert_eq!(restored.uses_remaining(), Some(1));

        // Re-saving compact clears the format tag.
        save_into_entry(&target, &mut parent);
        assert!(!parent.properties.contains(STORAGE_FORMAT_KEY));
    }

    #[test]
    fn test_shrunken_capacity_returns_overflow() {
        let (catalog, backpack, apple) = setup();
        let mut source = Container::new(3.0);
        for _ in 0..3 {
            source.try_add(ItemEntry::new(apple.clone()));
        }

        let mut parent = ItemEntry::spawn(backpack);
        save_into_entry(&source, &mut parent);
        parent.properties.set(STORAGE_CAPACITY_KEY, "2");

        let mut target = Container::default();
        let overflow = restore_from_entry(&parent, &mut target, &catalog);
        assert_eq!(target.len(), 2);
        assert_eq!(overflow.len(), 1);
    }

    #[test]
    fn test_clear_payload() {
        let (_, backpack, _) = setup();
        let mut parent = ItemEntry::spawn(backpack);
        save_into_entry_as(&Container::new(1.0), &mut parent, PayloadFormat::Extended);
        parent.properties.set("Durability", "0.5");

        clear_storage_payload(&mut parent);
        assert!(!has_storage_payload(&parent));
        assert_eq!(parent.properties.len(), 1);
    }
}
