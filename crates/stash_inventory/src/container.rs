//! Volume-bounded item container

use crate::item::{InstanceId, ItemEntry, ItemType};
use std::fmt;
use std::sync::Arc;

/// Tolerance for floating point accumulation in capacity checks
pub const VOLUME_EPSILON: f32 = 1.0e-4;

/// Default capacity of a world container
pub const DEFAULT_CAPACITY: f32 = 60.0;

/// Container notifications
#[derive(Debug, Clone)]
pub enum ContainerEvent {
    /// An entry was accepted (carries the final entry, id assigned)
    ItemAdded(ItemEntry),
    /// An entry was removed
    ItemRemoved(InstanceId),
}

/// Callback invoked for every container notification
pub type ContainerObserver = Box<dyn Fn(&ContainerEvent) + Send + Sync>;

/// Registration token returned by [`Container::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Ordered collection of item entries limited by total volume
///
/// Insertion order is display order; removal swaps the last entry into the
/// freed position, so order is not stable across removals.
pub struct Container {
    capacity: f32,
    entries: Vec<ItemEntry>,
    observers: Vec<(ObserverId, ContainerObserver)>,
    next_observer: u64,
}

impl Container {
    /// Create an empty container with a capacity
    pub fn new(capacity: f32) -> Self {
        Self {
            capacity: capacity.max(0.0),
            entries: Vec::new(),
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    /// Maximum volume
    pub fn capacity(&self) -> f32 {
        self.capacity
    }

    /// Change the maximum volume
    ///
    /// Shrinking below the used volume is allowed (restored saves may do so);
    /// further inserts are then rejected until enough is removed.
    pub fn set_capacity(&mut self, capacity: f32) {
        self.capacity = capacity.max(0.0);
    }

    /// Sum of the volumes of all entries
    pub fn used_volume(&self) -> f32 {
        self.entries.iter().map(ItemEntry::volume).sum()
    }

    /// Remaining volume, never negative
    pub fn free_volume(&self) -> f32 {
        (self.capacity - self.used_volume()).max(0.0)
    }

    /// Check whether `entry` would be accepted by [`Container::try_add`]
    pub fn can_accept(&self, entry: &ItemEntry) -> bool {
        let Some(item_type) = entry.item_type.as_ref() else {
            return false;
        };
        if !entry.id.is_nil() && self.contains(entry.id) {
            return false;
        }
        self.used_volume() + item_type.effective_volume() <= self.capacity + VOLUME_EPSILON
    }

    /// Insert an entry, assigning a fresh id if it has none
    ///
    /// Returns the id the stored copy carries, or `None` if rejected (no
    /// mutation, no notification).
    pub fn try_add(&mut self, mut entry: ItemEntry) -> Option<InstanceId> {
        if !self.can_accept(&entry) {
            log::debug!(
                "Rejected {} (used {:.2} / {:.2})",
                entry.name(),
                self.used_volume(),
                self.capacity
            );
            return None;
        }

        if entry.id.is_nil() {
            entry.id = InstanceId::new();
        }
        let id = entry.id;
        self.entries.push(entry.clone());
        self.notify(&ContainerEvent::ItemAdded(entry));
        Some(id)
    }

    /// Remove an entry by id and hand it back
    pub fn take_by_id(&mut self, id: InstanceId) -> Option<ItemEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        let entry = self.entries.swap_remove(index);
        self.notify(&ContainerEvent::ItemRemoved(id));
        Some(entry)
    }

    /// Remove an entry by id; `false` if no entry has that id
    pub fn remove_by_id(&mut self, id: InstanceId) -> bool {
        self.take_by_id(id).is_some()
    }

    /// Number of entries of exactly this type (reference identity)
    pub fn count_by_type(&self, item_type: &Arc<ItemType>) -> usize {
        self.entries.iter().filter(|e| e.is_of_type(item_type)).count()
    }

    /// First entry of a type in display order
    pub fn find_first_of_type(&self, item_type: &Arc<ItemType>) -> Option<&ItemEntry> {
        self.entries.iter().find(|e| e.is_of_type(item_type))
    }

    /// Get an entry by id
    pub fn get(&self, id: InstanceId) -> Option<&ItemEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Check if an id is present
    pub fn contains(&self, id: InstanceId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// All entries in display order
    pub fn entries(&self) -> &[ItemEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the whole contents (restore path)
    ///
    /// Entries are admitted in order while they are typed, unique and fit.
    /// Everything else is returned so the caller can put it somewhere rather
    /// than lose it. No notifications are emitted.
    pub fn replace_entries(&mut self, entries: Vec<ItemEntry>) -> Vec<ItemEntry> {
        self.entries.clear();
        let mut rejected = Vec::new();

        for mut entry in entries {
            if entry.id.is_nil() {
                entry.id = InstanceId::new();
            }
            if self.can_accept(&entry) {
                self.entries.push(entry);
            } else {
                log::warn!(
                    "Restored entry {} ({}) does not fit; returning it to the caller",
                    entry.name(),
                    entry.id
                );
                rejected.push(entry);
            }
        }

        rejected
    }

    /// Register an observer for add/remove notifications
    pub fn subscribe<F>(&mut self, f: F) -> ObserverId
    where
        F: Fn(&ContainerEvent) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(f)));
        id
    }

    /// Remove an observer
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    fn notify(&self, event: &ContainerEvent) {
        for (_, observer) in &self.observers {
            observer(event);
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("capacity", &self.capacity)
            .field("entries", &self.entries)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn item(path: &str, volume: f32) -> Arc<ItemType> {
        Arc::new(ItemType::new(path, path).with_volume(volume))
    }

    #[test]
    fn test_volume_add_within_capacity() {
        let mut c = Container::new(20.0);
        let a = ItemEntry::new(item("a", 5.0));
        let b = ItemEntry::new(item("b", 7.0));
        let big = ItemEntry::new(item("c", 9.0));

        assert!(c.try_add(a).is_some());
        assert_eq!(c.used_volume(), 5.0);
        assert!(c.try_add(b).is_some());
        assert_eq!(c.used_volume(), 12.0);

        assert!(!c.can_accept(&big));
        assert!(c.try_add(big).is_none());
        assert_eq!(c.used_volume(), 12.0);
    }

    #[test]
    fn test_exact_fill_accepted() {
        let mut c = Container::new(1.0);
        let tenth = item("tenth", 0.1);
        for _ in 0..10 {
            assert!(c.try_add(ItemEntry::new(tenth.clone())).is_some());
        }
        assert!(c.try_add(ItemEntry::new(tenth)).is_none());
    }

    #[test]
    fn test_assigns_id_only_when_nil() {
        let mut c = Container::new(10.0);
        let ty = item("a", 1.0);

        let assigned = c.try_add(ItemEntry::new(ty.clone())).unwrap();
        assert!(!assigned.is_nil());

        let fixed = InstanceId::new();
        assert_eq!(c.try_add(ItemEntry::new(ty).with_id(fixed)), Some(fixed));
        assert!(c.entries().iter().all(ItemEntry::is_valid));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut c = Container::new(10.0);
        let entry = ItemEntry::spawn(item("a", 1.0));

        assert!(c.try_add(entry.clone()).is_some());
        assert!(!c.can_accept(&entry));
        assert!(c.try_add(entry).is_none());
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_remove_and_count() {
        let mut c = Container::new(10.0);
        let a_ty = item("a", 1.0);
        let b_ty = item("b", 1.0);
        let a = c.try_add(ItemEntry::new(a_ty.clone())).unwrap();
        c.try_add(ItemEntry::new(b_ty.clone())).unwrap();

        assert_eq!(c.count_by_type(&a_ty), 1);
        assert!(c.remove_by_id(a));
        assert_eq!(c.count_by_type(&a_ty), 0);
        assert_eq!(c.count_by_type(&b_ty), 1);
        assert!(!c.remove_by_id(a));
        assert!(!c.remove_by_id(InstanceId::new()));
    }

    #[test]
    fn test_added_event_carries_stored_entry() {
        let added = Arc::new(Mutex::new(Vec::new()));
        let sink = added.clone();
        let mut c = Container::new(10.0);
        c.subscribe(move |e| {
            if let ContainerEvent::ItemAdded(entry) = e {
                sink.lock().push(entry.clone());
            }
        });

        let id = c
            .try_add(ItemEntry::new(item("a", 1.0)).with_property("Durability", "0.5"))
            .unwrap();

        let added = added.lock();
        assert_eq!(added.len(), 1);
        let stored = c.get(id).unwrap();
        assert_eq!(added[0].id, stored.id);
        assert_eq!(added[0].properties, stored.properties);
    }

    #[test]
    fn test_typeless_entry_rejected_silently() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();

        let mut c = Container::new(10.0);
        c.subscribe(move |e| sink.lock().push(e.clone()));

        assert!(!c.can_accept(&ItemEntry::empty()));
        assert!(c.try_add(ItemEntry::empty()).is_none());
        assert_eq!(c.used_volume(), 0.0);
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_notifications() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();

        let mut c = Container::new(10.0);
        let observer = c.subscribe(move |e| sink.lock().push(e.clone()));

        let id = c.try_add(ItemEntry::new(item("a", 1.0))).unwrap();
        c.remove_by_id(id);

        {
            let log = events.lock();
            assert_eq!(log.len(), 2);
            assert!(matches!(&log[0], ContainerEvent::ItemAdded(e) if e.id == id));
            assert!(matches!(&log[1], ContainerEvent::ItemRemoved(r) if *r == id));
        }

        assert!(c.unsubscribe(observer));
        c.try_add(ItemEntry::new(item("b", 1.0)));
        assert_eq!(events.lock().len(), 2);
    }

    #[test]
    fn test_replace_returns_overflow() {
        let mut c = Container::new(5.0);
        let ty = item("brick", 2.0);
        let entries: Vec<_> = (0..3).map(|_| ItemEntry::spawn(ty.clone())).collect();

        let overflow = c.replace_entries(entries);
        assert_eq!(c.len(), 2);
        assert_eq!(overflow.len(), 1);
        assert!(c.used_volume() <= c.capacity() + VOLUME_EPSILON);
    }

    #[test]
    fn test_free_volume_never_negative() {
        let mut c = Container::new(4.0);
        c.try_add(ItemEntry::new(item("a", 3.0)));
        assert_eq!(c.free_volume(), 1.0);

        c.set_capacity(1.0);
        assert_eq!(c.free_volume(), 0.0);
    }
}
