//! World collaborators: pickups and placed containers
//!
//! The orchestration never owns world objects. It reaches them through
//! [`WorldItems`] using opaque [`PropHandle`]s whose lifetime the host controls.

use stash_inventory::{Container, ItemCatalog, ItemEntry};
use stash_persist::{clear_storage_payload, has_storage_payload, restore_from_entry};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Opaque handle to a world object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropHandle(u64);

impl PropHandle {
    /// Create from a raw host id
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw host id
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PropHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prop#{}", self.0)
    }
}

/// Lookup interface for world objects
pub trait WorldItems {
    /// Item a pickup represents; `None` for plain containers or stale handles
    fn entry(&self, prop: PropHandle) -> Option<&ItemEntry>;

    /// Overwrite what a pickup represents
    fn set_entry(&mut self, prop: PropHandle, entry: ItemEntry) -> bool;

    /// Container hosted by the object, if any
    fn container(&self, prop: PropHandle) -> Option<&Container>;

    /// Mutable container hosted by the object, if any
    fn container_mut(&mut self, prop: PropHandle) -> Option<&mut Container>;

    /// Remove the object from the world
    fn destroy(&mut self, prop: PropHandle) -> bool;

    /// Place an entry in the world as a free pickup
    ///
    /// Returns `None` if the world could not spawn it; the caller still owns
    /// the entry in that case.
    fn spawn_dropped(&mut self, entry: ItemEntry, site: [f32; 3]) -> Option<PropHandle>;
}

/// One object in a [`SimpleWorld`]
#[derive(Debug, Default)]
pub struct WorldProp {
    /// Display name
    pub name: String,
    /// Item the object represents (pickups only)
    pub entry: Option<ItemEntry>,
    /// Hosted container (chests, backpacks)
    pub container: Option<Container>,
    /// World position
    pub position: [f32; 3],
}

impl WorldProp {
    /// A loose item pickup
    pub fn pickup(name: impl Into<String>, entry: ItemEntry) -> Self {
        Self {
            name: name.into(),
            entry: Some(entry),
            ..Default::default()
        }
    }

    /// A placed container that is not itself an item
    pub fn storage(name: impl Into<String>, capacity: f32) -> Self {
        Self {
            name: name.into(),
            container: Some(Container::new(capacity)),
            ..Default::default()
        }
    }

    /// Attach a container (turns a pickup into a bag)
    pub fn with_container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    /// Set position
    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }
}

/// In-memory world used by tests and the sandbox
pub struct SimpleWorld {
    props: BTreeMap<PropHandle, WorldProp>,
    catalog: Arc<ItemCatalog>,
    storage_capacity: f32,
    next_handle: u64,
    spawning_enabled: bool,
}

impl SimpleWorld {
    /// Create an empty world resolving nested payloads through `catalog`
    pub fn new(catalog: Arc<ItemCatalog>) -> Self {
        Self {
            props: BTreeMap::new(),
            catalog,
            storage_capacity: stash_inventory::DEFAULT_CAPACITY,
            next_handle: 1,
            spawning_enabled: true,
        }
    }

    /// Capacity given to dropped bags whose payload has no saved capacity
    pub fn with_storage_capacity(mut self, capacity: f32) -> Self {
        self.storage_capacity = capacity;
        self
    }

    /// Allow or refuse [`WorldItems::spawn_dropped`]
    pub fn set_spawning_enabled(&mut self, enabled: bool) {
        self.spawning_enabled = enabled;
    }

    /// Add an object
    pub fn add(&mut self, prop: WorldProp) -> PropHandle {
        let handle = PropHandle(self.next_handle);
        self.next_handle += 1;
        self.props.insert(handle, prop);
        handle
    }

    /// Get an object
    pub fn get(&self, prop: PropHandle) -> Option<&WorldProp> {
        self.props.get(&prop)
    }

    /// Find the first object with a name
    pub fn find(&self, name: &str) -> Option<PropHandle> {
        self.props
            .iter()
            .find(|(_, p)| p.name == name)
            .map(|(h, _)| *h)
    }

    /// Iterate objects in creation order
    pub fn iter(&self) -> impl Iterator<Item = (PropHandle, &WorldProp)> {
        self.props.iter().map(|(h, p)| (*h, p))
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.props.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

impl WorldItems for SimpleWorld {
    fn entry(&self, prop: PropHandle) -> Option<&ItemEntry> {
        self.props.get(&prop)?.entry.as_ref()
    }

    fn set_entry(&mut self, prop: PropHandle, entry: ItemEntry) -> bool {
        match self.props.get_mut(&prop) {
            Some(p) => {
                p.entry = Some(entry);
                true
            }
            None => false,
        }
    }

    fn container(&self, prop: PropHandle) -> Option<&Container> {
        self.props.get(&prop)?.container.as_ref()
    }

    fn container_mut(&mut self, prop: PropHandle) -> Option<&mut Container> {
        self.props.get_mut(&prop)?.container.as_mut()
    }

    fn destroy(&mut self, prop: PropHandle) -> bool {
        self.props.remove(&prop).is_some()
    }

    fn spawn_dropped(&mut self, mut entry: ItemEntry, site: [f32; 3]) -> Option<PropHandle> {
        if !self.spawning_enabled {
            log::warn!("World refused to spawn {}", entry.name());
            return None;
        }

        let mut overflow = Vec::new();
        let container = if has_storage_payload(&entry) {
            let mut container = Container::new(self.storage_capacity);
            overflow = restore_from_entry(&entry, &mut container, self.catalog.as_ref());
            clear_storage_payload(&mut entry);
            Some(container)
        } else {
            None
        };

        let name = entry.name().to_string();
        let mut prop = WorldProp::pickup(name, entry).with_position(site);
        prop.container = container;
        let handle = self.add(prop);

        // Contents that no longer fit the restored bag land next to it.
        for spilled in overflow {
            let name = spilled.name().to_string();
            self.add(WorldProp::pickup(name, spilled).with_position(site));
        }

        Some(handle)
    }
}

impl fmt::Debug for SimpleWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleWorld")
            .field("props", &self.props)
            .field("catalog", &self.catalog.len())
            .field("storage_capacity", &self.storage_capacity)
            .field("spawning_enabled", &self.spawning_enabled)
            .finish()
    }
}
