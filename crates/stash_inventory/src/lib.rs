//! Stash Inventory - Item Containers
//!
//! This crate provides the item model shared by player inventories and world
//! containers (chests, backpacks, cartridge sockets).
//!
//! # Features
//!
//! - Shared, immutable item types resolved by stable path
//! - Item entries with unique instance ids and per-instance properties
//! - Volume-bounded containers without stacking
//! - Add/remove notifications for UI refresh
//! - Check-then-commit transfers between containers
//!
//! # Example
//!
//! ```ignore
//! use stash_inventory::prelude::*;
//!
//! let mut catalog = ItemCatalog::new();
//! let apple = catalog.register(ItemType::new("/Game/Items/Apple", "Apple").with_volume(0.5));
//!
//! let mut inventory = Container::new(30.0);
//! let id = inventory.try_add(ItemEntry::new(apple.clone())).expect("room for an apple");
//! assert_eq!(inventory.count_by_type(&apple), 1);
//! ```

pub mod catalog;
pub mod container;
pub mod item;
pub mod transfer;

pub mod prelude {
    pub use crate::catalog::{ItemCatalog, ItemTypeResolver};
    pub use crate::container::{
        Container, ContainerEvent, ContainerObserver, ObserverId, DEFAULT_CAPACITY, VOLUME_EPSILON,
    };
    pub use crate::item::{keys, InstanceId, ItemEntry, ItemType, PropertyBag};
    pub use crate::transfer::{can_transfer, move_all_of_type, transfer, TransferResult};
}

pub use prelude::*;
