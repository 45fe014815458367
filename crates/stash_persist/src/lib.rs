//! Stash Persist - Nested Container Payloads
//!
//! This crate flattens a container's contents into a string stored inside a
//! parent item's property bag, so one container can live in a slot of another.
//!
//! # Features
//!
//! - Compact `count|path|id|...` payload (ids and types only)
//! - Extended payload that keeps per-instance properties
//! - Tolerant decoding: bad entries are logged and skipped
//! - Save/restore of capacity and contents through fixed property keys
//!
//! # Example
//!
//! ```ignore
//! use stash_persist::prelude::*;
//!
//! // Save a backpack's contents into its own entry
//! save_into_entry(&backpack_container, &mut backpack_entry);
//!
//! // Later, rebuild the container from the entry
//! let overflow = restore_from_entry(&backpack_entry, &mut container, &catalog);
//! ```

pub mod error;
pub mod payload;
pub mod storage;

pub mod prelude {
    pub use crate::error::PayloadError;
    pub use crate::payload::{
        decode, deserialize, deserialize_extended, encode, serialize, serialize_extended,
        PayloadFormat,
    };
    pub use crate::storage::{
        clear_storage_payload, has_storage_payload, restore_from_entry, save_into_entry,
        save_into_entry_as, STORAGE_CAPACITY_KEY, STORAGE_DATA_KEY, STORAGE_FORMAT_KEY,
    };
}

pub use prelude::*;
