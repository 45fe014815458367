//! Stash Interact - Item Interaction Orchestration
//!
//! This crate decides, frame by frame, whether an item moves between the
//! world, a character's inventory, the character's hand and world containers.
//!
//! # Features
//!
//! - Tap / hold gesture timing with progress reporting
//! - Pick up, hold, put back, drop and store transitions
//! - Check-then-commit moves; refused moves change nothing
//! - Bags keep their contents when picked up and dropped
//! - Injected world and character collaborators
//! - TOML configuration
//!
//! # Example
//!
//! ```ignore
//! use stash_interact::prelude::*;
//!
//! let mut system = InteractionSystem::new(InteractionConfig::default());
//!
//! // Each frame
//! let input = FrameInput::new().press().aiming(target);
//! for event in system.advance(dt, &input, &mut player, &mut world) {
//!     if let Some(message) = event.message() {
//!         hud.log(message);
//!     }
//! }
//! ```

pub mod character;
pub mod config;
pub mod events;
pub mod gesture;
pub mod interaction;
pub mod world;

pub mod prelude {
    pub use crate::character::{Character, ItemHolder};
    pub use crate::config::{ConfigError, ConfigResult, InteractionConfig};
    pub use crate::events::{HeldSource, InteractionCallback, InteractionEvent, RejectReason};
    pub use crate::gesture::{GestureRelease, GestureTick, HoldGesture};
    pub use crate::interaction::{
        Aim, FrameInput, InteractionState, InteractionSystem, InventoryAction,
    };
    pub use crate::world::{PropHandle, SimpleWorld, WorldItems, WorldProp};
}

pub use prelude::*;
