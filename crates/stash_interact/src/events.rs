//! Interaction events

use crate::world::PropHandle;
use stash_inventory::InstanceId;
use std::fmt;

/// Where a newly held item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeldSource {
    /// Straight from a world pickup
    World,
    /// From the character's inventory
    Inventory,
}

/// Why an interaction did nothing
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// Item type forbids storage
    CannotBeStored(String),
    /// Item type forbids holding
    CannotBeHeld(String),
    /// Inventory has no room
    InventoryFull(String),
    /// Target container has no room
    StorageFull,
    /// Target has no container
    NoStorage,
    /// No entry with this id where it was expected
    NotFound(InstanceId),
    /// Nothing in hand
    NothingHeld,
    /// Held item has no use action
    NotUsable(String),
    /// The world could not place the item
    SpawnFailed(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CannotBeStored(name) => write!(f, "{} cannot be stored", name),
            Self::CannotBeHeld(name) => write!(f, "{} cannot be held", name),
            Self::InventoryFull(name) => write!(f, "Inventory full, could not add {}", name),
            Self::StorageFull => write!(f, "Storage full"),
            Self::NoStorage => write!(f, "Nothing to store into"),
            Self::NotFound(id) => write!(f, "Item {} not found", id),
            Self::NothingHeld => write!(f, "Not holding anything"),
            Self::NotUsable(name) => write!(f, "{} cannot be used", name),
            Self::SpawnFailed(name) => write!(f, "Could not place {}", name),
        }
    }
}

/// Something that happened during [`crate::InteractionSystem::advance`]
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    /// Hold gesture past the tap window (0..1)
    GestureProgress(f32),
    /// Hold gesture released early or interrupted
    GestureCancelled,
    /// World pickup moved into the inventory
    PickedUp { id: InstanceId, prop: PropHandle },
    /// Entry is now in hand
    Held { id: InstanceId, source: HeldSource },
    /// Held entry went back into the inventory
    PutBack { id: InstanceId },
    /// Entry placed in the world
    Dropped { id: InstanceId, prop: PropHandle },
    /// Entry moved into a world container
    Stored { id: InstanceId, prop: PropHandle },
    /// Entry moved from a world container into the inventory
    Retrieved { id: InstanceId, prop: PropHandle },
    /// Held consumable used, with uses left
    Used { id: InstanceId, remaining: u32 },
    /// Held consumable used up
    Consumed { id: InstanceId },
    /// Interaction refused; nothing changed
    Rejected(RejectReason),
}

impl InteractionEvent {
    /// Check if this is a rejection
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Message for the HUD log, if the event has one
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Rejected(reason) => Some(reason.to_string()),
            _ => None,
        }
    }
}

/// Callback for interaction events
pub type InteractionCallback = Box<dyn Fn(&InteractionEvent) + Send + Sync>;
