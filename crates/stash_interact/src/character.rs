//! Acting character collaborator

use stash_inventory::{Container, ItemEntry};

/// What the orchestration needs from whoever is acting
///
/// The held entry lives outside the inventory's own entries.
pub trait ItemHolder {
    /// Own inventory
    fn inventory(&self) -> &Container;

    /// Own inventory, mutable
    fn inventory_mut(&mut self) -> &mut Container;

    /// Entry currently in hand
    fn held(&self) -> Option<&ItemEntry>;

    /// Entry currently in hand, mutable
    fn held_mut(&mut self) -> Option<&mut ItemEntry>;

    /// Empty the hand, returning what was in it
    fn take_held(&mut self) -> Option<ItemEntry>;

    /// Put an entry in hand
    ///
    /// Returns the entry back if the hand is occupied or the item cannot be held.
    fn set_held(&mut self, entry: ItemEntry) -> Result<(), ItemEntry>;

    /// Check if anything is in hand
    fn is_holding(&self) -> bool {
        self.held().is_some()
    }
}

/// Plain character with an inventory and one hand
#[derive(Debug, Default)]
pub struct Character {
    /// Display name
    pub name: String,
    inventory: Container,
    held: Option<ItemEntry>,
}

impl Character {
    /// Create a character with an inventory capacity
    pub fn new(name: impl Into<String>, inventory_capacity: f32) -> Self {
        Self {
            name: name.into(),
            inventory: Container::new(inventory_capacity),
            held: None,
        }
    }
}

impl ItemHolder for Character {
    fn inventory(&self) -> &Container {
        &self.inventory
    }

    fn inventory_mut(&mut self) -> &mut Container {
        &mut self.inventory
    }

    fn held(&self) -> Option<&ItemEntry> {
        self.held.as_ref()
    }

    fn held_mut(&mut self) -> Option<&mut ItemEntry> {
        self.held.as_mut()
    }

    fn take_held(&mut self) -> Option<ItemEntry> {
        self.held.take()
    }

    fn set_held(&mut self, entry: ItemEntry) -> Result<(), ItemEntry> {
        let holdable = entry
            .item_type
            .as_ref()
            .map(|t| t.can_be_held)
            .unwrap_or(false);
        if self.held.is_some() || !holdable {
            return Err(entry);
        }
        self.held = Some(entry);
        Ok(())
    }
}
