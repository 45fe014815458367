//! Pick-up / hold / drop / store orchestration
//!
//! The host calls [`InteractionSystem::advance`] once per frame with what the
//! character is aiming at and which buttons changed. Every transition checks
//! before it commits; a refused transition leaves inventory, hand and world
//! untouched and reports a [`RejectReason`].

use crate::character::ItemHolder;
use crate::config::InteractionConfig;
use crate::events::{HeldSource, InteractionCallback, InteractionEvent, RejectReason};
use crate::gesture::{GestureRelease, GestureTick, HoldGesture};
use crate::world::{PropHandle, WorldItems};
use stash_inventory::{keys, transfer, InstanceId, ItemEntry};
use stash_persist::save_into_entry_as;

/// What the character is aiming at this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aim {
    /// Nothing in reach
    #[default]
    Nothing,
    /// A world object
    Prop(PropHandle),
}

/// Inventory screen actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryAction {
    /// Take an inventory entry into hand
    Hold(InstanceId),
    /// Place an inventory entry in the world
    Drop(InstanceId),
    /// Move an inventory entry into a world container
    Store { prop: PropHandle, id: InstanceId },
    /// Move an entry from a world container into the inventory
    Retrieve { prop: PropHandle, id: InstanceId },
}

/// Input for one frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Pick-up button went down this frame
    pub pickup_pressed: bool,
    /// Pick-up button went up this frame
    pub pickup_released: bool,
    /// Aim target
    pub aim: Aim,
    /// Where dropped items land
    pub drop_site: [f32; 3],
    /// Store the held item into the aimed container
    pub store_held: bool,
    /// Use the held item
    pub use_held: bool,
    /// Inventory UI is open
    pub ui_open: bool,
    /// Inventory screen action
    pub action: Option<InventoryAction>,
}

impl FrameInput {
    /// Empty frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Press the pick-up button
    pub fn press(mut self) -> Self {
        self.pickup_pressed = true;
        self
    }

    /// Release the pick-up button
    pub fn release(mut self) -> Self {
        self.pickup_released = true;
        self
    }

    /// Aim at a world object
    pub fn aiming(mut self, prop: PropHandle) -> Self {
        self.aim = Aim::Prop(prop);
        self
    }

    /// Set the drop site
    pub fn at(mut self, site: [f32; 3]) -> Self {
        self.drop_site = site;
        self
    }

    /// Request storing the held item
    pub fn store(mut self) -> Self {
        self.store_held = true;
        self
    }

    /// Request using the held item
    pub fn use_item(mut self) -> Self {
        self.use_held = true;
        self
    }

    /// Mark the inventory UI as open
    pub fn with_ui_open(mut self) -> Self {
        self.ui_open = true;
        self
    }

    /// Attach an inventory screen action
    pub fn with_action(mut self, action: InventoryAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Per-character interaction state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionState {
    /// Hand empty, no gesture
    Empty,
    /// Holding an entry, no gesture
    Held(InstanceId),
    /// Hold gesture in progress
    Pending { holding: bool, progress: f32 },
}

/// Drives transitions between world, inventory, hand and world containers
pub struct InteractionSystem {
    config: InteractionConfig,
    gesture: HoldGesture,
    last_events: Vec<InteractionEvent>,
    listeners: Vec<InteractionCallback>,
}

impl InteractionSystem {
    /// Create a system with a configuration
    pub fn new(config: InteractionConfig) -> Self {
        let gesture = HoldGesture::new(config.tap_threshold, config.hold_duration);
        Self {
            config,
            gesture,
            last_events: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Register an event callback
    pub fn on_event<F>(&mut self, f: F)
    where
        F: Fn(&InteractionEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(f));
    }

    /// Current state for `holder`
    pub fn state<H: ItemHolder + ?Sized>(&self, holder: &H) -> InteractionState {
        if self.gesture.is_pending() {
            return InteractionState::Pending {
                holding: holder.is_holding(),
                progress: self.gesture.progress(),
            };
        }
        match holder.held() {
            Some(entry) => InteractionState::Held(entry.id),
            None => InteractionState::Empty,
        }
    }

    /// Advance one frame
    ///
    /// Order: inventory screen action, UI cancellation, store, use, then the
    /// pick-up gesture.
    pub fn advance<H, W>(
        &mut self,
        dt: f32,
        input: &FrameInput,
        holder: &mut H,
        world: &mut W,
    ) -> &[InteractionEvent]
    where
        H: ItemHolder + ?Sized,
        W: WorldItems + ?Sized,
    {
        self.last_events.clear();

        if let Some(action) = input.action {
            self.apply_action(action, input.drop_site, holder, world);
        }

        if input.ui_open {
            if self.gesture.cancel() {
                self.emit(InteractionEvent::GestureCancelled);
            }
            return &self.last_events;
        }

        if input.store_held {
            match input.aim {
                Aim::Prop(prop) => {
                    self.store_held_in(prop, holder, world);
                }
                Aim::Nothing => {
                    self.reject(RejectReason::NoStorage);
                }
            }
        }

        if input.use_held {
            self.use_held(holder);
        }

        if input.pickup_pressed {
            self.gesture.press();
        } else if !input.pickup_released {
            match self.gesture.tick(dt) {
                GestureTick::Progress(p) => self.emit(InteractionEvent::GestureProgress(p)),
                GestureTick::Completed => {
                    self.complete_hold(input.aim, input.drop_site, holder, world);
                }
                GestureTick::Idle => {}
            }
        }

        if input.pickup_released {
            match self.gesture.release() {
                GestureRelease::Tap => self.tap(input.aim, input.drop_site, holder, world),
                GestureRelease::Cancelled => self.emit(InteractionEvent::GestureCancelled),
                GestureRelease::Ignored => {}
            }
        }

        &self.last_events
    }

    /// Events from the last frame (and any direct calls since)
    pub fn events(&self) -> &[InteractionEvent] {
        &self.last_events
    }

    /// Take the collected events
    pub fn drain_events(&mut self) -> Vec<InteractionEvent> {
        std::mem::take(&mut self.last_events)
    }

    /// Run an inventory screen action
    pub fn apply_action<H, W>(
        &mut self,
        action: InventoryAction,
        site: [f32; 3],
        holder: &mut H,
        world: &mut W,
    ) -> bool
    where
        H: ItemHolder + ?Sized,
        W: WorldItems + ?Sized,
    {
        match action {
            InventoryAction::Hold(id) => self.hold_from_inventory(id, site, holder, world),
            InventoryAction::Drop(id) => self.drop_from_inventory(id, site, holder, world),
            InventoryAction::Store { prop, id } => {
                self.store_from_inventory(prop, id, holder, world)
            }
            InventoryAction::Retrieve { prop, id } => {
                self.retrieve_to_inventory(prop, id, holder, world)
            }
        }
    }

    /// Move a world pickup into the inventory
    pub fn pick_up_to_inventory<H, W>(
        &mut self,
        prop: PropHandle,
        holder: &mut H,
        world: &mut W,
    ) -> bool
    where
        H: ItemHolder + ?Sized,
        W: WorldItems + ?Sized,
    {
        let Some(entry) = self.prepare_pickup(prop, world) else {
            return false;
        };
        let name = entry.name().to_string();

        if !can_be_stored(&entry) {
            return self.reject(RejectReason::CannotBeStored(name));
        }

        match holder.inventory_mut().try_add(entry) {
            Some(id) => {
                world.destroy(prop);
                log::info!("Picked up {} ({})", name, id);
                self.emit(InteractionEvent::PickedUp { id, prop });
                true
            }
            None => self.reject(RejectReason::InventoryFull(name)),
        }
    }

    /// Take a world pickup into hand
    ///
    /// Storable items pass through the inventory first; if the inventory is
    /// full nothing changes. Items that cannot be stored go straight to hand.
    pub fn hold_from_world<H, W>(
        &mut self,
        prop: PropHandle,
        site: [f32; 3],
        holder: &mut H,
        world: &mut W,
    ) -> bool
    where
        H: ItemHolder + ?Sized,
        W: WorldItems + ?Sized,
    {
        let Some(entry) = self.prepare_pickup(prop, world) else {
            return false;
        };
        let name = entry.name().to_string();

        if !can_be_held(&entry) {
            return self.reject(RejectReason::CannotBeHeld(name));
        }

        if holder.is_holding() {
            self.put_back_held(site, holder, world);
            if holder.is_holding() {
                return false;
            }
        }

        if !can_be_stored(&entry) {
            let id = entry.id;
            return match holder.set_held(entry) {
                Ok(()) => {
                    world.destroy(prop);
                    log::info!("Holding {} directly", name);
                    self.emit(InteractionEvent::Held {
                        id,
                        source: HeldSource::World,
                    });
                    true
                }
                Err(_) => self.reject(RejectReason::CannotBeHeld(name)),
            };
        }

        let Some(id) = holder.inventory_mut().try_add(entry) else {
            return self.reject(RejectReason::InventoryFull(name));
        };
        self.emit(InteractionEvent::PickedUp { id, prop });

        if self.hold_from_inventory(id, site, holder, world) {
            world.destroy(prop);
            true
        } else {
            holder.inventory_mut().remove_by_id(id);
            false
        }
    }

    /// Take an inventory entry into hand, putting back whatever was held
    pub fn hold_from_inventory<H, W>(
        &mut self,
        id: InstanceId,
        site: [f32; 3],
        holder: &mut H,
        world: &mut W,
    ) -> bool
    where
        H: ItemHolder + ?Sized,
        W: WorldItems + ?Sized,
    {
        let Some(entry) = holder.inventory().get(id) else {
            return self.reject(RejectReason::NotFound(id));
        };
        if !can_be_held(entry) {
            let name = entry.name().to_string();
            return self.reject(RejectReason::CannotBeHeld(name));
        }

        if holder.is_holding() {
            self.put_back_held(site, holder, world);
            if holder.is_holding() {
                return false;
            }
        }

        let Some(entry) = holder.inventory_mut().take_by_id(id) else {
            return self.reject(RejectReason::NotFound(id));
        };
        match holder.set_held(entry) {
            Ok(()) => {
                self.emit(InteractionEvent::Held {
                    id,
                    source: HeldSource::Inventory,
                });
                true
            }
            Err(entry) => {
                let name = entry.name().to_string();
                if holder.inventory_mut().try_add(entry).is_none() {
                    log::warn!("Could not return {} ({}) to the inventory", name, id);
                }
                self.reject(RejectReason::CannotBeHeld(name))
            }
        }
    }

    /// Return the held entry to the inventory, dropping it if there is no room
    pub fn put_back_held<H, W>(&mut self, site: [f32; 3], holder: &mut H, world: &mut W) -> bool
    where
        H: ItemHolder + ?Sized,
        W: WorldItems + ?Sized,
    {
        let Some(entry) = holder.take_held() else {
            return self.reject(RejectReason::NothingHeld);
        };

        if can_be_stored(&entry) && holder.inventory().can_accept(&entry) {
            if let Some(id) = holder.inventory_mut().try_add(entry.clone()) {
                self.emit(InteractionEvent::PutBack { id });
                return true;
            }
        }

        log::info!("No room to put back {}; dropping it", entry.name());
        self.place_in_world(entry, site, holder, world)
    }

    /// Drop the held entry into the world
    pub fn drop_held<H, W>(&mut self, site: [f32; 3], holder: &mut H, world: &mut W) -> bool
    where
        H: ItemHolder + ?Sized,
        W: WorldItems + ?Sized,
    {
        match holder.take_held() {
            Some(entry) => self.place_in_world(entry, site, holder, world),
            None => self.reject(RejectReason::NothingHeld),
        }
    }

    /// Move the held entry into a world container
    pub fn store_held_in<H, W>(&mut self, prop: PropHandle, holder: &mut H, world: &mut W) -> bool
    where
        H: ItemHolder + ?Sized,
        W: WorldItems + ?Sized,
    {
        let Some(held) = holder.held() else {
            return self.reject(RejectReason::NothingHeld);
        };
        let name = held.name().to_string();
        if !can_be_stored(held) {
            return self.reject(RejectReason::CannotBeStored(name));
        }

        let Some(container) = world.container_mut(prop) else {
            return self.reject(RejectReason::NoStorage);
        };
        if !container.can_accept(held) {
            return self.reject(RejectReason::StorageFull);
        }

        let Some(entry) = holder.take_held() else {
            return false;
        };
        match container.try_add(entry.clone()) {
            Some(id) => {
                log::info!("Stored {} in {}", name, prop);
                self.emit(InteractionEvent::Stored { id, prop });
                true
            }
            None => {
                if holder.set_held(entry).is_err() {
                    log::warn!("Could not return {} to hand after a refused store", name);
                }
                self.reject(RejectReason::StorageFull)
            }
        }
    }

    /// Move an inventory entry into a world container
    pub fn store_from_inventory<H, W>(
        &mut self,
        prop: PropHandle,
        id: InstanceId,
        holder: &mut H,
        world: &mut W,
    ) -> bool
    where
        H: ItemHolder + ?Sized,
        W: WorldItems + ?Sized,
    {
        let Some(container) = world.container_mut(prop) else {
            return self.reject(RejectReason::NoStorage);
        };
        if !holder.inventory().contains(id) {
            return self.reject(RejectReason::NotFound(id));
        }

        if transfer(holder.inventory_mut(), container, id) {
            self.emit(InteractionEvent::Stored { id, prop });
            true
        } else {
            self.reject(RejectReason::StorageFull)
        }
    }

    /// Move an entry from a world container into the inventory
    pub fn retrieve_to_inventory<H, W>(
        &mut self,
        prop: PropHandle,
        id: InstanceId,
        holder: &mut H,
        world: &mut W,
    ) -> bool
    where
        H: ItemHolder + ?Sized,
        W: WorldItems + ?Sized,
    {
        let Some(container) = world.container_mut(prop) else {
            return self.reject(RejectReason::NoStorage);
        };
        let Some(entry) = container.get(id) else {
            return self.reject(RejectReason::NotFound(id));
        };
        let name = entry.name().to_string();

        if transfer(container, holder.inventory_mut(), id) {
            self.emit(InteractionEvent::Retrieved { id, prop });
            true
        } else {
            self.reject(RejectReason::InventoryFull(name))
        }
    }

    /// Place an inventory entry in the world; it stays in the inventory if the
    /// world refuses it
    pub fn drop_from_inventory<H, W>(
        &mut self,
        id: InstanceId,
        site: [f32; 3],
        holder: &mut H,
        world: &mut W,
    ) -> bool
    where
        H: ItemHolder + ?Sized,
        W: WorldItems + ?Sized,
    {
        let Some(entry) = holder.inventory_mut().take_by_id(id) else {
            return self.reject(RejectReason::NotFound(id));
        };

        match world.spawn_dropped(entry.clone(), site) {
            Some(prop) => {
                log::info!("Dropped {} from inventory at {:?}", entry.name(), site);
                self.emit(InteractionEvent::Dropped { id, prop });
                true
            }
            None => {
                let name = entry.name().to_string();
                if holder.inventory_mut().try_add(entry).is_none() {
                    log::warn!("Rollback of {} ({}) into the inventory failed", name, id);
                }
                self.reject(RejectReason::SpawnFailed(name))
            }
        }
    }

    /// Use the held consumable once
    pub fn use_held<H: ItemHolder + ?Sized>(&mut self, holder: &mut H) -> bool {
        let Some(held) = holder.held() else {
            return self.reject(RejectReason::NothingHeld);
        };
        let id = held.id;
        let Some(uses) = held.uses_remaining() else {
            let name = held.name().to_string();
            return self.reject(RejectReason::NotUsable(name));
        };

        let remaining = uses.saturating_sub(1);
        if remaining == 0 {
            holder.take_held();
            self.emit(InteractionEvent::Consumed { id });
        } else {
            if let Some(held) = holder.held_mut() {
                held.properties
                    .set(keys::USES_REMAINING, remaining.to_string());
            }
            self.emit(InteractionEvent::Used { id, remaining });
        }
        true
    }

    fn tap<H, W>(&mut self, aim: Aim, site: [f32; 3], holder: &mut H, world: &mut W)
    where
        H: ItemHolder + ?Sized,
        W: WorldItems + ?Sized,
    {
        match pickup_target(aim, world) {
            Some(prop) => {
                self.pick_up_to_inventory(prop, holder, world);
            }
            None if holder.is_holding() => {
                self.put_back_held(site, holder, world);
            }
            None => {}
        }
    }

    fn complete_hold<H, W>(&mut self, aim: Aim, site: [f32; 3], holder: &mut H, world: &mut W)
    where
        H: ItemHolder + ?Sized,
        W: WorldItems + ?Sized,
    {
        match pickup_target(aim, world) {
            Some(prop) => {
                self.hold_from_world(prop, site, holder, world);
            }
            None if holder.is_holding() => {
                self.drop_held(site, holder, world);
            }
            None => {}
        }
    }

    /// Copy of a pickup's entry with an id and any hosted container captured
    ///
    /// The world object itself is left untouched.
    fn prepare_pickup<W>(&self, prop: PropHandle, world: &W) -> Option<ItemEntry>
    where
        W: WorldItems + ?Sized,
    {
        let mut entry = world.entry(prop)?.clone();
        if entry.item_type.is_none() {
            return None;
        }
        if entry.id.is_nil() {
            entry.id = InstanceId::new();
        }

        if let Some(container) = world.container(prop) {
            save_into_entry_as(container, &mut entry, self.config.nested_format);
        }
        Some(entry)
    }

    fn place_in_world<H, W>(
        &mut self,
        entry: ItemEntry,
        site: [f32; 3],
        holder: &mut H,
        world: &mut W,
    ) -> bool
    where
        H: ItemHolder + ?Sized,
        W: WorldItems + ?Sized,
    {
        let id = entry.id;
        match world.spawn_dropped(entry.clone(), site) {
            Some(prop) => {
                log::info!("Dropped {} at {:?}", entry.name(), site);
                self.emit(InteractionEvent::Dropped { id, prop });
                true
            }
            None => {
                let name = entry.name().to_string();
                if let Err(entry) = holder.set_held(entry) {
                    if holder.inventory_mut().try_add(entry).is_none() {
                        log::warn!("{} ({}) has nowhere to go", name, id);
                    }
                }
                self.reject(RejectReason::SpawnFailed(name))
            }
        }
    }

    fn emit(&mut self, event: InteractionEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
        self.last_events.push(event);
    }

    fn reject(&mut self, reason: RejectReason) -> bool {
        log::debug!("Interaction refused: {}", reason);
        self.emit(InteractionEvent::Rejected(reason));
        false
    }
}

impl Default for InteractionSystem {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

fn pickup_target<W: WorldItems + ?Sized>(aim: Aim, world: &W) -> Option<PropHandle> {
    match aim {
        Aim::Prop(prop) if world.entry(prop).is_some_and(|e| e.item_type.is_some()) => Some(prop),
        _ => None,
    }
}

fn can_be_stored(entry: &ItemEntry) -> bool {
    entry
        .item_type
        .as_ref()
        .map(|t| t.can_be_stored)
        .unwrap_or(false)
}

fn can_be_held(entry: &ItemEntry) -> bool {
    entry
        .item_type
        .as_ref()
        .map(|t| t.can_be_held)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Character;
    use crate::world::{SimpleWorld, WorldProp};
    use stash_inventory::{ItemCatalog, ItemType};
    use std::sync::Arc;

    struct Fixture {
        system: InteractionSystem,
        player: Character,
        world: SimpleWorld,
        rock: Arc<ItemType>,
        sword: Arc<ItemType>,
    }

    fn fixture(inventory_capacity: f32) -> Fixture {
        let mut catalog = ItemCatalog::new();
        let rock = catalog.register(ItemType::new("/Game/Items/Rock", "Rock").with_volume(2.0));
        let sword = catalog.register(ItemType::new("/Game/Items/Sword", "Sword").not_storable());
        Fixture {
            system: InteractionSystem::default(),
            player: Character::new("Player", inventory_capacity),
            world: SimpleWorld::new(Arc::new(catalog)),
            rock,
            sword,
        }
    }

    #[test]
    fn test_tap_picks_up_storable() {
        let mut f = fixture(30.0);
        let prop = f.world.add(WorldProp::pickup("Rock", ItemEntry::new(f.rock.clone())));

        let input = FrameInput::new().press().release().aiming(prop);
        let events = f.system.advance(0.016, &input, &mut f.player, &mut f.world).to_vec();

        assert!(matches!(events[..], [InteractionEvent::PickedUp { .. }]));
        assert_eq!(f.player.inventory().count_by_type(&f.rock), 1);
        assert!(f.world.is_empty());
    }

    #[test]
    fn test_tap_on_unstorable_rejected() {
        let mut f = fixture(30.0);
        let prop = f.world.add(WorldProp::pickup("Sword", ItemEntry::new(f.sword.clone())));

        let input = FrameInput::new().press().release().aiming(prop);
        let events = f.system.advance(0.016, &input, &mut f.player, &mut f.world);

        assert_eq!(
            events[0].message().as_deref(),
            Some("Sword cannot be stored")
        );
        assert_eq!(f.world.len(), 1);
        assert!(f.player.inventory().is_empty());

        let left = f.world.get(prop).and_then(|p| p.entry.as_ref()).unwrap();
        assert!(left.id.is_nil());
    }

    #[test]
    fn test_state_reports_pending() {
        let mut f = fixture(30.0);
        f.system
            .advance(0.0, &FrameInput::new().press(), &mut f.player, &mut f.world);
        f.system
            .advance(0.5, &FrameInput::new(), &mut f.player, &mut f.world);

        match f.system.state(&f.player) {
            InteractionState::Pending { holding, progress } => {
                assert!(!holding);
                assert!(progress > 0.0 && progress < 1.0);
            }
            other => panic!("expected pending, got {:?}", other),
        }
    }

    #[test]
    fn test_use_counts_down_then_consumes() {
        let mut f = fixture(30.0);
        let snack = Arc::new(ItemType::new("/Game/Items/Snack", "Snack").with_max_uses(2));
        f.player.set_held(ItemEntry::spawn(snack)).unwrap();

        assert!(f.system.use_held(&mut f.player));
        assert_eq!(f.player.held().and_then(ItemEntry::uses_remaining), Some(1));
        assert!(f.system.use_held(&mut f.player));
        assert!(!f.player.is_holding());
        assert!(matches!(
            f.system.events().last(),
            Some(InteractionEvent::Consumed { .. })
        ));
    }

    #[test]
    fn test_use_non_consumable_rejected() {
        let mut f = fixture(30.0);
        f.player.set_held(ItemEntry::spawn(f.rock.clone())).unwrap();

        assert!(!f.system.use_held(&mut f.player));
        assert!(f.player.is_holding());
    }

    #[test]
    fn test_listener_sees_events() {
        let mut f = fixture(30.0);
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        f.system.on_event(move |e| sink.lock().push(e.clone()));

        f.player.set_held(ItemEntry::spawn(f.sword.clone())).unwrap();
        f.system.drop_held([0.0; 3], &mut f.player, &mut f.world);

        assert!(matches!(seen.lock()[..], [InteractionEvent::Dropped { .. }]));
    }
}
