//! Sandbox Scene - Parses declarative sandbox.toml files
//!
//! A sandbox file describes item types, the player, world props and a script
//! of input frames. [`Sandbox`] builds the world from it and replays the frames
//! through the interaction system.

use serde::{Deserialize, Serialize};
use stash_interact::prelude::*;
use stash_inventory::prelude::*;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors from loading or running a sandbox
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown item type: {0}")]
    UnknownItem(String),

    #[error("Unknown prop: {0}")]
    UnknownProp(String),

    #[error("{item} does not fit into {container}")]
    Overfull { item: String, container: String },
}

/// Result type for sandbox operations
pub type SandboxResult<T> = Result<T, SandboxError>;

// ============================================================================
// Sandbox Definition Structures
// ============================================================================

/// Root definition loaded from sandbox.toml
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SandboxDefinition {
    /// Interaction timings and capacities
    #[serde(default)]
    pub interaction: InteractionConfig,
    /// Item types
    #[serde(default)]
    pub items: Vec<ItemType>,
    /// Acting character
    #[serde(default)]
    pub player: PlayerDef,
    /// World objects
    #[serde(default)]
    pub props: Vec<PropDef>,
    /// Input script
    #[serde(default)]
    pub frames: Vec<FrameDef>,
}

/// Player definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerDef {
    /// Name for the summary
    #[serde(default = "default_player_name")]
    pub name: String,
    /// Inventory capacity (defaults to the interaction config)
    #[serde(default)]
    pub inventory_capacity: Option<f32>,
    /// Item paths placed in the inventory
    #[serde(default)]
    pub inventory: Vec<String>,
    /// Item path placed in hand
    #[serde(default)]
    pub held: Option<String>,
}

fn default_player_name() -> String {
    "Player".to_string()
}

impl Default for PlayerDef {
    fn default() -> Self {
        Self {
            name: default_player_name(),
            inventory_capacity: None,
            inventory: Vec::new(),
            held: None,
        }
    }
}

/// World prop definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PropDef {
    /// Unique name frames refer to
    pub name: String,
    /// Item path if the prop is a pickup
    #[serde(default)]
    pub item: Option<String>,
    /// Container capacity if the prop hosts a container
    #[serde(default)]
    pub capacity: Option<f32>,
    /// Item paths placed in the container
    #[serde(default)]
    pub contents: Vec<String>,
    /// World position
    #[serde(default)]
    pub position: [f32; 3],
}

/// Pick-up button edge for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonDef {
    /// Button goes down
    Press,
    /// Button goes up
    Release,
    /// Down and up in the same frame
    Tap,
}

/// Inventory screen action definition
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActionDef {
    /// Hold the first inventory entry of a type
    Hold { item: String },
    /// Drop the first inventory entry of a type
    Drop { item: String },
    /// Store the first inventory entry of a type into a prop
    Store { prop: String, item: String },
    /// Retrieve the first entry of a type from a prop
    Retrieve { prop: String, item: String },
}

/// One scripted input frame
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FrameDef {
    /// Frame time in seconds
    #[serde(default = "default_dt")]
    pub dt: f32,
    /// Run this frame several times
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    /// Pick-up button edge
    #[serde(default)]
    pub pickup: Option<ButtonDef>,
    /// Name of the aimed prop
    #[serde(default)]
    pub aim: Option<String>,
    /// Drop site
    #[serde(default)]
    pub at: [f32; 3],
    /// Store the held item into the aimed prop
    #[serde(default)]
    pub store: bool,
    /// Use the held item
    #[serde(default)]
    pub use_held: bool,
    /// Inventory UI open
    #[serde(default)]
    pub ui_open: bool,
    /// Inventory screen action
    #[serde(default)]
    pub action: Option<ActionDef>,
}

fn default_dt() -> f32 {
    1.0 / 60.0
}

fn default_repeat() -> u32 {
    1
}

impl SandboxDefinition {
    /// Parse from TOML
    pub fn from_toml_str(content: &str) -> SandboxResult<Self> {
        let definition: Self = toml::from_str(content)?;
        definition.interaction.validate()?;
        Ok(definition)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> SandboxResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ============================================================================
// Runtime
// ============================================================================

/// A built sandbox ready to replay its frames
pub struct Sandbox {
    catalog: Arc<ItemCatalog>,
    system: InteractionSystem,
    player: Character,
    world: SimpleWorld,
    frames: Vec<FrameDef>,
}

impl Sandbox {
    /// Build the world described by `definition`
    pub fn build(definition: SandboxDefinition) -> SandboxResult<Self> {
        let config = definition.interaction;
        let catalog: Arc<ItemCatalog> = Arc::new(definition.items.into_iter().collect());

        let capacity = definition
            .player
            .inventory_capacity
            .unwrap_or(config.inventory_capacity);
        let mut player = Character::new(definition.player.name, capacity);
        for path in &definition.player.inventory {
            let entry = ItemEntry::new(resolve(&catalog, path)?);
            if player.inventory_mut().try_add(entry).is_none() {
                return Err(SandboxError::Overfull {
                    item: path.clone(),
                    container: player.name.clone(),
                });
            }
        }
        if let Some(path) = &definition.player.held {
            let entry = ItemEntry::spawn(resolve(&catalog, path)?);
            if player.set_held(entry).is_err() {
                return Err(SandboxError::Overfull {
                    item: path.clone(),
                    container: format!("{}'s hand", player.name),
                });
            }
        }

        let mut world =
            SimpleWorld::new(catalog.clone()).with_storage_capacity(config.storage_capacity);
        for def in definition.props {
            let mut prop = WorldProp {
                name: def.name.clone(),
                position: def.position,
                ..Default::default()
            };
            if let Some(path) = &def.item {
                prop.entry = Some(ItemEntry::new(resolve(&catalog, path)?));
            }
            if def.capacity.is_some() || !def.contents.is_empty() {
                let capacity = def.capacity.unwrap_or(config.storage_capacity);
                let mut container = Container::new(capacity);
                for path in &def.contents {
                    if container.try_add(ItemEntry::new(resolve(&catalog, path)?)).is_none() {
                        return Err(SandboxError::Overfull {
                            item: path.clone(),
                            container: def.name.clone(),
                        });
                    }
                }
                prop.container = Some(container);
            }
            world.add(prop);
        }

        log::info!(
            "Sandbox built: {} item types, {} props, {} frames",
            catalog.len(),
            world.len(),
            definition.frames.len()
        );

        Ok(Self {
            catalog,
            system: InteractionSystem::new(config),
            player,
            world,
            frames: definition.frames,
        })
    }

    /// Replay every frame, returning all events in order
    pub fn run(&mut self) -> SandboxResult<Vec<InteractionEvent>> {
        let frames = std::mem::take(&mut self.frames);
        let mut all = Vec::new();

        for (index, def) in frames.iter().enumerate() {
            for _ in 0..def.repeat.max(1) {
                let input = self.frame_input(def)?;
                let events = self
                    .system
                    .advance(def.dt, &input, &mut self.player, &mut self.world);
                for event in events {
                    match event.message() {
                        Some(message) => log::info!("[frame {}] {}", index, message),
                        None => log::debug!("[frame {}] {:?}", index, event),
                    }
                }
                all.extend_from_slice(events);
            }
        }

        self.frames = frames;
        Ok(all)
    }

    /// Player
    pub fn player(&self) -> &Character {
        &self.player
    }

    /// World
    pub fn world(&self) -> &SimpleWorld {
        &self.world
    }

    /// Human-readable state of inventory, hand and world
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let inventory = self.player.inventory();
        let _ = writeln!(
            out,
            "{} inventory ({:.1} / {:.1}):",
            self.player.name,
            inventory.used_volume(),
            inventory.capacity()
        );
        for entry in inventory.entries() {
            let _ = writeln!(out, "  - {}", describe(entry));
        }
        match self.player.held() {
            Some(entry) => {
                let _ = writeln!(out, "Held: {}", describe(entry));
            }
            None => {
                let _ = writeln!(out, "Held: nothing");
            }
        }
        let _ = writeln!(out, "World:");
        for (_, prop) in self.world.iter() {
            let _ = write!(out, "  - {} at {:?}", prop.name, prop.position);
            if let Some(container) = &prop.container {
                let names: Vec<&str> = container.entries().iter().map(ItemEntry::name).collect();
                let _ = write!(
                    out,
                    " [{:.1} / {:.1}: {}]",
                    container.used_volume(),
                    container.capacity(),
                    names.join(", ")
                );
            }
            let _ = writeln!(out);
        }
        out
    }

    fn frame_input(&self, def: &FrameDef) -> SandboxResult<FrameInput> {
        let mut input = FrameInput::new().at(def.at);
        match def.pickup {
            Some(ButtonDef::Press) => input = input.press(),
            Some(ButtonDef::Release) => input = input.release(),
            Some(ButtonDef::Tap) => input = input.press().release(),
            None => {}
        }
        if let Some(name) = &def.aim {
            // A destroyed prop simply leaves nothing under the crosshair.
            match self.world.find(name) {
                Some(prop) => input = input.aiming(prop),
                None => log::debug!("Aim target {} is gone", name),
            }
        }
        if def.store {
            input = input.store();
        }
        if def.use_held {
            input = input.use_item();
        }
        if def.ui_open {
            input = input.with_ui_open();
        }
        if let Some(action) = &def.action {
            input.action = self.resolve_action(action)?;
        }
        Ok(input)
    }

    fn resolve_action(&self, action: &ActionDef) -> SandboxResult<Option<InventoryAction>> {
        let inventory = self.player.inventory();
        let resolved = match action {
            ActionDef::Hold { item } => first_of(inventory, &resolve(&self.catalog, item)?)
                .map(InventoryAction::Hold),
            ActionDef::Drop { item } => first_of(inventory, &resolve(&self.catalog, item)?)
                .map(InventoryAction::Drop),
            ActionDef::Store { prop, item } => {
                let prop = self.prop(prop)?;
                first_of(inventory, &resolve(&self.catalog, item)?)
                    .map(|id| InventoryAction::Store { prop, id })
            }
            ActionDef::Retrieve { prop, item } => {
                let handle = self.prop(prop)?;
                let container = self.world.container(handle);
                let item_type = resolve(&self.catalog, item)?;
                container
                    .and_then(|c| first_of(c, &item_type))
                    .map(|id| InventoryAction::Retrieve { prop: handle, id })
            }
        };
        if resolved.is_none() {
            log::warn!("Skipping action {:?}: no matching entry", action);
        }
        Ok(resolved)
    }

    fn prop(&self, name: &str) -> SandboxResult<PropHandle> {
        self.world
            .find(name)
            .ok_or_else(|| SandboxError::UnknownProp(name.to_string()))
    }
}

fn resolve(catalog: &ItemCatalog, path: &str) -> SandboxResult<Arc<ItemType>> {
    catalog
        .resolve(path)
        .ok_or_else(|| SandboxError::UnknownItem(path.to_string()))
}

fn first_of(container: &Container, item_type: &Arc<ItemType>) -> Option<InstanceId> {
    container.find_first_of_type(item_type).map(|e| e.id)
}

fn describe(entry: &ItemEntry) -> String {
    match entry.uses_remaining() {
        Some(uses) => format!("{} ({} uses)", entry.name(), uses),
        None => entry.name().to_string(),
    }
}
