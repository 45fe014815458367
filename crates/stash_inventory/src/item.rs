//! Item types, instance ids and item entries

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Well-known property keys
pub mod keys {
    /// Remaining uses of a consumable instance
    pub const USES_REMAINING: &str = "UsesRemaining";
    /// Current durability of a tool instance
    pub const DURABILITY: &str = "Durability";
}

/// Immutable definition of a kind of item
///
/// Shared between every entry of that kind through an `Arc`. Containers never
/// mutate a type; two entries have "the same type" when they point at the same
/// `Arc` (see [`ItemType::same`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemType {
    /// Stable, reloadable identifier (asset path)
    pub path: String,
    /// Display name
    #[serde(default)]
    pub display_name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Volume one unit occupies in a container
    #[serde(default = "default_volume")]
    pub volume_per_unit: f32,
    /// Physical mass in kilograms (<= 0 uses the mesh default)
    #[serde(default = "default_mass")]
    pub mass_kg: f32,
    /// Whether the item may sit inside a container
    #[serde(default = "default_true")]
    pub can_be_stored: bool,
    /// Whether the item may be held in hand
    #[serde(default = "default_true")]
    pub can_be_held: bool,
    /// Number of uses for consumables (None = not consumable)
    #[serde(default)]
    pub max_uses: Option<u32>,
    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_volume() -> f32 {
    1.0
}

fn default_mass() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

impl ItemType {
    /// Create a new item type
    pub fn new(path: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
            description: String::new(),
            volume_per_unit: default_volume(),
            mass_kg: default_mass(),
            can_be_stored: true,
            can_be_held: true,
            max_uses: None,
            tags: Vec::new(),
        }
    }

    /// Set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Set volume per unit
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume_per_unit = volume;
        self
    }

    /// Set mass
    pub fn with_mass(mut self, mass_kg: f32) -> Self {
        self.mass_kg = mass_kg;
        self
    }

    /// Mark as consumable with a number of uses
    pub fn with_max_uses(mut self, uses: u32) -> Self {
        self.max_uses = Some(uses.max(1));
        self
    }

    /// Forbid storage (always-in-hand items such as melee tools)
    pub fn not_storable(mut self) -> Self {
        self.can_be_stored = false;
        self
    }

    /// Forbid holding in hand
    pub fn not_holdable(mut self) -> Self {
        self.can_be_held = false;
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Check if the type has a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Volume used for capacity accounting (negative volumes count as zero)
    pub fn effective_volume(&self) -> f32 {
        self.volume_per_unit.max(0.0)
    }

    /// Name shown to the player, falling back to the path
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.path
        } else {
            &self.display_name
        }
    }

    /// Reference identity between two shared types
    pub fn same(a: &Arc<ItemType>, b: &Arc<ItemType>) -> bool {
        Arc::ptr_eq(a, b)
    }
}

/// Unique 128-bit id of one item instance
///
/// The nil uuid is the "unassigned" id; containers replace it on insert.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The unassigned id
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Wrap an existing uuid
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse any textual uuid form (hyphenated, braced, simple, urn)
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }

    /// Check if this is the unassigned id
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Get the inner uuid
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::nil()
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            write!(f, "InstanceId(nil)")
        } else {
            write!(f, "InstanceId({})", self.0.hyphenated())
        }
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for InstanceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Schema-less per-instance state (durability, uses remaining, nested payloads)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyBag(BTreeMap<String, String>);

impl PropertyBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Set a value, returning the previous one
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Get a value or a default
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Parse a value into `T`; missing or unparsable values yield `None`
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key)?.trim().parse().ok()
    }

    /// Check if a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Remove a key
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate key/value pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One concrete item instance
///
/// Two entries are the same item iff their ids match; see [`ItemEntry::same_item`].
#[derive(Debug, Clone, Default)]
pub struct ItemEntry {
    /// Shared type (None only in empty/invalid entries)
    pub item_type: Option<Arc<ItemType>>,
    /// Instance id (nil until a container assigns one)
    pub id: InstanceId,
    /// Per-instance state
    pub properties: PropertyBag,
}

impl ItemEntry {
    /// Create an entry of a type with an unassigned id
    pub fn new(item_type: Arc<ItemType>) -> Self {
        Self {
            item_type: Some(item_type),
            id: InstanceId::nil(),
            properties: PropertyBag::new(),
        }
    }

    /// Create an entry with a freshly generated id
    pub fn spawn(item_type: Arc<ItemType>) -> Self {
        Self::new(item_type).with_id(InstanceId::new())
    }

    /// An entry without a type
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set the id
    pub fn with_id(mut self, id: InstanceId) -> Self {
        self.id = id;
        self
    }

    /// Set a property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.set(key, value);
        self
    }

    /// Non-null type and assigned id
    pub fn is_valid(&self) -> bool {
        self.item_type.is_some() && !self.id.is_nil()
    }

    /// Identity comparison
    pub fn same_item(&self, other: &ItemEntry) -> bool {
        self.id == other.id
    }

    /// Check whether this entry's type is `item_type` (reference identity)
    pub fn is_of_type(&self, item_type: &Arc<ItemType>) -> bool {
        self.item_type
            .as_ref()
            .map(|t| ItemType::same(t, item_type))
            .unwrap_or(false)
    }

    /// Volume this entry occupies (0 for typeless entries)
    pub fn volume(&self) -> f32 {
        self.item_type
            .as_ref()
            .map(|t| t.effective_volume())
            .unwrap_or(0.0)
    }

    /// Type path, if typed
    pub fn type_path(&self) -> Option<&str> {
        self.item_type.as_ref().map(|t| t.path.as_str())
    }

    /// Name for logs and messages
    pub fn name(&self) -> &str {
        self.item_type.as_ref().map(|t| t.name()).unwrap_or("<none>")
    }

    /// Remaining uses of a consumable (defaults to the type's max uses)
    pub fn uses_remaining(&self) -> Option<u32> {
        let max = self.item_type.as_ref()?.max_uses?;
        Some(
            self.properties
                .get_parsed::<u32>(keys::USES_REMAINING)
                .unwrap_or(max),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_builder() {
        let item = ItemType::new("/Game/Items/Wrench", "Wrench")
            .with_volume(3.0)
            .not_storable()
            .with_tag("tool");

        assert_eq!(item.path, "/Game/Items/Wrench");
        assert_eq!(item.volume_per_unit, 3.0);
        assert!(!item.can_be_stored);
        assert!(item.can_be_held);
        assert!(item.has_tag("tool"));
    }

    #[test]
    fn test_negative_volume_clamped() {
        let item = ItemType::new("odd", "Odd").with_volume(-2.0);
        assert_eq!(item.effective_volume(), 0.0);
    }

    #[test]
    fn test_instance_id_text_forms() {
        let id = InstanceId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(InstanceId::parse(&text).unwrap(), id);

        let braced = format!("{{{}}}", text.to_uppercase());
        assert_eq!(InstanceId::parse(&braced).unwrap(), id);

        assert!(InstanceId::parse("not-a-guid").is_err());
        assert!(InstanceId::default().is_nil());
    }

    #[test]
    fn test_entry_validity() {
        let ty = Arc::new(ItemType::new("apple", "Apple"));

        assert!(!ItemEntry::empty().is_valid());
        assert!(!ItemEntry::new(ty.clone()).is_valid());
        assert!(ItemEntry::spawn(ty).is_valid());
    }

    #[test]
    fn test_type_identity_is_by_reference() {
        let a = Arc::new(ItemType::new("apple", "Apple"));
        let a_copy = Arc::new(ItemType::new("apple", "Apple"));

        let entry = ItemEntry::new(a.clone());
        assert!(entry.is_of_type(&a));
        assert!(!entry.is_of_type(&a_copy));
    }

    #[test]
    fn test_property_bag() {
        let mut bag = PropertyBag::new();
        bag.set(keys::USES_REMAINING, "3");

        assert_eq!(bag.get_parsed::<u32>(keys::USES_REMAINING), Some(3));
        assert_eq!(bag.get_or("missing", "x"), "x");
        assert_eq!(bag.remove(keys::USES_REMAINING).as_deref(), Some("3"));
        assert!(bag.is_empty());
    }

    #[test]
    fn test_uses_remaining_defaults_to_max() {
        let ty = Arc::new(ItemType::new("bread", "Bread").with_max_uses(4));
        let fresh = ItemEntry::new(ty.clone());
        let bitten = ItemEntry::new(ty).with_property(keys::USES_REMAINING, "1");

        assert_eq!(fresh.uses_remaining(), Some(4));
        assert_eq!(bitten.uses_remaining(), Some(1));
    }

    #[test]
    fn test_item_type_from_toml() {
        let ty: ItemType = toml::from_str(
            r#"
            path = "/Game/Items/Backpack"
            display_name = "Backpack"
            volume_per_unit = 8.0
            "#,
        )
        .unwrap();

        assert_eq!(ty.volume_per_unit, 8.0);
        assert!(ty.can_be_stored);
        assert_eq!(ty.max_uses, None);
    }
}
