//! Flat string encoding of container contents
//!
//! Compact: `<count>|<path>|<id>|<path>|<id>|...|`
//!
//! Extended: `<count>|<path>|<id>|<n>|<key>=<value>|...|` where each entry is
//! followed by its `n` properties.
//!
//! `%`, `|` and `=` inside paths, keys and values are percent-escaped in both
//! formats. The count header is the length of the source slice. Typeless
//! entries and entries with an empty type path are skipped in the body but
//! still counted, so decoders stop at end of input instead of trusting the
//! header.

use crate::error::PayloadError;
use serde::{Deserialize, Serialize};
use stash_inventory::{InstanceId, ItemEntry, ItemTypeResolver, PropertyBag};
use std::fmt;
use std::str::FromStr;

const SEPARATOR: char = '|';

/// Payload encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// Type path and id only; properties are dropped
    Compact,
    /// Type path, id and property bag
    Extended,
}

impl Default for PayloadFormat {
    fn default() -> Self {
        Self::Compact
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compact => write!(f, "compact"),
            Self::Extended => write!(f, "extended"),
        }
    }
}

impl FromStr for PayloadFormat {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" | "" => Ok(Self::Compact),
            "extended" => Ok(Self::Extended),
            other => Err(PayloadError::UnknownFormat(other.to_string())),
        }
    }
}

/// Encode entries in the compact format
pub fn serialize(entries: &[ItemEntry]) -> String {
    let mut out = header(entries.len());
    for entry in entries {
        let Some(path) = stored_path(entry) else {
            continue;
        };
        push_field(&mut out, &escape(path));
        push_field(&mut out, &entry.id.to_string());
    }
    out
}

/// Decode a compact payload
///
/// Unresolvable types and malformed ids drop that entry only. Properties come
/// back empty.
pub fn deserialize(data: &str, resolver: &dyn ItemTypeResolver) -> Vec<ItemEntry> {
    let mut fields = split_fields(data);
    let Some(count) = read_count(fields.next(), data) else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for index in 0..count {
        let (Some(path), Some(id)) = (fields.next(), fields.next()) else {
            warn_truncated(count, index);
            break;
        };
        match decode_entry(&unescape(path), id, resolver) {
            Ok(entry) => entries.push(entry),
            Err(e) => log::warn!("Dropping stored entry {}: {}", index, e),
        }
    }

    warn_trailing(fields);
    entries
}

/// Encode entries in the extended format
pub fn serialize_extended(entries: &[ItemEntry]) -> String {
    let mut out = header(entries.len());
    for entry in entries {
        let Some(path) = stored_path(entry) else {
            continue;
        };
        push_field(&mut out, &escape(path));
        push_field(&mut out, &entry.id.to_string());
        push_field(&mut out, &entry.properties.len().to_string());
        for (key, value) in entry.properties.iter() {
            push_field(&mut out, &format!("{}={}", escape(key), escape(value)));
        }
    }
    out
}

/// Decode an extended payload
pub fn deserialize_extended(data: &str, resolver: &dyn ItemTypeResolver) -> Vec<ItemEntry> {
    let mut fields = split_fields(data);
    let Some(count) = read_count(fields.next(), data) else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for index in 0..count {
        let (Some(path), Some(id), Some(prop_count)) =
            (fields.next(), fields.next(), fields.next())
        else {
            warn_truncated(count, index);
            break;
        };

        let prop_count = match prop_count.trim().parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                // Field alignment is lost past this point.
                log::warn!(
                    "Stopping decode at entry {}: {}",
                    index,
                    PayloadError::InvalidPropertyCount(prop_count.to_string())
                );
                break;
            }
        };

        let mut properties = PropertyBag::new();
        let mut complete = true;
        for prop_index in 0..prop_count {
            let Some(field) = fields.next() else {
                log::warn!(
                    "Entry {} ends after {} of {} properties",
                    index,
                    prop_index,
                    prop_count
                );
                complete = false;
                break;
            };
            match field.split_once('=') {
                Some((key, value)) => {
                    properties.set(unescape(key), unescape(value));
                }
                None => log::warn!("Ignoring malformed property {:?} on entry {}", field, index),
            }
        }

        match decode_entry(&unescape(path), id, resolver) {
            Ok(mut entry) => {
                entry.properties = properties;
                entries.push(entry);
            }
            Err(e) => log::warn!("Dropping stored entry {}: {}", index, e),
        }

        if !complete {
            break;
        }
    }

    warn_trailing(fields);
    entries
}

/// Encode in the given format
pub fn encode(entries: &[ItemEntry], format: PayloadFormat) -> String {
    match format {
        PayloadFormat::Compact => serialize(entries),
        PayloadFormat::Extended => serialize_extended(entries),
    }
}

/// Decode in the given format
pub fn decode(
    data: &str,
    format: PayloadFormat,
    resolver: &dyn ItemTypeResolver,
) -> Vec<ItemEntry> {
    match format {
        PayloadFormat::Compact => deserialize(data, resolver),
        PayloadFormat::Extended => deserialize_extended(data, resolver),
    }
}

/// Type path written for an entry; `None` skips the entry
fn stored_path(entry: &ItemEntry) -> Option<&str> {
    let path = entry.item_type.as_ref()?.path.as_str();
    if path.is_empty() {
        log::warn!("Skipping {} ({}): empty type path", entry.name(), entry.id);
        return None;
    }
    Some(path)
}

fn header(count: usize) -> String {
    let mut out = count.to_string();
    out.push(SEPARATOR);
    out
}

fn push_field(out: &mut String, field: &str) {
    out.push_str(field);
    out.push(SEPARATOR);
}

fn split_fields(data: &str) -> impl Iterator<Item = &str> {
    data.split(SEPARATOR).filter(|f| !f.is_empty())
}

fn read_count(field: Option<&str>, data: &str) -> Option<usize> {
    let field = field?;
    match field.trim().parse::<usize>() {
        Ok(count) => Some(count),
        Err(_) => {
            log::warn!(
                "Discarding storage payload ({} bytes): {}",
                data.len(),
                PayloadError::InvalidCount(field.to_string())
            );
            None
        }
    }
}

fn decode_entry(
    path: &str,
    id: &str,
    resolver: &dyn ItemTypeResolver,
) -> Result<ItemEntry, PayloadError> {
    let item_type = resolver
        .resolve(path)
        .ok_or_else(|| PayloadError::UnknownType(path.to_string()))?;
    let id = InstanceId::parse(id).map_err(|_| PayloadError::InvalidId(id.to_string()))?;
    Ok(ItemEntry::new(item_type).with_id(id))
}

fn warn_truncated(declared: usize, decoded: usize) {
    log::warn!(
        "Storage payload declares {} entries but ends after {}",
        declared,
        decoded
    );
}

fn warn_trailing<'a>(mut rest: impl Iterator<Item = &'a str>) {
    let extra = rest.by_ref().count();
    if extra > 0 {
        log::warn!("Ignoring {} trailing payload fields", extra);
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            '|' => out.push_str("%7C"),
            '=' => out.push_str("%3D"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let code = rest
            .get(pos + 1..pos + 3)
            .filter(|c| c.bytes().all(|b| b.is_ascii_hexdigit()));
        match code.and_then(|c| u8::from_str_radix(c, 16).ok()) {
            Some(byte) if byte.is_ascii() => {
                out.push(byte as char);
                rest = &rest[pos + 3..];
            }
            _ => {
                out.push('%');
                rest = &rest[pos + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}
