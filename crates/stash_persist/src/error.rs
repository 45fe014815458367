//! Payload decode errors

use thiserror::Error;

/// Failure to decode one part of a storage payload
///
/// These never abort a whole decode: the affected entry is skipped and the
/// error is logged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    /// Header count missing or not a number
    #[error("Invalid entry count: {0:?}")]
    InvalidCount(String),
    /// Type path does not resolve
    #[error("Unknown item type: {0}")]
    UnknownType(String),
    /// Instance id does not parse
    #[error("Invalid item id: {0:?}")]
    InvalidId(String),
    /// Extended format property count does not parse
    #[error("Invalid property count: {0:?}")]
    InvalidPropertyCount(String),
    /// Capacity value does not parse or is negative
    #[error("Invalid capacity: {0:?}")]
    InvalidCapacity(String),
    /// Unknown payload format tag
    #[error("Unknown payload format: {0:?}")]
    UnknownFormat(String),
}
