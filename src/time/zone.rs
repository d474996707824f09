use std::fmt;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::errors::ErrorType;
use crate::storage::StoreResult;

pub const UTC_NAME: &str = "UTC";

/// A named timezone.
///
/// Storages compare zones by [name][Self::name] only, so two zones sharing an
/// offset but carrying different names are still different zones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawZone")]
pub struct Zone {
    name: String,
    offset_seconds: i32,
}

/// Unchecked serialized form, validated through [Zone::new]
#[derive(Deserialize)]
struct RawZone {
    name: String,
    offset_seconds: i32,
}

impl TryFrom<RawZone> for Zone {
    type Error = ErrorType;

    fn try_from(raw: RawZone) -> Result<Self, Self::Error> {
        Zone::new(raw.name, raw.offset_seconds)
    }
}

impl Zone {
    /// Creates a zone from its canonical name and its offset east of UTC in seconds
    ///
    /// Fails when the name is empty or the offset is not within a day.
    pub fn new<S: Into<String>>(name: S, offset_seconds: i32) -> StoreResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ErrorType::InvalidArgument(
                "Time zone name must not be empty".to_string(),
            ));
        }
        if FixedOffset::east_opt(offset_seconds).is_none() {
            return Err(ErrorType::InvalidArgument(format!(
                "Invalid offset for time zone {name}: {offset_seconds}s"
            )));
        }
        Ok(Self {
            name,
            offset_seconds,
        })
    }

    /// Creates a zone from an already valid offset
    pub fn fixed<S: Into<String>>(name: S, offset: FixedOffset) -> Self {
        Self {
            name: name.into(),
            offset_seconds: offset.local_minus_utc(),
        }
    }

    /// The `UTC` zone, offset zero
    pub fn utc() -> Self {
        Self {
            name: UTC_NAME.to_string(),
            offset_seconds: 0,
        }
    }

    /// Canonical name, the only part that decides whether two zones are the same
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Offset east of UTC
    pub fn offset(&self) -> FixedOffset {
        // Offsets are range checked on construction
        FixedOffset::east_opt(self.offset_seconds).unwrap_or(Utc.fix())
    }

    /// Offset east of UTC in seconds
    pub fn offset_seconds(&self) -> i32 {
        self.offset_seconds
    }

    /// Whether `other` is the same zone as far as identities are concerned
    pub fn same_name(&self, other: &Zone) -> bool {
        self.name == other.name
    }
}

impl Default for Zone {
    fn default() -> Self {
        Self::utc()
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
