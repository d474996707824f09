use std::fmt::{self, Write as _};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{Zone, DTF};
use crate::storage::errors::ErrorType;
use crate::storage::StoreResult;

/// An immutable point in time tagged with the [Zone] it was expressed in.
///
/// Two instants are equal when they describe the same moment in the same zone.
/// There is no way to change an instant after construction; converting to another
/// zone yields a new value (see [with_zone][Self::with_zone]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInstant")]
pub struct Instant {
    time: DTF,
    zone: Zone,
}

/// Unchecked serialized form; the offset of `time` must be the offset of `zone`
#[derive(Deserialize)]
struct RawInstant {
    time: DTF,
    zone: Zone,
}

impl TryFrom<RawInstant> for Instant {
    type Error = ErrorType;

    fn try_from(raw: RawInstant) -> Result<Self, Self::Error> {
        let offset = raw.time.offset().local_minus_utc();
        if offset != raw.zone.offset_seconds() {
            return Err(ErrorType::InvalidArgument(format!(
                "{} has offset {offset}s, but time zone {} has offset {}s",
                raw.time.to_rfc3339(),
                raw.zone,
                raw.zone.offset_seconds()
            )));
        }
        Ok(Self {
            time: raw.time,
            zone: raw.zone,
        })
    }
}

impl Instant {
    /// Expresses a UTC moment in the given zone
    pub fn from_utc(zone: &Zone, time: DateTime<Utc>) -> Self {
        Self {
            time: time.with_timezone(&zone.offset()),
            zone: zone.clone(),
        }
    }

    /// Creates an instant from a unix timestamp in seconds
    pub fn from_timestamp(zone: &Zone, secs: i64) -> StoreResult<Self> {
        let time = DateTime::from_timestamp(secs, 0).ok_or_else(|| {
            ErrorType::InvalidArgument(format!("Timestamp out of range: {secs}"))
        })?;
        Ok(Self::from_utc(zone, time))
    }

    /// Interprets a wall-clock date and time as local to the given zone
    pub fn from_local(zone: &Zone, local: NaiveDateTime) -> StoreResult<Self> {
        let time = zone
            .offset()
            .from_local_datetime(&local)
            .single()
            .ok_or_else(|| {
                ErrorType::InvalidArgument(format!(
                    "{local} does not exist in time zone {zone}"
                ))
            })?;
        Ok(Self {
            time,
            zone: zone.clone(),
        })
    }

    /// The same moment, expressed in another zone
    pub fn with_zone(&self, zone: &Zone) -> Self {
        Self::from_utc(zone, self.to_utc())
    }

    pub fn time(&self) -> &DTF {
        &self.time
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        self.time.with_timezone(&Utc)
    }

    pub fn timestamp(&self) -> i64 {
        self.time.timestamp()
    }

    /// Renders the instant using a strftime style format string
    ///
    /// Fails with [ErrorType::InvalidArgument] if the format contains an
    /// unrecognised specifier.
    pub fn format(&self, format: &str) -> StoreResult<String> {
        let mut out = String::new();
        write!(out, "{}", self.time.format(format)).map_err(|_| {
            ErrorType::InvalidArgument(format!("Invalid date format supplied: {format}"))
        })?;
        Ok(out)
    }
}

impl From<DateTime<Utc>> for Instant {
    fn from(time: DateTime<Utc>) -> Self {
        Self::from_utc(&Zone::utc(), time)
    }
}

impl Ord for Instant {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.zone.name().cmp(other.zone.name()))
            .then(self.zone.offset_seconds().cmp(&other.zone.offset_seconds()))
    }
}
impl PartialOrd for Instant {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.time.to_rfc3339(), self.zone)
    }
}
