use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::container::DateContainer;
use crate::storage::errors::ErrorType;
use crate::storage::{DateStorage, StoreResult, DEFAULT_AUTO_CLEAN_THRESHOLD};
use crate::time::Zone;

/// Preset identity formats
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Second,
    Minute,
    Hour,
    Day,
}

impl Granularity {
    pub const fn format(&self) -> &'static str {
        match self {
            Granularity::Second => "%Y-%m-%d %H:%M:%S",
            Granularity::Minute => "%Y-%m-%d %H:%M",
            Granularity::Hour => "%Y-%m-%d %H",
            Granularity::Day => "%Y-%m-%d",
        }
    }
}

impl FromStr for Granularity {
    type Err = ErrorType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "second" => Ok(Granularity::Second),
            "minute" => Ok(Granularity::Minute),
            "hour" => Ok(Granularity::Hour),
            "day" => Ok(Granularity::Day),
            _ => Err(ErrorType::InvalidArgument(format!("Unknown granularity: {s}"))),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Second => write!(f, "second"),
            Granularity::Minute => write!(f, "minute"),
            Granularity::Hour => write!(f, "hour"),
            Granularity::Day => write!(f, "day"),
        }
    }
}

/// Builds containers that all share one [Zone]
#[derive(Debug, Clone)]
pub struct DateContainerFactory {
    zone: Zone,
    /// `None` disables auto clean on the created storages
    auto_clean_threshold: Option<u8>,
}

impl DateContainerFactory {
    pub fn new(zone: Zone) -> Self {
        Self {
            zone,
            auto_clean_threshold: Some(DEFAULT_AUTO_CLEAN_THRESHOLD),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            zone: config.zone.clone(),
            auto_clean_threshold: config.auto_clean.then_some(config.auto_clean_threshold),
        }
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn create_from_format<T>(&self, format: &str) -> StoreResult<DateContainer<T>> {
        let storage = DateStorage::new(format, self.zone.clone())?;
        Ok(DateContainer::new(self.configure(storage)))
    }

    pub fn create<T>(&self, granularity: Granularity) -> DateContainer<T> {
        let storage = DateStorage::preset(granularity, self.zone.clone());
        DateContainer::new(self.configure(storage))
    }

    pub fn create_interval_second<T>(&self) -> DateContainer<T> {
        self.create(Granularity::Second)
    }

    pub fn create_interval_minute<T>(&self) -> DateContainer<T> {
        self.create(Granularity::Minute)
    }

    pub fn create_interval_hour<T>(&self) -> DateContainer<T> {
        self.create(Granularity::Hour)
    }

    pub fn create_interval_day<T>(&self) -> DateContainer<T> {
        self.create(Granularity::Day)
    }

    fn configure<T>(&self, storage: DateStorage<T>) -> DateStorage<T> {
        match self.auto_clean_threshold {
            Some(threshold) => storage.with_auto_clean(threshold),
            None => storage.without_auto_clean(),
        }
    }
}

impl Default for DateContainerFactory {
    fn default() -> Self {
        Self::new(Zone::utc())
    }
}
