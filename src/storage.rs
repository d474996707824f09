pub mod errors;

use std::collections::HashMap;

use chrono::format::{Item, StrftimeItems};
use tracing::{debug, trace, warn};

use crate::factory::Granularity;
use crate::time::{Instant, Zone};
use errors::ErrorType;

/// Result of storage operation.
pub type StoreResult<T> = Result<T, ErrorType>;

/// Vacant slot percentage above which storages compact unless told otherwise
pub const DEFAULT_AUTO_CLEAN_THRESHOLD: u8 = 50;

/// A single date and the data stored along it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<T> {
    pub instant: Instant,
    pub data: T,
}

/// Storage for data keyed by date.
///
/// Every storage is bound to one format and one [Zone] for its entire lifetime.
/// The format turns a date into its identity string, see [identity][Self::identity].
///
/// Entries are kept in insertion order. Overwriting an entry keeps its position,
/// removing and then re-inserting moves it to the end.
#[derive(Debug, Clone)]
pub struct DateStorage<T> {
    format: String,
    zone: Zone,
    pub(crate) entries: Vec<Option<Entry<T>>>,
    pub(crate) index: HashMap<Instant, usize>,
    /// Percentage of vacant slots at which [unset][Self::unset] compacts the storage
    auto_clean_threshold: Option<u8>,
}

impl<T> DateStorage<T> {
    /// Instantiates an empty storage for the given format and zone
    ///
    /// # Errors
    /// [ErrorType::InvalidArgument] when the format is empty or is not a valid
    /// strftime format string.
    pub fn new<S: Into<String>>(format: S, zone: Zone) -> StoreResult<Self> {
        let format = format.into();
        validate_format(&format)?;
        debug!(format = %format, zone = %zone, "created date storage");

        Ok(Self {
            format,
            zone,
            entries: vec![],
            index: HashMap::new(),
            auto_clean_threshold: Some(DEFAULT_AUTO_CLEAN_THRESHOLD),
        })
    }

    /// Instantiates an empty storage using one of the preset formats
    pub fn preset(granularity: Granularity, zone: Zone) -> Self {
        debug!(%granularity, zone = %zone, "created date storage");
        Self {
            format: granularity.format().to_string(),
            zone,
            entries: vec![],
            index: HashMap::new(),
            auto_clean_threshold: Some(DEFAULT_AUTO_CLEAN_THRESHOLD),
        }
    }

    /// Compact the storage automatically once vacant slots exceed `threshold` percent
    pub fn with_auto_clean(mut self, threshold: u8) -> Self {
        self.auto_clean_threshold = Some(threshold.min(100));
        self
    }

    /// Never compact on [unset][Self::unset]; vacant slots stay until [clean][Self::clean]
    pub fn without_auto_clean(mut self) -> Self {
        self.auto_clean_threshold = None;
        self
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    /// Stores `data` along `instant`, replacing whatever was stored for it before
    pub fn set(&mut self, instant: Instant, data: T) {
        if let Some(&idx) = self.index.get(&instant) {
            if let Some(entry) = self.entries[idx].as_mut() {
                trace!(%instant, idx, "overwriting entry");
                entry.data = data;
                return;
            }
        }

        let idx = self.entries.len();
        trace!(%instant, idx, "inserting entry");
        self.index.insert(instant.clone(), idx);
        self.entries.push(Some(Entry { instant, data }));
    }

    /// Removes the entry for `instant` and returns its data.
    /// Removing a date that is not stored does nothing.
    pub fn unset(&mut self, instant: &Instant) -> Option<T> {
        let idx = self.index.remove(instant)?;
        trace!(%instant, idx, "removing entry");
        let removed = self.entries[idx].take().map(|entry| entry.data);

        if let Some(threshold) = self.auto_clean_threshold {
            if self.vacant_percentage() > threshold as usize {
                self.clean();
            }
        }

        removed
    }

    pub fn exists(&self, instant: &Instant) -> bool {
        self.index.contains_key(instant)
    }

    pub fn get(&self, instant: &Instant) -> Option<&T> {
        self.index
            .get(instant)
            .and_then(|&idx| self.entries[idx].as_ref())
            .map(|entry| &entry.data)
    }

    pub fn get_mut(&mut self, instant: &Instant) -> Option<&mut T> {
        let idx = *self.index.get(instant)?;
        self.entries[idx].as_mut().map(|entry| &mut entry.data)
    }

    /// Derives the identity string for `instant` using the storage's format.
    ///
    /// The zone names must match exactly. Zones that merely share an offset are rejected
    /// with [ErrorType::IllegalTimezone].
    pub fn identity(&self, instant: &Instant) -> StoreResult<String> {
        if !instant.zone().same_name(&self.zone) {
            warn!(
                expected = self.zone.name(),
                supplied = instant.zone().name(),
                "identity requested for date in foreign time zone"
            );
            return Err(ErrorType::IllegalTimezone {
                expected: self.zone.name().to_string(),
                supplied: instant.zone().name().to_string(),
            });
        }

        instant.format(&self.format)
    }

    /// Returns the number of stored entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Iterates over all entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Instant, &T)> {
        self.entries
            .iter()
            .filter_map(|e| e.as_ref())
            .map(|e| (&e.instant, &e.data))
    }

    /// Consumes the storage, yielding all entries in insertion order
    pub fn into_entries(self) -> impl Iterator<Item = Entry<T>> {
        self.entries.into_iter().flatten()
    }

    /// Removes the vacant slots left behind by [unset][Self::unset].
    /// Iteration order is preserved.
    pub fn clean(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|e| e.is_some());
        self.index.clear();
        for (idx, entry) in self.entries.iter().enumerate() {
            if let Some(entry) = entry {
                self.index.insert(entry.instant.clone(), idx);
            }
        }
        debug!(
            removed = before - self.entries.len(),
            remaining = self.entries.len(),
            "cleaned date storage"
        );
    }

    fn vacant_percentage(&self) -> usize {
        if self.entries.is_empty() {
            return 0;
        }
        (self.entries.len() - self.index.len()) * 100 / self.entries.len()
    }
}

/// Checks that `format` is a non-empty strftime format string
pub fn validate_format(format: &str) -> StoreResult<()> {
    if format.is_empty() {
        return Err(ErrorType::InvalidArgument(
            "Invalid date format supplied: empty string".to_string(),
        ));
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ErrorType::InvalidArgument(format!(
            "Invalid date format supplied: {format}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day_storage() -> DateStorage<&'static str> {
        DateStorage::new("%Y-%m-%d", Zone::utc()).unwrap()
    }

    fn at(secs: i64) -> Instant {
        Instant::from_timestamp(&Zone::utc(), secs).unwrap()
    }

    #[test]
    fn illegal_formats() {
        for format in ["", "%Y-%Q", "%"] {
            assert!(matches!(
                DateStorage::<()>::new(format, Zone::utc()),
                Err(ErrorType::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn set_overwrites_in_place() {
        let mut storage = day_storage();
        storage.set(at(0), "A");
        storage.set(at(86_400), "B");
        storage.set(at(0), "C");

        assert_eq!(storage.len(), 2);
        let order: Vec<_> = storage.iter().map(|(_, d)| *d).collect();
        assert_eq!(order, vec!["C", "B"]);
    }

    #[test]
    fn reinsert_moves_to_end() {
        let mut storage = day_storage();
        storage.set(at(0), "A");
        storage.set(at(86_400), "B");
        assert_eq!(storage.unset(&at(0)), Some("A"));
        storage.set(at(0), "A");

        let order: Vec<_> = storage.iter().map(|(_, d)| *d).collect();
        assert_eq!(order, vec!["B", "A"]);
    }

    #[test]
    fn unset_missing() {
        let mut storage = day_storage();
        storage.set(at(0), "A");
        assert_eq!(storage.unset(&at(1)), None);
        assert!(storage.exists(&at(0)));
        assert_eq!(storage.get(&at(0)), Some(&"A"));
    }

    #[test]
    fn get_mut_updates_data() {
        let mut storage = day_storage();
        storage.set(at(0), "A");
        if let Some(data) = storage.get_mut(&at(0)) {
            *data = "Z";
        }
        assert_eq!(storage.get(&at(0)), Some(&"Z"));
        assert_eq!(storage.get_mut(&at(5)), None);
    }

    #[test]
    fn identity_checks_zone_name() {
        let amsterdam = Zone::new("Europe/Amsterdam", 3600).unwrap();
        let berlin = Zone::new("Europe/Berlin", 3600).unwrap();
        let storage: DateStorage<()> = DateStorage::new("%Y-%m-%d %H", amsterdam.clone()).unwrap();

        let ok = Instant::from_timestamp(&amsterdam, 0).unwrap();
        assert_eq!(storage.identity(&ok).unwrap(), "1970-01-01 01");

        let foreign = Instant::from_timestamp(&berlin, 0).unwrap();
        assert_eq!(
            storage.identity(&foreign),
            Err(ErrorType::IllegalTimezone {
                expected: "Europe/Amsterdam".to_string(),
                supplied: "Europe/Berlin".to_string(),
            })
        );
    }

    #[test]
    fn clean_keeps_order() {
        let mut storage = day_storage();
        for (i, data) in ["A", "B", "C", "D"].into_iter().enumerate() {
            storage.set(at(i as i64 * 86_400), data);
        }
        storage.unset(&at(0));
        storage.unset(&at(2 * 86_400));
        assert_eq!(storage.entries.len(), 4);

        storage.clean();
        assert_eq!(storage.entries.len(), 2);
        assert_eq!(storage.get(&at(3 * 86_400)), Some(&"D"));
        let order: Vec<_> = storage.iter().map(|(_, d)| *d).collect();
        assert_eq!(order, vec!["B", "D"]);
    }

    #[test]
    fn auto_clean() {
        let mut storage = day_storage().with_auto_clean(50);
        for i in 0..4 {
            storage.set(at(i * 86_400), "x");
        }
        storage.unset(&at(0));
        storage.unset(&at(86_400));
        // exactly half vacant, not above the threshold yet
        assert_eq!(storage.entries.len(), 4);

        storage.unset(&at(2 * 86_400));
        assert_eq!(storage.entries.len(), 1);
        assert!(storage.exists(&at(3 * 86_400)));
    }

    #[test]
    fn churn_stays_bounded() {
        let mut storage = day_storage();
        storage.set(at(0), "resident");
        for i in 1..10_000 {
            storage.set(at(i * 86_400), "x");
            storage.unset(&at(i * 86_400));
            assert!(storage.entries.len() <= 3);
        }
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get(&at(0)), Some(&"resident"));
    }

    #[test]
    fn without_auto_clean_keeps_slots() {
        let mut storage = day_storage().without_auto_clean();
        for i in 0..10 {
            storage.set(at(i * 86_400), "x");
            storage.unset(&at(i * 86_400));
        }
        assert_eq!(storage.entries.len(), 10);
        storage.clean();
        assert!(storage.entries.is_empty());
    }

    #[test]
    fn clear() {
        let mut storage = day_storage();
        storage.set(at(0), "A");
        storage.clear();
        assert!(storage.is_empty());
        assert!(!storage.exists(&at(0)));
    }
}
