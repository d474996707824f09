use std::collections::HashMap;

use crate::storage::{DateStorage, StoreResult};
use crate::time::Instant;

/// Container for data stored along dates.
///
/// Dates are identified through the format and zone of the underlying
/// [DateStorage]. Iterating the container walks `(date, data)` pairs in insertion
/// order; [identifiers][Self::identifiers] and [to_map][Self::to_map] export the
/// same entries under their identity strings.
#[derive(Debug, Clone)]
pub struct DateContainer<T> {
    storage: DateStorage<T>,
}

impl<T> DateContainer<T> {
    pub fn new(storage: DateStorage<T>) -> Self {
        Self { storage }
    }

    /// Returns an immutable reference to the underlying storage
    pub fn storage(&self) -> &DateStorage<T> {
        &self.storage
    }

    /// Attaches `data` along `date`, replacing any data already attached to it.
    ///
    /// The date is taken by value, so later changes to the caller's copy never reach
    /// the stored key.
    pub fn attach<D: Into<Instant>>(&mut self, date: D, data: T) -> &mut Self {
        self.storage.set(date.into(), data);
        self
    }

    /// Detaches the data for `date`. Detaching an unknown date does nothing.
    pub fn detach(&mut self, date: &Instant) -> &mut Self {
        self.storage.unset(date);
        self
    }

    /// Detaches the data for `date` and hands it back
    pub fn take(&mut self, date: &Instant) -> Option<T> {
        self.storage.unset(date)
    }

    pub fn contains(&self, date: &Instant) -> bool {
        self.storage.exists(date)
    }

    /// Returns the data attached to `date`, or `None` if there is none
    pub fn get_data(&self, date: &Instant) -> Option<&T> {
        self.storage.get(date)
    }

    pub fn get_data_mut(&mut self, date: &Instant) -> Option<&mut T> {
        self.storage.get_mut(date)
    }

    /// Returns the identity string of `date`
    pub fn get_identifier(&self, date: &Instant) -> StoreResult<String> {
        self.storage.identity(date)
    }

    /// Returns the identifiers of all stored dates in iteration order.
    ///
    /// Distinct dates that share an identity each contribute an identifier, so the
    /// result may hold duplicates where [to_map][Self::to_map] holds one key.
    pub fn identifiers(&self) -> StoreResult<Vec<String>> {
        self.keys().map(|date| self.get_identifier(date)).collect()
    }

    /// Lazily pairs every entry's identity with its data, in iteration order
    pub fn identified(&self) -> impl Iterator<Item = StoreResult<(String, &T)>> {
        self.iter().map(|(date, data)| {
            self.get_identifier(date)
                .map(|identity| (identity, data))
        })
    }

    /// Maps every identity to its data.
    ///
    /// When several dates share an identity the one latest in iteration order wins.
    /// The first date in a foreign zone aborts the whole export.
    pub fn to_map(&self) -> StoreResult<HashMap<String, &T>> {
        self.identified().collect()
    }

    /// Consumes the container, mapping every identity to its owned data.
    /// Collisions resolve as in [to_map][Self::to_map].
    pub fn into_map(self) -> StoreResult<HashMap<String, T>> {
        let storage = self.storage;
        let mut map = HashMap::with_capacity(storage.len());
        let identities = storage
            .iter()
            .map(|(date, _)| storage.identity(date))
            .collect::<StoreResult<Vec<_>>>()?;
        for (identity, entry) in identities.into_iter().zip(storage.into_entries()) {
            map.insert(identity, entry.data);
        }
        Ok(map)
    }

    /// Iterates over `(date, data)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Instant, &T)> {
        self.storage.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Instant> {
        self.iter().map(|(date, _)| date)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.iter().map(|(_, data)| data)
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// See [DateStorage::clean]
    pub fn clean(&mut self) {
        self.storage.clean();
    }
}

impl<'a, T> IntoIterator for &'a DateContainer<T> {
    type Item = (&'a Instant, &'a T);
    type IntoIter = Box<dyn Iterator<Item = (&'a Instant, &'a T)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl<T> From<DateStorage<T>> for DateContainer<T> {
    fn from(storage: DateStorage<T>) -> Self {
        Self::new(storage)
    }
}
