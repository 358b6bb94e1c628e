//! Persistent storage for resolved address coordinates.
//!
//! The `CoordinateStore` trait defines the narrow contract the coordinate
//! cache needs: point reads, batch reads and a first-writer-wins insert keyed
//! by the normalised address. Entries are never updated or deleted here.

use std::time::SystemTime;

use crate::{Address, Coordinate};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::{SqliteCoordinateStore, SqliteCoordinateStoreError};

/// A resolved address as persisted by a [`CoordinateStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Normalised address the coordinate belongs to.
    pub address: Address,
    /// Resolved coordinate.
    pub coordinate: Coordinate,
    /// When the coordinate was first resolved.
    pub resolved_at: SystemTime,
}

impl CacheEntry {
    /// Build an entry stamped with the current time.
    #[must_use]
    pub fn now(address: Address, coordinate: Coordinate) -> Self {
        Self {
            address,
            coordinate,
            resolved_at: SystemTime::now(),
        }
    }
}

/// Shared, persistent mapping from normalised address to coordinate.
///
/// Implementations must be safe under concurrent misses for the same
/// address: the key carries a uniqueness constraint and
/// [`insert_if_absent`](CoordinateStore::insert_if_absent) never overwrites
/// an existing entry.
///
/// # Examples
///
/// ```
/// use dispatch_core::{Address, CacheEntry, Coordinate, CoordinateStore};
/// use dispatch_core::test_support::MemoryCoordinateStore;
///
/// let store = MemoryCoordinateStore::default();
/// let address = Address::parse("12 Main St").expect("address");
/// let first = CacheEntry::now(address.clone(), Coordinate::new(55.75, 37.62).expect("coordinate"));
/// let second = CacheEntry::now(address.clone(), Coordinate::new(1.0, 1.0).expect("coordinate"));
///
/// assert!(store.insert_if_absent(&first).expect("insert"));
/// assert!(!store.insert_if_absent(&second).expect("insert"));
/// let stored = store.get(&address).expect("read").expect("entry");
/// assert_eq!(stored.coordinate, first.coordinate);
/// ```
pub trait CoordinateStore {
    /// Error raised by the backing storage.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Return the entry for `address`, if one exists.
    fn get(&self, address: &Address) -> Result<Option<CacheEntry>, Self::Error>;

    /// Return the entries for every address in `addresses` that is stored.
    ///
    /// Missing addresses are simply absent from the result; duplicates in
    /// the input do not produce duplicate entries.
    fn get_many(&self, addresses: &[Address]) -> Result<Vec<CacheEntry>, Self::Error>;

    /// Insert `entry` unless its address is already stored.
    ///
    /// Returns `true` when this call created the entry and `false` when an
    /// entry for the address already existed (which is left untouched).
    fn insert_if_absent(&self, entry: &CacheEntry) -> Result<bool, Self::Error>;
}

impl<T: CoordinateStore + ?Sized> CoordinateStore for &T {
    type Error = T::Error;

    fn get(&self, address: &Address) -> Result<Option<CacheEntry>, Self::Error> {
        (**self).get(address)
    }

    fn get_many(&self, addresses: &[Address]) -> Result<Vec<CacheEntry>, Self::Error> {
        (**self).get_many(addresses)
    }

    fn insert_if_absent(&self, entry: &CacheEntry) -> Result<bool, Self::Error> {
        (**self).insert_if_absent(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::CoordinateStore;
    use crate::{Address, CacheEntry, Coordinate, test_support::MemoryCoordinateStore};
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> MemoryCoordinateStore {
        MemoryCoordinateStore::default()
    }

    fn entry(raw: &str, lat: f64, lon: f64) -> CacheEntry {
        CacheEntry::now(
            Address::parse(raw).expect("address"),
            Coordinate::new(lat, lon).expect("coordinate"),
        )
    }

    #[rstest]
    fn missing_address_reads_as_none(store: MemoryCoordinateStore) {
        let address = Address::parse("nowhere").expect("address");
        assert!(store.get(&address).expect("read").is_none());
    }

    #[rstest]
    fn first_writer_wins(store: MemoryCoordinateStore) {
        assert!(store.insert_if_absent(&entry("1 A St", 1.0, 1.0)).expect("insert"));
        assert!(!store.insert_if_absent(&entry("1 a st", 2.0, 2.0)).expect("insert"));

        let stored = store
            .get(&Address::parse("1 A ST").expect("address"))
            .expect("read")
            .expect("entry");
        assert_eq!(stored.coordinate, Coordinate::new(1.0, 1.0).expect("coordinate"));
        assert_eq!(store.len(), 1);
    }

    #[rstest]
    fn get_many_returns_only_stored_addresses(store: MemoryCoordinateStore) {
        store.insert_if_absent(&entry("1 A St", 1.0, 1.0)).expect("insert");
        store.insert_if_absent(&entry("2 B St", 2.0, 2.0)).expect("insert");

        let wanted = [
            Address::parse("1 A St").expect("address"),
            Address::parse("3 C St").expect("address"),
            Address::parse("1 a st").expect("address"),
        ];
        let found = store.get_many(&wanted).expect("read");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].address.key(), "1 a st");
    }
}
