//! Read-through coordinate cache.
//!
//! [`CoordinateCache`] consults a [`CoordinateStore`] first and only calls the
//! [`GeocodeProvider`] on a miss. A successful lookup is written back with
//! first-writer-wins semantics; a failed lookup writes nothing, so the next
//! request for the same address tries the provider again.

use std::collections::HashMap;

use crate::{Address, CacheEntry, Coordinate, CoordinateStore, GeocodeProvider};

/// Outcome of resolving an address.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Location {
    /// The address maps to this coordinate.
    Known(Coordinate),
    /// No coordinate could be produced on this attempt.
    Unresolvable,
}

impl Location {
    /// The coordinate, if known.
    #[must_use]
    pub const fn coordinate(self) -> Option<Coordinate> {
        match self {
            Self::Known(coordinate) => Some(coordinate),
            Self::Unresolvable => None,
        }
    }

    /// Whether a coordinate is available.
    #[must_use]
    pub const fn is_known(self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl From<Option<Coordinate>> for Location {
    fn from(value: Option<Coordinate>) -> Self {
        value.map_or(Self::Unresolvable, Self::Known)
    }
}

/// Address resolver backed by persistent storage and a remote geocoder.
///
/// Every failure is absorbed here: store errors degrade to a miss (on read)
/// or are ignored (on write), and geocoder errors become
/// [`Location::Unresolvable`]. All of them are logged at warn level.
///
/// # Examples
///
/// ```
/// use dispatch_core::{Coordinate, CoordinateCache, Location};
/// use dispatch_core::test_support::{MemoryCoordinateStore, StubGeocoder};
///
/// let coordinate = Coordinate::new(55.75, 37.62).expect("coordinate");
/// let cache = CoordinateCache::new(
///     MemoryCoordinateStore::default(),
///     StubGeocoder::with_coordinate(coordinate),
/// );
///
/// assert_eq!(cache.resolve("12 Main St"), Location::Known(coordinate));
/// assert_eq!(cache.resolve("12  main st"), Location::Known(coordinate));
/// assert_eq!(cache.geocoder().calls(), 1);
/// ```
#[derive(Debug)]
pub struct CoordinateCache<S, G> {
    store: S,
    geocoder: G,
}

impl<S, G> CoordinateCache<S, G>
where
    S: CoordinateStore,
    G: GeocodeProvider,
{
    /// Combine a store and a geocoder.
    pub const fn new(store: S, geocoder: G) -> Self {
        Self { store, geocoder }
    }

    /// The backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The geocoder consulted on misses.
    pub const fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Resolve a free-text address.
    ///
    /// Blank input is unresolvable without contacting the geocoder.
    pub fn resolve(&self, raw: &str) -> Location {
        match Address::parse(raw) {
            Ok(address) => self.resolve_address(&address),
            Err(err) => {
                log::debug!("not resolving address {raw:?}: {err}");
                Location::Unresolvable
            }
        }
    }

    /// Resolve an already normalised address.
    pub fn resolve_address(&self, address: &Address) -> Location {
        match self.store.get(address) {
            Ok(Some(entry)) => {
                log::debug!("coordinate cache hit for {:?}", address.key());
                return Location::Known(entry.coordinate);
            }
            Ok(None) => log::debug!("coordinate cache miss for {:?}", address.key()),
            Err(err) => log::warn!(
                "coordinate store read failed for {:?}; treating as miss: {err}",
                address.key()
            ),
        }
        self.fetch(address)
    }

    /// Resolve many addresses, reading the store once for all of them.
    ///
    /// Each distinct address is looked up remotely at most once, and only if
    /// the batch read did not return it.
    pub fn prefetch(&self, addresses: &[Address]) -> HashMap<Address, Location> {
        let mut resolved: HashMap<Address, Location> = match self.store.get_many(addresses) {
            Ok(entries) => entries
                .into_iter()
                .map(|entry| (entry.address, Location::Known(entry.coordinate)))
                .collect(),
            Err(err) => {
                log::warn!("coordinate store batch read failed; treating all as misses: {err}");
                HashMap::new()
            }
        };
        log::debug!(
            "coordinate prefetch: {} of {} addresses cached",
            resolved.len(),
            addresses.len()
        );

        for address in addresses {
            if !resolved.contains_key(address) {
                let location = self.fetch(address);
                resolved.insert(address.clone(), location);
            }
        }
        resolved
    }

    fn fetch(&self, address: &Address) -> Location {
        let coordinate = match self.geocoder.lookup(address.query()) {
            Ok(coordinate) => coordinate,
            Err(err) => {
                log::warn!("geocoding {:?} failed: {err}", address.query());
                return Location::Unresolvable;
            }
        };

        let entry = CacheEntry::now(address.clone(), coordinate);
        match self.store.insert_if_absent(&entry) {
            Ok(true) => log::debug!("cached coordinate for {:?}", address.key()),
            Ok(false) => log::debug!(
                "coordinate for {:?} was cached concurrently; keeping stored entry",
                address.key()
            ),
            Err(err) => log::warn!(
                "failed to cache coordinate for {:?}: {err}",
                address.key()
            ),
        }
        Location::Known(coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeocodeError;
    use crate::test_support::{
        FailingCoordinateStore, MemoryCoordinateStore, StubGeocoder, StubResponse,
    };
    use rstest::{fixture, rstest};

    fn coordinate(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("coordinate")
    }

    fn address(raw: &str) -> Address {
        Address::parse(raw).expect("address")
    }

    #[fixture]
    fn cache() -> CoordinateCache<MemoryCoordinateStore, StubGeocoder> {
        CoordinateCache::new(
            MemoryCoordinateStore::default(),
            StubGeocoder::with_coordinate(coordinate(55.75, 37.62)),
        )
    }

    #[rstest]
    fn miss_populates_store_and_hit_skips_geocoder(
        cache: CoordinateCache<MemoryCoordinateStore, StubGeocoder>,
    ) {
        assert_eq!(cache.resolve("12 Main St"), Location::Known(coordinate(55.75, 37.62)));
        assert_eq!(cache.store().len(), 1);
        assert_eq!(cache.resolve("12 Main St"), Location::Known(coordinate(55.75, 37.62)));
        assert_eq!(cache.geocoder().calls(), 1);
    }

    #[rstest]
    #[case(GeocodeError::Timeout { timeout_secs: 10 })]
    #[case(GeocodeError::ConnectionFailure { message: "refused".into() })]
    #[case(GeocodeError::UpstreamError { status: 503, message: "unavailable".into() })]
    fn failures_are_not_cached(#[case] error: GeocodeError) {
        let cache = CoordinateCache::new(
            MemoryCoordinateStore::default(),
            StubGeocoder::with_error(error),
        );
        assert_eq!(cache.resolve("12 Main St"), Location::Unresolvable);
        assert_eq!(cache.resolve("12 Main St"), Location::Unresolvable);
        assert!(cache.store().is_empty());
        assert_eq!(cache.geocoder().calls(), 2);
    }

    #[rstest]
    #[case("")]
    #[case("   \t ")]
    fn blank_addresses_never_reach_geocoder(
        cache: CoordinateCache<MemoryCoordinateStore, StubGeocoder>,
        #[case] raw: &str,
    ) {
        assert_eq!(cache.resolve(raw), Location::Unresolvable);
        assert_eq!(cache.geocoder().calls(), 0);
    }

    #[rstest]
    fn existing_entry_wins_over_fresh_lookup() {
        let stored = coordinate(1.0, 2.0);
        let store = MemoryCoordinateStore::with_entries([CacheEntry::now(address("7 Elm Rd"), stored)]);
        let cache = CoordinateCache::new(store, StubGeocoder::with_coordinate(coordinate(3.0, 4.0)));

        assert_eq!(cache.resolve("7 ELM RD"), Location::Known(stored));
        assert_eq!(cache.geocoder().calls(), 0);
    }

    #[rstest]
    fn store_failure_degrades_to_geocoder() {
        let cache = CoordinateCache::new(
            FailingCoordinateStore,
            StubGeocoder::with_coordinate(coordinate(55.75, 37.62)),
        );
        assert_eq!(cache.resolve("12 Main St"), Location::Known(coordinate(55.75, 37.62)));
        assert_eq!(cache.resolve("12 Main St"), Location::Known(coordinate(55.75, 37.62)));
        assert_eq!(cache.geocoder().calls(), 2);
    }

    #[rstest]
    fn prefetch_only_geocodes_missing_distinct_addresses() {
        let store = MemoryCoordinateStore::with_entries([CacheEntry::now(
            address("1 Cached St"),
            coordinate(10.0, 10.0),
        )]);
        let geocoder = StubGeocoder::with_coordinate(coordinate(20.0, 20.0)).with_address(
            "3 Broken St",
            StubResponse::Fail(GeocodeError::NotFound {
                address: "3 Broken St".into(),
            }),
        );
        let cache = CoordinateCache::new(store, geocoder);

        let wanted = [
            address("1 Cached St"),
            address("2 New St"),
            address("2 NEW ST"),
            address("3 Broken St"),
        ];
        let resolved = cache.prefetch(&wanted);

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[&address("1 cached st")], Location::Known(coordinate(10.0, 10.0)));
        assert_eq!(resolved[&address("2 new st")], Location::Known(coordinate(20.0, 20.0)));
        assert_eq!(resolved[&address("3 broken st")], Location::Unresolvable);
        assert_eq!(cache.geocoder().calls(), 2);
        assert_eq!(cache.store().len(), 2);
    }

    /// Waits for every racing caller to miss before answering.
    #[cfg(feature = "store-sqlite")]
    struct RendezvousGeocoder {
        barrier: std::sync::Arc<std::sync::Barrier>,
        coordinate: Coordinate,
    }

    #[cfg(feature = "store-sqlite")]
    impl GeocodeProvider for RendezvousGeocoder {
        fn lookup(&self, _address: &str) -> Result<Coordinate, GeocodeError> {
            self.barrier.wait();
            Ok(self.coordinate)
        }
    }

    #[cfg(feature = "store-sqlite")]
    #[rstest]
    fn racing_misses_keep_one_entry_and_return_their_own_lookup() {
        use crate::SqliteCoordinateStore;
        use std::sync::{Arc, Barrier};

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("coordinates.db");
        drop(SqliteCoordinateStore::open(&path).expect("create schema"));

        let barrier = Arc::new(Barrier::new(2));
        let answers = [coordinate(1.0, 1.0), coordinate(2.0, 2.0)];
        let handles: Vec<_> = answers
            .iter()
            .map(|&answer| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    let store = SqliteCoordinateStore::open(&path).expect("open store");
                    let cache = CoordinateCache::new(
                        store,
                        RendezvousGeocoder {
                            barrier,
                            coordinate: answer,
                        },
                    );
                    cache.resolve("12 Main St")
                })
            })
            .collect();
        let results: Vec<Location> = handles
            .into_iter()
            .map(|handle| handle.join().expect("resolver thread"))
            .collect();

        assert_eq!(results, vec![Location::Known(answers[0]), Location::Known(answers[1])]);

        let store = SqliteCoordinateStore::open(&path).expect("reopen store");
        let wanted = [address("12 main st")];
        let stored = store.get_many(&wanted).expect("read back");
        assert_eq!(stored.len(), 1);
        assert!(answers.contains(&stored[0].coordinate));
    }
}
