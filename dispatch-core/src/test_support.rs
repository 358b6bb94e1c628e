//! In-memory doubles for the coordinate store and the geocoder, used by unit
//! and behaviour tests.

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{Address, CacheEntry, Coordinate, CoordinateStore, GeocodeError, GeocodeProvider};

/// In-memory `CoordinateStore` keyed by normalised address.
///
/// A poisoned lock is recovered rather than reported; the map stays
/// consistent because every mutation is a single `insert`.
#[derive(Debug, Default)]
pub struct MemoryCoordinateStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCoordinateStore {
    /// Create a store pre-populated with `entries`. Later duplicates are
    /// ignored, matching `insert_if_absent`.
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = CacheEntry>,
    {
        let store = Self::default();
        for entry in entries {
            let _ = store.insert_if_absent(&entry);
        }
        store
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CoordinateStore for MemoryCoordinateStore {
    type Error = Infallible;

    fn get(&self, address: &Address) -> Result<Option<CacheEntry>, Self::Error> {
        Ok(self.lock().get(address.key()).cloned())
    }

    fn get_many(&self, addresses: &[Address]) -> Result<Vec<CacheEntry>, Self::Error> {
        let entries = self.lock();
        let mut seen = HashSet::new();
        Ok(addresses
            .iter()
            .filter(|address| seen.insert(address.key()))
            .filter_map(|address| entries.get(address.key()).cloned())
            .collect())
    }

    fn insert_if_absent(&self, entry: &CacheEntry) -> Result<bool, Self::Error> {
        let mut entries = self.lock();
        if entries.contains_key(entry.address.key()) {
            return Ok(false);
        }
        entries.insert(entry.address.key().to_owned(), entry.clone());
        Ok(true)
    }
}

/// Store whose every operation fails, for exercising soft-failure paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingCoordinateStore;

/// Error returned by [`FailingCoordinateStore`].
#[derive(Debug, thiserror::Error)]
#[error("coordinate store unavailable")]
pub struct StoreUnavailable;

impl CoordinateStore for FailingCoordinateStore {
    type Error = StoreUnavailable;

    fn get(&self, _address: &Address) -> Result<Option<CacheEntry>, Self::Error> {
        Err(StoreUnavailable)
    }

    fn get_many(&self, _addresses: &[Address]) -> Result<Vec<CacheEntry>, Self::Error> {
        Err(StoreUnavailable)
    }

    fn insert_if_absent(&self, _entry: &CacheEntry) -> Result<bool, Self::Error> {
        Err(StoreUnavailable)
    }
}

/// Canned outcome returned by [`StubGeocoder`].
#[derive(Debug, Clone)]
pub enum StubResponse {
    /// Every lookup succeeds with this coordinate.
    Found(Coordinate),
    /// Every lookup fails with this error.
    Fail(GeocodeError),
}

/// Geocoder double that counts its calls.
///
/// Per-address answers registered with [`StubGeocoder::with_address`] take
/// precedence over the default response.
#[derive(Debug)]
pub struct StubGeocoder {
    default: StubResponse,
    by_address: HashMap<String, StubResponse>,
    calls: AtomicUsize,
}

impl StubGeocoder {
    /// A geocoder answering every lookup with `coordinate`.
    pub fn with_coordinate(coordinate: Coordinate) -> Self {
        Self::with_response(StubResponse::Found(coordinate))
    }

    /// A geocoder failing every lookup with `error`.
    pub fn with_error(error: GeocodeError) -> Self {
        Self::with_response(StubResponse::Fail(error))
    }

    /// A geocoder answering with `response` unless overridden per address.
    pub fn with_response(response: StubResponse) -> Self {
        Self {
            default: response,
            by_address: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer lookups of `address` (matched after normalisation) with
    /// `response`.
    #[must_use]
    pub fn with_address(mut self, address: &str, response: StubResponse) -> Self {
        let key = Address::parse(address).map_or_else(|_| address.to_owned(), |a| a.key().to_owned());
        self.by_address.insert(key, response);
        self
    }

    /// Number of lookups performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GeocodeProvider for StubGeocoder {
    fn lookup(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = Address::parse(address).map_or_else(|_| address.to_owned(), |a| a.key().to_owned());
        match self.by_address.get(&key).unwrap_or(&self.default) {
            StubResponse::Found(coordinate) => Ok(*coordinate),
            StubResponse::Fail(error) => Err(error.clone()),
        }
    }
}
