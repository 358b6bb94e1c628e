//! Facade crate for the dispatch engine.
//!
//! This crate re-exports the core domain types and exposes the SQLite
//! coordinate store and the HTTP geocoder behind feature flags.

#![forbid(unsafe_code)]

pub use dispatch_core::{
    Address, AddressError, AvailabilityIndex, CacheEntry, CartLine, Coordinate, CoordinateCache,
    CoordinateError, CoordinateStore, DistanceRanker, GeocodeError, GeocodeProvider, Location,
    MenuAvailability, Order, OrderId, OrderResolution, OrderResolver, OrderStatus, ProductAvailability,
    ProductId, RankedCandidate, Ranking, RankingStatus, ResolutionResult, Restaurant,
    RestaurantCatalog, RestaurantId, geodesic_km,
};

#[cfg(feature = "store-sqlite")]
pub use dispatch_core::{SqliteCoordinateStore, SqliteCoordinateStoreError};

#[cfg(feature = "geocoder-http")]
pub use dispatch_data::{GeocoderBuildError, HttpGeocoder, HttpGeocoderConfig};
