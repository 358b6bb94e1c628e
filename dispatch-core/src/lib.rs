//! Core domain for the dispatch engine.
//!
//! Given a customer order this crate works out which restaurants can supply
//! the whole cart and ranks them by geodesic distance from the delivery
//! address. Addresses are resolved through a [`CoordinateCache`] which reads
//! a persistent [`CoordinateStore`] and falls back to a [`GeocodeProvider`]
//! on a miss.
//!
//! Nothing in the resolution path raises an error to its caller: geocoding
//! and storage failures degrade to a result flagged
//! `location_resolved = false`.

#![forbid(unsafe_code)]

mod address;
mod availability;
mod cache;
mod catalog;
mod coordinate;
mod geocode;
mod ranking;
mod resolver;
pub mod store;

#[doc(hidden)]
pub mod test_support;

pub use address::{Address, AddressError};
pub use availability::{AvailabilityIndex, ProductAvailability};
pub use cache::{CoordinateCache, Location};
pub use catalog::{
    CartLine, MenuAvailability, Order, OrderId, OrderStatus, ProductId, Restaurant,
    RestaurantCatalog, RestaurantId,
};
pub use coordinate::{COORDINATE_DECIMAL_PLACES, Coordinate, CoordinateError};
pub use geocode::{GeocodeError, GeocodeProvider};
pub use ranking::{DistanceRanker, RankedCandidate, Ranking, RankingStatus, geodesic_km};
pub use resolver::{OrderResolution, OrderResolver, ResolutionResult};
pub use store::{CacheEntry, CoordinateStore};

#[cfg(feature = "store-sqlite")]
pub use store::{SqliteCoordinateStore, SqliteCoordinateStoreError};
