//! External data adapters for the dispatch engine.
//!
//! Responsibilities:
//! - Resolve free-text addresses through a remote geocoding service.
//! - Map transport and protocol failures onto `GeocodeError` variants.
//!
//! Boundaries:
//! - Do not encode caching or matching rules (those live in `dispatch-core`).
//! - Keep every remote call bounded by the configured timeout.

#![forbid(unsafe_code)]

pub mod geocoding;

pub use geocoding::{
    DEFAULT_BASE_URL, DEFAULT_USER_AGENT, GeocoderBuildError, HttpGeocoder, HttpGeocoderConfig,
};
