//! Remote address geocoding.
//!
//! [`HttpGeocoder`] implements [`dispatch_core::GeocodeProvider`] against the
//! Yandex geocoder HTTP API. Each lookup is a single bounded request.
//!
//! # Example
//!
//! ```no_run
//! use dispatch_core::GeocodeProvider;
//! use dispatch_data::geocoding::{HttpGeocoder, HttpGeocoderConfig};
//! use std::time::Duration;
//!
//! let config = HttpGeocoderConfig::new("api-key")
//!     .with_timeout(Duration::from_secs(5))
//!     .with_user_agent("my-app/1.0");
//! let geocoder = HttpGeocoder::with_config(config)?;
//!
//! let coordinate = geocoder.lookup("Moscow, Red Square, 1")?;
//! println!("{}, {}", coordinate.latitude(), coordinate.longitude());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod provider;
mod yandex;

pub use provider::{
    DEFAULT_BASE_URL, DEFAULT_USER_AGENT, GeocoderBuildError, HttpGeocoder, HttpGeocoderConfig,
};
