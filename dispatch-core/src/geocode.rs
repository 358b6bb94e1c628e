//! Address-to-coordinate lookup against a remote geocoding service.
//!
//! [`GeocodeProvider`] is deliberately synchronous so the core stays usable
//! from non-async callers; network-backed implementations bridge to their
//! async client internally and must bound every call with a timeout.

use thiserror::Error;

use crate::Coordinate;

/// Errors from [`GeocodeProvider::lookup`].
///
/// Every variant is a soft failure for the coordinate cache: the address is
/// reported as unresolvable and nothing is cached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    /// The request did not complete within the configured timeout.
    #[error("geocoding request timed out after {timeout_secs}s")]
    Timeout {
        /// Timeout that elapsed, in seconds.
        timeout_secs: u64,
    },
    /// The service could not be reached.
    #[error("failed to reach geocoding service: {message}")]
    ConnectionFailure {
        /// Transport error description.
        message: String,
    },
    /// The service answered with a non-success HTTP status.
    #[error("geocoding service returned HTTP {status}: {message}")]
    UpstreamError {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
    /// The service answered but had no match for the address.
    #[error("no geocoding match for {address:?}")]
    NotFound {
        /// Address that was queried.
        address: String,
    },
    /// The response body could not be decoded into a coordinate.
    #[error("invalid geocoding response: {message}")]
    InvalidResponse {
        /// Decoding failure description.
        message: String,
    },
}

/// Resolve a free-text address to a coordinate with one remote call.
///
/// Implementations perform no retries, batching or rate limiting; a failure
/// is returned immediately.
///
/// # Examples
///
/// ```
/// use dispatch_core::{Coordinate, GeocodeError, GeocodeProvider};
///
/// struct Fixed;
///
/// impl GeocodeProvider for Fixed {
///     fn lookup(&self, address: &str) -> Result<Coordinate, GeocodeError> {
///         if address.is_empty() {
///             return Err(GeocodeError::NotFound { address: address.to_owned() });
///         }
///         Coordinate::new(55.75, 37.62).map_err(|err| GeocodeError::InvalidResponse {
///             message: err.to_string(),
///         })
///     }
/// }
///
/// let coordinate = Fixed.lookup("12 Main St")?;
/// assert_eq!(coordinate.latitude(), 55.75);
/// # Ok::<(), GeocodeError>(())
/// ```
pub trait GeocodeProvider {
    /// Look up the coordinate for `address`.
    fn lookup(&self, address: &str) -> Result<Coordinate, GeocodeError>;
}

impl<T: GeocodeProvider + ?Sized> GeocodeProvider for &T {
    fn lookup(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        (**self).lookup(address)
    }
}

impl<T: GeocodeProvider + ?Sized> GeocodeProvider for Box<T> {
    fn lookup(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        (**self).lookup(address)
    }
}
