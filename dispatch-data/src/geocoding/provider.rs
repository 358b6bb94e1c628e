//! HTTP-backed `GeocodeProvider` for the Yandex geocoder.
//!
//! [`GeocodeProvider`] is synchronous, so [`HttpGeocoder`] bridges its async
//! `reqwest` client by blocking on a Tokio runtime it owns, or on the
//! caller's runtime when invoked from a multi-threaded one.

use std::time::Duration;

use dispatch_core::{Coordinate, GeocodeError, GeocodeProvider};
use reqwest::Client;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use super::yandex::GeocodeResponse;

/// Error raised while constructing an [`HttpGeocoder`].
#[derive(Debug, Error)]
pub enum GeocoderBuildError {
    /// No API key was configured.
    #[error("geocoder API key must not be empty")]
    MissingApiKey,
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Default geocoder endpoint.
pub const DEFAULT_BASE_URL: &str = "https://geocode-maps.yandex.ru";

/// Default user agent for geocoding requests.
pub const DEFAULT_USER_AGENT: &str = "dispatch-geocoder/0.1";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for [`HttpGeocoder`].
#[derive(Clone)]
pub struct HttpGeocoderConfig {
    /// Base URL of the geocoding service.
    pub base_url: String,
    /// API credential sent with every request.
    pub api_key: String,
    /// Connect and total request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl std::fmt::Debug for HttpGeocoderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGeocoderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl HttpGeocoderConfig {
    /// Configuration for the default endpoint using `api_key`.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Point the client at a different endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/1.x/", self.base_url.trim_end_matches('/'))
    }
}

/// Geocoder issuing one HTTP request per lookup.
///
/// No retries are attempted. Timeouts, connection failures, non-success
/// statuses and undecodable bodies map onto the matching [`GeocodeError`]
/// variant.
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime, lookups block on the geocoder's own runtime.
/// Inside a `current_thread` runtime the caller's thread cannot block on a
/// second runtime, so the lookup runs on a scoped helper thread instead.
/// Inside a multi-threaded runtime the caller's handle is used via
/// [`tokio::task::block_in_place`]. The geocoder may be dropped from async
/// code.
pub struct HttpGeocoder {
    client: Client,
    config: HttpGeocoderConfig,
    runtime: OwnedRuntime,
}

/// Private runtime that shuts down in the background when dropped, so the
/// owner can be released inside another runtime without panicking.
struct OwnedRuntime(Option<Runtime>);

impl OwnedRuntime {
    fn block_on<F: std::future::Future<Output = Result<Coordinate, GeocodeError>>>(
        &self,
        future: F,
    ) -> Result<Coordinate, GeocodeError> {
        match &self.0 {
            Some(runtime) => runtime.block_on(future),
            None => Err(GeocodeError::ConnectionFailure {
                message: "geocoder runtime has shut down".to_owned(),
            }),
        }
    }
}

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for HttpGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGeocoder")
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

impl HttpGeocoder {
    /// Create a geocoder for the default endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, GeocoderBuildError> {
        Self::with_config(HttpGeocoderConfig::new(api_key))
    }

    /// Create a geocoder with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn with_config(config: HttpGeocoderConfig) -> Result<Self, GeocoderBuildError> {
        if config.api_key.trim().is_empty() {
            return Err(GeocoderBuildError::MissingApiKey);
        }
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(GeocoderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(GeocoderBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime: OwnedRuntime(Some(runtime)),
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &HttpGeocoderConfig {
        &self.config
    }

    async fn lookup_async(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let endpoint = self.config.endpoint();
        log::debug!("geocoding {address:?} via {endpoint}");

        let response = self
            .client
            .get(&endpoint)
            .query(&[
                ("apikey", self.config.api_key.as_str()),
                ("geocode", address),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(err))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(err))?;

        let body: GeocodeResponse = response.json().await.map_err(|err| {
            if err.is_timeout() {
                self.convert_reqwest_error(err)
            } else {
                GeocodeError::InvalidResponse {
                    message: err.without_url().to_string(),
                }
            }
        })?;
        body.into_coordinate(address)
    }

    /// Run a lookup on a scoped thread that is outside every runtime.
    fn lookup_on_helper_thread(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.runtime.block_on(self.lookup_async(address)))
                .join()
                .unwrap_or_else(|_| {
                    Err(GeocodeError::ConnectionFailure {
                        message: "geocoding helper thread panicked".to_owned(),
                    })
                })
        })
    }

    fn convert_reqwest_error(&self, error: reqwest::Error) -> GeocodeError {
        // The request URL carries the API key; keep it out of messages.
        let error = error.without_url();
        let message = error.to_string();

        if error.is_timeout() {
            return GeocodeError::Timeout {
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return GeocodeError::UpstreamError {
                status: status.as_u16(),
                message,
            };
        }

        GeocodeError::ConnectionFailure { message }
    }
}

impl GeocodeProvider for HttpGeocoder {
    fn lookup(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        if address.trim().is_empty() {
            return Err(GeocodeError::NotFound {
                address: address.to_owned(),
            });
        }

        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.lookup_async(address)))
            }
            Ok(_) => self.lookup_on_helper_thread(address),
            Err(_) => self.runtime.block_on(self.lookup_async(address)),
        }
    }
}
