//! `resolve` command: print ranked restaurant candidates for open orders.

use std::io::Write;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use dispatch_core::{
    CoordinateCache, GeocodeProvider, OrderResolution, OrderResolver, SqliteCoordinateStore,
};
use dispatch_data::{DEFAULT_BASE_URL, HttpGeocoder, HttpGeocoderConfig};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_COORDINATES_DB, ARG_GEOCODER_API_KEY, ARG_GEOCODER_BASE_URL, ARG_GEOCODER_TIMEOUT_SECS,
    ARG_SNAPSHOT, CliError, DispatchSnapshot, ENV_GEOCODER_API_KEY, ENV_RESOLVE_SNAPSHOT,
    fs::require_existing,
};

const DEFAULT_COORDINATES_DB: &str = "coordinates.db";
const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 10;

/// CLI arguments for the `resolve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Resolve every open order in a JSON snapshot. Delivery \
                 addresses are looked up in the coordinate store first and \
                 geocoded only on a miss. Orders whose address cannot be \
                 resolved are listed with location_resolved = false.",
    about = "Rank fulfilling restaurants for open orders"
)]
#[ortho_config(prefix = "DISPATCH")]
pub(crate) struct ResolveArgs {
    /// Path to a JSON dispatch snapshot.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) snapshot_path: Option<Utf8PathBuf>,
    /// SQLite database caching resolved coordinates (`coordinates.db`).
    #[arg(long = ARG_COORDINATES_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) coordinates_db: Option<Utf8PathBuf>,
    /// Base URL of the geocoding service.
    #[arg(long = ARG_GEOCODER_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) geocoder_base_url: Option<String>,
    /// API key for the geocoding service.
    #[arg(long = ARG_GEOCODER_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) geocoder_api_key: Option<String>,
    /// Geocoding request timeout in seconds.
    #[arg(long = ARG_GEOCODER_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) geocoder_timeout_secs: Option<u64>,
}

impl ResolveArgs {
    pub(crate) fn into_config(self) -> Result<ResolveConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ResolveConfig::try_from(merged)
    }
}

/// Resolved `resolve` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolveConfig {
    pub(crate) snapshot_path: Utf8PathBuf,
    pub(crate) coordinates_db: Utf8PathBuf,
    pub(crate) geocoder_base_url: String,
    pub(crate) geocoder_api_key: String,
    pub(crate) geocoder_timeout: Duration,
}

impl ResolveConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.snapshot_path, ARG_SNAPSHOT)
    }
}

impl TryFrom<ResolveArgs> for ResolveConfig {
    type Error = CliError;

    fn try_from(args: ResolveArgs) -> Result<Self, Self::Error> {
        let snapshot_path = args.snapshot_path.ok_or(CliError::MissingArgument {
            field: ARG_SNAPSHOT,
            env: ENV_RESOLVE_SNAPSHOT,
        })?;
        let geocoder_api_key = args
            .geocoder_api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(CliError::MissingArgument {
                field: ARG_GEOCODER_API_KEY,
                env: ENV_GEOCODER_API_KEY,
            })?;

        Ok(Self {
            snapshot_path,
            coordinates_db: args
                .coordinates_db
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_COORDINATES_DB)),
            geocoder_base_url: args
                .geocoder_base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            geocoder_api_key,
            geocoder_timeout: Duration::from_secs(
                args.geocoder_timeout_secs
                    .unwrap_or(DEFAULT_GEOCODER_TIMEOUT_SECS),
            ),
        })
    }
}

/// Resolver wired to the SQLite store and an arbitrary geocoder.
pub(crate) type DispatchResolver =
    OrderResolver<SqliteCoordinateStore, Box<dyn GeocodeProvider + Send + Sync>>;

/// Builds the resolver for the current invocation.
pub(crate) trait ResolverBuilder {
    fn build(&self, config: &ResolveConfig) -> Result<DispatchResolver, CliError>;
}

pub(crate) struct DefaultResolverBuilder;

impl ResolverBuilder for DefaultResolverBuilder {
    fn build(&self, config: &ResolveConfig) -> Result<DispatchResolver, CliError> {
        let store = open_store(&config.coordinates_db)?;
        let geocoder_config = HttpGeocoderConfig::new(config.geocoder_api_key.clone())
            .with_base_url(config.geocoder_base_url.clone())
            .with_timeout(config.geocoder_timeout);
        let geocoder = HttpGeocoder::with_config(geocoder_config).map_err(|source| {
            CliError::BuildGeocoder {
                base_url: config.geocoder_base_url.clone(),
                source,
            }
        })?;
        Ok(OrderResolver::new(CoordinateCache::new(
            store,
            Box::new(geocoder),
        )))
    }
}

pub(crate) fn open_store(path: &Utf8Path) -> Result<SqliteCoordinateStore, CliError> {
    SqliteCoordinateStore::open(path.as_std_path()).map_err(|source| {
        CliError::OpenCoordinateStore {
            path: path.to_path_buf(),
            source,
        }
    })
}

pub(crate) fn run_resolve(args: ResolveArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_resolve_with(args, &DefaultResolverBuilder, &mut stdout)
}

pub(crate) fn run_resolve_with(
    args: ResolveArgs,
    builder: &dyn ResolverBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let listing = execute_resolve(args, builder)?;
    crate::products::write_json(writer, &listing)
}

fn execute_resolve(
    args: ResolveArgs,
    builder: &dyn ResolverBuilder,
) -> Result<Vec<OrderResolution>, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let snapshot = DispatchSnapshot::load(&config.snapshot_path)?;
    let resolver = builder.build(&config)?;
    let listing = resolver.resolve_batch(&snapshot.orders, &snapshot.catalog());
    let unresolved = listing
        .iter()
        .filter(|row| !row.result.location_resolved)
        .count();
    if unresolved > 0 {
        log::warn!("{unresolved} of {} open orders have no resolved location", listing.len());
    }
    Ok(listing)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ResolveConfig, CliError> {
    let merged = ResolveArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ResolveConfig::try_from(merged)
}
