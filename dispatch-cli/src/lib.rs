//! Command-line interface for the dispatch engine.
//!
//! `dispatch resolve` prints the dispatcher listing for a snapshot of
//! restaurants, menu availability and orders; `dispatch products` prints
//! which restaurant currently offers which product.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod fs;
mod products;
mod resolve;
mod snapshot;

pub use error::CliError;
pub use snapshot::DispatchSnapshot;

use products::{ProductsArgs, run_products};
use resolve::{ResolveArgs, run_resolve};

const ARG_SNAPSHOT: &str = "snapshot";
const ARG_COORDINATES_DB: &str = "coordinates-db";
const ARG_GEOCODER_BASE_URL: &str = "geocoder-base-url";
const ARG_GEOCODER_API_KEY: &str = "geocoder-api-key";
const ARG_GEOCODER_TIMEOUT_SECS: &str = "geocoder-timeout-secs";
const ENV_RESOLVE_SNAPSHOT: &str = "DISPATCH_CMDS_RESOLVE_SNAPSHOT_PATH";
const ENV_GEOCODER_API_KEY: &str = "DISPATCH_CMDS_RESOLVE_GEOCODER_API_KEY";
const ENV_PRODUCTS_SNAPSHOT: &str = "DISPATCH_CMDS_PRODUCTS_SNAPSHOT_PATH";

/// Run the dispatch CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Resolve(args) => run_resolve(args),
        Command::Products(args) => run_products(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "dispatch",
    about = "Match food orders to restaurants and rank them by distance",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve open orders into ranked restaurant candidates.
    Resolve(ResolveArgs),
    /// Print the product by restaurant availability matrix.
    Products(ProductsArgs),
}

#[cfg(test)]
mod tests;
