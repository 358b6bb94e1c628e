//! `products` command: print which restaurant offers which product.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use dispatch_core::{ProductAvailability, RestaurantId};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{ARG_SNAPSHOT, CliError, DispatchSnapshot, ENV_PRODUCTS_SNAPSHOT, fs::require_existing};

/// CLI arguments for the `products` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Print the product by restaurant availability matrix")]
#[ortho_config(prefix = "DISPATCH")]
pub(crate) struct ProductsArgs {
    /// Path to a JSON dispatch snapshot.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) snapshot_path: Option<Utf8PathBuf>,
}

/// Column header of the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RestaurantColumn {
    pub(crate) id: RestaurantId,
    pub(crate) name: String,
}

/// Availability matrix with restaurants as columns, ordered by name and
/// then by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ProductMatrix {
    pub(crate) restaurants: Vec<RestaurantColumn>,
    pub(crate) products: Vec<ProductAvailability>,
}

impl ProductMatrix {
    pub(crate) fn from_snapshot(snapshot: &DispatchSnapshot) -> Self {
        let catalog = snapshot.catalog();
        let mut restaurants: Vec<RestaurantColumn> = catalog
            .restaurants()
            .map(|restaurant| RestaurantColumn {
                id: restaurant.id,
                name: restaurant.name.clone(),
            })
            .collect();
        restaurants.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        let ids: Vec<RestaurantId> = restaurants.iter().map(|column| column.id).collect();
        let products = catalog
            .availability()
            .availability_matrix(&snapshot.products(), &ids);
        Self {
            restaurants,
            products,
        }
    }
}

pub(crate) fn run_products(args: ProductsArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_products_with(args, &mut stdout)
}

pub(crate) fn run_products_with(args: ProductsArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let path = merged.snapshot_path.ok_or(CliError::MissingArgument {
        field: ARG_SNAPSHOT,
        env: ENV_PRODUCTS_SNAPSHOT,
    })?;
    require_existing(&path, ARG_SNAPSHOT)?;
    let snapshot = DispatchSnapshot::load(&path)?;
    write_json(writer, &ProductMatrix::from_snapshot(&snapshot))
}

/// Write `value` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
