//! JSON snapshot of the catalog and order tables consumed by the CLI.

use std::collections::BTreeSet;
use std::io::BufReader;

use camino::Utf8Path;
use dispatch_core::{MenuAvailability, Order, ProductId, Restaurant, RestaurantCatalog};
use serde::{Deserialize, Serialize};

use crate::{CliError, fs::open_utf8_file};

/// Restaurants, menu availability rows and orders exported from the
/// surrounding application.
///
/// ```json
/// {
///   "restaurants": [{"id": 1, "name": "Central", "coordinate": {"lat": 55.76, "lon": 37.64}}],
///   "menu": [{"restaurant_id": 1, "product_id": 7, "available": true}],
///   "orders": [{"id": 10, "address": "12 Main St", "items": [{"product_id": 7, "quantity": 2}]}]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchSnapshot {
    /// Registered restaurants.
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
    /// Menu availability relation.
    #[serde(default)]
    pub menu: Vec<MenuAvailability>,
    /// Orders in any status.
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl DispatchSnapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Utf8Path) -> Result<Self, CliError> {
        let file = open_utf8_file(path).map_err(|source| CliError::OpenSnapshot {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseSnapshot {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Index the restaurants and menu into a catalog.
    #[must_use]
    pub fn catalog(&self) -> RestaurantCatalog {
        RestaurantCatalog::new(self.restaurants.iter().cloned(), self.menu.iter().copied())
    }

    /// Every product mentioned by the menu, ascending.
    #[must_use]
    pub fn products(&self) -> Vec<ProductId> {
        self.menu
            .iter()
            .map(|row| row.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
