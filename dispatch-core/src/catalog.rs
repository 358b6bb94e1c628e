//! Restaurants, menu availability rows and customer orders.
//!
//! These are read-only inputs owned by the surrounding catalog and ordering
//! subsystems. [`RestaurantCatalog`] bundles a restaurant list with an
//! [`AvailabilityIndex`] built once from the menu relation so that a batch of
//! orders can be matched without re-reading availability per order.

use std::collections::BTreeMap;

use crate::{AvailabilityIndex, Coordinate};

/// Identifier of a restaurant.
pub type RestaurantId = u64;
/// Identifier of a product.
pub type ProductId = u64;
/// Identifier of an order.
pub type OrderId = u64;

/// A restaurant able to prepare orders.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Restaurant {
    /// Unique identifier.
    pub id: RestaurantId,
    /// Display name.
    pub name: String,
    /// Location set when the restaurant was registered, if known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub coordinate: Option<Coordinate>,
}

impl Restaurant {
    /// Construct a restaurant.
    pub fn new(id: RestaurantId, name: impl Into<String>, coordinate: Option<Coordinate>) -> Self {
        Self {
            id,
            name: name.into(),
            coordinate,
        }
    }
}

/// One row of the menu availability relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MenuAvailability {
    /// Restaurant offering the product.
    pub restaurant_id: RestaurantId,
    /// Product on the menu.
    pub product_id: ProductId,
    /// Whether the product can currently be ordered from this restaurant.
    pub available: bool,
}

/// One line of a customer's cart.
///
/// Only the product identity matters for matching; the quantity is carried
/// for the surrounding order flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CartLine {
    /// Ordered product.
    pub product_id: ProductId,
    /// Number of units ordered.
    pub quantity: u32,
}

/// Processing state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderStatus {
    /// Submitted and not yet picked up by a dispatcher.
    #[default]
    New,
    /// Being handled.
    InProgress,
    /// Completed; excluded from dispatch listings.
    Closed,
}

/// A customer order awaiting dispatch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Order {
    /// Unique identifier.
    pub id: OrderId,
    /// Free-text delivery address as entered by the customer.
    pub address: String,
    /// Cart contents.
    pub items: Vec<CartLine>,
    /// Current processing state.
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: OrderStatus,
    /// Restaurant a dispatcher has already pinned the order to.
    #[cfg_attr(feature = "serde", serde(default))]
    pub restaurant_id: Option<RestaurantId>,
}

impl Order {
    /// Whether the order should appear in dispatch listings.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status != OrderStatus::Closed
    }
}

/// Restaurants plus the availability relation they publish.
#[derive(Debug, Clone, Default)]
pub struct RestaurantCatalog {
    restaurants: BTreeMap<RestaurantId, Restaurant>,
    index: AvailabilityIndex,
}

impl RestaurantCatalog {
    /// Build a catalog, indexing `menu` once.
    ///
    /// Menu rows naming restaurants missing from `restaurants` are dropped
    /// with a warning.
    pub fn new<R, M>(restaurants: R, menu: M) -> Self
    where
        R: IntoIterator<Item = Restaurant>,
        M: IntoIterator<Item = MenuAvailability>,
    {
        let restaurants: BTreeMap<_, _> = restaurants
            .into_iter()
            .map(|restaurant| (restaurant.id, restaurant))
            .collect();
        let index = AvailabilityIndex::from_rows(menu.into_iter().filter(|row| {
            let known = restaurants.contains_key(&row.restaurant_id);
            if !known {
                log::warn!(
                    "menu row for product {} names unknown restaurant {}; ignoring",
                    row.product_id,
                    row.restaurant_id
                );
            }
            known
        }));
        Self { restaurants, index }
    }

    /// Look up a restaurant by id.
    #[must_use]
    pub fn restaurant(&self, id: RestaurantId) -> Option<&Restaurant> {
        self.restaurants.get(&id)
    }

    /// All restaurants in ascending id order.
    pub fn restaurants(&self) -> impl Iterator<Item = &Restaurant> {
        self.restaurants.values()
    }

    /// The availability index built from the menu relation.
    #[must_use]
    pub const fn availability(&self) -> &AvailabilityIndex {
        &self.index
    }

    /// Restaurants able to supply every product in `cart`.
    #[must_use]
    pub fn fulfilling_restaurants(&self, cart: &[CartLine]) -> Vec<&Restaurant> {
        self.index
            .fulfilling_restaurants(cart)
            .into_iter()
            .filter_map(|id| self.restaurants.get(&id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn catalog() -> RestaurantCatalog {
        RestaurantCatalog::new(
            [
                Restaurant::new(1, "North", None),
                Restaurant::new(2, "South", None),
            ],
            [
                MenuAvailability {
                    restaurant_id: 1,
                    product_id: 10,
                    available: true,
                },
                MenuAvailability {
                    restaurant_id: 2,
                    product_id: 10,
                    available: true,
                },
                MenuAvailability {
                    restaurant_id: 99,
                    product_id: 10,
                    available: true,
                },
            ],
        )
    }

    #[rstest]
    fn drops_rows_for_unknown_restaurants(catalog: RestaurantCatalog) {
        let cart = [CartLine {
            product_id: 10,
            quantity: 1,
        }];
        let ids: Vec<_> = catalog
            .fulfilling_restaurants(&cart)
            .into_iter()
            .map(|restaurant| restaurant.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[rstest]
    fn looks_up_restaurants_by_id(catalog: RestaurantCatalog) {
        assert_eq!(catalog.restaurant(2).map(|r| r.name.as_str()), Some("South"));
        assert!(catalog.restaurant(3).is_none());
    }

    #[rstest]
    #[case(OrderStatus::New, true)]
    #[case(OrderStatus::InProgress, true)]
    #[case(OrderStatus::Closed, false)]
    fn closed_orders_are_not_open(#[case] status: OrderStatus, #[case] open: bool) {
        let order = Order {
            id: 1,
            address: "12 Main St".into(),
            items: Vec::new(),
            status,
            restaurant_id: None,
        };
        assert_eq!(order.is_open(), open);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn order_status_defaults_to_new_when_absent() {
        let order: Order = serde_json::from_str(
            r#"{"id": 3, "address": "12 Main St", "items": [{"product_id": 1, "quantity": 2}]}"#,
        )
        .expect("order JSON");
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.restaurant_id, None);
    }
}
