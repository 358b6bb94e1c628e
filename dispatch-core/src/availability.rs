//! Cart fulfilment over the menu availability relation.
//!
//! The index maps each product to the set of restaurants currently offering
//! it. A cart is fulfilled by the intersection of those sets across every
//! distinct product in the cart.

use std::collections::{BTreeSet, HashMap};

use crate::{CartLine, MenuAvailability, ProductId, RestaurantId};

/// Per-product availability flags for a fixed restaurant ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProductAvailability {
    /// Product the row describes.
    pub product_id: ProductId,
    /// One flag per requested restaurant, in the requested order.
    pub available: Vec<bool>,
}

/// Product-to-restaurants lookup built from [`MenuAvailability`] rows.
///
/// # Examples
///
/// ```
/// use dispatch_core::{AvailabilityIndex, CartLine, MenuAvailability};
///
/// let index = AvailabilityIndex::from_rows([
///     MenuAvailability { restaurant_id: 1, product_id: 7, available: true },
///     MenuAvailability { restaurant_id: 1, product_id: 8, available: true },
///     MenuAvailability { restaurant_id: 2, product_id: 7, available: true },
/// ]);
/// let cart = [
///     CartLine { product_id: 7, quantity: 1 },
///     CartLine { product_id: 8, quantity: 2 },
/// ];
/// assert_eq!(index.fulfilling_restaurants(&cart).into_iter().collect::<Vec<_>>(), vec![1]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AvailabilityIndex {
    by_product: HashMap<ProductId, BTreeSet<RestaurantId>>,
}

impl AvailabilityIndex {
    /// Index the rows, keeping only `available = true` pairs.
    ///
    /// When the same (restaurant, product) pair appears more than once, the
    /// last row wins.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = MenuAvailability>,
    {
        let mut by_product: HashMap<ProductId, BTreeSet<RestaurantId>> = HashMap::new();
        for row in rows {
            let restaurants = by_product.entry(row.product_id).or_default();
            if row.available {
                restaurants.insert(row.restaurant_id);
            } else {
                restaurants.remove(&row.restaurant_id);
            }
        }
        by_product.retain(|_, restaurants| !restaurants.is_empty());
        Self { by_product }
    }

    /// Restaurants currently offering `product_id`.
    #[must_use]
    pub fn restaurants_for(&self, product_id: ProductId) -> Option<&BTreeSet<RestaurantId>> {
        self.by_product.get(&product_id)
    }

    /// Whether `restaurant_id` currently offers `product_id`.
    #[must_use]
    pub fn is_available(&self, restaurant_id: RestaurantId, product_id: ProductId) -> bool {
        self.restaurants_for(product_id)
            .is_some_and(|restaurants| restaurants.contains(&restaurant_id))
    }

    /// Restaurants able to supply every distinct product in `cart`.
    ///
    /// An empty cart yields the empty set: no restaurant is considered able
    /// to fulfil an order with nothing in it.
    #[must_use]
    pub fn fulfilling_restaurants(&self, cart: &[CartLine]) -> BTreeSet<RestaurantId> {
        let products: BTreeSet<ProductId> = cart.iter().map(|line| line.product_id).collect();
        let mut products = products.into_iter();
        let Some(first) = products.next() else {
            return BTreeSet::new();
        };

        let mut candidates = self.restaurants_for(first).cloned().unwrap_or_default();
        for product_id in products {
            if candidates.is_empty() {
                break;
            }
            match self.restaurants_for(product_id) {
                Some(restaurants) => candidates.retain(|id| restaurants.contains(id)),
                None => candidates.clear(),
            }
        }
        candidates
    }

    /// Availability flags for each product across `restaurants`.
    ///
    /// Pairs with no menu row are reported as unavailable.
    #[must_use]
    pub fn availability_matrix(
        &self,
        products: &[ProductId],
        restaurants: &[RestaurantId],
    ) -> Vec<ProductAvailability> {
        products
            .iter()
            .map(|&product_id| ProductAvailability {
                product_id,
                available: restaurants
                    .iter()
                    .map(|&restaurant_id| self.is_available(restaurant_id, product_id))
                    .collect(),
            })
            .collect()
    }
}
