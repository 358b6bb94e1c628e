//! Order resolution: locate the delivery address, find restaurants able to
//! fulfil the cart, then rank them by distance.
//!
//! Resolution never fails. When the address cannot be geocoded the result
//! carries `location_resolved = false` and no candidates, so a dispatcher
//! view can still render the order.

use crate::{
    Address, CartLine, CoordinateCache, CoordinateStore, DistanceRanker, GeocodeProvider,
    Location, Order, OrderId, OrderStatus, RankedCandidate, Ranking, RankingStatus,
    RestaurantCatalog, RestaurantId,
};

/// Ranked candidates for one order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolutionResult {
    /// Fulfilling restaurants in ascending distance order.
    pub candidates: Vec<RankedCandidate>,
    /// Whether the delivery address was resolved to a coordinate.
    pub location_resolved: bool,
}

impl ResolutionResult {
    /// Result for an order whose address could not be resolved.
    #[must_use]
    pub const fn unresolved() -> Self {
        Self {
            candidates: Vec::new(),
            location_resolved: false,
        }
    }
}

impl From<Ranking> for ResolutionResult {
    fn from(ranking: Ranking) -> Self {
        Self {
            location_resolved: ranking.status == RankingStatus::Ranked,
            candidates: ranking.candidates,
        }
    }
}

/// One row of a dispatcher listing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderResolution {
    /// Order the row describes.
    pub order_id: OrderId,
    /// Delivery address as entered.
    pub address: String,
    /// Order status at resolution time.
    pub status: OrderStatus,
    /// Restaurant the order was pinned to, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub restaurant_id: Option<RestaurantId>,
    /// Candidates and location status.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub result: ResolutionResult,
}

/// Entry point combining the coordinate cache, availability and ranking.
///
/// # Examples
///
/// ```
/// use dispatch_core::{
///     CartLine, Coordinate, CoordinateCache, MenuAvailability, OrderResolver, Restaurant,
///     RestaurantCatalog,
/// };
/// use dispatch_core::test_support::{MemoryCoordinateStore, StubGeocoder};
///
/// let catalog = RestaurantCatalog::new(
///     [Restaurant::new(1, "Kitchen", Some(Coordinate::new(55.76, 37.64).expect("coordinate")))],
///     [MenuAvailability { restaurant_id: 1, product_id: 5, available: true }],
/// );
/// let resolver = OrderResolver::new(CoordinateCache::new(
///     MemoryCoordinateStore::default(),
///     StubGeocoder::with_coordinate(Coordinate::new(55.75, 37.62).expect("coordinate")),
/// ));
///
/// let result = resolver.resolve("12 Main St", &[CartLine { product_id: 5, quantity: 1 }], &catalog);
/// assert!(result.location_resolved);
/// assert_eq!(result.candidates[0].restaurant_id, 1);
/// ```
#[derive(Debug)]
pub struct OrderResolver<S, G> {
    cache: CoordinateCache<S, G>,
    ranker: DistanceRanker,
}

impl<S, G> OrderResolver<S, G>
where
    S: CoordinateStore,
    G: GeocodeProvider,
{
    /// Build a resolver around `cache`.
    pub const fn new(cache: CoordinateCache<S, G>) -> Self {
        Self {
            cache,
            ranker: DistanceRanker,
        }
    }

    /// The coordinate cache used for address resolution.
    pub const fn cache(&self) -> &CoordinateCache<S, G> {
        &self.cache
    }

    /// Resolve an address and cart against `catalog`.
    pub fn resolve(
        &self,
        order_address: &str,
        cart: &[CartLine],
        catalog: &RestaurantCatalog,
    ) -> ResolutionResult {
        let location = self.cache.resolve(order_address);
        self.rank_cart(location, cart, catalog)
    }

    /// Resolve an order, honouring a pinned restaurant.
    pub fn resolve_order(&self, order: &Order, catalog: &RestaurantCatalog) -> ResolutionResult {
        let location = self.cache.resolve(&order.address);
        self.rank_order(location, order, catalog)
    }

    /// Resolve every open order, newest first.
    ///
    /// Closed orders are skipped. All delivery addresses are loaded from the
    /// store in one batch before any ranking happens, and each distinct
    /// uncached address is geocoded once.
    pub fn resolve_batch(&self, orders: &[Order], catalog: &RestaurantCatalog) -> Vec<OrderResolution> {
        let mut open: Vec<&Order> = orders.iter().filter(|order| order.is_open()).collect();
        open.sort_by(|a, b| b.id.cmp(&a.id));

        let addresses: Vec<Address> = open
            .iter()
            .filter_map(|order| Address::parse(&order.address).ok())
            .collect();
        let locations = self.cache.prefetch(&addresses);
        log::debug!(
            "resolving {} open orders ({} skipped as closed)",
            open.len(),
            orders.len() - open.len()
        );

        open.into_iter()
            .map(|order| {
                let location = Address::parse(&order.address)
                    .ok()
                    .and_then(|address| locations.get(&address).copied())
                    .unwrap_or(Location::Unresolvable);
                OrderResolution {
                    order_id: order.id,
                    address: order.address.clone(),
                    status: order.status,
                    restaurant_id: order.restaurant_id,
                    result: self.rank_order(location, order, catalog),
                }
            })
            .collect()
    }

    fn rank_order(
        &self,
        location: Location,
        order: &Order,
        catalog: &RestaurantCatalog,
    ) -> ResolutionResult {
        let Some(pinned) = order.restaurant_id else {
            return self.rank_cart(location, &order.items, catalog);
        };
        if !location.is_known() {
            return ResolutionResult::unresolved();
        }
        let ranking = match catalog.restaurant(pinned) {
            Some(restaurant) => self.ranker.rank(location, [restaurant]),
            None => {
                log::warn!(
                    "order {} is pinned to unknown restaurant {pinned}",
                    order.id
                );
                self.ranker.rank(location, std::iter::empty())
            }
        };
        ranking.into()
    }

    fn rank_cart(
        &self,
        location: Location,
        cart: &[CartLine],
        catalog: &RestaurantCatalog,
    ) -> ResolutionResult {
        if !location.is_known() {
            return ResolutionResult::unresolved();
        }
        let candidates = catalog.fulfilling_restaurants(cart);
        self.ranker.rank(location, candidates).into()
    }
}
