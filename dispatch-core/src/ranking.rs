//! Geodesic distance ranking of candidate restaurants.

use std::cmp::Ordering;

use geo::{Distance, Geodesic};

use crate::{Coordinate, Location, Restaurant, RestaurantId};

const METRES_PER_KILOMETRE: f64 = 1_000.0;

/// A restaurant annotated with its distance from a delivery location.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedCandidate {
    /// Restaurant identifier.
    pub restaurant_id: RestaurantId,
    /// Restaurant display name.
    pub restaurant_name: String,
    /// Geodesic distance in kilometres rounded to two decimal places, or
    /// `None` when the restaurant has no registered coordinate.
    pub distance_km: Option<f64>,
}

/// Whether a ranking could be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RankingStatus {
    /// Candidates were ranked by distance from a known origin.
    Ranked,
    /// The origin was unresolvable, so no distances exist.
    LocationUnresolved,
}

/// Ordered candidates plus the status explaining an empty result.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// Outcome of the ranking step.
    pub status: RankingStatus,
    /// Candidates in ascending distance order.
    pub candidates: Vec<RankedCandidate>,
}

/// Orders restaurants by geodesic distance from an origin.
///
/// Restaurants with a known distance come first in ascending order; those
/// without a coordinate follow. Ties are broken by ascending restaurant id.
///
/// # Examples
///
/// ```
/// use dispatch_core::{Coordinate, DistanceRanker, Location, RankingStatus, Restaurant};
///
/// let origin = Location::Known(Coordinate::new(55.75, 37.62).expect("origin"));
/// let near = Restaurant::new(1, "Near", Some(Coordinate::new(55.76, 37.64).expect("near")));
/// let far = Restaurant::new(2, "Far", Some(Coordinate::new(55.70, 37.60).expect("far")));
///
/// let ranking = DistanceRanker.rank(origin, [&far, &near]);
/// assert_eq!(ranking.status, RankingStatus::Ranked);
/// assert_eq!(ranking.candidates[0].restaurant_id, 1);
/// assert_eq!(ranking.candidates[1].restaurant_id, 2);
///
/// let unresolved = DistanceRanker.rank(Location::Unresolvable, [&near]);
/// assert_eq!(unresolved.status, RankingStatus::LocationUnresolved);
/// assert!(unresolved.candidates.is_empty());
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct DistanceRanker;

impl DistanceRanker {
    /// Rank `candidates` by distance from `origin`.
    pub fn rank<'a, I>(&self, origin: Location, candidates: I) -> Ranking
    where
        I: IntoIterator<Item = &'a Restaurant>,
    {
        let Location::Known(origin) = origin else {
            return Ranking {
                status: RankingStatus::LocationUnresolved,
                candidates: Vec::new(),
            };
        };

        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .map(|restaurant| RankedCandidate {
                restaurant_id: restaurant.id,
                restaurant_name: restaurant.name.clone(),
                distance_km: restaurant
                    .coordinate
                    .map(|coordinate| geodesic_km(origin, coordinate)),
            })
            .collect();
        ranked.sort_by(compare_candidates);
        ranked.dedup_by_key(|candidate| candidate.restaurant_id);

        Ranking {
            status: RankingStatus::Ranked,
            candidates: ranked,
        }
    }
}

fn compare_candidates(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    let by_distance = match (a.distance_km, b.distance_km) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_distance.then_with(|| a.restaurant_id.cmp(&b.restaurant_id))
}

/// Geodesic distance between two coordinates in kilometres, rounded to two
/// decimal places.
#[must_use]
pub fn geodesic_km(from: Coordinate, to: Coordinate) -> f64 {
    let metres = Geodesic.distance(from.to_point(), to.to_point());
    (metres / METRES_PER_KILOMETRE * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn at(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("coordinate")
    }

    fn restaurant(id: RestaurantId, coordinate: Option<Coordinate>) -> Restaurant {
        Restaurant::new(id, format!("R{id}"), coordinate)
    }

    #[fixture]
    fn origin() -> Location {
        Location::Known(at(55.75, 37.62))
    }

    fn ids(ranking: &Ranking) -> Vec<RestaurantId> {
        ranking
            .candidates
            .iter()
            .map(|candidate| candidate.restaurant_id)
            .collect()
    }

    #[rstest]
    fn orders_by_ascending_distance(origin: Location) {
        let r1 = restaurant(1, Some(at(55.76, 37.64)));
        let r2 = restaurant(2, Some(at(55.70, 37.60)));

        let ranking = DistanceRanker.rank(origin, [&r2, &r1]);

        assert_eq!(ids(&ranking), vec![1, 2]);
        let near = ranking.candidates[0].distance_km.expect("distance");
        let far = ranking.candidates[1].distance_km.expect("distance");
        assert!((1.6..1.8).contains(&near), "unexpected distance {near}");
        assert!((5.6..5.8).contains(&far), "unexpected distance {far}");
    }

    #[rstest]
    fn distances_are_rounded_to_two_places(origin: Location) {
        let r = restaurant(1, Some(at(55.761_234, 37.641_987)));
        let ranking = DistanceRanker.rank(origin, [&r]);
        let distance = ranking.candidates[0].distance_km.expect("distance");
        assert!(((distance * 100.0).round() / 100.0 - distance).abs() < f64::EPSILON);
    }

    #[rstest]
    fn equal_distances_fall_back_to_id(origin: Location) {
        let shared = Some(at(55.76, 37.64));
        let r9 = restaurant(9, shared);
        let r3 = restaurant(3, shared);
        let r5 = restaurant(5, shared);

        let ranking = DistanceRanker.rank(origin, [&r9, &r3, &r5]);
        assert_eq!(ids(&ranking), vec![3, 5, 9]);
    }

    #[rstest]
    fn restaurants_without_coordinates_rank_last(origin: Location) {
        let unknown_low = restaurant(1, None);
        let unknown_high = restaurant(4, None);
        let known = restaurant(7, Some(at(56.0, 38.0)));

        let ranking = DistanceRanker.rank(origin, [&unknown_high, &known, &unknown_low]);

        assert_eq!(ids(&ranking), vec![7, 1, 4]);
        assert!(ranking.candidates[1].distance_km.is_none());
    }

    #[rstest]
    fn unresolved_origin_yields_no_candidates() {
        let r = restaurant(1, Some(at(55.76, 37.64)));
        let ranking = DistanceRanker.rank(Location::Unresolvable, [&r]);
        assert_eq!(ranking.status, RankingStatus::LocationUnresolved);
        assert!(ranking.candidates.is_empty());
    }

    #[rstest]
    fn empty_candidate_set_is_still_ranked(origin: Location) {
        let ranking = DistanceRanker.rank(origin, std::iter::empty());
        assert_eq!(ranking.status, RankingStatus::Ranked);
        assert!(ranking.candidates.is_empty());
    }

    #[rstest]
    fn distance_to_self_is_zero() {
        let point = at(55.75, 37.62);
        assert!(geodesic_km(point, point).abs() < f64::EPSILON);
    }
}
