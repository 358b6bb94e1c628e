//! Response types for the Yandex geocoder HTTP API.
//!
//! Only the path to the best match's position is modelled:
//! `response.GeoObjectCollection.featureMember[0].GeoObject.Point.pos`, a
//! space-separated `"longitude latitude"` pair.
//!
//! See: <https://yandex.com/dev/geocode/doc/en/response>

use dispatch_core::{Coordinate, GeocodeError};
use serde::Deserialize;

/// Top-level geocoder response.
#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    response: ResponseBody,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(rename = "GeoObjectCollection")]
    collection: GeoObjectCollection,
}

#[derive(Debug, Deserialize)]
struct GeoObjectCollection {
    #[serde(rename = "featureMember", default)]
    members: Vec<FeatureMember>,
}

#[derive(Debug, Deserialize)]
struct FeatureMember {
    #[serde(rename = "GeoObject")]
    geo_object: GeoObject,
}

#[derive(Debug, Deserialize)]
struct GeoObject {
    #[serde(rename = "Point")]
    point: GeoPoint,
}

#[derive(Debug, Deserialize)]
struct GeoPoint {
    pos: String,
}

impl GeocodeResponse {
    /// Position string of the most relevant match, if any.
    pub fn best_position(&self) -> Option<&str> {
        self.response
            .collection
            .members
            .first()
            .map(|member| member.geo_object.point.pos.as_str())
    }

    /// Coordinate of the most relevant match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::NotFound`] when the collection is empty and
    /// [`GeocodeError::InvalidResponse`] when the position cannot be parsed.
    pub fn into_coordinate(self, address: &str) -> Result<Coordinate, GeocodeError> {
        let pos = self.best_position().ok_or_else(|| GeocodeError::NotFound {
            address: address.to_owned(),
        })?;
        parse_position(pos)
    }
}

/// Parse a `"longitude latitude"` pair.
pub fn parse_position(pos: &str) -> Result<Coordinate, GeocodeError> {
    let invalid = |message: String| GeocodeError::InvalidResponse { message };
    let mut parts = pos.split_whitespace();
    let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid(format!("expected \"lon lat\", got {pos:?}")));
    };
    let lon: f64 = lon
        .parse()
        .map_err(|err| invalid(format!("invalid longitude {lon:?}: {err}")))?;
    let lat: f64 = lat
        .parse()
        .map_err(|err| invalid(format!("invalid latitude {lat:?}: {err}")))?;
    Coordinate::new(lat, lon).map_err(|err| invalid(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn deserialises_best_match() {
        let json = r#"{
            "response": {
                "GeoObjectCollection": {
                    "metaDataProperty": {"GeocoderResponseMetaData": {"found": "2"}},
                    "featureMember": [
                        {"GeoObject": {"name": "Red Square", "Point": {"pos": "37.620393 55.75396"}}},
                        {"GeoObject": {"name": "Elsewhere", "Point": {"pos": "30.0 59.0"}}}
                    ]
                }
            }
        }"#;

        let response: GeocodeResponse = serde_json::from_str(json).expect("should deserialise");
        let coordinate = response.into_coordinate("Red Square").expect("coordinate");

        assert_eq!(coordinate.latitude(), 55.75396);
        assert_eq!(coordinate.longitude(), 37.620393);
    }

    #[rstest]
    fn empty_collection_is_not_found() {
        let json = r#"{"response": {"GeoObjectCollection": {"featureMember": []}}}"#;
        let response: GeocodeResponse = serde_json::from_str(json).expect("should deserialise");

        let err = response.into_coordinate("Atlantis").expect_err("should fail");
        assert_eq!(
            err,
            GeocodeError::NotFound {
                address: "Atlantis".into()
            }
        );
    }

    #[rstest]
    #[case("")]
    #[case("37.62")]
    #[case("37.62 55.75 0")]
    #[case("east north")]
    #[case("37.62 95.0")]
    fn rejects_malformed_positions(#[case] pos: &str) {
        assert!(matches!(
            parse_position(pos),
            Err(GeocodeError::InvalidResponse { .. })
        ));
    }
}
