//! Shared harness running a mock geocoder on its own runtime so the
//! synchronous client can be driven from plain test threads.

use std::time::Duration;

use dispatch_data::{HttpGeocoder, HttpGeocoderConfig};
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-key";

pub struct MockGeocoder {
    // Declared before the runtime so the server shuts down first.
    pub server: MockServer,
    runtime: Runtime,
}

impl MockGeocoder {
    pub fn start() -> Self {
        let runtime = Runtime::new().expect("build mock server runtime");
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub fn respond(&self, address: &str, template: ResponseTemplate) {
        let mock = Mock::given(method("GET"))
            .and(path("/1.x/"))
            .and(query_param("apikey", API_KEY))
            .and(query_param("geocode", address))
            .and(query_param("format", "json"))
            .respond_with(template);
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn respond_with_position(&self, address: &str, pos: &str) {
        self.respond(
            address,
            ResponseTemplate::new(200).set_body_json(position_body(&[pos])),
        );
    }

    pub fn request_count(&self) -> usize {
        self.runtime
            .block_on(self.server.received_requests())
            .map_or(0, |requests| requests.len())
    }

    pub fn geocoder(&self, timeout: Duration) -> HttpGeocoder {
        HttpGeocoder::with_config(
            HttpGeocoderConfig::new(API_KEY)
                .with_base_url(self.server.uri())
                .with_timeout(timeout),
        )
        .expect("geocoder should build")
    }
}

pub fn position_body(positions: &[&str]) -> serde_json::Value {
    let members: Vec<_> = positions
        .iter()
        .map(|pos| serde_json::json!({"GeoObject": {"Point": {"pos": pos}}}))
        .collect();
    serde_json::json!({
        "response": {"GeoObjectCollection": {"featureMember": members}}
    })
}
