use crate::client::JsonClient;
use crate::config::HttpConfig;
use group_core::domain::{AddressComponent, Coordinates, GeocodeResult};
use group_core::errors::GeocodeError;
use group_core::ports::Geocoder;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeEntry>,
}

#[derive(Debug, Deserialize)]
struct GeocodeEntry {
    #[serde(default)]
    address_components: Vec<RawAddressComponent>,
}

#[derive(Debug, Deserialize)]
struct RawAddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

/// Google Maps reverse geocoding implementation of the Geocoder trait
pub struct GoogleGeocoder {
    client: JsonClient,
    endpoint: String,
    api_key: Option<String>,
}

impl GoogleGeocoder {
    pub fn new(config: &HttpConfig) -> Self {
        Self {
            client: JsonClient::new(config),
            endpoint: config.geocode_endpoint.clone(),
            api_key: config.geocode_api_key.clone(),
        }
    }
}

impl Geocoder for GoogleGeocoder {
    fn fetch_geocode(&self, coordinates: Coordinates) -> Result<GeocodeResult, GeocodeError> {
        let latlng = format!("{},{}", coordinates.latitude, coordinates.longitude);
        let mut query = vec![("latlng", latlng.as_str()), ("sensor", "false")];
        if let Some(key) = &self.api_key {
            query.push(("key", key.as_str()));
        }
        debug!(%latlng, "reverse geocoding");

        let body = self
            .client
            .get(&self.endpoint, &query)
            .map_err(|err| GeocodeError::Network(err.to_string()))?;

        parse_geocode_response(&body)
    }
}

/// Keeps the status and the address components of the first result only
fn parse_geocode_response(body: &str) -> Result<GeocodeResult, GeocodeError> {
    let response: GeocodeResponse =
        serde_json::from_str(body).map_err(|err| GeocodeError::MalformedResponse(err.to_string()))?;

    let address_components = response
        .results
        .into_iter()
        .next()
        .map(|entry| {
            entry
                .address_components
                .into_iter()
                .map(|component| AddressComponent {
                    types: component.types,
                    long_name: component.long_name,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(GeocodeResult {
        status: response.status,
        address_components,
    })
}
