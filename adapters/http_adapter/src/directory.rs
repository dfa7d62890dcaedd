use crate::client::{number_field, text_field, JsonClient};
use crate::config::HttpConfig;
use group_core::domain::{Coordinates, ListingEntry};
use group_core::errors::FetchError;
use group_core::ports::DirectoryListing;
use serde_json::Value;
use tracing::{debug, info};

/// php.ug implementation of the DirectoryListing trait
pub struct PhpUgDirectory {
    client: JsonClient,
    url: String,
}

impl PhpUgDirectory {
    pub fn new(config: &HttpConfig) -> Self {
        Self {
            client: JsonClient::new(config),
            url: config.directory_url.clone(),
        }
    }
}

impl DirectoryListing for PhpUgDirectory {
    fn fetch_listing(&self) -> Result<Vec<ListingEntry>, FetchError> {
        info!(url = %self.url, "reading user group directory");
        let body = self
            .client
            .get(&self.url, &[])
            .map_err(|err| FetchError::Network(format!("{}: {err}", self.url)))?;

        parse_listing_response(&body)
    }
}

fn parse_listing_response(body: &str) -> Result<Vec<ListingEntry>, FetchError> {
    let json: Value =
        serde_json::from_str(body).map_err(|err| FetchError::MalformedResponse(format!("directory listing: {err}")))?;

    let groups = json
        .get("groups")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::MalformedResponse("directory listing has no groups array".to_string()))?;

    let entries: Vec<ListingEntry> = groups.iter().filter_map(listing_entry).collect();
    debug!(listed = groups.len(), usable = entries.len(), "parsed directory listing");
    Ok(entries)
}

/// Entries without a URL cannot be resolved and are dropped
fn listing_entry(group: &Value) -> Option<ListingEntry> {
    let url = text_field(group.get("url"))?;
    let coordinates = match (number_field(group.get("latitude")), number_field(group.get("longitude"))) {
        (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
        _ => None,
    };

    Some(ListingEntry {
        url,
        country_code: text_field(group.get("country")),
        coordinates,
    })
}
