use crate::client::{is_not_found, number_field, text_field, JsonClient};
use crate::config::HttpConfig;
use group_core::domain::{Coordinates, GroupId, RawGroupRecord};
use group_core::errors::FetchError;
use group_core::ports::GroupFetcher;
use group_core::utils::group_urlname;
use serde_json::Value;
use tracing::debug;

/// meetup.com implementation of the GroupFetcher trait
pub struct MeetupComApi {
    client: JsonClient,
    api_base: String,
}

impl MeetupComApi {
    pub fn new(config: &HttpConfig) -> Self {
        Self {
            client: JsonClient::new(config),
            api_base: config.meetup_api_base.trim_end_matches('/').to_string(),
        }
    }
}

impl GroupFetcher for MeetupComApi {
    fn fetch_group_by_url(&self, url: &str) -> Result<RawGroupRecord, FetchError> {
        let urlname = group_urlname(url).ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?;
        let endpoint = format!("{}/{}", self.api_base, urlname);
        debug!(%endpoint, "fetching group");

        let body = self.client.get(&endpoint, &[]).map_err(|err| {
            if is_not_found(&err) {
                FetchError::NotFound(url.to_string())
            } else {
                FetchError::Network(format!("{endpoint}: {err}"))
            }
        })?;

        parse_group_response(url, &body)
    }
}

/// Maps a meetup.com group document onto a RawGroupRecord
fn parse_group_response(requested_url: &str, body: &str) -> Result<RawGroupRecord, FetchError> {
    let json: Value = serde_json::from_str(body)
        .map_err(|err| FetchError::MalformedResponse(format!("{requested_url}: {err}")))?;

    let id = match json.get("id") {
        Some(Value::Number(number)) => number.as_u64().map(GroupId::from),
        Some(Value::String(text)) if !text.trim().is_empty() => Some(GroupId::new(text.trim())),
        _ => None,
    }
    .ok_or_else(|| FetchError::MalformedResponse(format!("{requested_url}: missing group id")))?;

    let name = json
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| FetchError::MalformedResponse(format!("{requested_url}: missing group name")))?
        .to_string();

    let url = text_field(json.get("link")).unwrap_or_else(|| requested_url.to_string());

    let coordinates = match (number_field(json.get("lat")), number_field(json.get("lon"))) {
        (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
        _ => None,
    };

    Ok(RawGroupRecord {
        id,
        name,
        url,
        country_code: text_field(json.get("country")),
        coordinates,
    })
}
