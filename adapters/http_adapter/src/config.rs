use std::time::Duration;

/// Endpoints and transport settings shared by the HTTP adapters
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL of the meetup.com API; the group url name is appended as a path segment
    pub meetup_api_base: String,
    /// Reverse geocoding endpoint
    pub geocode_endpoint: String,
    /// Optional key sent with geocoding requests
    pub geocode_api_key: Option<String>,
    /// Directory listing endpoint
    pub directory_url: String,
    /// Timeout for a whole request, connect through body
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            meetup_api_base: "https://api.meetup.com".to_string(),
            geocode_endpoint: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
            geocode_api_key: None,
            directory_url: "https://php.ug/api/rest/listtype/1".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("group-importer/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
