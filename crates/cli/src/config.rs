use clap::Args;
use http_adapter::HttpConfig;
use std::time::Duration;

/// Options shared by every subcommand, each with an environment variable fallback
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Path to the SQLite store of already imported groups
    #[arg(long = "db", env = "GROUP_IMPORTER_DB", default_value = "data/groups.sqlite", global = true)]
    pub db: String,

    /// File to write the YAML records to (stdout when omitted)
    #[arg(short = 'o', long = "output", env = "GROUP_IMPORTER_OUTPUT", global = true)]
    pub output: Option<String>,

    /// Append the emitted records to the store after the run
    #[arg(long, global = true)]
    pub persist: bool,

    /// Base URL of the meetup.com API
    #[arg(long, env = "MEETUP_API_BASE", global = true)]
    pub meetup_api_base: Option<String>,

    /// Reverse geocoding endpoint
    #[arg(long, env = "GEOCODE_ENDPOINT", global = true)]
    pub geocode_endpoint: Option<String>,

    /// API key sent with geocoding requests
    #[arg(long, env = "GEOCODE_API_KEY", hide_env_values = true, global = true)]
    pub geocode_api_key: Option<String>,

    /// User group directory listing URL
    #[arg(long, env = "DIRECTORY_URL", global = true)]
    pub directory_url: Option<String>,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,

    #[arg(long, env = "HTTP_USER_AGENT", global = true)]
    pub user_agent: Option<String>,
}

impl Settings {
    /// Overlays the configured values on the adapter defaults
    pub fn http_config(&self) -> HttpConfig {
        let defaults = HttpConfig::default();
        HttpConfig {
            meetup_api_base: self.meetup_api_base.clone().unwrap_or(defaults.meetup_api_base),
            geocode_endpoint: self.geocode_endpoint.clone().unwrap_or(defaults.geocode_endpoint),
            geocode_api_key: self.geocode_api_key.clone().or(defaults.geocode_api_key),
            directory_url: self.directory_url.clone().unwrap_or(defaults.directory_url),
            timeout: self.timeout_secs.map(Duration::from_secs).unwrap_or(defaults.timeout),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}
