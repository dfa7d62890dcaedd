use crate::config::HttpConfig;
use serde_json::Value;
use ureq::Agent;

/// Thin blocking JSON GET client shared by the adapters
pub(crate) struct JsonClient {
    agent: Agent,
    user_agent: String,
}

impl JsonClient {
    pub(crate) fn new(config: &HttpConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build()
            .into();
        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }

    /// Performs a GET and returns the response body; non-2xx statuses are errors
    pub(crate) fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, ureq::Error> {
        let mut request = self
            .agent
            .get(url)
            .header("Accept", "application/json")
            .header("User-Agent", self.user_agent.as_str());
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        request.call()?.into_body().read_to_string()
    }
}

pub(crate) fn is_not_found(err: &ureq::Error) -> bool {
    matches!(err, ureq::Error::StatusCode(404 | 410))
}

/// Reads a number that the APIs send either as a JSON number or as a numeric string
pub(crate) fn number_field(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a non-blank string, trimmed
pub(crate) fn text_field(value: Option<&Value>) -> Option<String> {
    value?
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
