use thiserror::Error;

/// Failure of the hosting platform group fetch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("group not found: {0}")]
    NotFound(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("not a group url: {0}")]
    InvalidUrl(String),
}

/// Failure of the reverse geocoding call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    #[error("geocoding network error: {0}")]
    Network(String),
    #[error("malformed geocoding response: {0}")]
    MalformedResponse(String),
}

/// Failure of the persistent record store; fatal for a run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record store is unavailable: {0}")]
    Unavailable(String),
}

/// Non-fatal country resolution problems, reported through logging only
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("unrecognized country code '{0}'")]
    UnrecognizedCountryCode(String),
    #[error("geocoding returned status '{0}'")]
    GeocodeStatus(String),
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
}
