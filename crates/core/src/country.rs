//! Country resolution for fetched groups.
//!
//! The resolver runs an ordered list of strategies and takes the first one that
//! resolves. The default chain tries the explicit country code first and only then
//! reverse-geocodes the group's coordinates.

use crate::country_codes::COUNTRY_CODES;
use crate::domain::{Coordinates, CountryResult, RawGroupRecord};
use crate::errors::ResolutionError;
use crate::ports::Geocoder;
use tracing::{debug, warn};

const GEOCODE_STATUS_OK: &str = "OK";
const COUNTRY_COMPONENT_TYPE: &str = "country";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    Resolved(String),
    NotApplicable,
}

/// One step of the country precedence chain
pub trait CountryStrategy {
    fn name(&self) -> &'static str;
    fn resolve(&self, record: &RawGroupRecord) -> StrategyOutcome;
}

/// Looks up the common English name for an ISO 3166-1 alpha-2 code, case-insensitively
pub fn lookup_country_by_code(code: &str) -> Option<&'static str> {
    let code = code.trim().to_ascii_uppercase();
    COUNTRY_CODES
        .binary_search_by(|(candidate, _)| (*candidate).cmp(code.as_str()))
        .ok()
        .map(|index| COUNTRY_CODES[index].1)
}

/// Resolves the country from the record's explicit country code
pub struct CountryCodeStrategy;

impl CountryStrategy for CountryCodeStrategy {
    fn name(&self) -> &'static str {
        "country-code"
    }

    fn resolve(&self, record: &RawGroupRecord) -> StrategyOutcome {
        let Some(code) = record
            .country_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
        else {
            return StrategyOutcome::NotApplicable;
        };

        match lookup_country_by_code(code) {
            Some(name) => StrategyOutcome::Resolved(name.to_string()),
            None => {
                let err = ResolutionError::UnrecognizedCountryCode(code.to_string());
                warn!(group = %record.id, "{err}, trying next strategy");
                StrategyOutcome::NotApplicable
            }
        }
    }
}

/// Resolves the country by reverse geocoding the record's coordinates
pub struct GeocodeStrategy<'a> {
    geocoder: &'a dyn Geocoder,
}

impl<'a> GeocodeStrategy<'a> {
    pub fn new(geocoder: &'a dyn Geocoder) -> Self {
        Self { geocoder }
    }

    fn country_for(&self, coordinates: Coordinates) -> Result<Option<String>, ResolutionError> {
        let result = self.geocoder.fetch_geocode(coordinates)?;
        if result.status != GEOCODE_STATUS_OK {
            return Err(ResolutionError::GeocodeStatus(result.status));
        }

        Ok(result
            .address_components
            .into_iter()
            .find(|component| component.types.iter().any(|t| t == COUNTRY_COMPONENT_TYPE))
            .map(|component| component.long_name))
    }
}

impl CountryStrategy for GeocodeStrategy<'_> {
    fn name(&self) -> &'static str {
        "geocode"
    }

    fn resolve(&self, record: &RawGroupRecord) -> StrategyOutcome {
        let Some(coordinates) = record.coordinates else {
            return StrategyOutcome::NotApplicable;
        };

        match self.country_for(coordinates) {
            Ok(Some(name)) => StrategyOutcome::Resolved(name),
            Ok(None) => {
                debug!(group = %record.id, "geocoding result has no country component");
                StrategyOutcome::NotApplicable
            }
            Err(err) => {
                warn!(
                    group = %record.id,
                    lat = coordinates.latitude,
                    lon = coordinates.longitude,
                    "geocoding failed: {err}"
                );
                StrategyOutcome::NotApplicable
            }
        }
    }
}

/// Ordered, short-circuiting chain of country strategies
pub struct CountryResolver<'a> {
    strategies: Vec<Box<dyn CountryStrategy + 'a>>,
}

impl<'a> CountryResolver<'a> {
    /// Creates the default chain: explicit country code, then geocoding
    pub fn new(geocoder: &'a dyn Geocoder) -> Self {
        Self::with_strategies(vec![
            Box::new(CountryCodeStrategy) as Box<dyn CountryStrategy + 'a>,
            Box::new(GeocodeStrategy::new(geocoder)),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn CountryStrategy + 'a>>) -> Self {
        Self { strategies }
    }

    pub fn resolve(&self, record: &RawGroupRecord) -> CountryResult {
        for strategy in &self.strategies {
            if let StrategyOutcome::Resolved(name) = strategy.resolve(record) {
                debug!(group = %record.id, strategy = strategy.name(), country = %name, "country resolved");
                return CountryResult::Resolved(name);
            }
        }
        CountryResult::Unknown
    }
}
