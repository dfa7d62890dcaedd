use crate::country::lookup_country_by_code;
use std::fmt;

/// Country value used when no strategy could resolve one
pub const UNKNOWN_COUNTRY: &str = "unknown";

/// Platform-issued stable key of a group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for GroupId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for GroupId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A group as listed by the directory API
#[derive(Debug, Clone, PartialEq)]
pub struct ListingEntry {
    pub url: String,
    pub country_code: Option<String>,
    pub coordinates: Option<Coordinates>,
}

/// Raw pipeline input: a direct group URL or a directory listing entry
#[derive(Debug, Clone, PartialEq)]
pub enum GroupReference {
    Url(String),
    Listing(ListingEntry),
}

impl GroupReference {
    pub fn url(&self) -> &str {
        match self {
            GroupReference::Url(url) => url,
            GroupReference::Listing(entry) => &entry.url,
        }
    }
}

impl fmt::Display for GroupReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url())
    }
}

/// Group as returned by the hosting platform
#[derive(Debug, Clone, PartialEq)]
pub struct RawGroupRecord {
    pub id: GroupId,
    pub name: String,
    pub url: String,
    pub country_code: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl RawGroupRecord {
    /// Fills location fields from the directory listing where the platform left them
    /// empty; a platform country code the code table does not know is replaced too
    pub fn merge_listing(mut self, entry: &ListingEntry) -> Self {
        let usable_code = self
            .country_code
            .as_deref()
            .is_some_and(|code| lookup_country_by_code(code).is_some());
        if !usable_code && entry.country_code.is_some() {
            self.country_code = entry.country_code.clone();
        }
        if self.coordinates.is_none() {
            self.coordinates = entry.coordinates;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryResult {
    Resolved(String),
    Unknown,
}

impl CountryResult {
    pub fn display_name(&self) -> &str {
        match self {
            CountryResult::Resolved(name) => name,
            CountryResult::Unknown => UNKNOWN_COUNTRY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedGroupRecord {
    pub name: String,
    pub meetup_id: GroupId,
    pub meetup_url: String,
    pub country: String, // resolved name or UNKNOWN_COUNTRY
}

/// One address component of a reverse geocoding result
#[derive(Debug, Clone, PartialEq)]
pub struct AddressComponent {
    pub types: Vec<String>,
    pub long_name: String,
}

/// Status plus the address components of the first result
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub status: String,
    pub address_components: Vec<AddressComponent>,
}
