use crate::domain::{Coordinates, GeocodeResult, GroupId, ListingEntry, NormalizedGroupRecord, RawGroupRecord};
use crate::errors::{FetchError, GeocodeError, StoreError};
use std::collections::HashSet;
use std::error::Error;

pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Hosting platform API: authoritative group detail for a group URL
pub trait GroupFetcher {
    fn fetch_group_by_url(&self, url: &str) -> std::result::Result<RawGroupRecord, FetchError>;
}

/// Reverse geocoding from coordinates
pub trait Geocoder {
    fn fetch_geocode(&self, coordinates: Coordinates) -> std::result::Result<GeocodeResult, GeocodeError>;
}

/// Directory API: single-page listing of groups
pub trait DirectoryListing {
    fn fetch_listing(&self) -> std::result::Result<Vec<ListingEntry>, FetchError>;
}

/// Persistent store of already imported groups
pub trait RecordStore {
    fn list_known_identifiers(&self) -> std::result::Result<HashSet<GroupId>, StoreError>;

    fn append_records(&self, records: &[NormalizedGroupRecord]) -> std::result::Result<(), StoreError>;
}

/// Trait for emitting resolved records
/// This is a port (interface) that defines how the core communicates with output adapters
pub trait RecordWriter {
    fn write(&self, records: &[NormalizedGroupRecord]) -> Result<()>;
}
