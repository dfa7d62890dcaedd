//! Blocking HTTP adapters for the external APIs: the meetup.com group API, the
//! Google reverse geocoding API and the php.ug user group directory.

mod client;
mod config;
mod directory;
mod geocode;
mod meetup;

pub use config::HttpConfig;
pub use directory::PhpUgDirectory;
pub use geocode::GoogleGeocoder;
pub use meetup::MeetupComApi;
