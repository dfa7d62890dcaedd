//! Group resolution core: turns group URLs and directory listing entries into
//! normalized group records with a best-effort country, skipping groups that are
//! already imported.

pub mod application;
pub mod country;
mod country_codes;
pub mod dedup;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod utils;
