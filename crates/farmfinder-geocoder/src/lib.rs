//! Postal-code geocoding against a Nominatim-compatible service.

pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod throttle;
pub mod types;

pub use client::{GeocoderClient, GeocoderSettings};
pub use error::GeocodeError;
pub use throttle::Throttle;
