pub mod app_config;
pub mod compose;
pub mod config;
pub mod geo;
pub mod locations;
pub mod query;
pub mod search;

pub use app_config::{AppConfig, Environment};
pub use compose::{compose, GroupedMatches, SearchResult, SearchResults};
pub use config::{load_app_config, load_app_config_from_env};
pub use crate::geo::{haversine_miles, DisplayPoint, StorePoint};
pub use locations::{
    load_locations, Address, BusinessType, Contact, Fulfillment, LocationConfig, LocationRecord,
    LocationsFile, OperatingHours, Practice, ProductGroup, ProductItem,
};
pub use query::{FulfillmentMode, Predicate, ProximityQuery, ProximityQueryBuilder};
pub use search::{normalize_limit, validate_postal_code, SearchOrigin, SearchRequest};

use thiserror::Error;

/// Errors raised while validating domain input. Every variant is the caller's fault.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid coordinate: latitude {lat}, longitude {lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("search radius must be a positive number of miles, got {0}")]
    InvalidRadius(f64),

    #[error("invalid postal code: '{0}'")]
    InvalidPostalCode(String),

    #[error("unknown business type: '{0}'")]
    UnknownBusinessType(String),

    #[error("unknown practice: '{0}'")]
    UnknownPractice(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read locations file {path}: {source}")]
    LocationsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse locations file: {0}")]
    LocationsFileParse(#[source] serde_yaml::Error),

    #[error("locations file validation failed: {0}")]
    Validation(String),
}
