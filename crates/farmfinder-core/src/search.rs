use std::sync::LazyLock;

use regex::Regex;

use crate::geo::{DisplayPoint, StorePoint};
use crate::locations::{BusinessType, Practice};
use crate::query::ProximityQuery;
use crate::CoreError;

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 200;

/// US ZIP or ZIP+4.
static POSTAL_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(?:-\d{4})?$").expect("valid regex"));

/// Clamp a caller-supplied result limit into `1..=200`, defaulting to 50.
#[must_use]
pub fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Trim and validate a postal code, returning the normalized form.
///
/// # Errors
///
/// Returns [`CoreError::InvalidPostalCode`] if the input is not a 5-digit ZIP
/// or ZIP+4.
pub fn validate_postal_code(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if POSTAL_CODE_RE.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(CoreError::InvalidPostalCode(raw.to_string()))
    }
}

/// Where a search is centered.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOrigin {
    /// Needs geocoding before the store can be queried.
    PostalCode(String),
    Coordinate(DisplayPoint),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub origin: SearchOrigin,
    pub radius_miles: f64,
    pub business_type: Option<BusinessType>,
    pub practices: Vec<Practice>,
    pub limit: i64,
}

impl SearchRequest {
    /// Build the store query once the origin has been resolved to a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRadius`] if the radius is not positive.
    pub fn to_query(&self, center: DisplayPoint) -> Result<ProximityQuery, CoreError> {
        ProximityQuery::builder(StorePoint::from(center), self.radius_miles)
            .business_type(self.business_type)
            .practices(self.practices.iter().copied())
            .limit(self.limit)
            .build()
    }
}
