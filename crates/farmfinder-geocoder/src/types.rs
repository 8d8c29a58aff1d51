//! Wire types for the Nominatim search response.

use serde::Deserialize;

/// One element of the `/search?format=json` array.
///
/// Nominatim encodes `lat`/`lon` as strings; some mirrors send numbers.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimPlace {
    pub lat: CoordinateValue,
    pub lon: CoordinateValue,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CoordinateValue {
    Number(f64),
    Text(String),
}

impl CoordinateValue {
    pub(crate) fn to_f64(&self) -> Option<f64> {
        match self {
            CoordinateValue::Number(n) => Some(*n),
            CoordinateValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl std::fmt::Display for CoordinateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinateValue::Number(n) => write!(f, "{n}"),
            CoordinateValue::Text(s) => f.write_str(s),
        }
    }
}
