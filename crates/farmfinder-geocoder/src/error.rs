use thiserror::Error;

/// Errors returned by the geocoding client.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The service answered but resolved nothing for this postal code.
    #[error("no location found for postal code {postal_code}")]
    NotFound { postal_code: String },

    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from geocoding service")]
    UnexpectedStatus { status: u16 },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The service returned a coordinate that does not parse or is out of range.
    #[error("geocoding service returned an invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("invalid geocoder base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl GeocodeError {
    /// `true` when the lookup succeeded but matched nothing, as opposed to the
    /// service being unreachable or misbehaving.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, GeocodeError::NotFound { .. })
    }
}
