//! HTTP client for the Nominatim postal-code search.
//!
//! Every outbound request, retries included, passes through the client's
//! [`Throttle`] first, so the service never sees two requests closer together
//! than the configured interval.

use std::time::Duration;

use farmfinder_core::{AppConfig, DisplayPoint};
use reqwest::{Client, Url};

use crate::error::GeocodeError;
use crate::retry::retry_with_backoff;
use crate::throttle::Throttle;
use crate::types::NominatimPlace;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Clone)]
pub struct GeocoderSettings {
    pub base_url: String,
    pub country: String,
    pub user_agent: String,
    pub min_interval: Duration,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            country: "USA".to_owned(),
            user_agent: "farmfinder/0.1 (location-search)".to_owned(),
            min_interval: Duration::from_millis(1000),
            timeout_secs: 10,
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

impl GeocoderSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.geocoder_base_url.clone(),
            country: config.geocoder_country.clone(),
            user_agent: config.geocoder_user_agent.clone(),
            min_interval: Duration::from_millis(config.geocoder_min_interval_ms),
            timeout_secs: config.geocoder_timeout_secs,
            max_retries: config.geocoder_max_retries,
            backoff_base_ms: config.geocoder_backoff_base_ms,
        }
    }
}

/// Resolves postal codes to coordinates through a Nominatim-compatible API.
///
/// Construct once per process and share it (e.g. behind an `Arc`); the
/// throttle lives inside the client.
#[derive(Debug, Clone)]
pub struct GeocoderClient {
    client: Client,
    search_url: Url,
    country: String,
    throttle: Throttle,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl GeocoderClient {
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GeocodeError::InvalidBaseUrl`] if the
    /// configured base URL does not parse.
    pub fn new(settings: GeocoderSettings) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(settings.user_agent.as_str())
            .build()?;

        let normalised = format!("{}/search", settings.base_url.trim_end_matches('/'));
        let search_url = Url::parse(&normalised).map_err(|e| GeocodeError::InvalidBaseUrl {
            url: settings.base_url.clone(),
            reason: e.to_string(),
        })?;

        let throttle = Throttle::new(settings.min_interval);
        tracing::debug!(
            url = %search_url,
            min_interval_ms = throttle.min_interval().as_millis(),
            max_retries = settings.max_retries,
            "geocoder client configured"
        );

        Ok(Self {
            client,
            search_url,
            country: settings.country,
            throttle,
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
        })
    }

    /// Resolve a postal code to a latitude-first coordinate using the first
    /// match returned by the service.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::NotFound`] if the service returns an empty result set.
    /// - [`GeocodeError::Http`] / [`GeocodeError::UnexpectedStatus`] on network
    ///   failure, timeout or non-2xx status after retries are exhausted.
    /// - [`GeocodeError::Deserialize`] if the body is not the expected JSON array.
    /// - [`GeocodeError::InvalidCoordinate`] if `lat`/`lon` are unusable.
    pub async fn geocode_postal_code(
        &self,
        postal_code: &str,
    ) -> Result<DisplayPoint, GeocodeError> {
        let url = self.build_url(postal_code);

        let place = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                self.throttle.acquire().await;
                self.fetch_first_place(url, postal_code).await
            }
        })
        .await?;

        let point = parse_place(&place)?;
        tracing::info!(
            postal_code,
            lat = point.lat,
            lng = point.lng,
            display_name = place.display_name.as_deref().unwrap_or_default(),
            "geocoded postal code"
        );
        Ok(point)
    }

    async fn fetch_first_place(
        &self,
        url: Url,
        postal_code: &str,
    ) -> Result<NominatimPlace, GeocodeError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::ACCEPT_LANGUAGE, "en")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let places: Vec<NominatimPlace> =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
                context: format!("search(postalcode={postal_code})"),
                source: e,
            })?;

        places
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound {
                postal_code: postal_code.to_owned(),
            })
    }

    fn build_url(&self, postal_code: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("postalcode", postal_code)
            .append_pair("country", &self.country)
            .append_pair("format", "json")
            .append_pair("limit", "1");
        url
    }
}

fn parse_place(place: &NominatimPlace) -> Result<DisplayPoint, GeocodeError> {
    let (Some(lat), Some(lng)) = (place.lat.to_f64(), place.lon.to_f64()) else {
        return Err(GeocodeError::InvalidCoordinate(format!(
            "lat={}, lon={}",
            place.lat, place.lon
        )));
    };
    DisplayPoint::new(lat, lng).map_err(|e| GeocodeError::InvalidCoordinate(e.to_string()))
}
