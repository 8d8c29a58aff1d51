//! `GET /api/v1/search`: postal code or coordinate in, grouped nearby
//! locations out.
//!
//! A request moves through validate, geocode, query, compose, respond. Each
//! stage fails with its own [`SearchError`] variant; `into_api_error` maps
//! those to status codes.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use farmfinder_core::{
    compose, normalize_limit, validate_postal_code, BusinessType, CoreError, DisplayPoint,
    Practice, SearchOrigin, SearchRequest, SearchResults,
};
use farmfinder_db::DbError;
use farmfinder_geocoder::GeocodeError;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Raw query string. Every field is text so malformed numbers surface as
/// `validation_error` instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub(super) struct SearchParams {
    #[serde(alias = "zipCode", alias = "postal_code")]
    pub zip: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
    #[serde(rename = "type")]
    pub business_type: Option<String>,
    pub practices: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug)]
pub(super) enum SearchError {
    MissingParameter(&'static str),
    Invalid(String),
    PostalCodeNotFound(String),
    Upstream(GeocodeError),
    Store(DbError),
}

impl From<CoreError> for SearchError {
    fn from(e: CoreError) -> Self {
        SearchError::Invalid(e.to_string())
    }
}

impl SearchError {
    fn into_api_error(self, request_id: String) -> ApiError {
        match self {
            SearchError::MissingParameter(name) => ApiError::new(
                request_id,
                "missing_parameter",
                format!("missing required parameter: {name}"),
            ),
            SearchError::Invalid(message) => {
                ApiError::new(request_id, "validation_error", message)
            }
            SearchError::PostalCodeNotFound(postal_code) => ApiError::new(
                request_id,
                "not_found_postal_code",
                format!("no location found for postal code {postal_code}"),
            ),
            SearchError::Upstream(e) => {
                tracing::error!(
                    request_id = %request_id,
                    error = %e,
                    "geocoding service failed"
                );
                ApiError::new(request_id, "upstream_error", "geocoding service unavailable")
            }
            SearchError::Store(e) => map_db_error(request_id, &e),
        }
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, SearchError> {
    raw.parse::<T>()
        .map_err(|_| SearchError::Invalid(format!("{name} must be a number, got '{raw}'")))
}

impl SearchParams {
    /// Validate the query string into a [`SearchRequest`].
    ///
    /// A postal code takes precedence over `lat`/`lng` when both are present.
    pub(super) fn into_request(
        self,
        default_radius_miles: f64,
    ) -> Result<SearchRequest, SearchError> {
        let origin = match non_blank(self.zip.as_ref()) {
            Some(zip) => SearchOrigin::PostalCode(validate_postal_code(zip)?),
            None => {
                let lat = non_blank(self.lat.as_ref());
                let lng = non_blank(self.lng.as_ref());
                match (lat, lng) {
                    (None, None) => return Err(SearchError::MissingParameter("zip")),
                    (Some(_), None) => return Err(SearchError::MissingParameter("lng")),
                    (None, Some(_)) => return Err(SearchError::MissingParameter("lat")),
                    (Some(lat), Some(lng)) => SearchOrigin::Coordinate(DisplayPoint::new(
                        parse_number("lat", lat)?,
                        parse_number("lng", lng)?,
                    )?),
                }
            }
        };

        let radius_miles = match non_blank(self.radius.as_ref()) {
            Some(raw) => parse_number::<f64>("radius", raw)?,
            None => default_radius_miles,
        };
        if !radius_miles.is_finite() || radius_miles <= 0.0 {
            return Err(CoreError::InvalidRadius(radius_miles).into());
        }

        let business_type = non_blank(self.business_type.as_ref())
            .map(str::parse::<BusinessType>)
            .transpose()?;

        let practices = match non_blank(self.practices.as_ref()) {
            Some(raw) => Practice::parse_list(raw)?,
            None => Vec::new(),
        };

        let limit = non_blank(self.limit.as_ref())
            .map(|raw| parse_number::<i64>("limit", raw))
            .transpose()?;

        Ok(SearchRequest {
            origin,
            radius_miles,
            business_type,
            practices,
            limit: normalize_limit(limit),
        })
    }
}

async fn run_search(state: &AppState, params: SearchParams) -> Result<SearchResults, SearchError> {
    let request = params.into_request(state.default_radius_miles)?;

    let center = match &request.origin {
        SearchOrigin::Coordinate(point) => *point,
        SearchOrigin::PostalCode(postal_code) => state
            .geocoder
            .geocode_postal_code(postal_code)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    SearchError::PostalCodeNotFound(postal_code.clone())
                } else {
                    SearchError::Upstream(e)
                }
            })?,
    };

    let query = request.to_query(center)?;
    let matches = farmfinder_db::search_locations(&state.pool, &query)
        .await
        .map_err(SearchError::Store)?;

    Ok(compose(center, request.radius_miles, matches))
}

pub(super) async fn search_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<ApiResponse<SearchResults>>, ApiError> {
    let Query(params) = query.map_err(|rejection| {
        ApiError::new(req_id.0.clone(), "validation_error", rejection.body_text())
    })?;

    let results = run_search(&state, params)
        .await
        .map_err(|e| e.into_api_error(req_id.0.clone()))?;

    tracing::info!(
        request_id = %req_id.0,
        lat = results.origin.lat,
        lng = results.origin.lng,
        radius_miles = results.radius_miles,
        pickup = results.pickup.len(),
        delivery = results.delivery.len(),
        "search complete"
    );

    Ok(Json(ApiResponse {
        data: results,
        meta: ResponseMeta::new(req_id.0),
    }))
}
