use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Extension, Json,
};
use farmfinder_core::{normalize_limit, BusinessType, LocationRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct LocationsQuery {
    #[serde(rename = "type")]
    pub business_type: Option<String>,
    pub limit: Option<i64>,
    pub cursor: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct PaginatedLocations {
    pub items: Vec<LocationRecord>,
    /// Pass back as `cursor` to fetch the next page. `None` on the last page.
    pub next_cursor: Option<i64>,
}

pub(super) async fn list_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<LocationsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<PaginatedLocations>>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        ApiError::new(req_id.0.clone(), "validation_error", rejection.body_text())
    })?;
    let business_type = query
        .business_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<BusinessType>)
        .transpose()
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;
    let limit = normalize_limit(query.limit);

    let items = farmfinder_db::list_locations(&state.pool, business_type, query.cursor, limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let full_page = i64::try_from(items.len()).is_ok_and(|n| n == limit);
    let next_cursor = if full_page {
        items.last().map(|record| record.id)
    } else {
        None
    };

    Ok(Json(ApiResponse {
        data: PaginatedLocations { items, next_cursor },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_location(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<LocationRecord>>, ApiError> {
    let public_id = Uuid::parse_str(&id).map_err(|_| {
        ApiError::new(
            req_id.0.clone(),
            "validation_error",
            format!("invalid location id: '{id}'"),
        )
    })?;

    let record = farmfinder_db::get_location(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "location not found"))?;

    Ok(Json(ApiResponse {
        data: record,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::super::test_support::{app, get_json, lazy_pool};

    async fn insert_location(pool: &sqlx::PgPool, slug: &str, business_type: &str) -> uuid::Uuid {
        sqlx::query_scalar(
            "INSERT INTO locations (slug, name, business_types, location, supports_pickup) \
             VALUES ($1, $2, ARRAY[$3], point(-73.99, 40.75), TRUE) RETURNING public_id",
        )
        .bind(slug)
        .bind(format!("Location {slug}"))
        .bind(business_type)
        .fetch_one(pool)
        .await
        .expect("insert location")
    }

    #[tokio::test]
    async fn malformed_id_is_validation_error() {
        let (status, json) = get_json(
            app(lazy_pool(), "http://127.0.0.1:1"),
            "/api/v1/locations/not-a-uuid",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "validation_error");
    }

    #[tokio::test]
    async fn unknown_type_filter_is_validation_error() {
        let (status, json) = get_json(
            app(lazy_pool(), "http://127.0.0.1:1"),
            "/api/v1/locations?type=bakery",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "validation_error");
    }

    #[tokio::test]
    async fn malformed_paging_params_use_error_envelope() {
        for uri in ["/api/v1/locations?limit=abc", "/api/v1/locations?cursor=1.5"] {
            let (status, json) = get_json(app(lazy_pool(), "http://127.0.0.1:1"), uri).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(json["code"], "validation_error", "{uri}");
            assert!(json["error"].is_string(), "{uri}");
            assert!(json["meta"]["request_id"].is_string(), "{uri}");
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_location_returns_record_or_404(pool: sqlx::PgPool) {
        let public_id = insert_location(&pool, "detail-farm", "Farm").await;

        let (status, json) = get_json(
            app(pool.clone(), "http://127.0.0.1:1"),
            &format!("/api/v1/locations/{public_id}"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["slug"], "detail-farm");
        assert_eq!(json["data"]["coordinates"]["lat"], 40.75);

        let (status, json) = get_json(
            app(pool, "http://127.0.0.1:1"),
            &format!("/api/v1/locations/{}", uuid::Uuid::new_v4()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "not_found");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_locations_paginates_with_cursor(pool: sqlx::PgPool) {
        for slug in ["page-a", "page-b", "page-c"] {
            insert_location(&pool, slug, "Farm Store").await;
        }

        let (status, first) = get_json(
            app(pool.clone(), "http://127.0.0.1:1"),
            "/api/v1/locations?limit=2",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["data"]["items"].as_array().map(Vec::len), Some(2));
        let cursor = first["data"]["next_cursor"].as_i64().expect("cursor");

        let (_, second) = get_json(
            app(pool.clone(), "http://127.0.0.1:1"),
            &format!("/api/v1/locations?limit=2&cursor={cursor}"),
        )
        .await;
        assert_eq!(second["data"]["items"].as_array().map(Vec::len), Some(1));
        assert!(second["data"]["next_cursor"].is_null());

        let (_, filtered) = get_json(
            app(pool, "http://127.0.0.1:1"),
            "/api/v1/locations?type=farm",
        )
        .await;
        assert_eq!(filtered["data"]["items"].as_array().map(Vec::len), Some(0));
    }
}
