//! Read operations for the `locations` table.

use farmfinder_core::geo::METERS_PER_MILE;
use farmfinder_core::{
    BusinessType, FulfillmentMode, GroupedMatches, LocationRecord, Predicate, ProximityQuery,
    StorePoint,
};
use geo::{Destination, Haversine, Point};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::types::{LocationRow, LOCATION_COLUMNS};
use crate::DbError;

/// Widening applied to the prefilter box. earthdistance uses a slightly
/// smaller Earth radius than the distance calculator.
const BOX_SLACK: f64 = 1.01;

/// Longitude/latitude rectangle in storage order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

#[cfg(test)]
impl BoundingBox {
    fn contains(&self, point: StorePoint) -> bool {
        (self.min_lng..=self.max_lng).contains(&point.lng)
            && (self.min_lat..=self.max_lat).contains(&point.lat)
    }
}

/// Rectangle enclosing every point within `radius_miles` of `center`.
///
/// Returns `None` when the circle reaches a pole or crosses the antimeridian;
/// the caller then relies on the distance predicate alone.
#[must_use]
pub fn bounding_box(center: StorePoint, radius_miles: f64) -> Option<BoundingBox> {
    let origin = Point::from(center);
    let meters = radius_miles * METERS_PER_MILE * BOX_SLACK;

    // Past a pole the destination lands on the opposite meridian.
    let north = Haversine.destination(origin, 0.0, meters);
    let south = Haversine.destination(origin, 180.0, meters);
    if (north.x() - origin.x()).abs() > 1e-9 || (south.x() - origin.x()).abs() > 1e-9 {
        return None;
    }
    if north.y() >= 90.0 || south.y() <= -90.0 {
        return None;
    }

    // The widest longitude is where a meridian touches the circle, at bearing
    // acos(tan(d) * tan(lat)) from the center.
    let angular = (north.y() - origin.y()).to_radians();
    let cos_bearing = angular.tan() * origin.y().to_radians().tan();
    if !cos_bearing.is_finite() || cos_bearing.abs() >= 1.0 {
        return None;
    }
    let east = Haversine.destination(origin, cos_bearing.acos().to_degrees(), meters);
    let d_lng = east.x() - origin.x();
    if d_lng <= 0.0 {
        return None;
    }

    let min_lng = origin.x() - d_lng;
    let max_lng = origin.x() + d_lng;
    if min_lng < -180.0 || max_lng > 180.0 {
        return None;
    }

    Some(BoundingBox {
        min_lng,
        min_lat: south.y(),
        max_lng,
        max_lat: north.y(),
    })
}

/// Render a [`ProximityQuery`] as a single `SELECT` over `locations`.
///
/// Each predicate becomes one `AND`-joined clause:
/// - `WithinRadius`: `(location <@> point(lng, lat)) <= radius`, preceded by a
///   GiST-indexable `location <@ box(..)` prefilter when one applies;
/// - `OffersFulfillment`: pickup or delivery is offered;
/// - `Supports(mode)`: pickup is offered, or delivery is offered and reaches
///   the center;
/// - `HasBusinessType`: `business_types @> ARRAY[type]`;
/// - `HasAllPractices`: `practices @> ARRAY[..]`.
///
/// Rows are ordered by distance, ties by id, and capped at the query limit.
#[must_use]
pub fn build_search_query(query: &ProximityQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE "));

    for (i, predicate) in query.predicates().iter().enumerate() {
        if i > 0 {
            qb.push(" AND ");
        }
        match predicate {
            Predicate::WithinRadius {
                center,
                radius_miles,
            } => {
                if let Some(bbox) = bounding_box(*center, *radius_miles) {
                    qb.push("location <@ box(point(");
                    qb.push_bind(bbox.min_lng);
                    qb.push(", ");
                    qb.push_bind(bbox.min_lat);
                    qb.push("), point(");
                    qb.push_bind(bbox.max_lng);
                    qb.push(", ");
                    qb.push_bind(bbox.max_lat);
                    qb.push(")) AND ");
                }
                qb.push("(location <@> point(");
                qb.push_bind(center.lng);
                qb.push(", ");
                qb.push_bind(center.lat);
                qb.push(")) <= ");
                qb.push_bind(*radius_miles);
            }
            Predicate::OffersFulfillment => {
                qb.push("(supports_pickup OR supports_delivery)");
            }
            Predicate::Supports(FulfillmentMode::Pickup) => {
                qb.push("supports_pickup");
            }
            Predicate::Supports(FulfillmentMode::Delivery) => {
                let (x, y) = query.center().xy();
                qb.push(
                    "supports_delivery AND (delivery_radius_miles IS NULL \
                     OR (location <@> point(",
                );
                qb.push_bind(x);
                qb.push(", ");
                qb.push_bind(y);
                qb.push(")) <= delivery_radius_miles)");
            }
            Predicate::HasBusinessType(business_type) => {
                push_business_type(&mut qb, *business_type);
            }
            Predicate::HasAllPractices(practices) => {
                let tags: Vec<String> = practices.iter().map(|p| p.as_str().to_string()).collect();
                qb.push("practices @> ");
                qb.push_bind(tags);
                qb.push("::text[]");
            }
        }
    }

    let (x, y) = query.center().xy();
    qb.push(" ORDER BY location <@> point(");
    qb.push_bind(x);
    qb.push(", ");
    qb.push_bind(y);
    qb.push("), id LIMIT ");
    qb.push_bind(query.limit());
    qb
}

fn push_business_type(qb: &mut QueryBuilder<'static, Postgres>, business_type: BusinessType) {
    qb.push("business_types @> ARRAY[");
    qb.push_bind(business_type.as_str().to_string());
    qb.push("]::text[]");
}

fn into_records(rows: Vec<LocationRow>) -> Result<Vec<LocationRecord>, DbError> {
    rows.into_iter()
        .map(|row| row.into_record().map_err(DbError::from))
        .collect()
}

async fn fetch_matches(
    pool: &PgPool,
    query: &ProximityQuery,
) -> Result<Vec<LocationRecord>, DbError> {
    let rows = build_search_query(query)
        .build_query_as::<LocationRow>()
        .fetch_all(pool)
        .await?;
    into_records(rows)
}

/// Execute a proximity search, once per fulfillment mode.
///
/// Each group is nearest first and limited on its own, so nearer locations of
/// one mode never crowd out the other. Distance annotation and final ordering
/// happen afterwards in `farmfinder_core::compose`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails, or [`DbError::InvalidRecord`]
/// if a stored point is out of range.
pub async fn search_locations(
    pool: &PgPool,
    query: &ProximityQuery,
) -> Result<GroupedMatches, DbError> {
    let pickup = fetch_matches(pool, &query.for_mode(FulfillmentMode::Pickup)).await?;
    let delivery = fetch_matches(pool, &query.for_mode(FulfillmentMode::Delivery)).await?;

    tracing::debug!(
        pickup = pickup.len(),
        delivery = delivery.len(),
        radius_miles = query.radius_miles(),
        limit = query.limit(),
        "proximity query complete"
    );
    Ok(GroupedMatches { pickup, delivery })
}

/// Fetch a single location by its public id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_location(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<LocationRecord>, DbError> {
    let row = sqlx::query_as::<_, LocationRow>(&format!(
        "SELECT {LOCATION_COLUMNS} FROM locations WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| r.into_record().map_err(DbError::from))
        .transpose()
}

/// List locations in id order, optionally filtered by business type.
///
/// `after_id` is a keyset cursor: only rows with a greater id are returned.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_locations(
    pool: &PgPool,
    business_type: Option<BusinessType>,
    after_id: Option<i64>,
    limit: i64,
) -> Result<Vec<LocationRecord>, DbError> {
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {LOCATION_COLUMNS} FROM locations WHERE TRUE"
    ));
    if let Some(business_type) = business_type {
        qb.push(" AND ");
        push_business_type(&mut qb, business_type);
    }
    if let Some(after_id) = after_id {
        qb.push(" AND id > ");
        qb.push_bind(after_id);
    }
    qb.push(" ORDER BY id LIMIT ");
    qb.push_bind(limit);

    let rows = qb.build_query_as::<LocationRow>().fetch_all(pool).await?;
    into_records(rows)
}

/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn count_locations(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM locations")
        .fetch_one(pool)
        .await
}
