//! Turns raw store matches into the grouped, distance-sorted search payload.

use serde::{Serialize, Serializer};

use crate::geo::{haversine_miles, DisplayPoint};
use crate::locations::LocationRecord;

/// A matched location annotated with its distance from the search origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub record: LocationRecord,
    /// Latitude-first position for map rendering.
    pub position: DisplayPoint,
    #[serde(serialize_with = "one_decimal")]
    pub distance_miles: f64,
}

/// Store matches fetched once per fulfillment mode, each group nearest first
/// and capped at the query limit on its own.
///
/// A location offering both modes may appear in both groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedMatches {
    pub pickup: Vec<LocationRecord>,
    pub delivery: Vec<LocationRecord>,
}

/// Search output grouped by fulfillment mode.
///
/// A location offering both pickup and delivery appears in both groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub origin: DisplayPoint,
    pub radius_miles: f64,
    pub pickup: Vec<SearchResult>,
    pub delivery: Vec<SearchResult>,
}

impl SearchResults {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pickup.is_empty() && self.delivery.is_empty()
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn one_decimal<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 10.0).round() / 10.0)
}

fn by_distance_then_id(a: &SearchResult, b: &SearchResult) -> std::cmp::Ordering {
    a.distance_miles
        .total_cmp(&b.distance_miles)
        .then_with(|| a.record.id.cmp(&b.record.id))
}

fn annotate(origin: DisplayPoint, record: LocationRecord) -> SearchResult {
    let position = DisplayPoint::from(record.point);
    SearchResult {
        distance_miles: haversine_miles(origin, position),
        record,
        position,
    }
}

/// Attach distances, apply the per-mode eligibility checks, and sort each group
/// by distance (ties by id).
///
/// A pickup match must support pickup. A delivery match must support delivery
/// and have the origin inside its delivery range. Matches that fail are
/// dropped and logged at debug.
#[must_use]
pub fn compose(origin: DisplayPoint, radius_miles: f64, matches: GroupedMatches) -> SearchResults {
    let mut pickup: Vec<SearchResult> = matches
        .pickup
        .into_iter()
        .map(|record| annotate(origin, record))
        .filter(|hit| {
            let eligible = hit.record.fulfillment.supports_pickup;
            if !eligible {
                tracing::debug!(
                    location_id = hit.record.id,
                    "excluding location without pickup from pickup group"
                );
            }
            eligible
        })
        .collect();

    let mut delivery: Vec<SearchResult> = matches
        .delivery
        .into_iter()
        .map(|record| annotate(origin, record))
        .filter(|hit| {
            let eligible = hit.record.fulfillment.delivers_to(hit.distance_miles);
            if !eligible {
                tracing::debug!(
                    location_id = hit.record.id,
                    distance_miles = hit.distance_miles,
                    supports_delivery = hit.record.fulfillment.supports_delivery,
                    "excluding location out of delivery range"
                );
            }
            eligible
        })
        .collect();

    pickup.sort_by(by_distance_then_id);
    delivery.sort_by(by_distance_then_id);

    SearchResults {
        origin,
        radius_miles,
        pickup,
        delivery,
    }
}
