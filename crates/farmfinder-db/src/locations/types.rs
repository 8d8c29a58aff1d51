//! Row types for the `locations` table.

use chrono::{DateTime, Utc};
use farmfinder_core::{
    Address, BusinessType, Contact, CoreError, Fulfillment, LocationRecord, OperatingHours,
    Practice, ProductGroup, StorePoint,
};
use rust_decimal::Decimal;
use sqlx::types::Json;
use uuid::Uuid;

/// Column list shared by every read. The `point` column is unpacked into its
/// x (longitude) and y (latitude) components.
pub(crate) const LOCATION_COLUMNS: &str = "id, public_id, slug, name, business_types, \
     location[0] AS lng, location[1] AS lat, \
     street, city, state, zip, description, practices, products, operating_hours, \
     phone, email, website, supports_pickup, supports_delivery, \
     delivery_radius_miles, minimum_order, fulfillment_notes, verified, \
     created_at, updated_at";

/// A row from the `locations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LocationRow {
    pub id: i64,
    pub public_id: Uuid,
    pub slug: String,
    pub name: String,
    pub business_types: Vec<String>,
    pub lng: f64,
    pub lat: f64,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub description: Option<String>,
    pub practices: Vec<String>,
    pub products: Json<Vec<ProductGroup>>,
    pub operating_hours: Json<Vec<OperatingHours>>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub supports_pickup: bool,
    pub supports_delivery: bool,
    pub delivery_radius_miles: Option<f64>,
    pub minimum_order: Option<Decimal>,
    pub fulfillment_notes: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LocationRow {
    /// Convert into the domain record.
    ///
    /// Tags that no longer parse are skipped with a warning rather than
    /// failing the whole read.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] if the stored point is out of
    /// range.
    pub fn into_record(self) -> Result<LocationRecord, CoreError> {
        let point = StorePoint::new(self.lng, self.lat)?;
        let business_types =
            parse_tags::<BusinessType>(self.id, "business_types", &self.business_types);
        let practices = parse_tags::<Practice>(self.id, "practices", &self.practices);

        Ok(LocationRecord {
            id: self.id,
            public_id: self.public_id,
            slug: self.slug,
            name: self.name,
            business_types,
            point,
            address: Address {
                street: self.street,
                city: self.city,
                state: self.state,
                zip: self.zip,
            },
            description: self.description,
            practices,
            products: self.products.0,
            operating_hours: self.operating_hours.0,
            contact: Contact {
                phone: self.phone,
                email: self.email,
                website: self.website,
            },
            fulfillment: Fulfillment {
                supports_pickup: self.supports_pickup,
                supports_delivery: self.supports_delivery,
                delivery_radius_miles: self.delivery_radius_miles,
                minimum_order: self.minimum_order,
                notes: self.fulfillment_notes,
            },
            verified: self.verified,
        })
    }
}

fn parse_tags<T>(location_id: i64, column: &str, raw: &[String]) -> Vec<T>
where
    T: std::str::FromStr<Err = CoreError>,
{
    raw.iter()
        .filter_map(|tag| match tag.parse::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(location_id, column, error = %e, "skipping unrecognized tag");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> LocationRow {
        let now = Utc::now();
        LocationRow {
            id: 7,
            public_id: Uuid::new_v4(),
            slug: "stone-barns-tarrytown".to_string(),
            name: "Stone Barns".to_string(),
            business_types: vec!["Farm".to_string(), "Restaurant".to_string()],
            lng: -73.8285,
            lat: 41.1004,
            street: None,
            city: Some("Tarrytown".to_string()),
            state: Some("NY".to_string()),
            zip: Some("10591".to_string()),
            description: None,
            practices: vec!["Regenerative".to_string(), "Hydroponic".to_string()],
            products: Json(Vec::new()),
            operating_hours: Json(Vec::new()),
            phone: None,
            email: None,
            website: None,
            supports_pickup: true,
            supports_delivery: false,
            delivery_radius_miles: None,
            minimum_order: None,
            fulfillment_notes: None,
            verified: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn into_record_keeps_axis_order() {
        let record = row().into_record().unwrap();
        assert_eq!(record.point.xy(), (-73.8285, 41.1004));
        assert_eq!(
            record.business_types,
            vec![BusinessType::Farm, BusinessType::Restaurant]
        );
        assert_eq!(record.address.city.as_deref(), Some("Tarrytown"));
    }

    #[test]
    fn into_record_skips_unknown_tags() {
        let record = row().into_record().unwrap();
        assert_eq!(record.practices, vec![Practice::Regenerative]);
    }

    #[test]
    fn into_record_rejects_out_of_range_point() {
        let mut bad = row();
        bad.lat = 120.0;
        assert!(matches!(
            bad.into_record(),
            Err(CoreError::InvalidCoordinate { .. })
        ));
    }
}
