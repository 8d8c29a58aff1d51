use farmfinder_core::LocationConfig;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

/// Upsert locations from the YAML seed file, keyed by slug.
///
/// Returns the number of locations processed (inserted or updated).
/// All upserts run inside a single transaction; if any operation fails
/// the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::InvalidRecord`] if a location has out-of-range
/// coordinates, or [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_locations(pool: &PgPool, locations: &[LocationConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for location in locations {
        let slug = location.slug();
        let (x, y) = location.store_point()?.xy();
        let business_types: Vec<String> = location
            .business_types
            .iter()
            .map(ToString::to_string)
            .collect();
        let practices: Vec<String> = location.practices.iter().map(ToString::to_string).collect();

        sqlx::query(
            "INSERT INTO locations (slug, name, business_types, location, street, city, state, zip, \
                 description, practices, products, operating_hours, phone, email, website, \
                 supports_pickup, supports_delivery, delivery_radius_miles, minimum_order, \
                 fulfillment_notes, verified) \
             VALUES ($1, $2, $3, point($4, $5), $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                 $16, $17, $18, $19, $20, $21, $22) \
             ON CONFLICT (slug) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 business_types = EXCLUDED.business_types, \
                 location = EXCLUDED.location, \
                 street = EXCLUDED.street, \
                 city = EXCLUDED.city, \
                 state = EXCLUDED.state, \
                 zip = EXCLUDED.zip, \
                 description = EXCLUDED.description, \
                 practices = EXCLUDED.practices, \
                 products = EXCLUDED.products, \
                 operating_hours = EXCLUDED.operating_hours, \
                 phone = EXCLUDED.phone, \
                 email = EXCLUDED.email, \
                 website = EXCLUDED.website, \
                 supports_pickup = EXCLUDED.supports_pickup, \
                 supports_delivery = EXCLUDED.supports_delivery, \
                 delivery_radius_miles = EXCLUDED.delivery_radius_miles, \
                 minimum_order = EXCLUDED.minimum_order, \
                 fulfillment_notes = EXCLUDED.fulfillment_notes, \
                 verified = EXCLUDED.verified, \
                 updated_at = NOW()",
        )
        .bind(&slug)
        .bind(&location.name)
        .bind(&business_types)
        .bind(x)
        .bind(y)
        .bind(&location.address.street)
        .bind(&location.address.city)
        .bind(&location.address.state)
        .bind(&location.address.zip)
        .bind(&location.description)
        .bind(&practices)
        .bind(Json(&location.products))
        .bind(Json(&location.operating_hours))
        .bind(&location.contact.phone)
        .bind(&location.contact.email)
        .bind(&location.contact.website)
        .bind(location.fulfillment.supports_pickup)
        .bind(location.fulfillment.supports_delivery)
        .bind(location.fulfillment.delivery_radius_miles)
        .bind(location.fulfillment.minimum_order)
        .bind(&location.fulfillment.notes)
        .bind(location.verified)
        .execute(&mut *tx)
        .await?;

        tracing::debug!(slug = %slug, "seeded location");
        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
