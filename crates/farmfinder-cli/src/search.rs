//! `search` subcommand: the same validate, geocode, query, compose flow the
//! HTTP endpoint runs, printed as a table or JSON.

use clap::Args;
use farmfinder_core::{
    compose, normalize_limit, validate_postal_code, AppConfig, BusinessType, CoreError,
    DisplayPoint, Practice, SearchOrigin, SearchRequest, SearchResult,
};
use farmfinder_geocoder::{GeocoderClient, GeocoderSettings};
use sqlx::PgPool;

#[derive(Debug, Args)]
pub(crate) struct SearchArgs {
    /// US ZIP or ZIP+4 to search around
    #[arg(long, conflicts_with_all = ["lat", "lng"], required_unless_present = "lat")]
    pub zip: Option<String>,
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,
    /// Search radius in miles (defaults to `FARMFINDER_SEARCH_DEFAULT_RADIUS_MILES`)
    #[arg(long)]
    pub radius: Option<f64>,
    /// Business type filter, e.g. "farm-store"
    #[arg(long = "type")]
    pub business_type: Option<String>,
    /// Comma-separated practices that must all be present
    #[arg(long)]
    pub practices: Option<String>,
    #[arg(long)]
    pub limit: Option<i64>,
    /// Print the grouped results as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    pub(crate) fn into_request(self, default_radius_miles: f64) -> anyhow::Result<SearchRequest> {
        let origin = match (self.zip, self.lat, self.lng) {
            (Some(zip), _, _) => SearchOrigin::PostalCode(validate_postal_code(&zip)?),
            (None, Some(lat), Some(lng)) => SearchOrigin::Coordinate(DisplayPoint::new(lat, lng)?),
            _ => anyhow::bail!("either --zip or both --lat and --lng are required"),
        };

        let radius_miles = self.radius.unwrap_or(default_radius_miles);
        if !radius_miles.is_finite() || radius_miles <= 0.0 {
            return Err(CoreError::InvalidRadius(radius_miles).into());
        }

        Ok(SearchRequest {
            origin,
            radius_miles,
            business_type: self
                .business_type
                .as_deref()
                .map(str::parse::<BusinessType>)
                .transpose()?,
            practices: match self.practices.as_deref() {
                Some(raw) => Practice::parse_list(raw)?,
                None => Vec::new(),
            },
            limit: normalize_limit(self.limit),
        })
    }
}

/// # Errors
///
/// Returns an error on invalid input, geocoding failure, or a failed query.
pub(crate) async fn run_search(
    config: &AppConfig,
    pool: &PgPool,
    args: SearchArgs,
) -> anyhow::Result<()> {
    let as_json = args.json;
    let request = args.into_request(config.search_default_radius_miles)?;

    let center = match &request.origin {
        SearchOrigin::Coordinate(point) => *point,
        SearchOrigin::PostalCode(postal_code) => {
            let client = GeocoderClient::new(GeocoderSettings::from_app_config(config))?;
            client.geocode_postal_code(postal_code).await?
        }
    };

    let query = request.to_query(center)?;
    let matches = farmfinder_db::search_locations(pool, &query).await?;
    let results = compose(center, request.radius_miles, matches);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!(
        "origin {:.4}, {:.4} within {} mi",
        results.origin.lat, results.origin.lng, results.radius_miles
    );
    if results.is_empty() {
        println!("no locations found");
        return Ok(());
    }
    print_group("PICKUP", &results.pickup);
    print_group("DELIVERY", &results.delivery);
    Ok(())
}

fn print_group(title: &str, group: &[SearchResult]) {
    println!();
    println!("{title} ({})", group.len());
    if group.is_empty() {
        return;
    }
    println!("{:>8}  {:<36}TYPES", "MILES", "NAME");
    for result in group {
        let types = result
            .record
            .business_types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:>8.1}  {:<36}{}",
            result.distance_miles, result.record.name, types
        );
    }
}
