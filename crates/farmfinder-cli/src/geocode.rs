//! `geocode` subcommand: resolve postal codes through the configured service.

use farmfinder_core::{validate_postal_code, AppConfig};
use farmfinder_geocoder::{GeocoderClient, GeocoderSettings};
use futures::stream::{self, StreamExt};

/// Requests are issued concurrently but the client throttle still spaces them
/// by the configured minimum interval.
const MAX_IN_FLIGHT: usize = 4;

/// # Errors
///
/// Returns an error if the geocoder client cannot be built. Per-code failures
/// are printed and do not abort the run.
pub(crate) async fn run_geocode(config: &AppConfig, postal_codes: &[String]) -> anyhow::Result<()> {
    let client = GeocoderClient::new(GeocoderSettings::from_app_config(config))?;

    let lines: Vec<String> = stream::iter(postal_codes)
        .map(|raw| {
            let client = &client;
            async move {
                let postal_code = match validate_postal_code(raw) {
                    Ok(code) => code,
                    Err(e) => return format!("{raw:<12}error: {e}"),
                };
                match client.geocode_postal_code(&postal_code).await {
                    Ok(point) => format!("{postal_code:<12}{:>11.6}{:>13.6}", point.lat, point.lng),
                    Err(e) if e.is_not_found() => format!("{postal_code:<12}not found"),
                    Err(e) => format!("{postal_code:<12}error: {e}"),
                }
            }
        })
        .buffered(MAX_IN_FLIGHT)
        .collect()
        .await;

    println!("{:<12}{:>11}{:>13}", "POSTAL CODE", "LAT", "LNG");
    for line in lines {
        println!("{line}");
    }
    Ok(())
}
