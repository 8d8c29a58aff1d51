use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can feed a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_radius = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(invalid(var, format!("must be a positive number, got {value}")))
        }
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("FARMFINDER_ENV", "development"))?;

    let bind_addr = parse_addr("FARMFINDER_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("FARMFINDER_LOG_LEVEL", "info");
    let locations_path = PathBuf::from(or_default(
        "FARMFINDER_LOCATIONS_PATH",
        "./config/locations.yaml",
    ));

    let db_max_connections = parse_u32("FARMFINDER_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("FARMFINDER_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("FARMFINDER_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let geocoder_base_url = or_default(
        "FARMFINDER_GEOCODER_BASE_URL",
        "https://nominatim.openstreetmap.org",
    );
    let geocoder_country = or_default("FARMFINDER_GEOCODER_COUNTRY", "USA");
    let geocoder_user_agent = or_default(
        "FARMFINDER_GEOCODER_USER_AGENT",
        "farmfinder/0.1 (location-search)",
    );
    let geocoder_min_interval_ms = parse_u64("FARMFINDER_GEOCODER_MIN_INTERVAL_MS", "1000")?;
    let geocoder_timeout_secs = parse_u64("FARMFINDER_GEOCODER_TIMEOUT_SECS", "10")?;
    let geocoder_max_retries = parse_u32("FARMFINDER_GEOCODER_MAX_RETRIES", "2")?;
    let geocoder_backoff_base_ms = parse_u64("FARMFINDER_GEOCODER_BACKOFF_BASE_MS", "500")?;

    let search_default_radius_miles =
        parse_radius("FARMFINDER_SEARCH_DEFAULT_RADIUS_MILES", "50")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        locations_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        geocoder_base_url,
        geocoder_country,
        geocoder_user_agent,
        geocoder_min_interval_ms,
        geocoder_timeout_secs,
        geocoder_max_retries,
        geocoder_backoff_base_ms,
        search_default_radius_miles,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FARMFINDER_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
