use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub locations_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub geocoder_base_url: String,
    pub geocoder_country: String,
    pub geocoder_user_agent: String,
    pub geocoder_min_interval_ms: u64,
    pub geocoder_timeout_secs: u64,
    pub geocoder_max_retries: u32,
    pub geocoder_backoff_base_ms: u64,
    /// Radius applied when a search request omits one.
    pub search_default_radius_miles: f64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("locations_path", &self.locations_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("geocoder_base_url", &self.geocoder_base_url)
            .field("geocoder_country", &self.geocoder_country)
            .field("geocoder_user_agent", &self.geocoder_user_agent)
            .field("geocoder_min_interval_ms", &self.geocoder_min_interval_ms)
            .field("geocoder_timeout_secs", &self.geocoder_timeout_secs)
            .field("geocoder_max_retries", &self.geocoder_max_retries)
            .field("geocoder_backoff_base_ms", &self.geocoder_backoff_base_ms)
            .field(
                "search_default_radius_miles",
                &self.search_default_radius_miles,
            )
            .finish()
    }
}
