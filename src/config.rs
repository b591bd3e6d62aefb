use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_FORECAST_SERVICE_URL: &str = "http://localhost:8000";

/// Tunables for the reorder advisor
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ReorderConfig {
    /// Urgency score at or above which a suggestion counts as urgent
    #[serde(default = "default_urgent_threshold")]
    #[validate(range(min = 0.0, max = 10.0))]
    pub urgent_threshold: f64,

    /// Maximum number of alerts raised per advisor run
    #[serde(default = "default_max_alerts")]
    pub max_alerts: usize,

    /// Trailing window (days) used for the sales velocity average
    #[serde(default = "default_sales_window_days")]
    #[validate(range(min = 1, max = 365))]
    pub sales_window_days: u32,

    /// Days added to the lead time to form the forecast horizon
    #[serde(default = "default_safety_buffer_days")]
    #[validate(range(max = 365))]
    pub safety_buffer_days: u32,

    /// Lead time used when neither the supplier nor the item define one
    #[serde(default = "default_lead_time_days")]
    #[validate(range(max = 365))]
    pub default_lead_time_days: u32,

    /// Urgency assigned to items whose calculation degraded
    #[serde(default = "default_degraded_urgency")]
    #[validate(range(min = 0.0, max = 10.0))]
    pub degraded_urgency: f64,

    /// Per-query timeout for data-store calls made by the advisor (milliseconds)
    #[serde(default = "default_query_timeout_ms")]
    #[validate(range(min = 1))]
    pub query_timeout_ms: u64,

    /// Number of items calculated concurrently
    #[serde(default = "default_max_concurrency")]
    #[validate(range(min = 1, max = 256))]
    pub max_concurrency: usize,

    /// Run the advisor periodically every N seconds (disabled when unset)
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            urgent_threshold: default_urgent_threshold(),
            max_alerts: default_max_alerts(),
            sales_window_days: default_sales_window_days(),
            safety_buffer_days: default_safety_buffer_days(),
            default_lead_time_days: default_lead_time_days(),
            degraded_urgency: default_degraded_urgency(),
            query_timeout_ms: default_query_timeout_ms(),
            max_concurrency: default_max_concurrency(),
            interval_secs: None,
        }
    }
}

impl ReorderConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Event channel capacity for async event processing
    #[serde(default = "default_event_channel_capacity")]
    #[validate(range(min = 1))]
    pub event_channel_capacity: usize,

    /// Base URL of the forecasting microservice
    #[serde(default = "default_forecast_service_url")]
    #[validate(url)]
    pub forecast_service_url: String,

    /// Request timeout for the forecasting microservice (seconds)
    #[serde(default = "default_forecast_timeout_secs")]
    #[validate(range(min = 1))]
    pub forecast_timeout_secs: u64,

    /// Where notification events are POSTed (disabled when unset)
    #[serde(default)]
    #[validate(url)]
    pub notification_webhook_url: Option<String>,

    /// HMAC secret used to sign notification webhooks
    #[serde(default)]
    pub notification_webhook_secret: Option<String>,

    /// Reorder advisor tunables
    #[serde(default)]
    #[validate]
    pub reorder: ReorderConfig,
}

impl AppConfig {
    /// Creates a new configuration with defaults for everything but the essentials
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            forecast_service_url: default_forecast_service_url(),
            forecast_timeout_secs: default_forecast_timeout_secs(),
            notification_webhook_url: None,
            notification_webhook_secret: None,
            reorder: ReorderConfig::default(),
        }
    }

    /// Gets database URL reference
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    pub fn forecast_timeout(&self) -> Duration {
        Duration::from_secs(self.forecast_timeout_secs)
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if self.db_min_connections > self.db_max_connections {
            let mut err = ValidationError::new("db_min_connections");
            err.message = Some("db_min_connections must not exceed db_max_connections".into());
            errors.add("db_min_connections", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    16
}
fn default_db_min_connections() -> u32 {
    2
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_forecast_service_url() -> String {
    DEFAULT_FORECAST_SERVICE_URL.to_string()
}

fn default_forecast_timeout_secs() -> u64 {
    30
}

fn default_urgent_threshold() -> f64 {
    7.0
}
fn default_max_alerts() -> usize {
    5
}
fn default_sales_window_days() -> u32 {
    30
}
fn default_safety_buffer_days() -> u32 {
    14
}
fn default_lead_time_days() -> u32 {
    7
}
fn default_degraded_urgency() -> f64 {
    5.0
}
fn default_query_timeout_ms() -> u64 {
    5_000
}
fn default_max_concurrency() -> usize {
    8
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("smart_inventory_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://inventory.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
