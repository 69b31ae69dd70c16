use crate::core::{CuisinePolicy, ExtractionMode, DEFAULT_RADIUS_M, DEFAULT_RESULT_COUNT};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Well-known variable holding the inference router token
pub const INFERENCE_KEY_VAR: &str = "HF_INFERENCE_KEY";
/// Well-known variable holding the Google Maps key
pub const MAPS_KEY_VAR: &str = "GOOGLE_MAPS_API_KEY";

/// Largest radius the Places text search accepts
const MAX_RADIUS_M: u32 = 50_000;

/// Errors that prevent the service from starting
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingSecrets(Vec<&'static str>),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub inference: InferenceSettings,
    #[serde(default)]
    pub places: PlacesSettings,
    #[serde(default)]
    pub planner: PlannerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_inference_url")]
    pub base_url: String,
    #[serde(default = "default_serializer_model")]
    pub serializer_model: String,
    #[serde(default = "default_ranking_model")]
    pub ranking_model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_inference_url(),
            serializer_model: default_serializer_model(),
            ranking_model: default_ranking_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_inference_url() -> String { "https://router.huggingface.co/v1".to_string() }
fn default_serializer_model() -> String { "HuggingFaceTB/SmolLM3-3B".to_string() }
fn default_ranking_model() -> String { "Qwen/Qwen3-Next-80B-A3B-Instruct".to_string() }
fn default_timeout_secs() -> u64 { 60 }

#[derive(Debug, Clone, Deserialize)]
pub struct PlacesSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_maps_url")]
    pub base_url: String,
    #[serde(default = "default_places_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PlacesSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_maps_url(),
            timeout_secs: default_places_timeout_secs(),
        }
    }
}

fn default_maps_url() -> String { "https://maps.googleapis.com/maps/api".to_string() }
fn default_places_timeout_secs() -> u64 { 15 }

/// Planning behaviour knobs
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerSettings {
    #[serde(default = "default_result_count")]
    pub default_result_count: usize,
    #[serde(default = "default_radius_m")]
    pub default_radius_m: u32,
    #[serde(default = "default_dietary_qualifier")]
    pub dietary_qualifier: String,
    #[serde(default)]
    pub cuisine_policy: CuisinePolicy,
    #[serde(default = "default_cuisine")]
    pub default_cuisine: String,
    #[serde(default)]
    pub extraction_mode: ExtractionMode,
    #[serde(default)]
    pub parallel_cuisines: bool,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            default_result_count: default_result_count(),
            default_radius_m: default_radius_m(),
            dietary_qualifier: default_dietary_qualifier(),
            cuisine_policy: CuisinePolicy::default(),
            default_cuisine: default_cuisine(),
            extraction_mode: ExtractionMode::default(),
            parallel_cuisines: false,
        }
    }
}

fn default_result_count() -> usize { DEFAULT_RESULT_COUNT }
fn default_radius_m() -> u32 { DEFAULT_RADIUS_M }
fn default_dietary_qualifier() -> String { "halal".to_string() }
fn default_cuisine() -> String { "American".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration files (config/default.toml, then config/local.toml)
    /// 3. Environment variables (prefixed with PLANNER__)
    /// 4. HF_INFERENCE_KEY and GOOGLE_MAPS_API_KEY
    pub fn load() -> Result<Self, ConfigurationError> {
        Self::build(
            Config::builder()
                .add_source(File::with_name("config/default").required(false))
                // Development overrides
                .add_source(File::with_name("config/local").required(false)),
        )
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        Self::build(Config::builder().add_source(File::from(path.as_ref())))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigurationError> {
        // e.g., PLANNER__SERVER__PORT -> server.port
        let settings = builder
            .add_source(
                Environment::with_prefix("PLANNER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = substitute_secrets(settings)?;
        Ok(settings.try_deserialize()?)
    }

    /// Check that every credential the pipeline needs is present and the
    /// planner defaults are usable
    ///
    /// All missing variables are reported at once.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut missing = Vec::new();
        if self.inference.api_key.trim().is_empty() {
            missing.push(INFERENCE_KEY_VAR);
        }
        if self.places.api_key.trim().is_empty() {
            missing.push(MAPS_KEY_VAR);
        }

        if !missing.is_empty() {
            return Err(ConfigurationError::MissingSecrets(missing));
        }

        if self.planner.default_result_count == 0 {
            return Err(ConfigurationError::Invalid(
                "planner.default_result_count must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_RADIUS_M).contains(&self.planner.default_radius_m) {
            return Err(ConfigurationError::Invalid(format!(
                "planner.default_radius_m must be between 1 and {}",
                MAX_RADIUS_M
            )));
        }

        Ok(())
    }
}

/// Apply the well-known secret variables on top of everything else
fn substitute_secrets(settings: Config) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(settings);

    if let Some(key) = non_empty_env(INFERENCE_KEY_VAR) {
        builder = builder.set_override("inference.api_key", key)?;
    }
    if let Some(key) = non_empty_env(MAPS_KEY_VAR) {
        builder = builder.set_override("places.api_key", key)?;
    }

    builder.build()
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
