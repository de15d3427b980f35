use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for po-pilot
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoPilotConfig {
    /// Purchase-order backend settings
    pub backend: BackendConfig,
    /// Reconciliation loop settings
    pub reconciler: ReconcilerConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL of the purchase-order API
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconcilerConfig {
    /// Background poll interval in seconds
    pub poll_interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
}

impl Default for PoPilotConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://127.0.0.1:8000/api".to_string(),
                request_timeout_seconds: 30,
            },
            reconciler: ReconcilerConfig {
                poll_interval_seconds: 15,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl ReconcilerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

impl PoPilotConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (po-pilot.toml)
    /// 3. Environment variables (e.g. PO_PILOT__BACKEND__BASE_URL)
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&PoPilotConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if Path::new("po-pilot.toml").exists() {
            builder = builder.add_source(File::with_name("po-pilot"));
        }

        builder = builder.add_source(
            Environment::with_prefix("PO_PILOT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<PoPilotConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = PoPilotConfig::load_env_file();
        PoPilotConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static PoPilotConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
