use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/guardian/guardian.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub simulator: SimulatorConfig,
    pub insights: InsightsConfig,
    pub store: StoreConfig,
    pub pairing: PairingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub interval_secs: u64,
    pub alert_probability: f64,
    pub alert_threshold_bpm: u32,
    pub heart_rate_min: u32,
    pub heart_rate_max: u32,
    /// Half-width of the uniform heart-rate perturbation per tick.
    pub heart_rate_jitter: f64,
    /// Exclusive upper bound of the per-tick step increment.
    pub max_step_increment: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            alert_probability: 0.05,
            alert_threshold_bpm: 95,
            heart_rate_min: 60,
            heart_rate_max: 100,
            heart_rate_jitter: 2.0,
            max_step_increment: 15,
        }
    }
}

impl SimulatorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8090/v1/chat/completions".to_string(),
            model: "google/gemini-2.5-flash".to_string(),
            api_key: None,
            timeout_ms: 30_000,
        }
    }
}

impl InsightsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite file; `None` keeps members in an in-memory database.
    pub db_path: Option<PathBuf>,
    pub default_user_id: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            default_user_id: "local-caregiver".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    pub delay_ms: u64,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self { delay_ms: 2_500 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Config path: the explicit one, then `GUARDIAN_CONFIG`, then the
    /// system default.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var_os("GUARDIAN_CONFIG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load `path`, or defaults when it does not exist, then apply
    /// environment overrides and validate.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            Self::from_toml(&raw)
                .with_context(|| format!("invalid config {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)?;
        Ok(config)
    }

    /// `LLM_ENDPOINT` and `LLM_MODEL` replace their file values.
    /// `LLM_API_KEY`, then `OPENAI_API_KEY`, replace the file key.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup("LLM_ENDPOINT") {
            self.insights.endpoint = endpoint;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.insights.model = model;
        }
        if let Some(key) = lookup("LLM_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.insights.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulator;
        if sim.interval_secs == 0 {
            bail!("simulator.interval_secs must be at least 1");
        }
        if !(0.0..=1.0).contains(&sim.alert_probability) {
            bail!(
                "simulator.alert_probability must be within [0, 1], got {}",
                sim.alert_probability
            );
        }
        if sim.heart_rate_min > sim.heart_rate_max {
            bail!(
                "simulator.heart_rate_min ({}) exceeds heart_rate_max ({})",
                sim.heart_rate_min,
                sim.heart_rate_max
            );
        }
        if sim.max_step_increment == 0 {
            bail!("simulator.max_step_increment must be at least 1");
        }
        if !sim.heart_rate_jitter.is_finite() || sim.heart_rate_jitter < 0.0 {
            bail!(
                "simulator.heart_rate_jitter must be a finite, non-negative number, got {}",
                sim.heart_rate_jitter
            );
        }
        Ok(())
    }
}
