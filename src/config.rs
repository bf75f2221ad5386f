use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::crypto::codec::MasterKey;
use crate::crypto::generator;

/// Upper bound for `vault.session_timeout_seconds`: one year. chrono's
/// duration arithmetic panics far past this, so anything larger is
/// refused at startup instead.
pub const MAX_SESSION_TIMEOUT_SECONDS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub vault: VaultConfig,

    pub security: SecurityConfig,

    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/callvault.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Master encryption key as 64 hex characters (32 bytes).
    /// Left empty here on purpose; set it via the `VAULT_MASTER_KEY`
    /// environment variable or generate one with `callvault gen-key`.
    pub master_key: String,

    /// Unlock session lifetime in seconds (default: 300)
    pub session_timeout_seconds: u64,

    /// Length of generated passwords (default: 12, minimum 4)
    pub generated_password_length: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            master_key: String::new(),
            session_timeout_seconds: 300,
            generated_password_length: generator::DEFAULT_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    /// Lower values reduce memory usage but decrease GPU resistance.
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations) - higher = more CPU work
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Seconds between session expiry sweeps (default: 60)
    pub sweep_interval_seconds: u64,

    /// Optional cron expression overriding the interval sweep
    pub cron_expression: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_seconds: 60,
            cron_expression: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            vault: VaultConfig::default(),
            security: SecurityConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.apply_env_overrides();
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("VAULT_MASTER_KEY")
            && !key.is_empty()
        {
            self.vault.master_key = key;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("callvault").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".callvault").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    /// Fatal startup checks; a process serving vault operations must not
    /// come up with a malformed key or a zero-length session window.
    pub fn validate(&self) -> Result<()> {
        if self.vault.master_key.is_empty() {
            anyhow::bail!(
                "Vault master key is not configured; set VAULT_MASTER_KEY or vault.master_key"
            );
        }

        if MasterKey::from_hex(&self.vault.master_key).is_err() {
            anyhow::bail!(
                "Vault master key must be exactly 64 hex characters (got {})",
                self.vault.master_key.len()
            );
        }

        if self.vault.session_timeout_seconds == 0 {
            anyhow::bail!("Vault session timeout must be > 0 seconds");
        }

        if self.vault.session_timeout_seconds > MAX_SESSION_TIMEOUT_SECONDS {
            anyhow::bail!(
                "Vault session timeout must be at most {MAX_SESSION_TIMEOUT_SECONDS} seconds (one year)"
            );
        }

        if self.vault.generated_password_length < generator::MIN_LENGTH {
            anyhow::bail!(
                "Generated password length must be at least {}",
                generator::MIN_LENGTH
            );
        }

        if self.scheduler.enabled
            && self.scheduler.sweep_interval_seconds == 0
            && self.scheduler.cron_expression.is_none()
        {
            anyhow::bail!("Scheduler sweep interval must be > 0 or cron expression must be set");
        }

        Ok(())
    }

    /// Parses the configured master key. Call after `validate()`, or
    /// handle the error where startup failure is acceptable.
    pub fn master_key(&self) -> Result<MasterKey> {
        MasterKey::from_hex(&self.vault.master_key)
            .map_err(|e| anyhow::anyhow!("Invalid vault master key: {e}"))
    }
}
