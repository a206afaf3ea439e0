use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Subdirectory of the data folder that holds one JSON file per crate.
pub const CRATES_SUBDIR: &str = "cases";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrateConfig {
    /// Plugin data folder. Crate files live in `<data_dir>/cases`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Seconds before the first sweep after startup.
    #[serde(default = "default_sweep_delay")]
    pub sweep_delay_secs: u64,
    /// Seconds between sweeps. 0 = never sweep (shutdown flush still runs).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Play the roulette animation instead of handing out rewards instantly.
    #[serde(default = "default_animation")]
    pub animation: bool,
    /// Upper bound for a single key grant.
    #[serde(default = "default_max_key_grant")]
    pub max_key_grant: u32,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("plugins/SimpleCase")
}

fn default_sweep_delay() -> u64 {
    30
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_animation() -> bool {
    true
}

fn default_max_key_grant() -> u32 {
    10_000
}

impl Default for CrateConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sweep_delay_secs: default_sweep_delay(),
            sweep_interval_secs: default_sweep_interval(),
            animation: default_animation(),
            max_key_grant: default_max_key_grant(),
        }
    }
}

impl CrateConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Parse the JSON config a host hands to `Plugin::load_config`.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn crates_dir(&self) -> PathBuf {
        self.data_dir.join(CRATES_SUBDIR)
    }

    pub fn sweep_delay(&self) -> Duration {
        Duration::from_secs(self.sweep_delay_secs)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}
