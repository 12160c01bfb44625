//! Configuration resolution for Eldercare.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/eldercare/settings.json)
//! 3. Project config (.eldercare/settings.json)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the caller)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::stream::RequestConfig;

/// Complete Eldercare configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub stream: StreamDefaults,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stream: StreamDefaults::default(),
            voice: VoiceConfig::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Defaults applied to every streamed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamDefaults {
    /// Request deadline in milliseconds. `None` means unbounded.
    pub timeout_ms: Option<u64>,
    /// Decode bodies as NDJSON unless the caller says otherwise.
    pub ndjson: bool,
    pub user_agent: String,
}

impl Default for StreamDefaults {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            ndjson: false,
            user_agent: format!("eldercare/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl StreamDefaults {
    /// Seed a [`RequestConfig`] from these defaults.
    pub fn request_config(&self) -> RequestConfig {
        let config = RequestConfig::new().ndjson(self.ndjson);
        match self.timeout_ms {
            Some(ms) => config.timeout_ms(ms),
            None => config,
        }
    }
}

/// Real-time voice session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Bot endpoint the voice client connects to.
    pub endpoint: Option<String>,
    pub enable_mic: bool,
    pub enable_cam: bool,
    /// Interval of the simulated level heartbeat. `None` disables it.
    pub heartbeat_interval_ms: Option<u64>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            enable_mic: true,
            enable_cam: false,
            heartbeat_interval_ms: Some(120),
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    let mut layers = Vec::new();

    // Load global config
    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            layers.push(load_config_file(&global_path)?);
        }
    }

    // Load project config
    if let Some(dir) = project_dir {
        let project_path = dir.join(".eldercare").join("settings.json");
        if project_path.exists() {
            layers.push(load_config_file(&project_path)?);
        }
    }

    let mut config = resolve_layers(layers)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Fold config file layers over the defaults, later layers winning. Only keys
/// present in a layer replace earlier values; an explicit `null` clears an
/// optional setting.
fn resolve_layers(layers: impl IntoIterator<Item = Value>) -> Result<Config> {
    let mut merged = serde_json::to_value(Config::default())?;
    for layer in layers {
        merge_json(&mut merged, layer);
    }
    serde_json::from_value(merged).map_err(|e| Error::Config(format!("Invalid configuration: {e}")))
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|h| PathBuf::from(h).join(".eldercare").join("settings.json"))
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/eldercare/settings.json"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
            .map(|p| p.join("eldercare").join("settings.json"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

fn load_config_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;
    if !value.is_object() {
        return Err(Error::Config(format!(
            "Config file {} must contain a JSON object",
            path.display()
        )));
    }
    Ok(value)
}

fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("ELDERCARE_TIMEOUT_MS") {
        if let Ok(n) = val.parse::<u64>() {
            config.stream.timeout_ms = (n > 0).then_some(n);
        }
    }
    if let Some(val) = var("ELDERCARE_NDJSON") {
        if let Ok(b) = val.parse() {
            config.stream.ndjson = b;
        }
    }
    if let Some(val) = var("ELDERCARE_USER_AGENT") {
        config.stream.user_agent = val;
    }
    if let Some(val) = var("ELDERCARE_VOICE_ENDPOINT") {
        config.voice.endpoint = Some(val);
    }
    if let Some(val) = var("ELDERCARE_LOG_LEVEL") {
        config.log_level = val;
    }
}
