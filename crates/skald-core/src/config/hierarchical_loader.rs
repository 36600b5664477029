//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. User config (`$SKALD_HOME/updater.yaml`, default ~/.skald)
//! 3. Environment variables (SKALD_* prefix)
//! 4. Caller overrides (applied to the returned value)

use crate::error::{Error, Result};
use crate::types::UpdaterConfig;
use crate::utils::skald_home_dir;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use serde_yaml_ng::Value;
use std::env;
use std::fs;
use std::str::FromStr;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// File name of the user-level updater configuration
const UPDATER_CONFIG_FILE: &str = "updater.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a new hierarchical config loader
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the standard config directory (`$SKALD_HOME` or ~/.skald)
    fn get_config_dir() -> Result<Utf8PathBuf> {
        skald_home_dir().map_err(|e| Error::invalid_config(format!("{:#}", e)))
    }

    /// Load updater configuration with hierarchical precedence
    ///
    /// The user file is merged key by key onto the embedded defaults, so a
    /// file that sets one field of a retry policy keeps the others.
    pub fn load_updater_config(&self) -> Result<UpdaterConfig> {
        let mut layered = Self::load_embedded_config::<Value>("updater-defaults.yaml")?;

        let config_path = self.config_dir.join(UPDATER_CONFIG_FILE);
        if config_path.exists() {
            debug!("Loading updater config from {}", config_path);
            let file_layer = self.load_yaml_file::<Value>(&config_path)?;
            merge_layer(&mut layered, file_layer);
        }

        let mut config: UpdaterConfig = serde_yaml_ng::from_value(layered)?;
        config = self.apply_env_overrides(config)?;
        Self::validate(&config)?;

        Ok(config)
    }

    /// Load an embedded configuration file
    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!("Failed to parse embedded config {}: {}", filename, e))
        })
    }

    /// Load a YAML file and parse it
    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml_ng::from_str(&content)?)
    }

    /// Apply `SKALD_*` environment overrides
    fn apply_env_overrides(&self, mut config: UpdaterConfig) -> Result<UpdaterConfig> {
        if let Some(url) = env_string("SKALD_FEED_URL") {
            config.feed.url = Some(url);
        }
        if let Some(channel) = env_string("SKALD_CHANNEL") {
            config.feed.channel = Some(channel);
        }
        if let Some(arch) = env_string("SKALD_ARCH") {
            config.feed.arch = Some(arch);
        }
        if let Some(agent) = env_string("SKALD_USER_AGENT") {
            config.network.user_agent = agent;
        }

        env_parsed(
            "SKALD_ADD_NO_CACHE_QUERY",
            &mut config.feed.add_no_cache_query,
        )?;
        env_parsed(
            "SKALD_HTTP_TIMEOUT_SECS",
            &mut config.network.http_timeout_secs,
        )?;
        env_parsed(
            "SKALD_CONNECT_TIMEOUT_SECS",
            &mut config.network.connect_timeout_secs,
        )?;
        env_parsed("SKALD_DNS_ENABLED", &mut config.dns.enabled)?;

        Ok(config)
    }

    fn validate(config: &UpdaterConfig) -> Result<()> {
        if let Some(channel) = &config.feed.channel {
            validate_channel_name(channel)?;
        }
        if let Some(arch) = &config.feed.arch {
            validate_arch_name(arch)?;
        }
        Ok(())
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}

/// Merge `overlay` into `base`
///
/// Mappings merge recursively, any other overlay value replaces the base
/// value. A null overlay (an empty section such as `feed:`) changes nothing.
fn merge_layer(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(slot) => merge_layer(slot, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Overwrite `slot` with the parsed value of `key` when the variable is set
fn env_parsed<T: FromStr>(key: &str, slot: &mut T) -> Result<()> {
    let Some(raw) = env_string(key) else {
        return Ok(());
    };
    *slot = raw.trim().parse().map_err(|_| {
        Error::invalid_config(format!(
            "{} has an unparseable value '{}' (expected {})",
            key,
            raw,
            std::any::type_name::<T>()
        ))
    })?;
    debug!(key, "applied environment override");
    Ok(())
}

/// Check that a channel name is usable as a file name and URL path segment
pub fn validate_channel_name(channel: &str) -> Result<()> {
    validate_path_segment("channel", channel)
}

/// Check that an architecture key is usable inside a channel file name
pub fn validate_arch_name(arch: &str) -> Result<()> {
    validate_path_segment("arch", arch)
}

fn validate_path_segment(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid_config(format!("{} must not be empty", kind)));
    }

    let url_safe = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !url_safe || value.starts_with('.') {
        return Err(Error::invalid_config(format!(
            "{} '{}' may only contain ASCII letters, digits, '-', '_' and '.'",
            kind, value
        )));
    }

    Ok(())
}
