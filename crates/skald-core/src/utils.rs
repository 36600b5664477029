//! Shared utility functions for Skald crates

use anyhow::{anyhow, Context};
use camino::Utf8PathBuf;
use std::path::PathBuf;

/// Environment variable that relocates the Skald config directory
pub const SKALD_HOME_ENV: &str = "SKALD_HOME";

/// Get the user's home directory
///
/// `HOME` wins over `dirs::home_dir()` so containers and test harnesses can
/// relocate it.
pub fn get_home_dir() -> anyhow::Result<PathBuf> {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => Ok(PathBuf::from(home)),
        _ => dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory")),
    }
}

/// Directory holding `updater.yaml`: `$SKALD_HOME`, else `~/.skald`
pub fn skald_home_dir() -> anyhow::Result<Utf8PathBuf> {
    let dir = match std::env::var_os(SKALD_HOME_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => get_home_dir()?.join(".skald"),
    };

    Utf8PathBuf::from_path_buf(dir)
        .map_err(|p| anyhow!("non UTF-8 config directory: {}", p.display()))
        .context("resolving Skald config directory")
}
