//! # skald-core
//!
//! Core library for Skald providing:
//! - Updater configuration types and hierarchical loading (updater.yaml)
//! - Retry execution engine with policy-based configuration
//! - Shared error type

pub mod config;
pub mod error;
pub mod retry;
pub mod types;
pub mod utils;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use types::UpdaterConfig;
pub use utils::{get_home_dir, skald_home_dir};
