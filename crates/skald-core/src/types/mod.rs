//! Type definitions for Skald configuration

mod runtime_config;

pub use runtime_config::*;
