//! Configuration loading and management

mod hierarchical_loader;

pub use hierarchical_loader::{validate_arch_name, validate_channel_name, HierarchicalConfigLoader};
