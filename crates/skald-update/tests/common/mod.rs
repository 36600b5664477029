//! Common test infrastructure for skald-update tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `constants`: Hosts, versions, file names and addresses
//! - `builders`: Fluent builder for metadata documents
//! - `mock_server`: Wiremock setup helpers for channel files
//! - `transports`: Scripted transport and resolvers for fetch tests

// Not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod constants;
pub mod mock_server;
pub mod transports;

pub use builders::*;
pub use constants::*;
pub use mock_server::*;
pub use transports::*;

/// Install a test subscriber so `RUST_LOG=debug` shows fetch logs
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
