//! Shared constants for test infrastructure

use std::net::{IpAddr, Ipv4Addr};

// Hosts
pub const FEED_HOST: &str = "updates.example.test";
pub const CDN_HOST: &str = "cdn.example.net";
pub const FEED_BASE: &str = "https://updates.example.test/app";

// Addresses
pub const PINNED_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5));
pub const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

// Versions
pub const VERSION_1_0_0: &str = "1.0.0";
pub const VERSION_2_1_0: &str = "2.1.0";

// Channel files
pub const LATEST_YML: &str = "latest.yml";
pub const BETA_YML: &str = "beta.yml";

// Release files
pub const SETUP_EXE: &str = "App-Setup-2.1.0.exe";
pub const BLOCKMAP: &str = "App-Setup-2.1.0.exe.blockmap";
pub const PACKAGE_X64: &str = "App-2.1.0-x64.nsis.7z";
pub const PACKAGE_IA32: &str = "App-2.1.0-ia32.nsis.7z";
pub const PACKAGE_ARM64: &str = "App-2.1.0-arm64.nsis.7z";

/// Path of the fixtures directory
pub fn fixtures_dir() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Read a fixture file
pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixtures_dir().join(name))
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", name, e))
}
