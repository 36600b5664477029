//! Platform and architecture detection
//!
//! The metadata document names architectures with short keys (`x64`,
//! `ia32`, `arm64`, `armv7l`). These types map the compile-time target onto
//! those keys and decide the channel file prefix for each platform family.

use std::fmt;
use std::str::FromStr;

/// Operating system family the update is resolved for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// Platform of the running binary
    ///
    /// Unknown targets are treated as Linux.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Whether metadata for this platform may carry an installer package map
    pub fn supports_packages(&self) -> bool {
        matches!(self, Platform::Windows)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Windows => "windows",
            Platform::MacOs => "mac",
            Platform::Linux => "linux",
        };
        write!(f, "{}", name)
    }
}

/// CPU architecture, keyed the way the metadata document keys packages
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    X64,
    Ia32,
    Arm64,
    Armv7l,
    /// Any other architecture, kept verbatim
    Other(String),
}

impl Arch {
    /// Key used when the exact architecture has no package
    pub const FALLBACK_PACKAGE_KEY: &'static str = "ia32";

    /// Architecture of the running binary
    pub fn current() -> Self {
        match std::env::consts::ARCH {
            "x86_64" => Arch::X64,
            "x86" => Arch::Ia32,
            "aarch64" => Arch::Arm64,
            "arm" => Arch::Armv7l,
            other => Arch::Other(other.to_string()),
        }
    }

    /// Document key for this architecture
    pub fn key(&self) -> &str {
        match self {
            Arch::X64 => "x64",
            Arch::Ia32 => "ia32",
            Arch::Arm64 => "arm64",
            Arch::Armv7l => "armv7l",
            Arch::Other(name) => name,
        }
    }
}

impl FromStr for Arch {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "x64" | "x86_64" | "amd64" => Arch::X64,
            "ia32" | "x86" | "i686" => Arch::Ia32,
            "arm64" | "aarch64" => Arch::Arm64,
            "armv7l" | "arm" => Arch::Armv7l,
            other => Arch::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Platform and architecture pair an update check resolves for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeTarget {
    pub platform: Platform,
    pub arch: Arch,
}

impl RuntimeTarget {
    pub fn new(platform: Platform, arch: Arch) -> Self {
        Self { platform, arch }
    }

    /// Target of the running binary
    pub fn current() -> Self {
        Self::new(Platform::current(), Arch::current())
    }

    /// Channel file prefix for this target
    ///
    /// Linux appends the architecture unless it is x64, macOS uses `-mac`
    /// and Windows uses no prefix at all.
    pub fn channel_prefix(&self) -> String {
        match self.platform {
            Platform::Windows => String::new(),
            Platform::MacOs => "-mac".to_string(),
            Platform::Linux => match self.arch {
                Arch::X64 => "-linux".to_string(),
                ref arch => format!("-linux-{}", arch.key()),
            },
        }
    }
}

impl Default for RuntimeTarget {
    fn default() -> Self {
        Self::current()
    }
}
