//! Supported target architectures (spec §6) and host detection (ported
//! from `base.py`'s `getBuildOS`/`getArchitecture`).

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arch {
    LinuxX64,
    LinuxArm,
    LinuxArm64,
    DarwinX64,
    WindowsX64,
}

impl Arch {
    pub const ALL: [Arch; 5] = [
        Arch::LinuxX64,
        Arch::LinuxArm,
        Arch::LinuxArm64,
        Arch::DarwinX64,
        Arch::WindowsX64,
    ];

    /// Architectures that must build natively — cross-building them through
    /// a container image is a `ConfigConflict`.
    pub fn is_native_only(self) -> bool {
        matches!(self, Arch::DarwinX64 | Arch::WindowsX64)
    }

    /// The first `-`-separated segment, e.g. `linux` for `linux-arm64`.
    pub fn base(self) -> &'static str {
        match self {
            Arch::LinuxX64 | Arch::LinuxArm | Arch::LinuxArm64 => "linux",
            Arch::DarwinX64 => "darwin",
            Arch::WindowsX64 => "windows",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Arch::LinuxX64 => "linux-x64",
            Arch::LinuxArm => "linux-arm",
            Arch::LinuxArm64 => "linux-arm64",
            Arch::DarwinX64 => "darwin-x64",
            Arch::WindowsX64 => "windows-x64",
        }
    }

    /// The name used for the per-arch subdirectory under `_builds`/
    /// `_outputs`, where a local build uses `"local"` instead.
    pub fn dir_name(self, local: bool) -> &'static str {
        if local {
            "local"
        } else {
            self.as_str()
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Arch::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| Error::UnknownArch(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for Arch {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<Arch>().map_err(serde::de::Error::custom)
    }
}

/// The host's build OS, as the orchestrator's own environment contract
/// names it (`linux` / `darwin` / `windows`).
pub fn host_os() -> &'static str {
    if cfg!(target_os = "macos") {
        "darwin"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else {
        "linux"
    }
}

/// The host's own `Arch`, used to decide whether a requested build is
/// native or needs a cross-compilation container.
pub fn host_arch() -> Arch {
    let machine = if cfg!(target_arch = "x86_64") {
        "x64"
    } else if cfg!(target_arch = "aarch64") {
        "arm64"
    } else if cfg!(target_arch = "arm") {
        "arm"
    } else {
        "x64"
    };
    match (host_os(), machine) {
        ("darwin", _) => Arch::DarwinX64,
        ("windows", _) => Arch::WindowsX64,
        (_, "arm64") => Arch::LinuxArm64,
        (_, "arm") => Arch::LinuxArm,
        _ => Arch::LinuxX64,
    }
}
