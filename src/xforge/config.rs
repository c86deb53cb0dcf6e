//! Optional `xforge.toml` configuration (SPEC_FULL.md §9 "Configuration").
//! Everything here has a sensible default so the orchestrator runs with
//! zero configuration, exactly like the original's hard-coded
//! `_sources`/`_builds`/`_outputs` roots — this module just makes those
//! roots (and the container image template, and the default parallelism
//! hint) overridable without recompiling.

use anyhow::Context as _;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources_root: PathBuf,
    pub builds_root: PathBuf,
    pub outputs_root: PathBuf,
    /// Parallelism hint exposed to scripts as `NPROC`, used when `--nproc`
    /// is not passed on the CLI.
    pub nproc: u32,
    /// `{arch}` is substituted with the requested architecture, e.g.
    /// `yosyshq/cross-{arch}:1.0`.
    pub container_image_template: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sources_root: PathBuf::from("_sources"),
            builds_root: PathBuf::from("_builds"),
            outputs_root: PathBuf::from("_outputs"),
            nproc: default_nproc(),
            container_image_template: "yosyshq/cross-{arch}:1.0".to_string(),
        }
    }
}

fn default_nproc() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

impl Config {
    /// Loads `xforge.toml` from `dir` if present; falls back to defaults
    /// otherwise. A present-but-malformed file is a fatal error — there is
    /// no silent partial-config fallback.
    pub fn load(dir: &Path) -> anyhow::Result<Config> {
        let path = dir.join("xforge.toml");
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn container_image(&self, arch: &str) -> String {
        self.container_image_template.replace("{arch}", arch)
    }
}
