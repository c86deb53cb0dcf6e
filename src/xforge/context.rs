//! The owned context threaded through every phase (Design Notes §9:
//! "Mutable globals → owned context"). Where the original kept
//! `SOURCES_ROOT`/`BUILDS_ROOT`/`OUTPUTS_ROOT` as module constants and
//! `current_rule_group` as a process-global, this crate carries them as
//! plain fields on one value constructed once per run (or once per test
//! case).

use crate::config::Config;
use crate::registry::Registry;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct BuildContext {
    pub registry: Registry,
    pub config: Config,
    /// The directory the orchestrator was invoked from; also `WORK_DIR` in
    /// the script environment contract.
    pub work_dir: PathBuf,
}

impl BuildContext {
    pub fn new(work_dir: impl Into<PathBuf>, config: Config) -> Self {
        BuildContext {
            registry: Registry::new(),
            config,
            work_dir: work_dir.into(),
        }
    }

    pub fn sources_root(&self) -> PathBuf {
        self.work_dir.join(&self.config.sources_root)
    }

    pub fn builds_root(&self) -> PathBuf {
        self.work_dir.join(&self.config.builds_root)
    }

    pub fn outputs_root(&self) -> PathBuf {
        self.work_dir.join(&self.config.outputs_root)
    }

    pub fn source_dir(&self, name: &str) -> PathBuf {
        self.sources_root().join(name)
    }

    pub fn group_dir(&self, group: &str) -> PathBuf {
        self.work_dir.join(group)
    }

    pub fn scripts_dir(&self, group: &str) -> PathBuf {
        self.group_dir(group).join("scripts")
    }

    pub fn patches_dir(&self, group: &str) -> PathBuf {
        self.group_dir(group).join("patches")
    }

    pub fn rules_dir(&self, group: &str) -> PathBuf {
        self.group_dir(group).join("rules")
    }

    pub fn script_path(&self, group: &str, target: &str) -> PathBuf {
        self.scripts_dir(group).join(format!("{target}.sh"))
    }

    pub fn build_dir(&self, arch_dir: &str, target: &str) -> PathBuf {
        self.builds_root().join(arch_dir).join(target)
    }

    pub fn output_dir(&self, arch_dir: &str, target: &str) -> PathBuf {
        self.outputs_root().join(arch_dir).join(target)
    }
}

/// Resolves `work_dir` to an absolute path, matching every `os.path.abspath`
/// call in the original driver.
pub fn absolute(work_dir: &Path) -> std::io::Result<PathBuf> {
    if work_dir.is_absolute() {
        Ok(work_dir.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(work_dir))
    }
}
