//! The declarative data model (spec §3): `Source` and `Target`. Both are
//! plain owned structs — no process-global dictionaries, no interior
//! mutability. Every phase that needs to mutate a `hash` or `built` field
//! takes `&mut Registry` explicitly.

use crate::arch::Arch;
use serde::Deserialize;
use std::fmt;

/// Version-control backend discriminator. Only `Git` has a working
/// `vcs::Puller` implementation; the enum stays open so a rule file that
/// names an unsupported backend fails with a clear parse error rather than
/// silently mis-resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vcs {
    Git,
}

impl fmt::Display for Vcs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vcs::Git => f.write_str("git"),
        }
    }
}

/// An immutable declaration of upstream code, as loaded from a rule file.
/// `hash` starts empty and is populated by the VCS puller.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub vcs: Vcs,
    pub location: String,
    pub revision: String,
    pub hash: Option<String>,
}

impl Source {
    pub fn new(name: impl Into<String>, vcs: Vcs, location: impl Into<String>, revision: impl Into<String>) -> Self {
        Source {
            name: name.into(),
            vcs,
            location: location.into(),
            revision: revision.into(),
            hash: None,
        }
    }
}

/// A declaration of a buildable artifact, as loaded from a rule file, plus
/// the two fields the build pass fills in (`hash`, `built`).
#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    /// The rule group that registered this target; used to locate its
    /// script and patches on disk (`<group>/scripts/<name>.sh`,
    /// `<group>/patches/<file>`).
    pub group: String,
    pub sources: Vec<String>,
    pub dependencies: Vec<String>,
    pub resources: Vec<String>,
    pub patches: Vec<String>,
    /// Empty means "builds for all architectures"; non-empty is a
    /// whitelist.
    pub arch: Vec<Arch>,
    pub package: bool,
    pub license_url: Option<String>,
    pub license_file: Option<String>,
    pub hash: Option<String>,
    pub built: bool,
}

impl Target {
    /// True when `arch` is either unrestricted or whitelists the given
    /// architecture.
    pub fn builds_for(&self, arch: Arch) -> bool {
        self.arch.is_empty() || self.arch.contains(&arch)
    }
}
