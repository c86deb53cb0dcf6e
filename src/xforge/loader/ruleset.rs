//! The on-disk schema for a rule file: a TOML document declaring zero or
//! more `[[source]]` and `[[target]]` tables. This is the "small embedded
//! declarative language" Design Notes §9 prefers over a plugin ABI — a
//! rule file can only *declare* data, never execute code, so loading a
//! group of rules is hermetic by construction.

use crate::arch::Arch;
use crate::model::Vcs;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct RuleFile {
    #[serde(rename = "source", default)]
    pub sources: Vec<SourceDecl>,
    #[serde(rename = "target", default)]
    pub targets: Vec<TargetDecl>,
}

#[derive(Debug, Deserialize)]
pub struct SourceDecl {
    pub name: String,
    pub vcs: Vcs,
    pub location: String,
    pub revision: String,
}

#[derive(Debug, Deserialize)]
pub struct TargetDecl {
    pub name: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub patches: Vec<String>,
    #[serde(default)]
    pub arch: Vec<Arch>,
    #[serde(default)]
    pub package: bool,
    #[serde(default)]
    pub license_url: Option<String>,
    #[serde(default)]
    pub license_file: Option<String>,
}
