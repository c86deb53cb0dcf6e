//! The closed set of fatal error kinds the orchestrator can produce (spec
//! §7). Every fallible operation in this crate returns `Result<T, Error>`;
//! there is no local recovery from any of these — the caller's job is to
//! print one line and exit non-zero. Warnings (`SourceUnused`,
//! `TargetOverride`, `ArchSkip`) are not part of this enum: they are
//! `log::warn!` calls, because nothing downstream ever needs to react to
//! them programmatically.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to evaluate rule file {path}: {source}")]
    RuleEvaluation {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("unknown {kind} `{name}` referenced by target `{target}`")]
    UnknownReference {
        kind: ReferenceKind,
        name: String,
        target: String,
    },

    #[error("target `{target}` {relation} itself")]
    SelfReference { target: String, relation: &'static str },

    #[error("target `{target}` references patch `{patch}`, which does not exist under {path}")]
    MissingPatch {
        target: String,
        patch: String,
        path: PathBuf,
    },

    #[error("circular reference detected: {0} -> {1}")]
    Cycle(String, String),

    #[error("target `{0}` does not exist")]
    UnknownTarget(String),

    #[error("architecture `{0}` does not exist")]
    UnknownArch(String),

    #[error("failed to {operation} source `{name}`: {source}")]
    VcsFailure {
        name: String,
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("{0}")]
    ConfigConflict(String),

    #[error("build script for target `{target}` returned exit code {code}")]
    ScriptFailure { target: String, code: i32 },

    #[error("failed to {operation} {path}: {source}")]
    FsError {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Source,
    Dependency,
    Resource,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReferenceKind::Source => "source",
            ReferenceKind::Dependency => "dependency",
            ReferenceKind::Resource => "resource",
        };
        f.write_str(s)
    }
}
