//! The Hasher (spec §4.F): SHA-256 fingerprint over the full input closure
//! of a target. Determinism rests on three things the implementation must
//! get right: explicit sorting of every name list, byte-exact reads of
//! patch/script contents, and omitting (not stubbing) the hash of a
//! dependency the resolver skipped for this architecture.

use crate::context::BuildContext;
use crate::errors::{Error, Result};
use crate::model::Target;
use sha2::{Digest, Sha256};
use std::io;

/// Computes `target`'s fingerprint for install prefix `prefix`. Requires
/// every named source to already have a resolved `hash` (the VCS puller
/// must have run first); a missing source hash is a programming error in
/// the caller, not a recoverable condition, so it surfaces as
/// `Error::VcsFailure` rather than silently hashing an empty string.
pub fn fingerprint(ctx: &BuildContext, target: &Target, prefix: &str) -> Result<String> {
    let mut lines: Vec<String> = Vec::new();

    let mut sources: Vec<&String> = target.sources.iter().collect();
    sources.sort();
    for name in sources {
        let source = ctx.registry.source(name).ok_or_else(|| Error::VcsFailure {
            name: name.clone(),
            operation: "hash",
            source: anyhow::anyhow!("source `{name}` was never registered"),
        })?;
        let hash = source.hash.clone().ok_or_else(|| Error::VcsFailure {
            name: name.clone(),
            operation: "hash",
            source: anyhow::anyhow!(
                "source `{name}` has no resolved revision; the VCS puller must run before hashing"
            ),
        })?;
        lines.push(hash);
    }

    let mut deps: Vec<&String> = target.dependencies.iter().collect();
    deps.sort();
    for name in deps {
        if let Some(dep) = ctx.registry.target(name) {
            if let Some(hash) = &dep.hash {
                lines.push(hash.clone());
            }
            // An absent dependency hash means the resolver skipped it for
            // this architecture; it is omitted, never an empty string.
        }
    }

    let mut patches: Vec<&String> = target.patches.iter().collect();
    patches.sort();
    for patch in patches {
        let path = ctx.patches_dir(&target.group).join(patch);
        let bytes = std::fs::read(&path).map_err(|e| fs_error("read", &path, e))?;
        lines.push(hex::encode(Sha256::digest(&bytes)));
    }

    let script_path = ctx.script_path(&target.group, &target.name);
    let script = std::fs::read_to_string(&script_path).map_err(|e| fs_error("read", &script_path, e))?;
    lines.push(hex::encode(Sha256::digest(script.as_bytes())));

    lines.push(prefix.to_string());

    Ok(hex::encode(Sha256::digest(lines.join("\n").as_bytes())))
}

fn fs_error(operation: &'static str, path: &std::path::Path, source: io::Error) -> Error {
    Error::FsError {
        operation,
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{Source, Vcs};
    use std::fs;
    use tempfile::tempdir;

    fn make_target(group: &str, name: &str) -> Target {
        Target {
            name: name.to_string(),
            group: group.to_string(),
            sources: vec![],
            dependencies: vec![],
            resources: vec![],
            patches: vec![],
            arch: vec![],
            package: false,
            license_url: None,
            license_file: None,
            hash: None,
            built: false,
        }
    }

    fn setup(tmp: &tempfile::TempDir) -> BuildContext {
        let mut ctx = BuildContext::new(tmp.path(), Config::default());
        fs::create_dir_all(ctx.scripts_dir("g")).unwrap();
        fs::create_dir_all(ctx.patches_dir("g")).unwrap();
        fs::write(ctx.script_path("g", "a"), "echo building\n").unwrap();
        ctx
    }

    #[test]
    fn fingerprint_is_independent_of_declaration_order() {
        let tmp = tempdir().unwrap();
        let mut ctx = setup(&tmp);
        let mut s1 = Source::new("s1", Vcs::Git, "u1", "r1");
        s1.hash = Some("hash1".to_string());
        let mut s2 = Source::new("s2", Vcs::Git, "u2", "r2");
        s2.hash = Some("hash2".to_string());
        ctx.registry.define_source(s1);
        ctx.registry.define_source(s2);

        let mut t1 = make_target("g", "a");
        t1.sources = vec!["s1".to_string(), "s2".to_string()];
        let mut t2 = make_target("g", "a");
        t2.sources = vec!["s2".to_string(), "s1".to_string()];

        let h1 = fingerprint(&ctx, &t1, "/usr/local").unwrap();
        let h2 = fingerprint(&ctx, &t2, "/usr/local").unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn fingerprint_changes_with_prefix() {
        let tmp = tempdir().unwrap();
        let ctx = setup(&tmp);
        let t = make_target("g", "a");
        let h1 = fingerprint(&ctx, &t, "/usr/local").unwrap();
        let h2 = fingerprint(&ctx, &t, "/opt").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn fingerprint_changes_with_script_contents() {
        let tmp = tempdir().unwrap();
        let ctx = setup(&tmp);
        let t = make_target("g", "a");
        let h1 = fingerprint(&ctx, &t, "/usr/local").unwrap();
        fs::write(ctx.script_path("g", "a"), "echo different\n").unwrap();
        let h2 = fingerprint(&ctx, &t, "/usr/local").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn fingerprint_changes_with_patch_bytes() {
        let tmp = tempdir().unwrap();
        let mut ctx = setup(&tmp);
        fs::write(ctx.patches_dir("g").join("fix.patch"), b"v1").unwrap();
        let mut t = make_target("g", "a");
        t.patches = vec!["fix.patch".to_string()];
        ctx.registry.define_target(t.clone());
        let h1 = fingerprint(&ctx, &t, "/usr/local").unwrap();
        fs::write(ctx.patches_dir("g").join("fix.patch"), b"v2").unwrap();
        let h2 = fingerprint(&ctx, &t, "/usr/local").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn skipped_dependency_hash_is_omitted_not_empty_string() {
        let tmp = tempdir().unwrap();
        let ctx = setup(&tmp);
        let mut t = make_target("g", "a");
        t.dependencies = vec!["skipped".to_string()];
        // "skipped" is never registered as a target at all, modelling the
        // arch-filtered case from the resolver's point of view.
        let h1 = fingerprint(&ctx, &t, "/usr/local").unwrap();
        let t_without_dep = make_target("g", "a");
        let h2 = fingerprint(&ctx, &t_without_dep, "/usr/local").unwrap();
        assert_eq!(h1, h2);
    }
}
