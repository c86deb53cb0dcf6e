//! The Cache Gate (spec §4.H): decides, for each target in resolved order,
//! whether the Build Executor needs to run at all, and is the only place
//! that writes `Target.hash`/`Target.built`.

use crate::arch::Arch;
use crate::build::{self, StepOptions};
use crate::context::BuildContext;
use crate::errors::{Error, Result};
use crate::hash;
use std::fs;
use std::io;

pub struct RunOptions {
    pub arch: Arch,
    pub prefix: String,
    pub local: bool,
    pub nproc: u32,
    pub no_clean: bool,
    pub force: bool,
    /// Whether this build runs natively, as decided once per invocation by
    /// [`crate::build::exec::plan`] — every target in a single `build`
    /// pass shares the same arch and `local` flag, so the native/container
    /// choice never varies target to target.
    pub native: bool,
}

/// Runs every target named in `order`, in order, applying the cache gate
/// to each.
pub fn run_all(ctx: &mut BuildContext, order: &[String], opts: &RunOptions) -> Result<()> {
    for name in order {
        build_one(ctx, name, opts)?;
    }
    Ok(())
}

fn arch_dir(opts: &RunOptions) -> String {
    if opts.local {
        "local".to_string()
    } else {
        opts.arch.as_str().to_string()
    }
}

fn build_one(ctx: &mut BuildContext, name: &str, opts: &RunOptions) -> Result<()> {
    let target = ctx
        .registry
        .target(name)
        .unwrap_or_else(|| panic!("resolved order only names registered targets, got `{name}`"))
        .clone();

    let cascade = target
        .dependencies
        .iter()
        .any(|dep| ctx.registry.target(dep).map_or(false, |d| d.built));

    let fingerprint = hash::fingerprint(ctx, &target, &opts.prefix)?;

    let arch_dir = arch_dir(opts);
    let sidecar_path = ctx.output_dir(&arch_dir, name).join(".hash");
    let cached = fs::read_to_string(&sidecar_path).ok();

    if !opts.force && !cascade && cached.as_deref() == Some(fingerprint.as_str()) {
        log::info!("[{name}] skipping, up to date");
        return Ok(());
    }

    let step = StepOptions {
        arch: opts.arch,
        arch_dir: arch_dir.clone(),
        prefix: opts.prefix.clone(),
        local: opts.local,
        nproc: opts.nproc,
        no_clean: opts.no_clean,
        native: opts.native,
    };
    let staged = build::run(ctx, &target, &step)?;

    fs::write(&sidecar_path, &fingerprint).map_err(|e| Error::FsError {
        operation: "write",
        path: sidecar_path.clone(),
        source: e,
    })?;

    if !opts.no_clean && !target.package {
        xforge_util::paths::remove_dir_all_if_exists(&staged.build_dir).map_err(|e| Error::FsError {
            operation: "clean",
            path: staged.build_dir.clone(),
            source: io::Error::new(io::ErrorKind::Other, e.to_string()),
        })?;
    }

    let stored = ctx.registry.target_mut(name).expect("checked above");
    stored.hash = Some(fingerprint);
    stored.built = true;
    Ok(())
}
