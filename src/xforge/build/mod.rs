//! Directory staging (spec §4.G "Directory staging"), tying the
//! environment contract (`env.rs`) and script invocation (`exec.rs`)
//! together into the single per-target build step the Cache Gate calls.

pub mod env;
pub mod exec;

use crate::arch::Arch;
use crate::context::BuildContext;
use crate::errors::{Error, Result};
use crate::model::Target;
use crate::resolver;
use std::io;
use std::path::{Path, PathBuf};
use xforge_util::paths::{mirror_copy, remove_dir_all_if_exists};

pub struct StepOptions {
    pub arch: Arch,
    pub arch_dir: String,
    pub prefix: String,
    pub local: bool,
    pub nproc: u32,
    pub no_clean: bool,
    pub native: bool,
}

/// The directories left behind by a completed step. `build_dir` is handed
/// back so the Cache Gate can delete it afterwards without recomputing the
/// path; for a package target it names a directory this step never writes
/// to (the package stages into `output_dir` instead), and the Cache Gate
/// never deletes it because it checks `target.package` itself.
pub struct Staged {
    pub build_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Stages `target`'s input tree, composes its environment, and runs its
/// build script. Does not touch the `.hash` sidecar or `Target.built` —
/// that is the Cache Gate's job, once this returns successfully.
pub fn run(ctx: &BuildContext, target: &Target, opts: &StepOptions) -> Result<Staged> {
    let output_dir = ctx.output_dir(&opts.arch_dir, &target.name);
    fs_remove(&output_dir)?;
    fs_create(&output_dir)?;

    let build_dir = ctx.build_dir(&opts.arch_dir, &target.name);

    let cwd = if target.package {
        // `build_dir` is effectively `output_dir` for a package: every
        // other node in its own resolved order (resources promoted first)
        // merges its output tree directly into `output_dir` — a union, not
        // one subdirectory per node, matching the "output_dir containing
        // the union of R1 and R2 output trees" aggregation scenario.
        let siblings = resolver::build_order(ctx, &target.name, opts.arch, false)?;
        for node in siblings.iter().filter(|n| *n != &target.name) {
            mirror(&ctx.output_dir(&opts.arch_dir, node), &output_dir)?;
        }
        output_dir.clone()
    } else {
        if opts.no_clean && build_dir.is_dir() {
            log::info!("[{}] reusing existing build directory", target.name);
        } else {
            fs_remove(&build_dir)?;
            fs_create(&build_dir)?;
            for source in &target.sources {
                mirror(&ctx.source_dir(source), &build_dir.join(source))?;
            }
            for dep in &target.dependencies {
                if ctx.registry.target(dep).map_or(false, |d| d.builds_for(opts.arch)) {
                    mirror(&ctx.output_dir(&opts.arch_dir, dep), &build_dir.join(dep))?;
                }
            }
        }
        build_dir.clone()
    };

    let env_params = env::EnvParams {
        group: &target.group,
        arch: opts.arch,
        prefix: &opts.prefix,
        build_dir: &cwd,
        output_dir: &output_dir,
        native: opts.native,
        nproc: opts.nproc,
        local: opts.local,
    };
    let environment = env::compose(ctx, &env_params).map_err(|e| stage_error("compose environment for", &cwd, e))?;

    exec::run_script(ctx, target, &environment, &cwd, opts.native, opts.arch)?;

    Ok(Staged { build_dir, output_dir })
}

fn mirror(src: &Path, dst: &Path) -> Result<()> {
    mirror_copy(src, dst).map_err(|e| stage_error("stage", dst, e))
}

fn fs_remove(path: &Path) -> Result<()> {
    remove_dir_all_if_exists(path).map_err(|e| stage_error("clean", path, e))
}

fn fs_create(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| Error::FsError {
        operation: "create",
        path: path.to_path_buf(),
        source: e,
    })
}

/// Bridges a `mirror_copy`/`env::compose` failure (both `anyhow::Result`,
/// since they aggregate several fallible steps) into the closed `FsError`
/// kind without giving that variant a second source type.
fn stage_error(operation: &'static str, path: &Path, source: anyhow::Error) -> Error {
    Error::FsError {
        operation,
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::Other, source.to_string()),
    }
}
