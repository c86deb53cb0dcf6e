//! Native/container selection (spec §4.G "Native vs container selection")
//! and the actual script invocation.

use crate::arch::{self, Arch};
use crate::build::env;
use crate::context::BuildContext;
use crate::errors::{Error, Result};
use crate::model::Target;
use std::io::Write as _;
use std::path::Path;
use termcolor::{Color, ColorSpec, StandardStream, StandardStreamLock, WriteColor};
use xforge_util::ProcessBuilder;

/// Resolved native-vs-container decision for one `build(target, arch)`
/// invocation, plus the flags that interact with it.
pub struct BuildPlan {
    pub native: bool,
}

pub struct BuildOptions {
    pub arch: Arch,
    pub local: bool,
    pub deploy: bool,
}

/// Applies spec §4.G's selection rules, returning a fatal `ConfigConflict`
/// for every combination the spec calls out as illegal.
pub fn plan(opts: &BuildOptions) -> Result<BuildPlan> {
    if opts.deploy && !opts.local {
        return Err(Error::ConfigConflict(
            "deployment is only possible for local builds".to_string(),
        ));
    }
    let host = arch::host_arch();
    if opts.arch != host && opts.arch.is_native_only() {
        return Err(Error::ConfigConflict(format!(
            "architecture `{}` can only be built natively",
            opts.arch
        )));
    }
    if opts.arch != host && opts.local {
        return Err(Error::ConfigConflict(format!(
            "local build for `{}` can only be built natively",
            opts.arch
        )));
    }
    let native = opts.arch == host;
    Ok(BuildPlan { native })
}

/// Writes `set -e -x\n` followed by the target's build script into a fresh
/// temporary file, matching the original's "always fail fast, always echo
/// commands" contract.
fn write_script(ctx: &BuildContext, target: &Target) -> anyhow::Result<tempfile::NamedTempFile> {
    let script_path = ctx.script_path(&target.group, &target.name);
    let contents = std::fs::read_to_string(&script_path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", script_path.display()))?;
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(b"set -e -x\n")?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Runs the target's build script, either directly with a POSIX shell
/// (`native`) or inside the architecture's cross-compilation container,
/// streaming stdout/stderr to the terminal as they arrive (spec §5: two
/// reader threads, never more than one buffered line per pipe).
pub fn run_script(
    ctx: &BuildContext,
    target: &Target,
    env: &[(String, String)],
    cwd: &Path,
    native: bool,
    arch: Arch,
) -> Result<()> {
    let script = write_script(ctx, target).map_err(|e| {
        log::error!("{e}");
        Error::ScriptFailure {
            target: target.name.clone(),
            code: -1,
        }
    })?;

    let mut cmd = if native {
        let mut c = ProcessBuilder::new("/bin/sh");
        c.arg(script.path());
        for (k, v) in env {
            c.env(k, v);
        }
        c
    } else {
        let image = ctx.config.container_image(arch.as_str());
        let cwd_abs = std::env::current_dir().unwrap_or_else(|_| ctx.work_dir.clone());
        let build_dir_rel = cwd.strip_prefix(&cwd_abs).unwrap_or(cwd);
        let container_cwd = Path::new("/work").join(build_dir_rel);
        let translated = env::rewrite_for_container(env, &cwd_abs);

        let mut c = ProcessBuilder::new("docker");
        c.args(["run", "--rm"]);
        c.arg("--user");
        c.arg(format!("{}:{}", uid(), gid()));
        c.args(["-v", "/tmp:/tmp"]);
        c.arg("-v");
        c.arg(format!("{}:/work", cwd_abs.display()));
        c.arg("-w");
        c.arg(container_cwd.display().to_string());
        for (k, v) in &translated {
            c.arg("-e");
            c.arg(format!("{k}={v}"));
        }
        c.arg(image);
        c.args(["bash", &script.path().display().to_string()]);
        c
    };

    cmd.cwd(cwd.to_path_buf());

    let stdout = StandardStream::stdout(termcolor::ColorChoice::Auto);
    let stderr = StandardStream::stderr(termcolor::ColorChoice::Auto);

    let status = cmd
        .exec_with_streaming(
            &mut |line| {
                let mut lock = stdout.lock();
                let _ = writeln!(lock, "{line}");
            },
            &mut |line| {
                print_highlighted(&mut stderr.lock(), line);
            },
        )
        .map_err(|e| {
            log::error!("{e}");
            Error::ScriptFailure {
                target: target.name.clone(),
                code: -1,
            }
        })?;

    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(Error::ScriptFailure {
            target: target.name.clone(),
            code,
        }),
        None => Err(Error::ScriptFailure {
            target: target.name.clone(),
            code: -1,
        }),
    }
}

fn print_highlighted(lock: &mut StandardStreamLock<'_>, line: &str) {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(Color::Yellow));
    let _ = lock.set_color(&spec);
    let _ = writeln!(lock, "{line}");
    let _ = lock.reset();
}

#[cfg(unix)]
fn uid() -> u32 {
    unsafe { libc::getuid() }
}
#[cfg(unix)]
fn gid() -> u32 {
    unsafe { libc::getgid() }
}
#[cfg(not(unix))]
fn uid() -> u32 {
    0
}
#[cfg(not(unix))]
fn gid() -> u32 {
    0
}
