//! The environment contract (spec §4.G table) handed to a target's build
//! script. Kept as an explicit ordered `Vec<(String, String)>` — mirroring
//! the original's `OrderedDict` — rather than a `HashMap`, since the
//! container path below needs a stable, inspectable list to rewrite.

use crate::arch::{self, Arch};
use crate::context::BuildContext;
use std::path::Path;
use std::process::Command;

pub struct EnvParams<'a> {
    pub group: &'a str,
    pub arch: Arch,
    pub prefix: &'a str,
    pub build_dir: &'a Path,
    pub output_dir: &'a Path,
    pub native: bool,
    pub nproc: u32,
    pub local: bool,
}

/// Builds the ordered environment for a script invocation. `*_DIR`
/// variables are absolute host paths here; the container path (§4.G)
/// rewrites them to `/work/...` just before invoking `docker run`.
pub fn compose(ctx: &BuildContext, params: &EnvParams<'_>) -> anyhow::Result<Vec<(String, String)>> {
    let mut env = Vec::new();
    let mut set = |k: &str, v: String| env.push((k.to_string(), v));

    set("BUILD_OS", arch::host_os().to_string());
    set("WORK_DIR", ctx.work_dir.display().to_string());
    set("BUILD_DIR", absolute(params.build_dir)?.display().to_string());
    set("OUTPUT_DIR", absolute(params.output_dir)?.display().to_string());
    set("SRC_DIR", absolute(&ctx.sources_root())?.display().to_string());
    set(
        "PATCHES_DIR",
        absolute(&ctx.patches_dir(params.group))?.display().to_string(),
    );
    set("ARCH", params.arch.as_str().to_string());
    set("ARCH_BASE", params.arch.base().to_string());
    set("NPROC", params.nproc.to_string());
    set("SHARED_EXT", ".so".to_string());

    if params.native {
        set("STRIP", "strip".to_string());
        match arch::host_os() {
            "darwin" => {
                let mut path = String::new();
                for prefix in [
                    "/usr/local/opt/gnu-sed/libexec/gnubin",
                    "/usr/local/opt/coreutils/libexec/gnubin",
                    "/usr/local/opt/qt/bin",
                    "/usr/local/opt/bison/bin",
                    "/usr/local/opt/flex/bin",
                    "/usr/local/opt/openjdk/bin",
                ] {
                    path.push_str(prefix);
                    path.push(':');
                }
                path.push_str(&std::env::var("PATH").unwrap_or_default());
                set("PATH", path);
                // overrides the default ".so" set above
                env.retain(|(k, _)| k != "SHARED_EXT");
                set("SHARED_EXT", ".dylib".to_string());
            }
            "windows" => {
                set("CMAKE_GENERATOR", "MSYS Makefiles".to_string());
                set("EXE", ".exe".to_string());
                env.retain(|(k, _)| k != "SHARED_EXT");
                set("SHARED_EXT", ".dll".to_string());
                // A native Windows build is always run from an MSYS/MinGW
                // shell in practice; inherit the whole parent environment
                // in addition to the contract above, matching `base.py`'s
                // `env.update(os.environ)` MSYS branch.
                for (k, v) in std::env::vars() {
                    if !env.iter().any(|(existing, _)| existing == &k) {
                        env.push((k, v));
                    }
                }
            }
            _ => {
                set("PATH", std::env::var("PATH").unwrap_or_default());
            }
        }
    }

    set("LC_ALL", "C".to_string());
    set("INSTALL_PREFIX", params.prefix.to_string());

    if params.local {
        set("IS_LOCAL", "True".to_string());
        set("CROSS_NAME", host_triplet());
    }

    Ok(env)
}

fn absolute(path: &Path) -> anyhow::Result<std::path::PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn host_triplet() -> String {
    Command::new("gcc")
        .arg("-dumpmachine")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default()
}

/// Rewrites every `*_DIR` variable to its `/work/<relative-to-cwd>` form
/// for the container path (spec §4.G / §9: "the translation rule is
/// syntactic, keyed on the variable name suffix `_DIR`"). All other
/// variables pass through unchanged.
pub fn rewrite_for_container(env: &[(String, String)], cwd: &Path) -> Vec<(String, String)> {
    env.iter()
        .map(|(k, v)| {
            if k.ends_with("_DIR") {
                let rel = Path::new(v)
                    .strip_prefix(cwd)
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|_| Path::new(v).to_path_buf());
                let container_path = Path::new("/work").join(rel);
                (k.clone(), container_path.display().to_string())
            } else {
                (k.clone(), v.clone())
            }
        })
        .collect()
}
