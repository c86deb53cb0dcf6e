//! The Deployer (spec §4.I): copies a completed local build's install
//! prefix tree onto the host filesystem, ported from `base.py::buildCode`'s
//! trailing `if deploy:` block. Only legal after a `local` build (enforced
//! by `build::exec::plan`, not here — this module just does the copy).

use crate::context::BuildContext;
use crate::errors::{Error, Result};
use std::path::Path;
use std::process::Command;
use xforge_util::paths::mirror_copy;

/// Mirrors `_outputs/local/<target>/<prefix>/` onto `<prefix>/` on the host.
/// When `sudo` is set, the copy runs through `sudo cp -a` instead of the
/// in-process mirror, matching the original's `cmd.insert(0, 'sudo')`
/// around its `rsync` invocation — an in-process copy cannot itself gain
/// root, so elevation has to shell out.
pub fn deploy(ctx: &BuildContext, target: &str, prefix: &str, sudo: bool) -> Result<()> {
    let staged_prefix = ctx.output_dir("local", target).join(prefix.trim_start_matches('/'));
    let dest = Path::new(prefix);

    log::info!("deploying {target} to {prefix}...");

    if sudo {
        deploy_with_sudo(&staged_prefix, dest).map_err(|e| Error::FsError {
            operation: "deploy",
            path: dest.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })
    } else {
        mirror_copy(&staged_prefix, dest).map_err(|e| Error::FsError {
            operation: "deploy",
            path: dest.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })
    }
}

fn deploy_with_sudo(src: &Path, dest: &Path) -> anyhow::Result<()> {
    let status = Command::new("sudo")
        .arg("mkdir")
        .arg("-p")
        .arg(dest)
        .status()?;
    if !status.success() {
        anyhow::bail!("sudo mkdir -p {} failed", dest.display());
    }
    let status = Command::new("sudo")
        .arg("cp")
        .arg("-a")
        .arg(format!("{}/.", src.display()))
        .arg(dest)
        .status()?;
    if !status.success() {
        anyhow::bail!("sudo cp -a {} {} failed", src.display(), dest.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn deploy_mirrors_staged_prefix_onto_destination() {
        let tmp = tempdir().unwrap();
        let ctx = BuildContext::new(tmp.path(), Config::default());
        let staged = ctx.output_dir("local", "yosys").join("usr/local");
        fs::create_dir_all(staged.join("bin")).unwrap();
        fs::write(staged.join("bin/yosys"), b"#!/bin/sh\n").unwrap();

        let dest = tmp.path().join("install");
        deploy(&ctx, "yosys", &dest.to_string_lossy(), false).unwrap();

        assert!(dest.join("bin/yosys").exists());
    }
}
