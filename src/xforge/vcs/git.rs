//! `git2`-backed implementation of the VCS Puller for `Vcs::Git` sources.
//!
//! Grounded on `src/cargo/sources/git/utils.rs`'s `GitRemote`/`GitDatabase`
//! pair, simplified down to the orchestrator's actual needs: one directory
//! per source holding a normal (non-bare) working copy, always checked out
//! at the declared revision after cloning or updating.

use crate::context::BuildContext;
use crate::errors::{Error, Result};
use crate::model::Vcs;
use git2::{Oid, Repository};
use std::path::Path;

pub fn pull_one(ctx: &mut BuildContext, name: &str, no_update: bool) -> Result<()> {
    let source = ctx
        .registry
        .source(name)
        .unwrap_or_else(|| panic!("needed_sources only returns registered sources, got `{name}`"));
    let Vcs::Git = source.vcs;
    let location = source.location.clone();
    let revision = source.revision.clone();
    let repo_dir = ctx.source_dir(name);

    let mut cloning = !repo_dir.is_dir();
    if !cloning {
        match remote_url(&repo_dir) {
            Some(url) if url == location => {}
            Some(url) => {
                log::warn!(
                    "current source location {url} for `{name}` does not match {location}, re-cloning"
                );
                remove_existing(&repo_dir)?;
                cloning = true;
            }
            None => {
                log::warn!("destination dir for `{name}` does not contain repository data, re-cloning");
                remove_existing(&repo_dir)?;
                cloning = true;
            }
        }
    }

    if cloning {
        log::info!("[{name}] cloning {location}");
        clone(&location, &repo_dir).map_err(|e| vcs_failure(name, "clone", e))?;
    } else if !no_update {
        log::info!("[{name}] updating {location}");
        fetch(&repo_dir).map_err(|e| vcs_failure(name, "update", e))?;
    }

    let resolved_hash = if cloning || !no_update {
        log::info!("[{name}] checking out {revision}");
        let oid = checkout(&repo_dir, &revision).map_err(|e| vcs_failure(name, "checkout", e))?;
        oid.to_string()
    } else {
        head_oid(&repo_dir)
            .map_err(|e| vcs_failure(name, "checkout", e))?
            .to_string()
    };

    log::info!("[{name}] current revision {resolved_hash}");
    ctx.registry.source_mut(name).expect("checked above").hash = Some(resolved_hash);
    Ok(())
}

fn vcs_failure(name: &str, operation: &'static str, source: anyhow::Error) -> Error {
    Error::VcsFailure {
        name: name.to_string(),
        operation,
        source,
    }
}

fn remote_url(repo_dir: &Path) -> Option<String> {
    let repo = Repository::open(repo_dir).ok()?;
    let remote = repo.find_remote("origin").ok()?;
    remote.url().map(str::to_string)
}

fn remove_existing(repo_dir: &Path) -> anyhow::Result<()> {
    xforge_util::paths::remove_dir_all_if_exists(repo_dir)
}

fn clone(location: &str, dst: &Path) -> anyhow::Result<Repository> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let repo = git2::build::RepoBuilder::new().clone(location, dst)?;
    fetch_all_refs(&repo, location)?;
    Ok(repo)
}

fn fetch(repo_dir: &Path) -> anyhow::Result<()> {
    let repo = Repository::open(repo_dir)?;
    let url = repo
        .find_remote("origin")?
        .url()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("origin remote has no URL"))?;
    fetch_all_refs(&repo, &url)?;
    Ok(())
}

fn fetch_all_refs(repo: &Repository, _location: &str) -> anyhow::Result<()> {
    let mut remote = repo.find_remote("origin")?;
    remote.fetch(
        &[
            "+refs/heads/*:refs/remotes/origin/*",
            "+refs/tags/*:refs/tags/*",
        ],
        None,
        None,
    )?;
    Ok(())
}

/// Resolves `revision` to a commit, trying it as a raw rev-spec (a commit
/// SHA or tag) before trying it as a branch tracked from `origin`, then
/// detaches HEAD there and force-checks-out the working tree.
fn checkout(repo_dir: &Path, revision: &str) -> anyhow::Result<Oid> {
    let repo = Repository::open(repo_dir)?;
    let oid = resolve_revision(&repo, revision)?;
    repo.set_head_detached(oid)?;
    let mut checkout = git2::build::CheckoutBuilder::new();
    checkout.force();
    repo.checkout_head(Some(&mut checkout))?;
    Ok(oid)
}

fn resolve_revision(repo: &Repository, revision: &str) -> anyhow::Result<Oid> {
    if let Ok(obj) = repo.revparse_single(revision) {
        return Ok(obj.peel_to_commit()?.id());
    }
    let tracking = format!("origin/{revision}");
    let obj = repo
        .revparse_single(&tracking)
        .map_err(|_| anyhow::anyhow!("revision `{revision}` not found"))?;
    Ok(obj.peel_to_commit()?.id())
}

fn head_oid(repo_dir: &Path) -> anyhow::Result<Oid> {
    let repo = Repository::open(repo_dir)?;
    Ok(repo.head()?.peel_to_commit()?.id())
}
