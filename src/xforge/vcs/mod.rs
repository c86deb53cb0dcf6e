//! The VCS Puller (spec §4.E).

mod git;

use crate::arch::Arch;
use crate::context::BuildContext;
use crate::errors::Result;
use crate::resolver;

/// Pulls every source reachable from `root` at `arch` (the same closure
/// `resolver::needed_sources` computes), cloning/updating/checking out
/// each one and writing its resolved revision into `Source.hash`.
pub fn pull(ctx: &mut BuildContext, root: &str, arch: Arch, no_update: bool) -> Result<()> {
    log::info!("downloading sources...");
    let names = resolver::needed_sources(ctx, root, arch)?;
    for name in names {
        git::pull_one(ctx, &name, no_update)?;
    }
    Ok(())
}
