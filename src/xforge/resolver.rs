//! The Resolver (spec §4.D): depth-first topological order with cycle
//! detection and architecture filtering, followed by package-resource
//! promotion.
//!
//! The original (`base.py::dependencyResolver`/`createBuildOrder`) tracks
//! `resolved`/`unresolved` as two plain lists and does the cycle check by
//! testing list membership. That's quadratic but fine at this scale and,
//! more importantly, it's what gives the *displayed* warnings and error
//! messages their exact shape, so the DFS below keeps the same two-list
//! shape rather than switching to a colour-enum visitor.

use crate::arch::Arch;
use crate::context::BuildContext;
use crate::errors::{Error, Result};

/// Computes the serial build order for `root` at `arch`. When `display` is
/// true, targets skipped by the architecture whitelist are logged
/// (`ArchSkip`); `display=false` is used internally to compute the set of
/// needed sources without spamming warnings for every node in the graph.
pub fn build_order(ctx: &BuildContext, root: &str, arch: Arch, display: bool) -> Result<Vec<String>> {
    if !ctx.registry.has_target(root) {
        return Err(Error::UnknownTarget(root.to_string()));
    }

    let mut resolved = Vec::new();
    let mut unresolved = Vec::new();
    visit(ctx, root, arch, display, &mut resolved, &mut unresolved)?;

    if ctx.registry.target(root).expect("checked above").package {
        promote_resources(ctx, &mut resolved);
    }

    Ok(resolved)
}

fn visit(
    ctx: &BuildContext,
    name: &str,
    arch: Arch,
    display: bool,
    resolved: &mut Vec<String>,
    unresolved: &mut Vec<String>,
) -> Result<()> {
    let node = ctx
        .registry
        .target(name)
        .expect("caller guarantees the node exists");

    if !node.builds_for(arch) {
        if display {
            log::warn!(
                "target `{}` is not built for architecture `{}`",
                node.name,
                arch
            );
        }
        return Ok(());
    }

    unresolved.push(node.name.clone());
    for dep in &node.dependencies {
        if resolved.contains(dep) {
            continue;
        }
        if unresolved.contains(dep) {
            return Err(Error::Cycle(node.name.clone(), dep.clone()));
        }
        visit(ctx, dep, arch, display, resolved, unresolved)?;
    }
    resolved.push(node.name.clone());
    unresolved.retain(|n| n != &node.name);
    Ok(())
}

/// Repeatedly scans the resolved order; any member's `resource` not yet
/// present is prepended. Iterates until a full pass makes no change (spec
/// §4.D / §9 open question: the fixed point is the intended behaviour).
fn promote_resources(ctx: &BuildContext, resolved: &mut Vec<String>) {
    loop {
        let mut inserted = false;
        let members: Vec<String> = resolved.clone();
        for member in &members {
            let Some(target) = ctx.registry.target(member) else {
                continue;
            };
            for resource in &target.resources {
                if !resolved.contains(resource) {
                    resolved.insert(0, resource.clone());
                    inserted = true;
                }
            }
        }
        if !inserted {
            break;
        }
    }
}

/// The union of `sources` across every node the resolver would visit for
/// `target` at `arch` (spec §4.E): what the VCS puller needs to fetch.
pub fn needed_sources(ctx: &BuildContext, target: &str, arch: Arch) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for t in build_order(ctx, target, arch, false)? {
        let node = ctx.registry.target(&t).expect("resolved targets exist");
        for source in &node.sources {
            if !names.contains(source) {
                names.push(source.clone());
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::Target;

    fn ctx() -> BuildContext {
        BuildContext::new(std::env::temp_dir(), Config::default())
    }

    fn target(name: &str, deps: &[&str]) -> Target {
        Target {
            name: name.to_string(),
            group: "g".to_string(),
            sources: vec![],
            dependencies: deps.iter().map(|s| s.to_string()).collect(),
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

    #[test]
    fn linear_chain_orders_leaves_first() {
        let mut ctx = ctx();
        ctx.registry.define_target(target("a", &[]));
        ctx.registry.define_target(target("b", &["a"]));
        ctx.registry.define_target(target("c", &["b"]));

        let order = build_order(&ctx, "c", Arch::LinuxX64, true).unwrap();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn cycle_is_detected() {
        let mut ctx = ctx();
        ctx.registry.define_target(target("a", &["b"]));
        ctx.registry.define_target(target("b", &["a"]));

        let err = build_order(&ctx, "a", Arch::LinuxX64, true).unwrap_err();
        match err {
            Error::Cycle(from, to) => {
                assert!((from == "a" && to == "b") || (from == "b" && to == "a"));
            }
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn arch_whitelist_excludes_target_but_not_its_siblings() {
        let mut ctx = ctx();
        let mut b = target("b", &[]);
        b.arch = vec![Arch::LinuxArm64];
        ctx.registry.define_target(b);
        ctx.registry.define_target(target("c", &["b"]));

        let order = build_order(&ctx, "c", Arch::LinuxX64, true).unwrap();
        assert_eq!(order, vec!["c"]);
    }

    #[test]
    fn package_promotes_resources_before_itself() {
        let mut ctx = ctx();
        ctx.registry.define_target(target("r1", &[]));
        ctx.registry.define_target(target("r2", &[]));
        let mut pkg = target("p", &[]);
        pkg.package = true;
        pkg.resources = vec!["r1".to_string(), "r2".to_string()];
        ctx.registry.define_target(pkg);

        let order = build_order(&ctx, "p", Arch::LinuxX64, true).unwrap();
        assert_eq!(order.last().unwrap(), "p");
        assert!(order.iter().position(|n| n == "r1").unwrap() < order.iter().position(|n| n == "p").unwrap());
        assert!(order.iter().position(|n| n == "r2").unwrap() < order.iter().position(|n| n == "p").unwrap());
    }

    #[test]
    fn declaration_order_does_not_affect_resolved_order_determinism() {
        let mut ctx = ctx();
        ctx.registry.define_target(target("a", &[]));
        ctx.registry.define_target(target("b", &["a"]));
        let order1 = build_order(&ctx, "b", Arch::LinuxX64, true).unwrap();
        let order2 = build_order(&ctx, "b", Arch::LinuxX64, true).unwrap();
        assert_eq!(order1, order2);
    }
}
