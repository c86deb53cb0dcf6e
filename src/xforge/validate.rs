//! The Validator (spec §4.C): referential integrity and patch existence,
//! run once after all rule groups have been loaded. The first failure is
//! fatal; an unused source is only a warning.

use crate::context::BuildContext;
use crate::errors::{Error, ReferenceKind, Result};
use std::collections::HashSet;

pub fn run(ctx: &BuildContext) -> Result<()> {
    let mut used_sources: HashSet<&str> = HashSet::new();

    for target in ctx.registry.targets() {
        for source in &target.sources {
            used_sources.insert(source.as_str());
            if !ctx.registry.has_source(source) {
                return Err(Error::UnknownReference {
                    kind: ReferenceKind::Source,
                    name: source.clone(),
                    target: target.name.clone(),
                });
            }
        }
        for dep in &target.dependencies {
            if dep == &target.name {
                return Err(Error::SelfReference {
                    target: target.name.clone(),
                    relation: "depends on",
                });
            }
            if !ctx.registry.has_target(dep) {
                return Err(Error::UnknownReference {
                    kind: ReferenceKind::Dependency,
                    name: dep.clone(),
                    target: target.name.clone(),
                });
            }
        }
        for resource in &target.resources {
            if resource == &target.name {
                return Err(Error::SelfReference {
                    target: target.name.clone(),
                    relation: "uses a resource of",
                });
            }
            if !ctx.registry.has_target(resource) {
                return Err(Error::UnknownReference {
                    kind: ReferenceKind::Resource,
                    name: resource.clone(),
                    target: target.name.clone(),
                });
            }
        }
        for patch in &target.patches {
            let path = ctx.patches_dir(&target.group).join(patch);
            if !path.exists() {
                return Err(Error::MissingPatch {
                    target: target.name.clone(),
                    patch: patch.clone(),
                    path: ctx.patches_dir(&target.group),
                });
            }
        }
    }

    for name in ctx.registry.source_names() {
        if !used_sources.contains(name) {
            log::warn!("source `{name}` is not used by any target");
        }
    }

    Ok(())
}
