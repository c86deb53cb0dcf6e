//! The Rule Loader (spec §4.B): discovers rule files under
//! `<group>/rules/` and registers their declarations against a
//! [`crate::context::BuildContext`].

mod ruleset;

use crate::context::BuildContext;
use crate::errors::{Error, Result};
use crate::model::{Source, Target};
use ruleset::RuleFile;
use std::path::Path;

const RULE_SUFFIX: &str = ".rule.toml";

/// Loads every rule file in `<group>/rules/`, sorted lexicographically,
/// skipping any file whose name starts with `__init__` or `base` (spec
/// §4.B). Registers all declared sources and targets with `group` set to
/// `group`. A malformed or unreadable rule file is a fatal
/// `Error::RuleEvaluation`.
pub fn load_group(ctx: &mut BuildContext, group: &str) -> Result<()> {
    let rules_dir = ctx.rules_dir(group);
    if !rules_dir.is_dir() {
        return Err(Error::RuleEvaluation {
            path: rules_dir.clone(),
            source: anyhow::anyhow!("rule directory for group `{group}` does not exist"),
        });
    }

    let mut entries: Vec<_> = std::fs::read_dir(&rules_dir)
        .map_err(|e| Error::RuleEvaluation {
            path: rules_dir.clone(),
            source: anyhow::Error::new(e),
        })?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| is_loadable_rule_file(p))
        .collect();
    entries.sort();

    for path in entries {
        load_rule_file(ctx, group, &path)?;
    }
    Ok(())
}

fn is_loadable_rule_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(RULE_SUFFIX) && !name.starts_with("__init__") && !name.starts_with("base")
}

fn load_rule_file(ctx: &mut BuildContext, group: &str, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::RuleEvaluation {
        path: path.to_path_buf(),
        source: anyhow::Error::new(e),
    })?;
    let rule_file: RuleFile = toml::from_str(&text).map_err(|e| Error::RuleEvaluation {
        path: path.to_path_buf(),
        source: anyhow::Error::new(e),
    })?;

    for decl in rule_file.sources {
        ctx.registry.define_source(Source::new(
            decl.name,
            decl.vcs,
            decl.location,
            decl.revision,
        ));
    }
    for decl in rule_file.targets {
        ctx.registry.define_target(Target {
            name: decl.name,
            group: group.to_string(),
            sources: decl.sources,
            dependencies: decl.dependencies,
            resources: decl.resources,
            patches: decl.patches,
            arch: decl.arch,
            package: decl.package,
            license_url: decl.license_url,
            license_file: decl.license_file,
            hash: None,
            built: false,
        });
    }
    Ok(())
}
