//! End-to-end exercises of the orchestration pipeline (loader → validate →
//! resolver → cache/build), covering the concrete scenarios named in the
//! project's testable-properties section. Each test builds a small rule
//! group on disk with trivial shell scripts and drives the same public API
//! `src/bin/xforge/main.rs` uses — no process spawning of the `xforge`
//! binary itself, since the pipeline's observable effects (which scripts
//! ran, what landed in `_outputs`) are all visible through the library.

use std::fs;
use std::path::Path;
use tempfile::tempdir;
use xforge::arch::Arch;
use xforge::config::Config;
use xforge::context::BuildContext;
use xforge::errors::Error;
use xforge::{cache, loader, resolver, validate};

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// A script that appends one line to `counter_path` (outside any staged
/// directory, so it survives build-dir cleanup) and leaves a marker in
/// `OUTPUT_DIR`, letting tests count actual script invocations.
fn counting_script(counter_path: &Path) -> String {
    format!("echo run >> \"{}\"\ntouch \"$OUTPUT_DIR/marker\"\n", counter_path.display())
}

fn run_count(counter_path: &Path) -> usize {
    fs::read_to_string(counter_path)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

fn setup(tmp: &tempfile::TempDir) -> BuildContext {
    BuildContext::new(tmp.path(), Config::default())
}

fn opts(force: bool) -> cache::RunOptions {
    cache::RunOptions {
        arch: Arch::LinuxX64,
        prefix: "/usr/local".to_string(),
        local: false,
        nproc: 1,
        no_clean: false,
        force,
        native: true,
    }
}

fn build(ctx: &mut BuildContext, root: &str, force: bool) {
    let order = resolver::build_order(ctx, root, Arch::LinuxX64, true).unwrap();
    cache::run_all(ctx, &order, &opts(force)).unwrap();
}

fn reset_built(ctx: &mut BuildContext, names: &[&str]) {
    for name in names {
        ctx.registry.target_mut(name).unwrap().built = false;
    }
}

/// Scenario 1 (spec §8): linear chain A←B←C, all leaves with trivial
/// scripts. First `build C` runs all three scripts; a second run with
/// unchanged inputs and `force=false` runs none.
#[test]
fn linear_chain_cache_hit() {
    let tmp = tempdir().unwrap();
    let mut ctx = setup(&tmp);
    let group = ctx.group_dir("g");
    let counters: Vec<_> = ["a", "b", "c"].iter().map(|n| tmp.path().join(format!("{n}.count"))).collect();

    write(
        &group.join("rules/10-targets.rule.toml"),
        r#"
        [[target]]
        name = "a"
        [[target]]
        name = "b"
        dependencies = ["a"]
        [[target]]
        name = "c"
        dependencies = ["b"]
        "#,
    );
    for (name, counter) in ["a", "b", "c"].iter().zip(&counters) {
        write(&group.join(format!("scripts/{name}.sh")), &counting_script(counter));
    }

    loader::load_group(&mut ctx, "g").unwrap();
    validate::run(&ctx).unwrap();

    build(&mut ctx, "c", false);
    assert_eq!(run_count(&counters[0]), 1);
    assert_eq!(run_count(&counters[1]), 1);
    assert_eq!(run_count(&counters[2]), 1);
    assert!(["a", "b", "c"].iter().all(|n| ctx.registry.target(n).unwrap().built));

    reset_built(&mut ctx, &["a", "b", "c"]);
    build(&mut ctx, "c", false);
    assert_eq!(run_count(&counters[0]), 1, "a must not rebuild on an unchanged second pass");
    assert_eq!(run_count(&counters[1]), 1, "b must not rebuild on an unchanged second pass");
    assert_eq!(run_count(&counters[2]), 1, "c must not rebuild on an unchanged second pass");
    assert!(["a", "b", "c"].iter().all(|n| !ctx.registry.target(n).unwrap().built));
}

/// Scenario 2 (spec §8): editing a patch owned by A invalidates A and its
/// dependent C, but not the unrelated sibling B.
#[test]
fn patch_edit_invalidates_only_downstream() {
    let tmp = tempdir().unwrap();
    let mut ctx = setup(&tmp);
    let group = ctx.group_dir("g");
    let counter_a = tmp.path().join("a.count");
    let counter_b = tmp.path().join("b.count");
    let counter_c = tmp.path().join("c.count");

    write(&group.join("patches/fix.patch"), "v1");
    write(
        &group.join("rules/10-targets.rule.toml"),
        r#"
        [[target]]
        name = "a"
        patches = ["fix.patch"]
        [[target]]
        name = "b"
        [[target]]
        name = "c"
        dependencies = ["a", "b"]
        "#,
    );
    write(&group.join("scripts/a.sh"), &counting_script(&counter_a));
    write(&group.join("scripts/b.sh"), &counting_script(&counter_b));
    write(&group.join("scripts/c.sh"), &counting_script(&counter_c));

    loader::load_group(&mut ctx, "g").unwrap();
    validate::run(&ctx).unwrap();

    build(&mut ctx, "c", false);
    assert_eq!(run_count(&counter_a), 1);
    assert_eq!(run_count(&counter_b), 1);
    assert_eq!(run_count(&counter_c), 1);

    write(&group.join("patches/fix.patch"), "v2");
    reset_built(&mut ctx, &["a", "b", "c"]);
    build(&mut ctx, "c", false);

    assert_eq!(run_count(&counter_a), 2, "a must rebuild: its patch changed");
    assert_eq!(run_count(&counter_b), 1, "b is unrelated to a and must not rebuild");
    assert_eq!(run_count(&counter_c), 2, "c must cascade-rebuild because a rebuilt");
}

/// Scenario 3 (spec §8): a cycle between A and B is fatal and the error
/// names both targets.
#[test]
fn cycle_error_names_both_targets() {
    let tmp = tempdir().unwrap();
    let mut ctx = setup(&tmp);
    let group = ctx.group_dir("g");
    write(
        &group.join("rules/10-targets.rule.toml"),
        r#"
        [[target]]
        name = "a"
        dependencies = ["b"]
        [[target]]
        name = "b"
        dependencies = ["a"]
        "#,
    );
    loader::load_group(&mut ctx, "g").unwrap();
    validate::run(&ctx).unwrap();

    let err = resolver::build_order(&ctx, "a", Arch::LinuxX64, true).unwrap_err();
    match err {
        Error::Cycle(from, to) => {
            let names = [from, to];
            assert!(names.contains(&"a".to_string()));
            assert!(names.contains(&"b".to_string()));
        }
        other => panic!("expected a Cycle error, got {other:?}"),
    }
}

/// Scenario 4 (spec §8): a target whose `arch` whitelist excludes the
/// requested architecture is skipped, but a dependent that does build for
/// that architecture still succeeds and never sees the skipped output.
#[test]
fn arch_skip_does_not_break_dependents() {
    let tmp = tempdir().unwrap();
    let mut ctx = setup(&tmp);
    let group = ctx.group_dir("g");
    let counter_b = tmp.path().join("b.count");
    let counter_c = tmp.path().join("c.count");

    write(
        &group.join("rules/10-targets.rule.toml"),
        r#"
        [[target]]
        name = "b"
        arch = ["linux-arm64"]
        [[target]]
        name = "c"
        dependencies = ["b"]
        "#,
    );
    write(&group.join("scripts/b.sh"), &counting_script(&counter_b));
    write(&group.join("scripts/c.sh"), &counting_script(&counter_c));

    loader::load_group(&mut ctx, "g").unwrap();
    validate::run(&ctx).unwrap();

    build(&mut ctx, "c", false);

    assert_eq!(run_count(&counter_b), 0, "b is arch-filtered out and must never run");
    assert_eq!(run_count(&counter_c), 1);
    assert!(ctx.registry.target("c").unwrap().built);
    assert!(!ctx.registry.target("b").unwrap().built, "b was skipped, not built");
}

/// Scenario 5 (spec §8): a package target aggregates its resources' output
/// trees into its own `OUTPUT_DIR` before its own script runs.
#[test]
fn package_aggregates_resource_outputs() {
    let tmp = tempdir().unwrap();
    let mut ctx = setup(&tmp);
    let group = ctx.group_dir("g");

    write(
        &group.join("rules/10-targets.rule.toml"),
        r#"
        [[target]]
        name = "r1"
        [[target]]
        name = "r2"
        [[target]]
        name = "p"
        package = true
        resources = ["r1", "r2"]
        "#,
    );
    write(&group.join("scripts/r1.sh"), "echo from-r1 > \"$OUTPUT_DIR/from_r1\"\n");
    write(&group.join("scripts/r2.sh"), "echo from-r2 > \"$OUTPUT_DIR/from_r2\"\n");
    write(
        &group.join("scripts/p.sh"),
        "test -f \"$OUTPUT_DIR/from_r1\" && test -f \"$OUTPUT_DIR/from_r2\"\n",
    );

    loader::load_group(&mut ctx, "g").unwrap();
    validate::run(&ctx).unwrap();

    build(&mut ctx, "p", false);

    let output_dir = ctx.output_dir("linux-x64", "p");
    assert!(output_dir.join("from_r1").exists());
    assert!(output_dir.join("from_r2").exists());
    assert!(ctx.registry.target("p").unwrap().built);
}
