//! `xforge` command-line front end: a thin `clap` layer over the
//! `xforge` library. This binary owns nothing but argument parsing,
//! context construction, and top-level error reporting (spec §6: "fatal
//! errors print a single red `ERROR` line and terminate the process").

use clap::{Parser, Subcommand};
use std::io::Write as _;
use std::process::ExitCode;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use xforge::arch::Arch;
use xforge::config::Config;
use xforge::context::{self, BuildContext};
use xforge::{cache, clean, deploy, loader, resolver, validate, vcs};

#[derive(Parser)]
#[command(name = "xforge", about = "A reproducible cross-compilation build orchestrator")]
struct Cli {
    /// Rule group(s) to load, in order. Repeatable.
    #[arg(long = "group", global = true, required = true)]
    group: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clone/update sources needed by a target, without building it.
    Pull {
        target: String,
        #[arg(long, default_value = "linux-x64")]
        arch: String,
        #[arg(long)]
        no_update: bool,
    },
    /// Build a target (and its dependency closure) for an architecture.
    Build {
        target: String,
        #[arg(long, default_value = "linux-x64")]
        arch: String,
        #[arg(long)]
        no_update: bool,
        #[arg(long)]
        no_clean: bool,
        #[arg(long)]
        force: bool,
        #[arg(long, default_value = "/usr/local")]
        prefix: String,
        #[arg(long)]
        local: bool,
        #[arg(long)]
        deploy: bool,
        #[arg(long)]
        sudo: bool,
        #[arg(long)]
        nproc: Option<u32>,
    },
    /// Remove build/output trees.
    Clean {
        #[arg(long)]
        arch: Option<String>,
        /// Also remove `_sources`.
        #[arg(long)]
        full: bool,
    },
    /// Copy a previously completed local build's install prefix onto the
    /// host filesystem.
    Deploy {
        target: String,
        #[arg(long, default_value = "/usr/local")]
        prefix: String,
        #[arg(long)]
        sudo: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let work_dir = context::absolute(&std::env::current_dir()?)?;
    let config = Config::load(&work_dir)?;
    let mut ctx = BuildContext::new(work_dir, config);

    for group in &cli.group {
        loader::load_group(&mut ctx, group)?;
    }
    validate::run(&ctx)?;

    match cli.command {
        Command::Pull { target, arch, no_update } => {
            let arch: Arch = arch.parse()?;
            vcs::pull(&mut ctx, &target, arch, no_update)?;
        }
        Command::Build {
            target,
            arch,
            no_update,
            no_clean,
            force,
            prefix,
            local,
            deploy: should_deploy,
            sudo,
            nproc,
        } => {
            let arch: Arch = arch.parse()?;
            let plan = xforge::build::exec::plan(&xforge::build::exec::BuildOptions {
                arch,
                local,
                deploy: should_deploy,
            })?;

            vcs::pull(&mut ctx, &target, arch, no_update)?;

            let order = resolver::build_order(&ctx, &target, arch, true)?;
            log::info!("building {target} for {arch} architecture ({} steps)...", order.len());

            let opts = cache::RunOptions {
                arch,
                prefix: prefix.clone(),
                local,
                nproc: nproc.unwrap_or(ctx.config.nproc),
                no_clean,
                force,
                native: plan.native,
            };
            cache::run_all(&mut ctx, &order, &opts)?;

            if should_deploy {
                deploy::deploy(&ctx, &target, &prefix, sudo)?;
            }
        }
        Command::Clean { arch, full } => {
            if full {
                clean::clean_full(&ctx)?;
            } else if let Some(arch) = arch {
                clean::clean_arch(&ctx, arch.parse()?)?;
            } else {
                for arch in Arch::ALL {
                    clean::clean_arch(&ctx, arch)?;
                }
            }
        }
        Command::Deploy { target, prefix, sudo } => {
            deploy::deploy(&ctx, &target, &prefix, sudo)?;
        }
    }

    Ok(())
}

fn print_error(message: &str) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(Color::Red)).set_bold(true);
    let _ = stderr.set_color(&spec);
    let _ = write!(stderr, "ERROR");
    let _ = stderr.reset();
    let _ = writeln!(stderr, ": {message}");
}
