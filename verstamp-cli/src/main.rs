//! verstamp CLI - stamp release versions into AssemblyInfo and installer files

#![deny(warnings)]

// Global invariants enforced:
// - Exit code 1 for usage errors, git's own exit code when `git describe` fails
// - Git is queried before any file is touched

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use verstamp_core::{
    bump_with_config, config, release_commands, BumpOptions, Error, ExplicitVersion, PatchMode,
};

#[derive(Parser)]
#[command(name = "verstamp")]
#[command(
    about = "Stamp git-tag derived versions into AssemblyInfo.cs files and the installer script"
)]
#[command(version = env!("VERSTAMP_VERSION"))]
struct Cli {
    /// Major version (default: taken from the latest tag, requires MINOR)
    #[arg(requires = "minor")]
    major: Option<u32>,

    /// Minor version (default: taken from the latest tag)
    minor: Option<u32>,

    /// Root of the tree to patch
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Path to config file (default: auto-discover in the root)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report what would change without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Log diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version land here too
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let explicit = match (cli.major, cli.minor) {
        (Some(major), Some(minor)) => Some(ExplicitVersion { major, minor }),
        _ => None,
    };

    let resolved_config = config::load_and_resolve(&cli.root, cli.config.as_deref())
        .context("failed to load configuration")?;

    if let Some(config_path) = &resolved_config.config_path {
        eprintln!("Using config: {}", config_path.display());
    }

    debug!(
        "root {}, installer {}, tag prefix {:?}",
        cli.root.display(),
        resolved_config.installer,
        resolved_config.tag_prefix
    );

    let options = BumpOptions {
        explicit,
        now: chrono::Local::now().naive_local(),
        mode: if cli.dry_run {
            PatchMode::DryRun
        } else {
            PatchMode::Write
        },
    };

    let bump = bump_with_config(&cli.root, options, &resolved_config, |path| {
        println!("processing {}", path.display());
    })?;
    debug!(
        "{} of {} files changed",
        bump.report.changed_count(),
        bump.report.files.len()
    );

    if cli.dry_run {
        println!(
            "Dry-run: {} of {} files would change to version {}",
            bump.report.changed_count(),
            bump.report.files.len(),
            bump.version
        );
        return Ok(());
    }

    let commands = release_commands(&bump.version, resolved_config.tag_prefix);
    println!("commit with:\n{}", commands.commit);
    println!("tag with:\n{}", commands.tag);

    Ok(())
}

/// Print the error and pick the process exit code
fn report_error(err: &anyhow::Error) -> ExitCode {
    if let Some(Error::Git { args, code, stderr }) = err.downcast_ref::<Error>() {
        eprintln!("git {} returned non-zero status.", args.join(" "));
        if !stderr.is_empty() {
            eprintln!("stderr output was {}", stderr);
        }
        let code = (*code)
            .and_then(|c| u8::try_from(c).ok())
            .filter(|&c| c != 0)
            .unwrap_or(1);
        return ExitCode::from(code);
    }

    eprintln!("error: {:#}", err);
    ExitCode::from(1)
}
