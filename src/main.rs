//! linkvault - generational hardlink backups with retention and dedup.
//!
//! Usage:
//!   linkvault backup [ORIGINS]... -d ROOT    Produce a new dated snapshot
//!   linkvault check ROOT [--repair]          Find (and merge) duplicate content
//!   linkvault rotate ROOT [--max N]          Archive aged snapshots by week
//!   linkvault --plan FILE <COMMAND>          Read defaults from a plan file

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, eyre};
use humansize::{BINARY, format_size};
use tracing_subscriber::EnvFilter;

use linkvault_core::{BackupReport, CheckReport, HashAlgorithm, Plan, RotateReport};
use linkvault_ops::{CheckConfig, backup, check, rotate};

#[derive(Parser)]
#[command(
    name = "linkvault",
    version,
    about = "Generational hardlink backup snapshots",
    long_about = "linkvault keeps each backup browsable as a full copy while \
                  sharing unchanged files with its predecessor via hardlinks, \
                  archives aged snapshots into weekly buckets, and merges \
                  duplicate file content back onto single inodes."
)]
struct Cli {
    /// Backup plan file (TOML)
    #[arg(short, long, global = true)]
    plan: Option<PathBuf>,

    /// Verbosity: -v info, -vv debug
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Produce a new dated snapshot of the origins
    Backup {
        /// Source locations to back up
        origins: Vec<String>,

        /// Storage root for snapshots
        #[arg(short = 'd', long)]
        dest: Option<PathBuf>,

        /// Exclude pattern for the sync tool (repeatable)
        #[arg(short, long = "exclude")]
        excludes: Vec<String>,

        /// Per-file size cap passed to the sync tool
        #[arg(short = 's', long)]
        max_size: Option<String>,

        /// Trial run: sync tool transfers nothing, pointer stays put
        #[arg(long)]
        dry_run: bool,
    },

    /// Find duplicate file content across all snapshots
    Check {
        /// Storage root
        root: Option<PathBuf>,

        /// Relink duplicates onto shared inodes (default: report only)
        #[arg(long)]
        repair: bool,

        /// Digest algorithm for content comparison
        #[arg(long)]
        hash: Option<HashAlgorithm>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Move aged snapshots into weekly buckets
    Rotate {
        /// Storage root
        root: Option<PathBuf>,

        /// Maximum top-level snapshots retained
        #[arg(short, long)]
        max: Option<usize>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let plan = match &cli.plan {
        Some(path) => Some(Plan::load(path)?),
        None => None,
    };

    match cli.command {
        Command::Backup {
            origins,
            dest,
            excludes,
            max_size,
            dry_run,
        } => {
            let mut plan = resolve_plan(plan, dest)?;
            if !origins.is_empty() {
                plan.origins = origins;
            }
            plan.excludes.extend(excludes);
            if let Some(max_size) = max_size {
                plan.max_size = max_size;
            }
            if plan.origins.is_empty() {
                return Err(eyre!("backup needs at least one origin"));
            }

            let report = backup(&plan, dry_run)?;
            print_backup(&report);
            if !report.sync_succeeded() && !report.dry_run {
                return Err(eyre!(
                    "sync command exited with code {}",
                    report.sync_exit_code
                ));
            }
        }

        Command::Check {
            root,
            repair,
            hash,
            format,
        } => {
            let resolved = resolve_plan(plan, root)?;
            let config = CheckConfig::builder()
                .root(resolved.root.clone())
                .repair(repair)
                .algorithm(hash.unwrap_or(resolved.hash_algorithm))
                .build()
                .map_err(|e| eyre!("invalid check configuration: {e}"))?;

            let report = check(&config)?;
            match format {
                OutputFormat::Text => print_check(&report),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }

        Command::Rotate { root, max, format } => {
            let resolved = resolve_plan(plan, root)?;
            let report = rotate(&resolved.root, max.unwrap_or(resolved.rotate_max))?;
            match format {
                OutputFormat::Text => print_rotate(&report),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
    }

    Ok(())
}

/// Merge the optional plan file with a command-line root override.
fn resolve_plan(plan: Option<Plan>, root: Option<PathBuf>) -> Result<Plan> {
    match (plan, root) {
        (Some(mut plan), Some(root)) => {
            plan.root = root;
            Ok(plan)
        }
        (Some(plan), None) => Ok(plan),
        (None, Some(root)) => Ok(Plan::new(root)),
        (None, None) => Err(eyre!("a storage root is required (argument or --plan)")),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_backup(report: &BackupReport) {
    if report.dry_run {
        println!(
            "dry run: sync exited with code {} for {}",
            report.sync_exit_code, report.snapshot
        );
        return;
    }
    if report.sync_succeeded() {
        println!(
            "snapshot {} created at {}",
            report.snapshot,
            report.path.display()
        );
    } else {
        println!(
            "snapshot {} failed (sync exit code {})",
            report.snapshot, report.sync_exit_code
        );
    }
    if report.last_pointer_updated {
        println!("last pointer -> {}", report.path.display());
    }
}

fn print_check(report: &CheckReport) {
    println!(
        "scanned {} files ({} inodes) across {} snapshot trees",
        report.files_scanned, report.inodes_indexed, report.trees_walked
    );
    println!(
        "{} duplicate clusters, {} paths relinked, {} inodes freed",
        report.clusters_found, report.paths_relinked, report.inodes_freed
    );
    let verb = if report.repaired {
        "reclaimed"
    } else {
        "reclaimable"
    };
    println!("{verb}: {}", format_size(report.bytes_reclaimed, BINARY));
    if !report.warnings.is_empty() {
        println!(
            "{} warnings (run with -v for details)",
            report.warnings.len()
        );
    }
}

fn print_rotate(report: &RotateReport) {
    if report.moved == 0 && report.move_failures == 0 {
        println!(
            "nothing to rotate ({} top-level snapshots)",
            report.snapshots_found
        );
        return;
    }
    println!(
        "rotated {} of {} snapshots into {} new bucket(s)",
        report.moved, report.snapshots_found, report.buckets_created
    );
    if report.move_failures > 0 {
        println!(
            "{} snapshot(s) could not be moved and were left in place",
            report.move_failures
        );
    }
    if let Some(target) = &report.last_pointer {
        println!("last pointer -> {}", target.display());
    }
}
