//! Web shop migration tool
//!
//! Moves a web application between hosts: dumps the source database, rewrites
//! the base URLs embedded in the dump, imports it on the destination, copies
//! the application file tree and patches the destination credential file.

// migratetool/src/main.rs
mod config;
mod errors;
mod migrate;
mod remote;
mod rewrite;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::MigrationConfig;
use migrate::MigrateOptions;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "migratetool",
    version,
    about = "Migrate a web shop's database and file tree between two hosts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite the base URLs inside a database dump file.
    Adjust(AdjustArgs),
    /// Run the full migration pipeline.
    Migrate(MigrateArgs),
    /// Run a single migration step.
    Step(StepArgs),
    /// Print the resolved migration configuration.
    Config {
        /// Path to the migration config JSON file.
        config: PathBuf,
    },
}

#[derive(Args)]
struct AdjustArgs {
    /// The SQL dump file to adjust.
    #[arg(short = 'd', long = "dumpfile")]
    dumpfile: PathBuf,

    /// New base URL for both the secure and unsecure key.
    #[arg(short = 'b', long = "base")]
    base_url: Option<String>,

    /// New secure base URL.
    #[arg(short = 's', long = "secure-base")]
    secure_base_url: Option<String>,

    /// New unsecure base URL.
    #[arg(short = 'u', long = "unsecure-base")]
    unsecure_base_url: Option<String>,

    /// Write the adjusted dump here instead of stdout.
    #[arg(short = 'o', long = "out")]
    out_file: Option<PathBuf>,

    /// Report each replacement on stderr.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

#[derive(Args)]
struct MigrateArgs {
    /// Path to the migration config JSON file.
    config: PathBuf,

    /// Skip the confirmation prompt before destructive steps.
    #[arg(long = "yes")]
    yes: bool,

    /// Print the plan without executing anything.
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[derive(Args)]
struct StepArgs {
    /// Path to the migration config JSON file.
    config: PathBuf,

    /// The pipeline step to run.
    #[arg(value_enum)]
    step: StepName,

    /// Skip the confirmation prompt before destructive steps.
    #[arg(long = "yes")]
    yes: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StepName {
    FetchDump,
    TransformDump,
    UploadDump,
    ImportDump,
    CopyFiles,
    PatchConfig,
}

fn main() -> ExitCode {
    match run_app() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Adjust(args) => Ok(run_adjust(args)?),
        Command::Migrate(args) => {
            let migration_config = MigrationConfig::load(&args.config)?;
            let options = MigrateOptions {
                assume_yes: args.yes,
                dry_run: args.dry_run,
            };
            migrate::run_migrate_flow(&migration_config, &options)
        }
        Command::Step(args) => {
            let migration_config = MigrationConfig::load(&args.config)?;
            run_step(&migration_config, args.step, args.yes)
        }
        Command::Config { config } => {
            let migration_config = MigrationConfig::load(&config)?;
            migration_config.print_summary();
            Ok(())
        }
    }
}

fn run_step(config: &MigrationConfig, step: StepName, assume_yes: bool) -> Result<()> {
    match step {
        StepName::FetchDump => migrate::dump::fetch_dump(config).map(|_| ()),
        StepName::TransformDump => migrate::transform::transform_dump(config),
        StepName::UploadDump => migrate::dump::upload_dump(config),
        StepName::ImportDump => migrate::dump::import_dump(config),
        StepName::CopyFiles => migrate::files::copy_app_tree(config, assume_yes),
        StepName::PatchConfig => migrate::credentials::patch_credentials(config),
    }
}

/// Resolves the `-b` / `-s` / `-u` flags into a `(secure, unsecure)` pair.
fn resolve_base_urls(args: &AdjustArgs) -> Result<(String, String)> {
    if let Some(base) = &args.base_url {
        return Ok((base.clone(), base.clone()));
    }
    match (&args.secure_base_url, &args.unsecure_base_url) {
        (Some(secure), Some(unsecure)) => Ok((secure.clone(), unsecure.clone())),
        _ => anyhow::bail!(
            "We need a base URL (-b) or both secure (-s) and unsecure (-u) base URLs."
        ),
    }
}

fn run_adjust(args: AdjustArgs) -> errors::Result<()> {
    let (secure_url, unsecure_url) = resolve_base_urls(&args)?;

    let original_content = fs::read_to_string(&args.dumpfile)?;

    let (updated_dump, (old_unsecure, old_secure)) =
        rewrite::rewrite_base_urls(&original_content, &secure_url, &unsecure_url)?;

    if args.verbose {
        eprintln!(
            "replacing {}: {} ==> {}",
            rewrite::UNSECURE_BASE_URL_KEY,
            old_unsecure,
            unsecure_url
        );
        eprintln!(
            "replacing {}: {} ==> {}",
            rewrite::SECURE_BASE_URL_KEY,
            old_secure,
            secure_url
        );
    }

    match &args.out_file {
        Some(out_file) => {
            if out_file.exists() && !migrate::files::confirm("Overwrite existing file? [yN]: ")? {
                eprintln!("Nothing changed.");
                return Ok(());
            }
            fs::write(out_file, &updated_dump)?;
            eprintln!("Wrote adjusted dump to {}", out_file.display());
        }
        None => print!("{}", updated_dump),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjust_args(
        base: Option<&str>,
        secure: Option<&str>,
        unsecure: Option<&str>,
    ) -> AdjustArgs {
        AdjustArgs {
            dumpfile: PathBuf::from("dump.sql"),
            base_url: base.map(String::from),
            secure_base_url: secure.map(String::from),
            unsecure_base_url: unsecure.map(String::from),
            out_file: None,
            verbose: false,
        }
    }

    #[test]
    fn combined_base_url_covers_both_keys() -> anyhow::Result<()> {
        let (secure, unsecure) =
            resolve_base_urls(&adjust_args(Some("http://localhost:8888/shop/"), None, None))?;
        assert_eq!(secure, "http://localhost:8888/shop/");
        assert_eq!(unsecure, "http://localhost:8888/shop/");
        Ok(())
    }

    #[test]
    fn separate_urls_are_kept_apart() -> anyhow::Result<()> {
        let (secure, unsecure) = resolve_base_urls(&adjust_args(
            None,
            Some("https://s.example.com/"),
            Some("http://u.example.com/"),
        ))?;
        assert_eq!(secure, "https://s.example.com/");
        assert_eq!(unsecure, "http://u.example.com/");
        Ok(())
    }

    #[test]
    fn missing_urls_are_rejected() {
        assert!(resolve_base_urls(&adjust_args(None, Some("https://s.example.com/"), None)).is_err());
        assert!(resolve_base_urls(&adjust_args(None, None, None)).is_err());
    }

    #[test]
    fn adjust_reports_unreadable_dumpfile_as_io_error() {
        let mut args = adjust_args(Some("http://localhost:8888/shop/"), None, None);
        args.dumpfile = PathBuf::from("no-such-dir/no-such-dump.sql");
        let err = run_adjust(args).unwrap_err();
        assert!(matches!(err, errors::AppError::Io(_)));
    }

    #[test]
    fn adjust_without_urls_surfaces_a_usage_error() {
        let err = run_adjust(adjust_args(None, None, None)).unwrap_err();
        assert!(matches!(err, errors::AppError::Anyhow(_)));
    }

    #[test]
    fn cli_parses_adjust_flags() {
        let cli = Cli::try_parse_from([
            "migratetool",
            "adjust",
            "-d",
            "dump.sql",
            "-b",
            "http://localhost:8888/shop/",
            "-o",
            "adjusted.sql",
            "-v",
        ])
        .expect("adjust flags must parse");
        match cli.command {
            Command::Adjust(args) => {
                assert_eq!(args.dumpfile, PathBuf::from("dump.sql"));
                assert_eq!(args.base_url.as_deref(), Some("http://localhost:8888/shop/"));
                assert_eq!(args.out_file, Some(PathBuf::from("adjusted.sql")));
                assert!(args.verbose);
            }
            _ => panic!("expected adjust subcommand"),
        }
    }

    #[test]
    fn cli_parses_step_names() {
        let cli = Cli::try_parse_from([
            "migratetool",
            "step",
            "migration.json",
            "copy-files",
            "--yes",
        ])
        .expect("step flags must parse");
        match cli.command {
            Command::Step(args) => {
                assert!(matches!(args.step, StepName::CopyFiles));
                assert!(args.yes);
            }
            _ => panic!("expected step subcommand"),
        }
    }
}
