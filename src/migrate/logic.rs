// migratetool/src/migrate/logic.rs
use anyhow::{Context, Result};

use crate::config::MigrationConfig;
use crate::migrate::{credentials, dump, files, transform};

#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// Skip the confirmation prompt before the destructive file tree copy.
    pub assume_yes: bool,
    /// Print the resolved plan without executing anything.
    pub dry_run: bool,
}

/// Describes the steps the pipeline would run, credentials omitted.
pub fn plan(config: &MigrationConfig) -> Vec<String> {
    vec![
        format!(
            "fetch-dump: mysqldump {} on {}@{} into {}, download to {}",
            config.source.mysql_db,
            config.source.ssh_user,
            config.source.host,
            config.transit.dump_filename,
            config.local_dump_path().display()
        ),
        format!(
            "transform-dump: {} mass rule(s), then base URLs ==> secure {} / unsecure {}",
            config.transit.rules.len(),
            config.destination.secure_base_url,
            config.destination.unsecure_base_url
        ),
        format!(
            "upload-dump: gzip {} and upload to {}@{}:{}",
            config.local_dump_path().display(),
            config.destination.ssh_user,
            config.destination.host,
            config.transit.dump_filename
        ),
        format!(
            "import-dump: mysql import into {} on {}@{}",
            config.destination.mysql_db, config.destination.ssh_user, config.destination.host
        ),
        format!(
            "copy-files: tar {} from {}@{}, WIPE {} on {}@{}, unpack",
            config.source.app_root,
            config.source.ssh_user,
            config.source.host,
            config.destination.app_root,
            config.destination.ssh_user,
            config.destination.host
        ),
        format!(
            "patch-config: rewrite credentials in {}@{}:{}",
            config.destination.ssh_user,
            config.destination.host,
            config.destination_config_path()
        ),
    ]
}

/// Runs the full migration pipeline in fixed order, halting on the first
/// failure. There is no rollback: a step that fails after the destination
/// tree was wiped leaves the destination inconsistent, and the fix is to
/// re-run from the failed step.
pub fn run_migrate_flow(config: &MigrationConfig, options: &MigrateOptions) -> Result<()> {
    if options.dry_run {
        println!("🗒 Dry run. The migration would perform:");
        for (index, step) in plan(config).iter().enumerate() {
            println!("  {}. {}", index + 1, step);
        }
        return Ok(());
    }

    println!(
        "🚀 Migrating {}@{} to {}@{}",
        config.source.mysql_db, config.source.host, config.destination.mysql_db, config.destination.host
    );

    dump::fetch_dump(config).context("Dump fetch step failed")?;
    transform::transform_dump(config).context("Dump transform step failed")?;
    dump::upload_dump(config).context("Dump upload step failed")?;
    dump::import_dump(config).context("Dump import step failed")?;
    files::copy_app_tree(config, options.assume_yes).context("File tree copy step failed")?;
    credentials::patch_credentials(config).context("Credential patch step failed")?;

    println!("🎉 Migration completed");
    Ok(())
}
