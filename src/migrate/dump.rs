// migratetool/src/migrate/dump.rs
use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{DestinationConfig, MigrationConfig, SourceConfig};
use crate::migrate::archive;
use crate::remote::{self, RemoteHost};

/// Shell command that dumps the source database into the transit file.
pub fn mysqldump_command(source: &SourceConfig, dump_path: &str) -> String {
    format!(
        "{} --compatible=mysql40 --user={} --password={} {} > {}",
        source.mysqldump_exe, source.mysql_username, source.mysql_password, source.mysql_db, dump_path
    )
}

/// Shell command that imports the transit file into the destination database.
pub fn mysql_import_command(destination: &DestinationConfig, dump_path: &str) -> String {
    format!(
        "{} --user={} --password={} {} < {}",
        destination.mysql_exe,
        destination.mysql_username,
        destination.mysql_password,
        destination.mysql_db,
        dump_path
    )
}

/// Fetches a fresh dump from the source host into the local transit directory.
///
/// Remote and local leftovers from earlier runs are cleared first. The dump is
/// gzipped on the source host, downloaded, decompressed, and a timestamped
/// pristine copy is kept next to it so a botched transformation can be redone
/// without another remote dump.
pub fn fetch_dump(config: &MigrationConfig) -> Result<PathBuf> {
    let source = RemoteHost::new(&config.source.ssh_user, &config.source.host);
    let remote_dump = &config.transit.dump_filename;
    let local_dump = config.local_dump_path();
    let local_gz = gz_path(&local_dump);

    println!("📦 Fetching dump of {} from {}", config.source.mysql_db, source.target());

    remote::run(&source, &format!("rm -f {0} {0}.gz", remote_dump))
        .context("Failed to clear remote transit files on source host")?;
    for stale in [&local_dump, &local_gz] {
        if stale.exists() {
            fs::remove_file(stale)
                .with_context(|| format!("Failed to remove stale file {}", stale.display()))?;
        }
    }

    remote::run(&source, &mysqldump_command(&config.source, remote_dump))
        .context("mysqldump on source host failed")?;
    remote::run(&source, &format!("gzip {}", remote_dump))
        .context("Failed to compress dump on source host")?;

    remote::download(&source, &format!("{}.gz", remote_dump), &local_gz)
        .context("Failed to download compressed dump")?;
    archive::gunzip_file(&local_gz, &local_dump)?;
    fs::remove_file(&local_gz)
        .with_context(|| format!("Failed to remove {}", local_gz.display()))?;

    let pristine = pristine_copy_path(&local_dump);
    fs::copy(&local_dump, &pristine)
        .with_context(|| format!("Failed to keep pristine copy at {}", pristine.display()))?;

    println!("✓ Dump fetched to {} (pristine copy: {})", local_dump.display(), pristine.display());
    Ok(local_dump)
}

/// Uploads the transformed local dump to the destination host's transit path.
pub fn upload_dump(config: &MigrationConfig) -> Result<()> {
    let destination = RemoteHost::new(&config.destination.ssh_user, &config.destination.host);
    let remote_dump = &config.transit.dump_filename;
    let local_dump = config.local_dump_path();
    let local_gz = gz_path(&local_dump);

    if !local_dump.is_file() {
        anyhow::bail!(
            "Local dump {} does not exist. Run the fetch-dump step first.",
            local_dump.display()
        );
    }

    println!("📤 Uploading dump to {}", destination.target());

    remote::run(&destination, &format!("rm -f {0} {0}.gz", remote_dump))
        .context("Failed to clear remote transit files on destination host")?;

    archive::gzip_file(&local_dump, &local_gz)?;
    remote::upload(&destination, &local_gz, &format!("{}.gz", remote_dump))
        .context("Failed to upload compressed dump")?;
    fs::remove_file(&local_gz)
        .with_context(|| format!("Failed to remove {}", local_gz.display()))?;

    remote::run(&destination, &format!("gunzip {}.gz", remote_dump))
        .context("Failed to decompress dump on destination host")?;

    println!("✓ Dump uploaded to {}:{}", destination.target(), remote_dump);
    Ok(())
}

/// Imports the uploaded dump into the destination database. Database engine
/// errors propagate unfiltered.
pub fn import_dump(config: &MigrationConfig) -> Result<()> {
    let destination = RemoteHost::new(&config.destination.ssh_user, &config.destination.host);

    println!(
        "🗄 Importing dump into {} on {}",
        config.destination.mysql_db,
        destination.target()
    );
    remote::run(
        &destination,
        &mysql_import_command(&config.destination, &config.transit.dump_filename),
    )
    .context("mysql import on destination host failed")?;

    println!("✓ Dump imported into {}", config.destination.mysql_db);
    Ok(())
}

fn gz_path(path: &Path) -> PathBuf {
    let mut gz = path.as_os_str().to_os_string();
    gz.push(".gz");
    PathBuf::from(gz)
}

fn pristine_copy_path(path: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d_%H_%M_%S");
    let mut copy = path.as_os_str().to_os_string();
    copy.push(format!(".orig-{}", timestamp));
    PathBuf::from(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MigrationConfig;
    use serde_json::json;

    fn sample_config() -> MigrationConfig {
        serde_json::from_value(json!({
            "source": {
                "host": "old.example.com",
                "ssh_user": "deploy",
                "mysql_username": "shop",
                "mysql_password": "s3cret",
                "mysql_db": "shop_live",
                "app_root": "/var/www/old_site/shop"
            },
            "destination": {
                "host": "new.example.com",
                "ssh_user": "deploy",
                "mysql_username": "shop_new",
                "mysql_password": "n3wpass",
                "mysql_db": "shop_staging",
                "app_root": "/var/www/new_site/shop",
                "secure_base_url": "https://staging.example.com/",
                "unsecure_base_url": "http://staging.example.com/"
            },
            "transit": {
                "dump_filename": "/tmp/shop_live.sql"
            }
        }))
        .expect("sample config must parse")
    }

    #[test]
    fn mysqldump_command_targets_source_database() {
        let config = sample_config();
        assert_eq!(
            mysqldump_command(&config.source, "/tmp/shop_live.sql"),
            "mysqldump --compatible=mysql40 --user=shop --password=s3cret shop_live > /tmp/shop_live.sql"
        );
    }

    #[test]
    fn mysql_import_command_feeds_dump_to_destination_database() {
        let config = sample_config();
        assert_eq!(
            mysql_import_command(&config.destination, "/tmp/shop_live.sql"),
            "mysql --user=shop_new --password=n3wpass shop_staging < /tmp/shop_live.sql"
        );
    }

    #[test]
    fn gz_path_appends_extension() {
        assert_eq!(
            gz_path(&PathBuf::from("./shop_live.sql")),
            PathBuf::from("./shop_live.sql.gz")
        );
    }
}
