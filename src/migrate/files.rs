// migratetool/src/migrate/files.rs
use anyhow::{Context, Result};
use std::io::{Write, stdin, stdout};

use crate::config::MigrationConfig;
use crate::errors::AppError;
use crate::migrate::archive;
use crate::remote::{self, RemoteHost};

/// Copies the application file tree from the source host to the destination
/// host via a tar.gz archive staged through the local transit directory.
///
/// The destination `app_root` is destructively cleared before unpacking, so
/// the step asks for confirmation unless `assume_yes` is set. The downloaded
/// archive is verified to be readable before anything on the destination is
/// touched.
pub fn copy_app_tree(config: &MigrationConfig, assume_yes: bool) -> Result<()> {
    let source = RemoteHost::new(&config.source.ssh_user, &config.source.host);
    let destination = RemoteHost::new(&config.destination.ssh_user, &config.destination.host);

    let source_root = config.source.app_root.trim_end_matches('/');
    let dest_root = config.destination.app_root.trim_end_matches('/');
    let (source_parent, source_base) = split_unix_path(source_root)?;
    let (dest_parent, dest_base) = split_unix_path(dest_root)?;

    let remote_archive = format!("/tmp/{}.tree.tar.gz", source_base);
    let local_archive = config.transit.local_dir.join(format!("{}.tree.tar.gz", source_base));

    println!("🌲 Archiving {} on {}", source_root, source.target());
    remote::run(&source, &format!("rm -f {}", remote_archive))
        .context("Failed to clear stale archive on source host")?;
    remote::run(
        &source,
        &format!("cd {} && tar -czf {} {}", source_parent, remote_archive, source_base),
    )
    .context("Failed to archive application tree on source host")?;

    remote::download(&source, &remote_archive, &local_archive)
        .context("Failed to download application tree archive")?;
    let entries = archive::verify_tar_gz(&local_archive)?;
    println!("✓ Archive downloaded and verified ({} entries)", entries);

    if !assume_yes {
        let question = format!(
            "This will delete {} on {} before unpacking. Continue? [yN]: ",
            dest_root,
            destination.target()
        );
        if !confirm(&question)? {
            return Err(AppError::Cancelled(
                "file tree copy aborted; destination left untouched".to_string(),
            )
            .into());
        }
    }

    println!("🚚 Unpacking tree into {} on {}", dest_parent, destination.target());
    remote::run(&destination, &format!("rm -f {}", remote_archive))
        .context("Failed to clear stale archive on destination host")?;
    remote::upload(&destination, &local_archive, &remote_archive)
        .context("Failed to upload application tree archive")?;

    for command in
        destination_unpack_commands(&remote_archive, dest_root, dest_parent, dest_base, source_base)
    {
        remote::run(&destination, &command)
            .with_context(|| format!("Failed on destination host: {}", command))?;
    }

    println!("✓ Application tree copied to {}:{}", destination.target(), dest_root);
    Ok(())
}

/// Commands run on the destination host once the archive is uploaded.
///
/// The archive always unpacks under the *source* tree's base name. Only the
/// application root itself is wiped, never its parent, and when the
/// destination root carries a different base name the unpacked tree is
/// renamed into place so the configured `app_root` is what actually exists
/// afterwards.
fn destination_unpack_commands(
    remote_archive: &str,
    dest_root: &str,
    dest_parent: &str,
    dest_base: &str,
    source_base: &str,
) -> Vec<String> {
    let mut commands = vec![
        format!("rm -rf {}", dest_root),
        format!("mkdir -p {}", dest_parent),
    ];
    if source_base != dest_base {
        // Stale unpack leftovers under the source name would otherwise merge
        // into the extracted tree.
        commands.push(format!("rm -rf {}/{}", dest_parent, source_base));
    }
    commands.push(format!("cd {} && tar -xzf {}", dest_parent, remote_archive));
    if source_base != dest_base {
        commands.push(format!("cd {} && mv {} {}", dest_parent, source_base, dest_base));
    }
    commands
}

/// Splits an absolute unix path into (parent, base name).
fn split_unix_path(path: &str) -> Result<(&str, &str)> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some(("", base)) if !base.is_empty() => Ok(("/", base)),
        Some((parent, base)) if !base.is_empty() => Ok((parent, base)),
        _ => Err(anyhow::anyhow!(
            "Cannot split path into parent and base name: {}",
            path
        )),
    }
}

/// Asks a yes/no question on the terminal. Only `y`/`Y` counts as yes.
pub fn confirm(question: &str) -> Result<bool> {
    print!("{}", question);
    stdout().flush().context("Failed to flush stdout")?;

    let mut input = String::new();
    stdin()
        .read_line(&mut input)
        .context("Failed to read user input")?;
    Ok(matches!(input.trim(), "y" | "Y"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_nested_path() -> anyhow::Result<()> {
        assert_eq!(
            split_unix_path("/var/www/old_site/shop")?,
            ("/var/www/old_site", "shop")
        );
        Ok(())
    }

    #[test]
    fn splits_path_with_trailing_slash() -> anyhow::Result<()> {
        assert_eq!(split_unix_path("/var/www/shop/")?, ("/var/www", "shop"));
        Ok(())
    }

    #[test]
    fn splits_top_level_path() -> anyhow::Result<()> {
        assert_eq!(split_unix_path("/srv")?, ("/", "srv"));
        Ok(())
    }

    #[test]
    fn rejects_unsplittable_paths() {
        assert!(split_unix_path("/").is_err());
        assert!(split_unix_path("shop").is_err());
    }

    #[test]
    fn matching_base_names_unpack_straight_into_place() {
        let commands = destination_unpack_commands(
            "/tmp/shop.tree.tar.gz",
            "/var/www/new_site/shop",
            "/var/www/new_site",
            "shop",
            "shop",
        );
        assert_eq!(
            commands,
            vec![
                "rm -rf /var/www/new_site/shop".to_string(),
                "mkdir -p /var/www/new_site".to_string(),
                "cd /var/www/new_site && tar -xzf /tmp/shop.tree.tar.gz".to_string(),
            ]
        );
    }

    #[test]
    fn differing_base_names_rename_the_unpacked_tree_to_the_destination_root() {
        let commands = destination_unpack_commands(
            "/tmp/shop.tree.tar.gz",
            "/var/www/new_site/store",
            "/var/www/new_site",
            "store",
            "shop",
        );
        // The wipe targets the configured destination root.
        assert_eq!(commands[0], "rm -rf /var/www/new_site/store");
        // Stale unpack leftovers under the source name are cleared first.
        assert_eq!(commands[2], "rm -rf /var/www/new_site/shop");
        // The unpacked tree ends up at the destination root, not under the
        // source tree's name.
        assert_eq!(
            commands.last().map(String::as_str),
            Some("cd /var/www/new_site && mv shop store")
        );
    }
}
