// migratetool/src/migrate/credentials.rs
use anyhow::{Context, Result};
use std::fs;
use tempfile::Builder as TempFileBuilder;

use crate::config::MigrationConfig;
use crate::remote::{self, RemoteHost};

/// Database credentials as they appear in the application's XML config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbCredentials {
    pub username: String,
    pub password: String,
    pub dbname: String,
}

fn cdata_field(tag: &str, value: &str) -> String {
    format!("<{0}><![CDATA[{1}]]></{0}>", tag, value)
}

/// Swaps the three CDATA-wrapped credential fields by exact substring match.
/// Fields that do not match the old credentials verbatim are left alone.
pub fn patch_credentials_content(
    content: &str,
    old: &DbCredentials,
    new: &DbCredentials,
) -> String {
    content
        .replace(
            &cdata_field("username", &old.username),
            &cdata_field("username", &new.username),
        )
        .replace(
            &cdata_field("password", &old.password),
            &cdata_field("password", &new.password),
        )
        .replace(
            &cdata_field("dbname", &old.dbname),
            &cdata_field("dbname", &new.dbname),
        )
}

/// Rewrites the destination's credential file so the migrated application
/// talks to the destination database.
///
/// The file is scp-fetched into a scratch directory, patched locally, and
/// uploaded back to the same path.
pub fn patch_credentials(config: &MigrationConfig) -> Result<()> {
    let destination = RemoteHost::new(&config.destination.ssh_user, &config.destination.host);
    let remote_config_path = config.destination_config_path();

    println!("🔧 Patching credentials in {}:{}", destination.target(), remote_config_path);

    let scratch = TempFileBuilder::new()
        .prefix("credential_patch_")
        .tempdir()
        .context("Failed to create scratch directory for credential patch")?;
    let local_config = scratch.path().join("local.xml");

    remote::download(&destination, &remote_config_path, &local_config)
        .context("Failed to fetch destination credential file")?;

    let content = fs::read_to_string(&local_config)
        .with_context(|| format!("Failed to read {}", local_config.display()))?;

    let old = DbCredentials {
        username: config.source.mysql_username.clone(),
        password: config.source.mysql_password.clone(),
        dbname: config.source.mysql_db.clone(),
    };
    let new = DbCredentials {
        username: config.destination.mysql_username.clone(),
        password: config.destination.mysql_password.clone(),
        dbname: config.destination.mysql_db.clone(),
    };
    let updated = patch_credentials_content(&content, &old, &new);

    fs::write(&local_config, &updated)
        .with_context(|| format!("Failed to write {}", local_config.display()))?;
    remote::upload(&destination, &local_config, &remote_config_path)
        .context("Failed to upload patched credential file")?;

    println!("✓ Credentials patched");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(username: &str, password: &str, dbname: &str) -> DbCredentials {
        DbCredentials {
            username: username.to_string(),
            password: password.to_string(),
            dbname: dbname.to_string(),
        }
    }

    const LOCAL_XML: &str = "<config><global><resources><default_setup><connection>\
        <host><![CDATA[localhost]]></host>\
        <username><![CDATA[shop]]></username>\
        <password><![CDATA[s3cret]]></password>\
        <dbname><![CDATA[shop_live]]></dbname>\
        </connection></default_setup></resources></global></config>";

    #[test]
    fn patches_all_three_cdata_fields() {
        let updated = patch_credentials_content(
            LOCAL_XML,
            &creds("shop", "s3cret", "shop_live"),
            &creds("shop_new", "n3wpass", "shop_staging"),
        );
        assert!(updated.contains("<username><![CDATA[shop_new]]></username>"));
        assert!(updated.contains("<password><![CDATA[n3wpass]]></password>"));
        assert!(updated.contains("<dbname><![CDATA[shop_staging]]></dbname>"));
        // Unrelated fields survive untouched.
        assert!(updated.contains("<host><![CDATA[localhost]]></host>"));
    }

    #[test]
    fn non_matching_old_credentials_leave_content_unchanged() {
        let updated = patch_credentials_content(
            LOCAL_XML,
            &creds("someone_else", "wrong", "other_db"),
            &creds("shop_new", "n3wpass", "shop_staging"),
        );
        assert_eq!(updated, LOCAL_XML);
    }
}
