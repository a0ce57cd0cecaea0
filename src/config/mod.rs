// migratetool/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::errors::AppError;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

const DEFAULT_MYSQL_EXE: &str = "mysql";
const DEFAULT_MYSQLDUMP_EXE: &str = "mysqldump";
const DEFAULT_CONFIG_FILE: &str = "app/etc/local.xml";

fn default_mysql_exe() -> String {
    DEFAULT_MYSQL_EXE.to_string()
}

fn default_mysqldump_exe() -> String {
    DEFAULT_MYSQLDUMP_EXE.to_string()
}

fn default_config_file() -> String {
    DEFAULT_CONFIG_FILE.to_string()
}

fn default_local_dir() -> PathBuf {
    PathBuf::from(".")
}

/// The machine the application currently lives on.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub host: String,
    pub ssh_user: String,
    #[serde(default = "default_mysql_exe")]
    pub mysql_exe: String,
    #[serde(default = "default_mysqldump_exe")]
    pub mysqldump_exe: String,
    pub mysql_username: String,
    pub mysql_password: String,
    pub mysql_db: String,
    pub app_root: String,
}

/// The machine the application is being moved to.
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationConfig {
    pub host: String,
    pub ssh_user: String,
    #[serde(default = "default_mysql_exe")]
    pub mysql_exe: String,
    pub mysql_username: String,
    pub mysql_password: String,
    pub mysql_db: String,
    pub app_root: String,
    pub secure_base_url: String,
    pub unsecure_base_url: String,
    /// Credential file to patch, relative to `app_root`.
    #[serde(default = "default_config_file")]
    pub config_file: String,
}

/// Scratch locations and mass-replacement rules used while the dump is in
/// transit between the two hosts.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitConfig {
    /// Remote scratch path for the dump, used on both hosts.
    pub dump_filename: String,
    /// Local working directory for the downloaded dump and archives.
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,
    /// Extra `[pattern, replacement]` pairs applied to the dump before the
    /// base URL rewrite.
    #[serde(default)]
    pub rules: Vec<(String, String)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigrationConfig {
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    pub transit: TransitConfig,
}

impl MigrationConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        let config: MigrationConfig = serde_json::from_str(&config_content).with_context(|| {
            format!(
                "Failed to parse JSON from config file at {}",
                config_path.display()
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("source.host", &self.source.host),
            ("source.ssh_user", &self.source.ssh_user),
            ("source.mysql_db", &self.source.mysql_db),
            ("source.app_root", &self.source.app_root),
            ("destination.host", &self.destination.host),
            ("destination.ssh_user", &self.destination.ssh_user),
            ("destination.mysql_db", &self.destination.mysql_db),
            ("destination.app_root", &self.destination.app_root),
            ("transit.dump_filename", &self.transit.dump_filename),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "{} cannot be empty in the config file",
                    field
                ))
                .into());
            }
        }

        Url::parse(&self.destination.secure_base_url).with_context(|| {
            format!(
                "destination.secure_base_url is not a valid URL: {}",
                self.destination.secure_base_url
            )
        })?;
        Url::parse(&self.destination.unsecure_base_url).with_context(|| {
            format!(
                "destination.unsecure_base_url is not a valid URL: {}",
                self.destination.unsecure_base_url
            )
        })?;

        Ok(())
    }

    /// The local path the fetched dump lands at: the transit filename's base
    /// name inside the local working directory.
    pub fn local_dump_path(&self) -> PathBuf {
        let file_name = Path::new(&self.transit.dump_filename)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "dump.sql".into());
        self.transit.local_dir.join(file_name)
    }

    /// Remote path of the credential file on the destination host.
    pub fn destination_config_path(&self) -> String {
        format!(
            "{}/{}",
            self.destination.app_root.trim_end_matches('/'),
            self.destination.config_file
        )
    }

    /// Prints a `[section] key ==> value` summary, with passwords masked.
    pub fn print_summary(&self) {
        let entries = [
            ("source", "host", self.source.host.clone()),
            ("source", "ssh_user", self.source.ssh_user.clone()),
            ("source", "mysql_exe", self.source.mysql_exe.clone()),
            ("source", "mysqldump_exe", self.source.mysqldump_exe.clone()),
            ("source", "mysql_username", self.source.mysql_username.clone()),
            ("source", "mysql_password", "********".to_string()),
            ("source", "mysql_db", self.source.mysql_db.clone()),
            ("source", "app_root", self.source.app_root.clone()),
            ("destination", "host", self.destination.host.clone()),
            ("destination", "ssh_user", self.destination.ssh_user.clone()),
            ("destination", "mysql_exe", self.destination.mysql_exe.clone()),
            (
                "destination",
                "mysql_username",
                self.destination.mysql_username.clone(),
            ),
            ("destination", "mysql_password", "********".to_string()),
            ("destination", "mysql_db", self.destination.mysql_db.clone()),
            ("destination", "app_root", self.destination.app_root.clone()),
            (
                "destination",
                "secure_base_url",
                self.destination.secure_base_url.clone(),
            ),
            (
                "destination",
                "unsecure_base_url",
                self.destination.unsecure_base_url.clone(),
            ),
            (
                "destination",
                "config_file",
                self.destination.config_file.clone(),
            ),
            ("transit", "dump_filename", self.transit.dump_filename.clone()),
            (
                "transit",
                "local_dir",
                self.transit.local_dir.display().to_string(),
            ),
        ];
        for (section, key, value) in entries {
            println!("[{}] {} ==> {}", section, key, value);
        }
        for (pattern, replacement) in &self.transit.rules {
            println!("[transit] rule ==> {} -> {}", pattern, replacement);
        }
    }
}
