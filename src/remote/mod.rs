// migratetool/src/remote/mod.rs
//! Remote execution and file transfer over a pre-authenticated SSH channel.
//!
//! Commands run through the system `ssh`/`scp` binaries with `BatchMode=yes`,
//! so a missing key or unreachable host fails immediately instead of hanging
//! on a password prompt.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use which::which;

#[derive(Debug, Clone)]
pub struct RemoteHost {
    pub user: String,
    pub host: String,
}

impl RemoteHost {
    pub fn new(user: &str, host: &str) -> Self {
        Self {
            user: user.to_string(),
            host: host.to_string(),
        }
    }

    /// SSH destination in `user@host` form.
    pub fn target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// scp location in `user@host:path` form.
    pub fn scp_path(&self, remote_path: &str) -> String {
        format!("{}@{}:{}", self.user, self.host, remote_path)
    }
}

fn find_ssh_executable() -> Result<PathBuf> {
    which("ssh").context("ssh executable not found in PATH")
}

fn find_scp_executable() -> Result<PathBuf> {
    which("scp").context("scp executable not found in PATH")
}

/// Runs a shell command on the remote host and returns its stdout.
pub fn run(host: &RemoteHost, command: &str) -> Result<String> {
    let ssh_path = find_ssh_executable()?;
    let output = Command::new(&ssh_path)
        .arg("-o")
        .arg("BatchMode=yes")
        .arg(host.target())
        .arg(command)
        .output()
        .with_context(|| format!("Failed to execute ssh to {}", host.target()))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "Remote command `{}` on {} failed with status: {}\nStdout: {}\nStderr: {}",
            command,
            host.target(),
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Copies a local file to a path on the remote host.
pub fn upload(host: &RemoteHost, local_path: &Path, remote_path: &str) -> Result<()> {
    let scp_path = find_scp_executable()?;
    let output = Command::new(&scp_path)
        .arg("-o")
        .arg("BatchMode=yes")
        .arg("-q")
        .arg(local_path)
        .arg(host.scp_path(remote_path))
        .output()
        .with_context(|| {
            format!(
                "Failed to execute scp upload of {} to {}",
                local_path.display(),
                host.scp_path(remote_path)
            )
        })?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "scp upload of {} to {} failed with status: {}\nStderr: {}",
            local_path.display(),
            host.scp_path(remote_path),
            output.status,
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    Ok(())
}

/// Copies a file from the remote host to a local path.
pub fn download(host: &RemoteHost, remote_path: &str, local_path: &Path) -> Result<()> {
    let scp_path = find_scp_executable()?;
    let output = Command::new(&scp_path)
        .arg("-o")
        .arg("BatchMode=yes")
        .arg("-q")
        .arg(host.scp_path(remote_path))
        .arg(local_path)
        .output()
        .with_context(|| {
            format!(
                "Failed to execute scp download of {} to {}",
                host.scp_path(remote_path),
                local_path.display()
            )
        })?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "scp download of {} to {} failed with status: {}\nStderr: {}",
            host.scp_path(remote_path),
            local_path.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_formats_user_at_host() {
        let host = RemoteHost::new("deploy", "shop.example.com");
        assert_eq!(host.target(), "deploy@shop.example.com");
    }

    #[test]
    fn scp_path_appends_remote_path() {
        let host = RemoteHost::new("deploy", "shop.example.com");
        assert_eq!(
            host.scp_path("/tmp/shop_live.sql.gz"),
            "deploy@shop.example.com:/tmp/shop_live.sql.gz"
        );
    }
}
