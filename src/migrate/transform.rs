// migratetool/src/migrate/transform.rs
use anyhow::{Context, Result};
use std::fs;

use crate::config::MigrationConfig;
use crate::rewrite;

/// Applies the configured mass-replacement rules and the base URL rewrite to
/// the local dump, in place.
///
/// Nothing is written back unless every rewrite succeeds, so a malformed dump
/// leaves the file untouched.
pub fn transform_dump(config: &MigrationConfig) -> Result<()> {
    let dump_path = config.local_dump_path();
    println!("✏️ Transforming dump at {}", dump_path.display());

    let mut content = fs::read_to_string(&dump_path)
        .with_context(|| format!("Failed to read dump file {}", dump_path.display()))?;

    for (pattern, replacement) in &config.transit.rules {
        let (updated, occurrences) = rewrite::mass_replace(&content, pattern, replacement)
            .with_context(|| format!("Mass replacement failed for pattern `{}`", pattern))?;
        println!("Mass replacing {} ==> {} ({} occurrences)", pattern, replacement, occurrences);
        content = updated;
    }

    let (updated, (old_unsecure, old_secure)) = rewrite::rewrite_base_urls(
        &content,
        &config.destination.secure_base_url,
        &config.destination.unsecure_base_url,
    )
    .context("Base URL rewrite failed")?;
    println!(
        "Replacing {}: {} ==> {}",
        rewrite::UNSECURE_BASE_URL_KEY,
        old_unsecure,
        config.destination.unsecure_base_url
    );
    println!(
        "Replacing {}: {} ==> {}",
        rewrite::SECURE_BASE_URL_KEY,
        old_secure,
        config.destination.secure_base_url
    );

    fs::write(&dump_path, updated)
        .with_context(|| format!("Failed to write transformed dump {}", dump_path.display()))?;

    println!("✓ Dump transformed");
    Ok(())
}
