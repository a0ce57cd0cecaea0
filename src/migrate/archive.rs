// migratetool/src/migrate/archive.rs
use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Gzip-compresses a single file.
pub fn gzip_file(source_path: &Path, dest_path: &Path) -> Result<PathBuf> {
    let mut source = File::open(source_path)
        .with_context(|| format!("Failed to open file for compression: {}", source_path.display()))?;
    let dest = File::create(dest_path)
        .with_context(|| format!("Failed to create compressed file: {}", dest_path.display()))?;

    let mut encoder = GzEncoder::new(dest, Compression::default());
    io::copy(&mut source, &mut encoder)
        .with_context(|| format!("Failed to compress {}", source_path.display()))?;
    encoder
        .finish()
        .with_context(|| format!("Failed to finish gzip encoding of {}", source_path.display()))?;

    Ok(dest_path.to_path_buf())
}

/// Decompresses a gzip file.
pub fn gunzip_file(source_path: &Path, dest_path: &Path) -> Result<PathBuf> {
    let source = File::open(source_path).with_context(|| {
        format!("Failed to open compressed file: {}", source_path.display())
    })?;
    let mut dest = File::create(dest_path)
        .with_context(|| format!("Failed to create output file: {}", dest_path.display()))?;

    let mut decoder = GzDecoder::new(source);
    io::copy(&mut decoder, &mut dest)
        .with_context(|| format!("Failed to decompress {}", source_path.display()))?;

    Ok(dest_path.to_path_buf())
}

/// Checks that a tar.gz archive is readable and returns its entry count.
///
/// Used as a sanity gate before the destructive destination wipe: a truncated
/// or corrupt transfer is caught here instead of after the old tree is gone.
pub fn verify_tar_gz(archive_path: &Path) -> Result<usize> {
    let archive_file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive file: {}", archive_path.display()))?;
    let decoder = GzDecoder::new(archive_file);
    let mut archive = tar::Archive::new(decoder);

    let mut count = 0usize;
    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read archive {}", archive_path.display()))?
    {
        entry.with_context(|| {
            format!("Corrupt entry in archive {}", archive_path.display())
        })?;
        count += 1;
    }

    if count == 0 {
        return Err(anyhow::anyhow!(
            "Archive {} contains no entries",
            archive_path.display()
        ));
    }
    Ok(count)
}
