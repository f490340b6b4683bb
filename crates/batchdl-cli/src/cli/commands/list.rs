//! `batchdl list` – media files in a directory.

use anyhow::{Context, Result};
use batchdl_core::aggregate::scan_directory;
use batchdl_core::job::MediaKind;
use std::path::Path;

use super::format_size;

pub fn run_list(dir: &Path, kind: Option<MediaKind>) -> Result<()> {
    let files =
        scan_directory(dir, kind).with_context(|| format!("list {}", dir.display()))?;
    if files.is_empty() {
        println!("No media files in {}.", dir.display());
        return Ok(());
    }
    println!("{:<10} {:<20} {}", "SIZE", "MODIFIED", "NAME");
    for f in files {
        println!(
            "{:<10} {:<20} {}",
            format_size(f.size),
            f.modified.format("%Y-%m-%d %H:%M:%S").to_string(),
            f.file_name()
        );
    }
    Ok(())
}
