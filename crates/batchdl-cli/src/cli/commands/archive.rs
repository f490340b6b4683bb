//! `batchdl archive` – zip the media files in a directory.

use anyhow::{Context, Result};
use batchdl_core::aggregate::{scan_directory, write_archive};
use batchdl_core::job::MediaKind;
use std::path::Path;

pub fn run_archive(output: &Path, dir: &Path, kind: Option<MediaKind>) -> Result<()> {
    let files =
        scan_directory(dir, kind).with_context(|| format!("list {}", dir.display()))?;
    let written = write_archive(&files, output)
        .with_context(|| format!("write archive {}", output.display()))?;
    if written {
        println!("Archived {} file(s) to {}", files.len(), output.display());
    } else {
        println!("No media files in {}; nothing archived.", dir.display());
    }
    Ok(())
}
