//! CLI command handlers, one file per command.

mod archive;
mod config;
mod download;
mod list;

pub use archive::run_archive;
pub use config::run_config;
pub use download::{run_download, DownloadOptions};
#[cfg(test)]
pub(crate) use download::history_lines;
pub use list::run_list;

/// Human-readable byte count (KiB/MiB/GiB).
pub(crate) fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
