#![allow(dead_code)]

pub mod fake_engine;

use std::path::Path;

use batchdl_core::job::{JobIndex, JobSpec, MediaFormat, MediaKind, Quality};

/// Job specs for `urls`, indexed in order, all writing into `dir`.
pub fn jobs(urls: &[String], kind: MediaKind, dir: &Path) -> Vec<JobSpec> {
    urls.iter()
        .enumerate()
        .map(|(i, url)| JobSpec {
            index: JobIndex(i),
            url: url.clone(),
            kind,
            quality: Quality::Best,
            format: MediaFormat::default_for(kind),
            destination: dir.to_path_buf(),
        })
        .collect()
}

/// `https://media.example/<name>` for each name.
pub fn urls(names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|n| format!("https://media.example/{n}"))
        .collect()
}
