//! Shared fixtures for overlay integration tests

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use trevfs_formats::builder::{TreBuilder, TreEntry};

/// Write a container holding `entries` into `dir` and return its path
pub fn write_tre(dir: &TempDir, name: &str, entries: Vec<TreEntry>) -> PathBuf {
    let mut builder = TreBuilder::new();
    for entry in entries {
        builder = builder.entry(entry);
    }
    write_image(dir, name, &builder.build().expect("fixture should build"))
}

/// Write raw container bytes into `dir` and return the path
pub fn write_image(dir: &TempDir, name: &str, image: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, image).expect("fixture should be written");
    path
}

/// Write a loose file under `dir`
pub fn write_loose(dir: &TempDir, logical: &str, data: &[u8]) {
    let path = dir.path().join(logical);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("fixture directory should be created");
    }
    fs::write(path, data).expect("fixture should be written");
}
