//! Shared fixtures for gather integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use gatherer::{GatherOptions, Gatherer, ManifestHost};
use serde_json::{json, Value};

/// Writes a manifest module into `dir`.
pub fn write_module(dir: &Path, file: &str, gathered: bool, types: Vec<Value>) -> PathBuf {
    let path = dir.join(file);
    let manifest = json!({ "gathered": gathered, "types": types });
    std::fs::write(&path, manifest.to_string()).unwrap();
    path
}

/// Manifest entry for a marked type.
pub fn gathered_type(name: &str, capabilities: &[&str]) -> Value {
    json!({ "name": name, "gathered": true, "capabilities": capabilities })
}

/// Lays out the three-module playground:
/// - `plain.gather`: no participation marker
/// - `foo.gather`: `Foo {TypeA, TypeB, TypeC}`, `Bar {TypeB, TypeC}`
/// - `baz.gather`: `Baz {TypeA}`
pub fn playground(dir: &Path) {
    write_module(
        dir,
        "plain.gather",
        false,
        vec![gathered_type("Hidden", &["TypeA"])],
    );
    write_module(
        dir,
        "foo.gather",
        true,
        vec![
            gathered_type("Foo", &["TypeA", "TypeB", "TypeC"]),
            gathered_type("Bar", &["TypeB", "TypeC"]),
        ],
    );
    write_module(
        dir,
        "baz.gather",
        true,
        vec![gathered_type("Baz", &["TypeA"])],
    );
}

/// Gatherer over `directories` using manifest modules, logging into a buffer.
pub fn manifest_gatherer(directories: Vec<PathBuf>) -> (Gatherer, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    let gatherer = Gatherer::from_options(GatherOptions {
        directories,
        ..GatherOptions::default()
    })
    .unwrap()
    .with_host(ManifestHost::new())
    .with_logger(move |line| sink.lock().unwrap().push(line.to_string()));
    (gatherer, lines)
}

/// Sorted harvest names.
pub fn names(harvest: &[gatherer::Harvest]) -> Vec<String> {
    let mut names: Vec<String> = harvest.iter().map(|h| h.name().to_string()).collect();
    names.sort();
    names
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("gatherer=debug"))
        .with_test_writer()
        .try_init();
}
