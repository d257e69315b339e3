//! Build script for caltrack
//!
//! Bumps a persistent build counter and embeds it with a UTC timestamp.

use std::fs;
use std::path::Path;

const BUILD_NUMBER_FILE: &str = "build_number.txt";

fn previous_build(path: &Path) -> u64 {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

fn main() {
    println!("cargo:rerun-if-changed=src");

    let counter = Path::new(BUILD_NUMBER_FILE);
    let build = previous_build(counter) + 1;
    fs::write(counter, build.to_string()).expect("Failed to write build number file");

    let stamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    println!("cargo:rustc-env=CALTRACK_BUILD_NUMBER={}", build);
    println!("cargo:rustc-env=CALTRACK_BUILD_TIMESTAMP={}", stamp);
    println!("cargo:warning=caltrack build #{} at {}", build, stamp);
}
