//! Runtime configuration
//!
//! Read from the environment:
//! - `CALTRACK_DATABASE_PATH`: SQLite file (default `<project>/data/caltrack.db`)
//! - `CALTRACK_DEFAULT_LIMIT`: limit used until the user sets one (default 3000)

use std::path::PathBuf;

use crate::storage::DEFAULT_CALORIE_LIMIT;

pub const DATABASE_PATH_VAR: &str = "CALTRACK_DATABASE_PATH";
pub const DEFAULT_LIMIT_VAR: &str = "CALTRACK_DEFAULT_LIMIT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_path: PathBuf,
    pub default_limit: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(DATABASE_PATH_VAR).ok(),
            std::env::var(DEFAULT_LIMIT_VAR).ok(),
        )
    }

    fn from_vars(database_path: Option<String>, default_limit: Option<String>) -> Self {
        let database_path = database_path
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let default_limit = match default_limit.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_CALORIE_LIMIT,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "Ignoring {}={:?}: not an integer, using {}",
                    DEFAULT_LIMIT_VAR,
                    raw,
                    DEFAULT_CALORIE_LIMIT
                );
                DEFAULT_CALORIE_LIMIT
            }),
        };

        Self {
            database_path,
            default_limit,
        }
    }
}

/// `data/caltrack.db` next to the project root, found by walking up out of
/// `target/{debug,release}` when running from a cargo build
pub fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(project) = path.parent().and_then(|target| target.parent()) {
            path = project.to_path_buf();
        }
    }

    path.push("data");
    path.push("caltrack.db");
    path
}
