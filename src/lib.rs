//! caltrack Library
//!
//! Daily calorie balance: meals in, workouts out, against a daily limit,
//! persisted to a key-value store.

pub mod build_info;
pub mod config;
pub mod db;
pub mod input;
pub mod mcp;
pub mod models;
pub mod storage;
pub mod tools;
pub mod tracker;
