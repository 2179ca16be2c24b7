//! # Songduel Common Library
//!
//! Shared code for the songduel service and its tooling:
//! - Database models and schema initialization
//! - Configuration loading and root folder resolution
//! - Error types
//! - Timestamp and identifier helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
