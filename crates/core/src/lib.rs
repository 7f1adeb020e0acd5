//! Abunda Core Library
//!
//! This crate provides the foundational utilities shared by every Abunda crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Layered configuration (`AppConfig` and its settings sections)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
