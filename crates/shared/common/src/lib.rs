//! Common utilities shared across services.
//!
//! This crate provides:
//! - Unified error handling with HTTP response conversion
//! - Configuration structures and strict environment parsing

pub mod config;
pub mod error;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
