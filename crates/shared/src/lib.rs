//! Shared types, errors, and configuration for Girder.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Decimal precision rules for quantities, costs, and balances
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

#[cfg(test)]
mod error_tests;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
