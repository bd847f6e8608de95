//! Common utilities and shared types for civicreport.
//!
//! This crate provides foundational components used across all civicreport
//! crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]

pub mod config;
pub mod error;

pub use config::{Config, DashboardConfig, DatabaseConfig, ServerConfig, WeekStart};
pub use error::{AppError, AppResult};
