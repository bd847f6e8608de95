//! Core business logic for civicreport.

pub mod services;

pub use services::*;
