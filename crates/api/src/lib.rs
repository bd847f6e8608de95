//! HTTP API layer for civicreport.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: report submission/search, lifecycle, dashboard, categories
//! - **Middleware**: application state shared across handlers
//! - **Response**: the uniform `{ success, data | message }` envelope
//!
//! Built on Axum 0.8 with Tower middleware stack. Authentication is handled
//! upstream; the routes here trust the caller identity the boundary passes in.

pub mod endpoints;
pub mod middleware;
pub mod response;

pub use endpoints::router;
