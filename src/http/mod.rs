//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with the subtitle endpoints
//! - Case-insensitive query parameter access
//! - Error to status code mapping
//! - HTTP headers (Content-Type, Cache-Control)
//! - CORS middleware

pub mod handlers;
pub mod query;
pub mod routes;
pub mod subtitles;

pub use routes::create_router;
