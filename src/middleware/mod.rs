//! Middleware module for the Campus HTTP server
//!
//! Provides:
//! - CORS: permissive origin plus a 204 short-circuit for preflight requests
//! - Request counting for `/metrics`

pub mod cors;
pub mod metrics;
