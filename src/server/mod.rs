//! Server module for Campus
//!
//! Contains configuration, startup and the HTTP run loop.
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all server components
//! - `loader`: Configuration loading from files and environment
//! - `validation`: Startup checks and deployment warnings
//! - `init`: State wiring, router construction and run loop

pub mod config;
mod init;
mod loader;
mod validation;


// Re-export public API
pub use init::run;
pub use loader::load_config;
