//! # Clink Command-Line Library
//!
//! Support code for the `clink` binary, which builds gateway credentials and
//! connection requests from files and inspects captured frames.
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`commands`]: Command implementations

pub mod commands;
pub mod config;

// Re-export protocol for convenience
pub use clink_protocol;

pub use config::Config;
