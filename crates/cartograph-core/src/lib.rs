//! # cartograph-core
//!
//! Shared error handling, ambient configuration, and storage-path conventions
//! used by every other crate in the workspace. This crate knows nothing about
//! chunks, code nodes, or SQL — it is the seam each library crate converts its
//! own failures into.
//!
//! ## Module structure
//!
//! - [`error`]: the unified [`CoreError`] enum and `with_context()` hints.
//! - [`config`]: ambient CLI settings (log level, default search limit).
//! - [`paths`]: `AGENT_MEMORY_DB` / `AGENT_MEMORY_DIR` resolution and default
//!   note-scan glob patterns.

pub mod config;
pub mod error;
pub mod paths;

pub use config::Config;
pub use error::{CoreError, Result};
