//! Utils module - Shared utilities and helpers
//!
//! Used across the CLI, core and storage layers; depends on nothing above it.

/// Error conversion helpers
pub mod error_helpers;

/// Verbose printing and the tracing subscriber
pub mod logging;

/// Text truncation and cell formatting
pub mod text;

/// Input validation and identifier quoting
pub mod validation;
