//! snowparam: collect Snowflake parameters at the ACCOUNT, SESSION, DATABASE
//! and WAREHOUSE levels and export them as a multi-sheet `.xlsx` workbook.

pub use error::AppError;

/// Main architecture layers (dependency flow: CLI → Core → Storage)
pub mod cli; // Command-line interface and interactive shell
pub mod core; // Scope model, collection and export
pub mod storage; // Configuration and in-memory credentials

/// Support modules (used across layers)
pub mod api; // Snowflake REST client
pub mod display; // Output formatting
pub mod error; // Error handling
pub mod utils; // Shared utilities and helpers

pub type Result<T> = std::result::Result<T, AppError>;
