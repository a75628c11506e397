//! Storage layer for snowparam
//!
//! Configuration file handling and in-memory credentials. Nothing secret is
//! persisted.

use crate::error::StorageError;

pub mod config;
pub mod credentials;

type Result<T> = std::result::Result<T, StorageError>;
