//! Core layer: scope model, warehouse seam, services and the session context

pub mod scope;
pub mod services;
pub mod session;
pub mod warehouse;

pub use session::{CommandOutcome, SessionCommand, SessionContext};
