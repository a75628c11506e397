//! Snowflake credentials
//!
//! Credentials live in process memory for the length of one session and are
//! never written to the config file or any other store. The password comes
//! from `--password`, the SNOWFLAKE_PASSWORD environment variable, or a
//! no-echo prompt.

use crate::error::{CliError, ConnectionError};
use crate::utils::validation::validate_required;
use std::env;
use std::fmt;

pub const PASSWORD_ENV: &str = "SNOWFLAKE_PASSWORD";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub account: String,
    pub user: String,
    password: String,
}

impl Credentials {
    pub fn new(account: String, user: String, password: String) -> Self {
        Self {
            account,
            user,
            password,
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Presence check only; the service validates the values themselves.
    pub fn validate(&self) -> Result<(), ConnectionError> {
        validate_required("account", &self.account)?;
        validate_required("user", &self.user)?;
        validate_required("password", &self.password)?;
        Ok(())
    }
}

// Keep the secret out of verbose output and panics
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &"*****")
            .finish()
    }
}

/// Password from the environment, if set and non-empty
pub fn get_password_from_env() -> Option<String> {
    env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty())
}

/// Ask for the password without echo when attached to a terminal.
///
/// Returns `Ok(None)` when stdin is not interactive so callers can report a
/// missing field instead of blocking.
pub fn prompt_password(account: &str, user: &str) -> Result<Option<String>, CliError> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let prompt = format!("Password for {}@{}: ", user, account);
    rpassword::prompt_password(prompt)
        .map(|p| Some(p).filter(|p| !p.is_empty()))
        .map_err(|e| CliError::Input(format!("Failed to read password: {}", e)))
}
