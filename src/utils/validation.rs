//! Input validation and identifier handling
//!
//! Object names discovered from Snowflake are interpolated into
//! `SHOW PARAMETERS IN ...` statements, so they go through [`quote_identifier`]
//! instead of being spliced in verbatim.

use crate::error::{CliError, ConnectionError, QueryError};

/// Words that cannot appear as unquoted identifiers.
const RESERVED_KEYWORDS: &[&str] = &[
    "ACCOUNT", "ALL", "ALTER", "AND", "ANY", "AS", "BETWEEN", "BY", "CASE", "CAST", "CHECK",
    "COLUMN", "CONNECT", "CONNECTION", "CONSTRAINT", "CREATE", "CROSS", "CURRENT",
    "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER", "DATABASE", "DELETE",
    "DISTINCT", "DROP", "ELSE", "EXISTS", "FALSE", "FOLLOWING", "FOR", "FROM", "FULL", "GRANT",
    "GROUP", "GSCLUSTER", "HAVING", "ILIKE", "IN", "INCREMENT", "INNER", "INSERT", "INTERSECT",
    "INTO", "IS", "ISSUE", "JOIN", "LATERAL", "LEFT", "LIKE", "LOCALTIME", "LOCALTIMESTAMP",
    "MINUS", "NATURAL", "NOT", "NULL", "OF", "ON", "OR", "ORDER", "ORGANIZATION", "QUALIFY",
    "REGEXP", "REVOKE", "RIGHT", "RLIKE", "ROW", "ROWS", "SAMPLE", "SCHEMA", "SELECT", "SET",
    "SOME", "START", "TABLE", "TABLESAMPLE", "THEN", "TO", "TRIGGER", "TRUE", "TRY_CAST",
    "UNION", "UNIQUE", "UPDATE", "USING", "VALUES", "VIEW", "WAREHOUSE", "WHEN", "WHENEVER",
    "WHERE", "WITH",
];

/// Render an object name as a Snowflake identifier.
///
/// Names that resolve to themselves when unquoted (upper-case letters, digits,
/// `_` and `$`, not starting with a digit or `$`, not a reserved word) are
/// returned bare. Everything else is double-quoted with embedded quotes doubled,
/// which makes Snowflake match the name exactly.
pub fn quote_identifier(name: &str) -> Result<String, QueryError> {
    if name.is_empty() {
        return Err(QueryError::InvalidIdentifier {
            name: name.to_string(),
            reason: "identifier cannot be empty".to_string(),
        });
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(QueryError::InvalidIdentifier {
            name: name.escape_debug().to_string(),
            reason: "identifier contains control characters".to_string(),
        });
    }

    if is_plain_identifier(name) {
        Ok(name.to_string())
    } else {
        Ok(format!("\"{}\"", name.replace('"', "\"\"")))
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_uppercase() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '$');

    starts_ok && rest_ok && !RESERVED_KEYWORDS.contains(&name)
}

/// Ensure a credential field is present
pub fn validate_required(field: &str, value: &str) -> Result<(), ConnectionError> {
    if value.trim().is_empty() {
        return Err(ConnectionError::MissingField {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validate that a host override is properly formatted
pub fn validate_url(url: &str) -> crate::Result<()> {
    if url.is_empty() {
        return Err(CliError::InvalidArguments("URL cannot be empty".to_string()).into());
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(CliError::InvalidArguments(format!(
            "Invalid URL '{}': URL must start with http:// or https://",
            url
        ))
        .into());
    }

    Ok(())
}
