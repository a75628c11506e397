use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("CliError: {0}")]
    Cli(#[from] CliError),
    #[error("ApiError: {0}")]
    Api(#[from] ApiError),
    #[error("ConnectionError: {0}")]
    Connection(#[from] ConnectionError),
    #[error("QueryError: {0}")]
    Query(#[from] QueryError),
    #[error("ExportError: {0}")]
    Export(#[from] ExportError),
    #[error("ConfigError: {0}")]
    Config(#[from] ConfigError),
    #[error("StorageError: {0}")]
    Storage(#[from] StorageError),
    #[error("DisplayError: {0}")]
    Display(#[from] DisplayError),
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Input error: {0}")]
    Input(String),
}

/// Transport-level failures talking to the Snowflake REST endpoints.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64, endpoint: String },
    #[error("HTTP error: {status} {message}")]
    Http {
        status: u16,
        endpoint: String,
        message: String,
    },
    #[error("Authentication failed ({status}): {server_message}")]
    Unauthorized {
        status: u16,
        endpoint: String,
        server_message: String,
    },
    #[error("Snowflake error {code}: {message}")]
    Snowflake {
        code: String,
        endpoint: String,
        message: String,
    },
}

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("{field} is required")]
    MissingField { field: String },
    #[error("Connection failed: {message}")]
    Failed { message: String },
    #[error("Not connected")]
    NotConnected,
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Query '{sql}' failed: {message}")]
    Failed { sql: String, message: String },
    #[error("Query '{sql}' returned an unsupported result: {reason}")]
    UnsupportedResult { sql: String, reason: String },
    #[error("Invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },
    #[error("Unexpected result shape for '{sql}': {reason}")]
    UnexpectedShape { sql: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export: no parameter tables were collected")]
    NothingToExport,
    #[error("Spreadsheet writer error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("File I/O error at {path}: {source}")]
    FileIo {
        path: String,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File I/O error at {path}: {source}")]
    FileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("Configuration parse error: {message}")]
    ConfigParseError { message: String },
    #[error("Configuration directory not found")]
    ConfigDirNotFound,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration field '{field}' is missing")]
    MissingField { field: String, hint: String },
    #[error("Invalid configuration value for '{field}': {value}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Table formatting failed: {0}")]
    TableFormat(String),
    #[error("Terminal output error: {0}")]
    TerminalOutput(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl ErrorSeverity {
    pub fn emoji(&self) -> &'static str {
        match self {
            ErrorSeverity::Critical => "🚨",
            ErrorSeverity::High => "❌",
            ErrorSeverity::Medium => "⚠️",
            ErrorSeverity::Low => "ℹ️",
        }
    }
}

impl AppError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Cli(_) => ErrorSeverity::Medium,
            AppError::Api(api_error) => match api_error {
                ApiError::Unauthorized { .. } => ErrorSeverity::High,
                ApiError::Timeout { .. } => ErrorSeverity::Medium,
                ApiError::Http { status, .. } if *status >= 500 => ErrorSeverity::High,
                _ => ErrorSeverity::Medium,
            },
            AppError::Connection(_) => ErrorSeverity::High,
            AppError::Query(_) => ErrorSeverity::Medium,
            AppError::Export(ExportError::NothingToExport) => ErrorSeverity::Low,
            AppError::Export(_) => ErrorSeverity::High,
            AppError::Config(_) => ErrorSeverity::High,
            AppError::Storage(_) => ErrorSeverity::Medium,
            AppError::Display(_) => ErrorSeverity::Low,
        }
    }

    pub fn display_friendly(&self) -> String {
        match self {
            AppError::Connection(ConnectionError::Failed { message }) => {
                format!("Connection failed: {}", message)
            }
            AppError::Connection(ConnectionError::MissingField { field }) => {
                format!("{} is required to connect", field)
            }
            AppError::Connection(ConnectionError::NotConnected) => {
                "Not connected to Snowflake".to_string()
            }
            AppError::Export(ExportError::NothingToExport) => {
                "No parameters were collected, nothing to export".to_string()
            }
            _ => format!("{}", self),
        }
    }

    pub fn troubleshooting_hint(&self) -> Option<String> {
        match self {
            AppError::Connection(ConnectionError::MissingField { field }) => Some(format!(
                "Pass --{} or set SNOWFLAKE_{}",
                field,
                field.to_uppercase()
            )),
            AppError::Connection(ConnectionError::Failed { .. }) => Some(
                "Check the account identifier, user and password, then run 'snowparam connect'"
                    .to_string(),
            ),
            AppError::Connection(ConnectionError::NotConnected) => {
                Some("Run 'connect' first".to_string())
            }
            AppError::Api(ApiError::Timeout { .. }) => Some(
                "Check your network or raise timeout_seconds with 'snowparam config set'"
                    .to_string(),
            ),
            AppError::Query(QueryError::InvalidIdentifier { .. }) => {
                Some("Use 'snowparam targets databases' to list valid names".to_string())
            }
            AppError::Config(ConfigError::MissingField { hint, .. }) => Some(hint.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_display() {
        let cli_err = CliError::InvalidArguments("unknown level 'TABLE'".to_string());
        assert_eq!(
            format!("{}", cli_err),
            "Invalid arguments: unknown level 'TABLE'"
        );
    }

    #[test]
    fn test_connection_error_display() {
        let err = ConnectionError::Failed {
            message: "Incorrect username or password was specified.".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Connection failed: Incorrect username or password was specified."
        );

        let err = ConnectionError::MissingField {
            field: "account".to_string(),
        };
        assert_eq!(format!("{}", err), "account is required");
    }

    #[test]
    fn test_query_error_display() {
        let err = QueryError::Failed {
            sql: "SHOW PARAMETERS IN DATABASE DB1".to_string(),
            message: "Object does not exist".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Query 'SHOW PARAMETERS IN DATABASE DB1' failed: Object does not exist"
        );
    }

    #[test]
    fn test_api_error_display() {
        let api_err = ApiError::Snowflake {
            code: "390100".to_string(),
            endpoint: "/session/v1/login-request".to_string(),
            message: "Incorrect username or password was specified.".to_string(),
        };
        assert!(matches!(api_err, ApiError::Snowflake { .. }));
        if let ApiError::Snowflake {
            code,
            endpoint,
            message,
        } = api_err
        {
            assert_eq!(code, "390100");
            assert_eq!(endpoint, "/session/v1/login-request");
            assert_eq!(message, "Incorrect username or password was specified.");
        }

        let api_err = ApiError::Timeout {
            timeout_secs: 10,
            endpoint: "endpoint".to_string(),
        };
        assert_eq!(format!("{}", api_err), "Request timed out after 10s");
    }

    #[test]
    fn test_app_error_wrapping() {
        let app_err = AppError::Connection(ConnectionError::NotConnected);
        assert_eq!(format!("{}", app_err), "ConnectionError: Not connected");
        assert_eq!(app_err.severity(), ErrorSeverity::High);

        let app_err: AppError = ExportError::NothingToExport.into();
        assert_eq!(app_err.severity(), ErrorSeverity::Low);
        assert_eq!(
            app_err.display_friendly(),
            "No parameters were collected, nothing to export"
        );
    }

    #[test]
    fn test_troubleshooting_hints() {
        let app_err = AppError::Connection(ConnectionError::MissingField {
            field: "user".to_string(),
        });
        assert_eq!(
            app_err.troubleshooting_hint(),
            Some("Pass --user or set SNOWFLAKE_USER".to_string())
        );

        let app_err = AppError::Display(DisplayError::TableFormat("bad".to_string()));
        assert!(app_err.troubleshooting_hint().is_none());
        assert_eq!(app_err.severity(), ErrorSeverity::Low);
    }
}
