use crate::core::warehouse::Connector;
use crate::error::ConnectionError;
use crate::storage::credentials::Credentials;

/// Open one connection.
///
/// Only presence of account, user and password is checked here; any failure
/// reported by the service comes back as a single `ConnectionError::Failed`
/// carrying the failure text.
pub async fn connect<C: Connector>(
    connector: &C,
    credentials: &Credentials,
) -> Result<C::Connection, ConnectionError> {
    credentials.validate()?;
    tracing::debug!(
        "Connecting to account {} as {}",
        credentials.account,
        credentials.user
    );
    connector.connect(credentials).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::warehouse::{ParameterTable, Warehouse};
    use crate::error::QueryError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullConnection;

    #[async_trait]
    impl Warehouse for NullConnection {
        async fn query(&self, _sql: &str) -> Result<ParameterTable, QueryError> {
            Ok(ParameterTable::default())
        }

        async fn close(&mut self) -> Result<(), ConnectionError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingConnector {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Connector for CountingConnector {
        type Connection = NullConnection;

        async fn connect(&self, credentials: &Credentials) -> Result<NullConnection, ConnectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if credentials.password() == "right" {
                Ok(NullConnection)
            } else {
                Err(ConnectionError::Failed {
                    message: "Incorrect username or password was specified.".to_string(),
                })
            }
        }
    }

    fn creds(password: &str) -> Credentials {
        Credentials::new("xy12345".to_string(), "alice".to_string(), password.to_string())
    }

    #[test]
    fn test_connect_accepts_valid_credentials() {
        let connector = CountingConnector::default();
        let result = tokio_test::block_on(connect(&connector, &creds("right")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_connect_surfaces_service_message() {
        let connector = CountingConnector::default();
        let result = tokio_test::block_on(connect(&connector, &creds("wrong")));
        match result {
            Err(ConnectionError::Failed { message }) => {
                assert!(message.contains("Incorrect username or password"))
            }
            _ => panic!("Expected ConnectionError::Failed"),
        }
    }

    #[test]
    fn test_connect_skips_service_when_field_missing() {
        let connector = CountingConnector::default();
        let result = tokio_test::block_on(connect(&connector, &creds("")));
        assert!(matches!(result, Err(ConnectionError::MissingField { .. })));
        assert_eq!(connector.calls.load(Ordering::SeqCst), 0);
    }
}
