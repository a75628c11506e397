//! Snowflake REST client and connector against a mocked service

use serde_json::{Value, json};
use snowparam::api::client::SnowflakeClient;
use snowparam::core::scope::{ScopeLevel, ScopeSelection, TargetList};
use snowparam::core::services::collect;
use snowparam::core::services::types::TargetOutcome;
use snowparam::core::session::{SessionCommand, SessionContext};
use snowparam::core::warehouse::{Connector, SnowflakeConnector, Warehouse};
use snowparam::error::{ApiError, ConnectionError, QueryError};
use snowparam::storage::credentials::Credentials;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "ver:1-hint:abc-token";

fn credentials(password: &str) -> Credentials {
    Credentials::new(
        "xy12345.us-east-1".to_string(),
        "alice".to_string(),
        password.to_string(),
    )
}

fn login_ok() -> Value {
    json!({
        "data": {
            "token": TOKEN,
            "masterToken": "master",
            "sessionId": 42
        },
        "code": null,
        "message": null,
        "success": true
    })
}

fn parameters_result() -> Value {
    json!({
        "data": {
            "rowtype": [
                {"name": "key", "type": "text"},
                {"name": "value", "type": "text"},
                {"name": "default", "type": "text"},
                {"name": "level", "type": "text"},
                {"name": "description", "type": "text"},
                {"name": "type", "type": "text"}
            ],
            "rowset": [
                ["TIMEZONE", "UTC", "America/Los_Angeles", "ACCOUNT", "Time zone", "STRING"],
                ["STATEMENT_TIMEOUT_IN_SECONDS", "3600", "172800", "ACCOUNT", "Timeout", "NUMBER"]
            ],
            "queryResultFormat": "json",
            "queryId": "01a2"
        },
        "code": null,
        "message": null,
        "success": true
    })
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/session/v1/login-request"))
        .and(body_partial_json(json!({
            "data": {"ACCOUNT_NAME": "xy12345", "LOGIN_NAME": "alice", "PASSWORD": "secret"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_ok()))
        .mount(server)
        .await;
}

async fn mount_logout(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/session"))
        .and(query_param("delete", "true"))
        .and(header("Authorization", format!("Snowflake Token=\"{}\"", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(expected)
        .mount(server)
        .await;
}

fn connector(server: &MockServer) -> SnowflakeConnector {
    SnowflakeConnector::new(Some(server.uri()), Some("SYSADMIN".to_string()), 10)
}

#[tokio::test]
async fn test_connect_query_and_close() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_logout(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/queries/v1/query-request"))
        .and(header("Authorization", format!("Snowflake Token=\"{}\"", TOKEN).as_str()))
        .and(body_partial_json(json!({
            "sqlText": "SHOW PARAMETERS IN ACCOUNT",
            "asyncExec": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(parameters_result()))
        .expect(1)
        .mount(&server)
        .await;

    let mut connection = connector(&server)
        .connect(&credentials("secret"))
        .await
        .expect("login should succeed");
    assert_eq!(connection.base_url(), server.uri());

    let table = connection
        .query("SHOW PARAMETERS IN ACCOUNT")
        .await
        .expect("query should succeed");
    assert_eq!(
        table.columns,
        vec!["key", "value", "default", "level", "description", "type"]
    );
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.rows[0][0], json!("TIMEZONE"));
    assert_eq!(table.rows[1][1], json!("3600"));

    connection.close().await.expect("logout should succeed");
}

#[tokio::test]
async fn test_login_sends_role() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session/v1/login-request"))
        .and(query_param("roleName", "SYSADMIN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_ok()))
        .expect(1)
        .mount(&server)
        .await;

    let result = connector(&server).connect(&credentials("secret")).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_rejected_credentials_surface_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session/v1/login-request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "code": "390100",
            "message": "Incorrect username or password was specified.",
            "success": false
        })))
        .mount(&server)
        .await;

    let result = connector(&server).connect(&credentials("wrong")).await;
    match result {
        Err(ConnectionError::Failed { message }) => {
            assert!(message.contains("390100"));
            assert!(message.contains("Incorrect username or password was specified."));
        }
        other => panic!("Expected ConnectionError::Failed, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_http_failure_on_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session/v1/login-request"))
        .respond_with(ResponseTemplate::new(403).set_body_string("IP not allowed"))
        .mount(&server)
        .await;

    let result = connector(&server).connect(&credentials("secret")).await;
    match result {
        Err(ConnectionError::Failed { message }) => assert!(message.contains("IP not allowed")),
        other => panic!("Expected ConnectionError::Failed, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_query_error_and_arrow_result() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/queries/v1/query-request"))
        .and(body_partial_json(json!({"sqlText": "SHOW PARAMETERS IN DATABASE GONE"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "code": "002043",
            "message": "SQL compilation error: Object does not exist, or operation cannot be performed.",
            "success": false
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/queries/v1/query-request"))
        .and(body_partial_json(json!({"sqlText": "SHOW PARAMETERS IN SESSION"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "rowtype": [{"name": "key", "type": "text"}],
                "rowsetBase64": "QVJST1c=",
                "queryResultFormat": "arrow"
            },
            "success": true
        })))
        .mount(&server)
        .await;

    let connection = connector(&server)
        .connect(&credentials("secret"))
        .await
        .expect("login should succeed");

    match connection.query("SHOW PARAMETERS IN DATABASE GONE").await {
        Err(QueryError::Failed { sql, message }) => {
            assert_eq!(sql, "SHOW PARAMETERS IN DATABASE GONE");
            assert!(message.contains("does not exist"));
        }
        other => panic!("Expected QueryError::Failed, got {:?}", other),
    }

    assert!(matches!(
        connection.query("SHOW PARAMETERS IN SESSION").await,
        Err(QueryError::UnsupportedResult { .. })
    ));
}

#[tokio::test]
async fn test_execute_without_session_is_unauthorized() {
    let client = SnowflakeClient::new("http://127.0.0.1:9".to_string(), 5).unwrap();
    assert!(matches!(
        client.execute("SHOW PARAMETERS IN ACCOUNT").await,
        Err(ApiError::Unauthorized { .. })
    ));
}

#[tokio::test]
async fn test_collect_isolates_failed_target_over_rest() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/queries/v1/query-request"))
        .and(body_partial_json(json!({"sqlText": "SHOW PARAMETERS IN DATABASE \"my db\""})))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/queries/v1/query-request"))
        .and(body_partial_json(json!({"sqlText": "SHOW PARAMETERS IN DATABASE DB1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(parameters_result()))
        .mount(&server)
        .await;

    let connection = connector(&server)
        .connect(&credentials("secret"))
        .await
        .expect("login should succeed");

    let databases = TargetList::new(
        vec!["my db".to_string(), "DB1".to_string()],
        Default::default(),
    );
    let results = collect(
        &connection,
        &ScopeSelection::new([ScopeLevel::Database]),
        &databases,
        &TargetList::default(),
    )
    .await;

    assert_eq!(
        results.labels().collect::<Vec<_>>(),
        vec!["DATABASE_my db", "DATABASE_DB1"]
    );
    assert!(matches!(
        results.get("DATABASE_my db"),
        Some(TargetOutcome::Failed { .. })
    ));
    assert!(matches!(
        results.get("DATABASE_DB1"),
        Some(TargetOutcome::Collected(_))
    ));
}

#[tokio::test]
async fn test_session_dispose_logs_out() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_logout(&server, 1).await;

    let mut session = SessionContext::new(connector(&server));
    session
        .execute(SessionCommand::Connect(credentials("secret")))
        .await
        .expect("connect should succeed");
    assert!(session.is_connected());

    session.dispose().await;
    assert!(!session.is_connected());
}
