use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope shared by every Snowflake session/query endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub code: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub success: bool,
}

// Authentication models
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub data: LoginRequestData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct LoginRequestData {
    pub client_app_id: String,
    pub client_app_version: String,
    pub account_name: String,
    pub login_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponseData {
    pub token: Option<String>,
    pub master_token: Option<String>,
    pub session_id: Option<i64>,
}

// Query models
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub sql_text: String,
    pub async_exec: bool,
    pub sequence_id: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponseData {
    #[serde(default)]
    pub rowtype: Vec<RowType>,
    pub rowset: Option<Vec<Vec<Value>>>,
    pub rowset_base64: Option<String>,
    #[serde(default)]
    pub chunks: Vec<Value>,
    pub query_id: Option<String>,
    pub query_result_format: Option<String>,
}

/// Column metadata of a query result.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RowType {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
}

impl RowType {
    /// Convert a raw rowset value into a typed cell for this column.
    ///
    /// Snowflake sends every JSON rowset value as a string; numeric and boolean
    /// columns are decoded so spreadsheets get real numbers.
    pub fn decode(&self, raw: Value) -> Value {
        let Value::String(text) = raw else {
            return raw;
        };
        match self.type_name.as_str() {
            "fixed" | "real" => {
                if let Ok(n) = text.parse::<i64>() {
                    Value::from(n)
                } else if is_integral(&text) {
                    // Beyond i64; a float would drop digits
                    Value::String(text)
                } else if let Some(n) = text
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                {
                    Value::Number(n)
                } else {
                    Value::String(text)
                }
            }
            "boolean" => match text.as_str() {
                "1" | "true" | "TRUE" => Value::Bool(true),
                "0" | "false" | "FALSE" => Value::Bool(false),
                _ => Value::String(text),
            },
            _ => Value::String(text),
        }
    }
}

fn is_integral(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_serialization() {
        let request = LoginRequest {
            data: LoginRequestData {
                client_app_id: "snowparam".to_string(),
                client_app_version: "0.1.0".to_string(),
                account_name: "XY12345".to_string(),
                login_name: "alice".to_string(),
                password: "secret".to_string(),
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["data"]["ACCOUNT_NAME"], "XY12345");
        assert_eq!(json["data"]["LOGIN_NAME"], "alice");
        assert_eq!(json["data"]["CLIENT_APP_ID"], "snowparam");
    }

    #[test]
    fn test_login_failure_envelope() {
        let json = r#"{
            "data": {"nextAction": "RETRY_LOGIN"},
            "code": "390100",
            "message": "Incorrect username or password was specified.",
            "success": false
        }"#;
        let envelope: Envelope<LoginResponseData> = serde_json::from_str(json).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.code.as_deref(), Some("390100"));
        assert!(envelope.data.unwrap().token.is_none());
    }

    #[test]
    fn test_query_response_deserialization() {
        let json = r#"{
            "data": {
                "rowtype": [
                    {"name": "key", "type": "text"},
                    {"name": "value", "type": "text"}
                ],
                "rowset": [["TIMEZONE", "UTC"], ["WEEK_START", "0"]],
                "total": 2,
                "queryId": "01b2-0000",
                "queryResultFormat": "json"
            },
            "code": null,
            "message": null,
            "success": true
        }"#;

        let envelope: Envelope<QueryResponseData> = serde_json::from_str(json).unwrap();
        let data = envelope.data.unwrap();
        assert_eq!(data.rowtype.len(), 2);
        assert_eq!(data.rowtype[1].name, "value");
        assert_eq!(data.rowset.unwrap().len(), 2);
        assert!(data.chunks.is_empty());
    }

    #[test]
    fn test_row_type_decode() {
        let fixed = RowType {
            name: "n".to_string(),
            type_name: "fixed".to_string(),
        };
        assert_eq!(fixed.decode(Value::from("42")), Value::from(42));
        assert_eq!(fixed.decode(Value::from("1.5")), Value::from(1.5));
        assert_eq!(fixed.decode(Value::Null), Value::Null);
        assert_eq!(
            fixed.decode(Value::from("123456789012345678901234567890")),
            Value::from("123456789012345678901234567890")
        );
        assert_eq!(
            fixed.decode(Value::from("-99999999999999999999")),
            Value::from("-99999999999999999999")
        );

        let flag = RowType {
            name: "b".to_string(),
            type_name: "boolean".to_string(),
        };
        assert_eq!(flag.decode(Value::from("1")), Value::Bool(true));

        let text = RowType {
            name: "t".to_string(),
            type_name: "text".to_string(),
        };
        assert_eq!(text.decode(Value::from("0")), Value::from("0"));
    }
}
