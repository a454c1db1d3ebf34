use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::IncidentError;

/// A breakdown report as received. Fields we don't know about are carried through as-is.
pub type Payload = Map<String, Value>;

pub const BUSBREAKDOWN_ID: &str = "Busbreakdown ID";
pub const ROUTE_NUMBER: &str = "Route Number";
pub const REASON: &str = "Reason";
pub const HOW_LONG_DELAYED: &str = "How Long Delayed";
pub const OCCURRED_ON: &str = "Occurred On";

const BODY: &str = "body";

pub const REQUIRED_FIELDS: &[&str] = &[BUSBREAKDOWN_ID, ROUTE_NUMBER, REASON];

/// Partition key of the incident table.
pub const ROUTE_NUMBER_KEY: &str = "RouteNumber";
/// Sort key of the incident table.
pub const OCCURRED_ON_KEY: &str = "OccurredOn";

pub const ALERT_PRIORITY: &str = "alert_priority";
pub const AVERAGE_DELAY_MINUTES: &str = "average_delay_minutes";

#[derive(Debug, Default)]
pub struct IncidentEvent {
    pub body: Option<String>,
}

impl IncidentEvent {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
        }
    }

    /// Pull the JSON-encoded body out of a raw invocation event.
    pub fn from_value(event: &Value) -> Result<Self, IncidentError> {
        match event.get(BODY) {
            None | Some(Value::Null) => Err(IncidentError::parse("Event has no body")),
            Some(Value::String(body)) => Ok(Self::new(body.as_str())),
            Some(other) => Err(IncidentError::parse(format!(
                "Event body must be a JSON-encoded string, got {}",
                json_type(other)
            ))),
        }
    }
}

pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl IncidentResponse {
    pub fn success(message: &str) -> Self {
        Self {
            status_code: 200,
            body: json!({ "message": message }).to_string(),
        }
    }

    pub fn failure(error: &str) -> Self {
        Self {
            status_code: 400,
            body: json!({ "error": error }).to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_event_from_value_ignores_extra_fields() {
        let event =
            IncidentEvent::from_value(&json!({ "body": "{}", "httpMethod": "POST", "headers": {} }))
                .unwrap();
        assert_eq!(event.body.as_deref(), Some("{}"));
    }

    #[test]
    fn test_event_from_value_without_body() {
        let err = IncidentEvent::from_value(&json!({ "httpMethod": "POST" })).unwrap_err();
        assert_eq!(err.to_string(), "Event has no body");
    }

    #[test]
    fn test_event_from_value_null_body() {
        let err = IncidentEvent::from_value(&json!({ "body": null })).unwrap_err();
        assert!(matches!(err, IncidentError::Parse(_)));
    }

    #[test]
    fn test_event_from_value_object_body() {
        let err =
            IncidentEvent::from_value(&json!({ "body": { "Busbreakdown ID": 1 } })).unwrap_err();
        assert!(matches!(err, IncidentError::Parse(_)));
        assert_eq!(
            err.to_string(),
            "Event body must be a JSON-encoded string, got an object"
        );
    }

    #[test]
    fn test_event_from_value_not_an_object() {
        let err = IncidentEvent::from_value(&json!(42)).unwrap_err();
        assert_eq!(err.to_string(), "Event has no body");
    }

    #[test]
    fn test_success_response() {
        let response = IncidentResponse::success("Processed successfully");
        assert_eq!(response.status_code, 200);
        assert!(response.is_success());

        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body, json!({ "message": "Processed successfully" }));
    }

    #[test]
    fn test_failure_response() {
        let response = IncidentResponse::failure("Missing required fields: Reason");
        assert_eq!(response.status_code, 400);
        assert!(!response.is_success());

        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body, json!({ "error": "Missing required fields: Reason" }));
    }

    #[test]
    fn test_response_serializes_status_code_in_camel_case() {
        let value = serde_json::to_value(IncidentResponse::success("ok")).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert!(value.get("status_code").is_none());
    }
}
