//! Wire schema of the `/values/` endpoints
//!
//! Read response:
//!
//! ```json
//! {"data": {"<device>.<target>": {"content": {"latest_valid_value": {"value": 0.0123, "status": "SYNCHRONIZED"}}}}}
//! ```
//!
//! Error response:
//!
//! ```json
//! {"error": {"code": 1, "name": "...", "description": "...", "query": "...", "details": [{"code": 1, "name": "..."}]}}
//! ```

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};

use super::{DeviceValue, Reading, SyncStatus, ValueRef};
use crate::error::{ApiError, ApiErrorDetail, ClientError, ClientResult, ErrorCode};

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    data: Option<HashMap<String, ValueEntry>>,
    error: Option<RawApiError>,
}

#[derive(Debug, Deserialize)]
struct ValueEntry {
    content: ValueContent,
}

#[derive(Debug, Deserialize)]
struct ValueContent {
    latest_valid_value: LatestValidValue,
}

#[derive(Debug, Deserialize)]
struct LatestValidValue {
    value: DeviceValue,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawApiError {
    code: Option<ErrorCode>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    details: Option<Vec<ApiErrorDetail>>,
    query: Option<String>,
    query_data: Option<Value>,
    data: Option<Value>,
}

impl From<RawApiError> for ApiError {
    fn from(raw: RawApiError) -> Self {
        // Without a detail list the top-level error is the only detail
        let details = match raw.details {
            Some(details) => details,
            None => raw
                .code
                .map(|code| {
                    vec![ApiErrorDetail {
                        code,
                        reason: raw.name.clone(),
                    }]
                })
                .unwrap_or_default(),
        };

        ApiError {
            name: raw.name,
            description: raw.description,
            details,
            query: raw.query,
            query_data: raw.query_data,
            data: raw.data,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorOnly {
    error: RawApiError,
}

/// Decode a read response for `value_ref`.
pub fn decode_reading(body: &str, value_ref: &ValueRef) -> ClientResult<Reading<DeviceValue>> {
    let key = value_ref.key();

    let response: ValuesResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(source) => {
            // A shape mismatch inside `data` may still come with a server error
            return Err(match decode_api_error(body) {
                Some(api) => ClientError::Api(api),
                None => ClientError::Decode { query: key, source },
            });
        }
    };

    if let Some(error) = response.error {
        return Err(ClientError::Api(error.into()));
    }

    let entry = response
        .data
        .and_then(|mut data| data.remove(&key))
        .ok_or(ClientError::MissingValue { query: key })?;

    let latest = entry.content.latest_valid_value;
    if latest.status.is_none() {
        tracing::warn!("Could not verify synchronization status of {}", value_ref);
    }

    Ok(Reading::new(
        latest.value,
        SyncStatus::from_wire(latest.status.as_deref()),
    ))
}

/// Extract the controller's error object from a response body, if it has one.
pub fn decode_api_error(body: &str) -> Option<ApiError> {
    serde_json::from_str::<ErrorOnly>(body)
        .ok()
        .map(|e| e.error.into())
}

// ============================================================================
// Requests
// ============================================================================

/// Body that stores `value` in the pending slot of `value_ref`.
pub fn set_value_body(value_ref: &ValueRef, value: &DeviceValue) -> Value {
    json!({
        "data": {
            value_ref.key(): { "content": { "value": value } }
        }
    })
}

/// Body that asks the controller to commit pending values of `device`.
pub fn apply_values_body(device: &str) -> Value {
    json!({
        "data": {
            format!("{}.write", device): { "content": { "call": 1 } }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel6() -> ValueRef {
        ValueRef::new("mapper.heater_mappings_bftc.device.c6", "temperature")
    }

    #[test]
    fn test_decode_synchronized_reading() {
        let body = r#"{"data": {"mapper.heater_mappings_bftc.device.c6.temperature": {"content": {"latest_valid_value": {"value": 0.0123, "status": "SYNCHRONIZED"}}}}}"#;
        let reading = decode_reading(body, &channel6()).unwrap();
        assert_eq!(reading.value, DeviceValue::Number(0.0123));
        assert!(reading.is_synchronized());
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let body = r#"{
            "data": {
                "mapper.heater_mappings_bftc.device.c6.temperature": {
                    "content": {
                        "latest_value": {"value": 0.02},
                        "latest_valid_value": {"value": 0.0125, "status": "SYNCHRONIZING", "date": 1700000000}
                    },
                    "type": "Value.Number.Float"
                }
            },
            "status": "OK"
        }"#;
        let reading = decode_reading(body, &channel6()).unwrap();
        assert_eq!(reading.value, DeviceValue::Number(0.0125));
        assert_eq!(reading.status, SyncStatus::Pending("SYNCHRONIZING".to_string()));
    }

    #[test]
    fn test_decode_missing_status_is_unknown() {
        let body = r#"{"data": {"mapper.heater_mappings_bftc.device.c6.temperature": {"content": {"latest_valid_value": {"value": 0.5}}}}}"#;
        let reading = decode_reading(body, &channel6()).unwrap();
        assert_eq!(reading.status, SyncStatus::Unknown);
    }

    #[test]
    fn test_decode_missing_key() {
        let body = r#"{"data": {"mapper.heater_mappings_bftc.device.c5.temperature": {"content": {"latest_valid_value": {"value": 0.5, "status": "SYNCHRONIZED"}}}}}"#;
        match decode_reading(body, &channel6()) {
            Err(ClientError::MissingValue { query }) => {
                assert_eq!(query, "mapper.heater_mappings_bftc.device.c6.temperature")
            }
            other => panic!("expected MissingValue, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_shape_mismatch() {
        let body = r#"{"data": {"mapper.heater_mappings_bftc.device.c6.temperature": {"content": {}}}}"#;
        match decode_reading(body, &channel6()) {
            Err(ClientError::Decode { query, .. }) => {
                assert_eq!(query, "mapper.heater_mappings_bftc.device.c6.temperature")
            }
            other => panic!("expected Decode, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_server_error_with_details() {
        let body = r#"{"error": {
            "code": 400,
            "name": "QueryError",
            "description": "Invalid target",
            "query": "mapper.heater_mappings_bftc.device.c6.voltage",
            "query_data": null,
            "data": {},
            "details": [{"code": 11, "name": "TargetNotFound"}]
        }}"#;
        let value_ref = ValueRef::new("mapper.heater_mappings_bftc.device.c6", "voltage");
        match decode_reading(body, &value_ref) {
            Err(ClientError::Api(api)) => {
                assert_eq!(api.name, "QueryError");
                assert_eq!(api.details.len(), 1);
                assert_eq!(api.details[0].code, ErrorCode::Number(11));
                assert_eq!(api.details[0].reason, "TargetNotFound");
                assert_eq!(
                    api.query.as_deref(),
                    Some("mapper.heater_mappings_bftc.device.c6.voltage")
                );
            }
            other => panic!("expected Api, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_server_error_without_details() {
        let body = r#"{"error": {"code": 403, "name": "Forbidden", "description": "Bad key", "query": "values"}}"#;
        let api = decode_api_error(body).unwrap();
        assert_eq!(
            api.details,
            vec![ApiErrorDetail {
                code: ErrorCode::Number(403),
                reason: "Forbidden".to_string(),
            }]
        );
        assert!(api.to_string().contains("Code: 403, Reason: Forbidden"));
    }

    #[test]
    fn test_decode_not_json() {
        assert!(matches!(
            decode_reading("<html>Bad gateway</html>", &channel6()),
            Err(ClientError::Decode { .. })
        ));
        assert!(decode_api_error("<html></html>").is_none());
    }

    #[test]
    fn test_set_value_body() {
        let value_ref = ValueRef::new("mapper.heater_mappings_bftc.device.sample", "power");
        let body = set_value_body(&value_ref, &DeviceValue::Number(0.0005));
        assert_eq!(
            body,
            json!({"data": {"mapper.heater_mappings_bftc.device.sample.power": {"content": {"value": 0.0005}}}})
        );

        let value_ref = ValueRef::new("mapper.heater_mappings_bftc.device.sample", "active");
        let body = set_value_body(&value_ref, &DeviceValue::from(true));
        assert_eq!(
            body,
            json!({"data": {"mapper.heater_mappings_bftc.device.sample.active": {"content": {"value": "1"}}}})
        );
    }

    #[test]
    fn test_apply_values_body() {
        assert_eq!(
            apply_values_body("mapper.heater_mappings_bftc.device.sample"),
            json!({"data": {"mapper.heater_mappings_bftc.device.sample.write": {"content": {"call": 1}}}})
        );
    }
}
