//! In-memory temperature controller for integration tests
//!
//! Implements the values API the way the controller does: writes land in a
//! pending slot and only become the latest valid value once the device's
//! `write` call is posted.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bftc::{ControllerConfig, DeviceValue, Transport, TransportError, ValueClient};
use serde_json::{json, Value};
use url::Url;

pub const HEATER: &str = "mapper.heater_mappings_bftc.device.sample";
pub const API_KEY: &str = "test-key";

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: &'static str,
    pub path: String,
    pub key: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
struct Stored {
    value: DeviceValue,
    status: String,
}

#[derive(Default)]
struct State {
    values: HashMap<String, Stored>,
    pending: HashMap<String, DeviceValue>,
    requests: Vec<Request>,
    unreachable: bool,
    never_synchronize: bool,
    fail_apply: bool,
}

/// Shared handle; clones see the same device.
#[derive(Clone, Default)]
pub struct SimulatedController {
    state: Arc<Mutex<State>>,
}

impl SimulatedController {
    /// Controller with a mixing chamber heater and thermometer channels 1..=8.
    pub fn new() -> Self {
        let sim = Self::default();
        sim.seed(HEATER, "active", DeviceValue::from(false));
        sim.seed(HEATER, "power", DeviceValue::Number(0.0));
        sim.seed(HEATER, "setpoint", DeviceValue::Number(0.02));
        sim.seed(HEATER, "pid_mode", DeviceValue::from(false));
        for channel in 1..=8 {
            let device = format!("mapper.heater_mappings_bftc.device.c{}", channel);
            sim.seed(&device, "temperature", DeviceValue::Number(channel as f64));
            sim.seed(&device, "resistance", DeviceValue::Number(1000.0 * channel as f64));
        }
        sim
    }

    pub fn seed(&self, device: &str, target: &str, value: DeviceValue) {
        self.seed_with_status(device, target, value, "SYNCHRONIZED");
    }

    pub fn seed_with_status(&self, device: &str, target: &str, value: DeviceValue, status: &str) {
        self.state.lock().unwrap().values.insert(
            format!("{}.{}", device, target),
            Stored {
                value,
                status: status.to_string(),
            },
        );
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    pub fn set_never_synchronize(&self, never: bool) {
        self.state.lock().unwrap().never_synchronize = never;
    }

    pub fn set_fail_apply(&self, fail: bool) {
        self.state.lock().unwrap().fail_apply = fail;
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn stored(&self, device: &str, target: &str) -> Option<DeviceValue> {
        self.state
            .lock()
            .unwrap()
            .values
            .get(&format!("{}.{}", device, target))
            .map(|s| s.value.clone())
    }

    pub fn pending(&self, device: &str, target: &str) -> Option<DeviceValue> {
        self.state
            .lock()
            .unwrap()
            .pending
            .get(&format!("{}.{}", device, target))
            .cloned()
    }

    fn record(state: &mut State, method: &'static str, url: &Url, body: Option<&Value>) {
        let key = url
            .query_pairs()
            .find(|(name, _)| name == "key")
            .map(|(_, value)| value.into_owned());
        state.requests.push(Request {
            method,
            path: url.path().to_string(),
            key,
            body: body.cloned(),
        });
    }

    fn unreachable() -> TransportError {
        TransportError::Connection("simulated controller unreachable".to_string())
    }
}

fn error_body(code: i64, name: &str, description: &str, query: &str) -> String {
    json!({
        "error": {
            "code": code,
            "name": name,
            "description": description,
            "query": query,
            "query_data": null,
            "data": {}
        }
    })
    .to_string()
}

impl Transport for SimulatedController {
    fn get(&self, url: &Url) -> Result<String, TransportError> {
        let mut state = self.state.lock().unwrap();
        Self::record(&mut state, "GET", url, None);
        if state.unreachable {
            return Err(Self::unreachable());
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let key = match segments.split_first() {
            Some((&"values", rest)) if rest.len() >= 2 => rest.join("."),
            _ => {
                return Err(TransportError::Status {
                    status: 404,
                    body: String::new(),
                })
            }
        };

        match state.values.get(&key) {
            Some(stored) => Ok(json!({
                "data": {
                    key.clone(): {
                        "content": {
                            "latest_valid_value": {
                                "value": stored.value,
                                "status": stored.status,
                            }
                        }
                    }
                }
            })
            .to_string()),
            None => Ok(error_body(404, "NotFound", "No such value", &key)),
        }
    }

    fn post_json(&self, url: &Url, body: &Value) -> Result<String, TransportError> {
        let mut state = self.state.lock().unwrap();
        Self::record(&mut state, "POST", url, Some(body));
        if state.unreachable {
            return Err(Self::unreachable());
        }

        let data = match body.get("data").and_then(Value::as_object) {
            Some(data) => data.clone(),
            None => {
                return Err(TransportError::Status {
                    status: 400,
                    body: error_body(400, "BadRequest", "Missing data", "values"),
                })
            }
        };

        for (key, entry) in data {
            let content = &entry["content"];
            if let Some(device) = key.strip_suffix(".write") {
                if content["call"] != json!(1) {
                    continue;
                }
                if state.fail_apply {
                    return Err(TransportError::Status {
                        status: 500,
                        body: String::new(),
                    });
                }
                let prefix = format!("{}.", device);
                let committed: Vec<String> = state
                    .pending
                    .keys()
                    .filter(|k| k.starts_with(&prefix))
                    .cloned()
                    .collect();
                let status = if state.never_synchronize {
                    "SYNCHRONIZING"
                } else {
                    "SYNCHRONIZED"
                };
                for k in committed {
                    if let Some(value) = state.pending.remove(&k) {
                        state.values.insert(
                            k,
                            Stored {
                                value,
                                status: status.to_string(),
                            },
                        );
                    }
                }
            } else {
                let value: DeviceValue = serde_json::from_value(content["value"].clone())
                    .map_err(|e| TransportError::Status {
                        status: 400,
                        body: error_body(400, "BadRequest", &e.to_string(), &key),
                    })?;
                state.pending.insert(key, value);
            }
        }

        Ok(json!({"status": "OK"}).to_string())
    }
}

pub fn config() -> ControllerConfig {
    ControllerConfig::new("192.0.2.10")
        .with_api_key(API_KEY)
        .with_mixing_chamber_channel(6)
}

pub fn client(sim: &SimulatedController) -> ValueClient<SimulatedController> {
    ValueClient::with_transport(config(), sim.clone()).unwrap()
}
