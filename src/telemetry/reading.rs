//! Telemetry payload pushed by the solar monitor
//!
//! Every field is optional and kept as raw JSON so that a value of the wrong
//! type degrades to placeholder text instead of rejecting the whole request.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SolarLogError};

/// Message returned when the request carries no payload at all
pub const NO_DATA_MESSAGE: &str = "No data received";

/// One reading as posted to `POST /solar-log`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Reading {
    #[serde(default)]
    pub device_id: Option<Value>,

    /// Signal strength in dBm
    #[serde(default)]
    pub wifi_rssi: Option<Value>,

    /// Free heap in bytes
    #[serde(default)]
    pub free_heap: Option<Value>,

    /// Milliseconds since the device booted
    #[serde(default, rename = "uptime")]
    pub uptime_ms: Option<Value>,

    /// Unix seconds as reported by the device
    #[serde(default)]
    pub timestamp: Option<Value>,
}

impl Reading {
    /// Parse a request body
    ///
    /// # Errors
    ///
    /// Returns [`SolarLogError::Validation`] if the body is empty, is not valid
    /// JSON, or is not a JSON object. Unexpected field types are not errors.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(SolarLogError::Validation(NO_DATA_MESSAGE.to_string()));
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| SolarLogError::Validation(format!("Invalid JSON payload: {}", e)))?;

        match value {
            Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| SolarLogError::Validation(format!("Invalid JSON payload: {}", e))),
            Value::Null => Err(SolarLogError::Validation(NO_DATA_MESSAGE.to_string())),
            _ => Err(SolarLogError::Validation(
                "Invalid JSON payload: expected an object".to_string(),
            )),
        }
    }

    /// Uptime converted to seconds; absent or non-numeric counts as zero
    pub fn uptime_seconds(&self) -> f64 {
        self.uptime_ms.as_ref().and_then(as_number).unwrap_or(0.0) / 1000.0
    }

    /// Device timestamp in unix seconds, `None` when absent, zero or non-numeric
    pub fn timestamp_secs(&self) -> Option<f64> {
        self.timestamp
            .as_ref()
            .and_then(as_number)
            .filter(|secs| *secs != 0.0)
    }
}

/// Numbers as-is, numeric strings parsed, anything else rejected
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}
