//! Request bodies for the attendance endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::ClockActionType;

/// Raw geolocation reading from the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in metres, when the platform reports one.
    pub accuracy: Option<f64>,
}

/// Geolocation block as the backend expects it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
    pub accuracy: Option<f64>,
}

impl From<Coordinates> for GeoLocation {
    fn from(coords: Coordinates) -> Self {
        Self {
            lat: coords.latitude,
            lng: coords.longitude,
            accuracy: coords.accuracy,
        }
    }
}

/// Device metadata attached to every clock action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub device_id: String,
    pub model: String,
    pub os: String,
    pub app_version: String,
}

/// Event timestamp keyed by action type (`clockInTime` / `clockOutTime`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionTimestamp {
    #[serde(rename = "clockInTime")]
    ClockIn(DateTime<Utc>),
    #[serde(rename = "clockOutTime")]
    ClockOut(DateTime<Utc>),
}

impl ActionTimestamp {
    pub fn new(action_type: ClockActionType, at: DateTime<Utc>) -> Self {
        match action_type {
            ClockActionType::ClockIn => Self::ClockIn(at),
            ClockActionType::ClockOut => Self::ClockOut(at),
        }
    }
}

/// Full clock-in/clock-out request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClockPayload {
    #[serde(flatten)]
    pub timestamp: ActionTimestamp,
    pub location: GeoLocation,
    pub device: DeviceInfo,
}

impl ClockPayload {
    /// Read the event timestamp back out of a stored payload.
    pub fn timestamp_of(
        action_type: ClockActionType,
        payload: &serde_json::Value,
    ) -> Option<DateTime<Utc>> {
        payload
            .get(action_type.timestamp_field())
            .and_then(serde_json::Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc))
    }
}
