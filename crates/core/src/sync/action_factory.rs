//! Builds clock action payloads from a location reading.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use timeclock_domain::{
    ActionTimestamp, ClockActionType, ClockPayload, Coordinates, OfflineClockAction, Result,
    TimeclockError,
};

use super::ports::DeviceInfoProvider;
use crate::time::Clock;

/// A clock event ready to submit or queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockEvent {
    pub action_type: ClockActionType,
    /// Single clock read shared by the payload timestamp and `createdAt`.
    pub captured_at: DateTime<Utc>,
    pub payload: Value,
}

impl ClockEvent {
    pub fn into_offline_action(self) -> OfflineClockAction {
        OfflineClockAction::new(self.action_type, self.payload, self.captured_at)
    }
}

/// Pure data construction; never touches the network or storage.
pub struct ActionFactory {
    clock: Arc<dyn Clock>,
    device: Arc<dyn DeviceInfoProvider>,
}

impl ActionFactory {
    pub fn new(clock: Arc<dyn Clock>, device: Arc<dyn DeviceInfoProvider>) -> Self {
        Self { clock, device }
    }

    /// Build the request body for `action_type` at the current time.
    ///
    /// Coordinates are carried through untouched; out-of-range or non-finite
    /// readings are rejected.
    pub fn build(&self, action_type: ClockActionType, coords: Coordinates) -> Result<ClockEvent> {
        validate(&coords)?;

        let captured_at = self.clock.now();
        let payload = ClockPayload {
            timestamp: ActionTimestamp::new(action_type, captured_at),
            location: coords.into(),
            device: self.device.device_info(),
        };

        Ok(ClockEvent {
            action_type,
            captured_at,
            payload: serde_json::to_value(&payload)?,
        })
    }
}

fn validate(coords: &Coordinates) -> Result<()> {
    if !coords.latitude.is_finite() || !(-90.0..=90.0).contains(&coords.latitude) {
        return Err(TimeclockError::InvalidInput(format!(
            "latitude out of range: {}",
            coords.latitude
        )));
    }
    if !coords.longitude.is_finite() || !(-180.0..=180.0).contains(&coords.longitude) {
        return Err(TimeclockError::InvalidInput(format!(
            "longitude out of range: {}",
            coords.longitude
        )));
    }
    if let Some(accuracy) = coords.accuracy {
        if !accuracy.is_finite() || accuracy < 0.0 {
            return Err(TimeclockError::InvalidInput(format!("invalid accuracy: {accuracy}")));
        }
    }
    Ok(())
}
