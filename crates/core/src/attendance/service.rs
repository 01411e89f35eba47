//! Attendance service: submit now, or queue for later.
//!
//! A clock action is submitted immediately when the device is online. When
//! it is offline, or the submission fails because the server could not be
//! reached, the exact same payload is queued so the event time survives.
//! Any other failure is the server's answer and goes back to the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use timeclock_domain::{ClockActionType, Coordinates, OfflineClockAction, Result};
use tracing::{info, instrument, warn};

use crate::sync::ports::{ActionQueue, AttendanceApi, ConnectivityMonitor};
use crate::sync::{ActionFactory, ClockEvent, SyncCoordinator};

/// What happened to a clock action.
#[derive(Debug, Clone, PartialEq)]
pub enum ClockOutcome {
    /// Accepted by the server
    Submitted { captured_at: DateTime<Utc> },
    /// Stored for a later sync
    Queued(OfflineClockAction),
}

impl ClockOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued(_))
    }
}

pub struct AttendanceService {
    factory: ActionFactory,
    api: Arc<dyn AttendanceApi>,
    queue: Arc<dyn ActionQueue>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    coordinator: Arc<SyncCoordinator>,
}

impl AttendanceService {
    pub fn new(
        factory: ActionFactory,
        api: Arc<dyn AttendanceApi>,
        queue: Arc<dyn ActionQueue>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        coordinator: Arc<SyncCoordinator>,
    ) -> Self {
        Self {
            factory,
            api,
            queue,
            connectivity,
            coordinator,
        }
    }

    pub async fn clock_in(&self, coords: Coordinates) -> Result<ClockOutcome> {
        self.clock(ClockActionType::ClockIn, coords).await
    }

    pub async fn clock_out(&self, coords: Coordinates) -> Result<ClockOutcome> {
        self.clock(ClockActionType::ClockOut, coords).await
    }

    #[instrument(skip(self, coords))]
    pub async fn clock(
        &self,
        action_type: ClockActionType,
        coords: Coordinates,
    ) -> Result<ClockOutcome> {
        let event = self.factory.build(action_type, coords)?;

        if !self.connectivity.is_connected() {
            info!(action_type = %action_type, "Offline; queueing clock action");
            return self.enqueue(event).await;
        }

        match self.api.submit(action_type, &event.payload).await {
            Ok(()) => {
                info!(action_type = %action_type, "Clock action submitted");
                Ok(ClockOutcome::Submitted {
                    captured_at: event.captured_at,
                })
            }
            Err(err) if err.is_connectivity() => {
                warn!(
                    action_type = %action_type,
                    error = %err,
                    "Submission unreachable; queueing clock action"
                );
                self.enqueue(event).await
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn enqueue(&self, event: ClockEvent) -> Result<ClockOutcome> {
        let action = event.into_offline_action();
        self.queue.append(&action).await?;

        if let Err(err) = self.coordinator.refresh_pending_count().await {
            warn!(error = %err, "Failed to refresh pending count after queueing");
        }

        Ok(ClockOutcome::Queued(action))
    }
}
