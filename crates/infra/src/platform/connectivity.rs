//! Connectivity monitor fed by the host's network observer.
//!
//! The host pushes reachability changes with [`WatchConnectivity::set_connected`];
//! the sync watcher and the attendance service read it through the
//! `ConnectivityMonitor` port.

use timeclock_core::ConnectivityMonitor;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug)]
pub struct WatchConnectivity {
    state: watch::Sender<bool>,
}

impl WatchConnectivity {
    pub fn new(connected: bool) -> Self {
        Self {
            state: watch::Sender::new(connected),
        }
    }

    /// Record the current reachability. Repeating the same value does not
    /// wake subscribers.
    pub fn set_connected(&self, connected: bool) {
        let changed = self.state.send_if_modified(|current| {
            if *current == connected {
                return false;
            }
            *current = connected;
            true
        });

        if changed {
            info!(connected, "Connectivity changed");
        }
    }
}

impl Default for WatchConnectivity {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ConnectivityMonitor for WatchConnectivity {
    fn is_connected(&self) -> bool {
        *self.state.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}
