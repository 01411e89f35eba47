//! Device-facing adapters: network reachability and device identity.

pub mod connectivity;
pub mod device;

pub use connectivity::WatchConnectivity;
pub use device::{resolve_device_info, DEVICE_ID_KEY};
