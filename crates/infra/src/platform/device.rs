//! Device identity for clock payloads.
//!
//! The identifier must stay stable across restarts, so a generated one is
//! written to the key-value store and reused on the next launch.

use timeclock_core::{KeyValueStore, StaticDeviceInfo};
use timeclock_domain::{DeviceConfig, DeviceInfo, Result};
use tracing::info;
use uuid::Uuid;

/// Storage key holding the generated device identifier
pub const DEVICE_ID_KEY: &str = "@device_id";

/// Resolve the device block once at startup.
///
/// Precedence: configured id, then the persisted id, then a fresh v4 UUID
/// which is persisted before returning.
pub async fn resolve_device_info(
    config: &DeviceConfig,
    store: &dyn KeyValueStore,
) -> Result<StaticDeviceInfo> {
    let device_id = match configured_id(config) {
        Some(id) => id,
        None => match store.get_item(DEVICE_ID_KEY).await?.filter(|id| !id.trim().is_empty()) {
            Some(stored) => stored,
            None => {
                let generated = Uuid::new_v4().to_string();
                store.set_item(DEVICE_ID_KEY, &generated).await?;
                info!(device_id = %generated, "Generated device identifier");
                generated
            }
        },
    };

    Ok(StaticDeviceInfo(DeviceInfo {
        device_id,
        model: config.model.clone(),
        os: config.os.clone(),
        app_version: config.app_version.clone(),
    }))
}

fn configured_id(config: &DeviceConfig) -> Option<String> {
    config
        .device_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
