//! Device identity: a stable per-device id and a display name.
//!
//! Both values live in device-local key-value storage under
//! [`DEVICE_ID_KEY`] and [`DEVICE_NAME_KEY`]. When that storage cannot be
//! read or written the provider keeps working with values held in memory for
//! the rest of the session.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::snapshot::SnapshotMetadata;
use crate::store::KeyValueStore;

pub const DEVICE_ID_KEY: &str = "agenda.deviceId";
pub const DEVICE_NAME_KEY: &str = "agenda.deviceName";

/// Browser signatures, checked in order; the first substring match wins.
/// Order matters: Edge and Opera user agents also contain "Chrome" and "Safari".
const BROWSER_SIGNATURES: [(&str, &str); 7] = [
    ("Edg/", "Edge"),
    ("OPR/", "Opera"),
    ("Opera", "Opera"),
    ("Firefox", "Firefox"),
    ("Chrome", "Chrome"),
    ("Safari", "Safari"),
    ("agenda/", "Agenda"),
];

const TABLET_PATTERNS: [&str; 4] = ["ipad", "tablet", "playbook", "silk"];
const MOBILE_PATTERNS: [&str; 7] = [
    "mobile",
    "iphone",
    "ipod",
    "android",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Identity and provenance of this device at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetadata {
    pub device_id: String,
    pub device_name: String,
    pub timestamp: DateTime<Utc>,
    pub user_agent: String,
}

impl From<DeviceMetadata> for SnapshotMetadata {
    fn from(meta: DeviceMetadata) -> Self {
        SnapshotMetadata {
            device_id: meta.device_id,
            device_name: meta.device_name,
            timestamp: meta.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceType {
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();

        // Android without "mobile" is a tablet
        if TABLET_PATTERNS.iter().any(|p| ua.contains(p))
            || (ua.contains("android") && !ua.contains("mobile"))
        {
            DeviceType::Tablet
        } else if MOBILE_PATTERNS.iter().any(|p| ua.contains(p)) {
            DeviceType::Mobile
        } else {
            DeviceType::Desktop
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "Mobile",
            DeviceType::Tablet => "Tablet",
            DeviceType::Desktop => "Desktop",
        }
    }
}

pub fn browser_name(user_agent: &str) -> &'static str {
    BROWSER_SIGNATURES
        .iter()
        .find(|(signature, _)| user_agent.contains(signature))
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

/// `"<browser> <deviceType>"`, e.g. `"Firefox Desktop"`.
pub fn default_device_name(user_agent: &str) -> String {
    format!(
        "{} {}",
        browser_name(user_agent),
        DeviceType::from_user_agent(user_agent).as_str()
    )
}

/// User agent reported by native clients of this crate.
pub fn native_user_agent() -> String {
    format!(
        "agenda/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

pub struct DeviceIdentityProvider<S> {
    storage: S,
    user_agent: String,
    session: Mutex<HashMap<&'static str, String>>,
}

impl<S: KeyValueStore> DeviceIdentityProvider<S> {
    pub fn new(storage: S, user_agent: impl Into<String>) -> Self {
        DeviceIdentityProvider {
            storage,
            user_agent: user_agent.into(),
            session: Mutex::new(HashMap::new()),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// The persisted device id, generated (UUID v4) and persisted on first use.
    pub fn device_id(&self) -> String {
        self.read_or_init(DEVICE_ID_KEY, || Uuid::new_v4().to_string())
    }

    /// The persisted display name, synthesized from the user agent on first use.
    pub fn device_name(&self) -> String {
        let user_agent = self.user_agent.clone();
        self.read_or_init(DEVICE_NAME_KEY, move || default_device_name(&user_agent))
    }

    /// Overwrite the display name. Blank names are ignored.
    /// Returns whether the name was changed.
    pub fn set_custom_device_name(&self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        if let Err(e) = self.storage.set(DEVICE_NAME_KEY, name) {
            warn!("Could not persist device name, keeping it for this session only: {e}");
        }
        self.remember(DEVICE_NAME_KEY, name.to_string());
        true
    }

    /// A fresh metadata snapshot; the timestamp is always the call time.
    pub fn device_metadata(&self) -> DeviceMetadata {
        DeviceMetadata {
            device_id: self.device_id(),
            device_name: self.device_name(),
            timestamp: Utc::now(),
            user_agent: self.user_agent.clone(),
        }
    }

    fn read_or_init(&self, key: &'static str, init: impl FnOnce() -> String) -> String {
        if let Some(value) = self.remembered(key) {
            return value;
        }

        match self.storage.get(key) {
            Ok(Some(value)) if !value.trim().is_empty() => {
                self.remember(key, value.clone());
                return value;
            }
            Ok(_) => {}
            Err(e) => warn!("Device storage unavailable, using in-memory {key}: {e}"),
        }

        let value = init();
        debug!("Initialized {key} = {value}");

        if let Err(e) = self.storage.set(key, &value) {
            warn!("Could not persist {key}, it will be regenerated next session: {e}");
        }
        self.remember(key, value.clone());
        value
    }

    fn remembered(&self, key: &str) -> Option<String> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    fn remember(&self, key: &'static str, value: String) {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, value);
    }
}
