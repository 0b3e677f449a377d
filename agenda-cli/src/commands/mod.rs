pub mod connect;
pub mod device;
pub mod new;
pub mod status;
pub mod sync;

use agenda_core::Agenda;
use agenda_core::identity::{DeviceIdentityProvider, native_user_agent};
use agenda_core::store::FileKeyValueStore;

/// This device's identity, persisted next to the config.
pub fn identity(agenda: &Agenda) -> DeviceIdentityProvider<FileKeyValueStore> {
    DeviceIdentityProvider::new(agenda.device_store(), native_user_agent())
}
