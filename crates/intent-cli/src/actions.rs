//! Demo action handlers.
//!
//! Business data lives behind [`DeviceRepository`]; the handlers only
//! format results. The registry built here is frozen before the engine
//! ever sees it.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use intent_retrieval::builtin::{
    ADD_DEVICE, DEVICE_NAME, GET_DEVICE_STATUS, GET_USER_POINTS, GET_USER_PROFILE, LIST_DEVICES,
    REMOVE_DEVICE, SHOW_HELP,
};
use intent_retrieval::ActionRegistry;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Online,
    Offline,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub name: String,
    pub status: DeviceStatus,
}

impl Device {
    pub fn new(name: impl Into<String>, status: DeviceStatus) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DeviceError {
    #[error("Device already exists: {0}")]
    AlreadyExists(String),

    #[error("Device not found: {0}")]
    NotFound(String),
}

/// Storage for the user's devices. Names compare case-insensitively.
pub trait DeviceRepository: Send + Sync {
    fn list(&self) -> Vec<Device>;

    fn get(&self, name: &str) -> Option<Device>;

    fn add(&self, name: &str) -> Result<Device, DeviceError>;

    fn remove(&self, name: &str) -> Result<Device, DeviceError>;
}

/// Process-local device roster.
#[derive(Debug, Default)]
pub struct InMemoryDeviceRepository {
    devices: RwLock<Vec<Device>>,
}

impl InMemoryDeviceRepository {
    pub fn new(devices: impl IntoIterator<Item = Device>) -> Self {
        Self {
            devices: RwLock::new(devices.into_iter().collect()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Device>> {
        self.devices.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Device>> {
        self.devices.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// A small roster so the demo has something to show.
    pub fn with_sample_devices() -> Self {
        Self::new([
            Device::new("Living Room Lamp", DeviceStatus::Online),
            Device::new("Thermostat", DeviceStatus::Online),
            Device::new("Garage Door", DeviceStatus::Offline),
        ])
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl DeviceRepository for InMemoryDeviceRepository {
    fn list(&self) -> Vec<Device> {
        self.read().clone()
    }

    fn get(&self, name: &str) -> Option<Device> {
        self.read().iter().find(|d| same_name(&d.name, name)).cloned()
    }

    fn add(&self, name: &str) -> Result<Device, DeviceError> {
        let mut devices = self.write();
        if devices.iter().any(|d| same_name(&d.name, name)) {
            return Err(DeviceError::AlreadyExists(name.to_string()));
        }
        let device = Device::new(name.trim(), DeviceStatus::Online);
        devices.push(device.clone());
        Ok(device)
    }

    fn remove(&self, name: &str) -> Result<Device, DeviceError> {
        let mut devices = self.write();
        let position = devices
            .iter()
            .position(|d| same_name(&d.name, name))
            .ok_or_else(|| DeviceError::NotFound(name.to_string()))?;
        Ok(devices.remove(position))
    }
}

/// The signed-in demo user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub points: u32,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Demo User".to_string(),
            email: "demo@example.com".to_string(),
            points: 1250,
        }
    }
}

const HELP_TEXT: &str = "I can show your points or profile, list your devices, \
add or remove a device, and report a device's status. Try \"add device Desk Lamp\".";

/// Registry with a handler for every built-in action.
pub fn demo_registry(devices: Arc<dyn DeviceRepository>, user: UserProfile) -> ActionRegistry {
    let points_user = user.clone();
    let list_repo = Arc::clone(&devices);
    let add_repo = Arc::clone(&devices);
    let remove_repo = Arc::clone(&devices);
    let status_repo = devices;

    ActionRegistry::builder()
        .action(GET_USER_POINTS, move || {
            format!("{}, you have {} points.", points_user.name, points_user.points)
        })
        .action(GET_USER_PROFILE, move || {
            format!(
                "Name: {}\nEmail: {}\nPoints: {}",
                user.name, user.email, user.points
            )
        })
        .action(LIST_DEVICES, move || {
            let devices = list_repo.list();
            if devices.is_empty() {
                return "You have no devices.".to_string();
            }
            let lines: Vec<String> = devices
                .iter()
                .map(|d| format!("- {} ({})", d.name, d.status.as_str()))
                .collect();
            format!("Your devices:\n{}", lines.join("\n"))
        })
        .action_with_param(ADD_DEVICE, DEVICE_NAME, move |name| {
            match add_repo.add(name) {
                Ok(device) => format!("Added device \"{}\".", device.name),
                Err(e) => e.to_string(),
            }
        })
        .action_with_param(REMOVE_DEVICE, DEVICE_NAME, move |name| {
            match remove_repo.remove(name) {
                Ok(device) => format!("Removed device \"{}\".", device.name),
                Err(e) => e.to_string(),
            }
        })
        .action_with_param(GET_DEVICE_STATUS, DEVICE_NAME, move |name| {
            match status_repo.get(name) {
                Some(device) => format!("{} is {}.", device.name, device.status.as_str()),
                None => DeviceError::NotFound(name.to_string()).to_string(),
            }
        })
        .action(SHOW_HELP, || HELP_TEXT.to_string())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use intent_retrieval::{builtin_catalog, ActionDispatcher};
    use intent_types::Language;

    #[test]
    fn test_repository_add_remove() {
        let repo = InMemoryDeviceRepository::default();
        assert_eq!(repo.add("Desk Lamp").unwrap().name, "Desk Lamp");
        assert_eq!(
            repo.add("desk lamp"),
            Err(DeviceError::AlreadyExists("desk lamp".to_string()))
        );
        assert!(repo.get("DESK LAMP").is_some());
        assert_eq!(repo.remove("Desk Lamp").unwrap().name, "Desk Lamp");
        assert!(matches!(repo.remove("Desk Lamp"), Err(DeviceError::NotFound(_))));
    }

    #[test]
    fn test_registry_covers_builtin_catalog() {
        let registry = demo_registry(
            Arc::new(InMemoryDeviceRepository::default()),
            UserProfile::default(),
        );
        for template in builtin_catalog().templates() {
            assert!(registry.contains(&template.action), "{}", template.action);
            assert_eq!(
                registry.parameter(&template.action),
                template.parameters.first().map(String::as_str)
            );
        }
    }

    #[test]
    fn test_handlers_use_repository() {
        let repo = Arc::new(InMemoryDeviceRepository::with_sample_devices());
        let dispatcher = ActionDispatcher::new(Arc::new(demo_registry(
            repo.clone(),
            UserProfile::default(),
        )));

        let outcome = dispatcher.dispatch(ADD_DEVICE, "add device Desk Fan", Language::En);
        assert!(outcome.executed);
        assert!(repo.get("Desk Fan").is_some());

        let outcome = dispatcher.dispatch(GET_DEVICE_STATUS, "status of Garage Door", Language::En);
        assert_eq!(outcome.response, "Garage Door is offline.");

        let outcome = dispatcher.dispatch(LIST_DEVICES, "list devices", Language::En);
        assert!(outcome.response.contains("Desk Fan"));
    }
}
