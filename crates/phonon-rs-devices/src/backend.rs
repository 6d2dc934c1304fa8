// Enumeration contracts and an in-memory implementation
use std::collections::HashMap;

use crate::{DeviceCapabilities, DeviceId, DeviceKind};

/// The media backend's view of the devices it can drive.
///
/// `device_indexes` returns devices in the backend's own default order.
pub trait DeviceBackend: Send + Sync {
    fn device_indexes(&self, kind: DeviceKind) -> Vec<DeviceId>;

    fn device_capabilities(&self, kind: DeviceKind, device: DeviceId) -> Option<DeviceCapabilities>;

    /// Human readable name, if the backend has one
    fn device_description(&self, _kind: DeviceKind, _device: DeviceId) -> Option<String> {
        None
    }

    /// Whether the backend lists every audio device itself. When it does not,
    /// the platform plugin's list is used first.
    fn full_audio_device_enumeration(&self) -> bool {
        true
    }
}

/// Platform-provided audio device list, consulted when the backend does not
/// enumerate all audio devices.
pub trait PlatformPlugin: Send + Sync {
    fn device_indexes(&self, kind: DeviceKind) -> Vec<DeviceId>;

    fn device_capabilities(&self, kind: DeviceKind, device: DeviceId) -> Option<DeviceCapabilities>;
}

#[derive(Debug, Clone)]
struct StaticDevice {
    id: DeviceId,
    description: Option<String>,
    capabilities: DeviceCapabilities,
}

/// Fixed device table, usable both as a backend and as a platform plugin.
#[derive(Debug, Clone)]
pub struct StaticBackend {
    devices: HashMap<DeviceKind, Vec<StaticDevice>>,
    full_enumeration: bool,
}

impl Default for StaticBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticBackend {
    pub fn new() -> Self {
        Self {
            devices: HashMap::new(),
            full_enumeration: true,
        }
    }

    /// Append a device to the enumeration of `kind`
    pub fn with_device(
        mut self,
        kind: DeviceKind,
        id: DeviceId,
        capabilities: DeviceCapabilities,
    ) -> Self {
        self.push(kind, id, None, capabilities);
        self
    }

    pub fn with_named_device(
        mut self,
        kind: DeviceKind,
        id: DeviceId,
        description: impl Into<String>,
        capabilities: DeviceCapabilities,
    ) -> Self {
        self.push(kind, id, Some(description.into()), capabilities);
        self
    }

    /// Report that audio enumeration is incomplete
    pub fn partial_enumeration(mut self) -> Self {
        self.full_enumeration = false;
        self
    }

    fn push(
        &mut self,
        kind: DeviceKind,
        id: DeviceId,
        description: Option<String>,
        capabilities: DeviceCapabilities,
    ) {
        self.devices.entry(kind).or_default().push(StaticDevice {
            id,
            description,
            capabilities,
        });
    }

    fn find(&self, kind: DeviceKind, device: DeviceId) -> Option<&StaticDevice> {
        self.devices.get(&kind)?.iter().find(|d| d.id == device)
    }

    fn indexes(&self, kind: DeviceKind) -> Vec<DeviceId> {
        self.devices
            .get(&kind)
            .map(|devices| devices.iter().map(|d| d.id).collect())
            .unwrap_or_default()
    }
}

impl DeviceBackend for StaticBackend {
    fn device_indexes(&self, kind: DeviceKind) -> Vec<DeviceId> {
        self.indexes(kind)
    }

    fn device_capabilities(
        &self,
        kind: DeviceKind,
        device: DeviceId,
    ) -> Option<DeviceCapabilities> {
        self.find(kind, device).map(|d| d.capabilities)
    }

    fn device_description(&self, kind: DeviceKind, device: DeviceId) -> Option<String> {
        self.find(kind, device).and_then(|d| d.description.clone())
    }

    fn full_audio_device_enumeration(&self) -> bool {
        self.full_enumeration
    }
}

impl PlatformPlugin for StaticBackend {
    fn device_indexes(&self, kind: DeviceKind) -> Vec<DeviceId> {
        self.indexes(kind)
    }

    fn device_capabilities(
        &self,
        kind: DeviceKind,
        device: DeviceId,
    ) -> Option<DeviceCapabilities> {
        self.find(kind, device).map(|d| d.capabilities)
    }
}
