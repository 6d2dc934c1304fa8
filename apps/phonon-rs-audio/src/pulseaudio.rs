// PulseAudio device enumeration using pulsectl-rs
//
// Sinks are audio outputs, sources are audio captures. The device list is a
// snapshot taken by `refresh_devices`; the backend trait reads the snapshot.
use anyhow::Result;
use libpulse_binding::def::PortAvailable;
use phonon_rs_devices::{DeviceBackend, DeviceCapabilities, DeviceId, DeviceKind};
use pulsectl::controllers::types::DeviceInfo;
use pulsectl::controllers::{DeviceControl, SinkController, SourceController};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct PulseDevice {
    pub name: String,
    pub description: String,
    pub index: u32,
    pub card: Option<u32>,
    /// One entry per port, `false` when the server reports it unplugged
    pub ports_available: Vec<bool>,
}

impl PulseDevice {
    pub fn id(&self) -> DeviceId {
        DeviceId::from(self.index)
    }

    /// Monitor sources are advanced, card-backed devices are hardware devices,
    /// and a device whose ports are all unplugged is unavailable.
    pub fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities {
            is_advanced: self.name.ends_with(".monitor"),
            is_hardware_device: self.card.is_some(),
            available: self.ports_available.is_empty() || self.ports_available.iter().any(|&a| a),
        }
    }
}

fn device_from_device_info(device: DeviceInfo) -> PulseDevice {
    let ports_available = device
        .ports
        .iter()
        .map(|p| !matches!(p.available, PortAvailable::No))
        .collect::<Vec<_>>();

    debug!(
        "Found device: index={}, name={:?}, ports={}, state={:?}, card={:?}",
        device.index,
        device.name,
        ports_available.len(),
        device.state,
        device.card
    );

    PulseDevice {
        name: device.name.clone().unwrap_or_default(),
        description: device.description.clone().unwrap_or_default(),
        index: device.index,
        card: device.card,
        ports_available,
    }
}

fn lock(devices: &Mutex<Vec<PulseDevice>>) -> MutexGuard<'_, Vec<PulseDevice>> {
    devices.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct PulseAudioBackend {
    sinks: Arc<Mutex<Vec<PulseDevice>>>,
    sources: Arc<Mutex<Vec<PulseDevice>>>,
}

impl PulseAudioBackend {
    pub fn new() -> Self {
        Self {
            sinks: Arc::new(Mutex::new(Vec::new())),
            sources: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn connect(&self) -> Result<()> {
        info!("Connecting to PulseAudio daemon");
        self.refresh_devices().await
    }

    pub async fn refresh_devices(&self) -> Result<()> {
        let sinks = self.sinks.clone();
        let sources = self.sources.clone();

        tokio::task::spawn_blocking(move || Self::refresh_devices_blocking(sinks, sources))
            .await
            .map_err(|e| anyhow::anyhow!("Task error: {}", e))??;
        Ok(())
    }

    fn refresh_devices_blocking(
        sinks: Arc<Mutex<Vec<PulseDevice>>>,
        sources: Arc<Mutex<Vec<PulseDevice>>>,
    ) -> Result<()> {
        let mut sink_controller = SinkController::create()
            .map_err(|e| anyhow::anyhow!("Failed to create SinkController: {}", e))?;
        let devices = sink_controller
            .list_devices()
            .map_err(|e| anyhow::anyhow!("Failed to list sinks: {}", e))?;
        let listed: Vec<PulseDevice> = devices.into_iter().map(device_from_device_info).collect();
        info!("PulseAudio reports {} sinks", listed.len());
        *lock(&sinks) = listed;

        let mut source_controller = SourceController::create()
            .map_err(|e| anyhow::anyhow!("Failed to create SourceController: {}", e))?;
        let devices = source_controller
            .list_devices()
            .map_err(|e| anyhow::anyhow!("Failed to list sources: {}", e))?;
        let listed: Vec<PulseDevice> = devices.into_iter().map(device_from_device_info).collect();
        info!("PulseAudio reports {} sources", listed.len());
        *lock(&sources) = listed;

        Ok(())
    }

    fn devices(&self, kind: DeviceKind) -> Option<&Mutex<Vec<PulseDevice>>> {
        match kind {
            DeviceKind::AudioOutput => Some(&self.sinks),
            DeviceKind::AudioCapture => Some(&self.sources),
            DeviceKind::VideoCapture => None,
        }
    }

    fn find<T>(
        &self,
        kind: DeviceKind,
        device: DeviceId,
        f: impl FnOnce(&PulseDevice) -> T,
    ) -> Option<T> {
        let devices = lock(self.devices(kind)?);
        devices.iter().find(|d| d.id() == device).map(f)
    }
}

impl Default for PulseAudioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceBackend for PulseAudioBackend {
    fn device_indexes(&self, kind: DeviceKind) -> Vec<DeviceId> {
        self.devices(kind)
            .map(|devices| lock(devices).iter().map(PulseDevice::id).collect())
            .unwrap_or_default()
    }

    fn device_capabilities(
        &self,
        kind: DeviceKind,
        device: DeviceId,
    ) -> Option<DeviceCapabilities> {
        self.find(kind, device, PulseDevice::capabilities)
    }

    fn device_description(&self, kind: DeviceKind, device: DeviceId) -> Option<String> {
        self.find(kind, device, |d| {
            if d.description.is_empty() {
                d.name.clone()
            } else {
                d.description.clone()
            }
        })
    }
}
