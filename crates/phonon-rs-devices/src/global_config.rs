// Per-category device lists backed by the settings store
use std::sync::Arc;

use phonon_rs_config::{ConfigValue, PhononConfig};
use tracing::{debug, warn};

use crate::backend::{DeviceBackend, PlatformPlugin};
use crate::reconcile::sort_by_stored;
use crate::{Category, DeviceCapabilities, DeviceError, DeviceId, DeviceKind};

const GENERAL_GROUP: &str = "General";
const HIDE_ADVANCED_KEY: &str = "HideAdvancedDevices";

/// Where the "hide advanced devices" decision comes from for one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancedDevices {
    /// Use the persisted toggle
    FromSettings,
    Hide,
    Show,
}

/// Filtering applied to a device list query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub advanced: AdvancedDevices,
    pub hide_unavailable: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            advanced: AdvancedDevices::FromSettings,
            hide_unavailable: true,
        }
    }
}

impl ListOptions {
    /// Every known device, advanced and unavailable ones included
    pub fn everything() -> Self {
        Self {
            advanced: AdvancedDevices::Show,
            hide_unavailable: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DeviceFilter {
    advanced: bool,
    hardware: bool,
    unavailable: bool,
}

impl DeviceFilter {
    fn is_active(&self) -> bool {
        self.advanced || self.hardware || self.unavailable
    }

    fn keeps(&self, caps: DeviceCapabilities) -> bool {
        !(self.advanced && caps.is_advanced
            || self.hardware && caps.is_hardware_device
            || self.unavailable && !caps.available)
    }
}

/// Device preferences for every kind and category.
///
/// Nothing is cached: each query combines the live enumeration with what the
/// settings store holds at that moment.
pub struct GlobalConfig {
    settings: Arc<PhononConfig>,
    backend: Option<Arc<dyn DeviceBackend>>,
    platform: Option<Arc<dyn PlatformPlugin>>,
}

impl std::fmt::Debug for GlobalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalConfig")
            .field("settings", &self.settings)
            .field("backend", &self.backend.is_some())
            .field("platform", &self.platform.is_some())
            .finish()
    }
}

impl GlobalConfig {
    pub fn new(settings: Arc<PhononConfig>) -> Self {
        Self {
            settings,
            backend: None,
            platform: None,
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn DeviceBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_platform_plugin(mut self, platform: Arc<dyn PlatformPlugin>) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn settings(&self) -> &Arc<PhononConfig> {
        &self.settings
    }

    pub fn backend(&self) -> Option<&Arc<dyn DeviceBackend>> {
        self.backend.as_ref()
    }

    /// Persisted toggle, on unless the user turned it off
    pub async fn hide_advanced_devices(&self) -> bool {
        self.settings.get_bool(GENERAL_GROUP, HIDE_ADVANCED_KEY, true).await
    }

    pub async fn set_hide_advanced_devices(&self, hide: bool) -> Result<(), DeviceError> {
        self.settings
            .set_property(GENERAL_GROUP, HIDE_ADVANCED_KEY, ConfigValue::Boolean(hide))
            .await?;
        Ok(())
    }

    /// Capabilities from the backend, then the platform plugin, then the defaults
    pub fn capabilities(&self, kind: DeviceKind, device: DeviceId) -> DeviceCapabilities {
        self.backend
            .as_ref()
            .and_then(|b| b.device_capabilities(kind, device))
            .or_else(|| {
                self.platform
                    .as_ref()
                    .and_then(|p| p.device_capabilities(kind, device))
            })
            .unwrap_or_default()
    }

    pub async fn is_hidden_device(&self, kind: DeviceKind, device: DeviceId) -> bool {
        if !self.hide_advanced_devices().await {
            return false;
        }
        self.capabilities(kind, device).is_advanced
    }

    /// Devices of `kind` in preference order for `category`
    pub async fn device_list_for(
        &self,
        kind: DeviceKind,
        category: Category,
        options: ListOptions,
    ) -> Vec<DeviceId> {
        let hide_advanced = match options.advanced {
            AdvancedDevices::FromSettings => self.hide_advanced_devices().await,
            AdvancedDevices::Hide => true,
            AdvancedDevices::Show => false,
        };

        let mut devices = Vec::new();

        let backend_is_partial = self
            .backend
            .as_ref()
            .map_or(true, |b| !b.full_audio_device_enumeration());
        if kind.is_audio() && backend_is_partial {
            if let Some(platform) = &self.platform {
                devices = platform.device_indexes(kind);
                if hide_advanced {
                    devices.retain(|&d| !self.capabilities(kind, d).is_advanced);
                }
            }
        }

        if let Some(backend) = &self.backend {
            let mut listed = backend.device_indexes(kind);
            let filter = DeviceFilter {
                advanced: hide_advanced,
                // the platform plugin already provided the hardware devices
                hardware: !devices.is_empty(),
                unavailable: options.hide_unavailable,
            };
            if filter.is_active() {
                listed.retain(|&d| {
                    filter.keeps(backend.device_capabilities(kind, d).unwrap_or_default())
                });
            }
            devices.extend(listed);
        }

        let stored = self.stored_list(kind, category).await;
        let sorted = sort_by_stored(stored.as_deref(), devices);
        debug!("{} devices for {}: {:?}", kind, category, sorted);
        sorted
    }

    /// Most preferred device, if any
    pub async fn device_for(
        &self,
        kind: DeviceKind,
        category: Category,
        options: ListOptions,
    ) -> Option<DeviceId> {
        self.device_list_for(kind, category, options)
            .await
            .first()
            .copied()
    }

    /// Persist `order` for `category`.
    ///
    /// A category list identical to the full `NoCategory` list is removed
    /// rather than stored, so the category keeps following the default.
    pub async fn set_device_list_for(
        &self,
        kind: DeviceKind,
        category: Category,
        order: &[DeviceId],
    ) -> Result<(), DeviceError> {
        let group = kind.settings_group();
        let key = category.settings_key();

        if category != Category::NoCategory {
            let no_category_order = self
                .device_list_for(kind, Category::NoCategory, ListOptions::everything())
                .await;
            if order == no_category_order.as_slice() {
                debug!("{} order for {} matches the default, dropping {}", kind, category, key);
                self.settings.remove_property(group, &key).await?;
                return Ok(());
            }
        }

        self.settings.set_device_list(group, &key, order).await?;
        Ok(())
    }

    /// Stored order for the category, falling back to the `NoCategory` order
    async fn stored_list(&self, kind: DeviceKind, category: Category) -> Option<Vec<DeviceId>> {
        let group = kind.settings_group();
        for candidate in [category, Category::NoCategory] {
            let key = candidate.settings_key();
            match self.settings.get_device_list(group, &key).await {
                Ok(Some(list)) => return Some(list),
                Ok(None) => {}
                Err(e) => warn!("Ignoring malformed device list {}.{}: {}", group, key, e),
            }
        }
        None
    }
}
