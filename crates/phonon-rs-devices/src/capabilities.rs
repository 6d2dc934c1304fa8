// Application-facing queries and priority updates
use std::collections::HashSet;

use tracing::info;

use crate::global_config::{GlobalConfig, ListOptions};
use crate::reconcile::reconcile;
use crate::{Category, DeviceError, DeviceId, DeviceKind};

/// What applications see: the devices they may pick from, and the ability
/// to submit a new priority order for the devices they were shown.
#[derive(Debug)]
pub struct BackendCapabilities {
    config: GlobalConfig,
}

impl BackendCapabilities {
    pub fn new(config: GlobalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    pub async fn available_devices_for_category(
        &self,
        kind: DeviceKind,
        category: Category,
    ) -> Vec<DeviceId> {
        self.config
            .device_list_for(kind, category, ListOptions::default())
            .await
    }

    pub async fn available_video_capture_devices(&self) -> Vec<DeviceId> {
        self.available_devices_for_category(DeviceKind::VideoCapture, Category::NoCategory)
            .await
    }

    pub async fn hide_advanced_devices(&self) -> bool {
        self.config.hide_advanced_devices().await
    }

    pub async fn set_hide_advanced_devices(&self, hide: bool) -> Result<(), DeviceError> {
        self.config.set_hide_advanced_devices(hide).await
    }

    /// Store a new priority order for `category`.
    ///
    /// `devices` is normally the visible list the user rearranged. The full
    /// list is rebuilt around it so hidden devices keep their place next to
    /// the device they followed. Returns the order that was submitted for
    /// storage.
    pub async fn set_device_priority_list_for_category(
        &self,
        kind: DeviceKind,
        category: Category,
        devices: &[DeviceId],
    ) -> Result<Vec<DeviceId>, DeviceError> {
        let current = self
            .config
            .device_list_for(kind, category, ListOptions::everything())
            .await;

        let hidden: HashSet<DeviceId> = if self.config.hide_advanced_devices().await {
            current
                .iter()
                .copied()
                .filter(|&d| self.config.capabilities(kind, d).is_advanced)
                .collect()
        } else {
            HashSet::new()
        };

        let reordered = reconcile(current, devices, |d| hidden.contains(&d));
        self.config.set_device_list_for(kind, category, &reordered).await?;
        info!("Updated {} device priority for {}: {:?}", kind, category, reordered);
        Ok(reordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StaticBackend;
    use crate::DeviceCapabilities;
    use phonon_rs_config::PhononConfig;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn backend() -> StaticBackend {
        StaticBackend::new()
            .with_device(DeviceKind::AudioOutput, 1, DeviceCapabilities::default())
            .with_device(DeviceKind::AudioOutput, 2, DeviceCapabilities::advanced())
            .with_device(DeviceKind::AudioOutput, 3, DeviceCapabilities::default())
            .with_device(DeviceKind::AudioOutput, 4, DeviceCapabilities::default())
            .with_device(DeviceKind::VideoCapture, 20, DeviceCapabilities::default())
            .with_device(DeviceKind::VideoCapture, 21, DeviceCapabilities::unavailable())
    }

    fn capabilities_with(settings: Arc<PhononConfig>) -> BackendCapabilities {
        BackendCapabilities::new(GlobalConfig::new(settings).with_backend(Arc::new(backend())))
    }

    async fn outputs(caps: &BackendCapabilities, category: Category) -> Vec<DeviceId> {
        caps.available_devices_for_category(DeviceKind::AudioOutput, category)
            .await
    }

    #[tokio::test]
    async fn test_hidden_device_moves_with_its_predecessor() {
        let caps = capabilities_with(Arc::new(PhononConfig::in_memory()));
        let output = DeviceKind::AudioOutput;

        assert_eq!(outputs(&caps, Category::Music).await, vec![1, 3, 4]);

        let stored = caps
            .set_device_priority_list_for_category(output, Category::Music, &[3, 1])
            .await
            .unwrap();
        assert_eq!(stored, vec![3, 1, 2, 4]);
        assert_eq!(outputs(&caps, Category::Music).await, vec![3, 1, 4]);
        assert_eq!(outputs(&caps, Category::NoCategory).await, vec![1, 3, 4]);

        caps.set_hide_advanced_devices(false).await.unwrap();
        assert_eq!(outputs(&caps, Category::Music).await, vec![3, 1, 2, 4]);
    }

    #[tokio::test]
    async fn test_restoring_default_order_drops_override() {
        let settings = Arc::new(PhononConfig::in_memory());
        let caps = capabilities_with(settings.clone());
        let output = DeviceKind::AudioOutput;

        caps.set_device_priority_list_for_category(output, Category::Music, &[3, 1])
            .await
            .unwrap();
        assert!(settings.has_property("AudioOutputDevice", "Category_1").await);

        let stored = caps
            .set_device_priority_list_for_category(output, Category::Music, &[1, 3, 4])
            .await
            .unwrap();
        assert_eq!(stored, vec![1, 2, 3, 4]);
        assert!(!settings.has_property("AudioOutputDevice", "Category_1").await);

        // later changes to the default reach the category again
        caps.set_device_priority_list_for_category(output, Category::NoCategory, &[4, 3, 1])
            .await
            .unwrap();
        assert_eq!(outputs(&caps, Category::Music).await, vec![4, 3, 1]);
    }

    #[tokio::test]
    async fn test_stale_devices_in_request_are_ignored() {
        let caps = capabilities_with(Arc::new(PhononConfig::in_memory()));

        let stored = caps
            .set_device_priority_list_for_category(
                DeviceKind::AudioOutput,
                Category::Communication,
                &[99, 4],
            )
            .await
            .unwrap();
        assert_eq!(stored, vec![4, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_without_hiding_nothing_is_dragged() {
        let caps = capabilities_with(Arc::new(PhononConfig::in_memory()));
        caps.set_hide_advanced_devices(false).await.unwrap();

        let stored = caps
            .set_device_priority_list_for_category(DeviceKind::AudioOutput, Category::Game, &[3, 1])
            .await
            .unwrap();
        assert_eq!(stored, vec![3, 1, 2, 4]);

        let stored = caps
            .set_device_priority_list_for_category(
                DeviceKind::AudioOutput,
                Category::Video,
                &[1, 4],
            )
            .await
            .unwrap();
        assert_eq!(stored, vec![1, 4, 2, 3]);
    }

    #[tokio::test]
    async fn test_video_capture_devices() {
        let caps = capabilities_with(Arc::new(PhononConfig::in_memory()));
        assert_eq!(caps.available_video_capture_devices().await, vec![20]);
    }

    #[tokio::test]
    async fn test_preferences_persist_across_sessions() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        {
            let caps = capabilities_with(Arc::new(PhononConfig::new(&path).unwrap()));
            caps.set_hide_advanced_devices(false).await.unwrap();
            caps.set_device_priority_list_for_category(
                DeviceKind::AudioOutput,
                Category::Music,
                &[4, 2],
            )
            .await
            .unwrap();
        }

        let caps = capabilities_with(Arc::new(PhononConfig::new(&path).unwrap()));
        assert!(!caps.hide_advanced_devices().await);
        assert_eq!(outputs(&caps, Category::Music).await, vec![4, 2, 1, 3]);
    }
}
