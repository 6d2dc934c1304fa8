// Device preference library: enumeration contracts, per-category ordering and persistence
pub mod backend;
pub mod capabilities;
pub mod global_config;
pub mod reconcile;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

pub use backend::{DeviceBackend, PlatformPlugin, StaticBackend};
pub use capabilities::BackendCapabilities;
pub use global_config::{AdvancedDevices, GlobalConfig, ListOptions};
pub use reconcile::{dedup_devices, reconcile, sort_by_stored};

/// Opaque handle of a device within one backend enumeration. List position encodes priority.
pub type DeviceId = i64;

/// Error types for device preference operations
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Unknown device kind: {0}")]
    UnknownKind(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Settings error: {0}")]
    Config(#[from] phonon_rs_config::ConfigError),
}

/// The kind of device a list is kept for. Each kind has its own settings group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    AudioOutput,
    AudioCapture,
    VideoCapture,
}

impl DeviceKind {
    pub fn settings_group(self) -> &'static str {
        match self {
            DeviceKind::AudioOutput => "AudioOutputDevice",
            DeviceKind::AudioCapture => "AudioCaptureDevice",
            DeviceKind::VideoCapture => "VideoCaptureDevice",
        }
    }

    pub fn is_audio(self) -> bool {
        matches!(self, DeviceKind::AudioOutput | DeviceKind::AudioCapture)
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::AudioOutput => write!(f, "output"),
            DeviceKind::AudioCapture => write!(f, "capture"),
            DeviceKind::VideoCapture => write!(f, "video"),
        }
    }
}

impl FromStr for DeviceKind {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "output" | "audio-output" | "sink" => Ok(DeviceKind::AudioOutput),
            "capture" | "audio-capture" | "source" => Ok(DeviceKind::AudioCapture),
            "video" | "video-capture" => Ok(DeviceKind::VideoCapture),
            _ => Err(DeviceError::UnknownKind(s.to_string())),
        }
    }
}

/// Usage context a device priority list may be stored for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    NoCategory,
    Notification,
    Music,
    Video,
    Communication,
    Game,
    Accessibility,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::NoCategory,
        Category::Notification,
        Category::Music,
        Category::Video,
        Category::Communication,
        Category::Game,
        Category::Accessibility,
    ];

    /// Numeric value used in persisted keys. `NoCategory` is -1.
    pub fn index(self) -> i32 {
        match self {
            Category::NoCategory => -1,
            Category::Notification => 0,
            Category::Music => 1,
            Category::Video => 2,
            Category::Communication => 3,
            Category::Game => 4,
            Category::Accessibility => 5,
        }
    }

    pub fn settings_key(self) -> String {
        format!("Category_{}", self.index())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::NoCategory => write!(f, "none"),
            Category::Notification => write!(f, "notification"),
            Category::Music => write!(f, "music"),
            Category::Video => write!(f, "video"),
            Category::Communication => write!(f, "communication"),
            Category::Game => write!(f, "game"),
            Category::Accessibility => write!(f, "accessibility"),
        }
    }
}

impl FromStr for Category {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "no-category" | "default" => Ok(Category::NoCategory),
            "notification" => Ok(Category::Notification),
            "music" => Ok(Category::Music),
            "video" => Ok(Category::Video),
            "communication" => Ok(Category::Communication),
            "game" => Ok(Category::Game),
            "accessibility" => Ok(Category::Accessibility),
            _ => Err(DeviceError::UnknownCategory(s.to_string())),
        }
    }
}

/// What a backend knows about a single device.
///
/// Missing metadata is treated as: not advanced, not a hardware device, available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub is_advanced: bool,
    pub is_hardware_device: bool,
    pub available: bool,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            is_advanced: false,
            is_hardware_device: false,
            available: true,
        }
    }
}

impl DeviceCapabilities {
    pub fn advanced() -> Self {
        Self {
            is_advanced: true,
            ..Self::default()
        }
    }

    pub fn hardware() -> Self {
        Self {
            is_hardware_device: true,
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_keys() {
        assert_eq!(Category::NoCategory.settings_key(), "Category_-1");
        assert_eq!(Category::Music.settings_key(), "Category_1");
        assert_eq!(Category::Accessibility.settings_key(), "Category_5");
    }

    #[test]
    fn test_parse_names() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
        assert_eq!("sink".parse::<DeviceKind>().unwrap(), DeviceKind::AudioOutput);
        assert_eq!("Capture".parse::<DeviceKind>().unwrap(), DeviceKind::AudioCapture);
        assert!(matches!("radio".parse::<Category>(), Err(DeviceError::UnknownCategory(_))));
        assert!(matches!("speaker".parse::<DeviceKind>(), Err(DeviceError::UnknownKind(_))));
    }

    #[test]
    fn test_capability_defaults() {
        let caps = DeviceCapabilities::default();
        assert!(!caps.is_advanced);
        assert!(!caps.is_hardware_device);
        assert!(caps.available);
        assert!(!DeviceCapabilities::unavailable().available);
    }
}
