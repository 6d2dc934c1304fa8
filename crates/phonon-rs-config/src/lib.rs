use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error};

/// Error types for configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration format: {reason}")]
    InvalidFormat { reason: String },

    #[error("Configuration property not found: {group}.{property}")]
    PropertyNotFound { group: String, property: String },

    #[error("Configuration property {group}.{property} has unexpected type, expected {expected}")]
    TypeMismatch {
        group: String,
        property: String,
        expected: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration value types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Float(f64),
    Array(Vec<ConfigValue>),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer list view of an `Array`. Any non-integer element makes the whole
    /// value unusable.
    pub fn as_integer_list(&self) -> Option<Vec<i64>> {
        match self {
            ConfigValue::Array(items) => items
                .iter()
                .map(|item| match item {
                    ConfigValue::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    pub fn integer_list(values: &[i64]) -> Self {
        ConfigValue::Array(values.iter().copied().map(ConfigValue::Integer).collect())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigGroup {
    properties: HashMap<String, ConfigValue>,
}

impl ConfigGroup {
    fn get(&self, property: &str) -> Option<&ConfigValue> {
        self.properties.get(property)
    }
}

/// Durable key-value settings store.
///
/// Properties live in named groups. A store created with [`PhononConfig::new`]
/// writes itself back to its TOML file after every mutation; one created with
/// [`PhononConfig::in_memory`] never touches the filesystem.
pub struct PhononConfig {
    groups: RwLock<HashMap<String, ConfigGroup>>,
    config_path: Option<PathBuf>,
}

impl std::fmt::Debug for PhononConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhononConfig")
            .field("config_path", &self.config_path)
            .field("groups", &"RwLock<HashMap<...>>")
            .finish()
    }
}

impl PhononConfig {
    pub fn new(config_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let config_path = config_path.into();
        let config = Self::load_from_file(&config_path)?;

        Ok(Self {
            groups: RwLock::new(config),
            config_path: Some(config_path),
        })
    }

    /// A store that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            config_path: None,
        }
    }

    /// `$XDG_CONFIG_HOME/phonon-rs/config.toml`, or `./phonon-rs/config.toml`
    /// without a config dir.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("phonon-rs")
            .join("config.toml")
    }

    /// The user's settings file at [`PhononConfig::default_path`], loaded.
    pub fn open_default() -> Result<Self, ConfigError> {
        Self::new(Self::default_path())
    }

    pub fn path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Load configuration from file
    fn load_from_file(path: &Path) -> Result<HashMap<String, ConfigGroup>, ConfigError> {
        if !path.exists() {
            debug!("No settings file at {}, starting empty", path.display());
            return Ok(HashMap::new());
        }

        let content = std::fs::read_to_string(path)?;
        let config: HashMap<String, ConfigGroup> = toml::from_str(&content)?;
        debug!("Loaded {} settings groups from {}", config.len(), path.display());
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.config_path else {
            return Ok(());
        };

        let groups = self.groups.read().await;
        let content = toml::to_string_pretty(&*groups)
            .map_err(|e| ConfigError::InvalidFormat { reason: e.to_string() })?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if let Err(e) = tokio::fs::write(path, content).await {
            error!("Failed to write settings to {}: {}", path.display(), e);
            return Err(e.into());
        }
        Ok(())
    }

    /// Get a configuration property
    pub async fn get_property(
        &self,
        group: &str,
        property: &str,
    ) -> Result<ConfigValue, ConfigError> {
        let groups = self.groups.read().await;

        groups
            .get(group)
            .and_then(|g| g.get(property))
            .cloned()
            .ok_or_else(|| ConfigError::PropertyNotFound {
                group: group.to_string(),
                property: property.to_string(),
            })
    }

    pub async fn has_property(&self, group: &str, property: &str) -> bool {
        let groups = self.groups.read().await;
        groups.get(group).is_some_and(|g| g.get(property).is_some())
    }

    /// Set a configuration property
    pub async fn set_property(
        &self,
        group: &str,
        property: &str,
        value: ConfigValue,
    ) -> Result<(), ConfigError> {
        {
            let mut groups = self.groups.write().await;
            groups
                .entry(group.to_string())
                .or_default()
                .properties
                .insert(property.to_string(), value);
        }

        debug!("Set {}.{}", group, property);
        self.save().await
    }

    /// Remove a property if present. Returns whether anything was removed.
    pub async fn remove_property(&self, group: &str, property: &str) -> Result<bool, ConfigError> {
        let removed = {
            let mut groups = self.groups.write().await;
            let removed = groups
                .get_mut(group)
                .and_then(|g| g.properties.remove(property))
                .is_some();
            if groups.get(group).is_some_and(|g| g.properties.is_empty()) {
                groups.remove(group);
            }
            removed
        };

        if removed {
            debug!("Removed {}.{}", group, property);
            self.save().await?;
        }
        Ok(removed)
    }

    /// Boolean property, or `default` when it is missing or not a boolean
    pub async fn get_bool(&self, group: &str, property: &str, default: bool) -> bool {
        match self.get_property(group, property).await {
            Ok(value) => value.as_bool().unwrap_or(default),
            Err(_) => default,
        }
    }

    /// Integer list property. `Ok(None)` when the property does not exist.
    pub async fn get_device_list(
        &self,
        group: &str,
        property: &str,
    ) -> Result<Option<Vec<i64>>, ConfigError> {
        let groups = self.groups.read().await;
        let Some(value) = groups.get(group).and_then(|g| g.get(property)) else {
            return Ok(None);
        };

        value
            .as_integer_list()
            .map(Some)
            .ok_or_else(|| ConfigError::TypeMismatch {
                group: group.to_string(),
                property: property.to_string(),
                expected: "integer array",
            })
    }

    pub async fn set_device_list(
        &self,
        group: &str,
        property: &str,
        devices: &[i64],
    ) -> Result<(), ConfigError> {
        self.set_property(group, property, ConfigValue::integer_list(devices))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_reopening_keeps_existing_settings() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let first = PhononConfig::new(&config_path).unwrap();
        first
            .set_device_list("AudioOutputDevice", "Category_-1", &[3, 1, 2])
            .await
            .unwrap();
        drop(first);

        let second = PhononConfig::new(&config_path).unwrap();
        second
            .set_property("General", "HideAdvancedDevices", ConfigValue::Boolean(false))
            .await
            .unwrap();
        drop(second);

        let reloaded = PhononConfig::new(&config_path).unwrap();
        assert_eq!(
            reloaded
                .get_device_list("AudioOutputDevice", "Category_-1")
                .await
                .unwrap(),
            Some(vec![3, 1, 2])
        );
        assert!(!reloaded.get_bool("General", "HideAdvancedDevices", true).await);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_open_default_loads_the_user_file() {
        let temp_dir = tempdir().unwrap();
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());

        let config = PhononConfig::open_default().unwrap();
        assert_eq!(config.path(), Some(PhononConfig::default_path().as_path()));
        assert!(config.path().unwrap().starts_with(temp_dir.path()));
        config
            .set_device_list("AudioCaptureDevice", "Category_-1", &[5, 4])
            .await
            .unwrap();
        drop(config);

        let config = PhononConfig::open_default().unwrap();
        config
            .set_property("General", "HideAdvancedDevices", ConfigValue::Boolean(true))
            .await
            .unwrap();
        drop(config);

        let reloaded = PhononConfig::open_default().unwrap();
        assert_eq!(
            reloaded
                .get_device_list("AudioCaptureDevice", "Category_-1")
                .await
                .unwrap(),
            Some(vec![5, 4])
        );
        assert!(reloaded.get_bool("General", "HideAdvancedDevices", false).await);
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty_until_written() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let config = PhononConfig::new(&config_path).unwrap();
        assert!(!config.has_property("General", "HideAdvancedDevices").await);
        assert!(matches!(
            config.get_property("General", "HideAdvancedDevices").await,
            Err(ConfigError::PropertyNotFound { .. })
        ));
        assert!(!config_path.exists());

        config
            .set_property("General", "HideAdvancedDevices", ConfigValue::Boolean(true))
            .await
            .unwrap();
        assert!(config_path.exists());
    }

    #[tokio::test]
    async fn test_device_lists_survive_reload() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        {
            let config = PhononConfig::new(&config_path).unwrap();
            config
                .set_device_list("AudioOutputDevice", "Category_-1", &[3, 1, 2])
                .await
                .unwrap();
            config
                .set_device_list("AudioOutputDevice", "Category_1", &[])
                .await
                .unwrap();
            config
                .set_property("General", "HideAdvancedDevices", ConfigValue::Boolean(false))
                .await
                .unwrap();
        }

        let reloaded = PhononConfig::new(&config_path).unwrap();
        assert_eq!(
            reloaded
                .get_device_list("AudioOutputDevice", "Category_-1")
                .await
                .unwrap(),
            Some(vec![3, 1, 2])
        );
        assert_eq!(
            reloaded
                .get_device_list("AudioOutputDevice", "Category_1")
                .await
                .unwrap(),
            Some(vec![])
        );
        assert!(!reloaded.get_bool("General", "HideAdvancedDevices", true).await);
    }

    #[tokio::test]
    async fn test_remove_property() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let config = PhononConfig::new(&config_path).unwrap();
        config
            .set_device_list("AudioCaptureDevice", "Category_3", &[1])
            .await
            .unwrap();

        assert!(config.has_property("AudioCaptureDevice", "Category_3").await);
        assert!(config
            .remove_property("AudioCaptureDevice", "Category_3")
            .await
            .unwrap());
        assert!(!config.has_property("AudioCaptureDevice", "Category_3").await);
        assert!(!config
            .remove_property("AudioCaptureDevice", "Category_3")
            .await
            .unwrap());

        let content = std::fs::read_to_string(&config_path).unwrap();
        assert!(!content.contains("AudioCaptureDevice"));
        let reloaded = PhononConfig::new(&config_path).unwrap();
        assert!(!reloaded.has_property("AudioCaptureDevice", "Category_3").await);
    }

    #[tokio::test]
    async fn test_typed_accessors() {
        let config = PhononConfig::in_memory();

        assert!(config.get_bool("General", "missing", true).await);
        assert_eq!(config.get_device_list("General", "missing").await.unwrap(), None);

        config
            .set_property("General", "name", ConfigValue::String("x".into()))
            .await
            .unwrap();
        assert!(!config.get_bool("General", "name", false).await);
        assert!(matches!(
            config.get_device_list("General", "name").await,
            Err(ConfigError::TypeMismatch { .. })
        ));

        let mixed = ConfigValue::Array(vec![ConfigValue::Integer(1), ConfigValue::Boolean(true)]);
        assert_eq!(mixed.as_integer_list(), None);
    }

    #[tokio::test]
    async fn test_in_memory_never_writes() {
        let config = PhononConfig::in_memory();
        assert!(config.path().is_none());
        config
            .set_property("General", "k", ConfigValue::Integer(1))
            .await
            .unwrap();
        config.save().await.unwrap();
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        std::fs::write(&config_path, "this is = = not toml").unwrap();

        assert!(matches!(
            PhononConfig::new(&config_path),
            Err(ConfigError::Parse(_))
        ));
    }
}
