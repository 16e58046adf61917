// src/config.rs - Declarative fleet configuration
use crate::error::Result;
use crate::registry::SensorSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Fleet configuration loaded from YAML
///
/// # Examples
///
/// ```rust
/// use sentra::Config;
///
/// let yaml = r#"
/// sensors:
///   - id: "TEMP_01"
///     kind: temperature
///     unit: "°C"
///     min: 0.0
///     max: 100.0
///     warning: 75.0
///     critical: 90.0
///     direction: above
/// "#;
///
/// let config = Config::from_yaml(yaml)?;
/// assert_eq!(config.sensors.len(), 1);
/// # Ok::<(), sentra::MonitorError>(())
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Sensor definitions
    #[serde(default)]
    pub sensors: Vec<SensorSpec>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks that do not need a registry
    ///
    /// Threshold ordering is re-checked by the registry on registration;
    /// this only catches duplicate ids early, with a file-level error.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spec in &self.sensors {
            if !seen.insert(spec.id.as_str()) {
                return Err(crate::error::MonitorError::Validation(format!(
                    "duplicate sensor id '{}' in configuration",
                    spec.id
                )));
            }
        }
        Ok(())
    }
}
