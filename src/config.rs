//! Configuration loaded from YAML.
//!
//! Maps the four column roles onto header names in the input CSV and carries
//! the motion filter threshold. Every key is optional; missing keys take the
//! defaults below.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};

/// Default speed threshold in km/h.
pub const DEFAULT_FILTER_ABOVE_KPH: f64 = 1.0;

/// Name of the configuration file looked for in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Commented template written when no configuration exists yet.
pub const DEFAULT_CONFIG_YAML: &str = r#"# GPS Processor Configuration

# CSV Column Mappings (specify the column names in your CSV file)
columns:
  id: "ID"               # Device/track identifier
  latitude: "latitude"   # Latitude coordinate
  longitude: "longitude" # Longitude coordinate
  timestamp: "timestamp" # Timestamp in RFC3339 format

# Processing Parameters
parameters:
  filter_above_kph: 1.0  # Filter out records with speed below this value (km/h)
"#;

/// Full processing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub columns: ColumnMapping,
    pub parameters: Parameters,
}

/// Header names for each column role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    /// Device/track identifier column
    pub id: String,
    pub latitude: String,
    pub longitude: String,
    /// RFC 3339 timestamp column
    pub timestamp: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            id: "ID".to_string(),
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            timestamp: "timestamp".to_string(),
        }
    }
}

/// Tunable processing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Minimum speed (km/h) a sample needs to be kept
    pub filter_above_kph: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            filter_above_kph: DEFAULT_FILTER_ABOVE_KPH,
        }
    }
}

impl Config {
    /// Parse a configuration from YAML text.
    ///
    /// # Example
    /// ```
    /// use track_processor::Config;
    ///
    /// let config = Config::from_yaml_str("parameters:\n  filter_above_kph: 3.5\n").unwrap();
    /// assert_eq!(config.parameters.filter_above_kph, 3.5);
    /// assert_eq!(config.columns.id, "ID");
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| TrackError::Config {
            path: path.to_path_buf(),
            message: format!("unable to read config file: {e}"),
        })?;
        let config = Self::from_yaml_str(&text)?;
        log::debug!("[Config] Loaded {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Write the commented default template to `path`.
    pub fn write_default(path: &Path) -> Result<()> {
        fs::write(path, DEFAULT_CONFIG_YAML).map_err(|e| TrackError::Config {
            path: path.to_path_buf(),
            message: format!("unable to create default config file: {e}"),
        })?;
        log::info!("[Config] Created default configuration file: {}", path.display());
        Ok(())
    }

    /// Speed threshold in km/h.
    pub fn threshold_kmh(&self) -> f64 {
        self.parameters.filter_above_kph
    }
}

impl ColumnMapping {
    /// One-line description of the mapping for log output.
    pub fn describe(&self) -> String {
        format!(
            "ID='{}', Lat='{}', Lon='{}', Time='{}'",
            self.id, self.latitude, self.longitude, self.timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.columns.id, "ID");
        assert_eq!(config.columns.latitude, "latitude");
        assert_eq!(config.columns.longitude, "longitude");
        assert_eq!(config.columns.timestamp, "timestamp");
        assert_eq!(config.threshold_kmh(), 1.0);
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config = Config::from_yaml_str(DEFAULT_CONFIG_YAML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = Config::from_yaml_str("columns:\n  id: device\n  timestamp: time\n").unwrap();
        assert_eq!(config.columns.id, "device");
        assert_eq!(config.columns.timestamp, "time");
        assert_eq!(config.columns.latitude, "latitude");
        assert_eq!(config.threshold_kmh(), DEFAULT_FILTER_ABOVE_KPH);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(Config::from_yaml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_yaml() {
        let result = Config::from_yaml_str("parameters:\n  filter_above_kph: fast\n");
        assert!(matches!(result, Err(TrackError::Yaml(_))));
    }

    #[test]
    fn test_write_and_load_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        Config::write_default(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(&dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(TrackError::Config { .. })));
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            ColumnMapping::default().describe(),
            "ID='ID', Lat='latitude', Lon='longitude', Time='timestamp'"
        );
    }
}
