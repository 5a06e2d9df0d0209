//! Configuration for layer assembly.

use std::path::Path;

use covjson::CoverageJsonReader;
use serde::{Deserialize, Serialize};

use crate::error::{LayerError, LayerResult};

/// Value written into raster cells whose range value is missing.
pub const DEFAULT_NO_DATA_VALUE: f64 = -9_999_999.0;

/// Colour of the trailing "No data" category of categorical renderers.
pub const DEFAULT_NO_DATA_COLOR: &str = "#ff00ff";

/// Configuration for assembling coverages into layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    /// NoData marker for raster cells.
    pub no_data_value: f64,

    /// Largest accepted relative deviation between consecutive axis
    /// spacings before a grid is rejected as non-uniform.
    pub spacing_tolerance: f64,

    /// Pixel size used for axes with a single sample, in CRS units.
    pub fallback_pixel_size: f64,

    /// Append a "No data" category to categorical renderers.
    pub add_no_data_category: bool,

    /// Colour of the "No data" category.
    pub no_data_color: String,

    /// CRS assumed when a document declares no horizontal referencing.
    pub default_crs: String,

    /// Thresholds above which loading needs user confirmation.
    pub size_guard: SizeGuard,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            no_data_value: DEFAULT_NO_DATA_VALUE,
            spacing_tolerance: 1e-3,
            fallback_pixel_size: 1.0,
            add_no_data_category: true,
            no_data_color: DEFAULT_NO_DATA_COLOR.to_string(),
            default_crs: "EPSG:4326".to_string(),
            size_guard: SizeGuard::default(),
        }
    }
}

impl LayerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("COVJSON_NO_DATA_VALUE") {
            if let Ok(v) = val.parse() {
                config.no_data_value = v;
            }
        }

        if let Ok(val) = std::env::var("COVJSON_SPACING_TOLERANCE") {
            if let Ok(v) = val.parse() {
                config.spacing_tolerance = v;
            }
        }

        if let Ok(val) = std::env::var("COVJSON_FALLBACK_PIXEL_SIZE") {
            if let Ok(v) = val.parse() {
                config.fallback_pixel_size = v;
            }
        }

        if let Ok(val) = std::env::var("COVJSON_NO_DATA_CATEGORY") {
            config.add_no_data_category = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("COVJSON_NO_DATA_COLOR") {
            config.no_data_color = val;
        }

        if let Ok(val) = std::env::var("COVJSON_DEFAULT_CRS") {
            config.default_crs = val;
        }

        if let Ok(val) = std::env::var("COVJSON_CONFIRM_COVERAGES") {
            if let Ok(v) = val.parse() {
                config.size_guard.max_coverages = v;
            }
        }

        if let Ok(val) = std::env::var("COVJSON_CONFIRM_SIZE_MB") {
            if let Ok(v) = val.parse() {
                config.size_guard.max_size_mb = v;
            }
        }

        config
    }

    /// Load configuration from a YAML file; missing keys keep defaults.
    pub fn from_file(path: impl AsRef<Path>) -> LayerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> LayerResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LayerResult<()> {
        if !self.no_data_value.is_finite() {
            return Err(LayerError::config("no_data_value must be finite"));
        }

        if !(self.spacing_tolerance >= 0.0 && self.spacing_tolerance < 1.0) {
            return Err(LayerError::config("spacing_tolerance must be in [0, 1)"));
        }

        if !(self.fallback_pixel_size > 0.0 && self.fallback_pixel_size.is_finite()) {
            return Err(LayerError::config("fallback_pixel_size must be > 0"));
        }

        if crate::style::Color::parse_hex(&self.no_data_color).is_none() {
            return Err(LayerError::config(format!(
                "no_data_color `{}` is not a hex colour",
                self.no_data_color
            )));
        }

        if self.default_crs.is_empty() {
            return Err(LayerError::config("default_crs must not be empty"));
        }

        Ok(())
    }
}

/// Limits on document size before loading asks for confirmation.
///
/// Confirmation is needed only when both limits are exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeGuard {
    pub max_coverages: usize,
    pub max_size_mb: f64,
}

impl Default for SizeGuard {
    fn default() -> Self {
        Self {
            max_coverages: 1000,
            max_size_mb: 10.0,
        }
    }
}

impl SizeGuard {
    pub fn requires_confirmation(&self, reader: &CoverageJsonReader) -> bool {
        reader.coverages_count() > self.max_coverages && reader.file_size_mb() > self.max_size_mb
    }

    /// Message shown when asking for confirmation.
    pub fn prompt(&self, reader: &CoverageJsonReader) -> String {
        let location = reader
            .source()
            .map(|p| format!(" The file is located at `{}`.", p.display()))
            .unwrap_or_default();
        format!(
            "The CoverageJSON document is large ({:.3} MB, {} coverages) and may take a long time to load.{}\nDo you want to continue?",
            reader.file_size_mb(),
            reader.coverages_count(),
            location
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LayerConfig::default();
        assert_eq!(config.no_data_value, -9999999.0);
        assert_eq!(config.spacing_tolerance, 1e-3);
        assert!(config.add_no_data_category);
        assert_eq!(config.no_data_color, "#ff00ff");
        assert_eq!(config.default_crs, "EPSG:4326");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = LayerConfig::default();
        config.spacing_tolerance = -0.1;
        assert!(config.validate().is_err());

        config = LayerConfig::default();
        config.fallback_pixel_size = 0.0;
        assert!(config.validate().is_err());

        config = LayerConfig::default();
        config.no_data_value = f64::NAN;
        assert!(config.validate().is_err());

        config = LayerConfig::default();
        config.no_data_color = "magenta".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_yaml_keeps_defaults() {
        let config = LayerConfig::from_yaml(
            "no_data_value: -1.0\nsize_guard:\n  max_coverages: 5\n",
        )
        .unwrap();
        assert_eq!(config.no_data_value, -1.0);
        assert_eq!(config.size_guard.max_coverages, 5);
        assert_eq!(config.size_guard.max_size_mb, 10.0);
        assert_eq!(config.spacing_tolerance, 1e-3);
    }

    #[test]
    fn test_from_yaml_rejects_invalid() {
        assert!(matches!(
            LayerConfig::from_yaml("spacing_tolerance: 2.0"),
            Err(LayerError::Config(_))
        ));
        assert!(matches!(
            LayerConfig::from_yaml("no_data_value: [1, 2]"),
            Err(LayerError::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layers.yaml");
        std::fs::write(&path, "add_no_data_category: false\ndefault_crs: EPSG:3857\n").unwrap();

        let config = LayerConfig::from_file(&path).unwrap();
        assert!(!config.add_no_data_category);
        assert_eq!(config.default_crs, "EPSG:3857");
        assert!(LayerConfig::from_file(dir.path().join("absent.yaml")).is_err());
    }

    #[test]
    fn test_size_guard() {
        let reader = CoverageJsonReader::from_str(
            r#"{"type": "CoverageCollection", "coverages": []}"#,
        )
        .unwrap();
        let guard = SizeGuard::default();
        assert!(!guard.requires_confirmation(&reader));

        let strict = SizeGuard {
            max_coverages: 0,
            max_size_mb: 0.0,
        };
        // no coverages at all, so the count limit is not exceeded
        assert!(!strict.requires_confirmation(&reader));
        assert!(strict.prompt(&reader).contains("0 coverages"));
    }
}
