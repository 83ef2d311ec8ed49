//! Configuration

use parallax_a11y::Surface;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Projection options shared by every mount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix of projected element ids; each mount appends its own index
    pub dom_id_prefix: String,

    /// Rendering surface, device and CSS pixel sizes
    pub surface: Surface,

    /// Side of the rectangle used when an object has no bounds
    pub placeholder_size: f64,

    /// Default `tracing` directive when `RUST_LOG` is unset
    pub log_filter: String,

    /// Keep the platform focus outline on projected elements
    pub focus_outline: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dom_id_prefix: "pxa-".to_string(),
            surface: Surface::default(),
            placeholder_size: 1.0,
            log_filter: "parallax=info".to_string(),
            focus_outline: false,
        }
    }
}

impl Config {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json() {
        let config = Config::from_json(r#"{"dom_id_prefix": "a11y-", "surface": {"device_width": 2.0}}"#).unwrap();
        assert_eq!(config.dom_id_prefix, "a11y-");
        assert_eq!(config.surface.device_width, 2.0);
        assert_eq!(config.surface.css_width, 1.0);
        assert_eq!(config.placeholder_size, 1.0);
        assert!(!config.focus_outline);
    }

    #[test]
    fn test_json_round_trip() {
        let config = Config { focus_outline: true, ..Default::default() };
        assert_eq!(Config::from_json(&config.to_json().unwrap()).unwrap(), config);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(Config::from_json("[1, 2]"), Err(crate::EngineError::Config(_))));
    }
}
