//! Audit configuration.
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration auditing the four reference devices.

use crate::emulation::DeviceCatalog;
use crate::result::{AuditError, AuditResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lowercase substrings that exempt small legal boilerplate by default
pub const DEFAULT_EXCLUDED_TERMS: [&str; 4] = ["©", "copyright", "terms", "policy"];

/// Font-size readability settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizeConfig {
    /// Text rendered below this size (in CSS pixels) is unreadable
    pub min_px: f64,
    /// Lowercase substrings that exempt small legal boilerplate
    pub excluded_terms: Vec<String>,
}

impl Default for FontSizeConfig {
    fn default() -> Self {
        Self {
            min_px: 12.0,
            excluded_terms: DEFAULT_EXCLUDED_TERMS
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Image aspect-ratio settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AspectRatioConfig {
    /// Images whose divergence is at or below this value are distorted
    pub tolerance: f64,
}

impl Default for AspectRatioConfig {
    fn default() -> Self {
        Self { tolerance: 0.99 }
    }
}

/// What to do when a check cannot be evaluated on a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationFailurePolicy {
    /// Record a failing outcome without evidence
    #[default]
    Record,
    /// Leave the device out of that check's results
    Skip,
}

/// Configuration of one audit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Device names, audited in this order
    pub devices: Vec<String>,
    /// Font-size check settings
    pub font_size: FontSizeConfig,
    /// Aspect-ratio check settings
    pub aspect_ratio: AspectRatioConfig,
    /// Handling of evaluation failures
    pub failure_policy: EvaluationFailurePolicy,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            devices: DeviceCatalog::REFERENCE_DEVICES
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
            font_size: FontSizeConfig::default(),
            aspect_ratio: AspectRatioConfig::default(),
            failure_policy: EvaluationFailurePolicy::default(),
        }
    }
}

impl AuditConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> AuditResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a YAML file
    pub fn load(path: &Path) -> AuditResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> AuditResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Audit these devices, in order
    #[must_use]
    pub fn with_devices<I, S>(mut self, devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.devices = devices.into_iter().map(Into::into).collect();
        self
    }

    /// Set the font-size threshold
    #[must_use]
    pub const fn with_min_font_px(mut self, min_px: f64) -> Self {
        self.font_size.min_px = min_px;
        self
    }

    /// Set the aspect-ratio tolerance
    #[must_use]
    pub const fn with_aspect_tolerance(mut self, tolerance: f64) -> Self {
        self.aspect_ratio.tolerance = tolerance;
        self
    }

    /// Set the evaluation failure policy
    #[must_use]
    pub const fn with_failure_policy(mut self, policy: EvaluationFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Check ranges and that every device is known to `catalog`
    pub fn validate(&self, catalog: &DeviceCatalog) -> AuditResult<()> {
        if self.devices.is_empty() {
            return Err(AuditError::invalid_config("at least one device is required"));
        }
        for name in &self.devices {
            catalog.resolve(name)?;
        }
        if !(self.font_size.min_px > 0.0 && self.font_size.min_px.is_finite()) {
            return Err(AuditError::invalid_config(format!(
                "font_size.min_px must be positive, got {}",
                self.font_size.min_px
            )));
        }
        let tolerance = self.aspect_ratio.tolerance;
        if !(tolerance > 0.0 && tolerance <= 1.0) {
            return Err(AuditError::invalid_config(format!(
                "aspect_ratio.tolerance must be in (0, 1], got {tolerance}"
            )));
        }
        Ok(())
    }
}
