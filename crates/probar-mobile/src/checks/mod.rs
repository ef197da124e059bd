//! Mobile-friendliness heuristics.
//!
//! Each check reads the currently emulated page through a [`PageDriver`] and
//! returns a fresh [`CheckOutcome`]. [`run_check`] is the static dispatch
//! table from [`CheckId`] to the heuristic.

pub mod aspect_ratio;
pub mod font_size;
pub mod overflow;
pub mod viewport;

use crate::config::AuditConfig;
use crate::driver::PageDriver;
use crate::result::AuditResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a check, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CheckId {
    /// Horizontal overflow
    #[serde(rename = "overflow")]
    Overflow,
    /// Viewport meta tag
    #[serde(rename = "viewport")]
    Viewport,
    /// Font size readability
    #[serde(rename = "fontSize")]
    FontSize,
    /// Image aspect ratios
    #[serde(rename = "aspectRatios")]
    AspectRatios,
}

impl CheckId {
    /// All checks in the order they run on each device
    pub const ALL: [Self; 4] = [
        Self::Overflow,
        Self::Viewport,
        Self::FontSize,
        Self::AspectRatios,
    ];

    /// Stable identifier used in reports
    #[must_use]
    pub const fn unique_name(self) -> &'static str {
        match self {
            Self::Overflow => "overflow",
            Self::Viewport => "viewport",
            Self::FontSize => "fontSize",
            Self::AspectRatios => "aspectRatios",
        }
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.unique_name())
    }
}

/// Markup illustrating a defect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Evidence {
    /// Serialized HTML
    Markup(String),
    /// Serialized HTML with the measurement that flagged it
    Measured {
        /// Serialized HTML
        snippet: String,
        /// Measured value, e.g. the aspect-ratio divergence
        ratio: f64,
    },
}

impl Evidence {
    /// The markup part of the evidence
    #[must_use]
    pub fn snippet(&self) -> &str {
        match self {
            Self::Markup(snippet) | Self::Measured { snippet, .. } => snippet,
        }
    }
}

/// Verdict of one check on one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Whether the page passed
    pub success: bool,
    /// Evidence for a failure; empty on success
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

impl CheckOutcome {
    /// Passing outcome
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            success: true,
            evidence: Vec::new(),
        }
    }

    /// Failing outcome with evidence
    #[must_use]
    pub const fn fail(evidence: Vec<Evidence>) -> Self {
        Self {
            success: false,
            evidence,
        }
    }

    /// Pass iff no evidence was collected
    #[must_use]
    pub fn from_evidence(evidence: Vec<Evidence>) -> Self {
        if evidence.is_empty() {
            Self::pass()
        } else {
            Self::fail(evidence)
        }
    }
}

/// Run one check against the current page
pub async fn run_check<D>(
    id: CheckId,
    driver: &mut D,
    config: &AuditConfig,
) -> AuditResult<CheckOutcome>
where
    D: PageDriver + ?Sized,
{
    match id {
        CheckId::Overflow => overflow::detect(driver).await,
        CheckId::Viewport => viewport::validate(driver).await,
        CheckId::FontSize => font_size::scan(driver, &config.font_size).await,
        CheckId::AspectRatios => aspect_ratio::detect(driver, &config.aspect_ratio).await,
    }
}
