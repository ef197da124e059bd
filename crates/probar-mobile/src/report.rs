//! Score aggregation.
//!
//! Reduces the per-device failures of a run into one [`ReportRecord`] per
//! check, in check order. Each failing device costs half a point; a check
//! bottoms out at zero.

use crate::checks::{CheckId, CheckOutcome, Evidence};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Score lost per failing device
pub const PENALTY_PER_DEVICE: f64 = 0.5;

/// Placeholder replaced by the failing device names
pub const DEVICES_PLACEHOLDER: &str = "%devices%";

/// Static metadata of a check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestDefinition {
    /// Check identifier
    pub id: CheckId,
    /// Human-readable title
    pub title: &'static str,
    /// What the check verifies
    pub description: &'static str,
    /// Share of the overall score
    pub weight: f64,
    /// Remediation advice
    pub message: &'static str,
}

/// Definitions of all checks, in report order
pub static TEST_DEFINITIONS: [TestDefinition; 4] = [
    TestDefinition {
        id: CheckId::Overflow,
        title: "Horizontal overflow",
        description: "Checks to make sure that your website's content fits in the screen's \
            width on mobiles and tablets.",
        weight: 0.25,
        message: "Fix content causing horizontal overflow on your page.",
    },
    TestDefinition {
        id: CheckId::Viewport,
        title: "Viewport meta tag",
        description: "Checks that your page has a `viewport` meta tag, which is required in \
            order to adjust correctly on mobiles and tablets.",
        weight: 0.25,
        message: "Add a `viewport` meta tag to your page. The following should work for most \
            projects: `<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">`.",
    },
    TestDefinition {
        id: CheckId::FontSize,
        title: "Font size readability",
        description: "Checks the font size for the text on your page to make sure it is not \
            too small on mobiles and tablets. A font size of at least 12px is recommended for \
            good readability and accessibility.",
        weight: 0.25,
        message: "Update your CSS to make sure the text on your page always has a font size \
            of 12px or more.",
    },
    TestDefinition {
        id: CheckId::AspectRatios,
        title: "Images aspect ratio",
        description: "Checks the images on your page to make sure that they do not appear \
            stretched or distorted on mobiles and tablets.",
        weight: 0.25,
        message: "Update your CSS to fix distorted images on your page. The `object-fit` CSS \
            property might be a good place to look.",
    },
];

impl TestDefinition {
    /// Definition of a check
    #[must_use]
    pub fn of(id: CheckId) -> &'static Self {
        match id {
            CheckId::Overflow => &TEST_DEFINITIONS[0],
            CheckId::Viewport => &TEST_DEFINITIONS[1],
            CheckId::FontSize => &TEST_DEFINITIONS[2],
            CheckId::AspectRatios => &TEST_DEFINITIONS[3],
        }
    }
}

// =============================================================================
// Failures
// =============================================================================

/// A failing outcome attributed to a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceFailure {
    /// Device name
    pub device: String,
    /// The failing outcome
    pub outcome: CheckOutcome,
}

/// Failing outcomes per check, in device order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailureMap {
    by_check: BTreeMap<CheckId, Vec<DeviceFailure>>,
}

impl FailureMap {
    /// Empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome; passing outcomes are not stored
    pub fn record(&mut self, id: CheckId, device: impl Into<String>, outcome: CheckOutcome) {
        if outcome.success {
            return;
        }
        self.by_check.entry(id).or_default().push(DeviceFailure {
            device: device.into(),
            outcome,
        });
    }

    /// Failures of one check
    #[must_use]
    pub fn failures(&self, id: CheckId) -> &[DeviceFailure] {
        self.by_check.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Names of the devices failing a check
    pub fn failing_devices(&self, id: CheckId) -> impl Iterator<Item = &str> {
        self.failures(id).iter().map(|f| f.device.as_str())
    }

    /// Whether no check failed anywhere
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_check.values().all(Vec::is_empty)
    }

    /// Drop everything recorded
    pub fn clear(&mut self) {
        self.by_check.clear();
    }
}

// =============================================================================
// Records
// =============================================================================

/// Remediation template with its substitutions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation(pub String, pub BTreeMap<String, String>);

impl Recommendation {
    /// Recommendation naming the affected devices
    #[must_use]
    pub fn for_devices(message: &str, devices: &[&str]) -> Self {
        let template = format!(
            "{message} The issue was detected on the following devices: {DEVICES_PLACEHOLDER}."
        );
        let mut substitutions = BTreeMap::new();
        substitutions.insert(DEVICES_PLACEHOLDER.to_string(), devices.join(", "));
        Self(template, substitutions)
    }

    /// Template with placeholders substituted
    #[must_use]
    pub fn render(&self) -> String {
        self.1
            .iter()
            .fold(self.0.clone(), |text, (key, value)| text.replace(key, value))
    }
}

/// Aggregated result of one check across all devices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    /// Check identifier
    pub unique_name: CheckId,
    /// Human-readable title
    pub title: String,
    /// What the check verifies
    pub description: String,
    /// Share of the overall score
    pub weight: f64,
    /// Score in `[0, 1]`
    pub score: f64,
    /// Evidence of all failing devices, in device order
    pub snippets: Vec<Evidence>,
    /// Present iff the score is below 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<Recommendation>>,
}

impl ReportRecord {
    /// Whether every device passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.recommendations.is_none()
    }
}

/// Score after `failing` devices failed a check
#[must_use]
pub fn score_for(failing: usize) -> f64 {
    PENALTY_PER_DEVICE.mul_add(-(failing as f64), 1.0).max(0.0)
}

/// Build the report records, in check order
#[must_use]
pub fn aggregate(failures: &FailureMap) -> Vec<ReportRecord> {
    TEST_DEFINITIONS
        .iter()
        .map(|definition| {
            let failed = failures.failures(definition.id);
            let devices: Vec<&str> = failures.failing_devices(definition.id).collect();
            let score = score_for(failed.len());
            let snippets = failed
                .iter()
                .flat_map(|f| f.outcome.evidence.iter().cloned())
                .collect();
            let recommendations = (score < 1.0)
                .then(|| vec![Recommendation::for_devices(definition.message, &devices)]);

            ReportRecord {
                unique_name: definition.id,
                title: definition.title.to_string(),
                description: definition.description.to_string(),
                weight: definition.weight,
                score,
                snippets,
                recommendations,
            }
        })
        .collect()
}

/// Weighted page score, `Σ weight × score`
#[must_use]
pub fn overall_score(records: &[ReportRecord]) -> f64 {
    records.iter().map(|r| r.weight * r.score).sum()
}
