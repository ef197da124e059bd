//! Viewport meta tag validation.

use super::CheckOutcome;
use crate::dom::tagged_script;
use crate::driver::{evaluate_as, PageDriver};
use crate::result::AuditResult;
use serde::{Deserialize, Serialize};

/// The page's `<meta name="viewport">`, as read from the document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportMeta {
    /// Whether the tag exists
    pub present: bool,
    /// Its `content` attribute
    pub content: Option<String>,
}

impl ViewportMeta {
    /// A viewport tag with the given content
    #[must_use]
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            present: true,
            content: Some(content.into()),
        }
    }

    /// No viewport tag at all
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            present: false,
            content: None,
        }
    }

    /// Valid iff present and its content declares a width
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.present
            && self
                .content
                .as_deref()
                .is_some_and(|content| content.trim().to_lowercase().contains("width="))
    }
}

/// Script reading the viewport meta tag
#[must_use]
pub fn viewport_script() -> String {
    tagged_script(
        "viewport",
        r#"(() => {
  const meta = document.querySelector('meta[name="viewport"]');
  return { present: !!meta, content: meta ? meta.getAttribute('content') : null };
})()"#,
    )
}

/// Pass iff the page declares a viewport width; never collects evidence
pub async fn validate<D>(driver: &mut D) -> AuditResult<CheckOutcome>
where
    D: PageDriver + ?Sized,
{
    let meta: ViewportMeta = evaluate_as(driver, &viewport_script(), "viewport meta").await?;
    Ok(if meta.is_valid() {
        CheckOutcome::pass()
    } else {
        CheckOutcome::fail(Vec::new())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockPage};

    #[test]
    fn test_device_width_is_valid() {
        assert!(ViewportMeta::with_content("width=device-width,initial-scale=1").is_valid());
        assert!(ViewportMeta::with_content("  WIDTH=320 ").is_valid());
    }

    #[test]
    fn test_missing_width_is_invalid() {
        assert!(!ViewportMeta::with_content("initial-scale=1").is_valid());
        assert!(!ViewportMeta::missing().is_valid());
        let no_content = ViewportMeta {
            present: true,
            content: None,
        };
        assert!(!no_content.is_valid());
    }

    #[tokio::test]
    async fn test_validate_through_driver() {
        let mut good = MockDriver::with_page(
            MockPage::new().with_viewport(ViewportMeta::with_content(
                "width=device-width,initial-scale=1",
            )),
        );
        let outcome = validate(&mut good).await.unwrap();
        assert!(outcome.success);
        assert!(outcome.evidence.is_empty());

        let mut missing = MockDriver::with_page(MockPage::new().with_viewport(ViewportMeta::missing()));
        let outcome = validate(&mut missing).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.evidence.is_empty());

        let mut scale_only = MockDriver::with_page(
            MockPage::new().with_viewport(ViewportMeta::with_content("initial-scale=1")),
        );
        assert!(!validate(&mut scale_only).await.unwrap().success);
    }
}
