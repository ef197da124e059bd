//! PageDriver - the page evaluation port
//!
//! Every check reaches the rendered document through this trait. The audit
//! holds the driver by `&mut`, so emulation changes and evaluations are
//! strictly sequential against the single page.
//!
//! ```text
//! ┌──────────────────────┐      ┌──────────────────────┐
//! │  MobileAudit         │ &mut │  PageDriver          │
//! │  (device × check)    │─────►│  emulate / evaluate  │
//! └──────────────────────┘      └──────────┬───────────┘
//!                                          │
//!                       ┌──────────────────┴─────────────────┐
//!                       │                                    │
//!             ┌─────────▼─────────┐              ┌───────────▼─────────┐
//!             │  browser::Page    │              │  mock::MockDriver   │
//!             │  (chromiumoxide)  │              │  (unit tests)       │
//!             └───────────────────┘              └─────────────────────┘
//! ```

use crate::emulation::DeviceDescriptor;
use crate::result::{AuditError, AuditResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Abstract page the audit runs against
#[async_trait]
pub trait PageDriver: Send {
    /// Apply a device profile; the change is visible to the next evaluation
    async fn emulate(&mut self, device: &DeviceDescriptor) -> AuditResult<()>;

    /// Evaluate a self-contained script in the document and return its value
    async fn evaluate(&mut self, script: &str) -> AuditResult<serde_json::Value>;

    /// The automation layer's own user agent
    async fn default_user_agent(&mut self) -> AuditResult<String>;
}

/// Evaluate a script and decode its value
pub async fn evaluate_as<T, D>(driver: &mut D, script: &str, what: &'static str) -> AuditResult<T>
where
    T: DeserializeOwned,
    D: PageDriver + ?Sized,
{
    let value = driver.evaluate(script).await?;
    serde_json::from_value(value).map_err(|source| AuditError::Decode { what, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Flag {
        present: bool,
    }

    #[tokio::test]
    async fn test_evaluate_as_reports_shape_mismatch() {
        let mut driver = MockDriver::new();
        driver.respond("// probar-mobile:custom", serde_json::json!({ "other": 1 }));

        let err = evaluate_as::<Flag, _>(&mut driver, "// probar-mobile:custom\n1", "flag")
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::Decode { what: "flag", .. }));
        assert!(err.is_page_local());
    }

    #[tokio::test]
    async fn test_evaluate_as_decodes() {
        let mut driver = MockDriver::new();
        driver.respond("// probar-mobile:custom", serde_json::json!({ "present": true }));

        let flag: Flag = evaluate_as(&mut driver, "// probar-mobile:custom\n1", "flag")
            .await
            .unwrap();
        assert!(flag.present);
    }
}
