//! probar-mobile: mobile-friendliness audits for rendered web pages
//!
//! Emulates a set of phone and tablet profiles on one page and runs four
//! heuristics on each: horizontal overflow, viewport meta tag, font size
//! readability and image aspect ratios. The per-device findings are reduced
//! into a weighted score report with remediation advice.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  PROBAR-MOBILE Architecture                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ MobileAudit│    │ Checks     │    │ PageDriver │            │
//! │   │ (devices)  │───►│ (4 × dev)  │───►│ (chromium/ │            │
//! │   │            │    │            │    │  mock)     │            │
//! │   └─────┬──────┘    └────────────┘    └────────────┘            │
//! │         │ FailureMap                                            │
//! │   ┌─────▼──────┐                                                │
//! │   │ aggregate  │──► [ReportRecord; 4]                           │
//! │   └────────────┘                                                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use probar_mobile::prelude::*;
//!
//! # tokio_test_block_on(async {
//! let catalog = DeviceCatalog::new();
//! let mut driver = MockDriver::new();
//! let mut audit = MobileAudit::new(&mut driver, &catalog, AuditConfig::default())?;
//! let records = audit.run().await?;
//! assert_eq!(overall_score(records), 1.0);
//! audit.cleanup().await?;
//! # Ok::<(), AuditError>(())
//! # }).unwrap();
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![warn(missing_docs)]

mod audit;
mod browser;
mod config;
mod driver;
mod report;
mod result;

/// The four heuristics and their dispatch table
pub mod checks;

/// Flat DOM snapshots and the script marker protocol
pub mod dom;

/// Device profiles and the reference catalog
pub mod emulation;

/// Scripted in-memory pages for tests
pub mod mock;

pub use audit::MobileAudit;
#[cfg(feature = "browser")]
pub use browser::{Browser, Page};
pub use browser::BrowserConfig;
pub use checks::{run_check, CheckId, CheckOutcome, Evidence};
pub use config::{AspectRatioConfig, AuditConfig, EvaluationFailurePolicy, FontSizeConfig};
pub use driver::{evaluate_as, PageDriver};
pub use emulation::{DeviceCatalog, DeviceDescriptor, Orientation, TouchMode, Viewport};
pub use report::{
    aggregate, overall_score, score_for, DeviceFailure, FailureMap, Recommendation, ReportRecord,
    TestDefinition, TEST_DEFINITIONS,
};
pub use result::{AuditError, AuditResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::audit::*;
    pub use super::browser::*;
    pub use super::checks::{CheckId, CheckOutcome, Evidence};
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::emulation::*;
    pub use super::mock::{MockDriver, MockLayout, MockPage};
    pub use super::report::*;
    pub use super::result::*;
}
