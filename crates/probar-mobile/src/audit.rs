//! MobileAudit - device × check orchestration
//!
//! ```text
//! for device in config.devices:          (sequential, one page)
//!     emulate(device)
//!     for check in [overflow, viewport, fontSize, aspectRatios]:
//!         outcome = run_check(check)      ─► FailureMap[check][device]
//! aggregate(FailureMap)                   ─► [ReportRecord; 4]
//! ```
//!
//! Evaluation failures stay local to their device/check pair and are
//! handled according to [`EvaluationFailurePolicy`].

use crate::checks::{run_check, CheckId, CheckOutcome};
use crate::config::{AuditConfig, EvaluationFailurePolicy};
use crate::driver::PageDriver;
use crate::emulation::{DeviceCatalog, DeviceDescriptor};
use crate::report::{aggregate, FailureMap, ReportRecord};
use crate::result::AuditResult;
use tracing::Instrument;

/// Mobile-friendliness audit of the page behind a driver
#[derive(Debug)]
pub struct MobileAudit<'a, D: PageDriver + ?Sized> {
    driver: &'a mut D,
    catalog: &'a DeviceCatalog,
    config: AuditConfig,
    failures: FailureMap,
    results: Option<Vec<ReportRecord>>,
}

impl<'a, D> MobileAudit<'a, D>
where
    D: PageDriver + ?Sized,
{
    /// Create an audit; fails if the configuration does not validate
    pub fn new(driver: &'a mut D, catalog: &'a DeviceCatalog, config: AuditConfig) -> AuditResult<Self> {
        config.validate(catalog)?;
        Ok(Self {
            driver,
            catalog,
            config,
            failures: FailureMap::new(),
            results: None,
        })
    }

    /// The configuration in use
    #[must_use]
    pub const fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Run every check on every configured device
    pub async fn run(&mut self) -> AuditResult<&[ReportRecord]> {
        let catalog = self.catalog;
        let devices = self.config.devices.clone();
        tracing::info!(devices = devices.len(), "starting mobile audit");

        self.failures.clear();
        self.results = None;

        for name in &devices {
            let device = catalog.resolve(name)?;
            let span = tracing::info_span!("device", device = %device.name);
            self.audit_device(device).instrument(span).await?;
        }

        let records = aggregate(&self.failures);
        tracing::info!(
            failing_checks = records.iter().filter(|r| !r.passed()).count(),
            "mobile audit complete"
        );
        Ok(self.results.insert(records).as_slice())
    }

    async fn audit_device(&mut self, device: &DeviceDescriptor) -> AuditResult<()> {
        if let Err(e) = self.driver.emulate(device).await {
            tracing::warn!(error = %e, "emulation failed; every check counts as not evaluated");
            for id in CheckId::ALL {
                self.contain(id, &device.name);
            }
            return Ok(());
        }

        for id in CheckId::ALL {
            match run_check(id, &mut *self.driver, &self.config).await {
                Ok(outcome) => {
                    tracing::debug!(
                        check = %id,
                        success = outcome.success,
                        evidence = outcome.evidence.len(),
                        "check finished"
                    );
                    self.failures.record(id, device.name.as_str(), outcome);
                }
                Err(e) if e.is_page_local() => {
                    tracing::warn!(check = %id, error = %e, "check could not be evaluated");
                    self.contain(id, &device.name);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn contain(&mut self, id: CheckId, device: &str) {
        match self.config.failure_policy {
            EvaluationFailurePolicy::Record => {
                self.failures.record(id, device, CheckOutcome::fail(Vec::new()));
            }
            EvaluationFailurePolicy::Skip => {}
        }
    }

    /// Report records of the last run; `None` before [`MobileAudit::run`]
    #[must_use]
    pub fn results(&self) -> Option<&[ReportRecord]> {
        self.results.as_deref()
    }

    /// Raw failing outcomes of the last run
    #[must_use]
    pub const fn failures(&self) -> &FailureMap {
        &self.failures
    }

    /// Restore desktop emulation with the driver's own user agent
    pub async fn cleanup(&mut self) -> AuditResult<()> {
        let user_agent = self.driver.default_user_agent().await?;
        let desktop = DeviceCatalog::desktop().with_user_agent(user_agent);
        self.driver.emulate(&desktop).await?;
        tracing::info!("restored desktop emulation");
        Ok(())
    }
}
