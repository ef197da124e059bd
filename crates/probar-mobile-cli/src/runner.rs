//! Audit runner: browser lifecycle around a [`MobileAudit`]
//!
//! [`MobileAudit`]: probar_mobile::MobileAudit

use crate::commands::AuditArgs;
use crate::config::resolve_audit_config;
use crate::error::{CliError, CliResult};
use crate::output::{AuditReport, ProgressReporter};
use probar_mobile::{AuditConfig, BrowserConfig, DeviceCatalog};

/// Browser settings derived from the audit arguments
#[must_use]
pub fn browser_config(args: &AuditArgs) -> BrowserConfig {
    let mut config = BrowserConfig::default().with_headless(!args.headed);
    if args.no_sandbox {
        config = config.with_no_sandbox();
    }
    if let Some(ref path) = args.chromium_path {
        config = config.with_chromium_path(path.clone());
    }
    config
}

/// Reject arguments that cannot produce a meaningful audit
pub fn check_arguments(args: &AuditArgs) -> CliResult<()> {
    if let Some(min) = args.min_score {
        if !(0.0..=1.0).contains(&min) {
            return Err(CliError::invalid_argument(format!(
                "--min-score must be within [0, 1], got {min}"
            )));
        }
    }
    if !(args.url.starts_with("http://")
        || args.url.starts_with("https://")
        || args.url.starts_with("file://"))
    {
        return Err(CliError::invalid_argument(format!(
            "expected an http(s) or file URL, got {}",
            args.url
        )));
    }
    Ok(())
}

/// Validate everything, then launch chromium and audit the page
pub fn run_audit(args: &AuditArgs, reporter: &mut ProgressReporter) -> CliResult<AuditReport> {
    check_arguments(args)?;
    let catalog = DeviceCatalog::new();
    let config = resolve_audit_config(&args.options, &catalog)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(audit_in_browser(args, &catalog, config, reporter))
}

#[cfg(feature = "browser")]
async fn audit_in_browser(
    args: &AuditArgs,
    catalog: &DeviceCatalog,
    config: AuditConfig,
    reporter: &mut ProgressReporter,
) -> CliResult<AuditReport> {
    use probar_mobile::{Browser, MobileAudit};

    reporter.start("Launching browser");
    let browser = Browser::launch(browser_config(args)).await?;

    let audited = async {
        let mut page = browser.new_page().await?;
        reporter.set_message(&format!("Loading {}", args.url));
        page.goto(&args.url).await?;
        tracing::info!(
            url = page.current_url(),
            headless = browser.config().headless,
            "page loaded"
        );

        reporter.set_message(&format!("Auditing on {}", config.devices.join(", ")));
        let mut audit = MobileAudit::new(&mut page, catalog, config)?;
        let run = audit.run().await.map(<[_]>::to_vec);
        // Cleanup runs whatever the outcome of the audit
        let cleaned = audit.cleanup().await;
        let records = run?;
        Ok::<_, CliError>((records, cleaned.err()))
    }
    .await;

    reporter.finish();
    let audited = audited.map(|(records, cleanup_error)| {
        if let Some(e) = cleanup_error {
            tracing::warn!(error = %e, "cleanup failed");
            reporter.warning(&format!("Could not restore the desktop profile: {e}"));
        }
        records
    });
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "browser did not close cleanly");
    }

    Ok(AuditReport::new(args.url.clone(), audited?))
}

#[cfg(not(feature = "browser"))]
async fn audit_in_browser(
    _args: &AuditArgs,
    _catalog: &DeviceCatalog,
    _config: AuditConfig,
    _reporter: &mut ProgressReporter,
) -> CliResult<AuditReport> {
    Err(CliError::FeatureDisabled { feature: "browser" })
}
