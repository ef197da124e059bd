//! Headless Chromium control.
//!
//! With the `browser` feature, [`Browser`] launches Chromium through
//! chromiumoxide and hands out [`Page`]s that implement [`PageDriver`] over
//! the Chrome `DevTools` Protocol.
//!
//! [`PageDriver`]: crate::driver::PageDriver

/// Browser launch configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run without a visible window
    pub headless: bool,
    /// Initial window width
    pub window_width: u32,
    /// Initial window height
    pub window_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

// ============================================================================
// CDP implementation
// ============================================================================

#[cfg(feature = "browser")]
#[allow(clippy::significant_drop_tightening, clippy::missing_errors_doc)]
mod cdp {
    use super::BrowserConfig;
    use crate::driver::PageDriver;
    use crate::emulation::{DeviceDescriptor, Orientation};
    use crate::result::{AuditError, AuditResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::emulation::{
        ScreenOrientation, ScreenOrientationType, SetDeviceMetricsOverrideParams,
        SetTouchEmulationEnabledParams, SetUserAgentOverrideParams,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Browser instance with real CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: Arc<Mutex<CdpBrowser>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance
        pub async fn launch(config: BrowserConfig) -> AuditResult<Self> {
            let mut builder =
                CdpConfig::builder().window_size(config.window_width, config.window_height);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| AuditError::BrowserLaunchError { message })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                AuditError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        tracing::debug!(error = %e, "CDP handler stopped");
                        break;
                    }
                }
            });

            tracing::info!(headless = config.headless, "browser launched");
            Ok(Self {
                config,
                inner: Arc::new(Mutex::new(browser)),
                handle,
            })
        }

        /// Open a blank page and remember the browser's own user agent
        pub async fn new_page(&self) -> AuditResult<Page> {
            let browser = self.inner.lock().await;
            let default_user_agent = browser
                .version()
                .await
                .map_err(|e| AuditError::PageError {
                    message: e.to_string(),
                })?
                .user_agent;
            let inner = browser
                .new_page("about:blank")
                .await
                .map_err(|e| AuditError::PageError {
                    message: e.to_string(),
                })?;

            Ok(Page {
                inner,
                url: String::from("about:blank"),
                default_user_agent,
            })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser
        pub async fn close(self) -> AuditResult<()> {
            {
                let mut browser = self.inner.lock().await;
                browser
                    .close()
                    .await
                    .map_err(|e| AuditError::BrowserLaunchError {
                        message: e.to_string(),
                    })?;
            }
            self.handle.abort();
            Ok(())
        }
    }

    /// A browser page with real CDP connection
    #[derive(Debug)]
    pub struct Page {
        inner: CdpPage,
        url: String,
        default_user_agent: String,
    }

    impl Page {
        /// Navigate to a URL and wait for the load to finish
        pub async fn goto(&mut self, url: &str) -> AuditResult<()> {
            self.inner
                .goto(url)
                .await
                .map_err(|e| AuditError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            self.url = url.to_string();
            Ok(())
        }

        /// URL of the last successful navigation
        #[must_use]
        pub fn current_url(&self) -> &str {
            &self.url
        }
    }

    #[async_trait]
    impl PageDriver for Page {
        async fn emulate(&mut self, device: &DeviceDescriptor) -> AuditResult<()> {
            let emulation_error = |e: chromiumoxide::error::CdpError| AuditError::EmulationError {
                device: device.name.clone(),
                message: e.to_string(),
            };

            let mut metrics = SetDeviceMetricsOverrideParams::new(
                i64::from(device.viewport.width),
                i64::from(device.viewport.height),
                device.device_scale_factor,
                device.is_mobile,
            );
            let orientation = device.viewport.orientation();
            let kind = match orientation {
                Orientation::Portrait => ScreenOrientationType::PortraitPrimary,
                Orientation::Landscape => ScreenOrientationType::LandscapePrimary,
            };
            metrics.screen_orientation = Some(ScreenOrientation::new(kind, orientation.angle()));
            self.inner.execute(metrics).await.map_err(emulation_error)?;

            let mut touch = SetTouchEmulationEnabledParams::new(device.touch.is_enabled());
            if device.touch.is_enabled() {
                touch.max_touch_points = Some(device.touch.max_touch_points());
            }
            self.inner.execute(touch).await.map_err(emulation_error)?;

            let user_agent = if device.user_agent.is_empty() {
                self.default_user_agent.clone()
            } else {
                device.user_agent.clone()
            };
            self.inner
                .execute(SetUserAgentOverrideParams::new(user_agent))
                .await
                .map_err(emulation_error)?;

            Ok(())
        }

        async fn evaluate(&mut self, script: &str) -> AuditResult<serde_json::Value> {
            let result = self
                .inner
                .evaluate(script)
                .await
                .map_err(|e| AuditError::evaluation(e.to_string()))?;
            result
                .into_value()
                .map_err(|e| AuditError::evaluation(e.to_string()))
        }

        async fn default_user_agent(&mut self) -> AuditResult<String> {
            Ok(self.default_user_agent.clone())
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{Browser, Page};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert!(config.sandbox);
        assert_eq!((config.window_width, config.window_height), (1920, 1080));
        assert!(config.chromium_path.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = BrowserConfig::default()
            .with_headless(false)
            .with_no_sandbox()
            .with_chromium_path("/usr/bin/chromium");
        assert!(!config.headless);
        assert!(!config.sandbox);
        assert_eq!(config.window_width, 1920);
        assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
    }
}
