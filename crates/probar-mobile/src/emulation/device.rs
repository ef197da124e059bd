//! Device profiles used to emulate phones and tablets.
//!
//! The catalog carries the four reference devices the audit runs against by
//! default, plus the desktop profile restored by cleanup.

use crate::result::{AuditError, AuditResult};
use serde::{Deserialize, Serialize};

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
}

impl Viewport {
    /// Create a new viewport
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check if viewport is in landscape orientation
    #[must_use]
    pub const fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    /// Screen orientation implied by the dimensions
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        if self.is_landscape() {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Primary screen orientation reported to the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Taller than wide, angle 0
    Portrait,
    /// Wider than tall, angle 90
    Landscape,
}

impl Orientation {
    /// Rotation angle in degrees
    #[must_use]
    pub const fn angle(self) -> i64 {
        match self {
            Self::Portrait => 0,
            Self::Landscape => 90,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Touch mode configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TouchMode {
    /// No touch support
    #[default]
    None,
    /// Single touch
    Single,
    /// Multi-touch
    Multi,
}

impl TouchMode {
    /// Check if touch is enabled
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Number of touch points reported to the page
    #[must_use]
    pub const fn max_touch_points(&self) -> i64 {
        match self {
            Self::None => 0,
            Self::Single => 1,
            Self::Multi => 5,
        }
    }
}

/// Device descriptor with all emulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Device name (e.g., "iPhone 7")
    pub name: String,
    /// Viewport dimensions
    pub viewport: Viewport,
    /// User agent string
    pub user_agent: String,
    /// Device pixel ratio
    pub device_scale_factor: f64,
    /// Whether the device is mobile
    pub is_mobile: bool,
    /// Touch support
    pub touch: TouchMode,
}

impl DeviceDescriptor {
    /// Create a new device descriptor
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            viewport: Viewport::default(),
            user_agent: String::new(),
            device_scale_factor: 1.0,
            is_mobile: false,
            touch: TouchMode::None,
        }
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport_size(mut self, width: u32, height: u32) -> Self {
        self.viewport = Viewport::new(width, height);
        self
    }

    /// Set user agent
    #[must_use]
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    /// Set device scale factor
    #[must_use]
    pub const fn with_device_scale_factor(mut self, factor: f64) -> Self {
        self.device_scale_factor = factor;
        self
    }

    /// Set mobile mode
    #[must_use]
    pub const fn with_mobile(mut self, is_mobile: bool) -> Self {
        self.is_mobile = is_mobile;
        self
    }

    /// Set touch mode
    #[must_use]
    pub const fn with_touch(mut self, touch: TouchMode) -> Self {
        self.touch = touch;
        self
    }
}

const IOS_11_PHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 11_0 like Mac OS X) \
    AppleWebKit/604.1.38 (KHTML, like Gecko) Version/11.0 Mobile/15A372 Safari/604.1";
const IOS_12_PHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 12_0 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/12.0 Mobile/15E148 Safari/604.1";
const IOS_11_TABLET_UA: &str = "Mozilla/5.0 (iPad; CPU OS 11_0 like Mac OS X) \
    AppleWebKit/604.1.34 (KHTML, like Gecko) Version/11.0 Mobile/15A5341f Safari/604.1";

/// Ordered catalog of device profiles, keyed by display name
#[derive(Debug, Clone)]
pub struct DeviceCatalog {
    devices: Vec<DeviceDescriptor>,
}

impl Default for DeviceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceCatalog {
    /// Names of the devices audited when nothing else is configured
    pub const REFERENCE_DEVICES: [&'static str; 4] = ["iPhone 7", "iPhone XR", "iPad", "iPad Pro"];

    /// Create a catalog holding the reference phones and tablets
    #[must_use]
    pub fn new() -> Self {
        Self {
            devices: vec![
                Self::iphone_7(),
                Self::iphone_xr(),
                Self::ipad(),
                Self::ipad_pro(),
            ],
        }
    }

    /// Register a device, replacing any existing profile with the same name
    pub fn register(&mut self, device: DeviceDescriptor) {
        if let Some(existing) = self.devices.iter_mut().find(|d| d.name == device.name) {
            *existing = device;
        } else {
            self.devices.push(device);
        }
    }

    /// Look up a device by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DeviceDescriptor> {
        self.devices.iter().find(|d| d.name == name)
    }

    /// Look up a device by name, failing for unknown names
    pub fn resolve(&self, name: &str) -> AuditResult<&DeviceDescriptor> {
        self.get(name).ok_or_else(|| AuditError::UnknownDevice {
            name: name.to_string(),
        })
    }

    /// Whether a device with this name is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All registered devices in registration order
    #[must_use]
    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    // ========================================================================
    // Phones
    // ========================================================================

    /// iPhone 7 device preset
    #[must_use]
    pub fn iphone_7() -> DeviceDescriptor {
        DeviceDescriptor::new("iPhone 7")
            .with_viewport_size(375, 667)
            .with_user_agent(IOS_11_PHONE_UA)
            .with_device_scale_factor(2.0)
            .with_mobile(true)
            .with_touch(TouchMode::Multi)
    }

    /// iPhone XR device preset
    #[must_use]
    pub fn iphone_xr() -> DeviceDescriptor {
        DeviceDescriptor::new("iPhone XR")
            .with_viewport_size(414, 896)
            .with_user_agent(IOS_12_PHONE_UA)
            .with_device_scale_factor(2.0)
            .with_mobile(true)
            .with_touch(TouchMode::Multi)
    }

    // ========================================================================
    // Tablets
    // ========================================================================

    /// iPad device preset
    #[must_use]
    pub fn ipad() -> DeviceDescriptor {
        DeviceDescriptor::new("iPad")
            .with_viewport_size(768, 1024)
            .with_user_agent(IOS_11_TABLET_UA)
            .with_device_scale_factor(2.0)
            .with_mobile(true)
            .with_touch(TouchMode::Multi)
    }

    /// iPad Pro device preset
    #[must_use]
    pub fn ipad_pro() -> DeviceDescriptor {
        DeviceDescriptor::new("iPad Pro")
            .with_viewport_size(1024, 1366)
            .with_user_agent(IOS_11_TABLET_UA)
            .with_device_scale_factor(2.0)
            .with_mobile(true)
            .with_touch(TouchMode::Multi)
    }

    // ========================================================================
    // Desktop
    // ========================================================================

    /// Standard desktop profile restored after an audit.
    ///
    /// The user agent is left empty; cleanup fills in the browser default.
    #[must_use]
    pub fn desktop() -> DeviceDescriptor {
        DeviceDescriptor::new("Desktop")
            .with_viewport_size(1920, 1080)
            .with_device_scale_factor(1.0)
            .with_mobile(false)
            .with_touch(TouchMode::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod viewport_tests {
        use super::*;

        #[test]
        fn test_default_is_full_hd_landscape() {
            let viewport = Viewport::default();
            assert_eq!(viewport, Viewport::new(1920, 1080));
            assert!(viewport.is_landscape());
        }

        #[test]
        fn test_phone_is_portrait() {
            assert!(!Viewport::new(375, 667).is_landscape());
        }

        #[test]
        fn test_orientation_follows_dimensions() {
            let phone = Viewport::new(375, 667).orientation();
            assert_eq!(phone, Orientation::Portrait);
            assert_eq!(phone.angle(), 0);

            let desktop = Viewport::new(1920, 1080).orientation();
            assert_eq!(desktop, Orientation::Landscape);
            assert_eq!(desktop.angle(), 90);
        }

        #[test]
        fn test_square_viewport_is_portrait() {
            assert_eq!(Viewport::new(800, 800).orientation(), Orientation::Portrait);
        }
    }

    mod touch_mode_tests {
        use super::*;

        #[test]
        fn test_is_enabled() {
            assert!(!TouchMode::None.is_enabled());
            assert!(TouchMode::Single.is_enabled());
            assert!(TouchMode::Multi.is_enabled());
        }

        #[test]
        fn test_max_touch_points() {
            assert_eq!(TouchMode::None.max_touch_points(), 0);
            assert_eq!(TouchMode::Multi.max_touch_points(), 5);
        }
    }

    mod catalog_tests {
        use super::*;

        #[test]
        fn test_reference_devices_registered_in_order() {
            let catalog = DeviceCatalog::new();
            let names: Vec<&str> = catalog.devices().iter().map(|d| d.name.as_str()).collect();
            assert_eq!(names, DeviceCatalog::REFERENCE_DEVICES);
        }

        #[test]
        fn test_two_phones_two_tablets() {
            let catalog = DeviceCatalog::new();
            let phones = catalog
                .devices()
                .iter()
                .filter(|d| d.user_agent.contains("iPhone"))
                .count();
            let tablets = catalog
                .devices()
                .iter()
                .filter(|d| d.user_agent.contains("iPad"))
                .count();
            assert_eq!(phones, 2);
            assert_eq!(tablets, 2);
            assert!(catalog.devices().iter().all(|d| d.is_mobile));
        }

        #[test]
        fn test_resolve_unknown_device() {
            let catalog = DeviceCatalog::new();
            let err = catalog.resolve("Nokia 3310").unwrap_err();
            assert!(matches!(err, AuditError::UnknownDevice { .. }));
        }

        #[test]
        fn test_register_replaces_existing() {
            let mut catalog = DeviceCatalog::new();
            catalog.register(DeviceDescriptor::new("iPad").with_viewport_size(810, 1080));
            assert_eq!(catalog.devices().len(), 4);
            assert_eq!(catalog.get("iPad").unwrap().viewport.width, 810);

            catalog.register(DeviceDescriptor::new("Pixel 7").with_viewport_size(412, 915));
            assert_eq!(catalog.devices().len(), 5);
            assert!(catalog.contains("Pixel 7"));
        }

        #[test]
        fn test_iphone_7_profile() {
            let device = DeviceCatalog::iphone_7();
            assert_eq!(device.viewport, Viewport::new(375, 667));
            assert!((device.device_scale_factor - 2.0).abs() < f64::EPSILON);
            assert_eq!(device.touch, TouchMode::Multi);
        }

        #[test]
        fn test_desktop_profile() {
            let device = DeviceCatalog::desktop();
            assert_eq!(device.viewport, Viewport::new(1920, 1080));
            assert!((device.device_scale_factor - 1.0).abs() < f64::EPSILON);
            assert!(!device.is_mobile);
            assert!(!device.touch.is_enabled());
            assert!(device.user_agent.is_empty());
            assert_eq!(device.viewport.orientation(), Orientation::Landscape);
        }
    }
}
