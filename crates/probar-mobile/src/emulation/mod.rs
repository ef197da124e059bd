//! Device emulation profiles.

mod device;

pub use device::{DeviceCatalog, DeviceDescriptor, Orientation, TouchMode, Viewport};
