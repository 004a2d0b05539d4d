// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The environment a test is running in.

use crate::{
    errors::{EnvironmentError, TagParseError},
    tag::{GpuDevice, GpuVendor, OsVersion, Platform, Tag, parse_device_id},
};
use expectations_metadata::EnvironmentSummary;
use std::fmt;

/// Describes the machine a test is running on.
///
/// An environment always has exactly one platform and one GPU vendor, at most one OS version
/// (which must belong to the platform), and at most one GPU device id (which is paired with the
/// GPU vendor). Environments are produced by whatever introspects the host; the engine treats
/// them as read-only input.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct EnvironmentDescriptor {
    platform: Platform,
    os_version: Option<OsVersion>,
    gpu_vendor: GpuVendor,
    gpu_device_id: Option<u32>,
}

impl EnvironmentDescriptor {
    /// Creates a new environment with a platform and a GPU vendor.
    pub fn new(platform: Platform, gpu_vendor: GpuVendor) -> Self {
        Self {
            platform,
            os_version: None,
            gpu_vendor,
            gpu_device_id: None,
        }
    }

    /// Sets the OS version.
    ///
    /// Returns an error if the OS version does not belong to this environment's platform.
    pub fn with_os_version(mut self, os_version: OsVersion) -> Result<Self, EnvironmentError> {
        if os_version.platform() != self.platform {
            return Err(EnvironmentError::OsVersionMismatch {
                os_version,
                platform: self.platform,
            });
        }
        self.os_version = Some(os_version);
        Ok(self)
    }

    /// Sets the GPU device id. The device is paired with this environment's GPU vendor.
    pub fn with_gpu_device_id(mut self, device_id: u32) -> Self {
        self.gpu_device_id = Some(device_id);
        self
    }

    /// Builds an environment from its textual components, as provided on a command line.
    pub fn parse(
        platform: &str,
        os_version: Option<&str>,
        gpu_vendor: &str,
        gpu_device_id: Option<&str>,
    ) -> Result<Self, EnvironmentError> {
        let mut env = Self::new(platform.parse()?, gpu_vendor.parse()?);
        if let Some(os_version) = os_version {
            env = env.with_os_version(os_version.parse()?)?;
        }
        if let Some(device_id) = gpu_device_id {
            // Accept both a bare id and the `vendor:id` tag form.
            let device = match device_id.split_once(':') {
                Some(_) => {
                    let device: GpuDevice = device_id.parse()?;
                    if device.vendor() != env.gpu_vendor {
                        return Err(EnvironmentError::DeviceVendorMismatch {
                            device,
                            gpu_vendor: env.gpu_vendor,
                        });
                    }
                    device.device_id()
                }
                None => parse_device_id(device_id).map_err(|err| {
                    TagParseError::InvalidDeviceId {
                        input: device_id.to_owned(),
                        err,
                    }
                })?,
            };
            env = env.with_gpu_device_id(device);
        }
        Ok(env)
    }

    /// Returns the platform.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Returns the OS version, if known.
    pub fn os_version(&self) -> Option<OsVersion> {
        self.os_version
    }

    /// Returns the GPU vendor.
    pub fn gpu_vendor(&self) -> GpuVendor {
        self.gpu_vendor
    }

    /// Returns the GPU device id, if known.
    pub fn gpu_device_id(&self) -> Option<u32> {
        self.gpu_device_id
    }

    /// Returns the GPU device, if the device id is known.
    pub fn gpu_device(&self) -> Option<GpuDevice> {
        self.gpu_device_id
            .map(|device_id| GpuDevice::new(self.gpu_vendor, device_id))
    }

    /// Returns true if this environment satisfies a single tag.
    pub fn satisfies(&self, tag: &Tag) -> bool {
        match tag {
            Tag::Platform(platform) => self.platform == *platform,
            // An OS version is only ever set if it belongs to the platform, so this also checks
            // the implied platform.
            Tag::OsVersion(os_version) => self.os_version == Some(*os_version),
            Tag::GpuVendor(vendor) => self.gpu_vendor == *vendor,
            Tag::GpuDevice(device) => self.gpu_device() == Some(*device),
        }
    }

    /// Returns a serializable summary of this environment.
    pub fn to_summary(&self) -> EnvironmentSummary {
        EnvironmentSummary {
            platform: self.platform.to_string().into(),
            os_version: self.os_version.map(|v| v.to_string().into()),
            gpu_vendor: self.gpu_vendor.to_string().into(),
            gpu_device_id: self.gpu_device_id,
        }
    }
}

impl fmt::Display for EnvironmentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.platform)?;
        if let Some(os_version) = self.os_version {
            write!(f, "/{os_version}")?;
        }
        match self.gpu_device() {
            Some(device) => write!(f, ", {device}"),
            None => write!(f, ", {}", self.gpu_vendor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_version_must_match_platform() {
        let err = EnvironmentDescriptor::new(Platform::Mac, GpuVendor::Intel)
            .with_os_version(OsVersion::Win7)
            .unwrap_err();
        assert_eq!(
            err,
            EnvironmentError::OsVersionMismatch {
                os_version: OsVersion::Win7,
                platform: Platform::Mac,
            }
        );

        let env = EnvironmentDescriptor::new(Platform::Mac, GpuVendor::Intel)
            .with_os_version(OsVersion::Lion)
            .expect("lion is a mac release");
        assert_eq!(env.os_version(), Some(OsVersion::Lion));
    }

    #[test]
    fn satisfies_each_category() {
        let env = EnvironmentDescriptor::new(Platform::Win, GpuVendor::Nvidia)
            .with_os_version(OsVersion::Win7)
            .unwrap()
            .with_gpu_device_id(0x1234);

        assert!(env.satisfies(&Tag::Platform(Platform::Win)));
        assert!(!env.satisfies(&Tag::Platform(Platform::Mac)));
        assert!(env.satisfies(&Tag::OsVersion(OsVersion::Win7)));
        assert!(!env.satisfies(&Tag::OsVersion(OsVersion::Xp)));
        assert!(env.satisfies(&Tag::GpuVendor(GpuVendor::Nvidia)));
        assert!(!env.satisfies(&Tag::GpuVendor(GpuVendor::Amd)));
        assert!(env.satisfies(&Tag::GpuDevice(GpuDevice::new(GpuVendor::Nvidia, 0x1234))));
        assert!(!env.satisfies(&Tag::GpuDevice(GpuDevice::new(GpuVendor::Nvidia, 0x1235))));
        assert!(!env.satisfies(&Tag::GpuDevice(GpuDevice::new(GpuVendor::Amd, 0x1234))));
    }

    #[test]
    fn unknown_os_version_never_satisfied() {
        let env = EnvironmentDescriptor::new(Platform::Win, GpuVendor::Intel);
        assert!(!env.satisfies(&Tag::OsVersion(OsVersion::Win7)));
        assert!(!env.satisfies(&Tag::GpuDevice(GpuDevice::new(GpuVendor::Intel, 1))));
    }

    #[test]
    fn parse_from_components() {
        let env = EnvironmentDescriptor::parse("win", Some("win7"), "intel", Some("0x0102"))
            .expect("valid environment");
        assert_eq!(env.to_string(), "win/win7, intel:0x0102");

        let env = EnvironmentDescriptor::parse("mac", None, "amd", Some("amd:258")).unwrap();
        assert_eq!(env.gpu_device(), Some(GpuDevice::new(GpuVendor::Amd, 258)));

        assert!(matches!(
            EnvironmentDescriptor::parse("win", None, "amd", Some("nvidia:0x1")),
            Err(EnvironmentError::DeviceVendorMismatch { .. })
        ));
        assert!(matches!(
            EnvironmentDescriptor::parse("beos", None, "amd", None),
            Err(EnvironmentError::Parse(TagParseError::UnknownValue { .. }))
        ));
        assert!(matches!(
            EnvironmentDescriptor::parse("linux", Some("lion"), "amd", None),
            Err(EnvironmentError::OsVersionMismatch { .. })
        ));
    }
}
