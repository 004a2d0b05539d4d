// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The vocabulary of condition tags.
//!
//! A tag is an atomic condition value belonging to one of four categories: a platform, an OS
//! version (which implies its platform), a GPU vendor, or a specific GPU device (a vendor paired
//! with a numeric device id).
//!
//! Every tag has a textual form, used in catalog files and on the command line:
//!
//! * platforms: `win`, `mac`, `linux`, `chromeos`, `android`
//! * OS versions: `xp`, `vista`, `win7`, `leopard`, `snowleopard`, `lion`, `mountainlion`
//! * GPU vendors: `nvidia`, `amd`, `intel`
//! * GPU devices: `<vendor>:<device-id>`, e.g. `nvidia:0x1234`

use crate::errors::TagParseError;
use std::{fmt, str::FromStr};

/// The category a [`Tag`] belongs to.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TagCategory {
    /// An operating system family.
    Platform,

    /// A specific operating system release.
    OsVersion,

    /// A GPU vendor.
    GpuVendor,

    /// A specific GPU device.
    GpuDevice,
}

impl TagCategory {
    /// Returns the known textual values for this category.
    ///
    /// GPU devices are open-ended, so a placeholder form is returned for them.
    pub fn known_values(self) -> &'static [&'static str] {
        match self {
            TagCategory::Platform => Platform::variants(),
            TagCategory::OsVersion => OsVersion::variants(),
            TagCategory::GpuVendor => GpuVendor::variants(),
            TagCategory::GpuDevice => &["<vendor>:<device-id>"],
        }
    }

    pub(crate) fn all_known_values() -> Vec<&'static str> {
        [
            TagCategory::Platform,
            TagCategory::OsVersion,
            TagCategory::GpuVendor,
            TagCategory::GpuDevice,
        ]
        .into_iter()
        .flat_map(|category| category.known_values().iter().copied())
        .collect()
    }
}

impl fmt::Display for TagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagCategory::Platform => write!(f, "platform"),
            TagCategory::OsVersion => write!(f, "OS version"),
            TagCategory::GpuVendor => write!(f, "GPU vendor"),
            TagCategory::GpuDevice => write!(f, "GPU device"),
        }
    }
}

/// An operating system family.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Platform {
    /// Windows.
    Win,
    /// macOS.
    Mac,
    /// Linux, excluding Chrome OS and Android.
    Linux,
    /// Chrome OS.
    ChromeOs,
    /// Android.
    Android,
}

impl Platform {
    /// String representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &["win", "mac", "linux", "chromeos", "android"]
    }
}

impl FromStr for Platform {
    type Err = TagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s {
            "win" => Platform::Win,
            "mac" => Platform::Mac,
            "linux" => Platform::Linux,
            "chromeos" => Platform::ChromeOs,
            "android" => Platform::Android,
            other => return Err(TagParseError::unknown_value(TagCategory::Platform, other)),
        };
        Ok(val)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Win => write!(f, "win"),
            Platform::Mac => write!(f, "mac"),
            Platform::Linux => write!(f, "linux"),
            Platform::ChromeOs => write!(f, "chromeos"),
            Platform::Android => write!(f, "android"),
        }
    }
}

/// A specific operating system release. Each release belongs to exactly one [`Platform`].
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum OsVersion {
    /// Windows XP.
    Xp,
    /// Windows Vista.
    Vista,
    /// Windows 7.
    Win7,
    /// Mac OS X 10.5.
    Leopard,
    /// Mac OS X 10.6.
    SnowLeopard,
    /// Mac OS X 10.7.
    Lion,
    /// Mac OS X 10.8.
    MountainLion,
}

impl OsVersion {
    /// String representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &[
            "xp",
            "vista",
            "win7",
            "leopard",
            "snowleopard",
            "lion",
            "mountainlion",
        ]
    }

    /// Returns the platform this release belongs to.
    pub fn platform(self) -> Platform {
        match self {
            OsVersion::Xp | OsVersion::Vista | OsVersion::Win7 => Platform::Win,
            OsVersion::Leopard
            | OsVersion::SnowLeopard
            | OsVersion::Lion
            | OsVersion::MountainLion => Platform::Mac,
        }
    }
}

impl FromStr for OsVersion {
    type Err = TagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s {
            "xp" => OsVersion::Xp,
            "vista" => OsVersion::Vista,
            "win7" => OsVersion::Win7,
            "leopard" => OsVersion::Leopard,
            "snowleopard" => OsVersion::SnowLeopard,
            "lion" => OsVersion::Lion,
            "mountainlion" => OsVersion::MountainLion,
            other => return Err(TagParseError::unknown_value(TagCategory::OsVersion, other)),
        };
        Ok(val)
    }
}

impl fmt::Display for OsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsVersion::Xp => write!(f, "xp"),
            OsVersion::Vista => write!(f, "vista"),
            OsVersion::Win7 => write!(f, "win7"),
            OsVersion::Leopard => write!(f, "leopard"),
            OsVersion::SnowLeopard => write!(f, "snowleopard"),
            OsVersion::Lion => write!(f, "lion"),
            OsVersion::MountainLion => write!(f, "mountainlion"),
        }
    }
}

/// A GPU vendor.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum GpuVendor {
    /// NVIDIA.
    Nvidia,
    /// AMD.
    Amd,
    /// Intel.
    Intel,
}

impl GpuVendor {
    /// String representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &["nvidia", "amd", "intel"]
    }
}

impl FromStr for GpuVendor {
    type Err = TagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s {
            "nvidia" => GpuVendor::Nvidia,
            "amd" => GpuVendor::Amd,
            "intel" => GpuVendor::Intel,
            other => return Err(TagParseError::unknown_value(TagCategory::GpuVendor, other)),
        };
        Ok(val)
    }
}

impl fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuVendor::Nvidia => write!(f, "nvidia"),
            GpuVendor::Amd => write!(f, "amd"),
            GpuVendor::Intel => write!(f, "intel"),
        }
    }
}

/// A specific GPU device: a vendor paired with a numeric device id.
///
/// A device id is never meaningful on its own, so this type always carries its vendor.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub struct GpuDevice {
    vendor: GpuVendor,
    #[cfg_attr(test, strategy(0u32..4))]
    device_id: u32,
}

impl GpuDevice {
    /// Creates a new device tag.
    pub const fn new(vendor: GpuVendor, device_id: u32) -> Self {
        Self { vendor, device_id }
    }

    /// Returns the vendor of this device.
    pub fn vendor(&self) -> GpuVendor {
        self.vendor
    }

    /// Returns the numeric device id.
    pub fn device_id(&self) -> u32 {
        self.device_id
    }
}

impl FromStr for GpuDevice {
    type Err = TagParseError;

    /// Parses `<vendor>:<device-id>`, where the device id is either hex with a `0x` prefix or
    /// decimal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((vendor, device_id)) = s.split_once(':') else {
            if looks_like_device_id(s) {
                return Err(TagParseError::OrphanDevice { input: s.to_owned() });
            }
            return Err(TagParseError::unknown_value(TagCategory::GpuDevice, s));
        };
        if vendor.is_empty() {
            return Err(TagParseError::OrphanDevice {
                input: device_id.to_owned(),
            });
        }

        let vendor: GpuVendor = vendor.parse()?;
        let device_id = parse_device_id(device_id).map_err(|err| TagParseError::InvalidDeviceId {
            input: s.to_owned(),
            err,
        })?;
        Ok(Self { vendor, device_id })
    }
}

impl fmt::Display for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:#06x}", self.vendor, self.device_id)
    }
}

/// Parses a device id, either as hex with a `0x` prefix or as decimal.
pub(crate) fn parse_device_id(input: &str) -> Result<u32, std::num::ParseIntError> {
    match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => input.parse(),
    }
}

fn looks_like_device_id(input: &str) -> bool {
    input.starts_with(|c: char| c.is_ascii_digit())
}

/// An atomic condition value.
///
/// Tags are ordered first by category, then by value. This is the order condition sets are
/// displayed in.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Tag {
    /// Matches environments running on this platform.
    Platform(Platform),

    /// Matches environments running this OS release.
    OsVersion(OsVersion),

    /// Matches environments with a GPU from this vendor.
    GpuVendor(GpuVendor),

    /// Matches environments with exactly this GPU.
    GpuDevice(GpuDevice),
}

impl Tag {
    /// Returns the category of this tag.
    pub fn category(&self) -> TagCategory {
        match self {
            Tag::Platform(_) => TagCategory::Platform,
            Tag::OsVersion(_) => TagCategory::OsVersion,
            Tag::GpuVendor(_) => TagCategory::GpuVendor,
            Tag::GpuDevice(_) => TagCategory::GpuDevice,
        }
    }
}

impl From<Platform> for Tag {
    fn from(platform: Platform) -> Self {
        Tag::Platform(platform)
    }
}

impl From<OsVersion> for Tag {
    fn from(os_version: OsVersion) -> Self {
        Tag::OsVersion(os_version)
    }
}

impl From<GpuVendor> for Tag {
    fn from(vendor: GpuVendor) -> Self {
        Tag::GpuVendor(vendor)
    }
}

impl From<GpuDevice> for Tag {
    fn from(device: GpuDevice) -> Self {
        Tag::GpuDevice(device)
    }
}

impl FromStr for Tag {
    type Err = TagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(platform) = s.parse() {
            return Ok(Tag::Platform(platform));
        }
        if let Ok(os_version) = s.parse() {
            return Ok(Tag::OsVersion(os_version));
        }
        if let Ok(vendor) = s.parse() {
            return Ok(Tag::GpuVendor(vendor));
        }
        if s.contains(':') || looks_like_device_id(s) {
            return s.parse().map(Tag::GpuDevice);
        }
        Err(TagParseError::Unknown {
            input: s.to_owned(),
        })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Platform(platform) => write!(f, "{platform}"),
            Tag::OsVersion(os_version) => write!(f, "{os_version}"),
            Tag::GpuVendor(vendor) => write!(f, "{vendor}"),
            Tag::GpuDevice(device) => write!(f, "{device}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("win", Tag::Platform(Platform::Win); "platform")]
    #[test_case("chromeos", Tag::Platform(Platform::ChromeOs); "chromeos")]
    #[test_case("win7", Tag::OsVersion(OsVersion::Win7); "windows release")]
    #[test_case("snowleopard", Tag::OsVersion(OsVersion::SnowLeopard); "mac release")]
    #[test_case("intel", Tag::GpuVendor(GpuVendor::Intel); "vendor")]
    #[test_case(
        "nvidia:0x1234",
        Tag::GpuDevice(GpuDevice::new(GpuVendor::Nvidia, 0x1234));
        "device hex"
    )]
    #[test_case(
        "amd:4660",
        Tag::GpuDevice(GpuDevice::new(GpuVendor::Amd, 4660));
        "device decimal"
    )]
    fn tag_from_str(input: &str, expected: Tag) {
        assert_eq!(input.parse::<Tag>(), Ok(expected));
    }

    #[test]
    fn tag_display_is_parseable() {
        let tags = [
            Tag::Platform(Platform::Android),
            Tag::OsVersion(OsVersion::MountainLion),
            Tag::GpuVendor(GpuVendor::Amd),
            Tag::GpuDevice(GpuDevice::new(GpuVendor::Intel, 0x0a2e)),
        ];
        for tag in tags {
            let displayed = tag.to_string();
            assert_eq!(displayed.parse::<Tag>(), Ok(tag), "for {displayed}");
        }
        assert_eq!(
            GpuDevice::new(GpuVendor::Nvidia, 0x1234).to_string(),
            "nvidia:0x1234"
        );
    }

    #[test]
    fn orphan_device_rejected() {
        assert_eq!(
            "0x1234".parse::<Tag>(),
            Err(TagParseError::OrphanDevice {
                input: "0x1234".to_owned()
            })
        );
        assert_eq!(
            ":0x1234".parse::<Tag>(),
            Err(TagParseError::OrphanDevice {
                input: "0x1234".to_owned()
            })
        );
    }

    #[test]
    fn invalid_tags_rejected() {
        assert!(matches!(
            "windows".parse::<Tag>(),
            Err(TagParseError::Unknown { .. })
        ));
        assert!(matches!(
            "nvidia:zzz".parse::<Tag>(),
            Err(TagParseError::InvalidDeviceId { .. })
        ));
        assert_eq!(
            "matrox:0x1234".parse::<Tag>(),
            Err(TagParseError::UnknownValue {
                category: TagCategory::GpuVendor,
                input: "matrox".to_owned(),
            })
        );

        let message = "windows".parse::<Tag>().unwrap_err().to_string();
        assert!(
            message.contains("win, mac, linux"),
            "message lists known tags: {message}"
        );
    }

    #[test]
    fn os_versions_imply_platform() {
        for variant in OsVersion::variants() {
            let os_version: OsVersion = variant.parse().unwrap();
            let expected = match *variant {
                "xp" | "vista" | "win7" => Platform::Win,
                _ => Platform::Mac,
            };
            assert_eq!(os_version.platform(), expected, "for {variant}");
        }
    }
}
