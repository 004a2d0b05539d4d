// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{InvalidRuleErrorKind, TagParseError},
    tag::{GpuDevice, Tag, parse_device_id},
};
use serde::{Deserialize, Deserializer, de::Error as _};
use std::fmt;

#[derive(Debug, Deserialize)]
pub(super) struct DeserializedCatalog {
    #[serde(default)]
    pub(super) expectations: Vec<DeserializedEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct DeserializedEntry {
    pub(super) test: String,
    pub(super) outcome: String,
    #[serde(default)]
    pub(super) conditions: Vec<DeserializedCondition>,
    #[serde(default)]
    pub(super) bug: Option<u64>,
}

/// A condition: either a tag string (`"win7"`, `"nvidia:0x1234"`) or a table
/// (`{ vendor = "nvidia", device = 0x1234 }`). A bare integer is read as a device id without a
/// vendor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) enum DeserializedCondition {
    Tag(String),
    Table {
        vendor: Option<String>,
        device: Option<u32>,
    },
}

impl DeserializedCondition {
    pub(super) fn to_tag(&self) -> Result<Tag, InvalidRuleErrorKind> {
        let tag: Result<Tag, TagParseError> = match self {
            Self::Tag(input) => input.parse(),
            Self::Table {
                vendor: Some(vendor),
                device: None,
            } => vendor.parse().map(Tag::GpuVendor),
            Self::Table {
                vendor: Some(vendor),
                device: Some(device_id),
            } => vendor
                .parse()
                .map(|vendor| Tag::GpuDevice(GpuDevice::new(vendor, *device_id))),
            Self::Table {
                vendor: None,
                device,
            } => Err(TagParseError::OrphanDevice {
                input: match device {
                    Some(device_id) => format!("{device_id:#06x}"),
                    None => String::new(),
                },
            }),
        };
        tag.map_err(InvalidRuleErrorKind::InvalidTag)
    }
}

impl<'de> Deserialize<'de> for DeserializedCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct V;

        impl<'de2> serde::de::Visitor<'de2> for V {
            type Value = DeserializedCondition;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(
                    "a tag string (\"win7\") \
                        or a table ({ vendor = \"nvidia\", device = 0x1234 })",
                )
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(DeserializedCondition::Tag(v.to_owned()))
            }

            // A bare integer is a device id with no vendor, which is reported per entry.
            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let device = u32::try_from(v)
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Signed(v), &self))?;
                Ok(DeserializedCondition::Table {
                    vendor: None,
                    device: Some(device),
                })
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let device = u32::try_from(v)
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Unsigned(v), &self))?;
                Ok(DeserializedCondition::Table {
                    vendor: None,
                    device: Some(device),
                })
            }

            fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de2>,
            {
                #[derive(Deserialize)]
                struct TableInner {
                    #[serde(default)]
                    vendor: Option<String>,
                    #[serde(default)]
                    device: Option<DeviceId>,
                }

                let inner =
                    TableInner::deserialize(serde::de::value::MapAccessDeserializer::new(map))?;
                if inner.vendor.is_none() && inner.device.is_none() {
                    return Err(A::Error::missing_field("vendor"));
                }
                Ok(DeserializedCondition::Table {
                    vendor: inner.vendor,
                    device: inner.device.map(|id| id.0),
                })
            }
        }

        deserializer.deserialize_any(V)
    }
}

/// A device id, written either as an integer or as a string (`"0x1234"`).
struct DeviceId(u32);

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct V;

        impl serde::de::Visitor<'_> for V {
            type Value = DeviceId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a device id (0x1234 or \"0x1234\")")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u32::try_from(v).map(DeviceId).map_err(|_| {
                    E::invalid_value(serde::de::Unexpected::Signed(v), &self)
                })
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u32::try_from(v).map(DeviceId).map_err(|_| {
                    E::invalid_value(serde::de::Unexpected::Unsigned(v), &self)
                })
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                parse_device_id(v)
                    .map(DeviceId)
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(V)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{GpuVendor, Platform};
    use test_case::test_case;

    #[test_case(
        DeserializedCondition::Tag("win".to_owned()),
        Ok(Tag::Platform(Platform::Win))
        ; "tag string"
    )]
    #[test_case(
        DeserializedCondition::Table { vendor: Some("amd".to_owned()), device: None },
        Ok(Tag::GpuVendor(GpuVendor::Amd))
        ; "vendor only table"
    )]
    #[test_case(
        DeserializedCondition::Table { vendor: Some("nvidia".to_owned()), device: Some(0x1234) },
        Ok(Tag::GpuDevice(GpuDevice::new(GpuVendor::Nvidia, 0x1234)))
        ; "device table"
    )]
    #[test_case(
        DeserializedCondition::Table { vendor: None, device: Some(0x1234) },
        Err(InvalidRuleErrorKind::InvalidTag(TagParseError::OrphanDevice {
            input: "0x1234".to_owned(),
        }))
        ; "orphan device table"
    )]
    fn condition_to_tag(
        condition: DeserializedCondition,
        expected: Result<Tag, InvalidRuleErrorKind>,
    ) {
        assert_eq!(condition.to_tag(), expected);
    }
}
