// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Condition sets: the match predicate of a single rule.

use crate::{
    environment::EnvironmentDescriptor,
    errors::{InvalidRuleErrorKind, TagParseError},
    tag::{GpuDevice, GpuVendor, OsVersion, Platform, Tag},
};
use itertools::Itertools;
use std::{collections::BTreeSet, fmt};

/// The set of tags a rule requires.
///
/// A condition set matches an environment if and only if *every* tag in it is satisfied by the
/// environment. There is no disjunction within a set: "fails on A or B" is written as two rules.
///
/// Duplicate tags are collapsed, and tags are kept in a deterministic order.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct ConditionSet {
    tags: BTreeSet<Tag>,
}

impl ConditionSet {
    /// Creates a new condition set from the given tags.
    ///
    /// Validation happens at registration time, not here.
    pub fn new(tags: impl IntoIterator<Item = impl Into<Tag>>) -> Self {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a condition set from the textual forms of its tags.
    pub fn parse<I, S>(tags: I) -> Result<Self, TagParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = tags
            .into_iter()
            .map(|tag| tag.as_ref().parse::<Tag>())
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { tags })
    }

    /// Returns the number of distinct tags in this set.
    ///
    /// When several rules match, the one with the highest specificity wins.
    pub fn specificity(&self) -> usize {
        self.tags.len()
    }

    /// Returns true if this set has no tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterates over the tags in this set.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Tag> + '_ {
        self.tags.iter()
    }

    /// Returns true if every tag in this set is satisfied by the environment.
    pub fn matches(&self, env: &EnvironmentDescriptor) -> bool {
        self.tags.iter().all(|tag| env.satisfies(tag))
    }

    pub(crate) fn validate(&self) -> Result<(), InvalidRuleErrorKind> {
        if self.tags.is_empty() {
            return Err(InvalidRuleErrorKind::EmptyConditions);
        }

        for device in self.devices() {
            if let Some(vendor) = self.vendors().find(|vendor| *vendor != device.vendor()) {
                return Err(InvalidRuleErrorKind::DeviceVendorMismatch { device, vendor });
            }
        }

        Ok(())
    }

    /// Returns combinations of tags within this set that no valid environment can satisfy.
    ///
    /// Such sets are well formed and are registered as written, but they can never match.
    pub fn conflicts(&self) -> Vec<ConditionConflict> {
        let mut conflicts = Vec::new();

        let platforms: Vec<_> = self.platforms().collect();
        conflicts.extend(
            platforms
                .iter()
                .tuple_combinations()
                .map(|(a, b)| ConditionConflict::Platforms(*a, *b)),
        );

        let os_versions: Vec<_> = self.os_versions().collect();
        conflicts.extend(
            os_versions
                .iter()
                .tuple_combinations()
                .map(|(a, b)| ConditionConflict::OsVersions(*a, *b)),
        );
        for os_version in &os_versions {
            for platform in &platforms {
                if os_version.platform() != *platform {
                    conflicts.push(ConditionConflict::OsVersionPlatform {
                        os_version: *os_version,
                        platform: *platform,
                    });
                }
            }
        }

        conflicts.extend(
            self.vendors()
                .tuple_combinations()
                .map(|(a, b)| ConditionConflict::GpuVendors(a, b)),
        );
        conflicts.extend(
            self.devices()
                .tuple_combinations()
                .map(|(a, b)| ConditionConflict::GpuDevices(a, b)),
        );

        conflicts
    }

    fn platforms(&self) -> impl Iterator<Item = Platform> + Clone + '_ {
        self.tags.iter().filter_map(|tag| match tag {
            Tag::Platform(platform) => Some(*platform),
            _ => None,
        })
    }

    fn os_versions(&self) -> impl Iterator<Item = OsVersion> + Clone + '_ {
        self.tags.iter().filter_map(|tag| match tag {
            Tag::OsVersion(os_version) => Some(*os_version),
            _ => None,
        })
    }

    fn vendors(&self) -> impl Iterator<Item = GpuVendor> + Clone + '_ {
        self.tags.iter().filter_map(|tag| match tag {
            Tag::GpuVendor(vendor) => Some(*vendor),
            _ => None,
        })
    }

    fn devices(&self) -> impl Iterator<Item = GpuDevice> + Clone + '_ {
        self.tags.iter().filter_map(|tag| match tag {
            Tag::GpuDevice(device) => Some(*device),
            _ => None,
        })
    }
}

impl<const N: usize> From<[Tag; N]> for ConditionSet {
    fn from(tags: [Tag; N]) -> Self {
        Self::new(tags)
    }
}

impl From<Vec<Tag>> for ConditionSet {
    fn from(tags: Vec<Tag>) -> Self {
        Self::new(tags)
    }
}

impl<T: Into<Tag>> FromIterator<T> for ConditionSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for ConditionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.tags.iter().join(", "))
    }
}

/// A pair of tags that can never be satisfied together.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConditionConflict {
    /// Two different platforms.
    Platforms(Platform, Platform),

    /// Two different OS versions.
    OsVersions(OsVersion, OsVersion),

    /// An OS version that belongs to a different platform than a platform tag.
    OsVersionPlatform {
        /// The OS version.
        os_version: OsVersion,

        /// The platform it conflicts with.
        platform: Platform,
    },

    /// Two different GPU vendors.
    GpuVendors(GpuVendor, GpuVendor),

    /// Two different GPU devices.
    GpuDevices(GpuDevice, GpuDevice),
}

impl fmt::Display for ConditionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Platforms(a, b) => write!(f, "platforms `{a}` and `{b}` are exclusive"),
            Self::OsVersions(a, b) => write!(f, "OS versions `{a}` and `{b}` are exclusive"),
            Self::OsVersionPlatform {
                os_version,
                platform,
            } => write!(
                f,
                "OS version `{os_version}` belongs to `{}`, not `{platform}`",
                os_version.platform()
            ),
            Self::GpuVendors(a, b) => write!(f, "GPU vendors `{a}` and `{b}` are exclusive"),
            Self::GpuDevices(a, b) => write!(f, "GPU devices `{a}` and `{b}` are exclusive"),
        }
    }
}
