// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the expectations engine.

use crate::tag::{GpuDevice, GpuVendor, OsVersion, Platform, TagCategory};
use camino::Utf8PathBuf;
use config::ConfigError;
use expectations_metadata::OutcomeParseError;
use itertools::Itertools;
use smol_str::SmolStr;
use std::{fmt, num::ParseIntError};
use thiserror::Error;

/// An error that occurs while parsing a tag from its textual form.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TagParseError {
    /// The input is not a known tag in any category.
    #[error(
        "unrecognized condition tag `{input}`\n(known tags: {})",
        TagCategory::all_known_values().join(", "),
    )]
    Unknown {
        /// The input provided.
        input: String,
    },

    /// The input is not a known value within a specific category.
    #[error(
        "unrecognized value for {category}: `{input}`\n(known values: {})",
        category.known_values().join(", "),
    )]
    UnknownValue {
        /// The category that was being parsed.
        category: TagCategory,

        /// The input provided.
        input: String,
    },

    /// A device id was provided without a GPU vendor.
    #[error("GPU device id `{input}` must be paired with a GPU vendor (for example `nvidia:{input}`)")]
    OrphanDevice {
        /// The input provided.
        input: String,
    },

    /// A device tag had a vendor, but the device id could not be parsed.
    #[error("invalid GPU device id in `{input}`")]
    InvalidDeviceId {
        /// The input provided.
        input: String,

        /// The underlying error.
        #[source]
        err: ParseIntError,
    },
}

impl TagParseError {
    pub(crate) fn unknown_value(category: TagCategory, input: impl Into<String>) -> Self {
        Self::UnknownValue {
            category,
            input: input.into(),
        }
    }
}

/// An error that occurs while constructing an
/// [`EnvironmentDescriptor`](crate::environment::EnvironmentDescriptor).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum EnvironmentError {
    /// The OS version belongs to a different platform than the one provided.
    #[error(
        "OS version `{os_version}` belongs to platform `{}`, but the environment platform is `{platform}`",
        os_version.platform(),
    )]
    OsVersionMismatch {
        /// The OS version provided.
        os_version: OsVersion,

        /// The platform provided.
        platform: Platform,
    },

    /// A GPU device was provided for a different vendor than the environment's GPU vendor.
    #[error("GPU device `{device}` does not belong to the environment's GPU vendor `{gpu_vendor}`")]
    DeviceVendorMismatch {
        /// The device provided.
        device: GpuDevice,

        /// The environment's GPU vendor.
        gpu_vendor: GpuVendor,
    },

    /// A component of the environment could not be parsed.
    #[error("invalid environment descriptor")]
    Parse(#[from] TagParseError),
}

/// An error which indicates that a rule is malformed.
///
/// This is a configuration-time error: it always indicates a mistake in the expectation catalog.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid expectation for `{test}`: {kind}")]
pub struct InvalidRuleError {
    test: SmolStr,
    kind: InvalidRuleErrorKind,
}

impl InvalidRuleError {
    pub(crate) fn new(test: impl Into<SmolStr>, kind: InvalidRuleErrorKind) -> Self {
        Self {
            test: test.into(),
            kind,
        }
    }

    /// Returns the test the rule was registered for.
    pub fn test(&self) -> &str {
        &self.test
    }

    /// Returns the reason this rule is invalid.
    pub fn kind(&self) -> &InvalidRuleErrorKind {
        &self.kind
    }
}

/// The reason an [`InvalidRuleError`] occurred.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidRuleErrorKind {
    /// The test pattern was empty.
    EmptyTestPattern,

    /// The condition set had no tags.
    ///
    /// Unconditional expectations are not representable.
    EmptyConditions,

    /// A GPU device tag names a different vendor than a GPU vendor tag in the same set.
    DeviceVendorMismatch {
        /// The device tag.
        device: GpuDevice,

        /// The vendor tag it conflicts with.
        vendor: GpuVendor,
    },

    /// A condition tag could not be parsed.
    InvalidTag(TagParseError),

    /// The outcome could not be parsed.
    InvalidOutcome(OutcomeParseError),
}

impl fmt::Display for InvalidRuleErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTestPattern => write!(f, "test pattern is empty"),
            Self::EmptyConditions => write!(
                f,
                "condition set is empty (every expectation must be scoped by at least one tag)"
            ),
            Self::DeviceVendorMismatch { device, vendor } => write!(
                f,
                "GPU device `{device}` conflicts with GPU vendor `{vendor}` in the same condition set"
            ),
            Self::InvalidTag(err) => write!(f, "{err}"),
            Self::InvalidOutcome(err) => write!(f, "{err}"),
        }
    }
}

/// An error which indicates that registration was attempted after the registry was frozen.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error(
    "cannot register expectation for `{test}`: registry was frozen with {rule_count} rules"
)]
pub struct RegistryFrozenError {
    test: SmolStr,
    rule_count: usize,
}

impl RegistryFrozenError {
    pub(crate) fn new(test: impl Into<SmolStr>, rule_count: usize) -> Self {
        Self {
            test: test.into(),
            rule_count,
        }
    }

    /// Returns the test that registration was attempted for.
    pub fn test(&self) -> &str {
        &self.test
    }
}

/// An error returned by [`RuleRegistry::register`](crate::registry::RuleRegistry::register).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    /// The rule was malformed.
    #[error(transparent)]
    InvalidRule(#[from] InvalidRuleError),

    /// The registry was already frozen.
    #[error(transparent)]
    Frozen(#[from] RegistryFrozenError),
}

/// An error which indicates that a test is not known to the catalog or to any rule.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("test `{test}` is not in the test list and has no registered expectations")]
pub struct UnknownTestError {
    test: SmolStr,
}

impl UnknownTestError {
    pub(crate) fn new(test: impl Into<SmolStr>) -> Self {
        Self { test: test.into() }
    }

    /// Returns the test that was queried.
    pub fn test(&self) -> &str {
        &self.test
    }
}

/// Error returned while parsing an
/// [`UnknownTestPolicy`](crate::test_catalog::UnknownTestPolicy) value from a string.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error(
    "unrecognized value for unknown-tests: {input}\n(known values: {})",
    crate::test_catalog::UnknownTestPolicy::variants().join(", "),
)]
pub struct UnknownTestPolicyParseError {
    input: String,
}

impl UnknownTestPolicyParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// An error that occurred while reading a test list file.
#[derive(Debug, Error)]
#[error("failed to read test list at `{path}`")]
pub struct TestListReadError {
    path: Utf8PathBuf,
    #[source]
    err: std::io::Error,
}

impl TestListReadError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self {
            path: path.into(),
            err,
        }
    }
}

/// An error that occurred while loading an expectation catalog.
#[derive(Debug, Error)]
#[error("failed to load expectation catalog at `{catalog_file}`")]
pub struct CatalogParseError {
    catalog_file: Utf8PathBuf,
    #[source]
    kind: CatalogParseErrorKind,
}

impl CatalogParseError {
    pub(crate) fn new(catalog_file: impl Into<Utf8PathBuf>, kind: CatalogParseErrorKind) -> Self {
        Self {
            catalog_file: catalog_file.into(),
            kind,
        }
    }

    /// Returns the catalog file that produced this error.
    pub fn catalog_file(&self) -> &Utf8PathBuf {
        &self.catalog_file
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &CatalogParseErrorKind {
        &self.kind
    }
}

/// The kind of catalog error that occurred.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogParseErrorKind {
    /// An error occurred while reading or parsing the file.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the catalog.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),

    /// One or more entries are invalid rules.
    #[error(
        "{} invalid expectation(s):\n{}",
        .0.len(),
        .0.iter().map(|err| format!("  - {err}")).join("\n"),
    )]
    InvalidRules(Vec<CatalogEntryError>),

    /// The registry the catalog was loaded into was already frozen.
    #[error(transparent)]
    RegistryFrozen(RegistryFrozenError),
}

/// An invalid rule within a catalog, together with its position.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("entry {index}: {error}")]
pub struct CatalogEntryError {
    index: usize,
    error: InvalidRuleError,
}

impl CatalogEntryError {
    pub(crate) fn new(index: usize, error: InvalidRuleError) -> Self {
        Self { index, error }
    }

    /// Returns the zero-based index of the entry within the catalog file.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the underlying rule error.
    pub fn error(&self) -> &InvalidRuleError {
        &self.error
    }
}
