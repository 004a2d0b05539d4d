// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The authoritative list of tests, and what to do with tests outside it.

use crate::errors::{TestListReadError, UnknownTestPolicyParseError};
use camino::Utf8Path;
use indexmap::IndexSet;
use smol_str::SmolStr;
use std::{fmt, str::FromStr};

/// The set of tests known to exist in a suite.
///
/// A test catalog is only consulted when resolving with [`UnknownTestPolicy::Error`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TestCatalog {
    tests: IndexSet<SmolStr>,
}

impl TestCatalog {
    /// Creates a new test catalog from the given test names.
    pub fn new(tests: impl IntoIterator<Item = impl Into<SmolStr>>) -> Self {
        Self {
            tests: tests.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a test list: one test per line. Blank lines and lines starting with `#` are ignored.
    pub fn parse_test_list(input: &str) -> Self {
        Self::new(
            input
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    /// Reads a test list from a file.
    pub fn from_test_list_file(path: impl AsRef<Utf8Path>) -> Result<Self, TestListReadError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|err| TestListReadError::new(path, err))?;
        Ok(Self::parse_test_list(&contents))
    }

    /// Returns true if the catalog contains this test.
    pub fn contains(&self, test: &str) -> bool {
        self.tests.contains(test)
    }

    /// Returns the number of tests in the catalog.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Iterates over tests in the order they were listed.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.tests.iter().map(SmolStr::as_str)
    }
}

/// What to do when resolving a test that is neither in the test catalog nor named by any rule.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum UnknownTestPolicy {
    /// Resolve to the default outcome, as for any test with no matching rule.
    #[default]
    Pass,

    /// Fail with an [`UnknownTestError`](crate::errors::UnknownTestError).
    Error,
}

impl UnknownTestPolicy {
    /// String representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &["pass", "error"]
    }
}

impl FromStr for UnknownTestPolicy {
    type Err = UnknownTestPolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s {
            "pass" => UnknownTestPolicy::Pass,
            "error" => UnknownTestPolicy::Error,
            other => return Err(UnknownTestPolicyParseError::new(other)),
        };
        Ok(val)
    }
}

impl fmt::Display for UnknownTestPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownTestPolicy::Pass => write!(f, "pass"),
            UnknownTestPolicy::Error => write!(f, "error"),
        }
    }
}
