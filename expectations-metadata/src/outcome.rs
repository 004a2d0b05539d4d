// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::OutcomeParseError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The expected result of a test under some environment.
///
/// This is a closed set: catalogs that name any other outcome are rejected.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// The test is expected to pass.
    ///
    /// This is the outcome when no rule matches.
    #[default]
    Pass,

    /// The test is expected to fail.
    Fail,

    /// The test should not be run at all.
    Skip,

    /// The test may either pass or fail.
    Flaky,

    /// The test is expected to time out.
    Timeout,
}

impl Outcome {
    /// String representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &["pass", "fail", "skip", "flaky", "timeout"]
    }

    /// Returns true if this is the outcome used when no rule matches.
    pub fn is_default(self) -> bool {
        self == Outcome::Pass
    }
}

impl FromStr for Outcome {
    type Err = OutcomeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s {
            "pass" => Outcome::Pass,
            "fail" => Outcome::Fail,
            "skip" => Outcome::Skip,
            "flaky" => Outcome::Flaky,
            "timeout" => Outcome::Timeout,
            other => return Err(OutcomeParseError::new(other)),
        };
        Ok(val)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Use pad so that alignment flags are honored.
        let s = match self {
            Outcome::Pass => "pass",
            Outcome::Fail => "fail",
            Outcome::Skip => "skip",
            Outcome::Flaky => "flaky",
            Outcome::Timeout => "timeout",
        };
        f.pad(s)
    }
}

/// A reference to a bug tracking an expectation.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(transparent)]
pub struct BugId(u64);

impl BugId {
    /// Creates a new bug reference.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric bug id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for BugId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for BugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
