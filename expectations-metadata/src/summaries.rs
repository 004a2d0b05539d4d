// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serializable summaries of rules, environments and resolutions.
//!
//! Tags are represented by their textual form (for example `win7` or `nvidia:0x1234`), which is
//! the same form accepted in catalog files.

use crate::{BugId, Outcome};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A serializable summary of a registered expectation rule.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuleSummary {
    /// The registration order of this rule, starting from 0.
    pub sequence: usize,

    /// The test this rule governs.
    pub test: SmolStr,

    /// The tags that must all be satisfied for this rule to apply.
    pub conditions: Vec<SmolStr>,

    /// The number of distinct tags in the condition set.
    pub specificity: usize,

    /// The outcome this rule produces.
    pub outcome: Outcome,

    /// The bug tracking this rule, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bug: Option<BugId>,
}

/// A serializable summary of an environment descriptor.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnvironmentSummary {
    /// The platform, e.g. `win`.
    pub platform: SmolStr,

    /// The OS version, e.g. `win7`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<SmolStr>,

    /// The GPU vendor, e.g. `intel`.
    pub gpu_vendor: SmolStr,

    /// The GPU device id, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_device_id: Option<u32>,
}

/// A serializable summary of a single resolution.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolutionSummary {
    /// The test that was queried.
    pub test: SmolStr,

    /// The resolved outcome.
    pub outcome: Outcome,

    /// The bug attached to the winning rule, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bug: Option<BugId>,

    /// The winning rule, or `None` if no rule matched and the default outcome applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<RuleSummary>,
}

/// A serializable report of resolutions for a set of tests under one environment.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolutionReport {
    /// The environment the tests were resolved against.
    pub environment: EnvironmentSummary,

    /// One resolution per queried test, in query order.
    pub resolutions: Vec<ResolutionSummary>,
}

impl ResolutionReport {
    /// Parses a report from JSON.
    pub fn parse_json(json: impl AsRef<str>) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }
}
