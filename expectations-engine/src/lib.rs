// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Conditional test expectations.
//!
//! A test suite declares, ahead of time, which tests are known to fail, be skipped, be flaky or
//! time out, and under which conditions (platform, OS version, GPU vendor, GPU device). At run
//! time, the harness describes the machine it is running on, and asks for the expected outcome
//! of each test.
//!
//! The flow is:
//!
//! 1. Populate a [`RuleRegistry`](registry::RuleRegistry), either through its API or by loading
//!    [catalog files](catalog).
//! 2. Freeze it into an [`ExpectationSet`](resolve::ExpectationSet).
//! 3. Describe the machine with an [`EnvironmentDescriptor`](environment::EnvironmentDescriptor).
//! 4. Call [`ExpectationSet::resolve`](resolve::ExpectationSet::resolve) for each test.

pub mod catalog;
pub mod conditions;
pub mod environment;
pub mod errors;
pub mod registry;
pub mod resolve;
pub mod rule;
pub mod tag;
pub mod test_catalog;

pub use expectations_metadata::{BugId, Outcome};
