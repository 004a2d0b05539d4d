// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line access to conditional test expectations.
//!
//! The `expectations` binary loads one or more expectation catalogs and answers questions about
//! them: what a test is expected to do on a given machine (`resolve`), which rules are registered
//! (`list`), and whether catalogs are valid (`check`).
//!
//! Exit codes are documented in
//! [`ExpectationsExitCode`](expectations_metadata::ExpectationsExitCode).

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter, StderrStyles};

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;
