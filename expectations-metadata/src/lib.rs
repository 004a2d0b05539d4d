// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to machine-readable output produced by the `expectations` tool.
//!
//! The types in this crate are shared between the resolution engine and anything that consumes
//! its JSON output. They are intentionally small and stable.

mod errors;
mod exit_codes;
mod outcome;
mod summaries;

pub use errors::*;
pub use exit_codes::*;
pub use outcome::*;
pub use summaries::*;
