// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expectation catalogs: rules declared as data.
//!
//! A catalog is a TOML file with one `[[expectations]]` table per rule:
//!
//! ```toml
//! [[expectations]]
//! test = "conformance/textures/texture-size.html"
//! outcome = "fail"
//! conditions = ["win", "intel"]
//! bug = 121139
//!
//! [[expectations]]
//! test = "conformance/more/functions/copyTexImage2D.html"
//! outcome = "flaky"
//! conditions = ["mac", { vendor = "nvidia", device = 0x0fe9 }]
//! ```
//!
//! Entries are registered in file order. When several catalogs are loaded, they are registered
//! in the order given, so rules in later catalogs win ties against rules in earlier ones.

mod deserialize;
mod imp;

pub use imp::*;
