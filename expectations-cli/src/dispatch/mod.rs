// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command dispatch and execution.

mod app;
mod cli;
mod commands;
#[cfg(test)]
mod tests;

pub use app::ExpectationsApp;
