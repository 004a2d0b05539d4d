// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Top-level application and command routing.

use super::commands::{CheckOpts, ListOpts, ResolveOpts};
use crate::{
    Result,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use clap::Subcommand;

/// Query conditional test expectations.
///
/// Expectations are declared in catalog files as rules that map a test and a set of conditions
/// (platform, OS version, GPU vendor, GPU device) to an expected outcome. Given a description of
/// the machine a test runs on, this tool resolves the expected outcome of each test.
#[derive(Debug, clap::Parser)]
#[command(
    version,
    bin_name = "expectations",
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct ExpectationsApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl ExpectationsApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::Resolve(opts) => opts.exec(output, output_writer),
            Command::List(opts) => opts.exec(output, output_writer),
            Command::Check(opts) => opts.exec(output, output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve the expected outcome of tests in an environment
    ///
    /// Prints one resolution per test. If no tests are given, every test in the test list is
    /// resolved, or, without a test list, every test named by a rule.
    #[command(visible_alias = "r")]
    Resolve(Box<ResolveOpts>),

    /// List registered expectations in registration order
    #[command(visible_alias = "l")]
    List(ListOpts),

    /// Load and validate expectation catalogs
    Check(CheckOpts),
}
