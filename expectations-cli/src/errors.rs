// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::StderrStyles;
use expectations_engine::errors::{
    CatalogParseError, EnvironmentError, TestListReadError, UnknownTestError,
};
use expectations_metadata::ExpectationsExitCode;
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;

/// An error that the `expectations` binary knows how to report.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("failed to load expectation catalog")]
    CatalogParseError {
        #[from]
        err: CatalogParseError,
    },
    #[error("catalog warnings were denied")]
    CatalogWarningsDenied { count: usize },
    #[error("invalid environment")]
    EnvironmentError {
        #[from]
        err: EnvironmentError,
    },
    #[error("failed to read test list")]
    TestListReadError {
        #[from]
        err: TestListReadError,
    },
    #[error("unknown test")]
    UnknownTest {
        #[from]
        err: UnknownTestError,
    },
    #[error("error writing output")]
    WriteOutputError {
        #[from]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn write_output(err: serde_json::Error) -> Self {
        Self::WriteOutputError { err: err.into() }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CatalogParseError { .. } | Self::CatalogWarningsDenied { .. } => {
                ExpectationsExitCode::CATALOG_INVALID
            }
            Self::EnvironmentError { .. } | Self::TestListReadError { .. } => {
                ExpectationsExitCode::SETUP_ERROR
            }
            Self::UnknownTest { .. } => ExpectationsExitCode::UNKNOWN_TEST,
            Self::WriteOutputError { .. } => ExpectationsExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::CatalogParseError { err } => {
                error!(
                    "failed to load expectation catalog at `{}`",
                    err.catalog_file().style(styles.bold)
                );
                err.source()
            }
            Self::CatalogWarningsDenied { count } => {
                let noun = if *count == 1 { "warning" } else { "warnings" };
                error!(
                    "{} catalog {noun} found (--deny-warnings was passed)",
                    count.style(styles.bold)
                );
                None
            }
            Self::EnvironmentError { err } => {
                error!("{err}");
                err.source()
            }
            Self::TestListReadError { err } => {
                error!("{err}");
                err.source()
            }
            Self::UnknownTest { err } => {
                error!(
                    "test `{}` is not in the test list and has no registered expectations",
                    err.test().style(styles.bold)
                );
                None
            }
            Self::WriteOutputError { err } => {
                error!("error writing output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: "expectations::no_heading", "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
