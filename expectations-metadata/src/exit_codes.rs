// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `expectations` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum ExpectationsExitCode {}

impl ExpectationsExitCode {
    /// No errors occurred and the command exited normally.
    pub const OK: i32 = 0;

    /// A user issue happened while setting up an invocation, for example an invalid environment
    /// descriptor or an unreadable test list.
    pub const SETUP_ERROR: i32 = 96;

    /// One or more expectation catalogs could not be loaded or contained invalid rules.
    pub const CATALOG_INVALID: i32 = 97;

    /// A test was queried that is neither registered in any rule nor present in the test list,
    /// and unknown tests were configured to be errors.
    pub const UNKNOWN_TEST: i32 = 98;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
