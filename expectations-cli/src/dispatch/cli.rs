// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Options shared across commands.

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use expectations_engine::{
    catalog::{CatalogWarnings, DefaultCatalogWarnings, load_catalogs},
    conditions::ConditionConflict,
    environment::EnvironmentDescriptor,
    errors::{CatalogParseError, EnvironmentError},
    resolve::ExpectationSet,
};
use serde::Serialize;
use std::{collections::BTreeSet, io::Write};

#[derive(Debug, Args)]
#[command(next_help_heading = "Catalog options")]
pub(super) struct CatalogOpts {
    /// Expectation catalog to load (can be passed multiple times)
    ///
    /// Several catalogs can also be given as a comma-separated list, which is how
    /// `EXPECTATIONS_CATALOG` names more than one. Catalogs are registered in the order given, so rules in later catalogs win ties against
    /// rules in earlier ones.
    #[arg(
        long = "catalog",
        value_name = "PATH",
        required = true,
        value_delimiter = ',',
        env = "EXPECTATIONS_CATALOG"
    )]
    pub(super) catalogs: Vec<Utf8PathBuf>,
}

impl CatalogOpts {
    /// Loads every catalog into a frozen expectation set, counting warnings along the way.
    pub(super) fn load(&self) -> Result<(ExpectationSet, usize), CatalogParseError> {
        let mut warnings = CountingCatalogWarnings::default();
        let set = load_catalogs(&self.catalogs, &mut warnings)?;
        Ok((set, warnings.count))
    }
}

/// Logs catalog warnings, and keeps track of how many there were.
#[derive(Default)]
struct CountingCatalogWarnings {
    count: usize,
}

impl CatalogWarnings for CountingCatalogWarnings {
    fn unknown_catalog_keys(&mut self, catalog_file: &Utf8Path, unknown: &BTreeSet<String>) {
        self.count += 1;
        DefaultCatalogWarnings.unknown_catalog_keys(catalog_file, unknown);
    }

    fn unsatisfiable_conditions(
        &mut self,
        catalog_file: &Utf8Path,
        index: usize,
        test: &str,
        conflicts: &[ConditionConflict],
    ) {
        self.count += 1;
        DefaultCatalogWarnings.unsatisfiable_conditions(catalog_file, index, test, conflicts);
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Environment options")]
pub(super) struct EnvironmentOpts {
    /// Platform the tests run on (win, mac, linux, chromeos, android)
    #[arg(long, value_name = "PLATFORM", env = "EXPECTATIONS_PLATFORM")]
    pub(super) platform: String,

    /// OS version the tests run on, e.g. win7 or lion
    #[arg(long, value_name = "VERSION", env = "EXPECTATIONS_OS_VERSION")]
    pub(super) os_version: Option<String>,

    /// GPU vendor the tests run on (nvidia, amd, intel)
    #[arg(long, value_name = "VENDOR", env = "EXPECTATIONS_GPU_VENDOR")]
    pub(super) gpu_vendor: String,

    /// GPU device id, either bare (0x0fe9) or paired with the vendor (nvidia:0x0fe9)
    #[arg(long, value_name = "ID", env = "EXPECTATIONS_GPU_DEVICE")]
    pub(super) gpu_device: Option<String>,
}

impl EnvironmentOpts {
    pub(super) fn to_environment(&self) -> Result<EnvironmentDescriptor, EnvironmentError> {
        EnvironmentDescriptor::parse(
            &self.platform,
            self.os_version.as_deref(),
            &self.gpu_vendor,
            self.gpu_device.as_deref(),
        )
    }
}

/// Output formats for commands that print data.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub(super) enum MessageFormat {
    /// A human-readable output format.
    #[default]
    Human,
    /// JSON with no whitespace.
    Json,
    /// JSON, prettified.
    JsonPretty,
}

impl MessageFormat {
    /// Writes `value` as JSON, followed by a newline.
    ///
    /// Returns `false` without writing anything if this is the human format.
    pub(super) fn write_json<T: Serialize>(
        self,
        value: &T,
        mut writer: impl Write,
    ) -> Result<bool, crate::ExpectedError> {
        let res = match self {
            Self::Human => return Ok(false),
            Self::Json => serde_json::to_writer(&mut writer, value),
            Self::JsonPretty => serde_json::to_writer_pretty(&mut writer, value),
        };
        res.map_err(crate::ExpectedError::write_output)?;
        writeln!(writer)?;
        Ok(true)
    }
}
