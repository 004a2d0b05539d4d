// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::cli::{CatalogOpts, EnvironmentOpts, MessageFormat};
use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputWriter, StdoutStyles},
};
use camino::Utf8PathBuf;
use clap::Args;
use expectations_engine::{
    environment::EnvironmentDescriptor,
    resolve::{ExpectationSet, Resolution},
    rule::ExpectationRule,
    test_catalog::{TestCatalog, UnknownTestPolicy},
};
use expectations_metadata::{ExpectationsExitCode, ResolutionReport, RuleSummary};
use owo_colors::OwoColorize;
use std::io::Write;
use swrite::{SWrite, swrite};
use tracing::debug;

/// Width of the widest outcome name, used to align human output.
const OUTCOME_WIDTH: usize = 7;

#[derive(Debug, Args)]
pub(super) struct ResolveOpts {
    #[clap(flatten)]
    catalog: CatalogOpts,

    #[clap(flatten)]
    environment: EnvironmentOpts,

    /// File listing every test in the suite, one per line
    ///
    /// Blank lines and lines starting with `#` are ignored.
    #[arg(long, value_name = "PATH")]
    test_list: Option<Utf8PathBuf>,

    /// Behavior for tests that are neither in the test list nor named by any rule
    #[arg(long, value_name = "POLICY", default_value_t)]
    unknown_tests: UnknownTestPolicy,

    /// Output format
    #[arg(long, short = 'T', value_enum, default_value_t, value_name = "FMT")]
    message_format: MessageFormat,

    /// Also show every matching rule, highest precedence first
    #[arg(long)]
    explain: bool,

    /// Tests to resolve
    #[arg(value_name = "TESTS")]
    tests: Vec<String>,
}

impl ResolveOpts {
    pub(super) fn exec(
        self,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let env = self.environment.to_environment()?;
        let (set, _) = self.catalog.load()?;
        let test_catalog = match &self.test_list {
            Some(path) => TestCatalog::from_test_list_file(path)?,
            None => TestCatalog::default(),
        };

        let tests: Vec<String> = if !self.tests.is_empty() {
            self.tests
        } else if !test_catalog.is_empty() {
            test_catalog.iter().map(str::to_owned).collect()
        } else {
            set.tests().map(str::to_owned).collect()
        };
        debug!(tests = tests.len(), %env, "resolving expectations");

        let resolutions = tests
            .iter()
            .map(|test| {
                set.resolve_checked(&test_catalog, self.unknown_tests, test, &env)
                    .map(|resolution| (test.as_str(), resolution))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let report = ResolutionReport {
            environment: env.to_summary(),
            resolutions: resolutions
                .iter()
                .map(|(test, resolution)| resolution.to_summary(test))
                .collect(),
        };

        let mut writer = output_writer.stdout_writer();
        if !self.message_format.write_json(&report, &mut writer)? {
            let styles = output.stdout_styles();
            let mut out = String::new();
            if output.verbose {
                swrite!(out, "{} {env}\n", "environment:".style(styles.dimmed));
            }
            for (test, resolution) in &resolutions {
                write_resolution(&mut out, test, resolution, &styles);
                if self.explain {
                    write_explanation(&mut out, &set, test, &env, resolution, &styles);
                }
            }
            writer.write_all(out.as_bytes())?;
        }
        writer.flush()?;

        Ok(ExpectationsExitCode::OK)
    }
}

fn write_resolution(
    out: &mut String,
    test: &str,
    resolution: &Resolution<'_>,
    styles: &StdoutStyles,
) {
    let outcome = resolution.outcome();
    swrite!(
        out,
        "{:>width$} {}",
        outcome.style(styles.outcome(outcome)),
        test.style(styles.test),
        width = OUTCOME_WIDTH,
    );
    if let Some(bug) = resolution.bug() {
        swrite!(out, " {}", format!("(bug {bug})").style(styles.dimmed));
    }
    out.push('\n');
}

fn write_explanation(
    out: &mut String,
    set: &ExpectationSet,
    test: &str,
    env: &EnvironmentDescriptor,
    resolution: &Resolution<'_>,
    styles: &StdoutStyles,
) {
    let matching = set.matching_rules(test, env);
    if matching.is_empty() {
        swrite!(
            out,
            "{:>width$} {}\n",
            "",
            "no matching rules, default outcome applies".style(styles.dimmed),
            width = OUTCOME_WIDTH,
        );
        return;
    }

    for rule in matching {
        let winner = resolution.rule().is_some_and(|winner| std::ptr::eq(winner, rule));
        swrite!(
            out,
            "{:>width$} {} {} {}",
            if winner { "*" } else { "" },
            format!("#{}", rule.sequence()).style(styles.dimmed),
            rule.outcome().style(styles.outcome(rule.outcome())),
            rule.conditions(),
            width = OUTCOME_WIDTH,
        );
        swrite!(
            out,
            " {}\n",
            format!("specificity {}", rule.specificity()).style(styles.dimmed)
        );
    }
}

#[derive(Debug, Args)]
pub(super) struct ListOpts {
    #[clap(flatten)]
    catalog: CatalogOpts,

    /// Output format
    #[arg(long, short = 'T', value_enum, default_value_t, value_name = "FMT")]
    message_format: MessageFormat,
}

impl ListOpts {
    pub(super) fn exec(
        self,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let (set, _) = self.catalog.load()?;
        let summaries: Vec<RuleSummary> = set.rules().map(ExpectationRule::to_summary).collect();

        let mut writer = output_writer.stdout_writer();
        if !self.message_format.write_json(&summaries, &mut writer)? {
            let styles = output.stdout_styles();
            let mut out = String::new();
            for rule in set.rules() {
                write_rule(&mut out, rule, &styles);
            }
            writer.write_all(out.as_bytes())?;
        }
        writer.flush()?;

        Ok(ExpectationsExitCode::OK)
    }
}

fn write_rule(out: &mut String, rule: &ExpectationRule, styles: &StdoutStyles) {
    swrite!(
        out,
        "{:>5} {:>width$} {} {}",
        format!("#{}", rule.sequence()).style(styles.dimmed),
        rule.outcome().style(styles.outcome(rule.outcome())),
        rule.test().style(styles.test),
        rule.conditions(),
        width = OUTCOME_WIDTH,
    );
    if let Some(bug) = rule.bug() {
        swrite!(out, " {}", format!("(bug {bug})").style(styles.dimmed));
    }
    swrite!(
        out,
        " {}\n",
        format!("specificity {}", rule.specificity()).style(styles.dimmed)
    );
}

#[derive(Debug, Args)]
pub(super) struct CheckOpts {
    #[clap(flatten)]
    catalog: CatalogOpts,

    /// Treat catalog warnings as errors
    #[arg(long)]
    deny_warnings: bool,
}

impl CheckOpts {
    pub(super) fn exec(
        self,
        _output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let (set, warning_count) = self.catalog.load()?;
        if self.deny_warnings && warning_count > 0 {
            return Err(ExpectedError::CatalogWarningsDenied {
                count: warning_count,
            });
        }

        let mut writer = output_writer.stdout_writer();
        writeln!(
            writer,
            "{} catalogs valid: {} expectations across {} tests",
            self.catalog.catalogs.len(),
            set.len(),
            set.tests().len(),
        )?;
        writer.flush()?;

        Ok(ExpectationsExitCode::OK)
    }
}
