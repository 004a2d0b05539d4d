// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests for argument parsing and command execution.

use super::app::ExpectationsApp;
use crate::{
    ExpectedError,
    output::{Color, OutputContext, OutputWriter},
};
use camino_tempfile::tempdir;
use camino_tempfile_ext::prelude::*;
use clap::Parser;
use expectations_metadata::{
    BugId, ExpectationsExitCode, Outcome, ResolutionReport, RuleSummary,
};
use indoc::indoc;
use pretty_assertions::assert_eq;

const FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../fixtures/webgl-conformance.toml"
);

/// Runs a command line against the webgl fixture, capturing stdout.
///
/// `{catalog}` in `cmd` is replaced with the fixture path.
fn run(cmd: &str) -> (Result<i32, ExpectedError>, String) {
    run_with(cmd, &[("catalog", FIXTURE)], false)
}

fn run_with(
    cmd: &str,
    replacements: &[(&str, &str)],
    verbose: bool,
) -> (Result<i32, ExpectedError>, String) {
    let mut args = shell_words::split(cmd).expect("valid command line");
    for arg in &mut args {
        for (key, value) in replacements {
            *arg = arg.replace(&format!("{{{key}}}"), value);
        }
    }

    let app = ExpectationsApp::try_parse_from(args).expect("command line parses");
    let output = OutputContext {
        verbose,
        color: Color::Never,
    };
    let mut output_writer = OutputWriter::Test { stdout: Vec::new() };
    let res = app.exec(output, &mut output_writer);

    let OutputWriter::Test { stdout } = output_writer else {
        unreachable!("test writer was constructed above");
    };
    (res, String::from_utf8(stdout).expect("stdout is UTF-8"))
}

#[test]
fn test_argument_parsing() {
    use clap::error::ErrorKind::{self, *};

    let valid: &[&'static str] = &[
        // ---
        // Resolve
        // ---
        "expectations resolve --catalog a.toml --platform win --gpu-vendor intel t.html",
        "expectations resolve --catalog a.toml --catalog b.toml --platform win --gpu-vendor intel",
        "expectations resolve --catalog a.toml,b.toml --platform win --gpu-vendor intel",
        "expectations r --catalog a.toml --platform mac --os-version lion --gpu-vendor intel",
        "expectations resolve --catalog a.toml --platform win --gpu-vendor nvidia --gpu-device 0x0fe9",
        "expectations resolve --catalog a.toml --platform win --gpu-vendor intel --test-list t.txt",
        "expectations resolve --catalog a.toml --platform win --gpu-vendor intel --unknown-tests error",
        "expectations resolve --catalog a.toml --platform win --gpu-vendor intel --message-format json",
        "expectations resolve --catalog a.toml --platform win --gpu-vendor intel -T json-pretty",
        "expectations resolve --catalog a.toml --platform win --gpu-vendor intel --explain a b c",
        // ---
        // List and check
        // ---
        "expectations list --catalog a.toml",
        "expectations l --catalog a.toml --message-format json",
        "expectations check --catalog a.toml --deny-warnings",
        // ---
        // Global options
        // ---
        "expectations --color never list --catalog a.toml",
        "expectations list --catalog a.toml --color always -v",
    ];

    let invalid: &[(&'static str, ErrorKind)] = &[
        ("expectations", DisplayHelpOnMissingArgumentOrSubcommand),
        ("expectations list", MissingRequiredArgument),
        (
            "expectations resolve --catalog a.toml --gpu-vendor intel",
            MissingRequiredArgument,
        ),
        (
            "expectations resolve --catalog a.toml --platform win",
            MissingRequiredArgument,
        ),
        (
            "expectations resolve --catalog a.toml --platform win --gpu-vendor intel --unknown-tests fail",
            ValueValidation,
        ),
        (
            "expectations list --catalog a.toml --message-format yaml",
            InvalidValue,
        ),
        ("expectations --color sometimes list --catalog a.toml", InvalidValue),
        ("expectations check --catalog a.toml --explain", UnknownArgument),
    ];

    for valid_args in valid {
        let cmd = shell_words::split(valid_args).expect("valid command line");
        if let Err(error) = ExpectationsApp::try_parse_from(cmd) {
            panic!("{valid_args} should have successfully parsed, but didn't: {error}");
        }
    }

    for &(invalid_args, kind) in invalid {
        match ExpectationsApp::try_parse_from(
            shell_words::split(invalid_args).expect("valid command"),
        ) {
            Ok(_) => {
                panic!("{invalid_args} should have errored out but successfully parsed");
            }
            Err(error) => {
                let actual_kind = error.kind();
                if kind != actual_kind {
                    panic!(
                        "{invalid_args} should error with {kind:?}, but errored with {actual_kind:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn resolve_human() {
    let (res, stdout) = run(
        "expectations resolve --catalog {catalog} --platform win --os-version win7 \
         --gpu-vendor intel conformance/textures/texture-size.html \
         conformance/limits/gl-max-texture-dimensions.html not/in/catalog.html",
    );
    assert_eq!(res.expect("resolve succeeds"), ExpectationsExitCode::OK);
    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        vec![
            "   fail conformance/textures/texture-size.html (bug 121139)",
            "   fail conformance/limits/gl-max-texture-dimensions.html",
            "   pass not/in/catalog.html",
        ]
    );
}

#[test]
fn resolve_explain_shows_precedence() {
    let (res, stdout) = run(
        "expectations resolve --catalog {catalog} --platform mac --os-version lion \
         --gpu-vendor intel --explain conformance/limits/gl-max-texture-dimensions.html \
         not/in/catalog.html",
    );
    res.expect("resolve succeeds");
    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        vec![
            "   skip conformance/limits/gl-max-texture-dimensions.html",
            "      * #39 skip [lion, intel] specificity 2",
            "        #30 fail [mac, intel] specificity 2",
            "   pass not/in/catalog.html",
            "        no matching rules, default outcome applies",
        ]
    );
}

#[test]
fn resolve_verbose_prints_environment() {
    let (res, stdout) = run_with(
        "expectations resolve --catalog {catalog} --platform android --gpu-vendor amd \
         conformance/textures/texture-npot-video.html",
        &[("catalog", FIXTURE)],
        true,
    );
    res.expect("resolve succeeds");
    assert_eq!(
        stdout,
        indoc! {"
            environment: android, amd
               fail conformance/textures/texture-npot-video.html (bug 306485)
        "}
    );
}

#[test]
fn resolve_json() {
    let (res, stdout) = run(
        "expectations resolve --catalog {catalog} --platform mac --os-version lion \
         --gpu-vendor intel --gpu-device 0x0166 --message-format json \
         conformance/canvas/drawingbuffer-test.html conformance/textures/texture-size.html",
    );
    res.expect("resolve succeeds");

    let report = ResolutionReport::parse_json(&stdout).expect("valid JSON report");
    assert_eq!(report.environment.platform, "mac");
    assert_eq!(report.environment.os_version.as_deref(), Some("lion"));
    assert_eq!(report.environment.gpu_device_id, Some(0x0166));

    let outcomes: Vec<_> = report
        .resolutions
        .iter()
        .map(|resolution| (resolution.test.as_str(), resolution.outcome, resolution.bug))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            (
                "conformance/canvas/drawingbuffer-test.html",
                Outcome::Skip,
                Some(BugId::new(303915))
            ),
            (
                "conformance/textures/texture-size.html",
                Outcome::Fail,
                Some(BugId::new(225642))
            ),
        ]
    );
    let rule = report.resolutions[0]
        .rule
        .as_ref()
        .expect("drawingbuffer has a winning rule");
    assert_eq!(rule.conditions, vec!["mac", "intel"]);
}

#[test]
fn resolve_unknown_tests() {
    let dir = tempdir().unwrap();
    let test_list = dir.child("tests.txt");
    test_list
        .write_str(indoc! {"
            # every test in the suite
            conformance/misc/known.html
        "})
        .unwrap();

    let base = "expectations resolve --catalog {catalog} --platform linux --gpu-vendor nvidia \
                --test-list {test_list} --unknown-tests error";
    let test_list = test_list.to_path_buf();
    let replacements = [("catalog", FIXTURE), ("test_list", test_list.as_str())];

    let (res, stdout) = run_with(
        &format!("{base} conformance/misc/known.html conformance/textures/texture-size.html"),
        &replacements,
        false,
    );
    res.expect("known tests resolve");
    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        vec![
            "   pass conformance/misc/known.html",
            "   pass conformance/textures/texture-size.html",
        ]
    );

    let (res, stdout) = run_with(
        &format!("{base} conformance/misc/unknown.html"),
        &replacements,
        false,
    );
    let error = res.expect_err("unknown test is an error");
    assert!(
        matches!(&error, ExpectedError::UnknownTest { err } if err.test() == "conformance/misc/unknown.html"),
        "unexpected error: {error:?}"
    );
    assert_eq!(error.process_exit_code(), ExpectationsExitCode::UNKNOWN_TEST);
    assert_eq!(stdout, "", "nothing is printed on error");

    // Without tests on the command line, every test in the list is resolved.
    let (res, stdout) = run_with(base, &replacements, false);
    res.expect("listed tests resolve");
    assert_eq!(stdout, "   pass conformance/misc/known.html\n");
}

#[test]
fn resolve_setup_errors() {
    let (res, _) = run(
        "expectations resolve --catalog {catalog} --platform linux --os-version lion \
         --gpu-vendor intel a.html",
    );
    let error = res.expect_err("lion is not a linux release");
    assert!(matches!(error, ExpectedError::EnvironmentError { .. }));
    assert_eq!(error.process_exit_code(), ExpectationsExitCode::SETUP_ERROR);

    let (res, _) = run(
        "expectations resolve --catalog {catalog} --platform linux --gpu-vendor intel \
         --test-list /nonexistent/tests.txt a.html",
    );
    let error = res.expect_err("missing test list");
    assert!(matches!(error, ExpectedError::TestListReadError { .. }));
    assert_eq!(error.process_exit_code(), ExpectationsExitCode::SETUP_ERROR);

    let (res, _) = run(
        "expectations resolve --catalog /nonexistent/catalog.toml --platform linux \
         --gpu-vendor intel a.html",
    );
    let error = res.expect_err("missing catalog");
    assert!(matches!(error, ExpectedError::CatalogParseError { .. }));
    assert_eq!(error.process_exit_code(), ExpectationsExitCode::CATALOG_INVALID);
}

#[test]
fn list_human_and_json() {
    let (res, stdout) = run("expectations list --catalog {catalog}");
    res.expect("list succeeds");
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 42);
    assert_eq!(
        lines[0],
        "   #0    fail conformance/textures/texture-size.html [win, intel] (bug 121139) specificity 2"
    );

    let (res, stdout) = run("expectations list --catalog {catalog} --message-format json");
    res.expect("list succeeds");
    let summaries: Vec<RuleSummary> = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(summaries.len(), 42);
    assert!(
        summaries
            .iter()
            .enumerate()
            .all(|(index, summary)| summary.sequence == index),
        "rules are listed in registration order"
    );
    assert_eq!(summaries[41].bug, Some(BugId::new(306485)));
}

#[test]
fn check_catalogs() {
    let (res, stdout) = run("expectations check --catalog {catalog}");
    res.expect("fixture is valid");
    assert!(
        stdout.starts_with("1 catalogs valid: 42 expectations across "),
        "stdout: {stdout}"
    );

    let dir = tempdir().unwrap();
    let catalog = dir.child("warnings.toml");
    catalog
        .write_str(indoc! {r#"
            [[expectations]]
            test = "a.html"
            outcome = "fail"
            conditions = ["win", "mac"]
            owner = "gpu-team"
        "#})
        .unwrap();
    let catalog = catalog.to_path_buf();
    let replacements = [("catalog", catalog.as_str())];

    let (res, _) = run_with("expectations check --catalog {catalog}", &replacements, false);
    res.expect("warnings are allowed by default");

    let (res, stdout) = run_with(
        "expectations check --catalog {catalog} --deny-warnings",
        &replacements,
        false,
    );
    let error = res.expect_err("warnings are denied");
    assert!(
        matches!(error, ExpectedError::CatalogWarningsDenied { count: 2 }),
        "unknown key and unsatisfiable conditions: {error:?}"
    );
    assert_eq!(error.process_exit_code(), ExpectationsExitCode::CATALOG_INVALID);
    assert_eq!(stdout, "");
}

#[test]
fn check_invalid_catalog() {
    let dir = tempdir().unwrap();
    let catalog = dir.child("invalid.toml");
    catalog
        .write_str(indoc! {r#"
            [[expectations]]
            test = "a.html"
            outcome = "crash"
            conditions = ["win"]
        "#})
        .unwrap();
    let catalog = catalog.to_path_buf();

    let (res, stdout) = run_with(
        "expectations check --catalog {catalog}",
        &[("catalog", catalog.as_str())],
        false,
    );
    let error = res.expect_err("invalid outcome");
    let ExpectedError::CatalogParseError { err } = &error else {
        panic!("expected CatalogParseError, found {error:?}");
    };
    assert_eq!(err.catalog_file(), &catalog);
    assert_eq!(error.process_exit_code(), ExpectationsExitCode::CATALOG_INVALID);
    assert_eq!(stdout, "");
}

#[test]
fn comma_separated_catalogs() {
    let (res, stdout) = run("expectations list --catalog {catalog} -T json");
    res.expect("list succeeds");
    let single: Vec<RuleSummary> = serde_json::from_str(&stdout).expect("valid JSON");

    let (res, stdout) = run("expectations list --catalog {catalog},{catalog} -T json");
    res.expect("list succeeds");
    let doubled: Vec<RuleSummary> = serde_json::from_str(&stdout).expect("valid JSON");

    assert_eq!(doubled.len(), 2 * single.len());
    assert_eq!(doubled[single.len()].test, single[0].test);
}
