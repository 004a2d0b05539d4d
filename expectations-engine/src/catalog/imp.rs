// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::deserialize::{DeserializedCatalog, DeserializedEntry};
use crate::{
    conditions::{ConditionConflict, ConditionSet},
    errors::{
        CatalogEntryError, CatalogParseError, CatalogParseErrorKind, InvalidRuleError,
        InvalidRuleErrorKind, RegisterError,
    },
    registry::RuleRegistry,
    resolve::ExpectationSet,
    rule::ExpectationRule,
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigError, File, FileFormat, Source};
use expectations_metadata::{BugId, Outcome};
use itertools::Itertools;
use smol_str::SmolStr;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Trait for handling catalog authoring warnings.
///
/// The default implementation, [`DefaultCatalogWarnings`], logs warnings. Other implementations
/// can collect them, for example in tests.
pub trait CatalogWarnings {
    /// Handle unknown keys found in a catalog file.
    fn unknown_catalog_keys(&mut self, catalog_file: &Utf8Path, unknown: &BTreeSet<String>);

    /// Handle an entry whose conditions can never be satisfied together.
    fn unsatisfiable_conditions(
        &mut self,
        catalog_file: &Utf8Path,
        index: usize,
        test: &str,
        conflicts: &[ConditionConflict],
    );
}

/// Default implementation of [`CatalogWarnings`] that logs warnings using the tracing crate.
pub struct DefaultCatalogWarnings;

impl CatalogWarnings for DefaultCatalogWarnings {
    fn unknown_catalog_keys(&mut self, catalog_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let unknown_str = if unknown.len() == 1 {
            // Print this on the same line.
            format!("key: {}", unknown.iter().join(""))
        } else {
            format!(
                "keys:\n{}",
                unknown.iter().map(|key| format!("\n  - {key}")).join("")
            )
        };

        warn!("in catalog {catalog_file}, ignoring unknown {unknown_str}");
    }

    fn unsatisfiable_conditions(
        &mut self,
        catalog_file: &Utf8Path,
        index: usize,
        test: &str,
        conflicts: &[ConditionConflict],
    ) {
        warn!(
            "in catalog {catalog_file}, entry {index} for `{test}` can never match: {}",
            conflicts.iter().join("; "),
        );
    }
}

/// A single validated catalog entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CatalogEntry {
    test: SmolStr,
    conditions: ConditionSet,
    outcome: Outcome,
    bug: Option<BugId>,
}

impl CatalogEntry {
    /// Returns the test this entry governs.
    pub fn test(&self) -> &str {
        &self.test
    }

    /// Returns the condition set.
    pub fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    /// Returns the outcome.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Returns the bug, if any.
    pub fn bug(&self) -> Option<BugId> {
        self.bug
    }

    fn from_deserialized(entry: DeserializedEntry) -> Result<Self, InvalidRuleError> {
        let test = SmolStr::from(entry.test);
        let invalid = |kind: InvalidRuleErrorKind| InvalidRuleError::new(test.clone(), kind);

        let outcome = entry
            .outcome
            .parse::<Outcome>()
            .map_err(|err| invalid(InvalidRuleErrorKind::InvalidOutcome(err)))?;
        let conditions = entry
            .conditions
            .iter()
            .map(|condition| condition.to_tag())
            .collect::<Result<ConditionSet, _>>()
            .map_err(invalid)?;
        ExpectationRule::validate(&test, &conditions)?;

        Ok(Self {
            test,
            conditions,
            outcome,
            bug: entry.bug.map(BugId::new),
        })
    }
}

/// A parsed and validated expectation catalog.
#[derive(Clone, Debug)]
pub struct ExpectationCatalog {
    catalog_file: Utf8PathBuf,
    entries: Vec<CatalogEntry>,
}

impl ExpectationCatalog {
    /// Reads a catalog from a file, logging warnings.
    pub fn from_path(catalog_file: impl Into<Utf8PathBuf>) -> Result<Self, CatalogParseError> {
        Self::from_path_with_warnings(catalog_file, &mut DefaultCatalogWarnings)
    }

    /// Reads a catalog from a file, reporting warnings to `warnings`.
    pub fn from_path_with_warnings(
        catalog_file: impl Into<Utf8PathBuf>,
        warnings: &mut impl CatalogWarnings,
    ) -> Result<Self, CatalogParseError> {
        let catalog_file = catalog_file.into();
        let source = File::new(catalog_file.as_str(), FileFormat::Toml).required(true);
        Self::from_source(catalog_file, source, warnings)
    }

    /// Parses a catalog from a string. `catalog_file` is used in errors and warnings.
    pub fn from_str_with_warnings(
        catalog_file: impl Into<Utf8PathBuf>,
        contents: &str,
        warnings: &mut impl CatalogWarnings,
    ) -> Result<Self, CatalogParseError> {
        Self::from_source(
            catalog_file.into(),
            File::from_str(contents, FileFormat::Toml),
            warnings,
        )
    }

    fn from_source<S>(
        catalog_file: Utf8PathBuf,
        source: S,
        warnings: &mut impl CatalogWarnings,
    ) -> Result<Self, CatalogParseError>
    where
        S: Source + Send + Sync + 'static,
    {
        let (deserialized, unknown) = Self::build_and_deserialize(source)
            .map_err(|kind| CatalogParseError::new(&catalog_file, kind))?;
        if !unknown.is_empty() {
            warnings.unknown_catalog_keys(&catalog_file, &unknown);
        }

        let mut entries = Vec::with_capacity(deserialized.expectations.len());
        let mut errors = Vec::new();
        for (index, entry) in deserialized.expectations.into_iter().enumerate() {
            match CatalogEntry::from_deserialized(entry) {
                Ok(entry) => {
                    let conflicts = entry.conditions.conflicts();
                    if !conflicts.is_empty() {
                        warnings.unsatisfiable_conditions(
                            &catalog_file,
                            index,
                            &entry.test,
                            &conflicts,
                        );
                    }
                    entries.push(entry);
                }
                Err(error) => errors.push(CatalogEntryError::new(index, error)),
            }
        }

        if !errors.is_empty() {
            return Err(CatalogParseError::new(
                catalog_file,
                CatalogParseErrorKind::InvalidRules(errors),
            ));
        }

        debug!(entries = entries.len(), "loaded catalog {catalog_file}");
        Ok(Self {
            catalog_file,
            entries,
        })
    }

    /// This returns a tuple of (catalog, ignored paths).
    fn build_and_deserialize<S>(
        source: S,
    ) -> Result<(DeserializedCatalog, BTreeSet<String>), CatalogParseErrorKind>
    where
        S: Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .add_source(source)
            .build()
            .map_err(|error| CatalogParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let catalog: DeserializedCatalog =
            serde_path_to_error::deserialize(ignored_de).map_err(|error| {
                // serde_path_to_error already reports the key, so drop it from the config error.
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                CatalogParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((catalog, ignored))
    }

    /// Returns the file this catalog was read from.
    pub fn catalog_file(&self) -> &Utf8Path {
        &self.catalog_file
    }

    /// Returns the entries in file order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Registers every entry into `registry`, in file order.
    ///
    /// Entries are validated when the catalog is read, so this only fails if the registry is
    /// frozen. In that case nothing is registered.
    pub fn register_into(&self, registry: &mut RuleRegistry) -> Result<(), CatalogParseError> {
        for (index, entry) in self.entries.iter().enumerate() {
            registry
                .register(
                    entry.test.clone(),
                    entry.conditions.clone(),
                    entry.outcome,
                    entry.bug,
                )
                .map_err(|error| {
                    let kind = match error {
                        RegisterError::InvalidRule(error) => CatalogParseErrorKind::InvalidRules(
                            vec![CatalogEntryError::new(index, error)],
                        ),
                        RegisterError::Frozen(error) => {
                            CatalogParseErrorKind::RegistryFrozen(error)
                        }
                    };
                    CatalogParseError::new(&self.catalog_file, kind)
                })?;
        }
        Ok(())
    }
}

/// Loads catalogs in order into a new registry, and freezes it.
pub fn load_catalogs<I>(
    catalog_files: I,
    warnings: &mut impl CatalogWarnings,
) -> Result<ExpectationSet, CatalogParseError>
where
    I: IntoIterator,
    I::Item: Into<Utf8PathBuf>,
{
    let mut registry = RuleRegistry::new();
    for catalog_file in catalog_files {
        ExpectationCatalog::from_path_with_warnings(catalog_file, warnings)?
            .register_into(&mut registry)?;
    }
    Ok(registry.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        environment::EnvironmentDescriptor,
        errors::TagParseError,
        tag::{GpuDevice, GpuVendor, OsVersion, Platform, Tag},
    };
    use camino_tempfile::tempdir;
    use camino_tempfile_ext::prelude::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct TestCatalogWarnings {
        unknown_keys: Vec<BTreeSet<String>>,
        unsatisfiable: Vec<(usize, String, Vec<ConditionConflict>)>,
    }

    impl CatalogWarnings for TestCatalogWarnings {
        fn unknown_catalog_keys(&mut self, _catalog_file: &Utf8Path, unknown: &BTreeSet<String>) {
            self.unknown_keys.push(unknown.clone());
        }

        fn unsatisfiable_conditions(
            &mut self,
            _catalog_file: &Utf8Path,
            index: usize,
            test: &str,
            conflicts: &[ConditionConflict],
        ) {
            self.unsatisfiable
                .push((index, test.to_owned(), conflicts.to_vec()));
        }
    }

    fn fixture_path() -> Utf8PathBuf {
        Utf8Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures/webgl-conformance.toml")
    }

    #[test]
    fn parse_basic() {
        let contents = indoc! {r#"
            [[expectations]]
            test = "conformance/textures/texture-size.html"
            outcome = "fail"
            conditions = ["win", "intel"]
            bug = 121139

            [[expectations]]
            test = "conformance/more/functions/copyTexImage2D.html"
            outcome = "flaky"
            conditions = ["mac", { vendor = "nvidia", device = 0x0fe9 }, "amd:4660"]
        "#};

        let mut warnings = TestCatalogWarnings::default();
        let catalog =
            ExpectationCatalog::from_str_with_warnings("catalog.toml", contents, &mut warnings)
                .expect("catalog is valid");
        assert_eq!(catalog.entries().len(), 2);

        let first = &catalog.entries()[0];
        assert_eq!(first.test(), "conformance/textures/texture-size.html");
        assert_eq!(first.outcome(), Outcome::Fail);
        assert_eq!(first.bug(), Some(BugId::new(121139)));
        assert_eq!(
            first.conditions(),
            &ConditionSet::from([
                Tag::Platform(Platform::Win),
                Tag::GpuVendor(GpuVendor::Intel)
            ])
        );

        let second = &catalog.entries()[1];
        assert_eq!(second.outcome(), Outcome::Flaky);
        assert_eq!(second.bug(), None);
        assert_eq!(
            second.conditions(),
            &ConditionSet::from([
                Tag::Platform(Platform::Mac),
                Tag::GpuDevice(GpuDevice::new(GpuVendor::Nvidia, 0x0fe9)),
                Tag::GpuDevice(GpuDevice::new(GpuVendor::Amd, 0x1234)),
            ])
        );

        // Two different devices can never match together.
        assert_eq!(warnings.unsatisfiable.len(), 1);
        assert_eq!(warnings.unsatisfiable[0].0, 1);
        assert!(warnings.unknown_keys.is_empty());
    }

    #[test]
    fn unknown_keys_are_reported() {
        let contents = indoc! {r#"
            [[expectations]]
            test = "a.html"
            outcome = "skip"
            conditions = ["linux"]
            reason = "hangs"
        "#};

        let mut warnings = TestCatalogWarnings::default();
        let catalog =
            ExpectationCatalog::from_str_with_warnings("catalog.toml", contents, &mut warnings)
                .expect("unknown keys are not an error");
        assert_eq!(catalog.entries().len(), 1);
        assert_eq!(warnings.unknown_keys.len(), 1);
        assert!(
            warnings.unknown_keys[0]
                .iter()
                .any(|key| key.ends_with("reason")),
            "unknown keys: {:?}",
            warnings.unknown_keys[0]
        );
    }

    #[test]
    fn invalid_entries_are_collected() {
        let contents = indoc! {r#"
            [[expectations]]
            test = "ok.html"
            outcome = "fail"
            conditions = ["win"]

            [[expectations]]
            test = "bad-outcome.html"
            outcome = "crash"
            conditions = ["win"]

            [[expectations]]
            test = "bad-tag.html"
            outcome = "fail"
            conditions = ["beos"]

            [[expectations]]
            test = "orphan.html"
            outcome = "fail"
            conditions = ["0x1234"]

            [[expectations]]
            test = "empty.html"
            outcome = "fail"
            conditions = []

            [[expectations]]
            test = "mismatch.html"
            outcome = "fail"
            conditions = ["amd", { vendor = "nvidia", device = 0x1234 }]

            [[expectations]]
            test = "bare-device.html"
            outcome = "fail"
            conditions = ["mac", 0x1234]
        "#};

        let err = ExpectationCatalog::from_str_with_warnings(
            "catalog.toml",
            contents,
            &mut TestCatalogWarnings::default(),
        )
        .unwrap_err();
        assert_eq!(err.catalog_file().as_str(), "catalog.toml");
        let CatalogParseErrorKind::InvalidRules(errors) = err.kind() else {
            panic!("expected InvalidRules, found {:?}", err.kind());
        };

        let summary: Vec<_> = errors
            .iter()
            .map(|error| (error.index(), error.error().test().to_owned()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, "bad-outcome.html".to_owned()),
                (2, "bad-tag.html".to_owned()),
                (3, "orphan.html".to_owned()),
                (4, "empty.html".to_owned()),
                (5, "mismatch.html".to_owned()),
                (6, "bare-device.html".to_owned()),
            ]
        );

        assert!(matches!(
            errors[0].error().kind(),
            InvalidRuleErrorKind::InvalidOutcome(_)
        ));
        assert!(matches!(
            errors[2].error().kind(),
            InvalidRuleErrorKind::InvalidTag(TagParseError::OrphanDevice { .. })
        ));
        assert_eq!(
            errors[3].error().kind(),
            &InvalidRuleErrorKind::EmptyConditions
        );
        assert!(matches!(
            errors[4].error().kind(),
            InvalidRuleErrorKind::DeviceVendorMismatch { .. }
        ));
        assert_eq!(
            errors[5].error().kind(),
            &InvalidRuleErrorKind::InvalidTag(TagParseError::OrphanDevice {
                input: "0x1234".to_owned(),
            })
        );
    }

    #[test]
    fn deserialize_error_has_path() {
        let contents = indoc! {r#"
            [[expectations]]
            test = "a.html"
            outcome = "fail"
            conditions = [{ device = "not-a-number", vendor = "amd" }]
        "#};

        let err = ExpectationCatalog::from_str_with_warnings(
            "catalog.toml",
            contents,
            &mut TestCatalogWarnings::default(),
        )
        .unwrap_err();
        let CatalogParseErrorKind::DeserializeError(error) = err.kind() else {
            panic!("expected DeserializeError, found {:?}", err.kind());
        };
        assert!(
            error.path().to_string().starts_with("expectations"),
            "path: {}",
            error.path()
        );
    }

    #[test]
    fn missing_file_is_build_error() {
        let dir = tempdir().unwrap();
        let err = ExpectationCatalog::from_path(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err.kind(), CatalogParseErrorKind::BuildError(_)));
    }

    #[test]
    fn later_catalogs_win_ties() {
        let dir = tempdir().unwrap();
        let base = dir.child("base.toml");
        base.write_str(indoc! {r#"
            [[expectations]]
            test = "a.html"
            outcome = "fail"
            conditions = ["linux"]
            bug = 1
        "#})
        .unwrap();
        let local = dir.child("local.toml");
        local
            .write_str(indoc! {r#"
                [[expectations]]
                test = "a.html"
                outcome = "skip"
                conditions = ["linux"]
                bug = 2
            "#})
            .unwrap();

        let set = load_catalogs(
            [base.to_path_buf(), local.to_path_buf()],
            &mut TestCatalogWarnings::default(),
        )
        .unwrap();
        let env = EnvironmentDescriptor::new(Platform::Linux, GpuVendor::Amd);
        let resolution = set.resolve("a.html", &env);
        assert_eq!(resolution.outcome(), Outcome::Skip);
        assert_eq!(resolution.bug(), Some(BugId::new(2)));
    }

    #[test]
    fn register_into_frozen_registry() {
        let catalog = ExpectationCatalog::from_str_with_warnings(
            "catalog.toml",
            indoc! {r#"
                [[expectations]]
                test = "a.html"
                outcome = "fail"
                conditions = ["linux"]
            "#},
            &mut TestCatalogWarnings::default(),
        )
        .unwrap();

        let mut registry = RuleRegistry::new();
        registry.freeze();
        let err = catalog.register_into(&mut registry).unwrap_err();
        assert!(matches!(
            err.kind(),
            CatalogParseErrorKind::RegistryFrozen(_)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn webgl_conformance_fixture() {
        let mut warnings = TestCatalogWarnings::default();
        let set = load_catalogs([fixture_path()], &mut warnings).expect("fixture is valid");
        assert_eq!(set.len(), 42);
        assert!(warnings.unknown_keys.is_empty());
        assert!(warnings.unsatisfiable.is_empty());

        let win7_intel = EnvironmentDescriptor::new(Platform::Win, GpuVendor::Intel)
            .with_os_version(OsVersion::Win7)
            .unwrap();
        let lion_intel = EnvironmentDescriptor::new(Platform::Mac, GpuVendor::Intel)
            .with_os_version(OsVersion::Lion)
            .unwrap();
        let linux_nvidia = EnvironmentDescriptor::new(Platform::Linux, GpuVendor::Nvidia);

        let texture_size = "conformance/textures/texture-size.html";
        let resolution = set.resolve(texture_size, &win7_intel);
        assert_eq!(
            (resolution.outcome(), resolution.bug()),
            (Outcome::Fail, Some(BugId::new(121139)))
        );
        let resolution = set.resolve(texture_size, &lion_intel);
        assert_eq!(
            (resolution.outcome(), resolution.bug()),
            (Outcome::Fail, Some(BugId::new(225642)))
        );
        assert!(set.resolve(texture_size, &linux_nvidia).is_default());

        let drawingbuffer = "conformance/canvas/drawingbuffer-test.html";
        let resolution = set.resolve(drawingbuffer, &lion_intel);
        assert_eq!(
            (resolution.outcome(), resolution.bug()),
            (Outcome::Skip, Some(BugId::new(303915)))
        );

        // `[mac, intel]` and `[lion, intel]` are equally specific; the later entry wins.
        let max_dimensions = "conformance/limits/gl-max-texture-dimensions.html";
        let resolution = set.resolve(max_dimensions, &lion_intel);
        assert_eq!(resolution.outcome(), Outcome::Skip);
        assert_eq!(resolution.bug(), None);
        let matching: Vec<_> = set
            .matching_rules(max_dimensions, &lion_intel)
            .into_iter()
            .map(ExpectationRule::outcome)
            .collect();
        assert_eq!(matching, vec![Outcome::Skip, Outcome::Fail]);
        assert_eq!(
            set.resolve(max_dimensions, &win7_intel).outcome(),
            Outcome::Fail
        );

        let android = EnvironmentDescriptor::new(Platform::Android, GpuVendor::Amd);
        let resolution = set.resolve("conformance/textures/texture-npot-video.html", &android);
        assert_eq!(
            (resolution.outcome(), resolution.bug()),
            (Outcome::Fail, Some(BugId::new(306485)))
        );
    }
}
