// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registration of expectation rules.
//!
//! Rules are registered once, during a single-threaded setup phase. The registry is then frozen
//! into an [`ExpectationSet`], which is immutable and can be queried from any number of threads.
//!
//! ```
//! use expectations_engine::{
//!     errors::RegisterError,
//!     registry::RuleRegistry,
//!     tag::{GpuVendor, Platform, Tag},
//! };
//! use expectations_metadata::BugId;
//!
//! let expectations = RuleRegistry::build(|registry| {
//!     registry.fail(
//!         "conformance/textures/texture-size.html",
//!         [Tag::Platform(Platform::Win), Tag::GpuVendor(GpuVendor::Intel)],
//!         Some(BugId::new(121139)),
//!     )?;
//!     Ok::<_, RegisterError>(())
//! })
//! .unwrap();
//! assert_eq!(expectations.len(), 1);
//! ```

use crate::{
    conditions::ConditionSet,
    errors::{RegisterError, RegistryFrozenError},
    resolve::{ExpectationSet, RuleIndex},
    rule::ExpectationRule,
};
use expectations_metadata::{BugId, Outcome};
use itertools::Itertools;
use smol_str::SmolStr;
use tracing::debug;

/// Accumulates expectation rules during setup.
///
/// Each successful registration is assigned the next sequence number. Once
/// [`freeze`](Self::freeze) is called, further registrations fail with
/// [`RegistryFrozenError`].
#[derive(Debug, Default)]
pub struct RuleRegistry {
    state: RegistryState,
}

#[derive(Debug)]
enum RegistryState {
    Open(RuleIndex),
    Frozen(ExpectationSet),
}

impl Default for RegistryState {
    fn default() -> Self {
        RegistryState::Open(RuleIndex::default())
    }
}

impl RuleRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `setup` against a new registry, then freezes it.
    ///
    /// This is the expected way to populate expectations: the caller owns the registry for the
    /// duration of setup, and receives only the immutable view afterwards.
    pub fn build<E>(
        setup: impl FnOnce(&mut RuleRegistry) -> Result<(), E>,
    ) -> Result<ExpectationSet, E> {
        let mut registry = Self::new();
        setup(&mut registry)?;
        Ok(registry.freeze())
    }

    /// Registers a rule, returning its sequence number.
    ///
    /// Fails if the rule is malformed or the registry is frozen. A failed registration leaves
    /// the registry unchanged.
    pub fn register(
        &mut self,
        test: impl Into<SmolStr>,
        conditions: impl Into<ConditionSet>,
        outcome: Outcome,
        bug: Option<BugId>,
    ) -> Result<usize, RegisterError> {
        let test = test.into();
        let conditions = conditions.into();

        let index = match &mut self.state {
            RegistryState::Open(index) => index,
            RegistryState::Frozen(set) => {
                return Err(RegistryFrozenError::new(test, set.len()).into());
            }
        };

        ExpectationRule::validate(&test, &conditions)?;

        let sequence = index.len();
        let conflicts = conditions.conflicts();
        if !conflicts.is_empty() {
            debug!(
                "expectation #{sequence} for `{test}` can never match: {}",
                conflicts.iter().join("; "),
            );
        }
        debug!(sequence, %test, %conditions, %outcome, "registered expectation");

        index.push(ExpectationRule::new(test, conditions, outcome, bug, sequence));
        Ok(sequence)
    }

    /// Registers a rule with outcome [`Outcome::Fail`].
    pub fn fail(
        &mut self,
        test: impl Into<SmolStr>,
        conditions: impl Into<ConditionSet>,
        bug: Option<BugId>,
    ) -> Result<usize, RegisterError> {
        self.register(test, conditions, Outcome::Fail, bug)
    }

    /// Registers a rule with outcome [`Outcome::Skip`].
    pub fn skip(
        &mut self,
        test: impl Into<SmolStr>,
        conditions: impl Into<ConditionSet>,
        bug: Option<BugId>,
    ) -> Result<usize, RegisterError> {
        self.register(test, conditions, Outcome::Skip, bug)
    }

    /// Registers a rule with outcome [`Outcome::Flaky`].
    pub fn flaky(
        &mut self,
        test: impl Into<SmolStr>,
        conditions: impl Into<ConditionSet>,
        bug: Option<BugId>,
    ) -> Result<usize, RegisterError> {
        self.register(test, conditions, Outcome::Flaky, bug)
    }

    /// Registers a rule with outcome [`Outcome::Timeout`].
    pub fn timeout(
        &mut self,
        test: impl Into<SmolStr>,
        conditions: impl Into<ConditionSet>,
        bug: Option<BugId>,
    ) -> Result<usize, RegisterError> {
        self.register(test, conditions, Outcome::Timeout, bug)
    }

    /// Returns the number of rules registered so far.
    pub fn len(&self) -> usize {
        match &self.state {
            RegistryState::Open(index) => index.len(),
            RegistryState::Frozen(set) => set.len(),
        }
    }

    /// Returns true if no rules have been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the registry has been frozen.
    pub fn is_frozen(&self) -> bool {
        matches!(self.state, RegistryState::Frozen(_))
    }

    /// Freezes the registry, returning the immutable view of its rules.
    ///
    /// Freezing an already-frozen registry returns the same view.
    pub fn freeze(&mut self) -> ExpectationSet {
        match &mut self.state {
            RegistryState::Open(index) => {
                let set = ExpectationSet::new(std::mem::take(index));
                debug!(
                    rules = set.len(),
                    tests = set.tests().count(),
                    "froze expectation registry"
                );
                self.state = RegistryState::Frozen(set.clone());
                set
            }
            RegistryState::Frozen(set) => set.clone(),
        }
    }
}
