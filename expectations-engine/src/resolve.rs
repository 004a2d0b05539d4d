// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolving the expected outcome of a test in an environment.
//!
//! Resolution considers every rule registered for the test whose condition set the environment
//! satisfies. The winner is the rule with the most distinct tags; among equally specific rules,
//! the one registered last wins. If no rule matches, the outcome is [`Outcome::Pass`].

use crate::{
    environment::EnvironmentDescriptor,
    errors::UnknownTestError,
    rule::{ExpectationRule, UnsatisfiableRule},
    test_catalog::{TestCatalog, UnknownTestPolicy},
};
use expectations_metadata::{BugId, Outcome, ResolutionSummary};
use indexmap::IndexMap;
use smol_str::SmolStr;
use std::{cmp::Reverse, sync::Arc};
use tracing::trace;

/// Rules in registration order, indexed by test.
#[derive(Clone, Debug, Default)]
pub(crate) struct RuleIndex {
    rules: Vec<ExpectationRule>,
    by_test: IndexMap<SmolStr, Vec<usize>>,
}

impl RuleIndex {
    pub(crate) fn len(&self) -> usize {
        self.rules.len()
    }

    /// Appends a rule. The rule's sequence number must equal its position.
    pub(crate) fn push(&mut self, rule: ExpectationRule) {
        debug_assert_eq!(rule.sequence(), self.rules.len());
        self.by_test
            .entry(rule.test().into())
            .or_default()
            .push(self.rules.len());
        self.rules.push(rule);
    }
}

/// The frozen, immutable set of expectation rules.
///
/// Produced by [`RuleRegistry::freeze`](crate::registry::RuleRegistry::freeze). Cloning is cheap,
/// and an `ExpectationSet` can be shared across threads and queried concurrently.
#[derive(Clone, Debug)]
pub struct ExpectationSet {
    inner: Arc<RuleIndex>,
}

impl ExpectationSet {
    pub(crate) fn new(index: RuleIndex) -> Self {
        Self {
            inner: Arc::new(index),
        }
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.inner.rules.len()
    }

    /// Returns true if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.inner.rules.is_empty()
    }

    /// Iterates over all rules in registration order.
    pub fn rules(&self) -> impl ExactSizeIterator<Item = &ExpectationRule> + '_ {
        self.inner.rules.iter()
    }

    /// Iterates over the rules registered for a test, in registration order.
    pub fn rules_for<'a>(
        &'a self,
        test: &str,
    ) -> impl Iterator<Item = &'a ExpectationRule> + use<'a> {
        self.inner
            .by_test
            .get(test)
            .into_iter()
            .flatten()
            .map(|&idx| &self.inner.rules[idx])
    }

    /// Iterates over the tests that have at least one rule, in order of first registration.
    pub fn tests(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.inner.by_test.keys().map(SmolStr::as_str)
    }

    /// Returns true if at least one rule is registered for this test.
    pub fn contains_test(&self, test: &str) -> bool {
        self.inner.by_test.contains_key(test)
    }

    /// Resolves the expected outcome of a test in an environment.
    ///
    /// Resolution is total: a test with no matching rule resolves to [`Outcome::Pass`].
    pub fn resolve(&self, test: &str, env: &EnvironmentDescriptor) -> Resolution<'_> {
        let winner = self
            .rules_for(test)
            .filter(|rule| rule.matches(env))
            .max_by_key(|rule| rule.precedence());

        match winner {
            Some(rule) => {
                trace!(test, %env, rule = %rule, "resolved expectation");
                Resolution {
                    outcome: rule.outcome(),
                    source: ResolutionSource::Rule(rule),
                }
            }
            None => {
                trace!(test, %env, "no matching expectation, using default");
                Resolution::default()
            }
        }
    }

    /// Resolves a test, applying `policy` to tests that are unknown to both the test catalog and
    /// the registered rules.
    pub fn resolve_checked(
        &self,
        catalog: &TestCatalog,
        policy: UnknownTestPolicy,
        test: &str,
        env: &EnvironmentDescriptor,
    ) -> Result<Resolution<'_>, UnknownTestError> {
        if policy == UnknownTestPolicy::Error
            && !catalog.contains(test)
            && !self.contains_test(test)
        {
            return Err(UnknownTestError::new(test));
        }
        Ok(self.resolve(test, env))
    }

    /// Returns every rule for the test that matches the environment, highest precedence first.
    ///
    /// The first element, if any, is the rule [`resolve`](Self::resolve) selects.
    pub fn matching_rules(&self, test: &str, env: &EnvironmentDescriptor) -> Vec<&ExpectationRule> {
        let mut rules: Vec<_> = self
            .rules_for(test)
            .filter(|rule| rule.matches(env))
            .collect();
        rules.sort_by_key(|rule| Reverse(rule.precedence()));
        rules
    }

    /// Returns rules whose condition sets can never match any valid environment.
    pub fn unsatisfiable_rules(&self) -> impl Iterator<Item = UnsatisfiableRule<'_>> + '_ {
        self.inner.rules.iter().filter_map(|rule| {
            let conflicts = rule.conditions().conflicts();
            (!conflicts.is_empty()).then_some(UnsatisfiableRule { rule, conflicts })
        })
    }
}

/// The result of resolving a test.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Resolution<'a> {
    outcome: Outcome,
    source: ResolutionSource<'a>,
}

impl<'a> Resolution<'a> {
    /// Returns the resolved outcome.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Returns the bug attached to the winning rule, if any.
    pub fn bug(&self) -> Option<BugId> {
        self.rule().and_then(|rule| rule.bug())
    }

    /// Returns where the outcome came from.
    pub fn source(&self) -> ResolutionSource<'a> {
        self.source
    }

    /// Returns the winning rule, or `None` if the default outcome applies.
    pub fn rule(&self) -> Option<&'a ExpectationRule> {
        match self.source {
            ResolutionSource::Default => None,
            ResolutionSource::Rule(rule) => Some(rule),
        }
    }

    /// Returns true if no rule matched.
    pub fn is_default(&self) -> bool {
        matches!(self.source, ResolutionSource::Default)
    }

    /// Returns a serializable summary of this resolution.
    pub fn to_summary(&self, test: &str) -> ResolutionSummary {
        ResolutionSummary {
            test: test.into(),
            outcome: self.outcome,
            bug: self.bug(),
            rule: self.rule().map(ExpectationRule::to_summary),
        }
    }
}

/// Where a [`Resolution`]'s outcome came from.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ResolutionSource<'a> {
    /// No rule matched.
    #[default]
    Default,

    /// This rule won.
    Rule(&'a ExpectationRule),
}
