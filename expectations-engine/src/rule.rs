// Copyright (c) The expectations Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registered expectation rules and their precedence.

use crate::{
    conditions::{ConditionConflict, ConditionSet},
    environment::EnvironmentDescriptor,
    errors::{InvalidRuleError, InvalidRuleErrorKind},
};
use expectations_metadata::{BugId, Outcome, RuleSummary};
use itertools::Itertools;
use smol_str::SmolStr;
use std::fmt;

/// A registered expectation: under these conditions, this test has this outcome.
///
/// Rules are immutable once registered. They are created by
/// [`RuleRegistry`](crate::registry::RuleRegistry).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExpectationRule {
    test: SmolStr,
    conditions: ConditionSet,
    outcome: Outcome,
    bug: Option<BugId>,
    sequence: usize,
}

impl ExpectationRule {
    pub(crate) fn new(
        test: SmolStr,
        conditions: ConditionSet,
        outcome: Outcome,
        bug: Option<BugId>,
        sequence: usize,
    ) -> Self {
        Self {
            test,
            conditions,
            outcome,
            bug,
            sequence,
        }
    }

    /// Checks that a rule for `test` with these conditions is well formed.
    pub(crate) fn validate(test: &str, conditions: &ConditionSet) -> Result<(), InvalidRuleError> {
        if test.trim().is_empty() {
            return Err(InvalidRuleError::new(
                test,
                InvalidRuleErrorKind::EmptyTestPattern,
            ));
        }
        conditions
            .validate()
            .map_err(|kind| InvalidRuleError::new(test, kind))
    }

    /// Returns the test this rule governs.
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

    /// Returns the bug tracking this rule, if any.
    pub fn bug(&self) -> Option<BugId> {
        self.bug
    }

    /// Returns the registration order of this rule.
    pub fn sequence(&self) -> usize {
        self.sequence
    }

    /// Returns the number of distinct tags in the condition set.
    pub fn specificity(&self) -> usize {
        self.conditions.specificity()
    }

    /// Returns true if this rule applies to the environment.
    pub fn matches(&self, env: &EnvironmentDescriptor) -> bool {
        self.conditions.matches(env)
    }

    /// The key rules are ranked by when several of them match: more specific rules win, and among
    /// equally specific rules the most recently registered one wins.
    pub(crate) fn precedence(&self) -> (usize, usize) {
        (self.specificity(), self.sequence)
    }

    /// Returns a serializable summary of this rule.
    pub fn to_summary(&self) -> RuleSummary {
        RuleSummary {
            sequence: self.sequence,
            test: self.test.clone(),
            conditions: self
                .conditions
                .iter()
                .map(|tag| tag.to_string().into())
                .collect(),
            specificity: self.specificity(),
            outcome: self.outcome,
            bug: self.bug,
        }
    }
}

impl fmt::Display for ExpectationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {} {}",
            self.sequence, self.outcome, self.test, self.conditions
        )?;
        if let Some(bug) = self.bug {
            write!(f, " (bug {bug})")?;
        }
        Ok(())
    }
}

/// A rule whose condition set can never match any valid environment.
///
/// These are registered as written, since condition sets are always conjunctive. They almost
/// always indicate an authoring mistake in the catalog, so they are surfaced as warnings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnsatisfiableRule<'a> {
    /// The rule.
    pub rule: &'a ExpectationRule,

    /// The conflicts within the rule's condition set.
    pub conflicts: Vec<ConditionConflict>,
}

impl fmt::Display for UnsatisfiableRule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expectation #{} for `{}` can never match: {}",
            self.rule.sequence,
            self.rule.test,
            self.conflicts.iter().join("; "),
        )
    }
}
