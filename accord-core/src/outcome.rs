//! Outcome model - issues, outcome spaces, and value tuples

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single admissible value of an issue
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Str(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

/// A complete value assignment over an outcome space's issues, position-significant
pub type Outcome = Vec<Value>;

/// One negotiable issue: a name and its domain of admissible values
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub name: String,
    pub values: Vec<Value>,
}

impl Issue {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Outcome space given as an ordered sequence of issues (Cartesian product)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartesianSpace {
    pub name: String,
    pub issues: Vec<Issue>,
}

impl CartesianSpace {
    pub fn new(name: impl Into<String>, issues: Vec<Issue>) -> Self {
        Self {
            name: name.into(),
            issues,
        }
    }

    pub fn n_issues(&self) -> usize {
        self.issues.len()
    }

    /// Number of outcomes in the product space
    pub fn size(&self) -> usize {
        if self.issues.is_empty() {
            return 0;
        }
        self.issues.iter().map(|i| i.values.len()).product()
    }

    /// Enumerate every outcome of the product space
    pub fn outcomes(&self) -> Vec<Outcome> {
        if self.issues.is_empty() {
            return Vec::new();
        }
        let mut acc: Vec<Outcome> = vec![Vec::new()];
        for issue in &self.issues {
            let mut next = Vec::with_capacity(acc.len() * issue.values.len());
            for prefix in &acc {
                for value in &issue.values {
                    let mut outcome = prefix.clone();
                    outcome.push(value.clone());
                    next.push(outcome);
                }
            }
            acc = next;
        }
        acc
    }

    pub fn contains(&self, outcome: &Outcome) -> bool {
        outcome.len() == self.issues.len()
            && self
                .issues
                .iter()
                .zip(outcome)
                .all(|(issue, value)| issue.values.contains(value))
    }
}

/// Outcome space given as an explicit list of outcomes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnumeratedSpace {
    pub name: String,
    pub outcomes: Vec<Outcome>,
}

impl EnumeratedSpace {
    pub fn new(name: impl Into<String>, outcomes: Vec<Outcome>) -> Self {
        Self {
            name: name.into(),
            outcomes,
        }
    }
}

/// An outcome space in either representation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeSpace {
    Cartesian(CartesianSpace),
    Enumerated(EnumeratedSpace),
}

impl OutcomeSpace {
    /// Convenience constructor for a named issue-list space
    pub fn cartesian(name: impl Into<String>, issues: Vec<Issue>) -> Self {
        OutcomeSpace::Cartesian(CartesianSpace::new(name, issues))
    }

    pub fn name(&self) -> &str {
        match self {
            OutcomeSpace::Cartesian(s) => &s.name,
            OutcomeSpace::Enumerated(s) => &s.name,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            OutcomeSpace::Cartesian(s) => s.size(),
            OutcomeSpace::Enumerated(s) => s.outcomes.len(),
        }
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        match self {
            OutcomeSpace::Cartesian(s) => s.outcomes(),
            OutcomeSpace::Enumerated(s) => s.outcomes.clone(),
        }
    }

    pub fn contains(&self, outcome: &Outcome) -> bool {
        match self {
            OutcomeSpace::Cartesian(s) => s.contains(outcome),
            OutcomeSpace::Enumerated(s) => s.outcomes.contains(outcome),
        }
    }

    /// Draw one outcome uniformly; `None` for an empty space
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Outcome> {
        match self {
            OutcomeSpace::Cartesian(s) => {
                if s.issues.is_empty() {
                    return None;
                }
                s.issues
                    .iter()
                    .map(|issue| issue.values.choose(rng).cloned())
                    .collect()
            }
            OutcomeSpace::Enumerated(s) => s.outcomes.choose(rng).cloned(),
        }
    }
}
