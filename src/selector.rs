// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Label selector parsing and matching.
//!
//! Two inputs use the Kubernetes label-selector string syntax:
//!
//! - the Service label selector restricting which Services are listed
//! - the annotation filter, evaluated against a Service's annotations
//!
//! Pod lookups for a Service use [`Selector::from_map`], the equality form of
//! the Service's `spec.selector`.
//!
//! # Example
//!
//! ```
//! use svcdns::selector::Selector;
//! use std::collections::BTreeMap;
//!
//! let selector = Selector::parse("app=web,tier in (frontend, edge),!canary").unwrap();
//! let labels = BTreeMap::from([
//!     ("app".to_string(), "web".to_string()),
//!     ("tier".to_string(), "edge".to_string()),
//! ]);
//! assert!(selector.matches(&labels));
//! ```

use crate::errors::{Result, SourceError};
use std::collections::BTreeMap;
use std::fmt;

/// Relationship between a key and its values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// A single `key <op> values` term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requirement {
    pub key: String,
    pub operator: Operator,
    pub values: Vec<String>,
}

impl Requirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let value = labels.get(&self.key);
        match self.operator {
            Operator::Equals | Operator::In => {
                value.is_some_and(|v| self.values.iter().any(|want| want == v))
            }
            // A missing key satisfies negative requirements, like Kubernetes does.
            Operator::NotEquals | Operator::NotIn => {
                value.is_none_or(|v| self.values.iter().all(|want| want != v))
            }
            Operator::Exists => value.is_some(),
            Operator::DoesNotExist => value.is_none(),
        }
    }
}

/// A conjunction of requirements. The empty selector matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    requirements: Vec<Requirement>,
}

impl Selector {
    /// Equality selector built from a `key -> value` map (e.g. a Service's `spec.selector`).
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        Self {
            requirements: map
                .iter()
                .map(|(k, v)| Requirement {
                    key: k.clone(),
                    operator: Operator::Equals,
                    values: vec![v.clone()],
                })
                .collect(),
        }
    }

    /// Parse a label-selector expression.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidSelector`] when a term is malformed, a key
    /// is empty, or a set expression is missing its parentheses.
    pub fn parse(expression: &str) -> Result<Self> {
        let invalid = |reason: String| SourceError::InvalidSelector {
            selector: expression.to_string(),
            reason,
        };

        let mut requirements = Vec::new();
        for term in split_terms(expression).map_err(invalid)? {
            let term = term.trim();
            if term.is_empty() {
                if expression.trim().is_empty() {
                    continue;
                }
                return Err(invalid("empty requirement".to_string()));
            }
            requirements.push(parse_term(term).map_err(invalid)?);
        }
        Ok(Self { requirements })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// True when every requirement holds for `labels`.
    #[must_use]
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }

    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self
            .requirements
            .iter()
            .map(|r| match r.operator {
                Operator::Equals => format!("{}={}", r.key, r.values.join("")),
                Operator::NotEquals => format!("{}!={}", r.key, r.values.join("")),
                Operator::In => format!("{} in ({})", r.key, r.values.join(",")),
                Operator::NotIn => format!("{} notin ({})", r.key, r.values.join(",")),
                Operator::Exists => r.key.clone(),
                Operator::DoesNotExist => format!("!{}", r.key),
            })
            .collect();
        f.write_str(&terms.join(","))
    }
}

/// Split on commas outside parentheses.
fn split_terms(expression: &str) -> std::result::Result<Vec<&str>, String> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in expression.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced ')'".to_string())?;
            }
            ',' if depth == 0 => {
                terms.push(&expression[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced '('".to_string());
    }
    terms.push(&expression[start..]);
    Ok(terms)
}

fn parse_term(term: &str) -> std::result::Result<Requirement, String> {
    if let Some(key) = term.strip_prefix('!') {
        return Ok(Requirement {
            key: validate_key(key.trim())?,
            operator: Operator::DoesNotExist,
            values: Vec::new(),
        });
    }

    if let Some((key, value)) = term.split_once("!=") {
        return equality(key, value, Operator::NotEquals);
    }
    if let Some((key, value)) = term.split_once("==") {
        return equality(key, value, Operator::Equals);
    }
    if let Some((key, value)) = term.split_once('=') {
        return equality(key, value, Operator::Equals);
    }

    let mut words = term.splitn(2, char::is_whitespace);
    let key = words.next().unwrap_or_default();
    let Some(rest) = words.next().map(str::trim) else {
        return Ok(Requirement {
            key: validate_key(key)?,
            operator: Operator::Exists,
            values: Vec::new(),
        });
    };

    let (operator, set) = if let Some(set) = rest.strip_prefix("notin") {
        (Operator::NotIn, set)
    } else if let Some(set) = rest.strip_prefix("in") {
        (Operator::In, set)
    } else {
        return Err(format!("unexpected '{rest}' after key '{key}'"));
    };

    let set = set.trim();
    let inner = set
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| format!("expected '(values)' for key '{key}'"))?;
    let values: Vec<String> = inner
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    if values.is_empty() {
        return Err(format!("empty value set for key '{key}'"));
    }

    Ok(Requirement {
        key: validate_key(key)?,
        operator,
        values,
    })
}

fn equality(
    key: &str,
    value: &str,
    operator: Operator,
) -> std::result::Result<Requirement, String> {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return Err(format!("invalid value '{value}'"));
    }
    Ok(Requirement {
        key: validate_key(key.trim())?,
        operator,
        values: vec![value.to_string()],
    })
}

fn validate_key(key: &str) -> std::result::Result<String, String> {
    if key.is_empty() {
        return Err("empty key".to_string());
    }
    if key
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '!' | '='))
    {
        return Err(format!("invalid key '{key}'"));
    }
    Ok(key.to_string())
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod selector_tests;
