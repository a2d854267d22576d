//! Write predicates and scan filters.
//!
//! A [`Condition`] is evaluated against the item currently stored under a key
//! (for conditional writes) or against each scanned item (for filters). A
//! missing item behaves like an item without attributes.

use super::record::{AttributeValue, Record};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    AttributeExists(String),
    AttributeNotExists(String),
    Equals(String, AttributeValue),
    BeginsWith(String, String),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn attribute_exists(name: impl Into<String>) -> Self {
        Condition::AttributeExists(name.into())
    }

    pub fn attribute_not_exists(name: impl Into<String>) -> Self {
        Condition::AttributeNotExists(name.into())
    }

    pub fn equals(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Condition::Equals(name.into(), value.into())
    }

    pub fn begins_with(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Condition::BeginsWith(name.into(), prefix.into())
    }

    /// Conjunction, flattening nested `And`s.
    pub fn and(self, other: Condition) -> Self {
        match self {
            Condition::And(mut parts) => {
                parts.push(other);
                Condition::And(parts)
            }
            first => Condition::And(vec![first, other]),
        }
    }

    /// Disjunction, flattening nested `Or`s.
    pub fn or(self, other: Condition) -> Self {
        match self {
            Condition::Or(mut parts) => {
                parts.push(other);
                Condition::Or(parts)
            }
            first => Condition::Or(vec![first, other]),
        }
    }

    /// Evaluates the condition against the stored item, if any.
    pub fn evaluate(&self, item: Option<&Record>) -> bool {
        let lookup = |name: &str| item.and_then(|record| record.attribute(name));

        match self {
            Condition::AttributeExists(name) => lookup(name).is_some(),
            Condition::AttributeNotExists(name) => lookup(name).is_none(),
            Condition::Equals(name, expected) => lookup(name).as_ref() == Some(expected),
            Condition::BeginsWith(name, prefix) => lookup(name)
                .and_then(|value| value.as_s().map(|s| s.starts_with(prefix.as_str())))
                .unwrap_or(false),
            Condition::And(parts) => parts.iter().all(|part| part.evaluate(item)),
            Condition::Or(parts) => parts.iter().any(|part| part.evaluate(item)),
        }
    }
}
