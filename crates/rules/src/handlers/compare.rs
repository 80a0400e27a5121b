//! Comparison operators.
//!
//! Each works in two positions. The explicit form takes a `[lhs, rhs]` pair
//! and yields a bool. Any other argument is the right-hand side of an
//! implicit comparison against [`EvalApi::comparison_target`], which yields a
//! verdict.

use std::cmp::Ordering;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

use crate::api::EvalApi;
use crate::cost::CostInput;
use crate::error::{EngineError, Result};
use crate::handler::Handler;
use crate::node::{Data, Value};
use crate::view::View;

/// Operands of a comparison, materialized.
enum Operands {
    Pair(Value, Value),
    Implicit(Value, Value),
}

impl Operands {
    async fn read(argument: &View, api: &EvalApi) -> Result<Self> {
        match api.materialize(argument).await? {
            Value::Array(mut pair) if pair.len() == 2 => {
                let rhs = pair.pop().unwrap_or(Value::Null);
                let lhs = pair.pop().unwrap_or(Value::Null);
                Ok(Operands::Pair(lhs, rhs))
            }
            rhs => {
                let lhs = api.materialize(&api.comparison_target()).await?;
                Ok(Operands::Implicit(lhs, rhs))
            }
        }
    }

    fn decide(self, test: impl FnOnce(&Value, &Value) -> Result<bool>) -> Result<Data> {
        match self {
            Operands::Pair(lhs, rhs) => Ok(Data::Bool(test(&lhs, &rhs)?)),
            Operands::Implicit(lhs, rhs) => Ok(Data::Verdict(test(&lhs, &rhs)?)),
        }
    }
}

/// Pair form costs only its operands; the implicit form must also read its target.
fn comparison_cost(argument: &CostInput<'_>) -> f64 {
    if argument.is_pair() {
        0.0
    } else {
        argument.config().unknown_cost
    }
}

/// Numbers compare numerically and strings lexicographically. Anything else
/// is unordered.
pub fn compare_values(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

// ── Ordering and regex ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Regex,
}

impl CompareOp {
    pub fn name(self) -> &'static str {
        match self {
            CompareOp::Ne => "$ne",
            CompareOp::Lt => "$lt",
            CompareOp::Lte => "$lte",
            CompareOp::Gt => "$gt",
            CompareOp::Gte => "$gte",
            CompareOp::Regex => "$regex",
        }
    }

    pub fn test(self, lhs: &Value, rhs: &Value) -> Result<bool> {
        let ordering = compare_values(lhs, rhs);
        let result = match self {
            CompareOp::Ne => lhs != rhs,
            CompareOp::Lt => ordering == Some(Ordering::Less),
            CompareOp::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            CompareOp::Gt => ordering == Some(Ordering::Greater),
            CompareOp::Gte => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            CompareOp::Regex => match lhs {
                Value::String(subject) => build_regex(rhs)?.is_match(subject),
                _ => false,
            },
        };
        Ok(result)
    }
}

/// A regex from a pattern string, a regex literal or `{ pattern, flags }`.
pub fn build_regex(source: &Value) -> Result<Regex> {
    let (pattern, flags) = match source {
        Value::Regex(re) => return Ok(re.clone()),
        Value::String(pattern) => (pattern.as_str(), ""),
        Value::Object(map) => {
            let pattern = map.get("pattern").and_then(Value::as_str);
            let flags = map.get("flags").and_then(Value::as_str).unwrap_or("");
            match pattern {
                Some(pattern) => (pattern, flags),
                None => return Err(regex_argument()),
            }
        }
        _ => return Err(regex_argument()),
    };

    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            // Global and sticky matching have no meaning for a single test.
            'g' | 'y' | 'u' => &mut builder,
            _ => return Err(regex_argument()),
        };
    }
    Ok(builder.build()?)
}

fn regex_argument() -> EngineError {
    EngineError::invalid_argument("$regex", "a pattern string or { pattern, flags }")
}

/// `$ne`, `$lt`, `$lte`, `$gt`, `$gte` and `$regex`.
pub struct Compare {
    op: CompareOp,
}

impl Compare {
    pub fn new(op: CompareOp) -> Self {
        Self { op }
    }
}

#[async_trait]
impl Handler for Compare {
    async fn handle(&self, argument: View, api: EvalApi) -> Result<Data> {
        let op = self.op;
        Operands::read(&argument, &api)
            .await?
            .decide(|lhs, rhs| op.test(lhs, rhs))
    }

    fn cost(&self, argument: &CostInput<'_>) -> Option<f64> {
        Some(comparison_cost(argument))
    }
}

// ── Equality ────────────────────────────────────────────────────────

/// `$eq`: deep equality, symmetric in both forms.
pub struct Equals;

#[async_trait]
impl Handler for Equals {
    async fn handle(&self, argument: View, api: EvalApi) -> Result<Data> {
        Operands::read(&argument, &api)
            .await?
            .decide(|lhs, rhs| Ok(lhs == rhs))
    }

    fn cost(&self, argument: &CostInput<'_>) -> Option<f64> {
        Some(comparison_cost(argument))
    }
}

/// `$in`: whether the comparison target equals any element of the argument.
pub struct In;

#[async_trait]
impl Handler for In {
    async fn handle(&self, argument: View, api: EvalApi) -> Result<Data> {
        let target = api.materialize(&api.comparison_target()).await?;
        for candidate in api.sort_by_cost(&argument).await? {
            if api.materialize(&candidate).await? == target {
                return Ok(Data::Verdict(true));
            }
        }
        Ok(Data::Verdict(false))
    }

    fn cost(&self, argument: &CostInput<'_>) -> Option<f64> {
        Some(argument.config().unknown_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ordering_is_typed() {
        let two = Value::from(2.0);
        let ten = Value::from(10.0);
        assert!(CompareOp::Lt.test(&two, &ten).unwrap());
        assert!(!CompareOp::Lt.test(&Value::from("2"), &Value::from("10")).unwrap());
        assert!(!CompareOp::Lt.test(&two, &Value::from("10")).unwrap());
        assert!(!CompareOp::Gte.test(&Value::Null, &two).unwrap());
        assert!(CompareOp::Gte.test(&ten, &ten).unwrap());
        assert!(CompareOp::Ne.test(&two, &Value::from("2")).unwrap());
    }

    #[test]
    fn regex_accepts_flags() {
        let spec = Value::from(json!({ "pattern": "^fred", "flags": "i" }));
        assert!(CompareOp::Regex.test(&Value::from("FREDDY"), &spec).unwrap());
        assert!(!CompareOp::Regex.test(&Value::from("FREDDY"), &Value::from("^fred")).unwrap());
        assert!(!CompareOp::Regex.test(&Value::from(5.0), &Value::from("5")).unwrap());

        let bad = Value::from(json!({ "pattern": "a", "flags": "q" }));
        assert!(CompareOp::Regex.test(&Value::from("a"), &bad).is_err());
    }
}
