//! `Constant`, the IR representation of a Jaqal `let` statement.

use crate::error::JaqalResult;
use crate::parameter::{AnnotatedValue, ParamType, ResolveContext, Value};

/// A named, fixed numeric value bound by a `let` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    name: String,
    value: NumericValue,
}

/// The literal value a `Constant` owns: either kind, tracked separately from
/// `ParamType` since a `Constant`'s kind is inferred from its value rather
/// than declared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericValue {
    Int(i64),
    Float(f64),
}

impl Constant {
    pub fn int(name: impl Into<String>, value: i64) -> Self {
        Constant {
            name: name.into(),
            value: NumericValue::Int(value),
        }
    }

    pub fn float(name: impl Into<String>, value: f64) -> Self {
        Constant {
            name: name.into(),
            value: NumericValue::Float(value),
        }
    }

    /// A `Constant` defined in terms of another, inheriting its kind.
    pub fn from_constant(name: impl Into<String>, other: &Constant) -> Self {
        Constant {
            name: name.into(),
            value: other.value,
        }
    }

    pub fn value(&self) -> NumericValue {
        self.value
    }

    pub fn as_f64(&self) -> f64 {
        match self.value {
            NumericValue::Int(v) => v as f64,
            NumericValue::Float(v) => v,
        }
    }

    /// Resolve this constant to an integer, failing (rather than rounding)
    /// if its value is not integral.
    pub fn as_i64(&self) -> JaqalResult<i64> {
        match self.value {
            NumericValue::Int(v) => Ok(v),
            NumericValue::Float(v) => Err(crate::error::JaqalError::ty(format!(
                "could not convert constant {} with value {v} to an integer",
                self.name
            ))),
        }
    }
}

impl AnnotatedValue for Constant {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ParamType {
        match self.value {
            NumericValue::Int(_) => ParamType::Int,
            NumericValue::Float(_) => ParamType::Float,
        }
    }

    /// Unlike the trait default, a `Constant` ignores the context and
    /// always returns its own fixed value.
    fn resolve_value(&self, _context: &ResolveContext) -> JaqalResult<Value> {
        Ok(match self.value {
            NumericValue::Int(v) => Value::Int(v),
            NumericValue::Float(v) => Value::Float(v),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_constant_resolves_regardless_of_context() {
        let c = Constant::int("a", 3);
        let ctx = ResolveContext::new();
        match c.resolve_value(&ctx).unwrap() {
            Value::Int(3) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn float_constant_rejects_as_i64() {
        let c = Constant::float("pi_ish", 3.14);
        assert!(c.as_i64().is_err());
    }

    #[test]
    fn derived_constant_inherits_kind() {
        let base = Constant::float("a", 1.5);
        let derived = Constant::from_constant("b", &base);
        assert_eq!(derived.kind(), ParamType::Float);
    }
}
