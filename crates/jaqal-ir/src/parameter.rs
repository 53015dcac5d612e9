//! `AnnotatedValue`, the polymorphic base of parameters and constants, and
//! the resolved `Value`s they stand for.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{JaqalError, JaqalResult};
use crate::register::{NamedQubit, Register};

/// The type annotation carried by an `AnnotatedValue`. `Any` ("NONE" in the
/// original) is used for macro parameters, which have no syntactic
/// annotation in Jaqal, and for unresolved identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Qubit,
    Float,
    Register,
    Int,
    Any,
}

/// A fully resolved value: what an `AnnotatedValue` stands for once its name
/// has been looked up in a context, or what a `Constant` always stands for.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Register(Rc<Register>),
    Qubit(Rc<NamedQubit>),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// Maps names in scope (constants, loop-bound macro parameters, etc.) to
/// the values they currently hold. A fresh, empty context means "no
/// substitutions available"; resolution then falls back to whatever a
/// `Constant` already owns.
pub type ResolveContext = HashMap<String, Value>;

/// Common contract of `Parameter` and `Constant`: a name, a type annotation,
/// and a way to resolve to a concrete `Value` given a context.
pub trait AnnotatedValue {
    fn name(&self) -> &str;
    fn kind(&self) -> ParamType;

    /// Determine the value this `AnnotatedValue` represents in `context`.
    /// The default implementation looks the name up in `context`; a
    /// `Constant` overrides this to ignore the context entirely.
    fn resolve_value(&self, context: &ResolveContext) -> JaqalResult<Value> {
        context
            .get(self.name())
            .cloned()
            .ok_or_else(|| JaqalError::name(format!("unbound identifier {}", self.name())))
    }

    /// Is this value classical (i.e. not a qubit or register)? `Any`-typed
    /// values have no fixed answer, per the original's `classical` property.
    fn classical(&self) -> JaqalResult<bool> {
        match self.kind() {
            ParamType::Any => Err(JaqalError::ty(format!(
                "no type defined for parameter {}",
                self.name()
            ))),
            ParamType::Qubit | ParamType::Register => Ok(false),
            ParamType::Float | ParamType::Int => Ok(true),
        }
    }
}

/// A parameter accepted by a gate or macro. Parameters can be indexed or
/// sliced exactly as a `map`-declared `Register` can, so a macro body can
/// use its own parameters as if they were registers in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    kind: ParamType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Parameter {
            name: name.into(),
            kind,
        }
    }

    /// Type-check `value` against this parameter's kind, per the validation
    /// table in §3.2.
    pub fn validate(&self, value: &GateArgument) -> JaqalResult<()> {
        let ok = match (self.kind, value) {
            (ParamType::Any, _) => true,
            (ParamType::Qubit, GateArgument::Qubit(_)) => true,
            (ParamType::Qubit, GateArgument::Unresolved(p)) => {
                matches!(p.kind(), ParamType::Qubit | ParamType::Any)
            }
            (ParamType::Register, GateArgument::Register(_)) => true,
            (ParamType::Register, GateArgument::Unresolved(p)) => {
                matches!(p.kind(), ParamType::Register | ParamType::Any)
            }
            (ParamType::Float, GateArgument::Int(_) | GateArgument::Float(_)) => true,
            (ParamType::Float, GateArgument::Unresolved(p)) => {
                matches!(p.kind(), ParamType::Int | ParamType::Float | ParamType::Any)
            }
            (ParamType::Int, GateArgument::Int(_)) => true,
            (ParamType::Int, GateArgument::Float(f)) => f.fract() == 0.0,
            (ParamType::Int, GateArgument::Unresolved(p)) => {
                matches!(p.kind(), ParamType::Int | ParamType::Any)
            }
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(JaqalError::ty(format!(
                "parameter {}={:?} does not have type {:?}",
                self.name, value, self.kind
            )))
        }
    }
}

impl AnnotatedValue for Parameter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ParamType {
        self.kind
    }
}

/// Any value that can be bound to a gate or macro parameter: a resolved
/// numeric/qubit/register value, or an unresolved `Parameter` (only legal
/// inside a macro body, before macro-expansion substitutes the real
/// argument).
#[derive(Debug, Clone)]
pub enum GateArgument {
    Int(i64),
    Float(f64),
    Register(Rc<Register>),
    Qubit(Rc<NamedQubit>),
    Unresolved(Parameter),
}

impl From<Value> for GateArgument {
    fn from(value: Value) -> Self {
        match value {
            Value::Int(v) => GateArgument::Int(v),
            Value::Float(v) => GateArgument::Float(v),
            Value::Register(r) => GateArgument::Register(r),
            Value::Qubit(q) => GateArgument::Qubit(q),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_parameter_accepts_anything() {
        let p = Parameter::new("x", ParamType::Any);
        assert!(p.validate(&GateArgument::Int(3)).is_ok());
        assert!(p.validate(&GateArgument::Float(3.5)).is_ok());
    }

    #[test]
    fn int_parameter_rejects_non_integral_float() {
        let p = Parameter::new("n", ParamType::Int);
        assert!(p.validate(&GateArgument::Float(2.0)).is_ok());
        assert!(p.validate(&GateArgument::Float(2.5)).is_err());
    }

    #[test]
    fn qubit_parameter_rejects_numeric() {
        let p = Parameter::new("q", ParamType::Qubit);
        assert!(p.validate(&GateArgument::Int(0)).is_err());
    }
}
