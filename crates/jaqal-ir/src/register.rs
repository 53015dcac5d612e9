//! `Register` and `NamedQubit`: the qubit-addressing half of the IR.

use std::rc::Rc;

use crate::error::{JaqalError, JaqalResult};
use crate::parameter::{AnnotatedValue, ParamType, Parameter, ResolveContext, Value};

/// A numeric site that may still be symbolic: a literal, a named `let`
/// constant, or (inside a macro body) a macro parameter. Grounded on Open
/// Question (a): every site that accepts "a numeric literal" accepts all
/// three forms uniformly.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexExpr {
    Int(i64),
    Const(crate::constant::Constant),
    Param(Parameter),
}

impl IndexExpr {
    fn kind(&self) -> ParamType {
        match self {
            IndexExpr::Int(_) => ParamType::Int,
            IndexExpr::Const(c) => c.kind(),
            IndexExpr::Param(p) => p.kind(),
        }
    }

    /// Is this index expression well-typed as an integer-producing site?
    pub fn check_integer_kind(&self, what: &str) -> JaqalResult<()> {
        match self.kind() {
            ParamType::Int | ParamType::Any => Ok(()),
            other => Err(JaqalError::ty(format!(
                "cannot use {what} of non-integer kind {other:?}"
            ))),
        }
    }

    /// Resolve to a concrete integer given a context mapping names to
    /// values.
    pub fn resolve(&self, ctx: &ResolveContext) -> JaqalResult<i64> {
        match self {
            IndexExpr::Int(v) => Ok(*v),
            IndexExpr::Const(c) => c.resolve_value(ctx)?.as_i64().ok_or_else(|| {
                JaqalError::ty(format!("constant {} is not integer-valued", c.name()))
            }),
            IndexExpr::Param(p) => p.resolve_value(ctx)?.as_i64().ok_or_else(|| {
                JaqalError::ty(format!("parameter {} is not integer-valued", p.name()))
            }),
        }
    }
}

/// A `map`-slice's bounds: `start:stop:step`, any component optional.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceExpr {
    pub start: Option<IndexExpr>,
    pub stop: Option<IndexExpr>,
    pub step: Option<IndexExpr>,
}

impl SliceExpr {
    fn resolve(&self, ctx: &ResolveContext) -> JaqalResult<(i64, Option<i64>, i64)> {
        let start = match &self.start {
            Some(e) => e.resolve(ctx)?,
            None => 0,
        };
        let step = match &self.step {
            Some(e) => e.resolve(ctx)?,
            None => 1,
        };
        let stop = self.stop.as_ref().map(|e| e.resolve(ctx)).transpose()?;
        Ok((start, stop, step))
    }
}

/// What a `Register` or `NamedQubit` is aliased from: another register, or
/// (inside a macro body, before the macro is expanded) a macro parameter
/// that will be bound to a register at call time.
#[derive(Debug, Clone, PartialEq)]
pub enum AliasSource {
    Register(Rc<Register>),
    Parameter(Parameter),
}

impl AliasSource {
    fn resolve(&self, ctx: &ResolveContext) -> JaqalResult<Rc<Register>> {
        match self {
            AliasSource::Register(r) => Ok(r.clone()),
            AliasSource::Parameter(p) => match p.resolve_value(ctx)? {
                Value::Register(r) => Ok(r),
                _ => Err(JaqalError::name(format!(
                    "parameter {} did not resolve to a register",
                    p.name()
                ))),
            },
        }
    }
}

/// The kind-specific payload of a `Register`: either it owns storage
/// (fundamental), or it is a name for all-or-part of another register
/// (alias, i.e. declared with `map`).
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterKind {
    Fundamental { size: IndexExpr },
    Alias {
        source: AliasSource,
        slice: Option<SliceExpr>,
    },
}

/// A qubit register, either declared with `register` (fundamental) or with
/// `map` (an alias for all or a contiguous strided slice of another
/// register).
#[derive(Debug, Clone, PartialEq)]
pub struct Register {
    name: String,
    kind: RegisterKind,
}

impl Register {
    /// Declare a fundamental register of the given size.
    pub fn fundamental(name: impl Into<String>, size: IndexExpr) -> JaqalResult<Self> {
        size.check_integer_kind("register size")?;
        Ok(Register {
            name: name.into(),
            kind: RegisterKind::Fundamental { size },
        })
    }

    /// Declare a `map` alias for all or part of `source`.
    pub fn alias(
        name: impl Into<String>,
        source: AliasSource,
        slice: Option<SliceExpr>,
    ) -> JaqalResult<Self> {
        if let Some(s) = &slice {
            for (expr, what) in [
                (&s.start, "slice start"),
                (&s.stop, "slice stop"),
                (&s.step, "slice step"),
            ] {
                if let Some(e) = expr {
                    e.check_integer_kind(what)?;
                }
            }
            if let AliasSource::Parameter(p) = &source {
                match p.kind() {
                    ParamType::Register | ParamType::Any => {}
                    other => {
                        return Err(JaqalError::ty(format!(
                            "cannot slice parameter {} of non-register kind {other:?}",
                            p.name()
                        )));
                    }
                }
            }
        } else if let AliasSource::Register(reg) = &source {
            // A whole-register map: if the source size is statically known,
            // nothing further to check here (indices are bounds-checked at
            // qubit-resolution time instead).
            let _ = reg;
        }
        Ok(Register {
            name: name.into(),
            kind: RegisterKind::Alias { source, slice },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &RegisterKind {
        &self.kind
    }

    pub fn is_fundamental(&self) -> bool {
        matches!(self.kind, RegisterKind::Fundamental { .. })
    }

    /// Determine how many qubits are in this register, per §3.2.
    pub fn resolve_size(&self, ctx: &ResolveContext) -> JaqalResult<i64> {
        match &self.kind {
            RegisterKind::Fundamental { size } => size.resolve(ctx),
            RegisterKind::Alias { source, slice } => {
                let from_size = source.resolve(ctx)?.resolve_size(ctx)?;
                match slice {
                    None => Ok(from_size),
                    Some(s) => {
                        let (start, stop, step) = s.resolve(ctx)?;
                        let stop = stop.unwrap_or(from_size);
                        Ok(range_len(start, stop, step))
                    }
                }
            }
        }
    }

    /// Follow the alias chain back to the fundamental register and index
    /// within it that `idx` (an index into `self`) corresponds to.
    pub fn resolve_qubit(
        self: &Rc<Self>,
        idx: i64,
        ctx: &ResolveContext,
    ) -> JaqalResult<(Rc<Register>, i64)> {
        let size = self.resolve_size(ctx)?;
        if idx < 0 || idx >= size {
            return Err(JaqalError::shape(format!(
                "index {idx} out of range for register {} of size {size}",
                self.name
            )));
        }
        match &self.kind {
            RegisterKind::Fundamental { .. } => Ok((self.clone(), idx)),
            RegisterKind::Alias { source, slice } => {
                let from = source.resolve(ctx)?;
                match slice {
                    None => from.resolve_qubit(idx, ctx),
                    Some(s) => {
                        let (start, _stop, step) = s.resolve(ctx)?;
                        from.resolve_qubit(start + idx * step, ctx)
                    }
                }
            }
        }
    }

    /// Index into this register, producing a `NamedQubit`. Anonymous
    /// slicing (`reg[a:b]` outside a `map` statement) is not supported;
    /// only whole-register or single-index access is legal here.
    pub fn index(self: &Rc<Self>, idx: IndexExpr) -> crate::register::NamedQubit {
        let name = format!("{}[{}]", self.name, describe_index(&idx));
        NamedQubit {
            name,
            alias_from: AliasSource::Register(self.clone()),
            alias_index: idx,
        }
    }
}

fn describe_index(idx: &IndexExpr) -> String {
    match idx {
        IndexExpr::Int(v) => v.to_string(),
        IndexExpr::Const(c) => c.name().to_string(),
        IndexExpr::Param(p) => p.name().to_string(),
    }
}

fn range_len(start: i64, stop: i64, step: i64) -> i64 {
    if step == 0 {
        return 0;
    }
    if step > 0 {
        if stop <= start { 0 } else { (stop - start + step - 1) / step }
    } else if stop >= start {
        0
    } else {
        (start - stop - step - 1) / (-step)
    }
}

/// A single qubit, identified by a name and an index into some register.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedQubit {
    name: String,
    alias_from: AliasSource,
    alias_index: IndexExpr,
}

impl NamedQubit {
    pub fn new(
        name: impl Into<String>,
        alias_from: AliasSource,
        alias_index: IndexExpr,
    ) -> JaqalResult<Self> {
        alias_index.check_integer_kind("qubit index")?;
        if let AliasSource::Parameter(p) = &alias_from {
            match p.kind() {
                ParamType::Register | ParamType::Any => {}
                other => {
                    return Err(JaqalError::ty(format!(
                        "cannot index parameter {} of non-register kind {other:?}",
                        p.name()
                    )));
                }
            }
        }
        Ok(NamedQubit {
            name: name.into(),
            alias_from,
            alias_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias_from(&self) -> &AliasSource {
        &self.alias_from
    }

    pub fn alias_index(&self) -> &IndexExpr {
        &self.alias_index
    }

    /// Follow the alias chain back to the fundamental register and index
    /// within it that this qubit corresponds to.
    pub fn resolve_qubit(&self, ctx: &ResolveContext) -> JaqalResult<(Rc<Register>, i64)> {
        let idx = self.alias_index.resolve(ctx)?;
        let from = self.alias_from.resolve(ctx)?;
        from.resolve_qubit(idx, ctx)
    }

    /// A copy of this qubit under a different name (used when a macro
    /// parameter bound to a qubit is referenced under the parameter's own
    /// name).
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        NamedQubit {
            name: name.into(),
            alias_from: self.alias_from.clone(),
            alias_index: self.alias_index.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ResolveContext {
        ResolveContext::new()
    }

    #[test]
    fn fundamental_register_size_resolves_directly() {
        let r = Register::fundamental("r", IndexExpr::Int(3)).unwrap();
        assert_eq!(r.resolve_size(&ctx()).unwrap(), 3);
    }

    #[test]
    fn whole_register_alias_inherits_size() {
        let base = Rc::new(Register::fundamental("r", IndexExpr::Int(5)).unwrap());
        let alias = Register::alias("s", AliasSource::Register(base), None).unwrap();
        assert_eq!(alias.resolve_size(&ctx()).unwrap(), 5);
    }

    #[test]
    fn sliced_alias_computes_strided_length() {
        let base = Rc::new(Register::fundamental("r", IndexExpr::Int(10)).unwrap());
        let slice = SliceExpr {
            start: Some(IndexExpr::Int(1)),
            stop: Some(IndexExpr::Int(8)),
            step: Some(IndexExpr::Int(2)),
        };
        let alias = Register::alias("s", AliasSource::Register(base), Some(slice)).unwrap();
        // indices 1, 3, 5, 7 -> length 4
        assert_eq!(alias.resolve_size(&ctx()).unwrap(), 4);
    }

    #[test]
    fn resolve_qubit_follows_alias_chain() {
        let base = Rc::new(Register::fundamental("r", IndexExpr::Int(10)).unwrap());
        let slice = SliceExpr {
            start: Some(IndexExpr::Int(2)),
            stop: None,
            step: Some(IndexExpr::Int(3)),
        };
        let alias = Rc::new(Register::alias("s", AliasSource::Register(base.clone()), Some(slice)).unwrap());
        let (root, idx) = alias.resolve_qubit(1, &ctx()).unwrap();
        assert_eq!(root.name(), "r");
        assert_eq!(idx, 5); // start 2 + 1*3
    }

    #[test]
    fn out_of_range_index_is_shape_error() {
        let base = Rc::new(Register::fundamental("r", IndexExpr::Int(2)).unwrap());
        let err = base.resolve_qubit(5, &ctx()).unwrap_err();
        assert!(matches!(err, JaqalError::Shape { .. }));
    }
}
