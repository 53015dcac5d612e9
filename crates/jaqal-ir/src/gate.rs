//! Gate definitions and gate-call statements.

use std::rc::Rc;

use crate::error::{JaqalError, JaqalResult};
use crate::parameter::{GateArgument, Parameter};

/// A single qubit index contributed to used-qubit analysis, or the sentinel
/// meaning "every qubit in the circuit" (used by `BusyGateDefinition`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsedQubit {
    Index(String, i64),
    All,
}

/// The abstract contract shared by `GateDefinition` and `Macro`: a name, a
/// parameter list, and the ability to be called with arguments to produce a
/// `GateStatement`.
pub trait AbstractGate {
    fn gate_name(&self) -> &str;
    fn gate_parameters(&self) -> &[Parameter];

    fn quantum_parameters(&self) -> JaqalResult<usize> {
        let mut q = 0;
        for p in self.gate_parameters() {
            if !p.classical()? {
                q += 1;
            }
        }
        Ok(q)
    }

    fn classical_parameters(&self) -> JaqalResult<usize> {
        let mut c = 0;
        for p in self.gate_parameters() {
            if p.classical()? {
                c += 1;
            }
        }
        Ok(c)
    }
}

/// Either a hardware-defined gate (from a pulse module or synthesized as
/// anonymous) or an idle/busy variant of one. Carries no body: its meaning
/// comes from a pulse-module-provided unitary, which this IR treats as
/// opaque.
#[derive(Debug, Clone)]
pub struct GateDefinition {
    name: String,
    parameters: Vec<Parameter>,
    variant: GateVariant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateVariant {
    Normal,
    /// Idles for the parent gate's duration; contributes no used qubits.
    Idle,
    /// Cannot be parallelized with anything; contributes the `All` sentinel.
    Busy,
}

impl GateDefinition {
    pub fn new(name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        GateDefinition {
            name: name.into(),
            parameters,
            variant: GateVariant::Normal,
        }
    }

    /// An idle gate paired with an active gate, per `IdleGateDefinition`:
    /// named `I_<gate>` by default, and contributing no used qubits (it
    /// occupies time without acting on the qubit).
    pub fn idle_for(parent: &GateDefinition, name: Option<String>) -> Self {
        GateDefinition {
            name: name.unwrap_or_else(|| format!("I_{}", parent.name)),
            parameters: parent.parameters.clone(),
            variant: GateVariant::Idle,
        }
    }

    /// A gate that can never be parallelized with anything else, per
    /// `BusyGateDefinition`.
    pub fn busy(name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        GateDefinition {
            name: name.into(),
            parameters,
            variant: GateVariant::Busy,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.variant == GateVariant::Idle
    }

    pub fn is_busy(&self) -> bool {
        self.variant == GateVariant::Busy
    }

    /// Call this gate definition with positional arguments, producing a
    /// `GateStatement`. Validates arity and per-parameter kinds.
    pub fn call(self: &Rc<Self>, args: Vec<GateArgument>) -> JaqalResult<GateStatement> {
        if args.len() != self.parameters.len() {
            return Err(JaqalError::arity(format!(
                "gate {}: expected {} arguments, found {}",
                self.name,
                self.parameters.len(),
                args.len()
            )));
        }
        for (param, arg) in self.parameters.iter().zip(&args) {
            param.validate(arg)?;
        }
        Ok(GateStatement {
            gate_def: GateDefRef::Builtin(self.clone()),
            parameters: self
                .parameters
                .iter()
                .map(|p| p.name().to_string())
                .zip(args)
                .collect(),
        })
    }
}

impl AbstractGate for GateDefinition {
    fn gate_name(&self) -> &str {
        &self.name
    }

    fn gate_parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}

/// Which kind of gate a `GateStatement` calls: grounded on the IR's two
/// `AbstractGate`-shaped entities, `GateDefinition` and `Macro`.
#[derive(Debug, Clone)]
pub enum GateDefRef {
    Builtin(Rc<GateDefinition>),
    Macro(Rc<crate::macro_def::Macro>),
}

impl GateDefRef {
    pub fn name(&self) -> &str {
        match self {
            GateDefRef::Builtin(g) => g.gate_name(),
            GateDefRef::Macro(m) => m.gate_name(),
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        match self {
            GateDefRef::Builtin(g) => g.gate_parameters(),
            GateDefRef::Macro(m) => m.gate_parameters(),
        }
    }

    /// Every qubit slot this gate's definition says it uses, per §4.9.
    /// `BusyGateDefinition` yields the `All` sentinel instead of per-qubit
    /// slots.
    pub fn used_qubit_params(&self) -> Vec<&Parameter> {
        match self {
            GateDefRef::Builtin(g) if g.is_idle() => Vec::new(),
            GateDefRef::Builtin(g) if g.is_busy() => vec![],
            _ => self
                .parameters()
                .iter()
                .filter(|p| !matches!(p.classical(), Ok(true)))
                .collect(),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, GateDefRef::Builtin(g) if g.is_busy())
    }
}

/// A call to a gate or macro: the gate/macro being called, and an ordered
/// map from parameter name to the argument value.
#[derive(Debug, Clone)]
pub struct GateStatement {
    gate_def: GateDefRef,
    parameters: Vec<(String, GateArgument)>,
}

impl GateStatement {
    pub fn new(gate_def: GateDefRef, parameters: Vec<(String, GateArgument)>) -> Self {
        GateStatement {
            gate_def,
            parameters,
        }
    }

    pub fn name(&self) -> &str {
        self.gate_def.name()
    }

    pub fn gate_def(&self) -> &GateDefRef {
        &self.gate_def
    }

    pub fn parameters(&self) -> &[(String, GateArgument)] {
        &self.parameters
    }

    pub fn argument(&self, name: &str) -> Option<&GateArgument> {
        self.parameters.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Structural equality, NaN-tolerant for float arguments (so that two
/// `GateStatement`s built from the same source text compare equal even if
/// they carry a `NaN` parameter), per §3.2.
impl PartialEq for GateStatement {
    fn eq(&self, other: &Self) -> bool {
        if self.name() != other.name() || self.parameters.len() != other.parameters.len() {
            return false;
        }
        self.parameters.iter().zip(&other.parameters).all(|((_, a), (_, b))| {
            match (a, b) {
                (GateArgument::Float(x), GateArgument::Float(y)) => {
                    (x.is_nan() && y.is_nan()) || x == y
                }
                (GateArgument::Int(x), GateArgument::Int(y)) => x == y,
                (GateArgument::Register(x), GateArgument::Register(y)) => x == y,
                (GateArgument::Qubit(x), GateArgument::Qubit(y)) => x == y,
                (GateArgument::Unresolved(x), GateArgument::Unresolved(y)) => x == y,
                _ => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParamType;

    #[test]
    fn call_validates_arity() {
        let def = Rc::new(GateDefinition::new(
            "g",
            vec![Parameter::new("a", ParamType::Float)],
        ));
        let err = def.call(vec![]).unwrap_err();
        assert!(matches!(err, JaqalError::Arity { .. }));
    }

    #[test]
    fn idle_gate_name_defaults_to_prefixed() {
        let parent = GateDefinition::new("gx", vec![]);
        let idle = GateDefinition::idle_for(&parent, None);
        assert_eq!(idle.gate_name(), "I_gx");
    }

    #[test]
    fn busy_gate_contributes_all_sentinel() {
        let def = Rc::new(GateDefinition::busy("prepare_all", vec![]));
        let stmt = def.call(vec![]).unwrap();
        assert!(stmt.gate_def().is_busy());
    }
}
