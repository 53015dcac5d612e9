//! Used-qubit analysis (§4.9): for each fundamental register, the set of
//! integer indices some statement in the circuit reads or writes.
//!
//! A `Register` argument contributes every index it resolves to; a
//! `NamedQubit` argument contributes the single index it resolves to. A
//! macro call is expanded through its own (already-attached) `Macro`
//! definition on the fly, substituting the call's arguments for the
//! macro's parameters as the body is walked, rather than requiring the
//! circuit to have gone through `MacroExpand` first. A busy gate (e.g.
//! `prepare_all`/`measure_all`) contributes the `All` sentinel instead of
//! specific indices.

use std::collections::{BTreeSet, HashMap};

use jaqal_ir::{
    Analyzer, BlockStatement, Circuit, GateArgument, GateDefRef, GateStatement, JaqalResult,
    ResolveContext, Statement, UsedQubit,
};

use crate::macro_expand::{substitute_argument, Bindings};

/// The result of a used-qubit analysis: per-register index sets, plus
/// whether any busy gate was encountered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedQubits {
    indices: HashMap<String, BTreeSet<i64>>,
    all: bool,
}

impl UsedQubits {
    fn insert(&mut self, used: UsedQubit) {
        match used {
            UsedQubit::Index(name, idx) => {
                self.indices.entry(name).or_default().insert(idx);
            }
            UsedQubit::All => self.all = true,
        }
    }

    /// Whether a busy gate (contributing the `All` sentinel) appeared
    /// anywhere in the circuit.
    pub fn uses_all(&self) -> bool {
        self.all
    }

    /// The indices used on a given fundamental register, if any.
    pub fn indices_for(&self, register: &str) -> Option<&BTreeSet<i64>> {
        self.indices.get(register)
    }

    /// The fundamental registers with at least one used index.
    pub fn registers(&self) -> impl Iterator<Item = &str> {
        self.indices.keys().map(String::as_str)
    }
}

/// Computes used-qubit indices for a circuit's body.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsedQubitAnalysis;

impl UsedQubitAnalysis {
    pub fn new() -> Self {
        UsedQubitAnalysis
    }

    pub fn compute(&self, circuit: &Circuit) -> JaqalResult<UsedQubits> {
        let ctx = ResolveContext::new();
        let mut acc = UsedQubits::default();
        let mut collector = Collector { ctx: &ctx };
        collector.walk_block(&mut acc, circuit.body())?;
        Ok(acc)
    }
}

struct Collector<'a> {
    ctx: &'a ResolveContext,
}

impl Collector<'_> {
    fn argument_uses(&self, arg: &GateArgument) -> JaqalResult<Vec<UsedQubit>> {
        Ok(match arg {
            GateArgument::Register(r) => {
                let size = r.resolve_size(self.ctx)?;
                let mut uses = Vec::with_capacity(size.max(0) as usize);
                for i in 0..size {
                    let (root, idx) = r.resolve_qubit(i, self.ctx)?;
                    uses.push(UsedQubit::Index(root.name().to_string(), idx));
                }
                uses
            }
            GateArgument::Qubit(q) => {
                let (root, idx) = q.resolve_qubit(self.ctx)?;
                vec![UsedQubit::Index(root.name().to_string(), idx)]
            }
            GateArgument::Int(_) | GateArgument::Float(_) | GateArgument::Unresolved(_) => {
                Vec::new()
            }
        })
    }

    /// Walk a macro body with the call's arguments bound to its
    /// parameters, recursing into any further macro calls the body makes.
    fn expand_macro_body(
        &self,
        acc: &mut UsedQubits,
        body: &BlockStatement,
        bindings: &Bindings,
    ) -> JaqalResult<()> {
        for stmt in body.statements() {
            self.expand_macro_statement(acc, stmt, bindings)?;
        }
        Ok(())
    }

    fn expand_macro_statement(
        &self,
        acc: &mut UsedQubits,
        stmt: &Statement,
        bindings: &Bindings,
    ) -> JaqalResult<()> {
        match stmt {
            Statement::Gate(g) => self.expand_macro_gate(acc, g, bindings),
            Statement::Block(b) => self.expand_macro_body(acc, b, bindings),
            Statement::Loop(l) => self.expand_macro_body(acc, l.body(), bindings),
            Statement::Branch(br) => {
                for case in br.cases() {
                    self.expand_macro_body(acc, case.body(), bindings)?;
                }
                Ok(())
            }
        }
    }

    fn expand_macro_gate(
        &self,
        acc: &mut UsedQubits,
        gate: &GateStatement,
        outer_bindings: &Bindings,
    ) -> JaqalResult<()> {
        match gate.gate_def() {
            GateDefRef::Macro(m) => {
                let mut inner_bindings = Bindings::new();
                for (name, arg) in gate.parameters() {
                    inner_bindings.insert(name.clone(), substitute_argument(arg, outer_bindings)?);
                }
                self.expand_macro_body(acc, m.body(), &inner_bindings)
            }
            GateDefRef::Builtin(def) => {
                if def.is_busy() {
                    acc.insert(UsedQubit::All);
                    return Ok(());
                }
                if def.is_idle() {
                    return Ok(());
                }
                for (_, arg) in gate.parameters() {
                    let resolved = substitute_argument(arg, outer_bindings)?;
                    for used in self.argument_uses(&resolved)? {
                        acc.insert(used);
                    }
                }
                Ok(())
            }
        }
    }
}

impl Analyzer<UsedQubits> for Collector<'_> {
    fn visit_gate(&mut self, acc: &mut UsedQubits, gate: &GateStatement) -> JaqalResult<()> {
        self.expand_macro_gate(acc, gate, &Bindings::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jaqal_lang::parse;

    fn analyze(source: &str) -> UsedQubits {
        let circuit = parse(source).unwrap();
        UsedQubitAnalysis::new().compute(&circuit).unwrap()
    }

    #[test]
    fn named_qubit_argument_contributes_one_index() {
        let used = analyze("register q[3]\nPx q[1]\n");
        let indices: Vec<i64> = used.indices_for("q").unwrap().iter().cloned().collect();
        assert_eq!(indices, vec![1]);
    }

    #[test]
    fn register_argument_contributes_every_index() {
        let used = analyze("register q[3]\nmap s q\nPmz s\n");
        let indices: Vec<i64> = used.indices_for("q").unwrap().iter().cloned().collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn macro_call_expands_on_the_fly() {
        let used = analyze("register q[2]\nmacro foo a\n{\nPx a\n}\nfoo q[1]\n");
        let indices: Vec<i64> = used.indices_for("q").unwrap().iter().cloned().collect();
        assert_eq!(indices, vec![1]);
    }

    #[test]
    fn busy_gate_contributes_all_sentinel() {
        use jaqal_ir::GateDefinition;
        use std::rc::Rc;
        let def = Rc::new(GateDefinition::busy("prepare_all", vec![]));
        let gate = def.call(vec![]).unwrap();
        let body = BlockStatement::sequential(vec![Statement::Gate(gate)]);
        let ctx = ResolveContext::new();
        let collector = Collector { ctx: &ctx };
        let mut acc = UsedQubits::default();
        collector.expand_macro_body(&mut acc, &body, &Bindings::new()).unwrap();
        assert!(acc.uses_all());
    }
}
