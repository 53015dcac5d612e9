//! Macro-expansion pass (§4.5): inline every macro call.
//!
//! Each `GateStatement` whose definition is a `Macro` is replaced by the
//! macro's body with its parameters substituted by the call's arguments.
//! Nested macro calls (a macro body calling another macro) are expanded
//! recursively, post-order: a call is only substituted after whatever it
//! expands into has itself been walked for further calls. When the result
//! of substituting into a block yields an inner block whose `parallel` flag
//! matches the block it's spliced into, the two are flattened rather than
//! left nested — this is what keeps a straight-line sequence of inlined
//! macro calls from growing one block level per call.

use std::collections::HashMap;
use std::rc::Rc;

use jaqal_ir::{
    AliasSource, BlockStatement, BranchStatement, CaseStatement, Circuit, GateArgument,
    GateDefRef, GateStatement, IndexExpr, JaqalError, JaqalResult, LoopStatement, NamedQubit,
    Statement,
};

use crate::pass::Pass;

/// Inlines every macro call in a circuit's body.
#[derive(Debug, Clone, Copy)]
pub struct MacroExpand {
    preserve_definitions: bool,
}

impl Default for MacroExpand {
    fn default() -> Self {
        MacroExpand {
            preserve_definitions: false,
        }
    }
}

impl MacroExpand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the circuit's `macros` table in the output even though nothing
    /// calls into it anymore.
    pub fn with_preserve_definitions(mut self, preserve: bool) -> Self {
        self.preserve_definitions = preserve;
        self
    }
}

impl Pass for MacroExpand {
    fn name(&self) -> &str {
        "macro-expand"
    }

    #[tracing::instrument(level = "debug", skip(self, circuit))]
    fn run(&self, circuit: Circuit) -> JaqalResult<Circuit> {
        let mut out = Circuit::new();
        for c in circuit.constants() {
            out.add_constant(c.clone())?;
        }
        for u in circuit.usepulses() {
            out.add_usepulses(u.clone());
        }
        for r in circuit.registers() {
            out.add_register(r.clone())?;
        }
        for g in circuit.native_gates() {
            out.add_native_gate(g.clone())?;
        }
        if self.preserve_definitions {
            for m in circuit.macros() {
                out.add_macro(m.clone())?;
            }
        }
        let body = expand_block(circuit.body().clone())?;
        out.set_body(body);
        Ok(out)
    }
}

pub(crate) type Bindings = HashMap<String, GateArgument>;

/// Expand every macro call within a block, post-order, splicing a spliced
/// call's same-kind block flat into its parent.
fn expand_block(block: BlockStatement) -> JaqalResult<BlockStatement> {
    let parallel = block.parallel_flag();
    let subcircuit = block.is_subcircuit();
    let iterations = block.iterations().cloned();
    let mut out = Vec::with_capacity(block.statements().len());
    for stmt in block.into_statements() {
        let rewritten = expand_statement(stmt)?;
        match rewritten {
            Statement::Block(inner)
                if !subcircuit && inner.parallel_flag() == parallel && !inner.is_subcircuit() =>
            {
                out.extend(inner.into_statements());
            }
            other => out.push(other),
        }
    }
    Ok(if subcircuit {
        BlockStatement::subcircuit(iterations, out)?
    } else if parallel {
        BlockStatement::parallel(out)
    } else {
        BlockStatement::sequential(out)
    })
}

fn expand_statement(stmt: Statement) -> JaqalResult<Statement> {
    match stmt {
        Statement::Gate(g) => expand_gate(g),
        Statement::Block(b) => Ok(Statement::Block(expand_block(b)?)),
        Statement::Loop(l) => {
            let iterations = l.iterations().clone();
            let body = expand_block(l.into_body())?;
            Ok(Statement::Loop(LoopStatement::new(iterations, body)?))
        }
        Statement::Branch(br) => {
            let mut cases = Vec::with_capacity(br.cases().len());
            for case in br.into_cases() {
                let state = case.state().clone();
                let body = expand_block(case.into_body())?;
                cases.push(CaseStatement::new(state, body)?);
            }
            Ok(Statement::Branch(BranchStatement::new(cases)))
        }
    }
}

fn expand_gate(gate: GateStatement) -> JaqalResult<Statement> {
    match gate.gate_def().clone() {
        GateDefRef::Macro(m) => {
            if m.gate_parameters().len() != gate.parameters().len() {
                return Err(JaqalError::arity(format!(
                    "macro {}: expected {} arguments, found {}",
                    m.gate_name(),
                    m.gate_parameters().len(),
                    gate.parameters().len()
                )));
            }
            let bindings: Bindings = gate
                .parameters()
                .iter()
                .map(|(name, arg)| (name.clone(), arg.clone()))
                .collect();
            let substituted = substitute_block(m.body().clone(), &bindings)?;
            let expanded = expand_block(substituted)?;
            Ok(Statement::Block(expanded))
        }
        GateDefRef::Builtin(_) => Ok(Statement::Gate(gate)),
    }
}

fn substitute_block(block: BlockStatement, bindings: &Bindings) -> JaqalResult<BlockStatement> {
    let parallel = block.parallel_flag();
    let subcircuit = block.is_subcircuit();
    let iterations = block
        .iterations()
        .map(|i| substitute_index(i, bindings))
        .transpose()?;
    let mut out = Vec::with_capacity(block.statements().len());
    for stmt in block.into_statements() {
        out.push(substitute_statement(stmt, bindings)?);
    }
    Ok(if subcircuit {
        BlockStatement::subcircuit(iterations, out)?
    } else if parallel {
        BlockStatement::parallel(out)
    } else {
        BlockStatement::sequential(out)
    })
}

fn substitute_statement(stmt: Statement, bindings: &Bindings) -> JaqalResult<Statement> {
    match stmt {
        Statement::Gate(g) => {
            let def = g.gate_def().clone();
            let mut params = Vec::with_capacity(g.parameters().len());
            for (name, arg) in g.parameters() {
                params.push((name.clone(), substitute_argument(arg, bindings)?));
            }
            Ok(Statement::Gate(GateStatement::new(def, params)))
        }
        Statement::Block(b) => Ok(Statement::Block(substitute_block(b, bindings)?)),
        Statement::Loop(l) => {
            let iterations = substitute_index(l.iterations(), bindings)?;
            let body = substitute_block(l.into_body(), bindings)?;
            Ok(Statement::Loop(LoopStatement::new(iterations, body)?))
        }
        Statement::Branch(br) => {
            let mut cases = Vec::with_capacity(br.cases().len());
            for case in br.into_cases() {
                let state = substitute_index(case.state(), bindings)?;
                let body = substitute_block(case.into_body(), bindings)?;
                cases.push(CaseStatement::new(state, body)?);
            }
            Ok(Statement::Branch(BranchStatement::new(cases)))
        }
    }
}

pub(crate) fn substitute_argument(arg: &GateArgument, bindings: &Bindings) -> JaqalResult<GateArgument> {
    match arg {
        GateArgument::Unresolved(p) => bindings
            .get(p.name())
            .cloned()
            .ok_or_else(|| JaqalError::name(format!("unbound macro parameter {}", p.name()))),
        GateArgument::Qubit(q) => match q.alias_from() {
            AliasSource::Parameter(p) => {
                let bound = bindings
                    .get(p.name())
                    .ok_or_else(|| JaqalError::name(format!("unbound macro parameter {}", p.name())))?;
                let root = match bound {
                    GateArgument::Register(r) => r.clone(),
                    other => {
                        return Err(JaqalError::ty(format!(
                            "macro parameter {} bound to non-register argument {:?}",
                            p.name(),
                            other
                        )));
                    }
                };
                let idx = substitute_index(q.alias_index(), bindings)?;
                Ok(GateArgument::Qubit(Rc::new(NamedQubit::new(
                    q.name(),
                    AliasSource::Register(root),
                    idx,
                )?)))
            }
            AliasSource::Register(_) => Ok(arg.clone()),
        },
        other => Ok(other.clone()),
    }
}

fn substitute_index(idx: &IndexExpr, bindings: &Bindings) -> JaqalResult<IndexExpr> {
    match idx {
        IndexExpr::Int(v) => Ok(IndexExpr::Int(*v)),
        IndexExpr::Const(c) => Ok(IndexExpr::Const(c.clone())),
        IndexExpr::Param(p) => match bindings.get(p.name()) {
            Some(GateArgument::Int(v)) => Ok(IndexExpr::Int(*v)),
            Some(GateArgument::Float(v)) if v.fract() == 0.0 => Ok(IndexExpr::Int(*v as i64)),
            Some(other) => Err(JaqalError::ty(format!(
                "macro parameter {} used as an index but bound to {:?}",
                p.name(),
                other
            ))),
            // Not in this call's bindings: shadowed by an outer, still
            // unexpanded macro call, left alone for the next pass.
            None => Ok(IndexExpr::Param(p.clone())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jaqal_lang::{emit, parse};

    fn expanded(source: &str) -> Circuit {
        let circuit = parse(source).unwrap();
        MacroExpand::new().run(circuit).unwrap()
    }

    #[test]
    fn simple_macro_call_inlines_body() {
        let circuit = expanded("register q[1]\nmacro foo a\n{\nPx a\nPy a\n}\nfoo q[0]\n");
        let text = emit(&circuit);
        assert!(text.contains("Px q[0]"), "got: {text}");
        assert!(text.contains("Py q[0]"), "got: {text}");
        assert!(!text.contains("foo q[0]"));
    }

    #[test]
    fn macro_definitions_dropped_by_default() {
        let circuit = expanded("register q[1]\nmacro foo a\n{\nPx a\n}\nfoo q[0]\n");
        assert!(circuit.macros().is_empty());
    }

    #[test]
    fn preserve_definitions_keeps_macro_table() {
        let circuit = parse("register q[1]\nmacro foo a\n{\nPx a\n}\nfoo q[0]\n").unwrap();
        let circuit = MacroExpand::new().with_preserve_definitions(true).run(circuit).unwrap();
        assert_eq!(circuit.macros().len(), 1);
    }

    #[test]
    fn nested_macro_calls_expand_post_order() {
        let source = "register q[1]\nmacro inner a\n{\nPx a\n}\nmacro outer b\n{\ninner b\nPy b\n}\nouter q[0]\n";
        let circuit = expanded(source);
        let text = emit(&circuit);
        assert!(text.contains("Px q[0]"), "got: {text}");
        assert!(text.contains("Py q[0]"), "got: {text}");
    }

    #[test]
    fn arity_mismatch_is_fatal() {
        // The builder already enforces call arity, so a mismatch can only
        // be synthesized directly through the IR rather than through
        // source text; this exercises that the pass would reject it too.
        use jaqal_ir::{GateDefRef as Ref, Macro};
        let m = Rc::new(Macro::new(
            "foo",
            vec![jaqal_ir::Parameter::new("a", jaqal_ir::ParamType::Qubit)],
            BlockStatement::sequential(vec![]),
        ));
        let stmt = GateStatement::new(Ref::Macro(m), vec![]);
        let err = expand_gate(stmt).unwrap_err();
        assert!(matches!(err, JaqalError::Arity { .. }));
    }
}
