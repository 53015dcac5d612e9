//! Let-fill pass (§4.4): replace `let`-constant references with their
//! literal values everywhere a numeric site is still symbolic.
//!
//! An override dictionary is already baked into each `Constant`'s own value
//! at build time (`Builder::build_let`), so by the time a `Circuit` exists
//! every `Constant` already carries its final value — this pass does not
//! need one of its own. What it erases is the remaining `IndexExpr::Const`
//! occurrences: register sizes, map slices, loop counts, branch-case states,
//! subcircuit iteration counts. Each is replaced by the literal `IndexExpr`
//! it resolves to, so downstream passes no longer need the `constants` table
//! to interpret the body — though the table itself is preserved in the
//! output, per §4.4. A reference shadowed by a macro parameter
//! (`IndexExpr::Param`) is left untouched.

use std::collections::HashMap;
use std::rc::Rc;

use jaqal_ir::{
    AliasSource, BlockStatement, BranchStatement, CaseStatement, Circuit, GateArgument,
    GateStatement, IndexExpr, JaqalResult, LoopStatement, Macro, NamedQubit, Register,
    RegisterKind, ResolveContext, Rewriter, SliceExpr, Statement,
};

use crate::pass::Pass;

/// Resolves every `let`-constant reference in a circuit to its literal
/// value.
#[derive(Debug, Default)]
pub struct LetFill;

impl LetFill {
    pub fn new() -> Self {
        LetFill
    }
}

impl Pass for LetFill {
    fn name(&self) -> &str {
        "let-fill"
    }

    #[tracing::instrument(level = "debug", skip(self, circuit))]
    fn run(&self, circuit: Circuit) -> JaqalResult<Circuit> {
        let mut filler = Filler::new();

        let mut out = Circuit::new();
        for c in circuit.constants() {
            out.add_constant(c.clone())?;
        }
        for u in circuit.usepulses() {
            out.add_usepulses(u.clone());
        }
        for r in circuit.registers() {
            let filled = filler.fill_register(r)?;
            out.add_register(filled)?;
        }
        for g in circuit.native_gates() {
            out.add_native_gate(g.clone())?;
        }
        for m in circuit.macros() {
            let body = filler.fill_block(m.body().clone())?;
            out.add_macro(Rc::new(Macro::new(m.gate_name(), m.gate_parameters().to_vec(), body)))?;
        }
        let body = filler.fill_block(circuit.body().clone())?;
        out.set_body(body);
        Ok(out)
    }
}

/// Resolves every `let` constant to its literal value, memoizing rebuilt
/// registers by name so aliases sharing a source register resolve to the
/// same new `Rc`.
struct Filler {
    registers: HashMap<String, Rc<Register>>,
}

impl Filler {
    fn new() -> Self {
        Filler {
            registers: HashMap::new(),
        }
    }

    fn fill_index(&self, idx: &IndexExpr) -> JaqalResult<IndexExpr> {
        match idx {
            IndexExpr::Int(v) => Ok(IndexExpr::Int(*v)),
            IndexExpr::Const(c) => {
                use jaqal_ir::AnnotatedValue;
                let value = c.resolve_value(&ResolveContext::new())?;
                let i = value.as_i64().ok_or_else(|| {
                    jaqal_ir::JaqalError::ty(format!("constant {} is not integer-valued", c.name()))
                })?;
                Ok(IndexExpr::Int(i))
            }
            IndexExpr::Param(p) => Ok(IndexExpr::Param(p.clone())),
        }
    }

    fn fill_slice(&self, slice: &SliceExpr) -> JaqalResult<SliceExpr> {
        Ok(SliceExpr {
            start: slice.start.as_ref().map(|i| self.fill_index(i)).transpose()?,
            stop: slice.stop.as_ref().map(|i| self.fill_index(i)).transpose()?,
            step: slice.step.as_ref().map(|i| self.fill_index(i)).transpose()?,
        })
    }

    fn fill_register(&mut self, reg: &Rc<Register>) -> JaqalResult<Rc<Register>> {
        if let Some(existing) = self.registers.get(reg.name()) {
            return Ok(existing.clone());
        }
        let filled = match reg.kind() {
            RegisterKind::Fundamental { size } => {
                Register::fundamental(reg.name(), self.fill_index(size)?)?
            }
            RegisterKind::Alias { source, slice } => {
                let new_source = match source {
                    AliasSource::Register(src) => AliasSource::Register(self.fill_register(src)?),
                    AliasSource::Parameter(p) => AliasSource::Parameter(p.clone()),
                };
                let new_slice = slice.as_ref().map(|s| self.fill_slice(s)).transpose()?;
                Register::alias(reg.name(), new_source, new_slice)?
            }
        };
        let rc = Rc::new(filled);
        self.registers.insert(reg.name().to_string(), rc.clone());
        Ok(rc)
    }

    fn fill_qubit(&mut self, q: &Rc<NamedQubit>) -> JaqalResult<Rc<NamedQubit>> {
        let alias_from = match q.alias_from() {
            AliasSource::Register(src) => AliasSource::Register(self.fill_register(src)?),
            AliasSource::Parameter(p) => AliasSource::Parameter(p.clone()),
        };
        let alias_index = self.fill_index(q.alias_index())?;
        Ok(Rc::new(NamedQubit::new(q.name(), alias_from, alias_index)?))
    }

    fn fill_argument(&mut self, arg: &GateArgument) -> JaqalResult<GateArgument> {
        Ok(match arg {
            GateArgument::Int(v) => GateArgument::Int(*v),
            GateArgument::Float(v) => GateArgument::Float(*v),
            GateArgument::Register(r) => GateArgument::Register(self.fill_register(r)?),
            GateArgument::Qubit(q) => GateArgument::Qubit(self.fill_qubit(q)?),
            GateArgument::Unresolved(p) => GateArgument::Unresolved(p.clone()),
        })
    }

    /// Rewrite a block's statements and, for a subcircuit block, its
    /// iteration count. Used directly (rather than through `Rewriter`'s
    /// default `rewrite_block`) so that a subcircuit block's iteration
    /// count is always filled, however it is reached.
    fn fill_block(&mut self, block: BlockStatement) -> JaqalResult<BlockStatement> {
        let parallel = block.parallel_flag();
        let subcircuit = block.is_subcircuit();
        let iterations = block.iterations().map(|i| self.fill_index(i)).transpose()?;
        let mut out = Vec::with_capacity(block.statements().len());
        for stmt in block.into_statements() {
            out.push(self.visit(stmt)?);
        }
        Ok(if subcircuit {
            BlockStatement::subcircuit(iterations, out)?
        } else if parallel {
            BlockStatement::parallel(out)
        } else {
            BlockStatement::sequential(out)
        })
    }
}

impl Rewriter for Filler {
    fn visit_gate(&mut self, gate: GateStatement) -> JaqalResult<Statement> {
        let def = gate.gate_def().clone();
        let mut params = Vec::with_capacity(gate.parameters().len());
        for (name, arg) in gate.parameters() {
            params.push((name.clone(), self.fill_argument(arg)?));
        }
        Ok(Statement::Gate(GateStatement::new(def, params)))
    }

    fn visit_block(&mut self, block: BlockStatement) -> JaqalResult<Statement> {
        Ok(Statement::Block(self.fill_block(block)?))
    }

    fn visit_loop(&mut self, loop_stmt: LoopStatement) -> JaqalResult<Statement> {
        let iterations = self.fill_index(loop_stmt.iterations())?;
        let body = self.fill_block(loop_stmt.into_body())?;
        Ok(Statement::Loop(LoopStatement::new(iterations, body)?))
    }

    fn visit_branch(&mut self, branch: BranchStatement) -> JaqalResult<Statement> {
        let mut cases = Vec::with_capacity(branch.cases().len());
        for case in branch.into_cases() {
            let state = self.fill_index(case.state())?;
            let body = self.fill_block(case.into_body())?;
            cases.push(CaseStatement::new(state, body)?);
        }
        Ok(Statement::Branch(BranchStatement::new(cases)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jaqal_lang::{emit, parse};

    fn filled(source: &str) -> Circuit {
        let circuit = parse(source).unwrap();
        LetFill::new().run(circuit).unwrap()
    }

    #[test]
    fn register_size_constant_becomes_literal() {
        let circuit = filled("let n 3\nregister q[n]\n");
        let text = emit(&circuit);
        assert!(text.contains("register q[3]"), "got: {text}");
        assert!(!text.contains("register q[n]"));
    }

    #[test]
    fn constants_table_is_preserved() {
        let circuit = filled("let n 3\nregister q[n]\n");
        assert_eq!(circuit.constants().len(), 1);
        assert_eq!(circuit.constants()[0].name(), "n");
    }

    #[test]
    fn map_slice_bounds_resolve() {
        let circuit = filled("let lo 1\nlet hi 4\nregister q[5]\nmap s q[lo:hi]\n");
        let text = emit(&circuit);
        assert!(text.contains("map s q[1:4]"), "got: {text}");
    }

    #[test]
    fn loop_count_constant_resolves() {
        let circuit = filled("let reps 2\nregister q[1]\nloop reps\n{\nPx q[0]\n}\n");
        let text = emit(&circuit);
        assert!(text.contains("loop 2"), "got: {text}");
    }

    #[test]
    fn macro_parameter_shadowed_index_is_untouched() {
        // Inside a macro body a bare identifier that names a macro
        // parameter resolves to `IndexExpr::Param`, never `Const`, so
        // let-fill has nothing to do with it; this just exercises that the
        // macro body still round-trips through the pass.
        let circuit = filled("register q[2]\nmacro foo a\n{\nPx a\n}\nfoo q[0]\n");
        assert_eq!(circuit.macros().len(), 1);
    }
}
