//! Subcircuit-expansion pass (§4.7): bracket each subcircuit block with
//! prepare/measure gates and drop the `subcircuit` tag.
//!
//! Every subcircuit `BlockStatement` becomes an ordinary sequential block
//! whose first statement is a call to the prepare gate and whose last is a
//! call to the measure gate. The gate definitions are chosen with this
//! priority, per §4.7: a definition supplied directly; else a name looked
//! up in the circuit's `native_gates`; else the defaults `prepare_all` /
//! `measure_all`; else, failing all of those, a freshly synthesized
//! zero-parameter busy `GateDefinition` under that name — prepare and
//! measure each act on the whole register, so a synthesized one carries
//! the same "can't run in parallel with anything" semantics as a
//! hardware-provided one would.

use std::rc::Rc;

use jaqal_ir::{
    BlockStatement, BranchStatement, CaseStatement, Circuit, GateDefinition, JaqalResult,
    LoopStatement, Rewriter, Statement,
};

use crate::pass::Pass;

const DEFAULT_PREPARE_NAME: &str = "prepare_all";
const DEFAULT_MEASURE_NAME: &str = "measure_all";

/// Which bounding gate a `SubcircuitExpand` should use: an explicit
/// definition, a name to look up in the circuit's native gates (falling
/// back to synthesis), or (the default) the standard name.
#[derive(Debug, Clone)]
enum GateChoice {
    Definition(Rc<GateDefinition>),
    Name(String),
}

/// Brackets every subcircuit block with prepare/measure gates.
#[derive(Debug, Clone, Default)]
pub struct SubcircuitExpand {
    prepare: Option<GateChoice>,
    measure: Option<GateChoice>,
}

impl SubcircuitExpand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prepare_definition(mut self, def: Rc<GateDefinition>) -> Self {
        self.prepare = Some(GateChoice::Definition(def));
        self
    }

    pub fn with_prepare_name(mut self, name: impl Into<String>) -> Self {
        self.prepare = Some(GateChoice::Name(name.into()));
        self
    }

    pub fn with_measure_definition(mut self, def: Rc<GateDefinition>) -> Self {
        self.measure = Some(GateChoice::Definition(def));
        self
    }

    pub fn with_measure_name(mut self, name: impl Into<String>) -> Self {
        self.measure = Some(GateChoice::Name(name.into()));
        self
    }
}

fn choose_gate(choice: &Option<GateChoice>, default_name: &str, circuit: &Circuit) -> Rc<GateDefinition> {
    let name = match choice {
        Some(GateChoice::Definition(def)) => return def.clone(),
        Some(GateChoice::Name(name)) => name.as_str(),
        None => default_name,
    };
    circuit
        .find_native_gate(name)
        .cloned()
        .unwrap_or_else(|| Rc::new(GateDefinition::busy(name, vec![])))
}

impl Pass for SubcircuitExpand {
    fn name(&self) -> &str {
        "subcircuit-expand"
    }

    #[tracing::instrument(level = "debug", skip(self, circuit))]
    fn run(&self, circuit: Circuit) -> JaqalResult<Circuit> {
        let prepare_def = choose_gate(&self.prepare, DEFAULT_PREPARE_NAME, &circuit);
        let measure_def = choose_gate(&self.measure, DEFAULT_MEASURE_NAME, &circuit);

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
        for m in circuit.macros() {
            out.add_macro(m.clone())?;
        }

        let mut expander = Expander {
            prepare_def,
            measure_def,
        };
        let body = expander.expand_block(circuit.body().clone())?;
        out.set_body(body);
        Ok(out)
    }
}

struct Expander {
    prepare_def: Rc<GateDefinition>,
    measure_def: Rc<GateDefinition>,
}

impl Expander {
    fn expand_block(&mut self, block: BlockStatement) -> JaqalResult<BlockStatement> {
        let is_subcircuit = block.is_subcircuit();
        let parallel = block.parallel_flag();
        let mut out = Vec::with_capacity(block.statements().len());
        for stmt in block.into_statements() {
            out.push(self.visit(stmt)?);
        }
        if is_subcircuit {
            let prepare = self.prepare_def.call(vec![])?;
            let measure = self.measure_def.call(vec![])?;
            let mut stmts = Vec::with_capacity(out.len() + 2);
            stmts.push(Statement::Gate(prepare));
            stmts.extend(out);
            stmts.push(Statement::Gate(measure));
            Ok(BlockStatement::sequential(stmts))
        } else if parallel {
            Ok(BlockStatement::parallel(out))
        } else {
            Ok(BlockStatement::sequential(out))
        }
    }
}

impl Rewriter for Expander {
    fn visit_block(&mut self, block: BlockStatement) -> JaqalResult<Statement> {
        Ok(Statement::Block(self.expand_block(block)?))
    }

    fn visit_loop(&mut self, loop_stmt: LoopStatement) -> JaqalResult<Statement> {
        let iterations = loop_stmt.iterations().clone();
        let body = self.expand_block(loop_stmt.into_body())?;
        Ok(Statement::Loop(LoopStatement::new(iterations, body)?))
    }

    fn visit_branch(&mut self, branch: BranchStatement) -> JaqalResult<Statement> {
        let mut cases = Vec::with_capacity(branch.cases().len());
        for case in branch.into_cases() {
            let state = case.state().clone();
            let body = self.expand_block(case.into_body())?;
            cases.push(CaseStatement::new(state, body)?);
        }
        Ok(Statement::Branch(BranchStatement::new(cases)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jaqal_lang::{emit, parse};

    fn expanded(source: &str) -> Circuit {
        let circuit = parse(source).unwrap();
        SubcircuitExpand::new().run(circuit).unwrap()
    }

    #[test]
    fn subcircuit_gets_bracketed_with_default_names() {
        let circuit = expanded("register q[1]\nsubcircuit\n{\nPx q[0]\n}\n");
        let text = emit(&circuit);
        let prepare_pos = text.find("prepare_all").unwrap();
        let gate_pos = text.find("Px q[0]").unwrap();
        let measure_pos = text.find("measure_all").unwrap();
        assert!(prepare_pos < gate_pos && gate_pos < measure_pos, "got: {text}");
    }

    #[test]
    fn custom_prepare_name_is_used() {
        let circuit = parse("register q[1]\nsubcircuit\n{\nPx q[0]\n}\n").unwrap();
        let circuit = SubcircuitExpand::new()
            .with_prepare_name("my_prepare")
            .run(circuit)
            .unwrap();
        let text = emit(&circuit);
        assert!(text.contains("my_prepare"), "got: {text}");
    }

    #[test]
    fn nested_non_subcircuit_blocks_are_untouched() {
        let circuit = expanded("register q[2]\nsubcircuit\n{\n<\nPx q[0]\nPy q[1]\n>\n}\n");
        let text = emit(&circuit);
        assert!(text.contains("Px q[0]"));
        assert!(text.contains("Py q[1]"));
    }
}
