//! Unit-timing normalization pass (§4.8).
//!
//! Assumes every gate occupies one unit of time, then rewrites the body so
//! it is a sequential block whose children are either `GateStatement`s or
//! *parallel* `BlockStatement`s — never a sequential block nested inside
//! another sequential block, except at the top level.
//!
//! A sequential block's children are simply spliced flat into their parent.
//! A parallel block's N children are each unrolled into their own
//! time-ordered lane (a sequential child contributes one lane entry per
//! statement it holds; anything else is a single-entry lane), the lanes are
//! aligned by index, and whatever is present at each index is merged into
//! one statement: the bare statement if only one lane has an entry there,
//! otherwise a new parallel block of all of them. A lane running out
//! before its siblings simply contributes nothing at the steps past its
//! end — this implementation does not synthesize per-gate idle fillers to
//! pad a shorter lane back out to the others' length, since pairing an
//! idle gate with "the gate across the lane" isn't well-defined once lanes
//! come from heterogeneous sources (a macro-expanded call vs. a bare gate).
//! A loop surfacing inside a parallel block — directly, or revealed only
//! after macro expansion replaced what had been a single gate call — is an
//! error.

use jaqal_ir::{
    BlockStatement, BranchStatement, CaseStatement, Circuit, JaqalError, JaqalResult,
    LoopStatement, Statement,
};

use crate::pass::Pass;

/// Normalizes a circuit's body to unit-timing form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitTiming;

impl UnitTiming {
    pub fn new() -> Self {
        UnitTiming
    }
}

impl Pass for UnitTiming {
    fn name(&self) -> &str {
        "unit-timing"
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
        for m in circuit.macros() {
            out.add_macro(m.clone())?;
        }
        let body = normalize_block(circuit.body().clone())?;
        out.set_body(body);
        Ok(out)
    }
}

fn normalize_statement(stmt: Statement) -> JaqalResult<Statement> {
    match stmt {
        Statement::Gate(g) => Ok(Statement::Gate(g)),
        Statement::Block(b) => Ok(Statement::Block(normalize_block(b)?)),
        Statement::Loop(l) => {
            let iterations = l.iterations().clone();
            let body = normalize_block(l.into_body())?;
            Ok(Statement::Loop(LoopStatement::new(iterations, body)?))
        }
        Statement::Branch(br) => {
            let mut cases = Vec::with_capacity(br.cases().len());
            for case in br.into_cases() {
                let state = case.state().clone();
                let body = normalize_block(case.into_body())?;
                cases.push(CaseStatement::new(state, body)?);
            }
            Ok(Statement::Branch(BranchStatement::new(cases)))
        }
    }
}

/// The time-ordered lane a single (already-normalized) statement
/// contributes when it sits inside a parallel block being aligned: a
/// sequential block's own statements, one per step; anything else, itself,
/// as the lane's sole entry.
fn unroll(stmt: Statement) -> Vec<Statement> {
    match stmt {
        Statement::Block(b) if !b.parallel_flag() && !b.is_subcircuit() => b.into_statements(),
        other => vec![other],
    }
}

fn normalize_block(block: BlockStatement) -> JaqalResult<BlockStatement> {
    let parallel = block.parallel_flag();
    let subcircuit = block.is_subcircuit();
    let iterations = block.iterations().cloned();
    let mut children = Vec::with_capacity(block.statements().len());
    for stmt in block.into_statements() {
        children.push(normalize_statement(stmt)?);
    }

    if subcircuit {
        return BlockStatement::subcircuit(iterations, children);
    }

    if !parallel {
        let mut out = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Statement::Block(b) if !b.parallel_flag() && !b.is_subcircuit() => {
                    out.extend(b.into_statements());
                }
                other => out.push(other),
            }
        }
        return Ok(BlockStatement::sequential(out));
    }

    let lanes: Vec<Vec<Statement>> = children.into_iter().map(unroll).collect();
    for lane in &lanes {
        for item in lane {
            if item.contains_loop() {
                return Err(JaqalError::structure(
                    "a parallel block may not contain a loop",
                ));
            }
        }
    }
    let max_len = lanes.iter().map(Vec::len).max().unwrap_or(0);
    let mut steps = Vec::with_capacity(max_len);
    for i in 0..max_len {
        let mut units: Vec<Statement> = Vec::new();
        for lane in &lanes {
            if let Some(stmt) = lane.get(i) {
                units.push(stmt.clone());
            }
        }
        let step = if units.len() == 1 {
            units.into_iter().next().expect("checked len == 1")
        } else {
            Statement::Block(BlockStatement::parallel(units))
        };
        steps.push(step);
    }
    Ok(BlockStatement::sequential(steps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jaqal_lang::{emit, parse};

    fn normalized(source: &str) -> Circuit {
        let circuit = parse(source).unwrap();
        UnitTiming::new().run(circuit).unwrap()
    }

    #[test]
    fn sequential_nested_in_sequential_splices_flat() {
        let circuit = normalized("register q[1]\n{\nPx q[0]\nPy q[0]\n}\n");
        let text = emit(&circuit);
        assert!(text.contains("Px q[0]"));
        assert!(text.contains("Py q[0]"));
    }

    #[test]
    fn parallel_block_of_equal_length_lanes_merges_by_step() {
        let circuit = normalized("register q[2]\n<\n{\nPx q[0]\nPy q[0]\n}\nPz q[1]\n>\n");
        let text = emit(&circuit);
        // step 0: Px q[0] and Pz q[1] merge into one parallel block; step 1: Py q[0] alone.
        assert!(text.contains("Px q[0]"));
        assert!(text.contains("Pz q[1]"));
        assert!(text.contains("Py q[0]"));
    }

    #[test]
    fn loop_inside_parallel_block_is_rejected() {
        // A loop can't be written directly inside a parallel block in
        // source (the builder rejects it), so this constructs the
        // violating shape directly through the IR instead.
        use jaqal_ir::{GateDefRef, GateDefinition, GateStatement, IndexExpr};
        use std::rc::Rc;
        let def = Rc::new(GateDefinition::new("g", vec![]));
        let gate = GateStatement::new(GateDefRef::Builtin(def), vec![]);
        let loop_stmt = LoopStatement::new(
            IndexExpr::Int(2),
            BlockStatement::sequential(vec![Statement::Gate(gate)]),
        )
        .unwrap();
        let parallel = BlockStatement::parallel(vec![Statement::Loop(loop_stmt)]);
        let err = normalize_block(parallel).unwrap_err();
        assert!(matches!(err, JaqalError::Structure { .. }));
    }
}
