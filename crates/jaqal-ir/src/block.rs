//! Statements: gates, blocks, loops, and branches.
//!
//! Per the "Polymorphism over IR nodes" design note, every Jaqal statement
//! is a variant of one tagged sum type, [`Statement`], rather than being
//! modeled through a shared base class and runtime type dispatch.

use crate::error::{JaqalError, JaqalResult};
use crate::gate::GateStatement;
use crate::register::IndexExpr;

/// Any statement that can appear in a block body.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Gate(GateStatement),
    Block(BlockStatement),
    Loop(LoopStatement),
    Branch(BranchStatement),
}

impl Statement {
    /// Transitively, does this statement contain a subcircuit block? Used
    /// by the builder to reject loops that (directly or transitively)
    /// contain a subcircuit, per §3.2.
    pub fn contains_subcircuit(&self) -> bool {
        match self {
            Statement::Gate(_) => false,
            Statement::Block(b) => b.subcircuit || b.statements.iter().any(Statement::contains_subcircuit),
            Statement::Loop(l) => l.body.subcircuit || l.body.statements.iter().any(Statement::contains_subcircuit),
            Statement::Branch(br) => br
                .cases
                .iter()
                .any(|c| c.body.subcircuit || c.body.statements.iter().any(Statement::contains_subcircuit)),
        }
    }

    /// Does this statement (directly or transitively) contain a
    /// `LoopStatement`? Used to reject loops nested in parallel blocks.
    pub fn contains_loop(&self) -> bool {
        match self {
            Statement::Gate(_) => false,
            Statement::Loop(_) => true,
            Statement::Block(b) => b.statements.iter().any(Statement::contains_loop),
            Statement::Branch(br) => br.cases.iter().any(|c| c.body.statements.iter().any(Statement::contains_loop)),
        }
    }
}

/// A sequence of statements, either run one-after-another (sequential) or
/// simultaneously (parallel). A subcircuit block is a sequential block
/// bracketed by `prepare`/`measure` once expanded (§4.7); until then it is
/// tagged so the builder can enforce its nesting restrictions.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    parallel: bool,
    subcircuit: bool,
    iterations: Option<IndexExpr>,
    statements: Vec<Statement>,
}

impl BlockStatement {
    pub fn sequential(statements: Vec<Statement>) -> Self {
        BlockStatement {
            parallel: false,
            subcircuit: false,
            iterations: None,
            statements,
        }
    }

    pub fn parallel(statements: Vec<Statement>) -> Self {
        BlockStatement {
            parallel: true,
            subcircuit: false,
            iterations: None,
            statements,
        }
    }

    /// A subcircuit block. `iterations` is recorded but has no effect on
    /// the compiled shape (S5): it exists for the benefit of external
    /// schedulers, which are out of scope here.
    pub fn subcircuit(iterations: Option<IndexExpr>, statements: Vec<Statement>) -> JaqalResult<Self> {
        let block = BlockStatement {
            parallel: false,
            subcircuit: true,
            iterations,
            statements,
        };
        block.check_nesting(false, false)?;
        Ok(block)
    }

    pub fn parallel_flag(&self) -> bool {
        self.parallel
    }

    pub fn is_subcircuit(&self) -> bool {
        self.subcircuit
    }

    pub fn iterations(&self) -> Option<&IndexExpr> {
        self.iterations.as_ref()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn statements_mut(&mut self) -> &mut Vec<Statement> {
        &mut self.statements
    }

    pub fn into_statements(self) -> Vec<Statement> {
        self.statements
    }

    /// Recursively enforce: a subcircuit block is never parallel and never
    /// nested (directly or transitively) inside another subcircuit or
    /// parallel block; a parallel block never transitively contains a
    /// loop (Open Question (c): enforced uniformly, at build time too).
    pub fn check_nesting(&self, in_subcircuit: bool, in_parallel: bool) -> JaqalResult<()> {
        if self.subcircuit {
            if self.parallel {
                return Err(JaqalError::structure(
                    "a subcircuit block may not also be a parallel block",
                ));
            }
            if in_subcircuit || in_parallel {
                return Err(JaqalError::structure(
                    "a subcircuit block may not be nested inside a subcircuit or parallel block",
                ));
            }
        }
        if self.parallel {
            for stmt in &self.statements {
                if stmt.contains_loop() {
                    return Err(JaqalError::structure(
                        "a parallel block may not contain a loop",
                    ));
                }
            }
        }
        let child_subcircuit = in_subcircuit || self.subcircuit;
        let child_parallel = in_parallel || self.parallel;
        for stmt in &self.statements {
            if let Statement::Block(b) = stmt {
                b.check_nesting(child_subcircuit, child_parallel)?;
            }
            if let Statement::Loop(l) = stmt {
                l.check_nesting(child_subcircuit)?;
            }
            if let Statement::Branch(br) = stmt {
                for case in &br.cases {
                    case.body.check_nesting(child_subcircuit, child_parallel)?;
                }
            }
        }
        Ok(())
    }
}

/// A block executed `iterations` times.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopStatement {
    iterations: IndexExpr,
    body: BlockStatement,
}

impl LoopStatement {
    pub fn new(iterations: IndexExpr, body: BlockStatement) -> JaqalResult<Self> {
        iterations.check_integer_kind("loop count")?;
        if body.statements().iter().any(Statement::contains_subcircuit) || body.is_subcircuit() {
            return Err(JaqalError::structure(
                "a loop may not contain a subcircuit",
            ));
        }
        Ok(LoopStatement { iterations, body })
    }

    pub fn iterations(&self) -> &IndexExpr {
        &self.iterations
    }

    pub fn body(&self) -> &BlockStatement {
        &self.body
    }

    pub fn into_body(self) -> BlockStatement {
        self.body
    }

    fn check_nesting(&self, in_subcircuit: bool) -> JaqalResult<()> {
        self.body.check_nesting(in_subcircuit, false)
    }
}

/// One arm of a `branch` statement: run `body` when the subcircuit's
/// measurement result equals the bitmask `state`.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseStatement {
    state: IndexExpr,
    body: BlockStatement,
}

impl CaseStatement {
    pub fn new(state: IndexExpr, body: BlockStatement) -> JaqalResult<Self> {
        state.check_integer_kind("branch case state")?;
        Ok(CaseStatement { state, body })
    }

    pub fn state(&self) -> &IndexExpr {
        &self.state
    }

    pub fn body(&self) -> &BlockStatement {
        &self.body
    }

    pub fn into_body(self) -> BlockStatement {
        self.body
    }
}

/// An ordered set of mutually exclusive cases, dispatched on a
/// classical-measurement bitmask. Per the Design Note "Branch/case as
/// experimental", the original gates this behind a feature flag; this
/// implementation supports it unconditionally.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchStatement {
    cases: Vec<CaseStatement>,
}

impl BranchStatement {
    pub fn new(cases: Vec<CaseStatement>) -> Self {
        BranchStatement { cases }
    }

    pub fn cases(&self) -> &[CaseStatement] {
        &self.cases
    }

    pub fn into_cases(self) -> Vec<CaseStatement> {
        self.cases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{GateDefRef, GateDefinition, GateStatement};
    use std::rc::Rc;

    fn gate(name: &str) -> Statement {
        let def = Rc::new(GateDefinition::new(name, vec![]));
        Statement::Gate(GateStatement::new(GateDefRef::Builtin(def), vec![]))
    }

    #[test]
    fn subcircuit_cannot_be_parallel() {
        let err = BlockStatement {
            parallel: true,
            subcircuit: true,
            iterations: None,
            statements: vec![gate("g")],
        }
        .check_nesting(false, false)
        .unwrap_err();
        assert!(matches!(err, JaqalError::Structure { .. }));
    }

    #[test]
    fn subcircuit_rejects_nesting_inside_parallel() {
        let sub = BlockStatement::subcircuit(None, vec![gate("g")]).unwrap();
        let err = sub.check_nesting(false, true).unwrap_err();
        assert!(matches!(err, JaqalError::Structure { .. }));
    }

    #[test]
    fn loop_rejects_subcircuit_body() {
        let sub = BlockStatement::subcircuit(None, vec![gate("g")]).unwrap();
        let err = LoopStatement::new(IndexExpr::Int(3), sub).unwrap_err();
        assert!(matches!(err, JaqalError::Structure { .. }));
    }

    #[test]
    fn parallel_block_rejects_loop_child() {
        let loop_stmt = LoopStatement::new(
            IndexExpr::Int(2),
            BlockStatement::sequential(vec![gate("g")]),
        )
        .unwrap();
        let parallel = BlockStatement::parallel(vec![Statement::Loop(loop_stmt)]);
        let err = parallel.check_nesting(false, false).unwrap_err();
        assert!(matches!(err, JaqalError::Structure { .. }));
    }
}
