//! The visitor framework used by every semantic pass.
//!
//! Per the "Visitor dispatch" design note, the original walks IR nodes by
//! class ancestry at runtime; here `Statement` is a closed tagged union, so
//! dispatch is a `match` instead. `Rewriter` produces a new `Circuit` body
//! (used by let-fill, map-resolve, macro-expand, ...); `Analyzer` instead
//! accumulates into `T` without changing the tree (used by used-qubit
//! analysis, subcircuit discovery).

use crate::block::{BlockStatement, BranchStatement, CaseStatement, LoopStatement, Statement};
use crate::error::JaqalResult;
use crate::gate::GateStatement;

/// A pass that rewrites statements in place, producing a new tree.
/// Implementors override only the statement kinds they care about; the
/// default methods recurse structurally and leave everything else as-is.
pub trait Rewriter {
    fn visit_gate(&mut self, gate: GateStatement) -> JaqalResult<Statement> {
        Ok(Statement::Gate(gate))
    }

    fn visit_block(&mut self, block: BlockStatement) -> JaqalResult<Statement> {
        let rewritten = self.rewrite_block(block)?;
        Ok(Statement::Block(rewritten))
    }

    fn visit_loop(&mut self, loop_stmt: LoopStatement) -> JaqalResult<Statement> {
        let iterations = loop_stmt.iterations().clone();
        let body = self.rewrite_block(loop_stmt.into_body())?;
        Ok(Statement::Loop(LoopStatement::new(iterations, body)?))
    }

    fn visit_branch(&mut self, branch: BranchStatement) -> JaqalResult<Statement> {
        let mut cases = Vec::with_capacity(branch.cases().len());
        for case in branch.into_cases() {
            let state = case.state().clone();
            let body = self.rewrite_block(case.into_body())?;
            cases.push(CaseStatement::new(state, body)?);
        }
        Ok(Statement::Branch(BranchStatement::new(cases)))
    }

    /// Dispatch a single statement to the appropriate `visit_*` method.
    fn visit(&mut self, stmt: Statement) -> JaqalResult<Statement> {
        match stmt {
            Statement::Gate(g) => self.visit_gate(g),
            Statement::Block(b) => self.visit_block(b),
            Statement::Loop(l) => self.visit_loop(l),
            Statement::Branch(br) => self.visit_branch(br),
        }
    }

    /// Visit every statement in a block's body, keeping its parallel/
    /// subcircuit/iteration metadata.
    fn rewrite_block(&mut self, block: BlockStatement) -> JaqalResult<BlockStatement> {
        let parallel = block.parallel_flag();
        let subcircuit = block.is_subcircuit();
        let iterations = block.iterations().cloned();
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

/// A pass that inspects statements without rewriting them, folding results
/// into an accumulator `T` (e.g. the name->indices map built by used-qubit
/// analysis, or the trace built by subcircuit discovery).
pub trait Analyzer<T> {
    fn visit_gate(&mut self, acc: &mut T, gate: &GateStatement) -> JaqalResult<()>;

    fn visit_block(&mut self, acc: &mut T, block: &BlockStatement) -> JaqalResult<()> {
        self.walk_block(acc, block)
    }

    fn visit_loop(&mut self, acc: &mut T, loop_stmt: &LoopStatement) -> JaqalResult<()> {
        self.walk_block(acc, loop_stmt.body())
    }

    fn visit_branch(&mut self, acc: &mut T, branch: &BranchStatement) -> JaqalResult<()> {
        for case in branch.cases() {
            self.walk_block(acc, case.body())?;
        }
        Ok(())
    }

    fn visit(&mut self, acc: &mut T, stmt: &Statement) -> JaqalResult<()> {
        match stmt {
            Statement::Gate(g) => self.visit_gate(acc, g),
            Statement::Block(b) => self.visit_block(acc, b),
            Statement::Loop(l) => self.visit_loop(acc, l),
            Statement::Branch(br) => self.visit_branch(acc, br),
        }
    }

    fn walk_block(&mut self, acc: &mut T, block: &BlockStatement) -> JaqalResult<()> {
        for stmt in block.statements() {
            self.visit(acc, stmt)?;
        }
        Ok(())
    }
}
