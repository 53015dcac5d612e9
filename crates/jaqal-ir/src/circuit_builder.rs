//! Fluent circuit-construction façade (§4.13, supplemented by §4.15).
//!
//! Grounded on `jaqalpaq/core/circuitbuilder.py`'s object-oriented
//! `Circuit`/`BlockBuilder`/`SequentialBlockBuilder` classes, and on the
//! teacher's `arvak-ir/src/circuit.rs` gate-method chaining style
//! (`&mut self -> IrResult<&mut Self>`). Every method here appends one
//! s-expression fragment — the exact form [`crate::sexpr::SExpr`] the parser
//! itself produces (§4.1's form table) — so `CircuitBuilder` and
//! `jaqal_lang::parse` always agree on what a given fragment means, and
//! [`CircuitBuilder::build`] simply hands the accumulated tree to the same
//! [`Builder`] the parser uses.

use crate::builder::{Builder, BuilderOptions};
use crate::circuit::Circuit;
use crate::error::JaqalResult;
use crate::pulse::{NullPulseLoader, PulseLoader};
use crate::sexpr::SExpr;

/// One gate-call argument: a literal, a bare identifier (a register, a
/// macro parameter, or a previously `let`-bound constant), or an indexed
/// qubit reference `name[index]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Int(i64),
    Float(f64),
    Ident(String),
    Indexed(String, i64),
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Float(v)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Ident(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Ident(v)
    }
}

/// An indexed qubit reference, `name[index]`, as a gate argument.
pub fn qubit(name: impl Into<String>, index: i64) -> Arg {
    Arg::Indexed(name.into(), index)
}

fn arg_sexpr(arg: Arg) -> SExpr {
    match arg {
        Arg::Int(v) => SExpr::Int(v),
        Arg::Float(v) => SExpr::Float(v),
        Arg::Ident(name) => SExpr::word(name),
        Arg::Indexed(name, index) => SExpr::list(vec![
            SExpr::word("array_item"),
            SExpr::word(name),
            SExpr::Int(index),
        ]),
    }
}

fn gate_sexpr(name: impl Into<String>, args: impl IntoIterator<Item = Arg>) -> SExpr {
    let mut items = vec![SExpr::word("gate"), SExpr::word(name.into())];
    items.extend(args.into_iter().map(arg_sexpr));
    SExpr::list(items)
}

fn slice_bound(v: Option<i64>) -> SExpr {
    match v {
        Some(n) => SExpr::Int(n),
        None => SExpr::word("null"),
    }
}

/// Accumulates the statements of one block (sequential, parallel, a macro
/// body, a loop body, or a branch case) as s-expressions.
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    parallel: bool,
    items: Vec<SExpr>,
}

impl BlockBuilder {
    fn sequential() -> Self {
        BlockBuilder {
            parallel: false,
            items: Vec::new(),
        }
    }

    fn parallel() -> Self {
        BlockBuilder {
            parallel: true,
            items: Vec::new(),
        }
    }

    /// Append a gate call.
    pub fn gate(&mut self, name: impl Into<String>, args: impl IntoIterator<Item = Arg>) -> &mut Self {
        self.items.push(gate_sexpr(name, args));
        self
    }

    /// Append a nested `{ ... }` sequential block.
    pub fn sequential_block(&mut self, body: impl FnOnce(&mut BlockBuilder)) -> &mut Self {
        let mut block = BlockBuilder::sequential();
        body(&mut block);
        self.items.push(block.into_sexpr());
        self
    }

    /// Append a nested `< ... >` simultaneous block.
    pub fn parallel_block(&mut self, body: impl FnOnce(&mut BlockBuilder)) -> &mut Self {
        let mut block = BlockBuilder::parallel();
        body(&mut block);
        self.items.push(block.into_sexpr());
        self
    }

    /// Append a `loop count { ... }`.
    pub fn loop_stmt(&mut self, count: i64, body: impl FnOnce(&mut BlockBuilder)) -> &mut Self {
        let mut block = BlockBuilder::sequential();
        body(&mut block);
        self.items.push(SExpr::list(vec![
            SExpr::word("loop"),
            SExpr::Int(count),
            block.into_sexpr(),
        ]));
        self
    }

    /// Append a `branch { case state { ... } ... }`. Each entry is one
    /// case's measurement state and the body that runs for it.
    pub fn branch<F>(&mut self, cases: impl IntoIterator<Item = (i64, F)>) -> &mut Self
    where
        F: FnOnce(&mut BlockBuilder),
    {
        let mut items = vec![SExpr::word("branch")];
        for (state, body) in cases {
            let mut block = BlockBuilder::sequential();
            body(&mut block);
            items.push(SExpr::list(vec![
                SExpr::word("case"),
                SExpr::Int(state),
                block.into_sexpr(),
            ]));
        }
        self.items.push(SExpr::List(items));
        self
    }

    fn into_sexpr(self) -> SExpr {
        let command = if self.parallel {
            "parallel_block"
        } else {
            "sequential_block"
        };
        let mut items = vec![SExpr::word(command)];
        items.extend(self.items);
        SExpr::List(items)
    }
}

/// Accumulates top-level Jaqal statements as s-expressions and builds them
/// into a [`Circuit`] on demand.
#[derive(Debug, Clone, Default)]
pub struct CircuitBuilder {
    items: Vec<SExpr>,
}

impl CircuitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `register name[size]`
    pub fn register(&mut self, name: impl Into<String>, size: i64) -> &mut Self {
        self.items.push(SExpr::list(vec![
            SExpr::word("register"),
            SExpr::word(name.into()),
            SExpr::Int(size),
        ]));
        self
    }

    /// `map name source` — a whole-register alias.
    pub fn map(&mut self, name: impl Into<String>, source: impl Into<String>) -> &mut Self {
        self.items.push(SExpr::list(vec![
            SExpr::word("map"),
            SExpr::word(name.into()),
            SExpr::word(source.into()),
        ]));
        self
    }

    /// `map name source[index]` — a single-qubit alias.
    pub fn map_index(&mut self, name: impl Into<String>, source: impl Into<String>, index: i64) -> &mut Self {
        self.items.push(SExpr::list(vec![
            SExpr::word("map"),
            SExpr::word(name.into()),
            SExpr::word(source.into()),
            SExpr::Int(index),
        ]));
        self
    }

    /// `map name source[start:stop:step]` — any bound `None` means open.
    pub fn map_slice(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    ) -> &mut Self {
        self.items.push(SExpr::list(vec![
            SExpr::word("map"),
            SExpr::word(name.into()),
            SExpr::word(source.into()),
            slice_bound(start),
            slice_bound(stop),
            slice_bound(step),
        ]));
        self
    }

    /// `let name value`
    pub fn let_int(&mut self, name: impl Into<String>, value: i64) -> &mut Self {
        self.items.push(SExpr::list(vec![
            SExpr::word("let"),
            SExpr::word(name.into()),
            SExpr::Int(value),
        ]));
        self
    }

    pub fn let_float(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.items.push(SExpr::list(vec![
            SExpr::word("let"),
            SExpr::word(name.into()),
            SExpr::Float(value),
        ]));
        self
    }

    /// `usepulses module all`
    pub fn usepulses_all(&mut self, module: impl Into<String>) -> &mut Self {
        self.items.push(SExpr::list(vec![
            SExpr::word("usepulses"),
            SExpr::word(module.into()),
            SExpr::word("all"),
        ]));
        self
    }

    /// `usepulses module [names...]`
    pub fn usepulses(&mut self, module: impl Into<String>, names: impl IntoIterator<Item = String>) -> &mut Self {
        self.items.push(SExpr::list(vec![
            SExpr::word("usepulses"),
            SExpr::word(module.into()),
            SExpr::list(names.into_iter().map(SExpr::word).collect()),
        ]));
        self
    }

    /// `macro name params... { ... }`
    pub fn macro_def(
        &mut self,
        name: impl Into<String>,
        params: impl IntoIterator<Item = String>,
        body: impl FnOnce(&mut BlockBuilder),
    ) -> &mut Self {
        let mut items = vec![SExpr::word("macro"), SExpr::word(name.into())];
        items.extend(params.into_iter().map(SExpr::word));
        let mut block = BlockBuilder::sequential();
        body(&mut block);
        items.push(block.into_sexpr());
        self.items.push(SExpr::List(items));
        self
    }

    /// A top-level gate call.
    pub fn gate(&mut self, name: impl Into<String>, args: impl IntoIterator<Item = Arg>) -> &mut Self {
        self.items.push(gate_sexpr(name, args));
        self
    }

    /// A top-level `{ ... }` sequential block.
    pub fn sequential_block(&mut self, body: impl FnOnce(&mut BlockBuilder)) -> &mut Self {
        let mut block = BlockBuilder::sequential();
        body(&mut block);
        self.items.push(block.into_sexpr());
        self
    }

    /// A top-level `< ... >` simultaneous block.
    pub fn parallel_block(&mut self, body: impl FnOnce(&mut BlockBuilder)) -> &mut Self {
        let mut block = BlockBuilder::parallel();
        body(&mut block);
        self.items.push(block.into_sexpr());
        self
    }

    /// A top-level `subcircuit [iterations] { ... }`.
    pub fn subcircuit(&mut self, iterations: Option<i64>, body: impl FnOnce(&mut BlockBuilder)) -> &mut Self {
        let mut block = BlockBuilder::sequential();
        body(&mut block);
        let SExpr::List(inner) = block.into_sexpr() else {
            unreachable!("BlockBuilder::into_sexpr always returns a List")
        };
        // inner[0] is the "sequential_block" head; the actual statements
        // follow it directly in a subcircuit_block form.
        let mut items = vec![SExpr::word("subcircuit_block"), slice_bound(iterations)];
        items.extend(inner.into_iter().skip(1));
        self.items.push(SExpr::List(items));
        self
    }

    /// A top-level `loop count { ... }`.
    pub fn loop_stmt(&mut self, count: i64, body: impl FnOnce(&mut BlockBuilder)) -> &mut Self {
        let mut block = BlockBuilder::sequential();
        body(&mut block);
        self.items.push(SExpr::list(vec![
            SExpr::word("loop"),
            SExpr::Int(count),
            block.into_sexpr(),
        ]));
        self
    }

    /// A top-level `branch { case state { ... } ... }`.
    pub fn branch<F>(&mut self, cases: impl IntoIterator<Item = (i64, F)>) -> &mut Self
    where
        F: FnOnce(&mut BlockBuilder),
    {
        let mut items = vec![SExpr::word("branch")];
        for (state, body) in cases {
            let mut block = BlockBuilder::sequential();
            body(&mut block);
            items.push(SExpr::list(vec![
                SExpr::word("case"),
                SExpr::Int(state),
                block.into_sexpr(),
            ]));
        }
        self.items.push(SExpr::List(items));
        self
    }

    /// The accumulated `(circuit ...)` root form, for inspection or reuse.
    pub fn to_sexpr(&self) -> SExpr {
        let mut items = vec![SExpr::word("circuit")];
        items.extend(self.items.clone());
        SExpr::List(items)
    }

    /// Build the accumulated statements into a [`Circuit`], resolving any
    /// `usepulses` imports through `loader`.
    pub fn build_with_loader(&self, loader: &dyn PulseLoader, options: BuilderOptions) -> JaqalResult<Circuit> {
        Builder::new(loader, options).build(&self.to_sexpr())
    }

    /// Build with no pulse modules to resolve and default options — the
    /// common case for a circuit assembled entirely in-process.
    pub fn build(&self) -> JaqalResult<Circuit> {
        self.build_with_loader(&NullPulseLoader, BuilderOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bell_pair_shaped_circuit_builds() {
        let mut b = CircuitBuilder::new();
        b.register("q", 2)
            .gate("prepare_all", [])
            .gate("Sxx", [qubit("q", 0), qubit("q", 1)])
            .gate("measure_all", []);
        let circuit = b.build().unwrap();
        assert_eq!(circuit.registers().len(), 1);
        assert_eq!(circuit.body().statements().len(), 3);
    }

    #[test]
    fn let_and_register_size_reference_resolve() {
        let mut b = CircuitBuilder::new();
        b.let_int("n", 3).register("q", 0);
        // Exercise the literal-size path too, since `register` only emits
        // an integer-literal size form here; size-by-`let`-reference is
        // exercised through the parser/builder's own tests.
        let circuit = b.build().unwrap();
        assert_eq!(circuit.constants().len(), 1);
    }

    #[test]
    fn macro_call_round_trips_through_the_builder() {
        let mut b = CircuitBuilder::new();
        b.register("q", 1);
        b.macro_def("flip", ["a".to_string()], |body| {
            body.gate("Px", [Arg::Ident("a".to_string())]);
        });
        b.gate("flip", [qubit("q", 0)]);
        let circuit = b.build().unwrap();
        assert_eq!(circuit.macros().len(), 1);
        assert_eq!(circuit.body().statements().len(), 1);
    }

    #[test]
    fn loop_and_subcircuit_nest_correctly() {
        let mut b = CircuitBuilder::new();
        b.register("q", 1);
        b.subcircuit(None, |body| {
            body.loop_stmt(2, |inner| {
                inner.gate("Px", [qubit("q", 0)]);
            });
        });
        let circuit = b.build().unwrap();
        assert_eq!(circuit.body().statements().len(), 1);
    }

    #[test]
    fn parallel_block_of_independent_gates_builds() {
        let mut b = CircuitBuilder::new();
        b.register("q", 2);
        b.parallel_block(|body| {
            body.gate("Px", [qubit("q", 0)]);
            body.gate("Py", [qubit("q", 1)]);
        });
        let circuit = b.build().unwrap();
        assert_eq!(circuit.body().statements().len(), 1);
    }
}
