//! Lexer, parser, and pretty-printer for Jaqal source text.
//!
//! This crate is the front door of the compilation stack: [`parse`] turns
//! source text directly into a built [`jaqal_ir::Circuit`], and [`emit`]
//! turns a circuit back into source text satisfying the round-trip contract
//! `parse(emit(c)) == c` (§4.12). [`compile`] additionally runs the opt-in
//! semantic passes from `jaqal-passes` in their fixed order, for a caller
//! that wants parsing and processing in one call. The [`lexer`] and
//! [`parser`] modules are exposed individually for callers (e.g. an editor
//! integration) that want tokens or the raw s-expression tree without going
//! through the builder.

pub mod lexer;
pub mod parser;
pub mod printer;

pub use lexer::{line_column, tokenize, SpannedToken, Token};
pub use parser::{parse_to_sexpr, Parser};
pub use printer::emit;
pub use jaqal_passes::ProcessingOptions;

use jaqal_ir::{
    Builder, BuilderOptions, Circuit, JaqalResult, NullPulseLoader, PulseLoader, UsePulses,
};
use jaqal_passes::PassPipeline;

/// Parse Jaqal source text all the way to a built [`Circuit`], using the
/// given pulse loader to resolve any `usepulses` imports.
pub fn parse_with_loader(
    source: &str,
    loader: &dyn PulseLoader,
    options: BuilderOptions,
) -> JaqalResult<Circuit> {
    let sexpr = parse_to_sexpr(source)?;
    Builder::new(loader, options).build(&sexpr)
}

/// Parse Jaqal source text that imports no pulse modules (or for which the
/// caller doesn't care to resolve them), using [`NullPulseLoader`].
pub fn parse(source: &str) -> JaqalResult<Circuit> {
    parse_with_loader(source, &NullPulseLoader, BuilderOptions::default())
}

/// The result of [`compile`]: a fully processed circuit, plus the
/// `usepulses` imports it declared (§6.3's `return_usepulses`).
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub circuit: Circuit,
    pub usepulses: Vec<UsePulses>,
}

/// The library's single richer entry point (§6.6): parse `source` to a
/// [`Circuit`] and run the opt-in semantic passes `options` selects, in the
/// fixed order [`PassPipeline`] requires. Mirrors `arvak_qasm3::parse`'s
/// signature shape. For the bare parse-to-IR step with no passes applied,
/// use [`parse`] directly.
pub fn compile(source: &str, options: ProcessingOptions) -> JaqalResult<ParseOutcome> {
    let circuit = parse(source)?;
    let circuit = PassPipeline::new(options).run(circuit)?;
    Ok(ParseOutcome {
        usepulses: circuit.usepulses().to_vec(),
        circuit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_then_emit_round_trips_a_simple_circuit() {
        let circuit = parse("register q[2]\nPx q[0]\nPy q[1]\n").unwrap();
        let text = emit(&circuit);
        let reparsed = parse(&text).unwrap();
        assert_eq!(emit(&reparsed), text);
    }

    #[test]
    fn compile_runs_the_opt_in_passes() {
        let outcome = compile(
            "let n 2\nregister q[n]\nPx q[0]\n",
            ProcessingOptions::new().with_expand_let(true),
        )
        .unwrap();
        assert!(emit(&outcome.circuit).contains("register q[2]"));
        assert!(outcome.usepulses.is_empty());
    }
}
