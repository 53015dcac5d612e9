//! Property-based tests for the quantified invariants of §8: pass
//! semantics preservation (1), the print/parse round-trip (2), and gate
//! memoization (7).
//!
//! Grounded on the teacher's `arvak-qasm3/tests/proptest_roundtrip.rs`:
//! a small arbitrary-circuit generator, fed through `proptest!` blocks
//! that check structural properties survive a transformation rather than
//! doing mechanical encode/decode round-trip grids.

use std::rc::Rc;

use jaqal_ir::GateDefRef;
use jaqal_lang::{emit, parse};
use jaqal_passes::{Pass, UnitTiming, UsedQubitAnalysis};
use proptest::prelude::*;

/// A source string declaring `num_qubits` qubits and a sequence of
/// single-qubit gate calls, one named gate per (gate, qubit) pair.
fn arb_gate_name() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("ga"), Just("gb"), Just("gc"), Just("gd")]
}

fn arb_gate_source() -> impl Strategy<Value = (usize, String)> {
    (1_usize..=4).prop_flat_map(|num_qubits| {
        prop::collection::vec(
            (0..num_qubits, arb_gate_name()),
            1..=8,
        )
        .prop_map(move |ops| {
            let mut source = format!("register q[{num_qubits}]\n");
            for (qubit, gate_name) in ops {
                source.push_str(&format!("{gate_name} q[{qubit}]\n"));
            }
            (num_qubits, source)
        })
    })
}

proptest! {
    /// Invariant 1: unit-timing normalization reshapes the body but never
    /// changes which qubits are used — it only ever splices, merges, or
    /// reorders existing statements, never drops or invents one.
    #[test]
    fn unit_timing_preserves_used_qubits((_num_qubits, source) in arb_gate_source()) {
        let circuit = parse(&source).expect("generated source must parse");
        let before = UsedQubitAnalysis::new().compute(&circuit).expect("used-qubit analysis");

        let normalized = UnitTiming::new().run(circuit).expect("unit-timing must not fail on a flat body");
        let after = UsedQubitAnalysis::new().compute(&normalized).expect("used-qubit analysis");

        prop_assert_eq!(before, after, "unit-timing changed the used-qubit set");
    }

    /// Invariant 2: printing and reparsing a circuit is stable — doing it
    /// twice produces the same source text both times.
    #[test]
    fn print_parse_round_trip_is_stable((_num_qubits, source) in arb_gate_source()) {
        let circuit = parse(&source).expect("generated source must parse");
        let text = emit(&circuit);

        let reparsed = parse(&text).expect("printer output must reparse");
        let text_again = emit(&reparsed);

        prop_assert_eq!(text, text_again, "emit(parse(emit(c))) != emit(c)");
    }

    /// Invariant 7: two identical gate calls (same name, same resolved
    /// arguments) in the same scope memoize to the same synthesized gate
    /// definition; two calls with different resolved arguments do not.
    #[test]
    fn gate_memoization_is_keyed_by_resolved_arguments(a in 0_i64..8, b in 0_i64..8) {
        let source = format!("register q[1]\nfoo {a}\nfoo {b}\n");
        let circuit = parse(&source).expect("generated source must parse");
        let stmts = circuit.body().statements();
        prop_assert_eq!(stmts.len(), 2);

        let def_rc = |stmt: &jaqal_ir::Statement| -> Rc<jaqal_ir::GateDefinition> {
            match stmt {
                jaqal_ir::Statement::Gate(g) => match g.gate_def() {
                    GateDefRef::Builtin(def) => def.clone(),
                    GateDefRef::Macro(_) => panic!("expected a synthesized native gate"),
                },
                other => panic!("expected a gate statement, got {other:?}"),
            }
        };
        let first = def_rc(&stmts[0]);
        let second = def_rc(&stmts[1]);

        if a == b {
            prop_assert!(Rc::ptr_eq(&first, &second), "identical args must memoize to the same gate definition");
        } else {
            prop_assert!(!Rc::ptr_eq(&first, &second), "different args must not share a gate definition");
        }
    }
}
