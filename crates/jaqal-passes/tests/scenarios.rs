//! The six concrete scenarios from §8 (S1-S6), each checking one exact
//! input against one exact expected shape.

use rustc_hash::FxHashMap;

use jaqal_ir::{BuilderOptions, NullPulseLoader, Statement, Value};
use jaqal_lang::{emit, parse, parse_with_loader};
use jaqal_passes::{
    LetFill, MacroExpand, Outcome, OutputParser, Pass, SubcircuitDiscovery, SubcircuitExpand,
    UnitTiming,
};

/// S1: an undeclared gate name builds successfully as a synthesized gate
/// call against a plain fundamental register.
#[test]
fn s1_undeclared_gate_against_a_fundamental_register() {
    let circuit = parse("register r[3]\nfoo r[1]\n").unwrap();

    assert_eq!(circuit.registers().len(), 1);
    let r = &circuit.registers()[0];
    assert_eq!(r.name(), "r");
    assert!(r.is_fundamental());

    let stmts = circuit.body().statements();
    assert_eq!(stmts.len(), 1);
    match &stmts[0] {
        Statement::Gate(g) => assert_eq!(g.name(), "foo"),
        other => panic!("expected a gate statement, got {other:?}"),
    }
}

/// S2: an override dictionary replaces declared `let` values at build
/// time, and those replacements show up in the gate arguments they feed.
#[test]
fn s2_override_dict_resolves_into_gate_arguments() {
    let mut override_dict = FxHashMap::default();
    override_dict.insert("a".to_string(), Value::Int(0));
    override_dict.insert("b".to_string(), Value::Float(1.41));
    let options = BuilderOptions {
        override_dict,
        ..Default::default()
    };

    let circuit = parse_with_loader(
        "let a 1\nlet b 3.14\nregister r[3]\nfoo r[a] b\n",
        &NullPulseLoader,
        options,
    )
    .unwrap();
    let circuit = LetFill::new().run(circuit).unwrap();

    let stmts = circuit.body().statements();
    assert_eq!(stmts.len(), 1);
    let Statement::Gate(gate) = &stmts[0] else {
        panic!("expected a gate statement");
    };
    assert_eq!(gate.parameters().len(), 2);

    match &gate.parameters()[0].1 {
        jaqal_ir::GateArgument::Qubit(q) => {
            let ctx = jaqal_ir::ResolveContext::new();
            assert_eq!(q.alias_index().resolve(&ctx).unwrap(), 0);
        }
        other => panic!("expected the first argument to be a qubit, got {other:?}"),
    }
    match &gate.parameters()[1].1 {
        jaqal_ir::GateArgument::Float(v) => assert!((*v - 1.41).abs() < 1e-12),
        other => panic!("expected the second argument to be a float, got {other:?}"),
    }
}

/// S3: expanding a macro call substitutes its parameters into its body,
/// and leaves the macro definition itself in place.
#[test]
fn s3_macro_call_expands_and_definition_survives() {
    let circuit = parse("macro foo a\n{\ng a\nh 5\n}\nfoo 1\n").unwrap();
    assert_eq!(circuit.macros().len(), 1);

    let circuit = MacroExpand::new().with_preserve_definitions(true).run(circuit).unwrap();
    assert_eq!(circuit.macros().len(), 1, "macro definition must be preserved");

    let text = emit(&circuit);
    assert!(text.contains("g 1"), "got: {text}");
    assert!(text.contains("h 5"), "got: {text}");
}

/// S4: unit-timing normalization flattens a block parallel to three gates
/// plus a nested two-statement sequential lane into one parallel step
/// (absorbing the nested lane's first statement) followed by its leftover
/// second statement.
#[test]
fn s4_unit_timing_merges_parallel_lanes_by_step() {
    let circuit = parse(
        "register q[1]\n{\ng0\ng1\n<\np0\np1\np2\n{\nq0\nq1\n}\n>\ng2\n}\n",
    )
    .unwrap();
    let circuit = UnitTiming::new().run(circuit).unwrap();

    let body = circuit.body();
    assert!(!body.parallel_flag());
    let stmts = body.statements();

    let name_of = |s: &Statement| match s {
        Statement::Gate(g) => g.name().to_string(),
        Statement::Block(b) => {
            let names: Vec<_> = b
                .statements()
                .iter()
                .map(|s| match s {
                    Statement::Gate(g) => g.name().to_string(),
                    other => panic!("unexpected nested statement {other:?}"),
                })
                .collect();
            format!("parallel{{{}}}", names.join(","))
        }
        other => panic!("unexpected statement {other:?}"),
    };
    let shape: Vec<_> = stmts.iter().map(name_of).collect();
    assert_eq!(
        shape,
        vec![
            "g0".to_string(),
            "g1".to_string(),
            "parallel{p0,p1,p2,q0}".to_string(),
            "q1".to_string(),
            "g2".to_string(),
        ]
    );
}

/// S5: a subcircuit's iteration count is recorded but has no effect on
/// the compiled shape once it's bracketed with prepare/measure gates.
#[test]
fn s5_subcircuit_iteration_count_does_not_affect_expansion() {
    let circuit = parse("register q[1]\nsubcircuit 500\n{\nfoo\n}\n").unwrap();
    let circuit = SubcircuitExpand::new().run(circuit).unwrap();
    let text = emit(&circuit);

    let prepare_pos = text.find("prepare_all").unwrap();
    let gate_pos = text.find("foo").unwrap();
    let measure_pos = text.find("measure_all").unwrap();
    assert!(prepare_pos < gate_pos && gate_pos < measure_pos, "got: {text}");
    assert!(!text.contains("500"), "the iteration count must not leak into the compiled shape: {text}");
}

/// S6: outcomes are matched to subcircuit traces in execution order;
/// qubit 0 is the string's last character and the integer's LSB.
#[test]
fn s6_outcomes_decode_with_qubit_zero_as_the_least_significant_bit() {
    let circuit = parse(
        "register q[3]\nprepare_all\nPx q[0] q[1] q[2]\nmeasure_all\nprepare_all\nPx q[0] q[1] q[2]\nmeasure_all\n",
    )
    .unwrap();
    let traces = SubcircuitDiscovery::new().discover(&circuit).unwrap();
    assert_eq!(traces.len(), 2);

    let readouts = OutputParser::new()
        .parse(
            &circuit,
            &traces,
            &[Outcome::Str("001".to_string()), Outcome::Str("100".to_string())],
        )
        .unwrap();

    let flat = readouts.flat();
    assert_eq!(flat.len(), 2);
    assert_eq!(flat[0].as_int(), 4);
    assert_eq!(flat[1].as_int(), 1);
}
