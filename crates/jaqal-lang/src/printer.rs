//! Pretty-printer: IR → Jaqal source text (§4.12).
//!
//! Contract: for any `Circuit` `c` that uses no features the printer elides,
//! `parse(print(c)) == c`. Header items print in a fixed order: `usepulses`,
//! then `let`, then fundamental registers, then map aliases, then macros,
//! then the body. Indentation is one tab per block depth; sequential blocks
//! print as `{ … }` and parallel blocks as `< … >`; subcircuit blocks are
//! prefixed with `subcircuit [N]`.

use jaqal_ir::{
    AbstractGate, AnnotatedValue, BlockStatement, BranchStatement, Circuit, Constant, GateArgument,
    GateStatement, IndexExpr, LoopStatement, NumericValue, Register, RegisterKind, SliceExpr,
    Statement,
};

/// Emit a circuit as Jaqal source code.
pub fn emit(circuit: &Circuit) -> String {
    let mut printer = Printer::new();
    printer.emit_circuit(circuit);
    printer.output
}

struct Printer {
    output: String,
    indent: usize,
}

impl Printer {
    fn new() -> Self {
        Printer {
            output: String::new(),
            indent: 0,
        }
    }

    fn write_line(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.output.push('\t');
        }
        self.output.push_str(line);
        self.output.push('\n');
    }

    fn emit_circuit(&mut self, circuit: &Circuit) {
        for u in circuit.usepulses() {
            match &u.names {
                None => self.write_line(&format!("from {} usepulses *", u.module)),
                Some(names) => self.write_line(&format!("from {} usepulses {}", u.module, names.join(", "))),
            }
        }
        for c in circuit.constants() {
            self.write_line(&format!("let {} {}", c.name(), format_constant_value(c)));
        }
        for r in circuit.registers() {
            if r.is_fundamental() {
                self.write_line(&format!("register {}[{}]", r.name(), format_fundamental_size(r)));
            }
        }
        for r in circuit.registers() {
            if !r.is_fundamental() {
                self.write_line(&format_map_alias(r));
            }
        }
        for m in circuit.macros() {
            let params: Vec<String> = m.gate_parameters().iter().map(|p| p.name().to_string()).collect();
            let prefix = if params.is_empty() {
                format!("macro {} ", m.gate_name())
            } else {
                format!("macro {} {} ", m.gate_name(), params.join(" "))
            };
            self.emit_block_with_prefix(m.body(), &prefix);
        }
        self.emit_block_inline_statements(circuit.body());
    }

    fn emit_block_inline_statements(&mut self, block: &BlockStatement) {
        for stmt in block.statements() {
            self.emit_statement(stmt);
        }
    }

    fn emit_block(&mut self, block: &BlockStatement) {
        self.emit_block_with_prefix(block, "");
    }

    fn emit_block_with_prefix(&mut self, block: &BlockStatement, prefix: &str) {
        let (open, close) = if block.parallel_flag() { ("<", ">") } else { ("{", "}") };
        if block.is_subcircuit() {
            let iterations = block
                .iterations()
                .map(|i| format!(" [{}]", format_index(i)))
                .unwrap_or_default();
            self.write_line(&format!("{prefix}subcircuit{iterations} {open}"));
        } else if prefix.is_empty() {
            self.write_line(open);
        } else {
            self.write_line(&format!("{prefix}{open}"));
        }
        self.indent += 1;
        for stmt in block.statements() {
            self.emit_statement(stmt);
        }
        self.indent -= 1;
        self.write_line(close);
    }

    fn emit_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Gate(g) => self.write_line(&format_gate(g)),
            Statement::Block(b) => self.emit_block(b),
            Statement::Loop(l) => self.emit_loop(l),
            Statement::Branch(br) => self.emit_branch(br),
        }
    }

    fn emit_loop(&mut self, loop_stmt: &LoopStatement) {
        let prefix = format!("loop {} ", format_index(loop_stmt.iterations()));
        self.emit_block_with_prefix(loop_stmt.body(), &prefix);
    }

    fn emit_branch(&mut self, branch: &BranchStatement) {
        self.write_line("branch {");
        self.indent += 1;
        for case in branch.cases() {
            let bits = match case.state() {
                IndexExpr::Int(v) => format!("{v:b}"),
                other => format_index(other),
            };
            let prefix = format!("\"{bits}\": ");
            self.emit_block_with_prefix(case.body(), &prefix);
        }
        self.indent -= 1;
        self.write_line("}");
    }
}

fn format_constant_value(c: &Constant) -> String {
    match c.value() {
        NumericValue::Int(v) => v.to_string(),
        NumericValue::Float(v) => v.to_string(),
    }
}

fn format_fundamental_size(r: &Register) -> String {
    match r.kind() {
        RegisterKind::Fundamental { size } => format_index(size),
        RegisterKind::Alias { .. } => unreachable!("caller filters to fundamental registers"),
    }
}

fn format_map_alias(r: &Register) -> String {
    match r.kind() {
        RegisterKind::Alias { source, slice } => {
            let src_name = match source {
                jaqal_ir::AliasSource::Register(src) => src.name().to_string(),
                jaqal_ir::AliasSource::Parameter(p) => p.name().to_string(),
            };
            match slice {
                None => format!("map {} {}", r.name(), src_name),
                Some(s) => format!("map {} {}[{}]", r.name(), src_name, format_slice(s)),
            }
        }
        RegisterKind::Fundamental { .. } => unreachable!("caller filters to alias registers"),
    }
}

fn format_slice(s: &SliceExpr) -> String {
    let start = s.start.as_ref().map(format_index).unwrap_or_default();
    let stop = s.stop.as_ref().map(format_index).unwrap_or_default();
    match &s.step {
        None => format!("{start}:{stop}"),
        Some(step) => format!("{start}:{stop}:{}", format_index(step)),
    }
}

fn format_index(idx: &IndexExpr) -> String {
    match idx {
        IndexExpr::Int(v) => v.to_string(),
        IndexExpr::Const(c) => c.name().to_string(),
        IndexExpr::Param(p) => p.name().to_string(),
    }
}

fn format_gate(g: &GateStatement) -> String {
    let args: Vec<String> = g
        .parameters()
        .iter()
        .map(|(_, arg)| format_argument(arg))
        .collect();
    if args.is_empty() {
        g.name().to_string()
    } else {
        format!("{} {}", g.name(), args.join(" "))
    }
}

fn format_argument(arg: &GateArgument) -> String {
    match arg {
        GateArgument::Int(v) => v.to_string(),
        GateArgument::Float(v) => v.to_string(),
        GateArgument::Register(r) => r.name().to_string(),
        GateArgument::Qubit(q) => q.name().to_string(),
        GateArgument::Unresolved(p) => p.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_to_sexpr;
    use jaqal_ir::{Builder, BuilderOptions, NullPulseLoader};

    fn build(source: &str) -> Circuit {
        let loader = NullPulseLoader;
        let sexpr = parse_to_sexpr(source).unwrap();
        Builder::new(&loader, BuilderOptions::default()).build(&sexpr).unwrap()
    }

    #[test]
    fn prints_register_then_gate() {
        let circuit = build("register q[2]\nPx q[0]\n");
        let text = emit(&circuit);
        assert!(text.contains("register q[2]"));
        assert!(text.contains("Px q[0]"));
    }

    #[test]
    fn header_order_is_usepulses_let_register_map_macro() {
        let circuit = build("let n 3\nregister q[3]\n");
        let text = emit(&circuit);
        let let_pos = text.find("let n").unwrap();
        let register_pos = text.find("register q").unwrap();
        assert!(let_pos < register_pos);
    }

    #[test]
    fn macro_body_reparses_after_printing() {
        let circuit = build("register q[1]\nmacro foo a\n{\nPx a\n}\nfoo q[0]\n");
        let text = emit(&circuit);
        let sexpr = parse_to_sexpr(&text).unwrap();
        let loader = NullPulseLoader;
        let reparsed = Builder::new(&loader, BuilderOptions::default()).build(&sexpr).unwrap();
        assert_eq!(reparsed.macros().len(), 1);
        assert_eq!(emit(&reparsed), text);
    }

    #[test]
    fn loop_body_reparses_after_printing() {
        let circuit = build("register q[1]\nloop 3\n{\nPx q[0]\n}\n");
        let text = emit(&circuit);
        let reparsed = build(&text);
        assert_eq!(emit(&reparsed), text);
    }

    #[test]
    fn branch_reparses_after_printing() {
        let circuit = build("register q[1]\nbranch {\n\"0\": { Px q[0] }\n}\n");
        let text = emit(&circuit);
        let reparsed = build(&text);
        assert_eq!(emit(&reparsed), text);
    }
}
