//! Map-resolution pass (§4.6): replace every `NamedQubit`/`Register`
//! reference that transits through a `map` alias with its equivalent
//! fundamental-register coordinate.
//!
//! A register or qubit reached through any number of alias levels is
//! flattened to a single alias directly against the register's fundamental
//! root. A reference still shadowed by a macro parameter (so its alias
//! chain bottoms out in an unbound `AliasSource::Parameter` rather than a
//! register) is left alone — it is deferred to macro expansion, not an
//! error here. A statically-known out-of-range index is fatal, per §4.6.

use std::rc::Rc;

use jaqal_ir::{
    AliasSource, BlockStatement, Circuit, GateArgument, GateStatement, IndexExpr, JaqalError,
    JaqalResult, Macro, NamedQubit, Register, ResolveContext, Rewriter, SliceExpr, Statement,
};

use crate::pass::Pass;

/// Flattens every register/qubit reference to a direct alias of its
/// fundamental register.
#[derive(Debug, Default)]
pub struct MapResolve;

impl MapResolve {
    pub fn new() -> Self {
        MapResolve
    }
}

impl Pass for MapResolve {
    fn name(&self) -> &str {
        "map-resolve"
    }

    #[tracing::instrument(level = "debug", skip(self, circuit))]
    fn run(&self, circuit: Circuit) -> JaqalResult<Circuit> {
        let ctx = ResolveContext::new();
        let mut resolver = Resolver { ctx: &ctx };

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
            let body = resolver.rewrite_block(m.body().clone())?;
            out.add_macro(Rc::new(Macro::new(m.gate_name(), m.gate_parameters().to_vec(), body)))?;
        }
        let body = resolver.rewrite_block(circuit.body().clone())?;
        out.set_body(body);
        Ok(out)
    }
}

struct Resolver<'a> {
    ctx: &'a ResolveContext,
}

impl Resolver<'_> {
    fn flatten_register(&self, reg: &Rc<Register>) -> JaqalResult<Rc<Register>> {
        if reg.is_fundamental() {
            return Ok(reg.clone());
        }
        let size = match reg.resolve_size(self.ctx) {
            Ok(size) => size,
            Err(JaqalError::Name { .. }) => return Ok(reg.clone()),
            Err(e) => return Err(e),
        };
        if size == 0 {
            // Nothing to flatten against: an empty alias carries no index
            // that could disagree with its source, so leave it as-is.
            return Ok(reg.clone());
        }
        let (root, start) = match reg.resolve_qubit(0, self.ctx) {
            Ok(pair) => pair,
            Err(JaqalError::Name { .. }) => return Ok(reg.clone()),
            Err(e) => return Err(e),
        };
        let step = if size > 1 {
            let (_, second) = reg.resolve_qubit(1, self.ctx)?;
            second - start
        } else {
            1
        };
        let slice = SliceExpr {
            start: Some(IndexExpr::Int(start)),
            stop: Some(IndexExpr::Int(start + step * size)),
            step: Some(IndexExpr::Int(step)),
        };
        Ok(Rc::new(Register::alias(
            reg.name(),
            AliasSource::Register(root),
            Some(slice),
        )?))
    }

    fn flatten_qubit(&self, q: &Rc<NamedQubit>) -> JaqalResult<Rc<NamedQubit>> {
        if let AliasSource::Register(src) = q.alias_from() {
            if src.is_fundamental() {
                if let IndexExpr::Int(_) = q.alias_index() {
                    return Ok(q.clone());
                }
            }
        }
        match q.resolve_qubit(self.ctx) {
            Ok((root, idx)) => Ok(Rc::new(NamedQubit::new(
                q.name(),
                AliasSource::Register(root),
                IndexExpr::Int(idx),
            )?)),
            Err(JaqalError::Name { .. }) => Ok(q.clone()),
            Err(e) => Err(e),
        }
    }

    fn resolve_argument(&self, arg: &GateArgument) -> JaqalResult<GateArgument> {
        Ok(match arg {
            GateArgument::Register(r) => GateArgument::Register(self.flatten_register(r)?),
            GateArgument::Qubit(q) => GateArgument::Qubit(self.flatten_qubit(q)?),
            other => other.clone(),
        })
    }
}

impl Rewriter for Resolver<'_> {
    fn visit_gate(&mut self, gate: GateStatement) -> JaqalResult<Statement> {
        let def = gate.gate_def().clone();
        let mut params = Vec::with_capacity(gate.parameters().len());
        for (name, arg) in gate.parameters() {
            params.push((name.clone(), self.resolve_argument(arg)?));
        }
        Ok(Statement::Gate(GateStatement::new(def, params)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jaqal_lang::{emit, parse};

    fn resolved(source: &str) -> Circuit {
        let circuit = parse(source).unwrap();
        MapResolve::new().run(circuit).unwrap()
    }

    #[test]
    fn whole_register_map_flattens_to_fundamental() {
        let circuit = resolved("register q[4]\nmap s q\nPx s[1]\n");
        let text = emit(&circuit);
        assert!(text.contains("Px q[1]"), "got: {text}");
    }

    #[test]
    fn strided_slice_flattens_to_absolute_indices() {
        let circuit = resolved("register q[10]\nmap s q[2:8:2]\nPx s[1]\n");
        let text = emit(&circuit);
        // s[1] -> q[2 + 1*2] = q[4]
        assert!(text.contains("Px q[4]"), "got: {text}");
    }

    #[test]
    fn out_of_range_map_index_is_fatal() {
        // `s` is declared with a nominal size of 5, but its source register
        // `q` only has 2 qubits: `s[4]` resolves to `q[4]`, out of range.
        let circuit = parse("register q[2]\nmap s q[0:5]\nPx s[4]\n").unwrap();
        let err = MapResolve::new().run(circuit).unwrap_err();
        assert!(matches!(err, JaqalError::Shape { .. }));
    }
}
