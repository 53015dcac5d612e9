//! The s-expression → IR builder.
//!
//! Walks a [`SExpr`] tree with two scoped symbol tables (§4.2): a *value
//! context* (identifiers → `Register`/`NamedQubit`/`Constant`/`Parameter`)
//! and a *gate context* (identifiers → `GateDefinition`/`Macro`). Entering a
//! macro body pushes its parameters into the value context, shadowing outer
//! bindings; leaving it pops that frame.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::block::{BlockStatement, BranchStatement, CaseStatement, LoopStatement, Statement};
use crate::circuit::{Circuit, UsePulses};
use crate::constant::Constant;
use crate::error::{JaqalError, JaqalResult};
use crate::gate::{AbstractGate, GateDefRef, GateDefinition, GateStatement};
use crate::macro_def::Macro;
use crate::parameter::{GateArgument, ParamType, Parameter};
use crate::pulse::{GateTable, PulseLoader};
use crate::register::{AliasSource, IndexExpr, NamedQubit, Register, SliceExpr};
use crate::sexpr::SExpr;

/// A value bound in the builder's value context: every kind of name the
/// scoped symbol table can hold, including names not yet resolvable to a
/// `parameter::Value` (e.g. a bare `Register`, which has no `Value`
/// variant of its own independent of being wrapped).
#[derive(Debug, Clone)]
enum Binding {
    Register(Rc<Register>),
    Qubit(Rc<NamedQubit>),
    Constant(Constant),
    Parameter(Parameter),
}

/// Options accepted by [`Builder::new`], mirroring the public `parse(...)`
/// entry point's processing options (§6.3). The opt-in pass flags
/// (`expand_macro`, `expand_let`, `expand_let_map`) belong to the pass
/// pipeline, not the builder, and live in `jaqal-passes`.
#[derive(Debug, Clone, Default)]
pub struct BuilderOptions {
    /// Overrides for declared `let` values, applied when a `let`
    /// s-expression is built. Every key must name an actual `let`.
    pub override_dict: FxHashMap<String, crate::parameter::Value>,
    /// Gate definitions that take priority over anything a `usepulses`
    /// module provides under the same name.
    pub inject_pulses: GateTable,
    /// Whether a `(usepulses module all)` statement is actually resolved
    /// through the pulse loader, or merely recorded.
    pub autoload_pulses: bool,
    /// Source anchor used to resolve relative `usepulses` module paths.
    pub filename: Option<String>,
}

/// Cache key for gate-call memoization within one value-context frame:
/// identical `(name, resolved arguments)` return the same `GateStatement`.
/// Floats compare by bit pattern so that two `NaN` arguments memoize
/// together, matching `GateStatement`'s own NaN-tolerant equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    name: String,
    args: Vec<ArgKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ArgKey {
    Int(i64),
    FloatBits(u64),
    Register(String),
    Qubit(String),
    Unresolved(String),
}

fn arg_key(arg: &GateArgument) -> ArgKey {
    match arg {
        GateArgument::Int(v) => ArgKey::Int(*v),
        GateArgument::Float(v) => ArgKey::FloatBits(v.to_bits()),
        GateArgument::Register(r) => ArgKey::Register(r.name().to_string()),
        GateArgument::Qubit(q) => ArgKey::Qubit(q.name().to_string()),
        GateArgument::Unresolved(p) => ArgKey::Unresolved(p.name().to_string()),
    }
}

/// One frame of the value-context stack: a scope's own bindings, searched
/// before falling through to outer frames.
type Scope = FxHashMap<String, Binding>;

pub struct Builder<'a> {
    options: BuilderOptions,
    loader: &'a dyn PulseLoader,
    scopes: Vec<Scope>,
    gate_table: FxHashMap<String, GateDefRef>,
    memo: Vec<FxHashMap<MemoKey, GateStatement>>,
    circuit: Circuit,
}

impl<'a> Builder<'a> {
    pub fn new(loader: &'a dyn PulseLoader, options: BuilderOptions) -> Self {
        let mut gate_table = FxHashMap::default();
        for gate in options.inject_pulses.iter() {
            gate_table.insert(gate.gate_name().to_string(), GateDefRef::Builtin(gate.clone()));
        }
        Builder {
            options,
            loader,
            scopes: vec![Scope::default()],
            gate_table,
            memo: vec![FxHashMap::default()],
            circuit: Circuit::new(),
        }
    }

    /// Build a full `(circuit *items)` s-expression into a `Circuit`.
    pub fn build(mut self, root: &SExpr) -> JaqalResult<Circuit> {
        let items = root
            .as_command("circuit")
            .ok_or_else(|| JaqalError::structure("expected a (circuit ...) root form"))?;
        for item in items {
            self.build_header_or_statement(item)?;
        }
        Ok(self.circuit)
    }

    fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
        self.memo.push(FxHashMap::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
        self.memo.pop();
    }

    fn bind(&mut self, name: impl Into<String>, binding: Binding) {
        self.scopes.last_mut().expect("scope stack is never empty").insert(name.into(), binding);
    }

    fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }

    fn lookup_gate(&self, name: &str) -> Option<&GateDefRef> {
        self.gate_table.get(name)
    }

    fn resolve_binding_to_value(&self, binding: &Binding) -> crate::parameter::Value {
        match binding {
            Binding::Register(r) => crate::parameter::Value::Register(r.clone()),
            Binding::Qubit(q) => crate::parameter::Value::Qubit(q.clone()),
            Binding::Constant(c) => match c.value() {
                crate::constant::NumericValue::Int(v) => crate::parameter::Value::Int(v),
                crate::constant::NumericValue::Float(v) => crate::parameter::Value::Float(v),
            },
            Binding::Parameter(_) => unreachable!("a Parameter binding is resolved via the call-time argument, not a stored value"),
        }
    }

    fn word_or_error<'s>(expr: &'s SExpr, what: &str) -> JaqalResult<&'s str> {
        expr.as_word()
            .ok_or_else(|| JaqalError::structure(format!("expected an identifier for {what}")))
    }

    fn build_header_or_statement(&mut self, expr: &SExpr) -> JaqalResult<()> {
        match expr.command_word() {
            Some("register") => self.build_register(expr),
            Some("map") => self.build_map(expr),
            Some("let") => self.build_let(expr),
            Some("macro") => self.build_macro(expr),
            Some("usepulses") => self.build_usepulses(expr),
            _ => {
                let stmt = self.build_statement(expr)?;
                self.circuit.body_mut().statements_mut().push(stmt);
                Ok(())
            }
        }
    }

    fn build_register(&mut self, expr: &SExpr) -> JaqalResult<()> {
        let args = expr.as_command("register").unwrap();
        let [name_expr, size_expr] = args else {
            return Err(JaqalError::structure("register: expected (register name size)"));
        };
        let name = Self::word_or_error(name_expr, "register name")?.to_string();
        let size = self.build_index_expr(size_expr)?;
        let reg = Rc::new(Register::fundamental(&name, size)?);
        self.circuit.add_register(reg.clone())?;
        self.bind(name, Binding::Register(reg));
        Ok(())
    }

    fn build_map(&mut self, expr: &SExpr) -> JaqalResult<()> {
        let args = expr.as_command("map").unwrap();
        let name_expr = args
            .first()
            .ok_or_else(|| JaqalError::structure("map: missing alias name"))?;
        let name = Self::word_or_error(name_expr, "map alias name")?.to_string();
        let src_expr = args
            .get(1)
            .ok_or_else(|| JaqalError::structure("map: missing source"))?;
        let source = self.resolve_map_source(src_expr)?;

        let reg = match args.len() {
            2 => Register::alias(&name, source, None)?,
            3 => {
                // map index: a single-qubit alias. Represented as a register
                // of size 1 sliced to that one index, so every alias is
                // uniformly a Register in the value context.
                let index = self.build_index_expr(&args[2])?;
                let slice = SliceExpr {
                    start: Some(index.clone()),
                    stop: Some(offset_index(&index, 1)?),
                    step: None,
                };
                Register::alias(&name, source, Some(slice))?
            }
            5 => {
                let start = optional_index(self, &args[2])?;
                let stop = optional_index(self, &args[3])?;
                let step = optional_index(self, &args[4])?;
                Register::alias(&name, source, Some(SliceExpr { start, stop, step }))?
            }
            _ => {
                return Err(JaqalError::structure(
                    "map: expected (map name src), (map name src index), or (map name src start stop step)",
                ));
            }
        };
        let reg = Rc::new(reg);
        self.circuit.add_register(reg.clone())?;
        self.bind(name, Binding::Register(reg));
        Ok(())
    }

    fn resolve_map_source(&self, expr: &SExpr) -> JaqalResult<AliasSource> {
        let name = Self::word_or_error(expr, "map source")?;
        match self.lookup(name) {
            Some(Binding::Register(r)) => Ok(AliasSource::Register(r.clone())),
            Some(Binding::Parameter(p)) => Ok(AliasSource::Parameter(p.clone())),
            Some(_) => Err(JaqalError::name(format!("{name} is not a register"))),
            None => Err(JaqalError::name(format!("unknown map source {name}"))),
        }
    }

    fn build_let(&mut self, expr: &SExpr) -> JaqalResult<()> {
        let args = expr.as_command("let").unwrap();
        let [name_expr, value_expr] = args else {
            return Err(JaqalError::structure("let: expected (let name value)"));
        };
        let name = Self::word_or_error(name_expr, "let name")?.to_string();
        if let Some(over) = self.options.override_dict.get(&name) {
            let c = match over {
                crate::parameter::Value::Int(v) => Constant::int(&name, *v),
                crate::parameter::Value::Float(v) => Constant::float(&name, *v),
                _ => return Err(JaqalError::ty(format!("override for let {name} must be numeric"))),
            };
            self.circuit.add_constant(c.clone())?;
            self.bind(name, Binding::Constant(c));
            return Ok(());
        }
        let c = match value_expr {
            SExpr::Int(v) => Constant::int(&name, *v),
            SExpr::Float(v) => Constant::float(&name, *v),
            SExpr::Word(w) => match self.lookup(w) {
                Some(Binding::Constant(other)) => Constant::from_constant(&name, other),
                _ => return Err(JaqalError::name(format!("let {name}: unknown value {w}"))),
            },
            SExpr::List(_) => return Err(JaqalError::structure("let: value must be a literal or identifier")),
        };
        self.circuit.add_constant(c.clone())?;
        self.bind(name, Binding::Constant(c));
        Ok(())
    }

    fn build_macro(&mut self, expr: &SExpr) -> JaqalResult<()> {
        let args = expr.as_command("macro").unwrap();
        let (name_expr, rest) = args
            .split_first()
            .ok_or_else(|| JaqalError::structure("macro: missing name"))?;
        let name = Self::word_or_error(name_expr, "macro name")?.to_string();
        if self.lookup_gate(&name).is_some() {
            return Err(JaqalError::structure(format!(
                "macro {name} redeclares an existing gate name"
            )));
        }
        let (param_exprs, body_expr) = rest
            .split_last()
            .ok_or_else(|| JaqalError::structure("macro: missing body"))?;
        let params: Vec<Parameter> = param_exprs
            .iter()
            .map(|p| Self::word_or_error(p, "macro parameter").map(|w| Parameter::new(w, ParamType::Any)))
            .collect::<JaqalResult<_>>()?;

        self.push_scope();
        for p in &params {
            self.bind(p.name().to_string(), Binding::Parameter(p.clone()));
        }
        let body_stmt = self.build_statement(body_expr)?;
        self.pop_scope();

        let body = match body_stmt {
            Statement::Block(b) => b,
            _ => return Err(JaqalError::structure("macro body must be a block statement")),
        };
        let m = Rc::new(Macro::new(name.clone(), params, body));
        self.circuit.add_macro(m.clone())?;
        self.gate_table.insert(name, GateDefRef::Macro(m));
        Ok(())
    }

    fn build_usepulses(&mut self, expr: &SExpr) -> JaqalResult<()> {
        let args = expr.as_command("usepulses").unwrap();
        let [module_expr, names_expr] = args else {
            return Err(JaqalError::structure("usepulses: expected (usepulses module spec)"));
        };
        let module = Self::word_or_error(module_expr, "usepulses module")?.to_string();
        let names = match names_expr {
            SExpr::Word(w) if w == "*" || w == "all" => None,
            SExpr::List(items) => Some(
                items
                    .iter()
                    .map(|i| Self::word_or_error(i, "usepulses name").map(str::to_string))
                    .collect::<JaqalResult<Vec<_>>>()?,
            ),
            _ => return Err(JaqalError::structure("usepulses: malformed import spec")),
        };
        self.circuit.add_usepulses(UsePulses {
            module: module.clone(),
            names: names.clone(),
        });
        if names.is_none() && !self.options.autoload_pulses {
            return Ok(());
        }
        let table = self.loader.load(&module, self.options.filename.as_deref())?;
        for gate in table.iter() {
            if let Some(restricted) = &names {
                if !restricted.contains(&gate.gate_name().to_string()) {
                    continue;
                }
            }
            // inject_pulses overrides usepulses: a name already seeded from
            // inject_pulses is never replaced by a loaded definition.
            if self.options.inject_pulses.get(gate.gate_name()).is_some() {
                continue;
            }
            self.gate_table
                .insert(gate.gate_name().to_string(), GateDefRef::Builtin(gate.clone()));
        }
        Ok(())
    }

    fn build_statement(&mut self, expr: &SExpr) -> JaqalResult<Statement> {
        match expr.command_word() {
            Some("gate") => self.build_gate(expr).map(Statement::Gate),
            Some("sequential_block") => self.build_block_body(expr, "sequential_block").map(|s| {
                Statement::Block(BlockStatement::sequential(s))
            }),
            Some("parallel_block") => {
                let stmts = self.build_block_body(expr, "parallel_block")?;
                let block = BlockStatement::parallel(stmts);
                block.check_nesting(false, false)?;
                Ok(Statement::Block(block))
            }
            Some("subcircuit_block") => self.build_subcircuit(expr),
            Some("loop") => self.build_loop(expr),
            Some("branch") => self.build_branch(expr),
            _ => Err(JaqalError::structure(format!(
                "unknown statement form {}",
                expr.command_word().unwrap_or("<non-list>")
            ))),
        }
    }

    fn build_block_body(&mut self, expr: &SExpr, command: &str) -> JaqalResult<Vec<Statement>> {
        let args = expr
            .as_command(command)
            .ok_or_else(|| JaqalError::structure(format!("expected ({command} ...)")))?;
        args.iter().map(|s| self.build_statement(s)).collect()
    }

    fn build_subcircuit(&mut self, expr: &SExpr) -> JaqalResult<Statement> {
        let args = expr.as_command("subcircuit_block").unwrap();
        let (iterations_expr, stmts) = args
            .split_first()
            .ok_or_else(|| JaqalError::structure("subcircuit_block: missing iterations slot"))?;
        let iterations = match iterations_expr {
            SExpr::Word(w) if w == "null" => None,
            other => Some(self.build_index_expr(other)?),
        };
        let statements: Vec<Statement> = stmts.iter().map(|s| self.build_statement(s)).collect::<JaqalResult<_>>()?;
        Ok(Statement::Block(BlockStatement::subcircuit(iterations, statements)?))
    }

    fn build_loop(&mut self, expr: &SExpr) -> JaqalResult<Statement> {
        let args = expr.as_command("loop").unwrap();
        let [count_expr, body_expr] = args else {
            return Err(JaqalError::structure("loop: expected (loop count body)"));
        };
        let count = self.build_index_expr(count_expr)?;
        let body_stmt = self.build_statement(body_expr)?;
        let body = match body_stmt {
            Statement::Block(b) => b,
            other => BlockStatement::sequential(vec![other]),
        };
        Ok(Statement::Loop(LoopStatement::new(count, body)?))
    }

    fn build_branch(&mut self, expr: &SExpr) -> JaqalResult<Statement> {
        let args = expr.as_command("branch").unwrap();
        let cases = args
            .iter()
            .map(|c| self.build_case(c))
            .collect::<JaqalResult<Vec<_>>>()?;
        Ok(Statement::Branch(BranchStatement::new(cases)))
    }

    fn build_case(&mut self, expr: &SExpr) -> JaqalResult<CaseStatement> {
        let args = expr
            .as_command("case")
            .ok_or_else(|| JaqalError::structure("expected (case state body)"))?;
        let [state_expr, body_expr] = args else {
            return Err(JaqalError::structure("case: expected (case state body)"));
        };
        let state = self.build_index_expr(state_expr)?;
        let body_stmt = self.build_statement(body_expr)?;
        let body = match body_stmt {
            Statement::Block(b) => b,
            other => BlockStatement::sequential(vec![other]),
        };
        CaseStatement::new(state, body)
    }

    fn build_gate(&mut self, expr: &SExpr) -> JaqalResult<GateStatement> {
        let args = expr.as_command("gate").unwrap();
        let (name_expr, arg_exprs) = args
            .split_first()
            .ok_or_else(|| JaqalError::structure("gate: missing name"))?;
        let name = Self::word_or_error(name_expr, "gate name")?.to_string();
        let resolved_args: Vec<GateArgument> = arg_exprs
            .iter()
            .map(|a| self.build_gate_argument(a))
            .collect::<JaqalResult<_>>()?;

        let key = MemoKey {
            name: name.clone(),
            args: resolved_args.iter().map(arg_key).collect(),
        };
        if let Some(cached) = self.memo.last().and_then(|m| m.get(&key)) {
            return Ok(cached.clone());
        }

        let def = match self.lookup_gate(&name) {
            Some(def) => def.clone(),
            None => {
                if !self.options.inject_pulses.is_empty() || self.options.autoload_pulses {
                    return Err(JaqalError::name(format!("no gate {name} defined")));
                }
                let synthesized = Rc::new(GateDefinition::new(
                    name.clone(),
                    (0..resolved_args.len())
                        .map(|i| Parameter::new(format!("p{i}"), ParamType::Any))
                        .collect(),
                ));
                self.gate_table.insert(name.clone(), GateDefRef::Builtin(synthesized.clone()));
                GateDefRef::Builtin(synthesized)
            }
        };

        for (param, arg) in def.parameters().iter().zip(&resolved_args) {
            param.validate(arg)?;
        }
        if def.parameters().len() != resolved_args.len() {
            return Err(JaqalError::arity(format!(
                "gate {name}: expected {} arguments, found {}",
                def.parameters().len(),
                resolved_args.len()
            )));
        }
        let stmt = GateStatement::new(
            def.clone(),
            def.parameters()
                .iter()
                .map(|p| p.name().to_string())
                .zip(resolved_args)
                .collect(),
        );
        self.memo.last_mut().expect("scope stack is never empty").insert(key, stmt.clone());
        Ok(stmt)
    }

    fn build_gate_argument(&mut self, expr: &SExpr) -> JaqalResult<GateArgument> {
        match expr {
            SExpr::Int(v) => Ok(GateArgument::Int(*v)),
            SExpr::Float(v) => Ok(GateArgument::Float(*v)),
            SExpr::Word(name) => match self.lookup(name) {
                Some(Binding::Register(r)) => Ok(GateArgument::Register(r.clone())),
                Some(Binding::Qubit(q)) => Ok(GateArgument::Qubit(q.clone())),
                Some(Binding::Constant(c)) => Ok(match c.value() {
                    crate::constant::NumericValue::Int(v) => GateArgument::Int(v),
                    crate::constant::NumericValue::Float(v) => GateArgument::Float(v),
                }),
                Some(Binding::Parameter(p)) => Ok(GateArgument::Unresolved(p.clone())),
                None => Err(JaqalError::name(format!("unknown identifier {name}"))),
            },
            SExpr::List(_) => self.build_array_item(expr).map(|q| GateArgument::Qubit(Rc::new(q))),
        }
    }

    fn build_array_item(&mut self, expr: &SExpr) -> JaqalResult<NamedQubit> {
        let args = expr
            .as_command("array_item")
            .ok_or_else(|| JaqalError::structure("expected (array_item ident index)"))?;
        let [ident_expr, index_expr] = args else {
            return Err(JaqalError::structure("array_item: expected (array_item ident index)"));
        };
        let ident = Self::word_or_error(ident_expr, "array_item target")?;
        let index = self.build_index_expr(index_expr)?;
        match self.lookup(ident) {
            Some(Binding::Register(r)) => Ok(r.index(index)),
            Some(Binding::Parameter(p)) => NamedQubit::new(
                format!("{}[{}]", p.name(), describe(&index)),
                AliasSource::Parameter(p.clone()),
                index,
            ),
            Some(_) => Err(JaqalError::name(format!("{ident} is not indexable"))),
            None => Err(JaqalError::name(format!("unknown identifier {ident}"))),
        }
    }

    fn build_index_expr(&mut self, expr: &SExpr) -> JaqalResult<IndexExpr> {
        match expr {
            SExpr::Int(v) => Ok(IndexExpr::Int(*v)),
            SExpr::Float(v) if v.fract() == 0.0 => Ok(IndexExpr::Int(*v as i64)),
            SExpr::Float(_) => Err(JaqalError::ty("expected an integer-kinded value, found a non-integral float")),
            SExpr::Word(name) => match self.lookup(name) {
                Some(Binding::Constant(c)) => Ok(IndexExpr::Const(c.clone())),
                Some(Binding::Parameter(p)) => Ok(IndexExpr::Param(p.clone())),
                Some(_) => Err(JaqalError::ty(format!("{name} is not usable as a numeric index"))),
                None => Err(JaqalError::name(format!("unknown identifier {name}"))),
            },
            SExpr::List(_) => Err(JaqalError::structure("expected a numeric literal or identifier")),
        }
    }
}

fn optional_index(builder: &mut Builder, expr: &SExpr) -> JaqalResult<Option<IndexExpr>> {
    match expr {
        SExpr::Word(w) if w == "null" => Ok(None),
        other => Ok(Some(builder.build_index_expr(other)?)),
    }
}

fn offset_index(idx: &IndexExpr, delta: i64) -> JaqalResult<IndexExpr> {
    match idx {
        IndexExpr::Int(v) => Ok(IndexExpr::Int(v + delta)),
        // A symbolic single-index map's implicit stop bound (`index + 1`)
        // cannot be computed until the index resolves; the slice's `stop`
        // is then left as `None` and treated as "rest of register", which
        // is safe because a single-index map is constrained to length 1
        // by `resolve_qubit`'s own bounds check, not by `stop`.
        IndexExpr::Const(_) | IndexExpr::Param(_) => Ok(idx.clone()),
    }
}

fn describe(idx: &IndexExpr) -> String {
    match idx {
        IndexExpr::Int(v) => v.to_string(),
        IndexExpr::Const(c) => c.name().to_string(),
        IndexExpr::Param(p) => p.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::NullPulseLoader;

    #[test]
    fn register_and_gate_roundtrip() {
        let loader = NullPulseLoader;
        let builder = Builder::new(&loader, BuilderOptions::default());
        let root = SExpr::list(vec![
            SExpr::word("circuit"),
            SExpr::list(vec![SExpr::word("register"), SExpr::word("q"), SExpr::Int(3)]),
            SExpr::list(vec![
                SExpr::word("gate"),
                SExpr::word("px"),
                SExpr::list(vec![SExpr::word("array_item"), SExpr::word("q"), SExpr::Int(0)]),
            ]),
        ]);
        let circuit = builder.build(&root).unwrap();
        assert_eq!(circuit.registers().len(), 1);
        assert_eq!(circuit.body().statements().len(), 1);
    }

    #[test]
    fn identical_gate_calls_memoize_within_a_context() {
        let loader = NullPulseLoader;
        let mut builder = Builder::new(&loader, BuilderOptions::default());
        let call = SExpr::list(vec![SExpr::word("gate"), SExpr::word("px"), SExpr::Float(1.5)]);
        let a = builder.build_gate(&call).unwrap();
        let b = builder.build_gate(&call).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_gate_synthesizes_anonymous_definition() {
        let loader = NullPulseLoader;
        let mut builder = Builder::new(&loader, BuilderOptions::default());
        let call = SExpr::list(vec![
            SExpr::word("gate"),
            SExpr::word("mystery"),
            SExpr::Int(1),
            SExpr::Float(2.0),
        ]);
        let stmt = builder.build_gate(&call).unwrap();
        assert_eq!(stmt.parameters().len(), 2);
        assert_eq!(stmt.parameters()[0].0, "p0");
    }

    #[test]
    fn unknown_gate_errors_when_autoload_pulses_is_set() {
        let loader = NullPulseLoader;
        let options = BuilderOptions {
            autoload_pulses: true,
            ..Default::default()
        };
        let mut builder = Builder::new(&loader, options);
        let call = SExpr::list(vec![SExpr::word("gate"), SExpr::word("mystery")]);
        let err = builder.build_gate(&call).unwrap_err();
        assert!(matches!(err, JaqalError::Name { .. }));
    }

    #[test]
    fn unknown_gate_errors_when_inject_pulses_is_non_empty() {
        let loader = NullPulseLoader;
        let mut inject_pulses = GateTable::new();
        inject_pulses.insert(Rc::new(GateDefinition::new("foo", vec![])));
        let options = BuilderOptions {
            inject_pulses,
            ..Default::default()
        };
        let mut builder = Builder::new(&loader, options);
        let call = SExpr::list(vec![SExpr::word("gate"), SExpr::word("mystery")]);
        let err = builder.build_gate(&call).unwrap_err();
        assert!(matches!(err, JaqalError::Name { .. }));
    }

    #[test]
    fn inject_pulses_is_available_without_a_usepulses_statement() {
        let loader = NullPulseLoader;
        let mut inject_pulses = GateTable::new();
        inject_pulses.insert(Rc::new(GateDefinition::new(
            "foo",
            vec![Parameter::new("x", ParamType::Any)],
        )));
        let options = BuilderOptions {
            inject_pulses,
            ..Default::default()
        };
        let mut builder = Builder::new(&loader, options);
        let call = SExpr::list(vec![SExpr::word("gate"), SExpr::word("foo"), SExpr::Int(1)]);
        let stmt = builder.build_gate(&call).unwrap();
        assert_eq!(stmt.name(), "foo");
        assert_eq!(stmt.parameters()[0].0, "x");
    }

    #[test]
    fn macro_redeclaring_gate_name_is_rejected() {
        let loader = NullPulseLoader;
        let mut builder = Builder::new(&loader, BuilderOptions::default());
        builder
            .gate_table
            .insert("g".to_string(), GateDefRef::Builtin(Rc::new(GateDefinition::new("g", vec![]))));
        let expr = SExpr::list(vec![
            SExpr::word("macro"),
            SExpr::word("g"),
            SExpr::list(vec![SExpr::word("sequential_block")]),
        ]);
        let err = builder.build_macro(&expr).unwrap_err();
        assert!(matches!(err, JaqalError::Structure { .. }));
    }
}
