//! `Circuit`: the top-level container produced by the builder and consumed
//! by every semantic pass and the pretty-printer.

use std::collections::HashSet;
use std::rc::Rc;

use crate::block::BlockStatement;
use crate::constant::Constant;
use crate::error::{JaqalError, JaqalResult};
use crate::gate::{AbstractGate, GateDefinition};
use crate::macro_def::Macro;
use crate::parameter::AnnotatedValue;
use crate::register::Register;

/// A loaded `usepulses` module reference, recorded so the printer can
/// reproduce the statement and the pulse loader can be asked again during
/// re-resolution passes.
#[derive(Debug, Clone, PartialEq)]
pub struct UsePulses {
    pub module: String,
    /// Names imported with `as`, if the statement restricted the import,
    /// else `None` for a wildcard import.
    pub names: Option<Vec<String>>,
}

/// The fully built (but not yet pass-processed) representation of one
/// Jaqal source file: every top-level declaration plus the sequential body.
///
/// Per §3.2, at most one `Register` in `registers` may be fundamental, and
/// every name declared across `constants`, `registers`, `macros`, and
/// `native_gates` is unique.
#[derive(Debug, Clone)]
pub struct Circuit {
    constants: Vec<Constant>,
    registers: Vec<Rc<Register>>,
    macros: Vec<Rc<Macro>>,
    native_gates: Vec<Rc<GateDefinition>>,
    usepulses: Vec<UsePulses>,
    body: BlockStatement,
}

impl Circuit {
    pub fn new() -> Self {
        Circuit {
            constants: Vec::new(),
            registers: Vec::new(),
            macros: Vec::new(),
            native_gates: Vec::new(),
            usepulses: Vec::new(),
            body: BlockStatement::sequential(Vec::new()),
        }
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    pub fn registers(&self) -> &[Rc<Register>] {
        &self.registers
    }

    pub fn macros(&self) -> &[Rc<Macro>] {
        &self.macros
    }

    pub fn native_gates(&self) -> &[Rc<GateDefinition>] {
        &self.native_gates
    }

    pub fn usepulses(&self) -> &[UsePulses] {
        &self.usepulses
    }

    pub fn body(&self) -> &BlockStatement {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut BlockStatement {
        &mut self.body
    }

    pub fn set_body(&mut self, body: BlockStatement) {
        self.body = body;
    }

    pub fn fundamental_register(&self) -> Option<&Rc<Register>> {
        self.registers.iter().find(|r| r.is_fundamental())
    }

    fn existing_names(&self) -> HashSet<&str> {
        self.constants
            .iter()
            .map(|c| c.name())
            .chain(self.registers.iter().map(|r| r.name()))
            .chain(self.macros.iter().map(|m| m.gate_name()))
            .chain(self.native_gates.iter().map(|g| g.gate_name()))
            .collect()
    }

    fn check_name_unique(&self, name: &str) -> JaqalResult<()> {
        if self.existing_names().contains(name) {
            return Err(JaqalError::name(format!("duplicate top-level name {name}")));
        }
        Ok(())
    }

    pub fn add_constant(&mut self, c: Constant) -> JaqalResult<()> {
        self.check_name_unique(c.name())?;
        self.constants.push(c);
        Ok(())
    }

    pub fn add_register(&mut self, r: Rc<Register>) -> JaqalResult<()> {
        self.check_name_unique(r.name())?;
        if r.is_fundamental() && self.fundamental_register().is_some() {
            return Err(JaqalError::structure(
                "a circuit may declare at most one fundamental register",
            ));
        }
        self.registers.push(r);
        Ok(())
    }

    pub fn add_macro(&mut self, m: Rc<Macro>) -> JaqalResult<()> {
        self.check_name_unique(m.gate_name())?;
        self.macros.push(m);
        Ok(())
    }

    pub fn add_native_gate(&mut self, g: Rc<GateDefinition>) -> JaqalResult<()> {
        self.check_name_unique(g.gate_name())?;
        self.native_gates.push(g);
        Ok(())
    }

    pub fn add_usepulses(&mut self, u: UsePulses) {
        self.usepulses.push(u);
    }

    pub fn find_macro(&self, name: &str) -> Option<&Rc<Macro>> {
        self.macros.iter().find(|m| m.gate_name() == name)
    }

    pub fn find_native_gate(&self, name: &str) -> Option<&Rc<GateDefinition>> {
        self.native_gates.iter().find(|g| g.gate_name() == name)
    }

    pub fn find_register(&self, name: &str) -> Option<&Rc<Register>> {
        self.registers.iter().find(|r| r.name() == name)
    }

    pub fn find_constant(&self, name: &str) -> Option<&Constant> {
        self.constants.iter().find(|c| c.name() == name)
    }
}
