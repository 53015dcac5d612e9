//! Pulse-module loading: the `usepulses` statement's runtime contract.
//!
//! The IR treats a pulse module as an opaque table of native gate
//! definitions (§4.14); it never inspects or executes the pulses
//! themselves. What actually backs a pulse module (a Python package, a
//! hardware calibration file, ...) is outside this crate's scope, so
//! callers supply their own [`PulseLoader`].

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{JaqalError, JaqalResult};
use crate::gate::{AbstractGate, GateDefinition};

/// The native gates and idle-gate pairings a pulse module contributes.
#[derive(Debug, Clone, Default)]
pub struct GateTable {
    gates: HashMap<String, Rc<GateDefinition>>,
}

impl GateTable {
    pub fn new() -> Self {
        GateTable::default()
    }

    pub fn insert(&mut self, gate: Rc<GateDefinition>) {
        self.gates.insert(gate.gate_name().to_string(), gate);
    }

    pub fn get(&self, name: &str) -> Option<&Rc<GateDefinition>> {
        self.gates.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.gates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<GateDefinition>> {
        self.gates.values()
    }
}

/// Resolves a `usepulses <module>` statement to the gate table it provides.
///
/// `including_file` is the path of the Jaqal source that issued the
/// `usepulses` statement, used by loaders that resolve module paths
/// relative to the importing file (mirrors the reference implementation's
/// `core_lib` resolution).
pub trait PulseLoader {
    fn load(&self, module: &str, including_file: Option<&str>) -> JaqalResult<GateTable>;
}

/// A loader with no modules registered; any `usepulses` statement fails.
/// Useful as a default for tests and tools that only need the IR/parser,
/// not a real pulse backend.
#[derive(Debug, Clone, Default)]
pub struct NullPulseLoader;

impl PulseLoader for NullPulseLoader {
    fn load(&self, module: &str, _including_file: Option<&str>) -> JaqalResult<GateTable> {
        Err(JaqalError::name(format!(
            "no pulse loader configured; cannot resolve usepulses {module}"
        )))
    }
}

/// A loader backed by an in-memory registry, registered ahead of time.
/// Grounded on how the reference implementation's test suite stubs out
/// `qscout` / `jaqal_gates` lookups without touching real hardware.
#[derive(Debug, Clone, Default)]
pub struct StaticPulseLoader {
    modules: HashMap<String, GateTable>,
}

impl StaticPulseLoader {
    pub fn new() -> Self {
        StaticPulseLoader::default()
    }

    pub fn register(&mut self, module: impl Into<String>, table: GateTable) {
        self.modules.insert(module.into(), table);
    }
}

impl PulseLoader for StaticPulseLoader {
    fn load(&self, module: &str, _including_file: Option<&str>) -> JaqalResult<GateTable> {
        self.modules
            .get(module)
            .cloned()
            .ok_or_else(|| JaqalError::name(format!("unknown pulse module {module}")))
    }
}
