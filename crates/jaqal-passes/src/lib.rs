//! Semantic passes, pass pipeline, and the output/readout model for Jaqal
//! circuits.
//!
//! Each pass in this crate implements [`Pass`]: a pure function from one
//! [`jaqal_ir::Circuit`] to the next. [`PassPipeline`] composes the opt-in
//! passes named by a [`ProcessingOptions`] in the fixed order §5 requires
//! (let before map; macro before unit-timing; subcircuit-expand after
//! macro-expand).
//!
//! # Passes
//!
//! - [`let_fill::LetFill`] — §4.4, resolve `let`-constant references
//! - [`map_resolve::MapResolve`] — §4.6, resolve `map`-alias references
//! - [`macro_expand::MacroExpand`] — §4.5, inline macro calls
//! - [`subcircuit_expand::SubcircuitExpand`] — §4.7, bracket subcircuits with
//!   prepare/measure gates
//! - [`unit_timing::UnitTiming`] — §4.8, normalize to unit-timing form
//! - [`used_qubit::UsedQubitAnalysis`] — §4.9, compute used-qubit indices
//! - [`subcircuit_discovery::SubcircuitDiscovery`] — §4.10, find Trace
//!   boundaries
//! - [`output_parse::OutputParser`] — §4.11, associate measurement outcomes
//!   with Traces

pub mod let_fill;
pub mod macro_expand;
pub mod map_resolve;
pub mod output_parse;
pub mod pass;
pub mod pipeline;
pub mod subcircuit_discovery;
pub mod subcircuit_expand;
pub mod unit_timing;
pub mod used_qubit;

pub use let_fill::LetFill;
pub use macro_expand::MacroExpand;
pub use map_resolve::MapResolve;
pub use output_parse::{Outcome, OutputParser, Readout, Readouts};
pub use pass::Pass;
pub use pipeline::{PassPipeline, ProcessingOptions};
pub use subcircuit_discovery::{SubcircuitDiscovery, Trace};
pub use subcircuit_expand::SubcircuitExpand;
pub use unit_timing::UnitTiming;
pub use used_qubit::{UsedQubitAnalysis, UsedQubits};
