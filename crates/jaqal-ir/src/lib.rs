//! Jaqal Intermediate Representation
//!
//! This crate provides the core data structures for representing Jaqal
//! trapped-ion circuits, and the builder that turns a parsed s-expression
//! tree into them. It forms the foundation of the Jaqal compilation stack:
//! [`jaqal_lang`](../jaqal_lang) produces the s-expression tree this crate
//! consumes, and [`jaqal_passes`](../jaqal_passes) consumes the [`Circuit`]
//! this crate produces.
//!
//! # Overview
//!
//! Every Jaqal statement is a variant of one tagged sum type, [`Statement`],
//! rather than a hierarchy of node classes (see the `block` module docs for
//! why). A [`Circuit`] collects the top-level declarations — constants,
//! registers, macros, native gates, `usepulses` imports — plus the
//! sequential statement body.
//!
//! # Core Components
//!
//! - **Values**: [`AnnotatedValue`], [`Parameter`], [`Constant`] for named,
//!   typed quantities
//! - **Addressing**: [`Register`], [`NamedQubit`], [`IndexExpr`] for
//!   registers, aliases (`map`), and the numeric sites that index them
//! - **Gates**: [`GateDefinition`], [`Macro`], [`GateStatement`] for native
//!   and macro-backed gate calls
//! - **Statements**: [`Statement`], [`BlockStatement`], [`LoopStatement`],
//!   [`BranchStatement`] for circuit structure
//! - **Circuit**: [`Circuit`], the top-level container
//! - **Errors**: [`JaqalError`], the unified error taxonomy
//!
//! # Example: Building a Bell-pair-shaped circuit by hand
//!
//! ```rust
//! use std::rc::Rc;
//! use jaqal_ir::{Circuit, GateDefinition, GateDefRef, IndexExpr, Register, Statement};
//!
//! let mut circuit = Circuit::new();
//! let qreg = Rc::new(Register::fundamental("q", IndexExpr::Int(2)).unwrap());
//! circuit.add_register(qreg.clone()).unwrap();
//!
//! let mz = Rc::new(GateDefinition::new("prepare_all", vec![]));
//! circuit.add_native_gate(mz.clone()).unwrap();
//! let call = mz.call(vec![]).unwrap();
//! circuit.body_mut().statements_mut().push(Statement::Gate(call));
//!
//! assert_eq!(circuit.registers().len(), 1);
//! ```
pub mod block;
pub mod builder;
pub mod circuit;
pub mod circuit_builder;
pub mod constant;
pub mod error;
pub mod gate;
pub mod identifier;
pub mod macro_def;
pub mod parameter;
pub mod pulse;
pub mod register;
pub mod sexpr;
pub mod visitor;

pub use block::{BlockStatement, BranchStatement, CaseStatement, LoopStatement, Statement};
pub use builder::{Builder, BuilderOptions};
pub use circuit::{Circuit, UsePulses};
pub use circuit_builder::{qubit, Arg, BlockBuilder, CircuitBuilder};
pub use constant::{Constant, NumericValue};
pub use error::{Anchor, IrPath, JaqalError, JaqalResult, SourceLocation};
pub use gate::{AbstractGate, GateDefRef, GateDefinition, GateStatement, UsedQubit};
pub use identifier::Identifier;
pub use macro_def::Macro;
pub use parameter::{AnnotatedValue, GateArgument, ParamType, Parameter, ResolveContext, Value};
pub use pulse::{GateTable, NullPulseLoader, PulseLoader, StaticPulseLoader};
pub use register::{AliasSource, IndexExpr, NamedQubit, Register, RegisterKind, SliceExpr};
pub use sexpr::SExpr;
pub use visitor::{Analyzer, Rewriter};
