//! Output parsing (§4.11): associate a sequence of measurement outcomes
//! with the [`Trace`](crate::subcircuit_discovery::Trace) that produced
//! each one, in execution order.
//!
//! Grounded on `jaqalpaq.core.result.parse_jaqal_output_list`: each outcome
//! is either a string of `'0'`/`'1'` characters (qubit 0 first) or an
//! integer with qubit 0 as the least significant bit; both forms are
//! normalized to the same integer encoding a [`Readout`] carries.
//! Readouts are exposed both as a flat, time-ordered list and grouped per
//! subcircuit, each group additionally reporting the relative frequency of
//! every measurement outcome it saw.

use jaqal_ir::{Circuit, JaqalError, JaqalResult, ResolveContext};

use crate::subcircuit_discovery::Trace;

/// A single measurement outcome as it comes off hardware: a string of
/// `'0'`/`'1'` digits, or the equivalent integer encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Int(i64),
    Str(String),
}

impl Outcome {
    fn as_int(&self) -> JaqalResult<i64> {
        match self {
            Outcome::Int(v) => Ok(*v),
            Outcome::Str(s) => {
                // Qubit 0 is the first character; the integer encoding
                // treats qubit 0 as the least-significant bit, so the
                // string is read in reverse.
                let mut v = 0i64;
                for (i, c) in s.chars().enumerate() {
                    match c {
                        '0' => {}
                        '1' => v |= 1 << i,
                        other => {
                            return Err(JaqalError::shape(format!(
                                "measurement outcome has non-binary character {other:?}"
                            )));
                        }
                    }
                }
                Ok(v)
            }
        }
    }
}

/// One measurement result, with its position in time and which
/// subcircuit produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readout {
    index: usize,
    subcircuit_index: usize,
    value: i64,
    num_qubits: usize,
}

impl Readout {
    /// The temporal index of this measurement among all readouts.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Which subcircuit (by position in the Trace list) produced this
    /// readout.
    pub fn subcircuit_index(&self) -> usize {
        self.subcircuit_index
    }

    /// The measured result, qubit 0 as the least significant bit.
    pub fn as_int(&self) -> i64 {
        self.value
    }

    /// The measured result as a string of qubit values, qubit 0 first.
    pub fn as_str(&self) -> String {
        (0..self.num_qubits)
            .map(|i| if self.value & (1 << i) != 0 { '1' } else { '0' })
            .collect()
    }
}

/// All readouts from a circuit's execution, in time order and grouped by
/// the subcircuit that produced each one.
#[derive(Debug, Clone, Default)]
pub struct Readouts {
    flat: Vec<Readout>,
    per_subcircuit: Vec<SubcircuitReadouts>,
}

impl Readouts {
    /// Every readout, in the order it was produced.
    pub fn flat(&self) -> &[Readout] {
        &self.flat
    }

    /// Readouts grouped by subcircuit, one group per discovered Trace.
    pub fn per_subcircuit(&self) -> &[SubcircuitReadouts] {
        &self.per_subcircuit
    }
}

/// The readouts produced by one subcircuit (one prepare/measure Trace),
/// plus the relative frequency of each outcome it produced.
#[derive(Debug, Clone)]
pub struct SubcircuitReadouts {
    num_qubits: usize,
    readouts: Vec<Readout>,
}

impl SubcircuitReadouts {
    pub fn readouts(&self) -> &[Readout] {
        &self.readouts
    }

    /// The relative frequency of each possible outcome, indexed by its
    /// integer encoding (qubit 0 as the least significant bit).
    pub fn relative_frequency_by_int(&self) -> Vec<f64> {
        let slots = 1usize << self.num_qubits;
        let mut freq = vec![0.0; slots];
        if self.readouts.is_empty() {
            return freq;
        }
        let total = self.readouts.len() as f64;
        for r in &self.readouts {
            freq[r.value as usize] += 1.0 / total;
        }
        freq
    }
}

/// Associates measurement outcomes with the Traces they came from.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputParser;

impl OutputParser {
    pub fn new() -> Self {
        OutputParser
    }

    /// `traces` must already be in execution order (as returned by
    /// [`crate::subcircuit_discovery::SubcircuitDiscovery::discover`]) and
    /// `outcomes` must have exactly one entry per trace.
    pub fn parse(
        &self,
        circuit: &Circuit,
        traces: &[Trace],
        outcomes: &[Outcome],
    ) -> JaqalResult<Readouts> {
        if traces.len() != outcomes.len() {
            return Err(JaqalError::shape(format!(
                "{} measurement outcomes given for {} subcircuits",
                outcomes.len(),
                traces.len()
            )));
        }
        let fundamental = circuit
            .fundamental_register()
            .ok_or_else(|| JaqalError::shape("circuit has no fundamental register to decode outcomes against"))?;
        let num_qubits = fundamental.resolve_size(&ResolveContext::new())? as usize;

        let mut flat = Vec::with_capacity(outcomes.len());
        let mut per_subcircuit = Vec::with_capacity(traces.len());
        for (i, outcome) in outcomes.iter().enumerate() {
            let value = outcome.as_int()?;
            let readout = Readout {
                index: i,
                subcircuit_index: i,
                value,
                num_qubits,
            };
            flat.push(readout.clone());
            per_subcircuit.push(SubcircuitReadouts {
                num_qubits,
                readouts: vec![readout],
            });
        }
        Ok(Readouts {
            flat,
            per_subcircuit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subcircuit_discovery::SubcircuitDiscovery;
    use jaqal_lang::parse;

    #[test]
    fn string_and_int_outcomes_agree() {
        let circuit = parse("register q[2]\nprepare_all\nPx q[0]\nmeasure_all\n").unwrap();
        let traces = SubcircuitDiscovery::new().discover(&circuit).unwrap();
        let from_str = OutputParser::new()
            .parse(&circuit, &traces, &[Outcome::Str("10".to_string())])
            .unwrap();
        let from_int = OutputParser::new()
            .parse(&circuit, &traces, &[Outcome::Int(1)])
            .unwrap();
        assert_eq!(from_str.flat()[0].as_int(), from_int.flat()[0].as_int());
    }

    #[test]
    fn mismatched_outcome_count_is_fatal() {
        let circuit = parse("register q[1]\nprepare_all\nPx q[0]\nmeasure_all\n").unwrap();
        let traces = SubcircuitDiscovery::new().discover(&circuit).unwrap();
        let err = OutputParser::new().parse(&circuit, &traces, &[]).unwrap_err();
        assert!(matches!(err, JaqalError::Shape { .. }));
    }

    #[test]
    fn relative_frequency_sums_to_one() {
        let circuit = parse(
            "register q[1]\nprepare_all\nPx q[0]\nmeasure_all\nprepare_all\nPx q[0]\nmeasure_all\n",
        )
        .unwrap();
        let traces = SubcircuitDiscovery::new().discover(&circuit).unwrap();
        let readouts = OutputParser::new()
            .parse(&circuit, &traces, &[Outcome::Int(0), Outcome::Int(1)])
            .unwrap();
        for group in readouts.per_subcircuit() {
            let total: f64 = group.relative_frequency_by_int().iter().sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }
}
