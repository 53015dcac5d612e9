//! Subcircuit discovery (§4.10): walk a circuit (already let-filled and
//! macro-expanded, typically post `SubcircuitExpand`) and return the
//! ordered list of **Trace**s — the prepare/measure-delimited spans that
//! were run on hardware.
//!
//! Rules: consecutive `prepare`s are allowed (a partial trace that never
//! reached its `measure` is simply discarded, not reported); a `measure`
//! with no preceding `prepare` is fatal; any other gate seen outside an
//! open trace is fatal; a `measure` followed by a `prepare` within the
//! body of a `LoopStatement` whose iteration count is greater than one is
//! fatal, since replaying that boundary crossing is ambiguous. A Trace's
//! address is the statement-index path from the circuit root to its
//! prepare and to its measure.

use jaqal_ir::{Circuit, JaqalError, JaqalResult, ResolveContext, Statement};

const DEFAULT_PREPARE_NAME: &str = "prepare_all";
const DEFAULT_MEASURE_NAME: &str = "measure_all";

/// A prepare/measure-delimited span of a circuit, addressed by the
/// statement-index path from the circuit root to each bounding gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    prepare_path: Vec<usize>,
    measure_path: Vec<usize>,
}

impl Trace {
    pub fn prepare_path(&self) -> &[usize] {
        &self.prepare_path
    }

    pub fn measure_path(&self) -> &[usize] {
        &self.measure_path
    }
}

/// Finds every Trace in a circuit's body.
#[derive(Debug, Clone)]
pub struct SubcircuitDiscovery {
    prepare_name: String,
    measure_name: String,
}

impl Default for SubcircuitDiscovery {
    fn default() -> Self {
        SubcircuitDiscovery {
            prepare_name: DEFAULT_PREPARE_NAME.to_string(),
            measure_name: DEFAULT_MEASURE_NAME.to_string(),
        }
    }
}

impl SubcircuitDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prepare_name(mut self, name: impl Into<String>) -> Self {
        self.prepare_name = name.into();
        self
    }

    pub fn with_measure_name(mut self, name: impl Into<String>) -> Self {
        self.measure_name = name.into();
        self
    }

    pub fn discover(&self, circuit: &Circuit) -> JaqalResult<Vec<Trace>> {
        let mut state = WalkState {
            prepare_name: &self.prepare_name,
            measure_name: &self.measure_name,
            open: None,
            traces: Vec::new(),
            path: Vec::new(),
        };
        state.walk(circuit.body().statements())?;
        Ok(state.traces)
    }
}

struct WalkState<'a> {
    prepare_name: &'a str,
    measure_name: &'a str,
    open: Option<Vec<usize>>,
    traces: Vec<Trace>,
    path: Vec<usize>,
}

/// Whether a call to `walk` closed at least one trace, and whether it saw
/// a trace close and then another open later in the same call — the
/// pattern that's fatal inside a repeated loop body.
struct WalkReport {
    closed: bool,
    reopened_after_close: bool,
}

impl WalkState<'_> {
    fn walk(&mut self, stmts: &[Statement]) -> JaqalResult<WalkReport> {
        let mut closed = false;
        let mut reopened_after_close = false;
        for (idx, stmt) in stmts.iter().enumerate() {
            self.path.push(idx);
            match stmt {
                Statement::Gate(g) if g.name() == self.prepare_name => {
                    if closed {
                        reopened_after_close = true;
                    }
                    self.open = Some(self.path.clone());
                }
                Statement::Gate(g) if g.name() == self.measure_name => {
                    let prepare_path = self.open.take().ok_or_else(|| {
                        JaqalError::tracing("measure with no preceding prepare").with_path(
                            jaqal_ir::IrPath(self.path.clone()),
                        )
                    })?;
                    self.traces.push(Trace {
                        prepare_path,
                        measure_path: self.path.clone(),
                    });
                    closed = true;
                }
                Statement::Gate(g) => {
                    if self.open.is_none() {
                        return Err(JaqalError::tracing(format!(
                            "gate {} outside an open subcircuit trace",
                            g.name()
                        ))
                        .with_path(jaqal_ir::IrPath(self.path.clone())));
                    }
                }
                Statement::Block(b) => {
                    let report = self.walk(b.statements())?;
                    closed |= report.closed;
                    reopened_after_close |= report.reopened_after_close;
                }
                Statement::Loop(l) => {
                    let report = self.walk(l.body().statements())?;
                    if report.reopened_after_close {
                        let iterations = l.iterations().resolve(&ResolveContext::new())?;
                        if iterations > 1 {
                            return Err(JaqalError::tracing(
                                "a measure/prepare boundary inside a loop body run more than once is ambiguous",
                            )
                            .with_path(jaqal_ir::IrPath(self.path.clone())));
                        }
                    }
                    closed |= report.closed;
                    reopened_after_close |= report.reopened_after_close;
                }
                Statement::Branch(br) => {
                    for (case_idx, case) in br.cases().iter().enumerate() {
                        self.path.push(case_idx);
                        let report = self.walk(case.body().statements())?;
                        closed |= report.closed;
                        reopened_after_close |= report.reopened_after_close;
                        self.path.pop();
                    }
                }
            }
            self.path.pop();
        }
        Ok(WalkReport {
            closed,
            reopened_after_close,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jaqal_lang::parse;

    fn discover(source: &str) -> Vec<Trace> {
        let circuit = parse(source).unwrap();
        SubcircuitDiscovery::new().discover(&circuit).unwrap()
    }

    #[test]
    fn single_trace_is_discovered() {
        let traces = discover("register q[1]\nprepare_all\nPx q[0]\nmeasure_all\n");
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].prepare_path(), &[0]);
        assert_eq!(traces[0].measure_path(), &[2]);
    }

    #[test]
    fn consecutive_prepares_discard_the_partial() {
        let traces = discover(
            "register q[1]\nprepare_all\nprepare_all\nPx q[0]\nmeasure_all\n",
        );
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].prepare_path(), &[1]);
    }

    #[test]
    fn measure_without_prepare_is_fatal() {
        let circuit = parse("register q[1]\nmeasure_all\n").unwrap();
        let err = SubcircuitDiscovery::new().discover(&circuit).unwrap_err();
        assert!(matches!(err, JaqalError::Tracing { .. }));
    }

    #[test]
    fn gate_outside_trace_is_fatal() {
        let circuit = parse("register q[1]\nPx q[0]\n").unwrap();
        let err = SubcircuitDiscovery::new().discover(&circuit).unwrap_err();
        assert!(matches!(err, JaqalError::Tracing { .. }));
    }

    #[test]
    fn custom_gate_names_are_honored() {
        let circuit = parse("register q[1]\nmy_prep\nPx q[0]\nmy_meas\n").unwrap();
        let traces = SubcircuitDiscovery::new()
            .with_prepare_name("my_prep")
            .with_measure_name("my_meas")
            .discover(&circuit)
            .unwrap();
        assert_eq!(traces.len(), 1);
    }

    #[test]
    fn repeated_loop_around_trace_boundary_is_fatal() {
        let circuit = parse(
            "register q[1]\nloop 3\n{\nmeasure_all\nprepare_all\n}\n",
        )
        .unwrap();
        // Open a trace before the loop so the loop body's `measure` has
        // something to close.
        let mut state = WalkState {
            prepare_name: DEFAULT_PREPARE_NAME,
            measure_name: DEFAULT_MEASURE_NAME,
            open: Some(vec![]),
            traces: Vec::new(),
            path: Vec::new(),
        };
        let err = state.walk(circuit.body().statements()).unwrap_err();
        assert!(matches!(err, JaqalError::Tracing { .. }));
    }
}
