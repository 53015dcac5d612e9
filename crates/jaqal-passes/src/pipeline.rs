//! Composes the opt-in semantic passes into one fixed-order pipeline.
//!
//! §6.3 names three opt-in pass flags on the public `parse` entry point:
//! `expand_let`, `expand_let_map`, `expand_macro`. The other processing
//! options it lists — `override_dict`, `inject_pulses`, `autoload_pulses`,
//! `filename` — are build-time concerns already carried by
//! [`jaqal_ir::BuilderOptions`]; `return_usepulses` belongs to whatever
//! caller wraps building and this pipeline together. `SubcircuitExpand`
//! and `UnitTiming` aren't gated by any option here — they're a later,
//! always-applied stage a caller runs when preparing a circuit for
//! hardware submission, not part of `parse`'s opt-in set.

use jaqal_ir::{Circuit, JaqalResult};

use crate::let_fill::LetFill;
use crate::macro_expand::MacroExpand;
use crate::map_resolve::MapResolve;
use crate::pass::Pass;
use crate::subcircuit_expand::SubcircuitExpand;
use crate::unit_timing::UnitTiming;

/// Which opt-in passes `PassPipeline::run` should apply, and in what
/// order — fixed at let-before-map, macro-before-unit-timing,
/// subcircuit-expand-after-macro-expand, per §5.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessingOptions {
    pub expand_let: bool,
    pub expand_let_map: bool,
    pub expand_macro: bool,
    /// Bracket subcircuit blocks with prepare/measure gates. Independent
    /// of the three `parse`-level flags above; on by default for a
    /// pipeline that's preparing a circuit to run.
    pub expand_subcircuit: bool,
    /// Normalize to unit-timing form (§4.8). Only meaningful once macros
    /// and subcircuits are already expanded.
    pub normalize_timing: bool,
}

impl ProcessingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// All opt-in passes enabled, as a caller preparing a circuit for
    /// hardware submission would want.
    pub fn all() -> Self {
        ProcessingOptions {
            expand_let: true,
            expand_let_map: true,
            expand_macro: true,
            expand_subcircuit: true,
            normalize_timing: true,
        }
    }

    #[must_use]
    pub fn with_expand_let(mut self, on: bool) -> Self {
        self.expand_let = on;
        self
    }

    #[must_use]
    pub fn with_expand_let_map(mut self, on: bool) -> Self {
        self.expand_let_map = on;
        self
    }

    #[must_use]
    pub fn with_expand_macro(mut self, on: bool) -> Self {
        self.expand_macro = on;
        self
    }

    #[must_use]
    pub fn with_expand_subcircuit(mut self, on: bool) -> Self {
        self.expand_subcircuit = on;
        self
    }

    #[must_use]
    pub fn with_normalize_timing(mut self, on: bool) -> Self {
        self.normalize_timing = on;
        self
    }
}

/// Runs whichever passes a [`ProcessingOptions`] selects, in the fixed
/// order §5 requires.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassPipeline {
    options: ProcessingOptions,
}

impl PassPipeline {
    pub fn new(options: ProcessingOptions) -> Self {
        PassPipeline { options }
    }

    pub fn run(&self, mut circuit: Circuit) -> JaqalResult<Circuit> {
        if self.options.expand_let {
            circuit = LetFill::new().run(circuit)?;
        }
        if self.options.expand_let_map {
            circuit = MapResolve::new().run(circuit)?;
        }
        if self.options.expand_macro {
            circuit = MacroExpand::new().run(circuit)?;
        }
        if self.options.expand_subcircuit {
            circuit = SubcircuitExpand::new().run(circuit)?;
        }
        if self.options.normalize_timing {
            circuit = UnitTiming::new().run(circuit)?;
        }
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jaqal_lang::{emit, parse};

    #[test]
    fn no_options_leaves_circuit_unchanged_in_shape() {
        let circuit = parse("let n 3\nregister q[n]\nPx q[0]\n").unwrap();
        let before = emit(&circuit);
        let after = emit(&PassPipeline::new(ProcessingOptions::new()).run(circuit).unwrap());
        assert_eq!(before, after);
    }

    #[test]
    fn expand_let_resolves_register_size() {
        let circuit = parse("let n 3\nregister q[n]\nPx q[0]\n").unwrap();
        let out = PassPipeline::new(ProcessingOptions::new().with_expand_let(true))
            .run(circuit)
            .unwrap();
        assert!(emit(&out).contains("register q[3]"));
    }

    #[test]
    fn full_pipeline_runs_in_fixed_order() {
        let source = "register q[1]\nmacro foo a\n{\nsubcircuit\n{\nPx a\n}\n}\nfoo q[0]\n";
        let circuit = parse(source).unwrap();
        let out = PassPipeline::new(ProcessingOptions::all()).run(circuit).unwrap();
        let text = emit(&out);
        assert!(text.contains("prepare_all"), "got: {text}");
        assert!(text.contains("measure_all"), "got: {text}");
        assert!(text.contains("Px q[0]"), "got: {text}");
    }
}
