//! The `Pass` trait shared by every semantic pass.
//!
//! Unlike `arvak-compile`'s `Pass`, which mutates a `CircuitDag` in place
//! alongside a side `PropertySet`, a Jaqal pass is a pure function from one
//! `Circuit` to the next (§5: "each pass takes a Circuit and returns a new
//! Circuit"), so the trait is a single `run` method with no `PropertySet`
//! analogue.

use jaqal_ir::{Circuit, JaqalResult};

/// A semantic pass: a pure rewrite from one `Circuit` to the next.
pub trait Pass {
    /// A short, stable name used in logging.
    fn name(&self) -> &str;

    /// Run the pass, consuming the input circuit and producing the next one.
    fn run(&self, circuit: Circuit) -> JaqalResult<Circuit>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Identity;

    impl Pass for Identity {
        fn name(&self) -> &str {
            "identity"
        }

        fn run(&self, circuit: Circuit) -> JaqalResult<Circuit> {
            Ok(circuit)
        }
    }

    #[test]
    fn identity_pass_round_trips() {
        let pass = Identity;
        let circuit = Circuit::new();
        assert_eq!(pass.name(), "identity");
        assert!(pass.run(circuit).is_ok());
    }
}
