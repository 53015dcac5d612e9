//! The unified Jaqal error taxonomy.
//!
//! Every failure anywhere in the front end — lexer, parser, builder, or a
//! semantic pass — is reported as one of the seven kinds below. Each variant
//! carries a source location when one is known, or otherwise an [`IrPath`]
//! pointing at the offending node relative to the circuit root.

use std::fmt;

/// A line/column/byte-offset anchor into the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A path of statement indices from the circuit root to an offending node,
/// used as a fallback anchor when no source location survived the rewrite
/// that produced the error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrPath(pub Vec<usize>);

impl fmt::Display for IrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root")?;
        for idx in &self.0 {
            write!(f, "[{idx}]")?;
        }
        Ok(())
    }
}

/// Where an error is anchored: a precise source location, a structural path,
/// or neither (the site genuinely has no anchor, e.g. a processing-option
/// validation failure).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Anchor {
    #[default]
    None,
    Source(SourceLocation),
    Path(IrPath),
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::None => Ok(()),
            Anchor::Source(loc) => write!(f, " at {loc}"),
            Anchor::Path(path) => write!(f, " at {path}"),
        }
    }
}

/// The single Jaqal error taxonomy, discriminated by kind.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum JaqalError {
    /// Grammar failure: the token stream could not be parsed.
    #[error("parse error{anchor}: {message}")]
    Parse { message: String, anchor: Anchor },

    /// Violation of an IR invariant at build time (e.g. two fundamental
    /// registers, a subcircuit nested in a parallel block, an unknown
    /// s-expression command word).
    #[error("structure error{anchor}: {message}")]
    Structure { message: String, anchor: Anchor },

    /// An identifier could not be resolved, or was resolved to the wrong
    /// category (e.g. a constant where a register was expected).
    #[error("name error{anchor}: {message}")]
    Name { message: String, anchor: Anchor },

    /// A parameter kind mismatch, or a non-integer value where an integer
    /// was required (register size, loop count, array index, slice
    /// component).
    #[error("type error{anchor}: {message}")]
    Type { message: String, anchor: Anchor },

    /// Wrong number of gate/macro arguments, or mixed positional and
    /// keyword arguments in a single call.
    #[error("arity error{anchor}: {message}")]
    Arity { message: String, anchor: Anchor },

    /// An index or slice is out of range, a NamedQubit was sliced, or a
    /// `map` form is malformed.
    #[error("shape error{anchor}: {message}")]
    Shape { message: String, anchor: Anchor },

    /// The subcircuit discovery rules (prepare/measure pairing) were
    /// violated.
    #[error("tracing error{anchor}: {message}")]
    Tracing { message: String, anchor: Anchor },
}

pub type JaqalResult<T> = Result<T, JaqalError>;

impl JaqalError {
    pub fn parse(message: impl Into<String>, anchor: Anchor) -> Self {
        JaqalError::Parse {
            message: message.into(),
            anchor,
        }
    }

    pub fn structure(message: impl Into<String>) -> Self {
        JaqalError::Structure {
            message: message.into(),
            anchor: Anchor::None,
        }
    }

    pub fn name(message: impl Into<String>) -> Self {
        JaqalError::Name {
            message: message.into(),
            anchor: Anchor::None,
        }
    }

    pub fn ty(message: impl Into<String>) -> Self {
        JaqalError::Type {
            message: message.into(),
            anchor: Anchor::None,
        }
    }

    pub fn arity(message: impl Into<String>) -> Self {
        JaqalError::Arity {
            message: message.into(),
            anchor: Anchor::None,
        }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        JaqalError::Shape {
            message: message.into(),
            anchor: Anchor::None,
        }
    }

    pub fn tracing(message: impl Into<String>) -> Self {
        JaqalError::Tracing {
            message: message.into(),
            anchor: Anchor::None,
        }
    }

    pub fn with_path(self, path: IrPath) -> Self {
        self.with_anchor(Anchor::Path(path))
    }

    pub fn with_anchor(self, anchor: Anchor) -> Self {
        use JaqalError::{Arity, Name, Parse, Shape, Structure, Tracing, Type};
        match self {
            Parse { message, .. } => Parse { message, anchor },
            Structure { message, .. } => Structure { message, anchor },
            Name { message, .. } => Name { message, anchor },
            Type { message, .. } => Type { message, anchor },
            Arity { message, .. } => Arity { message, anchor },
            Shape { message, .. } => Shape { message, anchor },
            Tracing { message, .. } => Tracing { message, anchor },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_defaults_to_none() {
        let err = JaqalError::structure("two fundamental registers");
        assert_eq!(err.to_string(), "structure error: two fundamental registers");
    }

    #[test]
    fn with_path_renders_ir_path() {
        let err = JaqalError::tracing("measure without prepare").with_path(IrPath(vec![0, 2]));
        assert_eq!(
            err.to_string(),
            "tracing error at root[0][2]: measure without prepare"
        );
    }
}
