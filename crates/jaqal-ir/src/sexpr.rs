//! The s-expression tree: the sole interchange format between the parser
//! (`jaqal-lang`) and the IR builder (this crate's [`crate::builder`]).
//!
//! Every Jaqal statement form lowers to one `SExpr::List` whose first
//! element is a command-word `SExpr::Word`, per §4.1's form table.

use std::fmt;

/// One node of the s-expression tree. `Int`/`Float`/`String` carry literal
/// values; `Word` carries an identifier or command keyword; `List` nests.
#[derive(Debug, Clone, PartialEq)]
pub enum SExpr {
    Int(i64),
    Float(f64),
    Word(String),
    List(Vec<SExpr>),
}

impl SExpr {
    pub fn word(s: impl Into<String>) -> Self {
        SExpr::Word(s.into())
    }

    pub fn list(items: Vec<SExpr>) -> Self {
        SExpr::List(items)
    }

    /// If this is a `List` whose head is the given command word, return the
    /// remaining elements. Used throughout the builder to dispatch on
    /// statement kind.
    pub fn as_command(&self, command: &str) -> Option<&[SExpr]> {
        match self {
            SExpr::List(items) => match items.first() {
                Some(SExpr::Word(w)) if w == command => Some(&items[1..]),
                _ => None,
            },
            _ => None,
        }
    }

    /// The command word heading this list, if any.
    pub fn command_word(&self) -> Option<&str> {
        match self {
            SExpr::List(items) => match items.first() {
                Some(SExpr::Word(w)) => Some(w),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_word(&self) -> Option<&str> {
        match self {
            SExpr::Word(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SExpr::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            SExpr::Float(v) => Some(*v),
            SExpr::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExpr]> {
        match self {
            SExpr::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for SExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExpr::Int(v) => write!(f, "{v}"),
            SExpr::Float(v) => write!(f, "{v}"),
            SExpr::Word(w) => write!(f, "{w}"),
            SExpr::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_command_strips_head_word() {
        let expr = SExpr::list(vec![SExpr::word("register"), SExpr::word("q"), SExpr::Int(3)]);
        let rest = expr.as_command("register").unwrap();
        assert_eq!(rest, &[SExpr::word("q"), SExpr::Int(3)]);
        assert!(expr.as_command("map").is_none());
    }

    #[test]
    fn display_renders_parenthesized_form() {
        let expr = SExpr::list(vec![SExpr::word("let"), SExpr::word("n"), SExpr::Int(5)]);
        assert_eq!(expr.to_string(), "(let n 5)");
    }
}
