//! Lexer for Jaqal source text.
//!
//! Newlines are significant (they terminate a statement exactly like `;`,
//! and both may be mixed freely per §6.1), so unlike a typical whitespace
//! skip they are their own token rather than being swallowed by
//! `#[logos(skip ...)]`.

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
pub enum Token {
    #[regex(r"\n+")]
    Newline,

    #[token("register", priority = 3)]
    Register,

    #[token("map", priority = 3)]
    Map,

    #[token("let", priority = 3)]
    Let,

    #[token("from", priority = 3)]
    From,

    #[token("usepulses", priority = 3)]
    UsePulses,

    #[token("macro", priority = 3)]
    Macro,

    #[token("loop", priority = 3)]
    Loop,

    #[token("subcircuit", priority = 3)]
    Subcircuit,

    #[token("branch", priority = 3)]
    Branch,

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    IntLiteral(i64),

    #[regex(r#""[01]+""#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    QuotedBits(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[token(".")]
    Dot,

    #[token("*")]
    Star,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("<")]
    LAngle,

    #[token(">")]
    RAngle,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token("|")]
    Pipe,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Newline => write!(f, "<newline>"),
            Token::Register => write!(f, "register"),
            Token::Map => write!(f, "map"),
            Token::Let => write!(f, "let"),
            Token::From => write!(f, "from"),
            Token::UsePulses => write!(f, "usepulses"),
            Token::Macro => write!(f, "macro"),
            Token::Loop => write!(f, "loop"),
            Token::Subcircuit => write!(f, "subcircuit"),
            Token::Branch => write!(f, "branch"),
            Token::FloatLiteral(v) => write!(f, "{v}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
            Token::QuotedBits(s) => write!(f, "\"{s}\""),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Dot => write!(f, "."),
            Token::Star => write!(f, "*"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LAngle => write!(f, "<"),
            Token::RAngle => write!(f, ">"),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::Pipe => write!(f, "|"),
        }
    }
}

/// A token with its span information.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: std::ops::Range<usize>,
}

/// Tokenize Jaqal source, returning each token or the span/text of an
/// unrecognized character.
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken, (std::ops::Range<usize>, String)>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push(Ok(SpannedToken { token, span })),
            Err(()) => {
                let slice = &source[span.clone()];
                tokens.push(Err((span, format!("invalid token: '{slice}'"))));
            }
        }
    }

    tokens
}

/// Translate a byte offset into a 1-based line and column, for error
/// reporting (§6.2).
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for ch in source[..offset.min(source.len())].chars() {
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_of(source: &str) -> Vec<Token> {
        tokenize(source).into_iter().filter_map(Result::ok).map(|t| t.token).collect()
    }

    #[test]
    fn register_declaration() {
        let tokens = tokens_of("register q[3]\n");
        assert_eq!(
            tokens,
            vec![
                Token::Register,
                Token::Identifier("q".to_string()),
                Token::LBracket,
                Token::IntLiteral(3),
                Token::RBracket,
                Token::Newline,
            ]
        );
    }

    #[test]
    fn gate_call_with_float_argument() {
        let tokens = tokens_of("Rx q[0] 1.57\n");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("Rx".to_string()),
                Token::Identifier("q".to_string()),
                Token::LBracket,
                Token::IntLiteral(0),
                Token::RBracket,
                Token::FloatLiteral(1.57),
                Token::Newline,
            ]
        );
    }

    #[test]
    fn qualified_usepulses_with_leading_dots() {
        let tokens = tokens_of("from ..gates usepulses *\n");
        assert_eq!(
            tokens,
            vec![
                Token::From,
                Token::Dot,
                Token::Dot,
                Token::Identifier("gates".to_string()),
                Token::UsePulses,
                Token::Star,
                Token::Newline,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = tokens_of("// a comment\nlet n 3 /* inline */\n");
        assert_eq!(
            tokens,
            vec![
                Token::Newline,
                Token::Let,
                Token::Identifier("n".to_string()),
                Token::IntLiteral(3),
                Token::Newline,
            ]
        );
    }

    #[test]
    fn branch_case_state_is_quoted_bits() {
        let tokens = tokens_of("branch { \"01\": { } }\n");
        assert!(matches!(&tokens[2], Token::QuotedBits(s) if s == "01"));
    }
}
