//! Recursive-descent parser: token stream → the uniform s-expression tree
//! consumed by `jaqal_ir::Builder` (§4.1).

use jaqal_ir::{Anchor, JaqalError, JaqalResult, SExpr, SourceLocation};

use crate::lexer::{line_column, tokenize, SpannedToken, Token};

pub struct Parser<'s> {
    source: &'s str,
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str) -> JaqalResult<Self> {
        let mut tokens = Vec::new();
        for result in tokenize(source) {
            match result {
                Ok(t) => tokens.push(t),
                Err((span, message)) => {
                    let (line, column) = line_column(source, span.start);
                    return Err(JaqalError::parse(
                        message,
                        Anchor::Source(SourceLocation {
                            line,
                            column,
                            offset: span.start,
                        }),
                    ));
                }
            }
        }
        Ok(Parser { source, tokens, pos: 0 })
    }

    fn anchor_here(&self) -> Anchor {
        let offset = self.tokens.get(self.pos).map(|t| t.span.start).unwrap_or(self.source.len());
        let (line, column) = line_column(self.source, offset);
        Anchor::Source(SourceLocation { line, column, offset })
    }

    fn error(&self, message: impl Into<String>) -> JaqalError {
        JaqalError::parse(message, self.anchor_here())
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).map(|t| t.token.clone());
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> JaqalResult<()> {
        if self.consume(token) {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected {token}, found {}",
                self.peek().map(|t| t.to_string()).unwrap_or_else(|| "end of input".to_string())
            )))
        }
    }

    /// Skip any run of statement terminators (`;` and/or newline; mixing is
    /// permitted, per §6.1).
    fn skip_terminators(&mut self) {
        while matches!(self.peek(), Some(Token::Newline) | Some(Token::Semicolon)) {
            self.advance();
        }
    }

    /// Skip newlines only, not `;`. Used between a statement's header
    /// tokens and its required block, where a printer-inserted newline
    /// must not be mistaken for an empty statement.
    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Some(Token::Newline)) {
            self.advance();
        }
    }

    fn parse_identifier(&mut self) -> JaqalResult<String> {
        match self.advance() {
            Some(Token::Identifier(s)) => Ok(s),
            other => Err(self.error(format!(
                "expected an identifier, found {}",
                other.map(|t| t.to_string()).unwrap_or_else(|| "end of input".to_string())
            ))),
        }
    }

    /// A dot-joined identifier, possibly preceded by one or more leading
    /// dots (a relative `usepulses` module path).
    fn parse_qualified_identifier(&mut self) -> JaqalResult<String> {
        let mut out = String::new();
        while self.consume(&Token::Dot) {
            out.push('.');
        }
        out.push_str(&self.parse_identifier()?);
        while self.consume(&Token::Dot) {
            out.push('.');
            out.push_str(&self.parse_identifier()?);
        }
        Ok(out)
    }

    fn parse_int_literal(&mut self) -> JaqalResult<i64> {
        match self.advance() {
            Some(Token::IntLiteral(v)) => Ok(v),
            other => Err(self.error(format!(
                "expected an integer, found {}",
                other.map(|t| t.to_string()).unwrap_or_else(|| "end of input".to_string())
            ))),
        }
    }

    /// Parse a whole program into `(circuit *items)`.
    pub fn parse_program(&mut self) -> JaqalResult<SExpr> {
        let mut items = Vec::new();
        self.skip_terminators();
        while !self.is_eof() {
            items.push(self.parse_top_level_statement()?);
            self.skip_terminators();
        }
        Ok(SExpr::list(
            std::iter::once(SExpr::word("circuit")).chain(items).collect(),
        ))
    }

    fn parse_top_level_statement(&mut self) -> JaqalResult<SExpr> {
        match self.peek() {
            Some(Token::Register) => self.parse_register(),
            Some(Token::Map) => self.parse_map(),
            Some(Token::Let) => self.parse_let(),
            Some(Token::From) => self.parse_usepulses(),
            _ => self.parse_body_statement(),
        }
    }

    fn parse_register(&mut self) -> JaqalResult<SExpr> {
        self.expect(&Token::Register)?;
        let name = self.parse_identifier()?;
        self.expect(&Token::LBracket)?;
        let size = self.parse_int_or_ident()?;
        self.expect(&Token::RBracket)?;
        Ok(SExpr::list(vec![SExpr::word("register"), SExpr::word(name), size]))
    }

    fn parse_int_or_ident(&mut self) -> JaqalResult<SExpr> {
        match self.peek() {
            Some(Token::IntLiteral(_)) => Ok(SExpr::Int(self.parse_int_literal()?)),
            Some(Token::Identifier(_)) => Ok(SExpr::word(self.parse_identifier()?)),
            other => Err(self.error(format!(
                "expected an integer or identifier, found {}",
                other.map(|t| t.to_string()).unwrap_or_else(|| "end of input".to_string())
            ))),
        }
    }

    /// An optional int/ident component of a slice; `ε` lowers to the `null`
    /// sentinel word the builder recognizes.
    fn parse_optional_slice_component(&mut self) -> JaqalResult<SExpr> {
        match self.peek() {
            Some(Token::IntLiteral(_)) => Ok(SExpr::Int(self.parse_int_literal()?)),
            Some(Token::Identifier(_)) => Ok(SExpr::word(self.parse_identifier()?)),
            _ => Ok(SExpr::word("null")),
        }
    }

    fn parse_map(&mut self) -> JaqalResult<SExpr> {
        self.expect(&Token::Map)?;
        let name = self.parse_identifier()?;
        let src = self.parse_identifier()?;
        if !self.consume(&Token::LBracket) {
            return Ok(SExpr::list(vec![SExpr::word("map"), SExpr::word(name), SExpr::word(src)]));
        }
        // Disambiguate index vs slice by checking for a ':' before ']'.
        let first = if self.check(&Token::Colon) {
            SExpr::word("null")
        } else {
            self.parse_optional_slice_component()?
        };
        if self.consume(&Token::RBracket) {
            // single index: `ident [ int|ident ]`
            return Ok(SExpr::list(vec![
                SExpr::word("map"),
                SExpr::word(name),
                SExpr::word(src),
                first,
            ]));
        }
        self.expect(&Token::Colon)?;
        let stop = self.parse_optional_slice_component()?;
        let step = if self.consume(&Token::Colon) {
            self.parse_optional_slice_component()?
        } else {
            SExpr::word("null")
        };
        self.expect(&Token::RBracket)?;
        Ok(SExpr::list(vec![
            SExpr::word("map"),
            SExpr::word(name),
            SExpr::word(src),
            first,
            stop,
            step,
        ]))
    }

    fn parse_let(&mut self) -> JaqalResult<SExpr> {
        self.expect(&Token::Let)?;
        let name = self.parse_identifier()?;
        let value = match self.advance() {
            Some(Token::IntLiteral(v)) => SExpr::Int(v),
            Some(Token::FloatLiteral(v)) => SExpr::Float(v),
            other => {
                return Err(self.error(format!(
                    "expected a number, found {}",
                    other.map(|t| t.to_string()).unwrap_or_else(|| "end of input".to_string())
                )));
            }
        };
        Ok(SExpr::list(vec![SExpr::word("let"), SExpr::word(name), value]))
    }

    fn parse_usepulses(&mut self) -> JaqalResult<SExpr> {
        self.expect(&Token::From)?;
        let module = self.parse_qualified_identifier()?;
        self.expect(&Token::UsePulses)?;
        self.expect(&Token::Star)?;
        Ok(SExpr::list(vec![
            SExpr::word("usepulses"),
            SExpr::word(module),
            SExpr::word("*"),
        ]))
    }

    fn parse_body_statement(&mut self) -> JaqalResult<SExpr> {
        match self.peek() {
            Some(Token::Macro) => self.parse_macro(),
            Some(Token::Loop) => self.parse_loop(),
            Some(Token::Subcircuit) => self.parse_subcircuit(),
            Some(Token::Branch) => self.parse_branch(),
            Some(Token::LBrace) | Some(Token::LAngle) => self.parse_block(),
            Some(Token::Identifier(_)) => self.parse_gate(),
            other => Err(self.error(format!(
                "expected a statement, found {}",
                other.map(|t| t.to_string()).unwrap_or_else(|| "end of input".to_string())
            ))),
        }
    }

    fn parse_gate(&mut self) -> JaqalResult<SExpr> {
        let name = self.parse_qualified_identifier()?;
        let mut args = Vec::new();
        loop {
            match self.peek() {
                Some(Token::IntLiteral(v)) => {
                    args.push(SExpr::Int(*v));
                    self.advance();
                }
                Some(Token::FloatLiteral(v)) => {
                    args.push(SExpr::Float(*v));
                    self.advance();
                }
                Some(Token::Identifier(_)) => {
                    let ident = self.parse_identifier()?;
                    if self.consume(&Token::LBracket) {
                        let index = self.parse_int_or_ident()?;
                        self.expect(&Token::RBracket)?;
                        args.push(SExpr::list(vec![SExpr::word("array_item"), SExpr::word(ident), index]));
                    } else {
                        args.push(SExpr::word(ident));
                    }
                }
                _ => break,
            }
        }
        Ok(SExpr::list(
            std::iter::once(SExpr::word("gate")).chain(std::iter::once(SExpr::word(name))).chain(args).collect(),
        ))
    }

    fn parse_macro(&mut self) -> JaqalResult<SExpr> {
        self.expect(&Token::Macro)?;
        let name = self.parse_identifier()?;
        let mut params = Vec::new();
        while matches!(self.peek(), Some(Token::Identifier(_))) {
            params.push(SExpr::word(self.parse_identifier()?));
        }
        self.skip_newlines();
        let body = self.parse_block()?;
        Ok(SExpr::list(
            std::iter::once(SExpr::word("macro"))
                .chain(std::iter::once(SExpr::word(name)))
                .chain(params)
                .chain(std::iter::once(body))
                .collect(),
        ))
    }

    fn parse_loop(&mut self) -> JaqalResult<SExpr> {
        self.expect(&Token::Loop)?;
        let count = self.parse_int_or_ident()?;
        self.skip_newlines();
        let body = self.parse_block()?;
        Ok(SExpr::list(vec![SExpr::word("loop"), count, body]))
    }

    fn parse_subcircuit(&mut self) -> JaqalResult<SExpr> {
        self.expect(&Token::Subcircuit)?;
        let iterations = self.parse_optional_slice_component()?;
        self.skip_newlines();
        let body = self.parse_block()?;
        let stmts = match body {
            SExpr::List(items) => items,
            other => vec![other],
        };
        Ok(SExpr::list(
            std::iter::once(SExpr::word("subcircuit_block"))
                .chain(std::iter::once(iterations))
                .chain(stmts.into_iter().skip(1))
                .collect(),
        ))
    }

    fn parse_branch(&mut self) -> JaqalResult<SExpr> {
        self.expect(&Token::Branch)?;
        self.skip_newlines();
        self.expect(&Token::LBrace)?;
        self.skip_terminators();
        let mut cases = Vec::new();
        while !self.check(&Token::RBrace) {
            cases.push(self.parse_case()?);
            self.skip_terminators();
        }
        self.expect(&Token::RBrace)?;
        Ok(SExpr::list(
            std::iter::once(SExpr::word("branch")).chain(cases).collect(),
        ))
    }

    fn parse_case(&mut self) -> JaqalResult<SExpr> {
        let bits = match self.advance() {
            Some(Token::QuotedBits(s)) => s,
            other => {
                return Err(self.error(format!(
                    "expected a quoted bitstring, found {}",
                    other.map(|t| t.to_string()).unwrap_or_else(|| "end of input".to_string())
                )));
            }
        };
        let state = i64::from_str_radix(&bits, 2)
            .map_err(|_| self.error(format!("malformed branch case bitstring {bits:?}")))?;
        self.expect(&Token::Colon)?;
        self.skip_newlines();
        let body = self.parse_block()?;
        Ok(SExpr::list(vec![SExpr::word("case"), SExpr::Int(state), body]))
    }

    /// `{ ... }` (sequential_block) or `< ... >` (parallel_block).
    fn parse_block(&mut self) -> JaqalResult<SExpr> {
        let (open, close, separator, command) = if self.check(&Token::LBrace) {
            (Token::LBrace, Token::RBrace, Token::Semicolon, "sequential_block")
        } else if self.check(&Token::LAngle) {
            (Token::LAngle, Token::RAngle, Token::Pipe, "parallel_block")
        } else {
            return Err(self.error("expected a block ('{' or '<')"));
        };
        self.expect(&open)?;
        self.skip_terminators();
        let mut stmts = Vec::new();
        while !self.check(&close) {
            stmts.push(self.parse_body_statement()?);
            while matches!(self.peek(), Some(Token::Newline)) || self.peek() == Some(&separator) {
                self.advance();
            }
        }
        self.expect(&close)?;
        Ok(SExpr::list(
            std::iter::once(SExpr::word(command)).chain(stmts).collect(),
        ))
    }
}

/// Parse a full Jaqal source string into the canonical s-expression form.
pub fn parse_to_sexpr(source: &str) -> JaqalResult<SExpr> {
    Parser::new(source)?.parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_register_declaration() {
        let sexpr = parse_to_sexpr("register q[3]\n").unwrap();
        assert_eq!(
            sexpr,
            SExpr::list(vec![
                SExpr::word("circuit"),
                SExpr::list(vec![SExpr::word("register"), SExpr::word("q"), SExpr::Int(3)]),
            ])
        );
    }

    #[test]
    fn parses_gate_with_array_item_argument() {
        let sexpr = parse_to_sexpr("Rx q[0] 1.57\n").unwrap();
        let body = sexpr.as_command("circuit").unwrap();
        assert_eq!(
            body[0],
            SExpr::list(vec![
                SExpr::word("gate"),
                SExpr::word("Rx"),
                SExpr::list(vec![SExpr::word("array_item"), SExpr::word("q"), SExpr::Int(0)]),
                SExpr::Float(1.57),
            ])
        );
    }

    #[test]
    fn parses_sequential_block_with_semicolon_terminators() {
        let sexpr = parse_to_sexpr("{ Px q[0]; Py q[1] }\n").unwrap();
        let body = sexpr.as_command("circuit").unwrap();
        let block = body[0].as_command("sequential_block").unwrap();
        assert_eq!(block.len(), 2);
    }

    #[test]
    fn parses_map_slice_with_elided_bounds() {
        let sexpr = parse_to_sexpr("register q[10]\nmap s q[2::3]\n").unwrap();
        let body = sexpr.as_command("circuit").unwrap();
        let map_form = body[1].as_command("map").unwrap();
        assert_eq!(map_form.len(), 5);
        assert_eq!(map_form[2], SExpr::Int(2));
        assert_eq!(map_form[3], SExpr::word("null"));
        assert_eq!(map_form[4], SExpr::Int(3));
    }

    #[test]
    fn parses_branch_with_quoted_bitstring_case() {
        let sexpr = parse_to_sexpr("branch {\n\"01\": { Px q[0] }\n}\n").unwrap();
        let body = sexpr.as_command("circuit").unwrap();
        let cases = body[0].as_command("branch").unwrap();
        let case = cases[0].as_command("case").unwrap();
        assert_eq!(case[0], SExpr::Int(1));
    }

    #[test]
    fn reports_line_and_column_on_parse_error() {
        let err = parse_to_sexpr("register q[\n").unwrap_err();
        match err {
            JaqalError::Parse { anchor: Anchor::Source(loc), .. } => {
                assert_eq!(loc.line, 2);
            }
            other => panic!("expected a Parse error, found {other:?}"),
        }
    }
}
