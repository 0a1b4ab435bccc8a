//! Recursive-descent parser for HerCode.
//!
//! The parser pulls tokens from the lexer one at a time and keeps its own
//! block depth counter. The counter is separate from the lexer's indent
//! stack: a function body's indentation level is only known once its
//! first `Indent` arrives, and an `end` written inside the body leaves the
//! lexer one `Dedent` behind the parser.

use log::debug;

use crate::ast::{FunctionDef, Program, Stmt};
use crate::error::CoreError;
use crate::lexer::{Lexer, Token, TokenKind};

pub fn parse(source: &str) -> Result<Program, CoreError> {
    Parser::new(Lexer::new(source)).parse_program()
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    depth: usize,
}

impl<'src> Parser<'src> {
    pub fn new(mut lexer: Lexer<'src>) -> Self {
        let current = lexer.next_token();
        Parser {
            lexer,
            current,
            depth: 0,
        }
    }

    pub fn parse_program(mut self) -> Result<Program, CoreError> {
        let mut statements = Vec::new();

        // Only function definitions and blank lines may precede `start`.
        loop {
            match self.current.kind {
                TokenKind::Function => {
                    let def = self.parse_function_def()?;
                    statements.push(Stmt::FunctionDef(def));
                }
                TokenKind::Newline => self.advance(),
                TokenKind::Dedent => {
                    // Owed by a function whose `end` sat inside its body.
                    self.depth = self.depth.saturating_sub(1);
                    self.advance();
                }
                TokenKind::Start => break,
                _ => return Err(self.unexpected("'function' or 'start'")),
            }
        }

        self.advance(); // start
        self.depth = 0;
        while self.current.kind == TokenKind::Newline {
            self.advance();
        }
        self.expect(TokenKind::Indent, "indentation after 'start'")?;
        self.depth = 1;

        while !matches!(self.current.kind, TokenKind::Eof | TokenKind::End) {
            match self.current.kind {
                TokenKind::Newline => self.advance(),
                TokenKind::Indent => {
                    self.depth += 1;
                    self.advance();
                }
                TokenKind::Dedent => {
                    self.depth = self.depth.saturating_sub(1);
                    self.advance();
                    if self.depth == 0 {
                        break;
                    }
                }
                TokenKind::Function => return Err(self.nested_function()),
                _ => statements.push(self.parse_statement()?),
            }
        }
        debug!(
            "[parser] start block closed with {} top-level statements",
            statements.len()
        );

        match self.current.kind {
            TokenKind::End if self.depth == 0 => self.advance(),
            TokenKind::End => {
                return Err(self.unexpected(&format!(
                    "'end' back at the indentation of 'start' ({} level(s) still open)",
                    self.depth
                )));
            }
            // A program may stop at end of input without `end` as long as
            // every block has been closed.
            TokenKind::Eof if self.depth == 0 => {
                debug!("[parser] program ends without an explicit 'end'");
                return Ok(Program { statements });
            }
            _ => return Err(self.unexpected("'end' at end of program")),
        }

        while self.current.kind == TokenKind::Newline {
            self.advance();
        }
        if self.current.kind != TokenKind::Eof {
            return Err(self.unexpected("end of input after the final 'end'"));
        }

        Ok(Program { statements })
    }

    fn parse_function_def(&mut self) -> Result<FunctionDef, CoreError> {
        self.expect(TokenKind::Function, "'function'")?;
        let name = self.expect_text(TokenKind::Ident, "function name")?;
        self.expect(TokenKind::Colon, "':' after function name")?;

        let base = self.depth;
        // Set by the first `Indent` inside the body.
        let mut body_level = None;
        let mut body = Vec::new();

        loop {
            match self.current.kind {
                TokenKind::End => {
                    self.advance();
                    break;
                }
                TokenKind::Newline => self.advance(),
                TokenKind::Indent => {
                    self.depth += 1;
                    body_level.get_or_insert(self.depth);
                    self.advance();
                }
                TokenKind::Dedent => {
                    self.depth = self.depth.saturating_sub(1);
                    self.advance();
                    if self.depth < body_level.unwrap_or(base + 1) {
                        let expected = format!("'end' to close function '{name}'");
                        self.expect(TokenKind::End, &expected)?;
                        break;
                    }
                }
                TokenKind::Function => return Err(self.nested_function()),
                TokenKind::Eof => {
                    return Err(self.unexpected(&format!("'end' to close function '{name}'")));
                }
                _ => body.push(self.parse_statement()?),
            }
        }

        debug!("[parser] function '{name}' with {} statement(s)", body.len());
        Ok(FunctionDef { name, body })
    }

    fn parse_statement(&mut self) -> Result<Stmt, CoreError> {
        match self.current.kind {
            TokenKind::Say => {
                self.advance();
                let text = self.expect_text(TokenKind::StringLiteral, "string literal after 'say'")?;
                Ok(Stmt::Say(text))
            }
            TokenKind::Ident => {
                let name = self.expect_text(TokenKind::Ident, "function name")?;
                Ok(Stmt::Call(name))
            }
            _ => Err(self.unexpected("statement ('say' or a function call)")),
        }
    }

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, CoreError> {
        if self.current.kind != kind {
            return Err(self.unexpected(expected));
        }
        let next = self.lexer.next_token();
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect_text(&mut self, kind: TokenKind, expected: &str) -> Result<String, CoreError> {
        let token = self.expect(kind, expected)?;
        Ok(token.text.unwrap_or_default())
    }

    fn unexpected(&self, expected: &str) -> CoreError {
        CoreError::Syntax {
            line: self.lexer.line_of(self.current.offset),
            expected: expected.to_string(),
            found: self.current.describe(),
        }
    }

    fn nested_function(&self) -> CoreError {
        self.unexpected("statement ('function' is only allowed at the top level, before 'start')")
    }
}
