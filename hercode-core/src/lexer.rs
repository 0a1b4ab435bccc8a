//! Lexer for HerCode source.
//!
//! HerCode blocks are delimited by indentation, so besides the textual
//! tokens the lexer synthesizes `Indent` / `Dedent` tokens from the
//! leading whitespace of each line. The lexer is pull-based: the parser
//! asks for one token at a time through [`Lexer::next_token`].

use log::trace;

/// Width a tab advances the indentation to (next multiple of this value).
pub const TAB_WIDTH: usize = 4;

/// Kind of a token produced by the lexer.
///
/// The lexer never fails: characters it does not understand become
/// `Unknown` tokens and a string without its closing quote becomes
/// `UnterminatedString`. Rejecting them is the parser's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Special
    Eof,
    Unknown,

    // Identifiers and literals
    Ident,
    StringLiteral,
    UnterminatedString,

    // Punctuation
    Colon, // :

    // Keywords
    Say,
    Start,
    End,
    Function,

    // Layout
    Newline,
    Indent,
    Dedent,
}

impl TokenKind {
    /// Human readable name used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Eof => "end of input",
            TokenKind::Unknown => "unrecognized character",
            TokenKind::Ident => "identifier",
            TokenKind::StringLiteral => "string literal",
            TokenKind::UnterminatedString => "unterminated string literal",
            TokenKind::Colon => "':'",
            TokenKind::Say => "'say'",
            TokenKind::Start => "'start'",
            TokenKind::End => "'end'",
            TokenKind::Function => "'function'",
            TokenKind::Newline => "newline",
            TokenKind::Indent => "indentation",
            TokenKind::Dedent => "dedent",
        }
    }
}

/// A single token.
///
/// `text` holds the identifier, keyword, string contents (without the
/// quotes) or the unrecognized character. Layout tokens, `:` and
/// end-of-input carry no text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: Option<String>,
    /// Byte offset of the token in the source.
    pub offset: usize,
}

impl Token {
    fn bare(kind: TokenKind, offset: usize) -> Self {
        Token {
            kind,
            text: None,
            offset,
        }
    }

    fn with_text(kind: TokenKind, text: &str, offset: usize) -> Self {
        Token {
            kind,
            text: Some(text.to_string()),
            offset,
        }
    }

    /// Describe the token for a diagnostic, including its text if any.
    pub fn describe(&self) -> String {
        match (&self.kind, &self.text) {
            (TokenKind::Ident, Some(text)) => format!("identifier '{text}'"),
            (TokenKind::Unknown, Some(text)) => format!("unrecognized character {text:?}"),
            (TokenKind::StringLiteral, Some(text)) => format!("string \"{text}\""),
            (kind, _) => kind.describe().to_string(),
        }
    }
}

/// Lex a whole source string.
///
/// The returned vector ends with the first `Eof` token; every pending
/// `Dedent` has been drained before it.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}

/// 1-based line number of a byte offset.
pub fn line_of(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

pub struct Lexer<'src> {
    source: &'src str,
    index: usize,
    /// Active indentation widths. The bottom entry is always 0 and the
    /// stack is strictly increasing.
    indent_stack: Vec<usize>,
    /// `Dedent` tokens still owed after one line closed several levels.
    pending_dedents: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            source,
            index: 0,
            indent_stack: vec![0],
            pending_dedents: 0,
        }
    }

    /// Number of indentation levels currently open.
    pub fn indent_depth(&self) -> usize {
        self.indent_stack.len() - 1
    }

    pub fn pending_dedents(&self) -> usize {
        self.pending_dedents
    }

    pub fn line_of(&self, offset: usize) -> usize {
        line_of(self.source, offset)
    }

    /// Produce the next token.
    ///
    /// Once the input is exhausted every open indentation level is closed
    /// with one `Dedent` per call, after which `Eof` is returned on every
    /// further call.
    pub fn next_token(&mut self) -> Token {
        let token = self.scan();
        trace!(
            "[lexer] {:?} {:?} at byte {} (depth {}, pending {})",
            token.kind,
            token.text,
            token.offset,
            self.indent_depth(),
            self.pending_dedents
        );
        token
    }

    fn scan(&mut self) -> Token {
        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            return Token::bare(TokenKind::Dedent, self.index);
        }

        while let Some(ch) = self.peek_char() {
            let start = self.index;
            match ch {
                '\n' => return self.lex_newline(start),
                '"' => return self.lex_string(start),
                ':' => {
                    self.consume_char();
                    return Token::bare(TokenKind::Colon, start);
                }
                _ if is_whitespace(ch) => self.consume_char(),
                _ if ch.is_ascii_alphabetic() => return self.lex_ident_or_keyword(start),
                _ => {
                    self.consume_char();
                    return Token::with_text(TokenKind::Unknown, &self.source[start..self.index], start);
                }
            }
        }

        self.end_of_input()
    }

    fn end_of_input(&mut self) -> Token {
        let popped = self.pop_levels_above(0);
        if popped > 0 {
            self.pending_dedents = popped - 1;
            return Token::bare(TokenKind::Dedent, self.index);
        }
        Token::bare(TokenKind::Eof, self.index)
    }

    /// Handle a line break and the indentation of the line that follows.
    fn lex_newline(&mut self, start: usize) -> Token {
        self.consume_char(); // '\n'
        let width = self.measure_indent();

        if self.at_blank_line() {
            return Token::bare(TokenKind::Newline, start);
        }

        let current = self.current_indent();
        if width > current {
            self.indent_stack.push(width);
            Token::bare(TokenKind::Indent, self.index)
        } else if width < current {
            let popped = self.pop_levels_above(width);
            self.pending_dedents = popped - 1;
            Token::bare(TokenKind::Dedent, self.index)
        } else {
            Token::bare(TokenKind::Newline, start)
        }
    }

    fn measure_indent(&mut self) -> usize {
        let mut width = 0;
        while let Some(ch) = self.peek_char() {
            match ch {
                ' ' => width += 1,
                '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                _ => break,
            }
            self.consume_char();
        }
        width
    }

    fn at_blank_line(&self) -> bool {
        match self.peek_char() {
            None | Some('\n') => true,
            Some('\r') => matches!(self.peek_next(), None | Some('\n')),
            Some(_) => false,
        }
    }

    fn current_indent(&self) -> usize {
        self.indent_stack.last().copied().unwrap_or(0)
    }

    fn pop_levels_above(&mut self, width: usize) -> usize {
        let mut popped = 0;
        while self.indent_stack.len() > 1 && self.current_indent() > width {
            self.indent_stack.pop();
            popped += 1;
        }
        popped
    }

    fn lex_string(&mut self, start: usize) -> Token {
        // Consume the opening quote
        self.consume_char();

        let content_start = self.index;
        while let Some(ch) = self.peek_char() {
            match ch {
                '"' => {
                    let content_end = self.index;
                    self.consume_char(); // closing quote
                    return Token::with_text(
                        TokenKind::StringLiteral,
                        &self.source[content_start..content_end],
                        start,
                    );
                }
                '\\' => {
                    // An escaped quote must not end the literal; the text
                    // itself is kept verbatim.
                    self.consume_char();
                    if self.peek_char().is_some() {
                        self.consume_char();
                    }
                }
                _ => self.consume_char(),
            }
        }

        Token::with_text(
            TokenKind::UnterminatedString,
            &self.source[content_start..],
            start,
        )
    }

    fn lex_ident_or_keyword(&mut self, start: usize) -> Token {
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() {
                self.consume_char();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.index];
        let kind = match text {
            "say" => TokenKind::Say,
            "start" => TokenKind::Start,
            "end" => TokenKind::End,
            "function" => TokenKind::Function,
            _ => TokenKind::Ident,
        };
        Token::with_text(kind, text, start)
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.index..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        self.source[self.index..].chars().nth(1)
    }

    fn consume_char(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.index += ch.len_utf8();
        }
    }
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\x0b' | '\x0c')
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind as TK;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|token| token.kind).collect()
    }

    #[test]
    fn lexes_hello_program() {
        assert_eq!(
            kinds("start\n    say \"hi\"\nend"),
            vec![TK::Start, TK::Indent, TK::Say, TK::StringLiteral, TK::Dedent, TK::End, TK::Eof]
        );
    }

    #[test]
    fn recognizes_keywords_case_sensitively() {
        let tokens = tokenize("say Say start end function greet2");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TK::Say, TK::Ident, TK::Start, TK::End, TK::Function, TK::Ident, TK::Eof]
        );
        assert_eq!(tokens[1].text.as_deref(), Some("Say"));
        assert_eq!(tokens[4].text.as_deref(), Some("function"));
        assert_eq!(tokens[5].text.as_deref(), Some("greet2"));
    }

    #[test]
    fn lexes_function_header() {
        assert_eq!(
            kinds("function greet:"),
            vec![TK::Function, TK::Ident, TK::Colon, TK::Eof]
        );
    }

    #[test]
    fn multi_level_dedent_is_drained_one_token_per_call() {
        let mut lexer = Lexer::new("function f:\n    a\n        b\nc");
        let mut seen = Vec::new();
        loop {
            let token = lexer.next_token();
            seen.push(token.kind);
            if token.text.as_deref() == Some("b") {
                break;
            }
        }
        assert_eq!(seen.iter().filter(|k| **k == TK::Indent).count(), 2);

        let first = lexer.next_token();
        assert_eq!(first.kind, TK::Dedent);
        assert_eq!(lexer.indent_depth(), 0);
        assert_eq!(lexer.pending_dedents(), 1);

        let second = lexer.next_token();
        assert_eq!(second.kind, TK::Dedent);
        assert_eq!(lexer.pending_dedents(), 0);

        let after = lexer.next_token();
        assert_eq!(after.kind, TK::Ident);
        assert_eq!(after.text.as_deref(), Some("c"));
        assert_eq!(lexer.next_token().kind, TK::Eof);
    }

    #[test]
    fn drains_open_levels_at_end_of_input() {
        let mut lexer = Lexer::new("start\n    a\n        b");
        let mut kinds = Vec::new();
        for _ in 0..9 {
            kinds.push(lexer.next_token().kind);
        }
        assert_eq!(
            kinds,
            vec![
                TK::Start,
                TK::Indent,
                TK::Ident,
                TK::Indent,
                TK::Ident,
                TK::Dedent,
                TK::Dedent,
                TK::Eof,
                TK::Eof,
            ]
        );
    }

    #[test]
    fn indents_and_dedents_balance() {
        let sources = [
            "start\n    say \"a\"\nend",
            "function f:\n    say \"a\"\n        g\n    h\nend\nstart\n    f\nend\n",
            "start\n  a\n    b\n      c\n  d\n",
            "start\n    a\n        b\n            c",
            "start\n\n    a\n\n\n        b\n    c\nend",
        ];
        for source in sources {
            let kinds = kinds(source);
            let indents = kinds.iter().filter(|k| **k == TK::Indent).count();
            let dedents = kinds.iter().filter(|k| **k == TK::Dedent).count();
            assert_eq!(indents, dedents, "unbalanced layout for {source:?}");
        }
    }

    #[test]
    fn blank_lines_do_not_touch_the_indent_stack() {
        assert_eq!(
            kinds("start\n\n    say \"x\"\n   \n    say \"y\"\nend"),
            vec![
                TK::Start,
                TK::Newline,
                TK::Indent,
                TK::Say,
                TK::StringLiteral,
                TK::Newline,
                TK::Newline,
                TK::Say,
                TK::StringLiteral,
                TK::Dedent,
                TK::End,
                TK::Eof,
            ]
        );
    }

    #[test]
    fn handles_crlf_line_endings() {
        assert_eq!(
            kinds("start\r\n    say \"x\"\r\n\r\nend\r\n"),
            vec![
                TK::Start,
                TK::Indent,
                TK::Say,
                TK::StringLiteral,
                TK::Newline,
                TK::Dedent,
                TK::End,
                TK::Newline,
                TK::Eof,
            ]
        );
    }

    #[test]
    fn tab_advances_to_next_tab_stop() {
        assert_eq!(
            kinds("function f:\n\tsay \"a\"\n    say \"b\"\n  \tsay \"c\"\nend"),
            vec![
                TK::Function,
                TK::Ident,
                TK::Colon,
                TK::Indent,
                TK::Say,
                TK::StringLiteral,
                TK::Newline,
                TK::Say,
                TK::StringLiteral,
                TK::Newline,
                TK::Say,
                TK::StringLiteral,
                TK::Dedent,
                TK::End,
                TK::Eof,
            ]
        );
    }

    #[test]
    fn keeps_string_contents_verbatim() {
        let tokens = tokenize(r#"say "a\"b" "c\\""#);
        assert_eq!(tokens[1].kind, TK::StringLiteral);
        assert_eq!(tokens[1].text.as_deref(), Some(r#"a\"b"#));
        assert_eq!(tokens[2].kind, TK::StringLiteral);
        assert_eq!(tokens[2].text.as_deref(), Some(r"c\\"));
        assert_eq!(tokens[3].kind, TK::Eof);
    }

    #[test]
    fn reports_unterminated_string_as_token() {
        let tokens = tokenize("say \"oops");
        assert_eq!(tokens[1].kind, TK::UnterminatedString);
        assert_eq!(tokens[1].text.as_deref(), Some("oops"));
        assert_eq!(tokens[2].kind, TK::Eof);
    }

    #[test]
    fn surfaces_unknown_characters() {
        let tokens = tokenize("say $ é_");
        let unknown: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TK::Unknown)
            .map(|t| t.text.clone().unwrap_or_default())
            .collect();
        assert_eq!(unknown, vec!["$", "é", "_"]);
    }

    #[test]
    fn eof_is_idempotent() {
        let mut lexer = Lexer::new("");
        assert_eq!(lexer.next_token().kind, TK::Eof);
        assert_eq!(lexer.next_token().kind, TK::Eof);
    }

    #[test]
    fn maps_offsets_to_lines() {
        let source = "start\n    say \"x\"\nend";
        let tokens = tokenize(source);
        let end = tokens.iter().find(|t| t.kind == TK::End).expect("end token");
        assert_eq!(line_of(source, end.offset), 3);
        assert_eq!(line_of(source, 0), 1);
    }
}
