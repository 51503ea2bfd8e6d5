//! Main lexer implementation for Locks.
//!
//! One pass over the source, character by character. Comments are `//` to
//! end of line or `/* ... */`; block comments do not nest — the first
//! `*/` closes them. String bodies are copied verbatim — no escape
//! sequence processing happens here, by design; a lone unterminated
//! string is reported at the position of its opening quote, not at EOF.
//! Strings may be delimited by either `'` or `"`, but the closing quote
//! must match whichever one opened the string.

use crate::cursor::Cursor;
use crate::{Token, TokenKind};
use lockc_util::{FileId, Handler, LocksError, Span};

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    file: FileId,
    handler: &'a mut Handler,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file: FileId, handler: &'a mut Handler) -> Self {
        Self { cursor: Cursor::new(source), file, handler }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            let (start_line, start_col, start_pos) = (self.cursor.line(), self.cursor.column(), self.cursor.position());
            if self.cursor.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, self.span(start_pos, start_pos, start_line, start_col)));
                break;
            }
            let c = self.cursor.advance();
            let kind = self.scan_token(c, start_line, start_col);
            if let Some(kind) = kind {
                tokens.push(Token::new(kind, self.span(start_pos, self.cursor.position(), start_line, start_col)));
            }
        }
        tokens
    }

    fn span(&self, start: usize, end: usize, line: u32, col: u32) -> Span {
        Span { file: self.file, start: start as u32, end: end as u32, line, column: col }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.cursor.current_char() {
                ' ' | '\t' | '\r' | '\n' => {
                    self.cursor.advance();
                }
                '/' if self.cursor.peek_char(1) == '/' => {
                    while self.cursor.current_char() != '\n' && !self.cursor.is_at_end() {
                        self.cursor.advance();
                    }
                }
                '/' if self.cursor.peek_char(1) == '*' => {
                    self.cursor.advance();
                    self.cursor.advance();
                    loop {
                        if self.cursor.is_at_end() {
                            break;
                        }
                        if self.cursor.current_char() == '*' && self.cursor.peek_char(1) == '/' {
                            self.cursor.advance();
                            self.cursor.advance();
                            break;
                        }
                        self.cursor.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_token(&mut self, c: char, line: u32, col: u32) -> Option<TokenKind> {
        use TokenKind::*;
        Some(match c {
            '(' => LeftParen,
            ')' => RightParen,
            '{' => LeftBrace,
            '}' => RightBrace,
            '[' => LeftBracket,
            ']' => RightBracket,
            ',' => Comma,
            ';' => Semicolon,
            '+' => Plus,
            '-' => Minus,
            '*' => Star,
            '/' => Slash,
            '%' => Percent,
            '!' => {
                if self.cursor.match_char('=') {
                    BangEqual
                } else {
                    Bang
                }
            }
            '=' => {
                if self.cursor.match_char('=') {
                    EqualEqual
                } else {
                    Equal
                }
            }
            '<' => {
                if self.cursor.match_char('=') {
                    LessEqual
                } else {
                    Less
                }
            }
            '>' => {
                if self.cursor.match_char('=') {
                    GreaterEqual
                } else {
                    Greater
                }
            }
            '\'' | '"' => return self.scan_string(c, line, col),
            c if c.is_ascii_digit() => return Some(self.scan_number(c)),
            c if c.is_alphabetic() || c == '_' => return Some(self.scan_identifier(c)),
            other => {
                self.handler.report(LocksError::illegal_char(
                    format!("Illegal character '{other}'"),
                    line,
                    col,
                ));
                return None;
            }
        })
    }

    fn scan_string(&mut self, quote: char, start_line: u32, start_col: u32) -> Option<TokenKind> {
        let mut body = String::new();
        while self.cursor.current_char() != quote {
            if self.cursor.is_at_end() {
                self.handler.report(LocksError::syntax("Unmatched Quote", start_line, start_col));
                return None;
            }
            body.push(self.cursor.advance());
        }
        self.cursor.advance();
        Some(TokenKind::Str(body))
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        let mut text = String::new();
        text.push(first);
        while self.cursor.current_char().is_ascii_digit() {
            text.push(self.cursor.advance());
        }
        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            text.push(self.cursor.advance());
            while self.cursor.current_char().is_ascii_digit() {
                text.push(self.cursor.advance());
            }
            TokenKind::Double(text)
        } else {
            TokenKind::Integer(text)
        }
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut text = String::new();
        text.push(first);
        while self.cursor.current_char().is_alphanumeric() || self.cursor.current_char() == '_' {
            text.push(self.cursor.advance());
        }
        TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockc_util::SourceMap;

    fn lex(src: &str) -> (Vec<Token>, Handler) {
        let mut map = SourceMap::new();
        let file = map.add_file("t.lk", src);
        let mut handler = Handler::new();
        let tokens = Lexer::new(src, file, &mut handler).tokenize();
        (tokens, handler)
    }

    #[test]
    fn scans_keywords_and_identifiers() {
        let (tokens, handler) = lex("var x = foo;");
        assert!(!handler.had_error());
        assert_eq!(tokens[0].kind, TokenKind::Var);
        assert_eq!(tokens[1].kind, TokenKind::Identifier("x".into()));
        assert_eq!(tokens[2].kind, TokenKind::Equal);
        assert_eq!(tokens[3].kind, TokenKind::Identifier("foo".into()));
        assert_eq!(tokens[4].kind, TokenKind::Semicolon);
        assert_eq!(tokens[5].kind, TokenKind::Eof);
    }

    #[test]
    fn scans_integer_and_double_literals() {
        let (tokens, _) = lex("1 2.50");
        assert_eq!(tokens[0].kind, TokenKind::Integer("1".into()));
        assert_eq!(tokens[1].kind, TokenKind::Double("2.50".into()));
    }

    #[test]
    fn line_comments_run_to_end_of_line() {
        let (tokens, _) = lex("1 // this is a comment\n2");
        assert_eq!(tokens[0].kind, TokenKind::Integer("1".into()));
        assert_eq!(tokens[1].kind, TokenKind::Integer("2".into()));
    }

    #[test]
    fn block_comments_do_not_nest() {
        // the first `*/` closes the outermost `/*`, so everything from
        // the stray trailing `*/` onward is ordinary source again.
        let (tokens, _) = lex("1 /* outer /* inner */ 2 */ 3");
        assert_eq!(tokens[0].kind, TokenKind::Integer("1".into()));
        assert_eq!(tokens[1].kind, TokenKind::Integer("2".into()));
        assert_eq!(tokens[2].kind, TokenKind::Star);
        assert_eq!(tokens[3].kind, TokenKind::Slash);
        assert_eq!(tokens[4].kind, TokenKind::Integer("3".into()));
    }

    #[test]
    fn block_comment_spanning_multiple_lines_is_skipped_whole() {
        let (tokens, handler) = lex("1 /* line one\nline two */ 2");
        assert!(!handler.had_error());
        assert_eq!(tokens[0].kind, TokenKind::Integer("1".into()));
        assert_eq!(tokens[1].kind, TokenKind::Integer("2".into()));
    }

    #[test]
    fn unterminated_string_reports_at_opening_quote() {
        let (_, handler) = lex("\"abc");
        assert!(handler.had_error());
        match &handler.diagnostics()[0].error {
            LocksError::Syntax { line, column, .. } => assert_eq!((*line, *column), (1, 1)),
            other => panic!("expected SyntaxErr, got {other:?}"),
        }
    }

    #[test]
    fn single_and_double_quoted_strings_both_scan() {
        let (tokens, handler) = lex("'hi' \"there\"");
        assert!(!handler.had_error());
        assert_eq!(tokens[0].kind, TokenKind::Str("hi".into()));
        assert_eq!(tokens[1].kind, TokenKind::Str("there".into()));
    }

    #[test]
    fn closing_quote_must_match_the_opening_one() {
        let (_, handler) = lex("'abc\"");
        assert!(handler.had_error());
        match &handler.diagnostics()[0].error {
            LocksError::Syntax { .. } => {}
            other => panic!("expected SyntaxErr, got {other:?}"),
        }
    }

    #[test]
    fn illegal_characters_do_not_stop_the_scan() {
        let (tokens, handler) = lex("1 @ 2 $ 3");
        assert!(handler.had_error());
        assert_eq!(handler.diagnostics().len(), 2);
        let ints: Vec<_> = tokens
            .iter()
            .filter_map(|t| match &t.kind {
                TokenKind::Integer(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(ints, vec!["1", "2", "3"]);
    }

    proptest::proptest! {
        #[test]
        fn never_panics_and_always_ends_in_eof(src in "[ -~\\n]{0,64}") {
            let (tokens, _handler) = lex(&src);
            assert_eq!(tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
        }
    }
}
