//! Fixed lexical pass for the command language
//!
//! Segments an input line into the lexeme alphabet the automaton consumes.
//! This pass is grammar-independent and error-tolerant:
//!
//! - **Never panics** - always returns a valid lexeme tape
//! - **Never rejects input** - anything unrecognized becomes a single-char lexeme
//! - **Lossless** - concatenating lexeme values reproduces the input exactly,
//!   which is what lets the highlighter span the whole line
//!
//! The alphabet, in priority order: whitespace run, identifier
//! (`letter letter|digit*`), quoted string (doubled-quote escape), numeric
//! constant (`digit+ ('.' digit+)? | '.' digit+`), single character.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Lexeme categories produced by the fixed pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LexemeKind {
    /// Run of whitespace characters
    Whitespace,
    /// Identifier: letter followed by letters or digits
    Identifier,
    /// Double-quoted string, `""` as the embedded-quote escape
    Str,
    /// Numeric constant, integer or decimal
    Constant,
    /// Any single character not covered above
    Char,
}

/// One tokenized unit of input
///
/// `class` is mutable state: the transition row that claims this lexeme during
/// a parse stamps its highlight class onto it (last writer wins). The lexeme
/// sequence with classes is the sole contract with the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    /// Raw text as typed, quotes and all
    pub value: String,
    /// Highlight class assigned during the parse, if any
    pub class: Option<String>,
    /// Character span in the original input (positions count `char`s, not bytes)
    pub span: Range<usize>,
}

impl Lexeme {
    fn new(kind: LexemeKind, value: String, span: Range<usize>) -> Self {
        Self {
            kind,
            value,
            class: None,
            span,
        }
    }
}

/// Error-tolerant tokenizer over a single input line
pub struct Lexer {
    input: Vec<char>,
    pos: usize,
}

impl Lexer {
    /// Create a new lexer from input string
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    /// Tokenize the entire input into the lexeme tape
    pub fn tokenize(input: &str) -> Vec<Lexeme> {
        let mut lexer = Self::new(input);
        let mut lexemes = Vec::new();

        while !lexer.is_at_end() {
            lexemes.push(lexer.next_lexeme());
        }

        lexemes
    }

    /// Scan the next lexeme
    fn next_lexeme(&mut self) -> Lexeme {
        let start = self.pos;
        let ch = self.current_char();

        if ch.is_whitespace() {
            return self.scan_whitespace(start);
        }
        if ch.is_alphabetic() {
            return self.scan_identifier(start);
        }
        if ch == '"' {
            return self.scan_string(start);
        }
        if ch.is_ascii_digit() {
            return self.scan_constant(start);
        }
        if ch == '.' && self.peek_char().is_ascii_digit() {
            return self.scan_constant(start);
        }

        self.advance();
        Lexeme::new(LexemeKind::Char, ch.to_string(), start..self.pos)
    }

    /// Scan a run of whitespace
    fn scan_whitespace(&mut self, start: usize) -> Lexeme {
        let mut value = String::new();

        while !self.is_at_end() && self.current_char().is_whitespace() {
            value.push(self.current_char());
            self.advance();
        }

        Lexeme::new(LexemeKind::Whitespace, value, start..self.pos)
    }

    /// Scan an identifier: letter followed by letters or digits
    fn scan_identifier(&mut self, start: usize) -> Lexeme {
        let mut value = String::new();

        while !self.is_at_end() && self.current_char().is_alphanumeric() {
            value.push(self.current_char());
            self.advance();
        }

        Lexeme::new(LexemeKind::Identifier, value, start..self.pos)
    }

    /// Scan a double-quoted string
    ///
    /// The escape convention is quote doubling: `"a""b"` is one string lexeme.
    /// An unterminated string runs to the end of input; the value keeps the raw
    /// text so highlighting stays lossless while the user is still typing.
    fn scan_string(&mut self, start: usize) -> Lexeme {
        let mut value = String::new();
        value.push(self.current_char());
        self.advance();

        while !self.is_at_end() {
            let ch = self.current_char();
            value.push(ch);
            self.advance();

            if ch == '"' {
                if self.current_char() == '"' && !self.is_at_end() {
                    // doubled quote, stay inside the string
                    value.push('"');
                    self.advance();
                } else {
                    break;
                }
            }
        }

        Lexeme::new(LexemeKind::Str, value, start..self.pos)
    }

    /// Scan a numeric constant: `digit+ ('.' digit+)?` or `'.' digit+`
    fn scan_constant(&mut self, start: usize) -> Lexeme {
        let mut value = String::new();

        while !self.is_at_end() && self.current_char().is_ascii_digit() {
            value.push(self.current_char());
            self.advance();
        }

        if self.current_char() == '.' && self.peek_char().is_ascii_digit() {
            value.push('.');
            self.advance();
            while !self.is_at_end() && self.current_char().is_ascii_digit() {
                value.push(self.current_char());
                self.advance();
            }
        }

        Lexeme::new(LexemeKind::Constant, value, start..self.pos)
    }

    /// Get current character
    fn current_char(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.input[self.pos]
        }
    }

    /// Peek at next character
    fn peek_char(&self) -> char {
        if self.pos + 1 >= self.input.len() {
            '\0'
        } else {
            self.input[self.pos + 1]
        }
    }

    /// Advance position
    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total_len(lexemes: &[Lexeme]) -> usize {
        lexemes.iter().map(|l| l.value.chars().count()).sum()
    }

    #[test]
    fn test_tokenize_command() {
        let lexemes = Lexer::tokenize("write 12");
        assert_eq!(lexemes.len(), 3);
        assert_eq!(lexemes[0].kind, LexemeKind::Identifier);
        assert_eq!(lexemes[0].value, "write");
        assert_eq!(lexemes[1].kind, LexemeKind::Whitespace);
        assert_eq!(lexemes[2].kind, LexemeKind::Constant);
        assert_eq!(lexemes[2].value, "12");
    }

    #[test]
    fn test_tokenize_empty_input() {
        assert!(Lexer::tokenize("").is_empty());
    }

    #[test]
    fn test_tokenize_whitespace_run_is_one_lexeme() {
        let lexemes = Lexer::tokenize("a   \t b");
        assert_eq!(lexemes.len(), 3);
        assert_eq!(lexemes[1].value, "   \t ");
    }

    #[test]
    fn test_tokenize_string_with_doubled_quote() {
        let lexemes = Lexer::tokenize(r#"w "he said ""hi""" "#);
        assert_eq!(lexemes[2].kind, LexemeKind::Str);
        assert_eq!(lexemes[2].value, r#""he said ""hi""""#);
    }

    #[test]
    fn test_tokenize_unterminated_string() {
        let lexemes = Lexer::tokenize(r#"w "abc"#);
        assert_eq!(lexemes[2].kind, LexemeKind::Str);
        assert_eq!(lexemes[2].value, r#""abc"#);
    }

    #[test]
    fn test_tokenize_decimal_constant() {
        let lexemes = Lexer::tokenize("3.14");
        assert_eq!(lexemes.len(), 1);
        assert_eq!(lexemes[0].kind, LexemeKind::Constant);
        assert_eq!(lexemes[0].value, "3.14");
    }

    #[test]
    fn test_tokenize_leading_dot_constant() {
        let lexemes = Lexer::tokenize(".5");
        assert_eq!(lexemes.len(), 1);
        assert_eq!(lexemes[0].kind, LexemeKind::Constant);
        assert_eq!(lexemes[0].value, ".5");
    }

    #[test]
    fn test_tokenize_bare_dot_is_char() {
        let lexemes = Lexer::tokenize("a.b");
        assert_eq!(lexemes.len(), 3);
        assert_eq!(lexemes[1].kind, LexemeKind::Char);
        assert_eq!(lexemes[1].value, ".");
    }

    #[test]
    fn test_identifier_does_not_start_with_digit() {
        let lexemes = Lexer::tokenize("2x");
        assert_eq!(lexemes[0].kind, LexemeKind::Constant);
        assert_eq!(lexemes[0].value, "2");
        assert_eq!(lexemes[1].kind, LexemeKind::Identifier);
        assert_eq!(lexemes[1].value, "x");
    }

    #[test]
    fn test_roundtrip_length() {
        // total lexeme length must always equal input length
        for input in [
            "write 12",
            "  s x=##class(User.Person).%New() ",
            r#"w "a""b",$piece(x,",",1)"#,
            "@#$%^&*",
            "",
        ] {
            let lexemes = Lexer::tokenize(input);
            assert_eq!(total_len(&lexemes), input.chars().count(), "{input:?}");
        }
    }

    #[test]
    fn test_spans_are_contiguous() {
        let lexemes = Lexer::tokenize("set x = 1");
        let mut expected = 0;
        for lexeme in &lexemes {
            assert_eq!(lexeme.span.start, expected);
            expected = lexeme.span.end;
        }
        assert_eq!(expected, 9);
    }
}
