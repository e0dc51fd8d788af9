//! Grammar-driven syntax highlighter
//!
//! Runs a full parse of the line on every keystroke and renders the lexeme
//! tape with one style per highlight class. The lexer is lossless, so the
//! rendered text always equals the typed line; malformed input simply shows
//! up with error styling instead of breaking the display.

use std::sync::Arc;

use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

use crate::grammar::Grammar;

/// Highlighter that styles each lexeme by its parse-assigned class
pub struct GrammarHighlighter {
    grammar: Arc<Grammar>,
    start_rule: String,
    enabled: bool,
}

impl GrammarHighlighter {
    /// Create a new highlighter parsing from `start_rule`
    pub fn new(grammar: Arc<Grammar>, start_rule: impl Into<String>, enabled: bool) -> Self {
        Self {
            grammar,
            start_rule: start_rule.into(),
            enabled,
        }
    }

    fn style_for(class: Option<&str>) -> Style {
        match class {
            Some("keyword") => Color::Blue.bold(),
            Some("string") => Color::Yellow.into(),
            Some("number") => Color::Cyan.into(),
            Some("operator") => Color::DarkGray.into(),
            Some("global") => Color::Green.into(),
            Some("function") => Color::Magenta.into(),
            Some("class") => Color::Cyan.bold(),
            Some("method") => Color::Green.into(),
            Some("error") => Color::Red.into(),
            _ => Style::default(),
        }
    }

    fn plain(line: &str) -> StyledText {
        let mut styled = StyledText::new();
        styled.push((Style::default(), line.to_string()));
        styled
    }
}

impl Highlighter for GrammarHighlighter {
    fn highlight(&self, line: &str, cursor: usize) -> StyledText {
        if !self.enabled || line.is_empty() {
            return Self::plain(line);
        }

        let cursor = line[..cursor.min(line.len())].chars().count();
        let Ok(outcome) = self.grammar.parse(line, cursor, false, &self.start_rule) else {
            return Self::plain(line);
        };

        let mut styled = StyledText::new();
        for lexeme in &outcome.lexemes {
            styled.push((Self::style_for(lexeme.class.as_deref()), lexeme.value.clone()));
        }
        styled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::lang;

    fn create_test_highlighter(enabled: bool) -> GrammarHighlighter {
        let grammar = Arc::new(lang::grammar().unwrap());
        GrammarHighlighter::new(grammar, lang::START_RULE, enabled)
    }

    /// Concatenated text content, ignoring the styles
    fn rendered_text(styled: &StyledText) -> String {
        styled.buffer.iter().map(|(_, text)| text.as_str()).collect()
    }

    #[test]
    fn test_rendering_is_lossless() {
        let highlighter = create_test_highlighter(true);
        let line = "set name=\"John\" write name";
        let result = highlighter.highlight(line, 0);
        assert_eq!(rendered_text(&result), line);
    }

    #[test]
    fn test_malformed_input_still_renders() {
        let highlighter = create_test_highlighter(true);
        let line = "write @@ ???";
        let result = highlighter.highlight(line, 0);
        assert_eq!(rendered_text(&result), line);
    }

    #[test]
    fn test_disabled_highlighting() {
        let highlighter = create_test_highlighter(false);
        let result = highlighter.highlight("write 12", 0);
        assert_eq!(rendered_text(&result), "write 12");
        assert!(result.buffer.iter().all(|(style, _)| *style == Style::default()));
    }

    #[test]
    fn test_keyword_gets_bold_blue() {
        let highlighter = create_test_highlighter(true);
        let result = highlighter.highlight("write 12", 0);
        let keyword = result
            .buffer
            .iter()
            .find(|(_, text)| text == "write")
            .expect("keyword lexeme rendered");
        assert_eq!(keyword.0, Color::Blue.bold());
    }

    #[test]
    fn test_style_palette() {
        assert_eq!(
            GrammarHighlighter::style_for(Some("keyword")),
            Color::Blue.bold()
        );
        assert_eq!(
            GrammarHighlighter::style_for(Some("error")),
            Color::Red.into()
        );
        assert_eq!(GrammarHighlighter::style_for(None), Style::default());
    }
}
