//! Session backends for the interactive loop
//!
//! A [`Session`] consumes accepted lines and produces output. The parse
//! outcome for the line is handed over alongside the raw text, so a backend
//! can act on the collected semantic fragments instead of re-parsing.

use tracing::debug;

use crate::grammar::{CollectedFragment, ParseOutcome};

/// What the interactive loop should do with an executed line
#[derive(Debug, Clone, PartialEq)]
pub enum SessionReply {
    /// Print this text (empty means print nothing) and keep reading
    Output(String),
    /// Terminate the session
    Exit,
}

/// Backend that executes accepted input lines
pub trait Session {
    /// Namespace shown in the prompt
    fn namespace(&self) -> &str;

    /// Execute one line
    fn execute(&mut self, line: &str, outcome: &ParseOutcome) -> SessionReply;
}

/// Offline backend: handles session-control commands locally and echoes
/// everything else
///
/// Stands in for a wire-protocol backend. Exit and namespace-switch commands
/// behave for real; any other line is echoed back unevaluated.
#[derive(Debug)]
pub struct LocalEchoSession {
    namespace: String,
}

impl LocalEchoSession {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// First identifier on the line, lowercased
    fn leading_command(line: &str) -> Option<String> {
        let word: String = line
            .trim_start()
            .chars()
            .take_while(|c| c.is_alphanumeric())
            .collect();
        if word.is_empty() {
            None
        } else {
            Some(word.to_lowercase())
        }
    }

    /// Pull the namespace argument out of the collected fragments
    fn collected_namespace(outcome: &ParseOutcome) -> Option<String> {
        outcome.collector.iter().find_map(|fragment| match fragment {
            CollectedFragment::Typed { semantic, value } if semantic == "namespace" => {
                Some(unquote(value))
            }
            _ => None,
        })
    }
}

impl Session for LocalEchoSession {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn execute(&mut self, line: &str, outcome: &ParseOutcome) -> SessionReply {
        match Self::leading_command(line).as_deref() {
            Some("q" | "quit" | "h" | "halt") => SessionReply::Exit,
            Some("zn" | "znspace") => {
                if let Some(namespace) = Self::collected_namespace(outcome) {
                    debug!(from = %self.namespace, to = %namespace, "namespace switch");
                    self.namespace = namespace;
                    SessionReply::Output(format!("Namespace: {}", self.namespace))
                } else {
                    SessionReply::Output("Usage: znspace \"NAME\"".to_string())
                }
            }
            _ => SessionReply::Output(line.trim().to_string()),
        }
    }
}

/// Strip surrounding double quotes and collapse doubled-quote escapes
fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .map(|v| v.replace("\"\"", "\""))
        .unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::lang;

    fn run(session: &mut LocalEchoSession, line: &str) -> SessionReply {
        let grammar = lang::grammar().unwrap();
        let outcome = grammar
            .parse(line, line.chars().count(), false, lang::START_RULE)
            .unwrap();
        session.execute(line, &outcome)
    }

    #[test]
    fn test_quit_exits() {
        let mut session = LocalEchoSession::new("USER");
        assert_eq!(run(&mut session, "quit"), SessionReply::Exit);
        assert_eq!(run(&mut session, "h"), SessionReply::Exit);
    }

    #[test]
    fn test_namespace_switch() {
        let mut session = LocalEchoSession::new("USER");
        let reply = run(&mut session, "zn \"SAMPLES\"");
        assert_eq!(reply, SessionReply::Output("Namespace: SAMPLES".to_string()));
        assert_eq!(session.namespace(), "SAMPLES");
    }

    #[test]
    fn test_namespace_switch_without_argument() {
        let mut session = LocalEchoSession::new("USER");
        let reply = run(&mut session, "zn");
        assert_eq!(session.namespace(), "USER");
        assert!(matches!(reply, SessionReply::Output(msg) if msg.starts_with("Usage")));
    }

    #[test]
    fn test_other_lines_echo() {
        let mut session = LocalEchoSession::new("USER");
        let reply = run(&mut session, "write 12");
        assert_eq!(reply, SessionReply::Output("write 12".to_string()));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"USER\""), "USER");
        assert_eq!(unquote("\"a\"\"b\""), "a\"b");
        assert_eq!(unquote("bare"), "bare");
    }
}
