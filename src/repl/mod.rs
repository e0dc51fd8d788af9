//! Interactive terminal loop
//!
//! Wires the compiled grammar into reedline: the highlighter re-parses the
//! line on every keystroke, Tab opens a completion menu fed by the same parse,
//! and accepted lines go to a [`Session`] backend.

use std::sync::Arc;

use reedline::{
    ColumnarMenu, Emacs, FileBackedHistory, KeyCode, KeyModifiers, MenuBuilder, Reedline,
    ReedlineEvent, ReedlineMenu, Signal, default_emacs_keybindings,
};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{CostermError, Result};
use crate::grammar::Grammar;

pub mod completer;
pub mod highlighter;
pub mod prompt;
pub mod provider;
pub mod session;

pub use completer::GrammarCompleter;
pub use highlighter::GrammarHighlighter;
pub use prompt::CostermPrompt;
pub use provider::{SemanticProvider, StaticProvider};
pub use session::{LocalEchoSession, Session, SessionReply};

const COMPLETION_MENU: &str = "completion_menu";

/// The interactive read-parse-execute loop
pub struct Repl {
    editor: Reedline,
    session: Box<dyn Session>,
}

impl Repl {
    /// Build the editor from configuration
    pub fn new(
        config: &Config,
        grammar: Arc<Grammar>,
        start_rule: &str,
        provider: Arc<dyn SemanticProvider>,
        session: Box<dyn Session>,
    ) -> Result<Self> {
        let mut editor = Reedline::create();

        if config.display.syntax_highlighting {
            editor = editor.with_highlighter(Box::new(GrammarHighlighter::new(
                grammar.clone(),
                start_rule,
                config.display.color_output,
            )));
        }

        if config.display.autocomplete {
            let completer = GrammarCompleter::new(grammar, start_rule, provider);
            let menu = ColumnarMenu::default().with_name(COMPLETION_MENU);

            let mut keybindings = default_emacs_keybindings();
            keybindings.add_binding(
                KeyModifiers::NONE,
                KeyCode::Tab,
                ReedlineEvent::UntilFound(vec![
                    ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
                    ReedlineEvent::MenuNext,
                ]),
            );

            editor = editor
                .with_completer(Box::new(completer))
                .with_menu(ReedlineMenu::EngineCompleter(Box::new(menu)))
                .with_edit_mode(Box::new(Emacs::new(keybindings)));
        }

        if config.history.persist {
            let history = FileBackedHistory::with_file(
                config.history.max_size,
                config.history.file_path.clone(),
            )
            .map_err(|e| CostermError::Generic(format!("Failed to open history file: {e}")))?;
            editor = editor.with_history(Box::new(history));
        }

        Ok(Self { editor, session })
    }

    /// Run the loop until the session exits
    pub fn run(&mut self, grammar: &Grammar, start_rule: &str) -> Result<()> {
        info!("interactive session started");

        loop {
            let prompt = CostermPrompt::new(self.session.namespace());
            match self.editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let outcome = grammar.parse(&line, line.chars().count(), false, start_rule)?;
                    match self.session.execute(&line, &outcome) {
                        SessionReply::Output(output) => {
                            if !output.is_empty() {
                                println!("{output}");
                            }
                        }
                        SessionReply::Exit => break,
                    }
                }
                Signal::CtrlC => {
                    debug!("line interrupted");
                    continue;
                }
                Signal::CtrlD => break,
            }
        }

        info!("interactive session ended");
        Ok(())
    }
}
