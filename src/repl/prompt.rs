//! Custom prompt implementation for costerm

use reedline::{Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};

/// Prompt showing the active namespace
pub struct CostermPrompt {
    /// Namespace name
    namespace: String,
}

impl CostermPrompt {
    /// Create a new prompt for the given namespace
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl Prompt for CostermPrompt {
    /// Render the left prompt (main prompt)
    fn render_prompt_left(&self) -> std::borrow::Cow<'_, str> {
        format!("{}> ", self.namespace).into()
    }

    /// Render the right prompt (empty in our case)
    fn render_prompt_right(&self) -> std::borrow::Cow<'_, str> {
        "".into()
    }

    /// Render the prompt indicator (empty since we include it in left prompt)
    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> std::borrow::Cow<'_, str> {
        "".into()
    }

    /// Render the multiline prompt indicator
    fn render_prompt_multiline_indicator(&self) -> std::borrow::Cow<'_, str> {
        "... ".into()
    }

    /// Render the history search prompt
    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> std::borrow::Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };

        format!("({}reverse-search: {}) ", prefix, history_search.term).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_prompt() {
        let prompt = CostermPrompt::new("USER");
        let rendered = prompt.render_prompt_left();
        assert_eq!(rendered, "USER> ");
    }

    #[test]
    fn test_right_prompt_empty() {
        let prompt = CostermPrompt::new("USER");
        let rendered = prompt.render_prompt_right();
        assert_eq!(rendered, "");
    }

    #[test]
    fn test_indicator_empty() {
        let prompt = CostermPrompt::new("USER");
        let rendered = prompt.render_prompt_indicator(PromptEditMode::Default);
        assert_eq!(rendered, "");
    }

    #[test]
    fn test_multiline_indicator() {
        let prompt = CostermPrompt::new("USER");
        let rendered = prompt.render_prompt_multiline_indicator();
        assert_eq!(rendered, "... ");
    }
}
