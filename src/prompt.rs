//! Prompt Builder - SQL generation prompt for the IPL statistics database
//!
//! The prompt is a static document (schema listing, conventions and worked
//! question/SQL pairs) with a single `{question}` substitution point. The
//! bundled copy lives in `prompts/ipl_sql.txt`; a different file can be
//! supplied at startup without touching the pipeline.

use crate::error::{ChatError, Result};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Substitution point for the user's question.
pub const QUESTION_PLACEHOLDER: &str = "{question}";

const BUNDLED_TEMPLATE: &str = include_str!("../prompts/ipl_sql.txt");

const EXAMPLES_HEADER: &str = "Examples:";
const EXAMPLES_END: &str = "Now generate";

/// One worked question/SQL pair embedded in the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkedExample {
    pub question: String,
    pub sql: String,
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// The template shipped with the crate.
    pub fn bundled() -> Self {
        Self {
            text: BUNDLED_TEMPLATE.to_string(),
        }
    }

    pub fn from_text(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if !text.contains(QUESTION_PLACEHOLDER) {
            return Err(ChatError::Prompt(format!(
                "template has no {} placeholder",
                QUESTION_PLACEHOLDER
            )));
        }
        Ok(Self { text })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        info!("Loaded prompt template from {:?}", path);
        Self::from_text(text)
    }

    /// Loads `path` when given, otherwise falls back to the bundled template.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::bundled()),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitutes the question verbatim. Delimiters inside the question are
    /// not escaped.
    pub fn build(&self, question: &str) -> String {
        self.text.replace(QUESTION_PLACEHOLDER, question)
    }

    /// Worked examples found between the `Examples:` header and the final
    /// instruction. Each starts at a `Q:` line; its SQL begins at `A:` and
    /// runs until the next `Q:`.
    pub fn worked_examples(&self) -> Vec<WorkedExample> {
        let Some(start) = self.text.find(EXAMPLES_HEADER) else {
            return Vec::new();
        };
        let section = &self.text[start + EXAMPLES_HEADER.len()..];
        let section = match section.find(EXAMPLES_END) {
            Some(end) => &section[..end],
            None => section,
        };

        let mut examples = Vec::new();
        let mut question: Option<String> = None;
        let mut sql = String::new();

        for line in section.lines() {
            let trimmed = line.trim_start();
            if let Some(rest) = trimmed.strip_prefix("Q:") {
                if let Some(q) = question.take() {
                    examples.push(WorkedExample {
                        question: q,
                        sql: sql.trim().to_string(),
                    });
                }
                question = Some(rest.trim().to_string());
                sql.clear();
            } else if question.is_some() {
                let line = trimmed.strip_prefix("A:").unwrap_or(line);
                sql.push_str(line);
                sql.push('\n');
            }
        }
        if let Some(q) = question {
            examples.push(WorkedExample {
                question: q,
                sql: sql.trim().to_string(),
            });
        }

        examples
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::bundled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_template_has_single_placeholder() {
        let template = PromptTemplate::bundled();
        assert_eq!(template.text().matches(QUESTION_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn test_prompt_contains_question_and_every_example() {
        let template = PromptTemplate::bundled();
        let examples = template.worked_examples();
        assert_eq!(examples.len(), 12);

        for question in [
            "Who won the orange cap in 2015?",
            "",
            "'; DROP TABLE players; -- {question}",
        ] {
            let prompt = template.build(question);
            assert!(prompt.contains(question));
            for example in &examples {
                assert!(prompt.contains(&example.question), "missing {}", example.question);
                for line in example.sql.lines() {
                    assert!(prompt.contains(line.trim()), "missing line {}", line);
                }
            }
        }
    }

    #[test]
    fn test_worked_examples_are_parsed() {
        let examples = PromptTemplate::bundled().worked_examples();
        assert_eq!(examples[0].question, "How many runs did Dhoni score in 2018?");
        assert!(examples[0].sql.starts_with("SELECT SUM(b.batter_runs) AS total_runs"));
        assert!(examples[0].sql.ends_with("m.season = 2018;"));

        let last = examples.last().unwrap();
        assert_eq!(last.question, "Matches won by batting first at Wankhede?");
        assert!(last.sql.starts_with("SELECT COUNT(DISTINCT match_id)"));
    }

    #[test]
    fn test_template_without_placeholder_is_rejected() {
        let err = PromptTemplate::from_text("Tables: players").unwrap_err();
        assert!(matches!(err, ChatError::Prompt(_)));
    }

    #[test]
    fn test_custom_template_substitution() {
        let template = PromptTemplate::from_text("Q: {question}\nSQL:").unwrap();
        assert_eq!(template.build("most sixes?"), "Q: most sixes?\nSQL:");
        assert!(template.worked_examples().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "Answer this: {question}").unwrap();

        let template = PromptTemplate::load(Some(path.as_path())).unwrap();
        assert_eq!(template.build("x"), "Answer this: x");
        assert!(PromptTemplate::load(None).unwrap().text().contains("ball_by_ball"));
    }
}
