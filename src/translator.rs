//! Query Translator - question to SQL through the hosted model

use crate::error::Result;
use crate::llm::TextGenerator;
use crate::prompt::PromptTemplate;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::info;

lazy_static! {
    /// Opening fence with a `sql` language tag, body up to the next fence or
    /// the end of the text when the fence is never closed.
    static ref SQL_FENCE: Regex = Regex::new(r"(?is)```[ \t]*sql\b[ \t]*\r?\n?(.*?)(?:```|\z)").expect("valid regex");
}

/// Pulls the SQL statement out of a free-form model response.
///
/// The first ```` ```sql ```` block wins. Without one, the whole trimmed
/// response is taken as the statement. Nothing is validated here.
pub fn extract_sql(response: &str) -> String {
    match SQL_FENCE.captures(response).and_then(|caps| caps.get(1)) {
        Some(body) => body.as_str().trim().to_string(),
        None => response.trim().to_string(),
    }
}

pub struct QueryTranslator {
    generator: Arc<dyn TextGenerator>,
    template: PromptTemplate,
}

impl QueryTranslator {
    pub fn new(generator: Arc<dyn TextGenerator>, template: PromptTemplate) -> Self {
        Self {
            generator,
            template,
        }
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// One model call, no retry. Transport and service errors are returned
    /// to the caller untouched.
    pub async fn translate(&self, question: &str) -> Result<String> {
        info!("QUESTION: {}", question);

        let prompt = self.template.build(question);
        let response = self.generator.generate(&prompt).await?;
        let sql = extract_sql(&response);

        info!("SQL QUERY: {}", sql);

        Ok(sql)
    }
}
