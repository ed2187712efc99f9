//! Question-to-answer pipeline
//!
//! Prompt Builder -> Query Translator -> Result Presenter, once per question,
//! with no state carried between questions. Every question yields an
//! `Answer`; neither a model failure nor an engine failure escapes.

use crate::error::ChatError;
use crate::execution::{ResultTable, StatsDb};
use crate::presenter::{self, Rendered};
use crate::schema;
use crate::translator::QueryTranslator;
use serde::Serialize;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Table(ResultTable),
    ExecutionError(String),
    TranslationError(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub id: Uuid,
    pub question: String,
    /// Absent when translation failed.
    pub sql: Option<String>,
    pub outcome: Outcome,
    pub rendered: Rendered,
}

pub struct Chatbot {
    translator: QueryTranslator,
    db: StatsDb,
}

impl Chatbot {
    pub fn new(translator: QueryTranslator, db: StatsDb) -> Self {
        Self { translator, db }
    }

    pub fn translator(&self) -> &QueryTranslator {
        &self.translator
    }

    pub fn db(&self) -> &StatsDb {
        &self.db
    }

    pub async fn answer(&self, question: &str) -> Answer {
        let id = Uuid::new_v4();
        let span = info_span!("question", %id);
        self.answer_inner(id, question).instrument(span).await
    }

    async fn answer_inner(&self, id: Uuid, question: &str) -> Answer {
        let sql = match self.translator.translate(question).await {
            Ok(sql) => sql,
            Err(e) => {
                let message = e.to_string();
                error!("LLM ERROR: {}", message);
                return Answer {
                    id,
                    question: question.to_string(),
                    sql: None,
                    rendered: presenter::render_translation_error(&message),
                    outcome: Outcome::TranslationError(message),
                };
            }
        };

        let outcome = self.execute(&sql);
        let rendered = match &outcome {
            Outcome::Table(table) => presenter::render_table(table),
            Outcome::ExecutionError(message) => {
                let hint = schema::hint_for_engine_error(message);
                presenter::render_execution_error(message, hint.as_deref())
            }
            Outcome::TranslationError(message) => presenter::render_translation_error(message),
        };

        Answer {
            id,
            question: question.to_string(),
            sql: Some(sql),
            outcome,
            rendered,
        }
    }

    /// Runs `sql` read-only. Failures are logged and folded into the outcome.
    pub fn execute(&self, sql: &str) -> Outcome {
        let result = if sql.trim().is_empty() {
            Err(ChatError::EmptyQuery)
        } else {
            self.db.query(sql)
        };

        match result {
            Ok(table) => {
                info!("SQL RESULT: {} rows", table.row_count());
                Outcome::Table(table)
            }
            Err(e) => {
                let message = match e {
                    ChatError::Database(message) => message,
                    other => other.to_string(),
                };
                error!("SQL ERROR: {}", message);
                Outcome::ExecutionError(message)
            }
        }
    }
}
