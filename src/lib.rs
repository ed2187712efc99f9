//! Natural-language questions over the IPL statistics database.
//!
//! A question is turned into SQL by a hosted language model, run read-only
//! against the local SQLite file, and rendered as a short text answer.

pub mod config;
pub mod error;
pub mod execution;
pub mod llm;
pub mod observability;
pub mod pipeline;
pub mod presenter;
pub mod prompt;
pub mod schema;
pub mod translator;

pub use config::{Config, Provider};
pub use error::{ChatError, Result};
pub use execution::{Cell, ResultTable, StatsDb, TableShape};
pub use llm::{LlmClient, TextGenerator};
pub use pipeline::{Answer, Chatbot, Outcome};
pub use presenter::{Rendered, Tone};
pub use prompt::PromptTemplate;
pub use translator::{extract_sql, QueryTranslator};
