//! Result Presenter - turns a query outcome into a short text answer
//!
//! The table shape decides the layout:
//! - no rows: a fixed "no results" notice
//! - one row, one column: `Label: value`
//! - one column: a labelled bullet list, one bullet per row
//! - anything else: one bullet per row listing every `column: value`

use crate::execution::{Cell, ResultTable, TableShape};
use itertools::Itertools;
use serde::Serialize;

pub const NO_RESULTS: &str = "No results found for your question.";
pub const MULTI_COLUMN_HEADER: &str = "Here are the results:";

/// How the surface should present the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub tone: Tone,
    pub text: String,
}

impl Rendered {
    fn success(text: String) -> Self {
        Self {
            tone: Tone::Success,
            text,
        }
    }

    fn warning(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Warning,
            text: text.into(),
        }
    }

    fn error(text: String) -> Self {
        Self {
            tone: Tone::Error,
            text,
        }
    }
}

/// Underscores to spaces.
pub fn column_label(name: &str) -> String {
    name.replace('_', " ")
}

/// Underscores to spaces, first character upper-cased, the rest lower-cased.
pub fn capitalized_label(name: &str) -> String {
    let label = column_label(name);
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn render_table(table: &ResultTable) -> Rendered {
    match table.shape() {
        TableShape::Empty => Rendered::warning(NO_RESULTS),
        TableShape::Scalar => Rendered::success(format!(
            "{}: {}",
            capitalized_label(&table.columns[0]),
            table.rows[0][0]
        )),
        TableShape::SingleColumn => {
            let bullets = table
                .rows
                .iter()
                .map(|row| format!("- {}", row[0]))
                .join("\n");
            Rendered::success(format!("{}:\n\n{}", capitalized_label(&table.columns[0]), bullets))
        }
        TableShape::MultiColumn => {
            let bullets = table
                .rows
                .iter()
                .map(|row| format!("- {}", summarize_row(&table.columns, row)))
                .join("\n");
            Rendered::success(format!("{}\n\n{}", MULTI_COLUMN_HEADER, bullets))
        }
    }
}

fn summarize_row(columns: &[String], row: &[Cell]) -> String {
    columns
        .iter()
        .zip(row)
        .map(|(column, value)| format!("{}: {}", column_label(column), value))
        .join(", ")
}

/// Engine failure. `hint` is appended on its own line when present.
pub fn render_execution_error(error: &str, hint: Option<&str>) -> Rendered {
    let mut text = format!("Error: {}", error);
    if let Some(hint) = hint {
        text.push_str("\nHint: ");
        text.push_str(hint);
    }
    Rendered::error(text)
}

/// Model-service failure; the question never reached the database.
pub fn render_translation_error(error: &str) -> Rendered {
    Rendered::error(format!("Error: could not translate question: {}", error))
}
