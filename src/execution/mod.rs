//! Execution against the stats database

pub mod result;
pub mod sqlite_engine;

pub use result::{Cell, ResultTable, TableShape};
pub use sqlite_engine::{SchemaIssue, StatsDb};
