//! SQLite execution engine over the pre-populated IPL statistics file
//!
//! The file is opened once, read-only, and the handle is shared behind a
//! mutex so questions are executed one at a time.

use crate::error::{ChatError, Result};
use crate::execution::result::{Cell, ResultTable};
use crate::schema::TableDef;
use rusqlite::{Batch, Connection, OpenFlags};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Difference between the advertised schema and the live database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SchemaIssue {
    MissingTable(String),
    MissingColumn { table: String, column: String },
}

impl std::fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaIssue::MissingTable(table) => write!(f, "missing table `{}`", table),
            SchemaIssue::MissingColumn { table, column } => {
                write!(f, "missing column `{}.{}`", table, column)
            }
        }
    }
}

pub struct StatsDb {
    conn: Mutex<Connection>,
}

impl StatsDb {
    /// Opens an existing database file. Writes through this handle are
    /// rejected by the engine.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI;
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| ChatError::Database(format!("Failed to open {:?}: {}", path, e)))?;
        info!("Opened stats database {:?} (read-only)", path);
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Runs one statement and collects every row. Engine failures come back
    /// as `ChatError::Database` carrying the engine's own message. Input
    /// holding more than one statement is refused before anything runs;
    /// trailing whitespace and comments do not count as a statement.
    pub fn query(&self, sql: &str) -> Result<ResultTable> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| ChatError::Database("database handle poisoned".to_string()))?;

        let mut batch = Batch::new(&conn, sql);
        let Some(mut stmt) = batch.next()? else {
            return Err(ChatError::EmptyQuery);
        };
        if batch.next()?.is_some() {
            return Err(ChatError::Database(
                "multiple SQL statements in model output".to_string(),
            ));
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(Cell::from(row.get_ref(idx)?));
            }
            rows.push(cells);
        }

        Ok(ResultTable::new(columns, rows))
    }

    /// Compares the live database against `expected` using `PRAGMA table_info`.
    pub fn check_schema(&self, expected: &[TableDef]) -> Result<Vec<SchemaIssue>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| ChatError::Database("database handle poisoned".to_string()))?;

        let mut issues = Vec::new();
        for table in expected {
            let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
            let present: HashSet<String> = stmt
                .query_map([table.name], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<_, _>>()?;

            if present.is_empty() {
                issues.push(SchemaIssue::MissingTable(table.name.to_string()));
                continue;
            }
            for column in table.columns {
                if !present.contains(*column) {
                    issues.push(SchemaIssue::MissingColumn {
                        table: table.name.to_string(),
                        column: column.to_string(),
                    });
                }
            }
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::IPL_SCHEMA;

    fn fixture() -> StatsDb {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE players (player_id TEXT, player_name TEXT, bat_style TEXT,
                                   bowl_style TEXT, field_pos TEXT, player_full_name TEXT);
             INSERT INTO players VALUES ('p1', 'V Kohli', 'RHB', 'RM', NULL, 'Virat Kohli');
             INSERT INTO players VALUES ('p2', 'RG Sharma', 'RHB', 'OB', NULL, 'Rohit Sharma');
             CREATE TABLE teams (team_id INTEGER, name TEXT);",
        )
        .unwrap();
        StatsDb::from_connection(conn)
    }

    #[test]
    fn test_query_preserves_column_and_row_order() {
        let db = fixture();
        let table = db
            .query("SELECT player_name, field_pos, 2.5 AS factor FROM players ORDER BY player_id")
            .unwrap();
        assert_eq!(table.columns, vec!["player_name", "field_pos", "factor"]);
        assert_eq!(
            table.rows,
            vec![
                vec![Cell::from("V Kohli"), Cell::Null, Cell::Real(2.5)],
                vec![Cell::from("RG Sharma"), Cell::Null, Cell::Real(2.5)],
            ]
        );
    }

    #[test]
    fn test_empty_result_keeps_columns() {
        let db = fixture();
        let table = db.query("SELECT player_name FROM players WHERE 1 = 0").unwrap();
        assert_eq!(table.columns, vec!["player_name"]);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_engine_error_text_is_kept() {
        let db = fixture();
        match db.query("SELECT foo FROM players") {
            Err(ChatError::Database(msg)) => assert!(msg.contains("no such column: foo"), "{}", msg),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_multiple_statements_are_refused() {
        let db = fixture();
        match db.query("SELECT COUNT(*) FROM players; SELECT player_name FROM players") {
            Err(ChatError::Database(msg)) => {
                assert_eq!(msg, "multiple SQL statements in model output")
            }
            other => panic!("unexpected {:?}", other),
        }

        let table = db.query("SELECT COUNT(*) AS n FROM players; -- done\n").unwrap();
        assert_eq!(table.rows, vec![vec![Cell::Integer(2)]]);
    }

    #[test]
    fn test_comment_only_input_is_empty() {
        let db = fixture();
        assert!(matches!(db.query("-- nothing here"), Err(ChatError::EmptyQuery)));
    }

    #[test]
    fn test_check_schema_reports_drift() {
        let db = fixture();
        let issues = db.check_schema(IPL_SCHEMA).unwrap();

        assert!(issues.contains(&SchemaIssue::MissingTable("ball_by_ball".to_string())));
        assert!(issues.contains(&SchemaIssue::MissingTable("team_aliases".to_string())));
        assert!(issues.contains(&SchemaIssue::MissingColumn {
            table: "teams".to_string(),
            column: "team_name".to_string(),
        }));
        assert!(!issues.iter().any(|issue| matches!(
            issue,
            SchemaIssue::MissingColumn { table, .. } if table == "players"
        )));
    }

    #[test]
    fn test_read_only_handle_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE teams (team_id INTEGER, team_name TEXT);")
            .unwrap();

        let db = StatsDb::open_read_only(&path).unwrap();
        let err = db
            .query("INSERT INTO teams VALUES (1, 'Chennai Super Kings')")
            .unwrap_err();
        assert!(err.to_string().contains("readonly"), "{}", err);
    }

    #[test]
    fn test_missing_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StatsDb::open_read_only(dir.path().join("absent.db")).is_err());
    }
}
