//! Query Result - tabular output of one statement against the stats database

use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One value as returned by the engine. No rounding or localization is
/// applied; whatever the SQL computed is what gets shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for Cell {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Cell::Null,
            ValueRef::Integer(i) => Cell::Integer(i),
            ValueRef::Real(f) => Cell::Real(f),
            ValueRef::Text(bytes) => Cell::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Cell::Blob(bytes.to_vec()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "NULL"),
            Cell::Integer(i) => write!(f, "{}", i),
            // `{:?}` keeps the fractional part of whole reals (973.0).
            Cell::Real(r) => write!(f, "{:?}", r),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// Shape of a result table, checked in this order: empty, single cell,
/// single column, anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableShape {
    Empty,
    Scalar,
    SingleColumn,
    MultiColumn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn shape(&self) -> TableShape {
        match (self.row_count(), self.column_count()) {
            (0, _) => TableShape::Empty,
            (1, 1) => TableShape::Scalar,
            (_, 1) => TableShape::SingleColumn,
            _ => TableShape::MultiColumn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: Vec<Vec<Cell>>) -> ResultTable {
        ResultTable::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    #[test]
    fn test_shape_precedence() {
        assert_eq!(table(&["a"], vec![]).shape(), TableShape::Empty);
        assert_eq!(table(&["a", "b", "c"], vec![]).shape(), TableShape::Empty);
        assert_eq!(table(&["a"], vec![vec![Cell::Integer(1)]]).shape(), TableShape::Scalar);
        assert_eq!(
            table(&["a"], vec![vec![Cell::Integer(1)], vec![Cell::Integer(2)]]).shape(),
            TableShape::SingleColumn
        );
        assert_eq!(
            table(&["a", "b"], vec![vec![Cell::Integer(1), Cell::Integer(2)]]).shape(),
            TableShape::MultiColumn
        );
        assert_eq!(
            table(&["a", "b"], vec![vec![Cell::Integer(1), Cell::Integer(2)], vec![Cell::Integer(3), Cell::Integer(4)]]).shape(),
            TableShape::MultiColumn
        );
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Null.to_string(), "NULL");
        assert_eq!(Cell::Integer(973).to_string(), "973");
        assert_eq!(Cell::Real(143.27).to_string(), "143.27");
        assert_eq!(Cell::Real(973.0).to_string(), "973.0");
        assert_eq!(Cell::from("V Kohli").to_string(), "V Kohli");
        assert_eq!(Cell::Blob(vec![0, 1, 2]).to_string(), "<3 bytes>");
    }

    #[test]
    fn test_cells_serialize_as_plain_json() {
        let row = vec![Cell::from("MS Dhoni"), Cell::Integer(455), Cell::Null];
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"["MS Dhoni",455,null]"#);
    }
}
