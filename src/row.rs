//! Row-shaped data exchanged with the graph engine: what goes in on
//! insert/delete (an indexed vector plus key columns) and what comes back
//! out of a search (one column per key column, `k` rows).

use crate::error::{VectorError, VectorResult};
use crate::vector::Vector;

/// Cap on `rows * cols` for an allocated [`OutRows::Cells`] matrix.
pub const MAX_CELLS: usize = 4_000_000;

/// One key-column value, widened to the smallest set of SQL value kinds the
/// host's affinities require.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Null,
}

impl KeyValue {
    /// Name used in diagnostics, matching `sqlite3_type_repr`.
    pub fn sql_type_name(&self) -> &'static str {
        match self {
            KeyValue::Integer(_) => "INTEGER",
            KeyValue::Real(_) => "FLOAT",
            KeyValue::Text(_) => "TEXT",
            KeyValue::Blob(_) => "BLOB",
            KeyValue::Null => "NULL",
        }
    }
}

/// What the host hands the core on insert/delete: the indexed expression's
/// value (absent when NULL — the row is simply left out of the index) and
/// the row's key columns, in key-descriptor order.
pub struct InRow<'a> {
    pub vector: Option<Vector<'a>>,
    pub key: Vec<KeyValue>,
}

impl<'a> InRow<'a> {
    pub fn new(vector: Option<Vector<'a>>, key: Vec<KeyValue>) -> VectorResult<Self> {
        if key.is_empty() {
            return Err(VectorError::user_input(
                "vector index: row is missing its key column(s)",
            ));
        }
        Ok(InRow { vector, key })
    }

    /// `true` when the vector column was NULL — the adapter's short-circuit
    /// case: the row is excluded from the index entirely, not stored as a
    /// zero vector.
    pub fn is_null(&self) -> bool {
        self.vector.is_none()
    }
}

/// A dense `rows x cols` matrix of owned cell values, used when the key
/// descriptor has more than one column (a composite primary key).
#[derive(Debug, Clone, PartialEq)]
pub struct CellMatrix {
    pub rows: usize,
    pub cols: usize,
    data: Vec<KeyValue>,
}

impl CellMatrix {
    pub fn new(rows: usize, cols: usize) -> VectorResult<Self> {
        let cells = rows
            .checked_mul(cols)
            .ok_or(VectorError::Resource)?;
        if cells > MAX_CELLS {
            return Err(VectorError::Resource);
        }
        Ok(CellMatrix {
            rows,
            cols,
            data: vec![KeyValue::Null; cells],
        })
    }

    pub fn get(&self, row: usize, col: usize) -> &KeyValue {
        &self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: KeyValue) {
        self.data[row * self.cols + col] = value;
    }
}

/// Out-row result set from a `search`. The two representations are
/// mutually exclusive: a single-column integer key (a rowid table) takes
/// the packed-integer fast path; anything else allocates a full cell
/// matrix. The choice is made once, at allocation time, from the key
/// descriptor's first-column affinity.
#[derive(Debug, Clone, PartialEq)]
pub enum OutRows {
    Integers(Vec<i64>),
    Cells(CellMatrix),
}

impl OutRows {
    pub fn len(&self) -> usize {
        match self {
            OutRows::Integers(v) => v.len(),
            OutRows::Cells(m) => m.rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_row_requires_a_key() {
        assert!(InRow::new(None, vec![]).is_err());
    }

    #[test]
    fn in_row_null_vector_is_detected() {
        let row = InRow::new(None, vec![KeyValue::Integer(1)]).unwrap();
        assert!(row.is_null());
    }

    #[test]
    fn cell_matrix_overflow_is_rejected() {
        assert!(CellMatrix::new(MAX_CELLS, 2).is_err());
    }

    #[test]
    fn cell_matrix_indexing_round_trips() {
        let mut m = CellMatrix::new(2, 2).unwrap();
        m.set(1, 0, KeyValue::Integer(7));
        assert_eq!(m.get(1, 0), &KeyValue::Integer(7));
        assert_eq!(m.get(0, 0), &KeyValue::Null);
    }
}
