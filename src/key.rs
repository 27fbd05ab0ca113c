//! Row key abstraction: a uniform description of the column(s) that
//! identify a row, whether that's a bare rowid or a composite primary key.

use crate::error::{VectorError, VectorResult};
use std::fmt::Write as _;

pub const MAX_KEY_COLUMNS: usize = 16;

/// The host engine's coarse type classification of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl Affinity {
    pub fn sql_type_name(self) -> &'static str {
        match self {
            Affinity::Integer => "INTEGER",
            Affinity::Text => "TEXT",
            Affinity::Blob => "BLOB",
            Affinity::Real => "REAL",
            Affinity::Numeric => "NUMERIC",
        }
    }
}

/// One column of a key descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumn {
    pub affinity: Affinity,
    pub collation: String,
}

/// An ordered description of the column(s) identifying a row.
///
/// The degenerate rowid case is a single `{Integer, BINARY}` column; a
/// composite primary key carries one entry per PK column, in declared
/// order, each with its own affinity and collation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    columns: Vec<KeyColumn>,
}

impl KeyDescriptor {
    pub fn rowid() -> Self {
        KeyDescriptor {
            columns: vec![KeyColumn {
                affinity: Affinity::Integer,
                collation: "BINARY".to_string(),
            }],
        }
    }

    pub fn from_columns(columns: Vec<KeyColumn>) -> VectorResult<Self> {
        if columns.is_empty() {
            return Err(VectorError::user_input(
                "vector index: table has no usable key columns",
            ));
        }
        if columns.len() > MAX_KEY_COLUMNS {
            return Err(VectorError::user_input(format!(
                "vector index: primary key has more than {MAX_KEY_COLUMNS} columns"
            )));
        }
        Ok(KeyDescriptor { columns })
    }

    pub fn columns(&self) -> &[KeyColumn] {
        &self.columns
    }

    pub fn is_single_integer_key(&self) -> bool {
        self.columns.len() == 1 && self.columns[0].affinity == Affinity::Integer
    }

    /// Emits `PFX TYPE [COLLATE X]` declarations, comma-separated, one per
    /// key column, for the shadow-table DDL the graph engine generates.
    /// `BINARY` collation is elided since it's SQLite's (and this host's)
    /// implicit default.
    pub fn render_typed_columns(&self, prefix: &str) -> String {
        let mut out = String::new();
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let name = column_name(prefix, i);
            let _ = write!(out, "{name} {}", col.affinity.sql_type_name());
            if col.collation != "BINARY" {
                let _ = write!(out, " COLLATE {}", col.collation);
            }
        }
        out
    }

    /// Emits just the column names, comma-separated: `PFX, PFX1, PFX2, ...`.
    pub fn render_column_names(&self, prefix: &str) -> String {
        let mut out = String::new();
        for i in 0..self.columns.len() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&column_name(prefix, i));
        }
        out
    }
}

fn column_name(prefix: &str, index: usize) -> String {
    if index == 0 {
        prefix.to_string()
    } else {
        format!("{prefix}{index}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rowid_key_is_single_integer_binary() {
        let k = KeyDescriptor::rowid();
        assert!(k.is_single_integer_key());
        assert_eq!(k.render_typed_columns("k"), "k INTEGER");
        assert_eq!(k.render_column_names("k"), "k");
    }

    #[test]
    fn composite_key_renders_indexed_names() {
        let k = KeyDescriptor::from_columns(vec![
            KeyColumn {
                affinity: Affinity::Text,
                collation: "NOCASE".to_string(),
            },
            KeyColumn {
                affinity: Affinity::Integer,
                collation: "BINARY".to_string(),
            },
        ])
        .unwrap();
        assert!(!k.is_single_integer_key());
        assert_eq!(k.render_typed_columns("k"), "k TEXT COLLATE NOCASE, k1 INTEGER");
        assert_eq!(k.render_column_names("k"), "k, k1");
    }

    #[test]
    fn rejects_too_many_key_columns() {
        let cols = (0..MAX_KEY_COLUMNS + 1)
            .map(|_| KeyColumn {
                affinity: Affinity::Integer,
                collation: "BINARY".to_string(),
            })
            .collect();
        assert!(KeyDescriptor::from_columns(cols).is_err());
    }

    #[test]
    fn rejects_empty_key() {
        assert!(KeyDescriptor::from_columns(vec![]).is_err());
    }
}
