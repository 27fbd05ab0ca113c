//! ```bash
//! cargo run --example demo_host
//! ```
//!
//! Wires a toy in-memory `HostEngine`/`GraphEngine` pair together and drives
//! the index lifecycle end to end: create, insert, search, drop. There is no
//! real DiskANN engine here — `InMemoryGraph` does a brute-force scan, just
//! enough to exercise the state machine this crate actually owns.

use libsql_vector::engine::{GraphCursor, GraphEngine, HostEngine, LegacyParams, WriteOutcome};
use libsql_vector::index::{self, ColumnType};
use libsql_vector::key::KeyDescriptor;
use libsql_vector::params::ParamRecord;
use libsql_vector::row::{InRow, KeyValue, OutRows};
use libsql_vector::vector::{cosine_distance, ElementType, OwnedVector, Vector};
use std::cell::RefCell;
use std::collections::HashMap;

/// Brute-force stand-in for the DiskANN graph engine: one `Vec<(rowid,
/// vector)>` per index name, scanned in full on every search.
#[derive(Default)]
struct InMemoryGraph {
    indexes: RefCell<HashMap<String, Vec<(i64, OwnedVector)>>>,
}

impl GraphEngine for InMemoryGraph {
    fn create(
        &self,
        _schema: &str,
        name: &str,
        _key: &KeyDescriptor,
        _params: &ParamRecord,
    ) -> libsql_vector::VectorResult<()> {
        self.indexes.borrow_mut().entry(name.to_string()).or_default();
        Ok(())
    }

    fn drop_index(&self, _schema: &str, name: &str) -> libsql_vector::VectorResult<()> {
        self.indexes.borrow_mut().remove(name);
        Ok(())
    }

    fn clear(&self, _schema: &str, name: &str) -> libsql_vector::VectorResult<()> {
        if let Some(rows) = self.indexes.borrow_mut().get_mut(name) {
            rows.clear();
        }
        Ok(())
    }

    fn open(
        &self,
        _schema: &str,
        name: &str,
        _params: &ParamRecord,
    ) -> libsql_vector::VectorResult<Box<dyn GraphCursor + '_>> {
        Ok(Box::new(InMemoryCursor {
            graph: self,
            name: name.to_string(),
        }))
    }
}

struct InMemoryCursor<'a> {
    graph: &'a InMemoryGraph,
    name: String,
}

impl<'a> GraphCursor for InMemoryCursor<'a> {
    fn insert(&mut self, row: &InRow) -> libsql_vector::VectorResult<()> {
        let Some(v) = &row.vector else { return Ok(()) };
        let rowid = match row.key[0] {
            KeyValue::Integer(i) => i,
            _ => return Ok(()),
        };
        let owned = match v.clone().into_owned() {
            Vector::Owned(o) => o,
            Vector::Borrowed(_) => unreachable!(),
        };
        self.graph
            .indexes
            .borrow_mut()
            .entry(self.name.clone())
            .or_default()
            .push((rowid, owned));
        Ok(())
    }

    fn delete(&mut self, row: &InRow) -> libsql_vector::VectorResult<()> {
        let rowid = match row.key[0] {
            KeyValue::Integer(i) => i,
            _ => return Ok(()),
        };
        if let Some(rows) = self.graph.indexes.borrow_mut().get_mut(&self.name) {
            rows.retain(|(id, _)| *id != rowid);
        }
        Ok(())
    }

    fn search(
        &mut self,
        query: &Vector,
        k: usize,
        _key: &KeyDescriptor,
    ) -> libsql_vector::VectorResult<OutRows> {
        let indexes = self.graph.indexes.borrow();
        let rows = indexes.get(&self.name).map(|r| r.as_slice()).unwrap_or(&[]);
        let mut scored: Vec<(i64, f64)> = rows
            .iter()
            .map(|(id, v)| {
                let d = cosine_distance(query, &Vector::Owned(v.clone())).unwrap_or(f64::MAX);
                (*id, d)
            })
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        scored.truncate(k);
        Ok(OutRows::Integers(scored.into_iter().map(|(id, _)| id).collect()))
    }
}

/// Single-table host: one `libsql_vector_meta_shadow` row map, a rowid key
/// descriptor for every table, and no VACUUM/replay in progress.
#[derive(Default)]
struct SingleTableHost {
    meta: RefCell<HashMap<String, ParamRecord>>,
}

impl HostEngine for SingleTableHost {
    fn ensure_meta_table(&self, _schema: &str) -> libsql_vector::VectorResult<()> {
        Ok(())
    }

    fn read_params(
        &self,
        _schema: &str,
        index_name: &str,
    ) -> libsql_vector::VectorResult<Option<ParamRecord>> {
        Ok(self.meta.borrow().get(index_name).cloned())
    }

    fn read_legacy_params(
        &self,
        _schema: &str,
        _index_name: &str,
    ) -> libsql_vector::VectorResult<Option<LegacyParams>> {
        Ok(None)
    }

    fn write_params(
        &self,
        _schema: &str,
        index_name: &str,
        params: &ParamRecord,
    ) -> libsql_vector::VectorResult<WriteOutcome> {
        let mut meta = self.meta.borrow_mut();
        if meta.contains_key(index_name) {
            return Ok(WriteOutcome::Conflict);
        }
        meta.insert(index_name.to_string(), params.clone());
        Ok(WriteOutcome::Inserted)
    }

    fn delete_params(&self, _schema: &str, index_name: &str) -> libsql_vector::VectorResult<()> {
        self.meta.borrow_mut().remove(index_name);
        Ok(())
    }

    fn describe_key(&self, _schema: &str, _table: &str) -> libsql_vector::VectorResult<KeyDescriptor> {
        Ok(KeyDescriptor::rowid())
    }

    fn is_init_busy(&self) -> bool {
        false
    }

    fn is_vacuum(&self) -> bool {
        false
    }
}

fn row(id: i64, literal: &str) -> InRow<'static> {
    let v = Vector::Owned(parse(literal));
    InRow::new(Some(v), vec![KeyValue::Integer(id)]).unwrap()
}

fn parse(literal: &str) -> OwnedVector {
    match libsql_vector::vector::parse_text(literal, ElementType::F32).unwrap() {
        Vector::Owned(o) => o,
        Vector::Borrowed(_) => unreachable!(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Phase 1 — CREATE INDEX i ON t(libsql_vector_idx(v, 'metric=l2'))");
    let host = SingleTableHost::default();
    let graph = InMemoryGraph::default();
    let col = ColumnType {
        etype: ElementType::F32,
        dim: 3,
    };
    let outcome = index::create_index(
        &host,
        &graph,
        "main",
        "t",
        "i",
        col,
        &["metric=l2".to_string()],
    )?;
    println!("  create outcome: {outcome:?}");

    println!("Phase 2 — inserting three rows");
    {
        let mut cursor = index::Cursor::open(&host, &graph, "main", "i")?;
        cursor.insert(&row(1, "[1,0,0]"))?;
        cursor.insert(&row(2, "[0,1,0]"))?;
        cursor.insert(&row(3, "[0,0,1]"))?;
    }

    println!("Phase 3 — top-2 search for [1,0,0]");
    let query = Vector::Owned(parse("[1,0,0]"));
    let mut cursor = index::Cursor::open(&host, &graph, "main", "i")?;
    let results = cursor.search(&query, 2, &KeyDescriptor::rowid(), 3)?;
    match results {
        OutRows::Integers(ids) => println!("  matched rowids: {ids:?}"),
        OutRows::Cells(_) => println!("  matched cell rows (composite key)"),
    }

    println!("Phase 4 — DROP INDEX i");
    index::drop_index(&host, &graph, "main", "i")?;
    println!("  meta rows remaining: {}", host.meta.borrow().len());

    Ok(())
}

