//! The two external collaborators this crate calls into: the DiskANN graph
//! engine (owns the index's shadow tables and does the actual ANN work)
//! and the host SQL engine (owns the meta shadow table, schema
//! introspection, and the VACUUM/init-replay flags). Both are genuinely
//! opaque from here — this crate ships only mock implementations of each,
//! under `#[cfg(test)]`, to exercise the lifecycle state machine.

use crate::error::VectorResult;
use crate::key::KeyDescriptor;
use crate::params::ParamRecord;
use crate::row::{InRow, OutRows};
use crate::vector::Vector;

/// A single ANN index's graph-engine handle, opened for a burst of
/// mutation or a single search, then closed.
pub trait GraphCursor {
    fn insert(&mut self, row: &InRow) -> VectorResult<()>;
    fn delete(&mut self, row: &InRow) -> VectorResult<()>;
    fn search(&mut self, query: &Vector, k: usize, key: &KeyDescriptor) -> VectorResult<OutRows>;
}

/// The DiskANN graph engine, reached only through this trait. It owns its
/// own shadow tables, named from `name`; this crate never touches them
/// directly.
pub trait GraphEngine {
    fn create(
        &self,
        schema: &str,
        name: &str,
        key: &KeyDescriptor,
        params: &ParamRecord,
    ) -> VectorResult<()>;

    fn drop_index(&self, schema: &str, name: &str) -> VectorResult<()>;

    fn clear(&self, schema: &str, name: &str) -> VectorResult<()>;

    fn open(
        &self,
        schema: &str,
        name: &str,
        params: &ParamRecord,
    ) -> VectorResult<Box<dyn GraphCursor + '_>>;
}

/// Legacy tabular metadata row (`libsql_vector_index`), read-only.
#[derive(Debug, Clone)]
pub struct LegacyParams {
    pub vector_type: u64,
    pub block_size: u64,
    pub dims: u64,
    pub distance_ops: String,
}

/// Outcome of attempting to insert the `(index_name, params_blob)` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    /// The name already exists — a PRIMARY KEY conflict. Not an error: the
    /// caller turns this into [`crate::index::CreateOutcome::SkipRefill`].
    Conflict,
}

/// The host SQL engine's services: the metadata shadow table, schema
/// introspection for key descriptors, and the two replay flags
/// (`init.busy`, VACUUM) that change how the lifecycle behaves.
pub trait HostEngine {
    fn ensure_meta_table(&self, schema: &str) -> VectorResult<()>;

    fn read_params(&self, schema: &str, index_name: &str) -> VectorResult<Option<ParamRecord>>;

    fn read_legacy_params(
        &self,
        schema: &str,
        index_name: &str,
    ) -> VectorResult<Option<LegacyParams>>;

    fn write_params(
        &self,
        schema: &str,
        index_name: &str,
        params: &ParamRecord,
    ) -> VectorResult<WriteOutcome>;

    fn delete_params(&self, schema: &str, index_name: &str) -> VectorResult<()>;

    fn describe_key(&self, schema: &str, table: &str) -> VectorResult<KeyDescriptor>;

    /// `true` while the schema is being replayed from disk at connection
    /// open — the lifecycle must accept an existing index without
    /// re-persisting parameters or refilling it.
    fn is_init_busy(&self) -> bool;

    /// `true` during a VACUUM pass — every mutating lifecycle operation
    /// becomes a no-op so the table-copy doesn't duplicate index work.
    fn is_vacuum(&self) -> bool;
}
