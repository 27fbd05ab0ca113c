//! Index lifecycle: recognizing the marker expression in `CREATE INDEX`,
//! parsing column type and parameters, persisting them, and driving
//! create/drop/clear/insert/delete/search against the graph engine.
//!
//! Every mutating entry point checks the VACUUM flag first and is a no-op
//! while it's set, so a VACUUM's table-copy pass doesn't duplicate index
//! work; the graph engine's shadow tables are repopulated by the normal
//! copy instead.

use crate::engine::{GraphEngine, HostEngine, LegacyParams, WriteOutcome};
use crate::error::{VectorError, VectorResult};
use crate::key::KeyDescriptor;
use crate::params::{
    ParamRecord, Tag, INDEX_TYPE_DISKANN, METRIC_COSINE, METRIC_L2, VECTOR_TYPE_F32,
    VECTOR_TYPE_F64,
};
use crate::row::{InRow, OutRows};
use crate::vector::{decode_blob, ElementType, Vector};

/// `n` in `FLOAT32(n)` etc. is capped the same as any other vector dimension.
pub use crate::vector::MAX_DIMS;

/// The four column-type spellings a vector index can be built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnType {
    pub etype: ElementType,
    pub dim: usize,
}

/// Parses a declared column type such as `FLOAT32(3)` or `f64_blob( 128 )`.
/// Case-insensitive, tolerant of whitespace around the digits and the
/// parens, strict about everything else — matches `vectorIdxParseColumnType`.
pub fn parse_column_type(declared: &str) -> VectorResult<ColumnType> {
    const NAMES: &[(&str, ElementType)] = &[
        ("FLOAT32", ElementType::F32),
        ("FLOAT64", ElementType::F64),
        ("F32_BLOB", ElementType::F32),
        ("F64_BLOB", ElementType::F64),
    ];

    let s = declared.trim();
    let upper_start = s.to_ascii_uppercase();
    for (name, etype) in NAMES {
        if !upper_start.starts_with(name) {
            continue;
        }
        let rest = s[name.len()..].trim_start();
        let Some(rest) = rest.strip_prefix('(') else {
            continue;
        };
        let rest = rest.trim_start();
        let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (digits, rest) = rest.split_at(digits_end);
        if digits.is_empty() {
            return Err(VectorError::user_input(format!(
                "non digit symbol in vector column parameter: {declared}"
            )));
        }
        let dim: usize = digits.parse().map_err(|_| {
            VectorError::user_input(format!("max vector dimension exceeded: {declared}"))
        })?;
        if dim > MAX_DIMS {
            return Err(VectorError::user_input(format!(
                "max vector dimension exceeded: {declared}"
            )));
        }
        let rest = rest.trim_start();
        let Some(rest) = rest.strip_prefix(')') else {
            return Err(VectorError::user_input(format!(
                "missed closing brace for vector column type: {declared}"
            )));
        };
        if !rest.trim().is_empty() {
            return Err(VectorError::user_input(format!(
                "extra data after dimension parameter for vector column type: {declared}"
            )));
        }
        if dim == 0 {
            return Err(VectorError::user_input(
                "vector column must have non-zero dimension for index",
            ));
        }
        return Ok(ColumnType { etype: *etype, dim });
    }
    Err(VectorError::user_input(format!(
        "unexpected vector column type: {declared}"
    )))
}

/// One `'key=value'` marker argument, parsed and applied to a parameter
/// record in progress.
fn apply_param(param: &str, params: &mut ParamRecord) -> VectorResult<()> {
    let Some((key, value)) = param.split_once('=') else {
        return Err(VectorError::user_input(
            "unexpected parameter format: expected key=value",
        ));
    };
    let key = key.trim();
    let value = value.trim();
    match key.to_ascii_lowercase().as_str() {
        "type" => match value.to_ascii_lowercase().as_str() {
            "diskann" => params.put(Tag::IndexType, INDEX_TYPE_DISKANN)?,
            other => {
                return Err(VectorError::user_input(format!(
                    "unrecognized value for index parameter 'type': {other}"
                )))
            }
        },
        "metric" => match value.to_ascii_lowercase().as_str() {
            "cosine" => params.put(Tag::Metric, METRIC_COSINE)?,
            "l2" => params.put(Tag::Metric, METRIC_L2)?,
            other => {
                return Err(VectorError::user_input(format!(
                    "unrecognized value for index parameter 'metric': {other}"
                )))
            }
        },
        "alpha" => {
            let v: f64 = value.parse().map_err(|_| {
                VectorError::user_input("invalid representation of float vector index parameter")
            })?;
            params.put_f64(Tag::PruningAlpha, v)?;
        }
        "search_l" => {
            let v: u64 = value.parse().map_err(|_| {
                VectorError::user_input(
                    "invalid representation of integer vector index parameter",
                )
            })?;
            if v == 0 {
                return Err(VectorError::user_input(
                    "invalid representation of integer vector index parameter",
                ));
            }
            params.put(Tag::SearchL, v)?;
        }
        "insert_l" => {
            let v: f64 = value.parse().map_err(|_| {
                VectorError::user_input("invalid representation of float vector index parameter")
            })?;
            params.put_f64(Tag::InsertL, v)?;
        }
        other => {
            return Err(VectorError::user_input(format!(
                "unrecognized vector index parameter: {other}"
            )))
        }
    }
    Ok(())
}

/// Builds the parameter record for a fresh index: seeds `format`, `type`,
/// `etype`, and `dim`, then folds in every `key=value` marker argument.
pub fn build_params(col: ColumnType, extra_args: &[String]) -> VectorResult<ParamRecord> {
    let mut params = ParamRecord::new();
    params.put(Tag::Format, 1)?;
    params.put(
        Tag::IndexType,
        INDEX_TYPE_DISKANN,
    )?;
    params.put(
        Tag::VectorType,
        match col.etype {
            ElementType::F32 => VECTOR_TYPE_F32,
            ElementType::F64 => VECTOR_TYPE_F64,
        },
    )?;
    params.put(Tag::Dim, col.dim as u64)?;
    for arg in extra_args {
        apply_param(arg, &mut params)?;
    }
    Ok(params)
}

/// The shape of the marker expression in the indexed column-expression
/// list, as the host's parser would have already broken it down. This
/// crate never parses SQL itself — it only validates what the host hands
/// it, matching §6's "opaque host parser" boundary.
pub struct MarkerCall<'a> {
    /// Whether any indexed expression is wrapped in `COLLATE`.
    pub has_collation: bool,
    /// Number of expressions in the index's column list.
    pub indexed_expr_count: usize,
    /// Whether a partial-index `WHERE` clause is present.
    pub has_where: bool,
    /// Whether the marker's first argument is a bare column reference; if
    /// so, its declared type string.
    pub column_declared_type: Option<&'a str>,
    /// The marker's remaining `'key=value'` arguments.
    pub extra_args: &'a [String],
    /// `true` when the deprecated `USING` clause accompanies this create.
    pub has_using: bool,
}

/// Rejects a `CREATE INDEX` that claims the marker but violates one of the
/// marker's structural constraints. Returns `Ok(None)` when the statement
/// doesn't use the marker at all (the host should treat it as an ordinary
/// index); `Ok(Some(_))` when it's a valid vector index declaration.
pub fn validate_marker_call<'a>(call: &MarkerCall<'a>, init_busy: bool) -> VectorResult<()> {
    if !init_busy && call.has_using {
        return Err(VectorError::user_input(
            "USING syntax is deprecated, please use plain CREATE INDEX: \
             CREATE INDEX xxx ON yyy ( libsql_vector_idx(zzz) )",
        ));
    }
    if call.has_collation {
        return Err(VectorError::user_input("vector index can't have collation"));
    }
    if call.indexed_expr_count != 1 {
        return Err(VectorError::user_input(
            "vector index must contain exactly one column wrapped into the libsql_vector_idx function",
        ));
    }
    if call.has_where {
        return Err(VectorError::user_input("partial vector index is not supported"));
    }
    if call.column_declared_type.is_none() {
        return Err(VectorError::user_input(
            "libsql_vector_idx first argument must be a column token",
        ));
    }
    Ok(())
}

/// Outcome of a successful `create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The index was created and should be refilled from the table's
    /// existing rows.
    Created,
    /// The parameter row already existed (dump load, VACUUM copy): the
    /// index was (re)registered but must not be refilled.
    SkipRefill,
}

/// Runs the five-step persistence sequence: build params, derive the key
/// descriptor, create the meta table, create the graph engine's shadow
/// tables, insert the parameter row. A `PRIMARY KEY` conflict on the last
/// step collapses to [`CreateOutcome::SkipRefill`] rather than an error.
///
/// A no-op returning `SkipRefill` while `host.is_vacuum()` is set, and a
/// no-op entirely (but still `Created`, since schema replay never refills
/// either) while `host.is_init_busy()` is set.
pub fn create_index(
    host: &dyn HostEngine,
    graph: &dyn GraphEngine,
    schema: &str,
    table: &str,
    index_name: &str,
    col: ColumnType,
    extra_args: &[String],
) -> VectorResult<CreateOutcome> {
    if host.is_vacuum() {
        log::debug!("vector index {index_name}: VACUUM in progress, create is a no-op");
        return Ok(CreateOutcome::SkipRefill);
    }
    if host.is_init_busy() {
        log::debug!("vector index {index_name}: schema replay, accepting without refill");
        return Ok(CreateOutcome::SkipRefill);
    }

    let params = build_params(col, extra_args)?;

    let key = host.describe_key(schema, table)?;
    if key.columns().len() != 1 {
        return Err(VectorError::user_input(
            "vector index for tables without ROWID and composite primary key are not supported",
        ));
    }

    host.ensure_meta_table(schema)?;
    graph.create(schema, index_name, &key, &params)?;

    match host.write_params(schema, index_name, &params)? {
        WriteOutcome::Inserted => {
            log::debug!("vector index {index_name}: created");
            Ok(CreateOutcome::Created)
        }
        WriteOutcome::Conflict => {
            log::warn!(
                "vector index {index_name}: parameter row already present, skipping refill"
            );
            Ok(CreateOutcome::SkipRefill)
        }
    }
}

/// Drops an index: attempts both the graph-engine drop and the parameter
/// row delete regardless of whether the first failed, and returns the
/// first non-OK result — so a partial failure never leaves an orphaned
/// shadow table or a dangling parameter row.
pub fn drop_index(
    host: &dyn HostEngine,
    graph: &dyn GraphEngine,
    schema: &str,
    index_name: &str,
) -> VectorResult<()> {
    if host.is_vacuum() {
        return Ok(());
    }
    let graph_result = graph.drop_index(schema, index_name);
    let meta_result = host.delete_params(schema, index_name);
    graph_result?;
    meta_result
}

/// Clears an index's contents (used by `DELETE FROM table` fast paths and
/// similar bulk operations); forwards to the graph engine only.
pub fn clear_index(
    host: &dyn HostEngine,
    graph: &dyn GraphEngine,
    schema: &str,
    index_name: &str,
) -> VectorResult<()> {
    if host.is_vacuum() {
        return Ok(());
    }
    graph.clear(schema, index_name)
}

/// Recovers an index's parameter record, trying the current binary format
/// first and falling back to the legacy tabular columns.
pub fn read_params(
    host: &dyn HostEngine,
    schema: &str,
    index_name: &str,
) -> VectorResult<ParamRecord> {
    if let Some(params) = host.read_params(schema, index_name)? {
        return Ok(params);
    }
    if let Some(legacy) = host.read_legacy_params(schema, index_name)? {
        log::warn!("vector index {index_name}: reading legacy tabular metadata");
        return legacy_to_params(&legacy);
    }
    Err(VectorError::not_found(index_name))
}

fn legacy_to_params(legacy: &LegacyParams) -> VectorResult<ParamRecord> {
    let mut params = ParamRecord::new();
    params.put(Tag::Format, 1)?;
    params.put(Tag::IndexType, INDEX_TYPE_DISKANN)?;
    params.put(Tag::VectorType, legacy.vector_type)?;
    params.put(Tag::Dim, legacy.dims)?;
    params.put(Tag::BlockSize, legacy.block_size)?;
    let metric = match legacy.distance_ops.to_ascii_lowercase().as_str() {
        "cosine" => METRIC_COSINE,
        "l2" => METRIC_L2,
        other => {
            return Err(VectorError::user_input(format!(
                "vector index: unrecognized legacy distance_ops {other}"
            )))
        }
    };
    params.put(Tag::Metric, metric)?;
    Ok(params)
}

/// A per-operation handle into the graph engine, opened once and used for
/// a burst of insert/delete calls or a single search, then dropped.
pub struct Cursor<'a> {
    host: &'a dyn HostEngine,
    inner: Box<dyn crate::engine::GraphCursor + 'a>,
}

impl<'a> Cursor<'a> {
    /// Opens a cursor for `index_name`, loading its parameters first (the
    /// current format, falling back to legacy).
    pub fn open(
        host: &'a dyn HostEngine,
        graph: &'a dyn GraphEngine,
        schema: &str,
        index_name: &str,
    ) -> VectorResult<Self> {
        let params = read_params(host, schema, index_name)?;
        log::debug!("vector index {index_name}: cursor open");
        let inner = graph.open(schema, index_name, &params)?;
        Ok(Cursor { host, inner })
    }

    /// A no-op when the row's vector field is NULL, or while a VACUUM is in
    /// progress (the table-copy pass repopulates the index, so mutating it
    /// here would duplicate work).
    pub fn insert(&mut self, row: &InRow) -> VectorResult<()> {
        if self.host.is_vacuum() {
            log::debug!("vector index cursor insert: VACUUM in progress, no-op");
            return Ok(());
        }
        if row.is_null() {
            return Ok(());
        }
        self.inner.insert(row)
    }

    /// A no-op while a VACUUM is in progress, for the same reason as
    /// [`Cursor::insert`].
    pub fn delete(&mut self, row: &InRow) -> VectorResult<()> {
        if self.host.is_vacuum() {
            log::debug!("vector index cursor delete: VACUUM in progress, no-op");
            return Ok(());
        }
        self.inner.delete(row)
    }

    /// Runs a top-`k` search. The query vector must already have been
    /// coerced to F32 by the caller; its dimension is validated against the
    /// index's stored `dim` parameter.
    pub fn search(
        &mut self,
        query: &Vector,
        k: usize,
        key: &KeyDescriptor,
        expected_dim: usize,
    ) -> VectorResult<OutRows> {
        if query.element_type() != ElementType::F32 {
            return Err(VectorError::user_input(
                "vector index search: query vector must be F32",
            ));
        }
        if query.dim() != expected_dim {
            return Err(VectorError::Shape {
                expected: crate::error::ShapeDesc {
                    type_name: "F32",
                    dim: expected_dim,
                },
                actual: query.shape(),
            });
        }
        self.inner.search(query, k, key)
    }
}

impl<'a> Drop for Cursor<'a> {
    fn drop(&mut self) {
        log::debug!("vector index cursor closed");
    }
}

/// Parses a query vector blob into an `F32` vector for `search`, per §4.D's
/// "blob -> direct init" path.
pub fn decode_query_vector(bytes: &[u8]) -> VectorResult<Vector<'_>> {
    decode_blob(bytes, ElementType::F32)
}
