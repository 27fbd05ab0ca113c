//! Fixed-dimension vector columns and DiskANN index lifecycle for an
//! embedded relational engine.
//!
//! Two tightly coupled halves live here:
//!
//! - [`vector`] and [`functions`]: the in-memory vector value (text/binary
//!   codec, algebra, distance) and the SQL function surface built on it.
//! - [`index`]: the state machine that recognizes the `libsql_vector_idx`
//!   marker at `CREATE INDEX` time, persists index parameters via
//!   [`params`], describes row identity via [`key`], and drives
//!   insert/delete/search against a DiskANN-style graph engine reached
//!   only through the [`engine`] traits.
//!
//! Nothing in this crate owns a connection, a schema, or the graph engine
//! itself — those are the host's, reached through [`engine::HostEngine`]
//! and [`engine::GraphEngine`].

pub mod engine;
pub mod error;
pub mod functions;
pub mod index;
pub mod key;
pub mod params;
pub mod row;
pub mod vector;

pub use error::{VectorError, VectorResult};
