//! Index parameter record: a flat, tagged byte buffer persisted as the
//! `metadata` blob in `libsql_vector_meta_shadow`.
//!
//! On-disk layout is fixed: a sequence of 9-byte `(tag: u8, value: u64 LE)`
//! tuples, total size ≤ [`MAX_PARAM_BYTES`]. Tags may repeat — a reader
//! always returns the *last* occurrence, so an update is simply an append.
//! Floating-point values are stored bit-cast to `u64` so the container
//! itself stays untyped; the typed getters/setters below are the only
//! place that knows which tags are floats.

use crate::error::{VectorError, VectorResult};

pub const MAX_PARAM_BYTES: usize = 128;
const ENTRY_LEN: usize = 9;

/// Known parameter tags. The numeric values are the wire tag bytes — never
/// renumber an existing one; unknown tags still round-trip via
/// [`ParamRecord::iter_raw`] for forward compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Format,
    IndexType,
    VectorType,
    Dim,
    Metric,
    PruningAlpha,
    SearchL,
    InsertL,
    BlockSize,
}

impl Tag {
    pub fn id(self) -> u8 {
        match self {
            Tag::Format => 1,
            Tag::IndexType => 2,
            Tag::VectorType => 3,
            Tag::Dim => 4,
            Tag::Metric => 5,
            Tag::PruningAlpha => 6,
            Tag::SearchL => 7,
            Tag::InsertL => 8,
            Tag::BlockSize => 9,
        }
    }

    fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            1 => Tag::Format,
            2 => Tag::IndexType,
            3 => Tag::VectorType,
            4 => Tag::Dim,
            5 => Tag::Metric,
            6 => Tag::PruningAlpha,
            7 => Tag::SearchL,
            8 => Tag::InsertL,
            9 => Tag::BlockSize,
            _ => return None,
        })
    }
}

/// `diskann` is the only recognized index kind.
pub const INDEX_TYPE_DISKANN: u64 = 1;

/// `metric` values.
pub const METRIC_COSINE: u64 = 1;
pub const METRIC_L2: u64 = 2;

/// `etype` values, matching [`crate::vector::ElementType::tag`].
pub const VECTOR_TYPE_F32: u64 = 1;
pub const VECTOR_TYPE_F64: u64 = 2;

/// A flat key→value record, serialized exactly as read: raw bytes in
/// declaration (append) order, no framing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamRecord {
    bytes: Vec<u8>,
}

impl ParamRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> VectorResult<Self> {
        if bytes.len() % ENTRY_LEN != 0 {
            return Err(VectorError::user_input(
                "vector index: parameter record length is not a multiple of the entry size",
            ));
        }
        if bytes.len() > MAX_PARAM_BYTES {
            return Err(VectorError::user_input(
                "vector index: parameter record exceeds the 128-byte budget",
            ));
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn raw_get(&self, id: u8) -> Option<u64> {
        let mut found = None;
        let mut i = 0;
        while i < self.bytes.len() {
            let entry = &self.bytes[i..i + ENTRY_LEN];
            if entry[0] == id {
                let v = u64::from_le_bytes(entry[1..9].try_into().unwrap());
                found = Some(v);
            }
            i += ENTRY_LEN;
        }
        found
    }

    fn raw_put(&mut self, id: u8, value: u64) -> VectorResult<()> {
        if self.bytes.len() + ENTRY_LEN > MAX_PARAM_BYTES {
            return Err(VectorError::user_input(
                "vector index: parameter record would exceed the 128-byte budget",
            ));
        }
        self.bytes.push(id);
        self.bytes.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// `get(tag) -> value | 0`: reads return the last matching tuple, or
    /// `0` if the tag was never written.
    pub fn get(&self, tag: Tag) -> u64 {
        self.raw_get(tag.id()).unwrap_or(0)
    }

    pub fn get_f64(&self, tag: Tag) -> f64 {
        f64::from_bits(self.get(tag))
    }

    /// `put(tag, value) -> ok | overflow`: appends, never rewrites in
    /// place — last-write-wins is a property of read order, not storage.
    pub fn put(&mut self, tag: Tag, value: u64) -> VectorResult<()> {
        self.raw_put(tag.id(), value)
    }

    pub fn put_f64(&mut self, tag: Tag, value: f64) -> VectorResult<()> {
        self.raw_put(tag.id(), value.to_bits())
    }

    /// Unknown tags this record carries, in declaration order — the escape
    /// hatch that lets a record written by a newer version round-trip
    /// through an older one without losing data.
    pub fn iter_unknown(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.bytes
            .chunks_exact(ENTRY_LEN)
            .filter(|e| Tag::from_id(e[0]).is_none())
            .map(|e| (e[0], u64::from_le_bytes(e[1..9].try_into().unwrap())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let mut p = ParamRecord::new();
        p.put(Tag::SearchL, 10).unwrap();
        p.put(Tag::SearchL, 20).unwrap();
        p.put(Tag::SearchL, 30).unwrap();
        assert_eq!(p.get(Tag::SearchL), 30);
    }

    #[test]
    fn unwritten_tag_reads_as_zero() {
        let p = ParamRecord::new();
        assert_eq!(p.get(Tag::Dim), 0);
    }

    #[test]
    fn put_overflow_is_rejected() {
        let mut p = ParamRecord::new();
        for _ in 0..(MAX_PARAM_BYTES / ENTRY_LEN) {
            p.put(Tag::SearchL, 1).unwrap();
        }
        assert!(p.put(Tag::SearchL, 1).is_err());
    }

    #[test]
    fn float_tags_round_trip_by_bit_cast() {
        let mut p = ParamRecord::new();
        p.put_f64(Tag::PruningAlpha, 1.2).unwrap();
        assert_eq!(p.get_f64(Tag::PruningAlpha), 1.2);
    }

    #[test]
    fn serialization_is_raw_declaration_order_bytes() {
        let mut p = ParamRecord::new();
        p.put(Tag::Format, 1).unwrap();
        p.put(Tag::Dim, 3).unwrap();
        let bytes = p.as_bytes().to_vec();
        let reloaded = ParamRecord::from_bytes(bytes).unwrap();
        assert_eq!(reloaded.get(Tag::Format), 1);
        assert_eq!(reloaded.get(Tag::Dim), 3);
    }

    #[test]
    fn unknown_tags_round_trip() {
        let mut bytes = Vec::new();
        bytes.push(200u8);
        bytes.extend_from_slice(&42u64.to_le_bytes());
        let p = ParamRecord::from_bytes(bytes).unwrap();
        let unknown: Vec<_> = p.iter_unknown().collect();
        assert_eq!(unknown, vec![(200u8, 42u64)]);
    }
}
