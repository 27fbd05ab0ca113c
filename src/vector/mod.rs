//! In-memory vector values: element type, owned/borrowed storage, and the
//! small algebra (add, scale, cosine/L2 distance) used by both the SQL
//! function surface and the index row adapter.
//!
//! The source this crate is derived from dispatches on element type with an
//! `if (type == F32) ... else if (type == F64) ...` chain in every routine.
//! Here the element type is a two-variant sum (`OwnedVector`, `BlobView`)
//! and each operation matches once at entry — adding a third element type
//! would be a compiler-enforced exhaustiveness error, not a silent gap.

mod algebra;
mod blob;
mod text;

pub use algebra::{add, add_owned, cosine_distance, l2_distance, scale, scale_owned};
pub use blob::{decode_blob, encode_blob, sniff_blob_shape};
pub use text::{parse_text, parse_text_into, render_text, sniff_text_dim};

use crate::error::{ShapeDesc, VectorError, VectorResult};

/// 1 ≤ dim ≤ MAX_DIMS for every vector this crate will allocate or parse.
pub const MAX_DIMS: usize = 16_384;

/// A float literal inside the text format longer than this is rejected
/// before the parser even attempts `str::parse`.
pub const MAX_FLOAT_LITERAL_CHARS: usize = 1024;

/// Element type of a vector's components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    F32,
    F64,
}

impl ElementType {
    /// Trailing blob tag byte. `1` = F32, `2` = F64 — part of the wire
    /// contract, never renumber.
    pub fn tag(self) -> u8 {
        match self {
            ElementType::F32 => 1,
            ElementType::F64 => 2,
        }
    }

    pub fn from_tag(tag: u8) -> VectorResult<Self> {
        match tag {
            1 => Ok(ElementType::F32),
            2 => Ok(ElementType::F64),
            other => Err(VectorError::user_input(format!(
                "vector: unrecognized element type tag {other}"
            ))),
        }
    }

    pub fn elem_size(self) -> usize {
        match self {
            ElementType::F32 => std::mem::size_of::<f32>(),
            ElementType::F64 => std::mem::size_of::<f64>(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementType::F32 => "F32",
            ElementType::F64 => "F64",
        }
    }
}

/// Fully materialized, heap-owned vector storage.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedVector {
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl OwnedVector {
    pub fn zeros(etype: ElementType, dim: usize) -> Self {
        match etype {
            ElementType::F32 => OwnedVector::F32(vec![0.0; dim]),
            ElementType::F64 => OwnedVector::F64(vec![0.0; dim]),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            OwnedVector::F32(_) => ElementType::F32,
            OwnedVector::F64(_) => ElementType::F64,
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            OwnedVector::F32(v) => v.len(),
            OwnedVector::F64(v) => v.len(),
        }
    }
}

/// A read-only view over a blob's bytes, decoded lazily element-by-element.
///
/// Blob pointers handed in by the host are not guaranteed aligned to the
/// element size, so this borrows raw bytes and decodes each element with
/// `from_le_bytes` rather than reinterpreting the byte slice as `&[f32]`.
#[derive(Debug, Clone, Copy)]
pub struct BlobView<'a> {
    etype: ElementType,
    bytes: &'a [u8],
}

impl<'a> BlobView<'a> {
    pub fn element_type(&self) -> ElementType {
        self.etype
    }

    pub fn dim(&self) -> usize {
        self.bytes.len() / self.etype.elem_size()
    }

    pub fn f32_at(&self, i: usize) -> f32 {
        debug_assert_eq!(self.etype, ElementType::F32);
        let o = i * 4;
        f32::from_le_bytes(self.bytes[o..o + 4].try_into().unwrap())
    }

    pub fn f64_at(&self, i: usize) -> f64 {
        debug_assert_eq!(self.etype, ElementType::F64);
        let o = i * 8;
        f64::from_le_bytes(self.bytes[o..o + 8].try_into().unwrap())
    }

    fn to_owned(self) -> OwnedVector {
        match self.etype {
            ElementType::F32 => {
                OwnedVector::F32((0..self.dim()).map(|i| self.f32_at(i)).collect())
            }
            ElementType::F64 => {
                OwnedVector::F64((0..self.dim()).map(|i| self.f64_at(i)).collect())
            }
        }
    }
}

/// A vector value: either heap-owned storage, or a read-only view into a
/// blob the caller still owns. Borrowed vectors must not outlive the blob
/// they point into — enforced by the `'a` lifetime, not a runtime flag.
#[derive(Debug, Clone)]
pub enum Vector<'a> {
    Owned(OwnedVector),
    Borrowed(BlobView<'a>),
}

impl<'a> Vector<'a> {
    pub fn element_type(&self) -> ElementType {
        match self {
            Vector::Owned(v) => v.element_type(),
            Vector::Borrowed(v) => v.element_type(),
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            Vector::Owned(v) => v.dim(),
            Vector::Borrowed(v) => v.dim(),
        }
    }

    pub fn shape(&self) -> ShapeDesc {
        ShapeDesc {
            type_name: self.element_type().name(),
            dim: self.dim(),
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Vector::Owned(_))
    }

    /// Materialize into an owned, `'static` vector, copying if borrowed.
    pub fn into_owned(self) -> Vector<'static> {
        match self {
            Vector::Owned(v) => Vector::Owned(v),
            Vector::Borrowed(v) => Vector::Owned(v.to_owned()),
        }
    }

    /// Mutable access to the owned storage. Returns `Internal` if this
    /// vector is borrowed — mutation always requires ownership, so only
    /// `Owned` is ever passed to a mutating routine.
    pub fn as_owned_mut(&mut self) -> VectorResult<&mut OwnedVector> {
        match self {
            Vector::Owned(v) => Ok(v),
            Vector::Borrowed(_) => Err(VectorError::internal(
                "attempted to mutate a vector borrowed from a blob",
            )),
        }
    }

    pub fn f32_at(&self, i: usize) -> f32 {
        match self {
            Vector::Owned(OwnedVector::F32(v)) => v[i],
            Vector::Borrowed(v) => v.f32_at(i),
            Vector::Owned(OwnedVector::F64(_)) => {
                unreachable!("f32_at called on an F64 vector")
            }
        }
    }

    pub fn f64_at(&self, i: usize) -> f64 {
        match self {
            Vector::Owned(OwnedVector::F64(v)) => v[i],
            Vector::Borrowed(v) => v.f64_at(i),
            Vector::Owned(OwnedVector::F32(_)) => {
                unreachable!("f64_at called on an F32 vector")
            }
        }
    }
}

pub(crate) fn check_dim(dim: usize) -> VectorResult<()> {
    if dim == 0 {
        return Ok(());
    }
    if dim > MAX_DIMS {
        return Err(VectorError::user_input(format!(
            "vector: max size exceeded {MAX_DIMS}"
        )));
    }
    Ok(())
}

pub(crate) fn require_same_shape(a: &Vector, b: &Vector) -> VectorResult<()> {
    if a.element_type() != b.element_type() || a.dim() != b.dim() {
        return Err(VectorError::Shape {
            expected: a.shape(),
            actual: b.shape(),
        });
    }
    Ok(())
}

pub(crate) fn borrow_blob(etype: ElementType, bytes: &[u8]) -> BlobView<'_> {
    BlobView { etype, bytes }
}
