//! Binary wire format.
//!
//! Little-endian element array, optionally followed by one trailing
//! type-tag byte. Every element size (4 bytes for F32, 8 for F64) is even,
//! so a bare payload's length is always even; a writer flips that parity by
//! appending exactly one tag byte when the type is anything but F32. A
//! reader therefore only has to look at the parity of the total blob length:
//! odd means "last byte is the tag", even means "legacy F32, no tag". This
//! convention must stay bit-for-bit stable — it is the backward-compat hinge
//! the whole on-disk format depends on.

use super::{borrow_blob, check_dim, BlobView, ElementType, OwnedVector, Vector};
use crate::error::{VectorError, VectorResult};

/// Phase 1: recover `(element_type, dim)` from a blob's length and trailing
/// byte alone, without touching the element payload. Detection rule: an odd
/// total length means the last byte is the type tag; even (including zero)
/// means legacy F32. `hint` is accepted for symmetry with the TEXT detection
/// path but a BLOB is always self-describing, even when empty.
pub fn sniff_blob_shape(bytes: &[u8], _hint: ElementType) -> VectorResult<(ElementType, usize)> {
    let (etype, payload_len) = if bytes.len() % 2 == 1 {
        let tag = bytes[bytes.len() - 1];
        (ElementType::from_tag(tag)?, bytes.len() - 1)
    } else {
        (ElementType::F32, bytes.len())
    };

    let elem_size = etype.elem_size();
    if payload_len % elem_size != 0 {
        return Err(VectorError::user_input(format!(
            "vector: blob payload length {payload_len} is not a multiple of element size {elem_size}"
        )));
    }
    let dim = payload_len / elem_size;
    check_dim(dim)?;
    Ok((etype, dim))
}

/// Decode a blob into a borrowed view over `bytes`.
///
/// `hint` is accepted for parity with the TEXT decode path but is never
/// consulted: a BLOB's length alone (including the zero-length case, which
/// defaults to F32) fully determines its shape.
pub fn decode_blob(bytes: &[u8], hint: ElementType) -> VectorResult<Vector<'_>> {
    let (etype, dim) = sniff_blob_shape(bytes, hint)?;
    if dim == 0 {
        return Ok(Vector::Owned(OwnedVector::zeros(etype, 0)));
    }
    let payload = if bytes.len() % 2 == 1 {
        &bytes[..bytes.len() - 1]
    } else {
        bytes
    };
    Ok(Vector::Borrowed(borrow_blob(etype, payload)))
}

/// Encode a vector to its canonical blob form, appending the trailing type
/// tag iff `etype != F32` (F32 is the legacy, untagged default).
pub fn encode_blob(v: &Vector) -> Vec<u8> {
    let dim = v.dim();
    let etype = v.element_type();
    let mut out = Vec::with_capacity(dim * etype.elem_size() + 1);
    match etype {
        ElementType::F32 => {
            for i in 0..dim {
                out.extend_from_slice(&v.f32_at(i).to_le_bytes());
            }
        }
        ElementType::F64 => {
            for i in 0..dim {
                out.extend_from_slice(&v.f64_at(i).to_le_bytes());
            }
            out.push(etype.tag());
        }
    }
    out
}
