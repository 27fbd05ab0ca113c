//! Vector algebra: in-place add/scale and allocation-free distance.
//!
//! `add`/`scale` mutate their first argument in place — mirrors the
//! underlying `vectorAdd`/`vectorScale` pair, which never allocate either.
//! Shape compatibility (same element type, same dimension) is a
//! precondition here, not a recoverable error: by the time these run, the
//! SQL-function layer has already checked shapes, so a mismatch reaching
//! this layer is a bug in the caller, reported as `VectorError::Shape`
//! rather than a panic so a misbehaving embedder still gets a catchable
//! error instead of an abort.

use super::{require_same_shape, OwnedVector, Vector};
use crate::error::{ShapeDesc, VectorError, VectorResult};

/// `a += b`, element-wise, both already owned and same-shaped. Used
/// directly by the `vector_sum` aggregate, which keeps its running sum as
/// a bare `OwnedVector` across steps rather than re-wrapping it in a
/// [`Vector`] on every call.
pub fn add_owned(sum: &mut OwnedVector, other: &OwnedVector) -> VectorResult<()> {
    if sum.element_type() != other.element_type() || sum.dim() != other.dim() {
        return Err(VectorError::Shape {
            expected: ShapeDesc {
                type_name: sum.element_type().name(),
                dim: sum.dim(),
            },
            actual: ShapeDesc {
                type_name: other.element_type().name(),
                dim: other.dim(),
            },
        });
    }
    match (sum, other) {
        (OwnedVector::F32(s), OwnedVector::F32(o)) => {
            for (x, y) in s.iter_mut().zip(o.iter()) {
                *x += y;
            }
        }
        (OwnedVector::F64(s), OwnedVector::F64(o)) => {
            for (x, y) in s.iter_mut().zip(o.iter()) {
                *x += y;
            }
        }
        _ => unreachable!("shape check above guarantees matching variants"),
    }
    Ok(())
}

/// `a *= k`, element-wise, in the vector's own element type (no upcast to
/// f64 for the F32 case).
pub fn scale_owned(a: &mut OwnedVector, k: f64) {
    match a {
        OwnedVector::F32(buf) => {
            let k = k as f32;
            for x in buf.iter_mut() {
                *x *= k;
            }
        }
        OwnedVector::F64(buf) => {
            for x in buf.iter_mut() {
                *x *= k;
            }
        }
    }
}

/// `a += b`, element-wise. `a` must be owned.
pub fn add(a: &mut Vector, b: &Vector) -> VectorResult<()> {
    require_same_shape(a, b)?;
    let dim = a.dim();
    let owned = a.as_owned_mut()?;
    match owned {
        OwnedVector::F32(buf) => {
            for i in 0..dim {
                buf[i] += b.f32_at(i);
            }
        }
        OwnedVector::F64(buf) => {
            for i in 0..dim {
                buf[i] += b.f64_at(i);
            }
        }
    }
    Ok(())
}

/// `a *= k`, element-wise, in the vector's own element type (no upcast to
/// f64 for the F32 case).
pub fn scale(a: &mut Vector, k: f64) -> VectorResult<()> {
    let owned = a.as_owned_mut()?;
    scale_owned(owned, k);
    Ok(())
}

/// Cosine distance `1 - dot(a,b) / (|a| * |b|)`. If either magnitude is
/// zero, the result is defined to be `1.0`. Bounded to `[0, 2]`.
pub fn cosine_distance(a: &Vector, b: &Vector) -> VectorResult<f64> {
    require_same_shape(a, b)?;
    let dim = a.dim();
    match a.element_type() {
        super::ElementType::F32 => {
            let (mut dot, mut na, mut nb) = (0f32, 0f32, 0f32);
            for i in 0..dim {
                let (x, y) = (a.f32_at(i), b.f32_at(i));
                dot += x * y;
                na += x * x;
                nb += y * y;
            }
            if na == 0.0 || nb == 0.0 {
                return Ok(1.0);
            }
            Ok((1.0 - dot / (na.sqrt() * nb.sqrt())) as f64)
        }
        super::ElementType::F64 => {
            let (mut dot, mut na, mut nb) = (0f64, 0f64, 0f64);
            for i in 0..dim {
                let (x, y) = (a.f64_at(i), b.f64_at(i));
                dot += x * y;
                na += x * x;
                nb += y * y;
            }
            if na == 0.0 || nb == 0.0 {
                return Ok(1.0);
            }
            Ok(1.0 - dot / (na.sqrt() * nb.sqrt()))
        }
    }
}

/// Squared L2 distance (no square root) — the value persisted and compared
/// by the index. Callers that need true Euclidean distance take the square
/// root themselves.
pub fn l2_distance(a: &Vector, b: &Vector) -> VectorResult<f64> {
    require_same_shape(a, b)?;
    let dim = a.dim();
    match a.element_type() {
        super::ElementType::F32 => {
            let mut acc = 0f32;
            for i in 0..dim {
                let d = a.f32_at(i) - b.f32_at(i);
                acc += d * d;
            }
            Ok(acc as f64)
        }
        super::ElementType::F64 => {
            let mut acc = 0f64;
            for i in 0..dim {
                let d = a.f64_at(i) - b.f64_at(i);
                acc += d * d;
            }
            Ok(acc)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::ElementType;

    fn f32v(xs: &[f32]) -> Vector<'static> {
        Vector::Owned(OwnedVector::F32(xs.to_vec()))
    }

    #[test]
    fn cosine_distance_orthogonal_is_one() {
        let a = f32v(&[1.0, 0.0]);
        let b = f32v(&[0.0, 1.0]);
        let d = cosine_distance(&a, &b).unwrap();
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_distance_self_is_zero() {
        let a = f32v(&[3.0, 4.0]);
        let d = cosine_distance(&a, &a).unwrap();
        assert!(d.abs() < 1e-6);
    }

    #[test]
    fn cosine_distance_with_zero_vector_is_one() {
        let a = f32v(&[1.0, 2.0]);
        let z = f32v(&[0.0, 0.0]);
        assert_eq!(cosine_distance(&a, &z).unwrap(), 1.0);
    }

    #[test]
    fn cosine_distance_is_bounded() {
        let a = f32v(&[1.0, -1.0, 2.5]);
        let b = f32v(&[-2.0, 0.5, -1.0]);
        let d = cosine_distance(&a, &b).unwrap();
        assert!((0.0..=2.0).contains(&d));
    }

    #[test]
    fn add_is_in_place_on_first_argument() {
        let mut a = f32v(&[1.0, 2.0]);
        let b = f32v(&[10.0, 20.0]);
        add(&mut a, &b).unwrap();
        assert_eq!(a.f32_at(0), 11.0);
        assert_eq!(a.f32_at(1), 22.0);
    }

    #[test]
    fn scale_multiplies_every_element() {
        let mut a = f32v(&[1.0, -2.0, 3.0]);
        scale(&mut a, 2.0).unwrap();
        assert_eq!(a.f32_at(0), 2.0);
        assert_eq!(a.f32_at(1), -4.0);
        assert_eq!(a.f32_at(2), 6.0);
    }

    #[test]
    fn mismatched_shape_is_rejected() {
        let mut a = f32v(&[1.0, 2.0]);
        let b = Vector::Owned(OwnedVector::F64(vec![1.0, 2.0]));
        assert!(add(&mut a, &b).is_err());
        let c = f32v(&[1.0, 2.0, 3.0]);
        assert!(cosine_distance(&a, &c).is_err());
        let _ = ElementType::F32;
    }

    #[test]
    fn l2_distance_is_squared_sum() {
        let a = f32v(&[0.0, 0.0]);
        let b = f32v(&[3.0, 4.0]);
        let d = l2_distance(&a, &b).unwrap();
        assert_eq!(d, 25.0);
    }
}
