//! SQL function surface: the user-callable builders, extractor, distance,
//! sum (scalar + aggregate), scalar multiply, and the `libsql_vector_idx`
//! index marker.
//!
//! Shape checks (type equality, dimension equality) happen here, before any
//! vector is allocated — the algebra in [`crate::vector`] can assume
//! well-formed, same-shape inputs by the time it runs.

use crate::error::{VectorError, VectorResult};
use crate::row::KeyValue;
use crate::vector::{
    self, add, add_owned, cosine_distance, decode_blob, encode_blob, parse_text_into,
    render_text, scale, scale_owned, sniff_blob_shape, sniff_text_dim, ElementType, OwnedVector,
    Vector,
};

/// Parse a SQL value into a vector. `hint` selects the element type for a
/// TEXT argument (the text format carries no type marker of its own); a
/// BLOB argument is always self-describing via length parity (defaulting to
/// F32 when empty) and ignores `hint` entirely.
fn detect_and_parse(value: &KeyValue, hint: Option<ElementType>) -> VectorResult<Vector<'_>> {
    let hint = hint.unwrap_or(ElementType::F32);
    match value {
        KeyValue::Blob(bytes) => decode_blob(bytes, hint),
        KeyValue::Text(s) => vector::parse_text(s, hint),
        other => Err(VectorError::user_input(format!(
            "vector: unexpected value type: got {}, expected TEXT or BLOB",
            other.sql_type_name()
        ))),
    }
}

/// Phase-1 shape-only detection (no element parse), used by `vector_sum` to
/// decide whether its running-sum/scratch buffers need reallocating before
/// actually filling them.
fn detect_shape(value: &KeyValue, hint: Option<ElementType>) -> VectorResult<(ElementType, usize)> {
    let hint = hint.unwrap_or(ElementType::F32);
    match value {
        KeyValue::Blob(bytes) => sniff_blob_shape(bytes, hint),
        KeyValue::Text(s) => Ok((hint, sniff_text_dim(s)?)),
        other => Err(VectorError::user_input(format!(
            "vector: unexpected value type: got {}, expected TEXT or BLOB",
            other.sql_type_name()
        ))),
    }
}

fn fill_from_value(value: &KeyValue, etype: ElementType, out: &mut OwnedVector) -> VectorResult<()> {
    match value {
        KeyValue::Text(s) => parse_text_into(s, etype, out),
        KeyValue::Blob(bytes) => {
            let parsed = decode_blob(bytes, etype)?;
            if parsed.element_type() != etype {
                return Err(VectorError::Shape {
                    expected: crate::error::ShapeDesc {
                        type_name: etype.name(),
                        dim: parsed.dim(),
                    },
                    actual: parsed.shape(),
                });
            }
            match (etype, out) {
                (ElementType::F32, OwnedVector::F32(buf)) => {
                    buf.clear();
                    buf.extend((0..parsed.dim()).map(|i| parsed.f32_at(i)));
                }
                (ElementType::F64, OwnedVector::F64(buf)) => {
                    buf.clear();
                    buf.extend((0..parsed.dim()).map(|i| parsed.f64_at(i)));
                }
                _ => unreachable!("etype/out mismatch checked above"),
            }
            Ok(())
        }
        other => Err(VectorError::user_input(format!(
            "vector: unexpected value type: got {}, expected TEXT or BLOB",
            other.sql_type_name()
        ))),
    }
}

/// `vector(X)` / `vector32(X)` / `vector64(X)`: coerce to a vector of the
/// given element type and return its canonical blob.
pub fn vector_build(arg: &KeyValue, etype: ElementType) -> VectorResult<Vec<u8>> {
    let v = detect_and_parse(arg, Some(etype))?;
    Ok(encode_blob(&v))
}

/// `vector_extract(X)`: render any vector to canonical text.
pub fn vector_extract(arg: &KeyValue) -> VectorResult<String> {
    let v = detect_and_parse(arg, None)?;
    Ok(render_text(&v))
}

/// `vector_distance_cos(X, Y)`.
pub fn vector_distance_cos(a: &KeyValue, b: &KeyValue) -> VectorResult<f64> {
    let va = detect_and_parse(a, None)?;
    let vb = detect_and_parse(b, None)?;
    cosine_distance(&va, &vb)
}

/// `vector_sum(V, ...)` scalar, variadic form: element-wise sum of all
/// arguments, each independently type/dim-detected with no hint (matching
/// every other argument, including the first, against the first).
pub fn vector_sum_scalar(args: &[KeyValue]) -> VectorResult<Vec<u8>> {
    if args.is_empty() {
        return Err(VectorError::user_input("vector_sum: requires at least one argument"));
    }
    let mut sum = detect_and_parse(&args[0], None)?.into_owned();
    for arg in &args[1..] {
        let next = detect_and_parse(arg, None)?;
        add(&mut sum, &next)?;
    }
    Ok(encode_blob(&sum))
}

/// `vector_mult(V, k)` / `vector_mult(k, V)`: scalar times vector in either
/// argument order.
pub fn vector_mult(a: &KeyValue, b: &KeyValue) -> VectorResult<Vec<u8>> {
    fn as_numeric(v: &KeyValue) -> Option<f64> {
        match v {
            KeyValue::Integer(i) => Some(*i as f64),
            KeyValue::Real(f) => Some(*f),
            _ => None,
        }
    }
    fn is_vectorish(v: &KeyValue) -> bool {
        matches!(v, KeyValue::Text(_) | KeyValue::Blob(_))
    }

    let (vector_value, k) = match (as_numeric(a), as_numeric(b)) {
        (Some(k), _) if is_vectorish(b) => (b, k),
        (_, Some(k)) if is_vectorish(a) => (a, k),
        _ => {
            return Err(VectorError::user_input(format!(
                "vector_mult: unexpected parameters: got {} and {}, but expected vector-compatible and float-compatible types",
                a.sql_type_name(),
                b.sql_type_name()
            )))
        }
    };

    let mut v = detect_and_parse(vector_value, None)?.into_owned();
    scale(&mut v, k)?;
    Ok(encode_blob(&v))
}

/// `libsql_vector_idx(X, ...)`: identity marker used only to tag the
/// indexed expression during `CREATE INDEX` parsing. Evaluated as identity
/// at runtime — it's important this stays a true no-op, since the host
/// applies it to the column value before handing that value to the index.
pub fn libsql_vector_idx(args: &[KeyValue]) -> VectorResult<KeyValue> {
    args.first()
        .cloned()
        .ok_or_else(|| VectorError::user_input("libsql_vector_idx: requires at least one argument"))
}

/// Per-group aggregate state for `vector_sum` as a window/aggregate
/// function. The host allocates and owns this for the group's lifetime and
/// passes it back on every step/inverse/value/final call.
#[derive(Default)]
pub struct VectorSumState {
    count: u64,
    sum: Option<OwnedVector>,
    scratch: Option<OwnedVector>,
}

impl VectorSumState {
    fn add_scaled(&mut self, arg: &KeyValue, k: f64) -> VectorResult<()> {
        let (etype, dim) = detect_shape(arg, None)?;

        if let Some(sum) = &self.sum {
            if sum.element_type() != etype {
                return Err(VectorError::user_input(format!(
                    "vector_sum: vectors must have the same type: {:?} != {:?}",
                    sum.element_type(),
                    etype
                )));
            }
            if sum.dim() != dim {
                return Err(VectorError::user_input(format!(
                    "vector_sum: vectors must have the same length: {} != {}",
                    sum.dim(),
                    dim
                )));
            }
        }

        if self.count == 0 {
            let mut fresh = OwnedVector::zeros(etype, dim);
            fill_from_value(arg, etype, &mut fresh)?;
            scale_owned(&mut fresh, k);
            self.sum = Some(fresh);
            self.count += 1;
            return Ok(());
        }

        let scratch = self
            .scratch
            .get_or_insert_with(|| OwnedVector::zeros(etype, dim));
        if scratch.element_type() != etype || scratch.dim() != dim {
            *scratch = OwnedVector::zeros(etype, dim);
        }
        fill_from_value(arg, etype, scratch)?;
        scale_owned(scratch, k);

        let sum = self.sum.as_mut().expect("count > 0 implies sum is set");
        add_owned(sum, scratch)?;
        self.count += 1;
        Ok(())
    }

    /// `xStep`: adds `arg` to the running sum.
    pub fn step(&mut self, arg: &KeyValue) -> VectorResult<()> {
        self.add_scaled(arg, 1.0)
    }

    /// `xInverse`: undoes a row a prior `xStep` added. SQLite's window
    /// machinery only ever calls this for a row already summed by a step,
    /// so there is no "first row of the frame" special case here — this
    /// always negates-and-adds, exactly like every other step.
    pub fn inverse(&mut self, arg: &KeyValue) -> VectorResult<()> {
        self.add_scaled(arg, -1.0)
    }

    /// `xValue`: emits the running sum without freeing it.
    pub fn value(&self) -> VectorResult<Option<Vec<u8>>> {
        match &self.sum {
            Some(sum) if self.count > 0 => Ok(Some(encode_blob(&Vector::Owned(sum.clone())))),
            _ => Ok(None),
        }
    }

    /// `xFinal`: emits the running sum and consumes the state.
    pub fn finalize(self) -> VectorResult<Option<Vec<u8>>> {
        self.value()
    }
}

/// A stateless SQL function callable with a fixed or variadic argument list.
/// `arg_count` is `None` for the variadic forms (`vector_sum`,
/// `libsql_vector_idx`); the host is expected to enforce it at bind time.
pub trait ScalarFunction {
    fn name(&self) -> &'static str;
    fn arg_count(&self) -> Option<usize>;
    fn call(&self, args: &[KeyValue]) -> VectorResult<KeyValue>;
}

/// A `vector_sum`-shaped aggregate/window function. The function itself is
/// stateless; it only knows how to drive a [`VectorSumState`] the host
/// allocates once per group and threads through every call.
pub trait AggregateFunction {
    fn name(&self) -> &'static str;
    fn new_state(&self) -> VectorSumState;
    fn step(&self, state: &mut VectorSumState, args: &[KeyValue]) -> VectorResult<()>;
    fn inverse(&self, state: &mut VectorSumState, args: &[KeyValue]) -> VectorResult<()>;
    fn value(&self, state: &VectorSumState) -> VectorResult<Option<KeyValue>>;
    fn finalize(&self, state: VectorSumState) -> VectorResult<Option<KeyValue>>;
}

/// The registration target a host exposes once per connection. Mirrors the
/// original's single `vectorFunctions[]` table: every function this crate
/// provides is wired up from one place, [`register_all`].
pub trait FunctionHost {
    fn register_scalar(&mut self, function: Box<dyn ScalarFunction>);
    fn register_aggregate(&mut self, function: Box<dyn AggregateFunction>);
}

fn first_arg(args: &[KeyValue]) -> VectorResult<&KeyValue> {
    args.first()
        .ok_or_else(|| VectorError::user_input("vector: expected at least one argument"))
}

/// `vector`/`vector32`/`vector64` all coerce to a canonical blob; `vector`
/// is simply `vector32` under an alias, matching the original registering
/// both names against the same implementation.
struct VectorBuild {
    registered_name: &'static str,
    etype: ElementType,
}

impl ScalarFunction for VectorBuild {
    fn name(&self) -> &'static str {
        self.registered_name
    }

    fn arg_count(&self) -> Option<usize> {
        Some(1)
    }

    fn call(&self, args: &[KeyValue]) -> VectorResult<KeyValue> {
        Ok(KeyValue::Blob(vector_build(first_arg(args)?, self.etype)?))
    }
}

struct VectorExtract;

impl ScalarFunction for VectorExtract {
    fn name(&self) -> &'static str {
        "vector_extract"
    }

    fn arg_count(&self) -> Option<usize> {
        Some(1)
    }

    fn call(&self, args: &[KeyValue]) -> VectorResult<KeyValue> {
        Ok(KeyValue::Text(vector_extract(first_arg(args)?)?))
    }
}

struct VectorDistanceCos;

impl ScalarFunction for VectorDistanceCos {
    fn name(&self) -> &'static str {
        "vector_distance_cos"
    }

    fn arg_count(&self) -> Option<usize> {
        Some(2)
    }

    fn call(&self, args: &[KeyValue]) -> VectorResult<KeyValue> {
        let [a, b] = args else {
            return Err(VectorError::user_input(
                "vector_distance_cos: expected exactly two arguments",
            ));
        };
        Ok(KeyValue::Real(vector_distance_cos(a, b)?))
    }
}

struct VectorSumScalar;

impl ScalarFunction for VectorSumScalar {
    fn name(&self) -> &'static str {
        "vector_sum"
    }

    fn arg_count(&self) -> Option<usize> {
        None
    }

    fn call(&self, args: &[KeyValue]) -> VectorResult<KeyValue> {
        Ok(KeyValue::Blob(vector_sum_scalar(args)?))
    }
}

struct VectorMult;

impl ScalarFunction for VectorMult {
    fn name(&self) -> &'static str {
        "vector_mult"
    }

    fn arg_count(&self) -> Option<usize> {
        Some(2)
    }

    fn call(&self, args: &[KeyValue]) -> VectorResult<KeyValue> {
        let [a, b] = args else {
            return Err(VectorError::user_input(
                "vector_mult: expected exactly two arguments",
            ));
        };
        Ok(vector_mult(a, b).map(KeyValue::Blob)?)
    }
}

struct LibsqlVectorIdx;

impl ScalarFunction for LibsqlVectorIdx {
    fn name(&self) -> &'static str {
        "libsql_vector_idx"
    }

    fn arg_count(&self) -> Option<usize> {
        None
    }

    fn call(&self, args: &[KeyValue]) -> VectorResult<KeyValue> {
        libsql_vector_idx(args)
    }
}

struct VectorSumAggregate;

impl AggregateFunction for VectorSumAggregate {
    fn name(&self) -> &'static str {
        "vector_sum"
    }

    fn new_state(&self) -> VectorSumState {
        VectorSumState::default()
    }

    fn step(&self, state: &mut VectorSumState, args: &[KeyValue]) -> VectorResult<()> {
        state.step(first_arg(args)?)
    }

    fn inverse(&self, state: &mut VectorSumState, args: &[KeyValue]) -> VectorResult<()> {
        state.inverse(first_arg(args)?)
    }

    fn value(&self, state: &VectorSumState) -> VectorResult<Option<KeyValue>> {
        Ok(state.value()?.map(KeyValue::Blob))
    }

    fn finalize(&self, state: VectorSumState) -> VectorResult<Option<KeyValue>> {
        Ok(state.finalize()?.map(KeyValue::Blob))
    }
}

/// Registers every function this crate provides against `host`, once per
/// connection — the single entry point, matching the original's one-block
/// `vectorFunctions[]` registration.
pub fn register_all(host: &mut dyn FunctionHost) {
    host.register_scalar(Box::new(VectorBuild {
        registered_name: "vector",
        etype: ElementType::F32,
    }));
    host.register_scalar(Box::new(VectorBuild {
        registered_name: "vector32",
        etype: ElementType::F32,
    }));
    host.register_scalar(Box::new(VectorBuild {
        registered_name: "vector64",
        etype: ElementType::F64,
    }));
    host.register_scalar(Box::new(VectorExtract));
    host.register_scalar(Box::new(VectorDistanceCos));
    host.register_scalar(Box::new(VectorSumScalar));
    host.register_scalar(Box::new(VectorMult));
    host.register_scalar(Box::new(LibsqlVectorIdx));
    host.register_aggregate(Box::new(VectorSumAggregate));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob_f32(xs: &[f32]) -> KeyValue {
        let v = Vector::Owned(OwnedVector::F32(xs.to_vec()));
        KeyValue::Blob(encode_blob(&v))
    }

    #[test]
    fn vector_build_from_text() {
        let blob = vector_build(&KeyValue::Text("[1,2,3]".into()), ElementType::F32).unwrap();
        assert_eq!(blob.len(), 12);
    }

    #[test]
    fn vector_extract_round_trips_text() {
        let rendered =
            vector_extract(&KeyValue::Text("[1.5, -2, 3e0]".into())).unwrap();
        assert_eq!(rendered, "[1.5,-2,3]");
    }

    #[test]
    fn vector_distance_cos_orthogonal() {
        let d = vector_distance_cos(
            &KeyValue::Text("[1,0]".into()),
            &KeyValue::Text("[0,1]".into()),
        )
        .unwrap();
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn scalar_vector_sum_adds_elementwise() {
        let blob = vector_sum_scalar(&[blob_f32(&[1.0, 2.0]), blob_f32(&[10.0, 20.0])]).unwrap();
        let v = decode_blob(&blob, ElementType::F32).unwrap();
        assert_eq!(v.f32_at(0), 11.0);
        assert_eq!(v.f32_at(1), 22.0);
    }

    #[test]
    fn scalar_vector_sum_rejects_shape_mismatch() {
        let err = vector_sum_scalar(&[blob_f32(&[1.0, 2.0]), blob_f32(&[1.0, 2.0, 3.0])])
            .unwrap_err();
        assert!(matches!(err, VectorError::Shape { .. }));
    }

    #[test]
    fn vector_mult_either_argument_order() {
        let a = vector_mult(&blob_f32(&[1.0, 2.0]), &KeyValue::Real(2.0)).unwrap();
        let b = vector_mult(&KeyValue::Real(2.0), &blob_f32(&[1.0, 2.0])).unwrap();
        assert_eq!(a, b);
        let v = decode_blob(&a, ElementType::F32).unwrap();
        assert_eq!(v.f32_at(0), 2.0);
        assert_eq!(v.f32_at(1), 4.0);
    }

    #[test]
    fn marker_is_identity() {
        let v = KeyValue::Text("[1,2]".into());
        let out = libsql_vector_idx(std::slice::from_ref(&v)).unwrap();
        assert_eq!(out, v);
    }

    #[test]
    fn aggregate_step_and_inverse_cancel_out() {
        let mut state = VectorSumState::default();
        let a = blob_f32(&[1.0, 2.0]);
        let b = blob_f32(&[3.0, 4.0]);
        state.step(&a).unwrap();
        state.step(&b).unwrap();
        state.inverse(&b).unwrap();
        let blob = state.finalize().unwrap().unwrap();
        let v = decode_blob(&blob, ElementType::F32).unwrap();
        assert_eq!(v.f32_at(0), 1.0);
        assert_eq!(v.f32_at(1), 2.0);
    }

    #[test]
    fn aggregate_full_window_inverse_yields_zero_vector() {
        let mut state = VectorSumState::default();
        let a = blob_f32(&[1.0, 2.0]);
        let b = blob_f32(&[3.0, -4.0]);
        state.step(&a).unwrap();
        state.step(&b).unwrap();
        state.inverse(&a).unwrap();
        state.inverse(&b).unwrap();
        let blob = state.finalize().unwrap().unwrap();
        let v = decode_blob(&blob, ElementType::F32).unwrap();
        assert_eq!(v.f32_at(0), 0.0);
        assert_eq!(v.f32_at(1), 0.0);
    }

    #[test]
    fn aggregate_value_does_not_consume_state() {
        let mut state = VectorSumState::default();
        state.step(&blob_f32(&[5.0])).unwrap();
        let first = state.value().unwrap().unwrap();
        let second = state.value().unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[derive(Default)]
    struct RecordingHost {
        scalars: Vec<&'static str>,
        aggregates: Vec<&'static str>,
    }

    impl FunctionHost for RecordingHost {
        fn register_scalar(&mut self, function: Box<dyn ScalarFunction>) {
            self.scalars.push(function.name());
        }

        fn register_aggregate(&mut self, function: Box<dyn AggregateFunction>) {
            self.aggregates.push(function.name());
        }
    }

    #[test]
    fn register_all_wires_up_every_function_once() {
        let mut host = RecordingHost::default();
        register_all(&mut host);
        assert_eq!(
            host.scalars,
            vec![
                "vector",
                "vector32",
                "vector64",
                "vector_extract",
                "vector_distance_cos",
                "vector_sum",
                "vector_mult",
                "libsql_vector_idx",
            ]
        );
        assert_eq!(host.aggregates, vec!["vector_sum"]);
    }

    #[test]
    fn vector_build_alias_matches_vector32() {
        let via_vector = VectorBuild {
            registered_name: "vector",
            etype: ElementType::F32,
        };
        let via_vector32 = VectorBuild {
            registered_name: "vector32",
            etype: ElementType::F32,
        };
        let arg = [KeyValue::Text("[1,2,3]".into())];
        assert_eq!(
            via_vector.call(&arg).unwrap(),
            via_vector32.call(&arg).unwrap()
        );
    }
}
