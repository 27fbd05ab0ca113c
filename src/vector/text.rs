//! Text wire format: `[1.5, -2, 3e0]`.
//!
//! Grammar: `^\s*\[\s*(num(\s*,\s*num)*)?\s*\]\s*$`, each `num` a float
//! literal no longer than [`super::MAX_FLOAT_LITERAL_CHARS`] characters,
//! whitespace allowed around literals and brackets. `[]` is the valid
//! zero-dimension vector.

use super::{check_dim, ElementType, OwnedVector, Vector, MAX_FLOAT_LITERAL_CHARS};
use crate::error::{VectorError, VectorResult};

/// Split the text form into its literal tokens, validating delimiters and
/// per-token length without parsing the floats themselves. This is the
/// "phase 1" of the two-phase parse API: the token count is the vector's
/// dimension, known before any element storage is allocated.
fn tokenize(s: &str) -> VectorResult<Vec<String>> {
    let s = s.trim_start();
    let mut chars = s.char_indices().peekable();

    match chars.next() {
        Some((_, '[')) => {}
        _ => return Err(VectorError::user_input("vector: must start with '['")),
    }

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut closed = false;
    let mut tail_start = 0usize;

    // Position within the original (untrimmed-from-start-only) remainder,
    // used purely for diagnostics.
    let rest = &s[1..];
    for (pos, ch) in rest.char_indices() {
        if closed {
            tail_start = pos;
            break;
        }
        if ch.is_whitespace() {
            continue;
        }
        if ch == ',' || ch == ']' {
            if ch == ']' && tokens.is_empty() && current.is_empty() {
                closed = true;
                tail_start = pos + ch.len_utf8();
                continue;
            }
            if current.is_empty() {
                return Err(VectorError::user_input(format!(
                    "vector: empty float literal at position {}",
                    tokens.len()
                )));
            }
            tokens.push(std::mem::take(&mut current));
            if ch == ']' {
                closed = true;
                tail_start = pos + ch.len_utf8();
            }
            continue;
        }
        if current.len() >= MAX_FLOAT_LITERAL_CHARS {
            return Err(VectorError::user_input(format!(
                "vector: float string length exceeded {MAX_FLOAT_LITERAL_CHARS} characters: '{current}'"
            )));
        }
        current.push(ch);
    }

    if !closed {
        return Err(VectorError::user_input("vector: must end with ']'"));
    }

    let tail = rest[tail_start..].trim();
    if !tail.is_empty() {
        return Err(VectorError::user_input(format!(
            "vector: unexpected trailing data after ']': '{tail}'"
        )));
    }

    check_dim(tokens.len())?;
    Ok(tokens)
}

/// Phase 1: determine the dimension of a text vector without allocating
/// element storage. The element type always comes from the caller's hint —
/// the text format carries no type information of its own.
pub fn sniff_text_dim(s: &str) -> VectorResult<usize> {
    Ok(tokenize(s)?.len())
}

fn parse_one<T: std::str::FromStr>(token: &str, index: usize) -> VectorResult<T> {
    token.trim().parse::<T>().map_err(|_| {
        VectorError::user_input(format!(
            "vector: invalid float at position {index}: '{token}'"
        ))
    })
}

/// Phase 2: parse `s` into `buf`, clearing it first. `buf`'s element type is
/// fixed by the caller; this only ever appends parsed literals in order.
pub fn parse_text_into_f32(s: &str, buf: &mut Vec<f32>) -> VectorResult<()> {
    let tokens = tokenize(s)?;
    buf.clear();
    buf.reserve(tokens.len());
    for (i, tok) in tokens.iter().enumerate() {
        buf.push(parse_one::<f32>(tok, i)?);
    }
    Ok(())
}

pub fn parse_text_into_f64(s: &str, buf: &mut Vec<f64>) -> VectorResult<()> {
    let tokens = tokenize(s)?;
    buf.clear();
    buf.reserve(tokens.len());
    for (i, tok) in tokens.iter().enumerate() {
        buf.push(parse_one::<f64>(tok, i)?);
    }
    Ok(())
}

/// Generic entry point used when the caller doesn't already hold a scratch
/// buffer (e.g. the scalar `vector32`/`vector64` builders).
pub fn parse_text_into(s: &str, etype: ElementType, out: &mut OwnedVector) -> VectorResult<()> {
    match (etype, out) {
        (ElementType::F32, OwnedVector::F32(buf)) => parse_text_into_f32(s, buf),
        (ElementType::F64, OwnedVector::F64(buf)) => parse_text_into_f64(s, buf),
        _ => Err(VectorError::internal(
            "parse_text_into: element type hint does not match scratch buffer",
        )),
    }
}

/// One-shot parse into a fresh, owned vector.
pub fn parse_text(s: &str, etype: ElementType) -> VectorResult<Vector<'static>> {
    let mut owned = OwnedVector::zeros(etype, 0);
    parse_text_into(s, etype, &mut owned)?;
    Ok(Vector::Owned(owned))
}

/// Render to the canonical text form, e.g. `[1.5,-2,3]`.
///
/// Rust's `Display` impl for floats already yields the shortest
/// round-trippable decimal form without a forced trailing `.0`, so integral
/// values render as plain integers (`3`, not `3.0`), matching the host's
/// `%!g`-style formatting.
pub fn render_text(v: &Vector) -> String {
    let dim = v.dim();
    let mut out = String::with_capacity(dim * 8 + 2);
    out.push('[');
    for i in 0..dim {
        if i > 0 {
            out.push(',');
        }
        match v.element_type() {
            ElementType::F32 => out.push_str(&format!("{}", v.f32_at(i))),
            ElementType::F64 => out.push_str(&format!("{}", v.f64_at(i))),
        }
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_vector() {
        let v = parse_text("[1.5, -2, 3e0]", ElementType::F32).unwrap();
        assert_eq!(v.dim(), 3);
        assert_eq!(v.f32_at(0), 1.5);
        assert_eq!(v.f32_at(1), -2.0);
        assert_eq!(v.f32_at(2), 3.0);
    }

    #[test]
    fn renders_canonical_text() {
        let v = parse_text("[1.5, -2, 3e0]", ElementType::F32).unwrap();
        assert_eq!(render_text(&v), "[1.5,-2,3]");
    }

    #[test]
    fn empty_vector_is_valid() {
        let v = parse_text("[]", ElementType::F32).unwrap();
        assert_eq!(v.dim(), 0);
        assert_eq!(render_text(&v), "[]");
    }

    #[test]
    fn rejects_missing_open_bracket() {
        let err = parse_text("1,2]", ElementType::F32).unwrap_err();
        assert!(err.to_string().contains("must start with"));
    }

    #[test]
    fn rejects_missing_close_bracket() {
        let err = parse_text("[1,2", ElementType::F32).unwrap_err();
        assert!(err.to_string().contains("must end with"));
    }

    #[test]
    fn rejects_trailing_garbage() {
        let err = parse_text("[1,2] extra", ElementType::F32).unwrap_err();
        assert!(err.to_string().contains("trailing"));
    }

    #[test]
    fn rejects_unparsable_literal() {
        let err = parse_text("[1, abc, 3]", ElementType::F32).unwrap_err();
        assert!(err.to_string().contains("invalid float at position 1"));
    }

    #[test]
    fn rejects_oversized_literal() {
        let long = "1".repeat(MAX_FLOAT_LITERAL_CHARS + 1);
        let text = format!("[{long}]");
        let err = parse_text(&text, ElementType::F32).unwrap_err();
        assert!(err.to_string().contains("length exceeded"));
    }

    #[test]
    fn rejects_dimension_over_max() {
        let text = format!(
            "[{}]",
            vec!["1"; super::super::MAX_DIMS + 1].join(",")
        );
        let err = parse_text(&text, ElementType::F32).unwrap_err();
        assert!(err.to_string().contains("max size exceeded"));
    }

    #[test]
    fn whitespace_around_literals_is_tolerated() {
        let v = parse_text("  [ 1 , 2 , 3 ]  ", ElementType::F64).unwrap();
        assert_eq!(v.dim(), 3);
        assert_eq!(v.f64_at(1), 2.0);
    }
}
