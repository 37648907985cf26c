//! Parsed literal values and their conversion to strict JSON.

use serde_json::{Map, Number, Value};

/// A literal value as printed by the interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Set(Vec<Literal>),
    /// Entries in source order. Duplicate keys are kept here and collapse (last wins) in [`Literal::to_json`].
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    /// The interpreter's name for this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::None => "NoneType",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Str(_) => "str",
            Literal::Bytes(_) => "bytes",
            Literal::List(_) => "list",
            Literal::Tuple(_) => "tuple",
            Literal::Set(_) => "set",
            Literal::Dict(_) => "dict",
        }
    }

    /// Convert to a strict JSON value.
    ///
    /// ## Notes
    /// - Integers outside the 64-bit range become floats.
    /// - Non-finite floats become the strings `"inf"`, `"-inf"` and `"nan"`.
    /// - Byte strings are decoded as UTF-8, replacing invalid sequences.
    /// - Tuples and sets become arrays.
    /// - Dict keys that are not strings are rendered as their compact JSON text.
    pub fn to_json(&self) -> Value {
        match self {
            Literal::None => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => int_to_json(*i),
            Literal::Float(f) => float_to_json(*f),
            Literal::Str(s) => Value::String(s.clone()),
            Literal::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
            Literal::List(items) | Literal::Tuple(items) | Literal::Set(items) => {
                Value::Array(items.iter().map(Literal::to_json).collect())
            }
            Literal::Dict(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(key.key_text(), value.to_json());
                }
                Value::Object(map)
            }
        }
    }

    fn key_text(&self) -> String {
        match self {
            Literal::Str(s) => s.clone(),
            Literal::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            other => other.to_json().to_string(),
        }
    }
}

fn int_to_json(i: i128) -> Value {
    if let Ok(small) = i64::try_from(i) {
        Value::Number(small.into())
    } else if let Ok(unsigned) = u64::try_from(i) {
        Value::Number(unsigned.into())
    } else {
        float_to_json(i as f64)
    }
}

fn float_to_json(f: f64) -> Value {
    match Number::from_f64(f) {
        Some(n) => Value::Number(n),
        None if f.is_nan() => Value::String("nan".to_string()),
        None if f.is_sign_negative() => Value::String("-inf".to_string()),
        None => Value::String("inf".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(Literal::None.to_json(), Value::Null);
        assert_eq!(Literal::Bool(true).to_json(), json!(true));
        assert_eq!(Literal::Int(-7).to_json(), json!(-7));
        assert_eq!(Literal::Float(2.5).to_json(), json!(2.5));
        assert_eq!(Literal::Str("x".into()).to_json(), json!("x"));
    }

    #[test]
    fn test_int_ranges() {
        assert_eq!(Literal::Int(u64::MAX as i128).to_json(), json!(u64::MAX));
        let wide = Literal::Int(i128::from(u64::MAX) * 4).to_json();
        assert!(wide.is_f64());
    }

    #[test]
    fn test_non_finite_floats() {
        assert_eq!(Literal::Float(f64::INFINITY).to_json(), json!("inf"));
        assert_eq!(Literal::Float(f64::NEG_INFINITY).to_json(), json!("-inf"));
        assert_eq!(Literal::Float(f64::NAN).to_json(), json!("nan"));
    }

    #[test]
    fn test_bytes_decode_lossily() {
        assert_eq!(Literal::Bytes(b"ok".to_vec()).to_json(), json!("ok"));
        assert_eq!(Literal::Bytes(vec![0xff]).to_json(), json!("\u{FFFD}"));
    }

    #[test]
    fn test_sequences_become_arrays() {
        let items = vec![Literal::Int(1), Literal::Int(2)];
        assert_eq!(Literal::Tuple(items.clone()).to_json(), json!([1, 2]));
        assert_eq!(Literal::Set(items).to_json(), json!([1, 2]));
    }

    #[test]
    fn test_dict_keys_rendered_as_text() {
        let dict = Literal::Dict(vec![
            (Literal::Str("a".into()), Literal::Int(1)),
            (Literal::Int(2), Literal::Int(2)),
            (Literal::None, Literal::Int(3)),
            (Literal::Tuple(vec![Literal::Int(1), Literal::Str("b".into())]), Literal::Int(4)),
        ]);
        assert_eq!(
            dict.to_json(),
            json!({"a": 1, "2": 2, "null": 3, "[1,\"b\"]": 4})
        );
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let dict = Literal::Dict(vec![
            (Literal::Str("k".into()), Literal::Int(1)),
            (Literal::Str("k".into()), Literal::Int(2)),
        ]);
        assert_eq!(dict.to_json(), json!({"k": 2}));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Literal::None.type_name(), "NoneType");
        assert_eq!(Literal::Dict(vec![]).type_name(), "dict");
    }
}
