use std::fmt;
use std::str::FromStr;

use crate::QueryError;

/// A tagged value. The type tag is the value serialized for `FieldType`:
/// `0` for `Int32`, `1` for `Float32`, `2` for `String`, in that order.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Int32(i32),
    Float32(f32),
    String(String),
}

impl Field {
    pub fn int(value: i32) -> Self {
        Field::Int32(value)
    }

    pub fn float(value: f32) -> Self {
        Field::Float32(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Field::String(value.into())
    }

    fn type_tag(&self) -> u8 {
        match self {
            Field::Int32(_) => 0,
            Field::Float32(_) => 1,
            Field::String(_) => 2,
        }
    }

    /// Byte length of the textual payload, recorded alongside the type tag
    /// in the serialized form. Advisory: `deserialize` does not rely on it
    /// to know how many bytes to consume, since the format is whitespace
    /// delimited.
    fn data_length(&self) -> usize {
        match self {
            Field::Int32(v) => v.to_string().len(),
            Field::Float32(v) => v.to_string().len(),
            Field::String(v) => v.len(),
        }
    }

    pub fn as_int(&self) -> Result<i32, QueryError> {
        match self {
            Field::Int32(v) => Ok(*v),
            other => Err(QueryError::TypeMismatch {
                expected: "Int32",
                found: other.type_name(),
            }),
        }
    }

    pub fn as_float(&self) -> Result<f32, QueryError> {
        match self {
            Field::Float32(v) => Ok(*v),
            other => Err(QueryError::TypeMismatch {
                expected: "Float32",
                found: other.type_name(),
            }),
        }
    }

    pub fn as_str(&self) -> Result<&str, QueryError> {
        match self {
            Field::String(v) => Ok(v),
            other => Err(QueryError::TypeMismatch {
                expected: "String",
                found: other.type_name(),
            }),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Field::Int32(_) => "Int32",
            Field::Float32(_) => "Float32",
            Field::String(_) => "String",
        }
    }

    /// Produces `"{type_tag} {data_length} {value} "` (note the trailing
    /// space), matching the textual codec byte-for-byte.
    pub fn serialize(&self) -> String {
        let mut out = format!("{} {} ", self.type_tag(), self.data_length());
        match self {
            Field::Int32(v) => out.push_str(&v.to_string()),
            Field::Float32(v) => out.push_str(&v.to_string()),
            Field::String(v) => out.push_str(v),
        }
        out.push(' ');
        out
    }

    /// Reads a type tag, an advisory data length, then the value, all as
    /// whitespace-delimited tokens.
    pub fn deserialize(tokens: &mut impl Iterator<Item = String>) -> Result<Field, QueryError> {
        let type_tag = next_token(tokens)?;
        let type_tag: u8 = parse_token(&type_tag)?;
        let _data_length: usize = parse_token(&next_token(tokens)?)?;

        match type_tag {
            0 => Ok(Field::Int32(parse_token(&next_token(tokens)?)?)),
            1 => Ok(Field::Float32(parse_token(&next_token(tokens)?)?)),
            2 => Ok(Field::String(next_token(tokens)?)),
            other => Err(QueryError::Decode(format!("unknown field type tag {other}"))),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int32(v) => write!(f, "{v}"),
            Field::Float32(v) => write!(f, "{v}"),
            Field::String(v) => write!(f, "{v}"),
        }
    }
}

fn next_token(tokens: &mut impl Iterator<Item = String>) -> Result<String, QueryError> {
    tokens
        .next()
        .ok_or_else(|| QueryError::Decode("unexpected end of tuple stream".to_string()))
}

fn parse_token<T: FromStr>(token: &str) -> Result<T, QueryError> {
    token
        .parse()
        .map_err(|_| QueryError::Decode(format!("malformed token: {token:?}")))
}

/// An ordered sequence of tagged field values.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    fields: Vec<Field>,
}

impl Tuple {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Produces `"{field_count} " + concat(serialize(field) for each field)`.
    pub fn serialize(&self) -> String {
        let mut out = format!("{} ", self.fields.len());
        for field in &self.fields {
            out.push_str(&field.serialize());
        }
        out
    }

    /// Reads a field count, then that many fields, from a whitespace
    /// tokenized stream.
    pub fn deserialize(text: &str) -> Result<Tuple, QueryError> {
        let mut tokens = text.split_whitespace().map(str::to_string);
        let field_count: usize = parse_token(&next_token(&mut tokens)?)?;
        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            fields.push(Field::deserialize(&mut tokens)?);
        }
        Ok(Tuple::new(fields))
    }
}

/// Builds the engine's fixed schema: `(Int32 key, Int32 value, Float32
/// 132.04, String "buzzdb")`. The serialized length depends on the decimal
/// width of `key` and `value`; for two two-digit values it happens to be
/// 38 bytes, but no code relies on that width being fixed.
pub fn fixed_schema_tuple(key: i32, value: i32) -> Tuple {
    Tuple::new(vec![
        Field::int(key),
        Field::int(value),
        Field::float(132.04),
        Field::string("buzzdb"),
    ])
}
