use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Storage kind of a single record field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    /// Three packed `f32` components.
    Vec3F,
    /// Three packed `f64` components.
    Vec3D,
}

impl FieldKind {
    /// Width of the field in bytes.
    pub const fn width(&self) -> usize {
        match self {
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
            Self::Vec3F => 12,
            Self::Vec3D => 24,
        }
    }

    fn decode(&self, bytes: &[u8]) -> Value {
        let f32_at = |at: usize| f32::from_le_bytes(le4(&bytes[at..at + 4]));
        let f64_at = |at: usize| f64::from_le_bytes(le8(&bytes[at..at + 8]));
        match self {
            Self::I32 => Value::I32(i32::from_le_bytes(le4(bytes))),
            Self::U32 => Value::U32(u32::from_le_bytes(le4(bytes))),
            Self::I64 => Value::I64(i64::from_le_bytes(le8(bytes))),
            Self::U64 => Value::U64(u64::from_le_bytes(le8(bytes))),
            Self::F32 => Value::F32(f32_at(0)),
            Self::F64 => Value::F64(f64_at(0)),
            Self::Vec3F => Value::Vec3F([f32_at(0), f32_at(4), f32_at(8)]),
            Self::Vec3D => Value::Vec3D([f64_at(0), f64_at(8), f64_at(16)]),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Vec3F => "vec3f",
            Self::Vec3D => "vec3d",
        };
        f.write_str(name)
    }
}

fn le4(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

fn le8(bytes: &[u8]) -> [u8; 8] {
    [
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]
}

/// A decoded field value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Vec3F([f32; 3]),
    Vec3D([f64; 3]),
}

impl Value {
    /// The storage kind this value encodes as.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::I32(_) => FieldKind::I32,
            Self::U32(_) => FieldKind::U32,
            Self::I64(_) => FieldKind::I64,
            Self::U64(_) => FieldKind::U64,
            Self::F32(_) => FieldKind::F32,
            Self::F64(_) => FieldKind::F64,
            Self::Vec3F(_) => FieldKind::Vec3F,
            Self::Vec3D(_) => FieldKind::Vec3D,
        }
    }

    /// Integer view of a scalar integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I32(v) => Some(v as i64),
            Self::U32(v) => Some(v as i64),
            Self::I64(v) => Some(v),
            Self::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Floating-point view of any scalar value.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F32(v) => Some(v as f64),
            Self::F64(v) => Some(v),
            Self::Vec3F(_) | Self::Vec3D(_) => None,
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Vector view of a three-component value.
    pub fn as_vec3(&self) -> Option<[f64; 3]> {
        match *self {
            Self::Vec3F([x, y, z]) => Some([x as f64, y as f64, z as f64]),
            Self::Vec3D(v) => Some(v),
            _ => None,
        }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            Self::I32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::U32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::I64(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::U64(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::F32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::F64(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::Vec3F(v) => v.iter().for_each(|c| buf.extend_from_slice(&c.to_le_bytes())),
            Self::Vec3D(v) => v.iter().for_each(|c| buf.extend_from_slice(&c.to_le_bytes())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I32(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Vec3F([x, y, z]) => write!(f, "({x}, {y}, {z})"),
            Self::Vec3D([x, y, z]) => write!(f, "({x}, {y}, {z})"),
        }
    }
}

/// One named field of a record layout.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Field layout of a fixed-size POD record type.
///
/// Fields are packed in declaration order with no padding, little-endian.
/// A schema is the descriptor the materializer selects per collection by the
/// collection's declared type name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordSchema {
    pub type_name: String,
    pub fields: Vec<FieldDef>,
}

impl RecordSchema {
    pub fn new(type_name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    /// Size of one record in bytes.
    pub fn record_size(&self) -> usize {
        self.fields.iter().map(|f| f.kind.width()).sum()
    }

    /// Locate a field by name: `(byte offset, definition)`.
    pub fn field(&self, name: &str) -> Option<(usize, &FieldDef)> {
        let mut offset = 0;
        for field in &self.fields {
            if field.name == name {
                return Some((offset, field));
            }
            offset += field.kind.width();
        }
        None
    }

    /// Decode one field of a record.
    ///
    /// Returns `None` if the field does not exist or the record is shorter than
    /// this schema's record size.
    pub fn decode_field(&self, record: &[u8], name: &str) -> Option<Value> {
        if record.len() < self.record_size() {
            return None;
        }
        let (offset, field) = self.field(name)?;
        Some(field.kind.decode(&record[offset..offset + field.kind.width()]))
    }

    /// Decode every field of a record in declaration order.
    pub fn decode_all<'a>(&'a self, record: &'a [u8]) -> Result<Vec<(&'a str, Value)>, TypeError> {
        if record.len() != self.record_size() {
            return Err(TypeError::InvalidLength {
                expected: self.record_size(),
                actual: record.len(),
            });
        }
        let mut offset = 0;
        let mut out = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let width = field.kind.width();
            out.push((
                field.name.as_str(),
                field.kind.decode(&record[offset..offset + width]),
            ));
            offset += width;
        }
        Ok(out)
    }

    /// Encode one record; values must match the fields in count and kind.
    pub fn encode(&self, values: &[Value]) -> Result<Vec<u8>, TypeError> {
        let mut buf = Vec::with_capacity(self.record_size());
        self.encode_into(values, &mut buf)?;
        Ok(buf)
    }

    /// Append one encoded record to `buf`.
    pub fn encode_into(&self, values: &[Value], buf: &mut Vec<u8>) -> Result<(), TypeError> {
        if values.len() != self.fields.len() {
            return Err(TypeError::FieldCount {
                type_name: self.type_name.clone(),
                expected: self.fields.len(),
                actual: values.len(),
            });
        }
        for (field, value) in self.fields.iter().zip(values) {
            if field.kind != value.kind() {
                return Err(TypeError::FieldKind {
                    type_name: self.type_name.clone(),
                    field: field.name.clone(),
                    expected: field.kind.to_string(),
                    actual: value.kind().to_string(),
                });
            }
        }
        for value in values {
            value.encode_into(buf);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit_schema() -> RecordSchema {
        RecordSchema::new(
            "test::Hit",
            vec![
                FieldDef::new("cellID", FieldKind::U64),
                FieldDef::new("energy", FieldKind::F32),
                FieldDef::new("position", FieldKind::Vec3F),
                FieldDef::new("quality", FieldKind::I32),
            ],
        )
    }

    #[test]
    fn record_size_is_sum_of_widths() {
        assert_eq!(hit_schema().record_size(), 8 + 4 + 12 + 4);
    }

    #[test]
    fn field_offsets_follow_declaration_order() {
        let schema = hit_schema();
        assert_eq!(schema.field("cellID").unwrap().0, 0);
        assert_eq!(schema.field("energy").unwrap().0, 8);
        assert_eq!(schema.field("position").unwrap().0, 12);
        assert_eq!(schema.field("quality").unwrap().0, 24);
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn encode_then_decode_fields() {
        let schema = hit_schema();
        let record = schema
            .encode(&[
                Value::U64(0xdead_beef),
                Value::F32(1.5),
                Value::Vec3F([1.0, -2.0, 3.5]),
                Value::I32(-7),
            ])
            .unwrap();
        assert_eq!(record.len(), schema.record_size());
        assert_eq!(schema.decode_field(&record, "cellID"), Some(Value::U64(0xdead_beef)));
        assert_eq!(schema.decode_field(&record, "energy"), Some(Value::F32(1.5)));
        assert_eq!(
            schema.decode_field(&record, "position").and_then(|v| v.as_vec3()),
            Some([1.0, -2.0, 3.5])
        );
        assert_eq!(schema.decode_field(&record, "quality").and_then(|v| v.as_i64()), Some(-7));
    }

    #[test]
    fn encode_rejects_wrong_count() {
        let err = hit_schema().encode(&[Value::U64(1)]).unwrap_err();
        assert!(matches!(err, TypeError::FieldCount { expected: 4, actual: 1, .. }));
    }

    #[test]
    fn encode_rejects_wrong_kind() {
        let err = hit_schema()
            .encode(&[
                Value::U64(1),
                Value::F64(1.0),
                Value::Vec3F([0.0; 3]),
                Value::I32(0),
            ])
            .unwrap_err();
        match err {
            TypeError::FieldKind { field, expected, actual, .. } => {
                assert_eq!(field, "energy");
                assert_eq!(expected, "f32");
                assert_eq!(actual, "f64");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decode_field_on_short_record_is_none() {
        assert!(hit_schema().decode_field(&[0u8; 4], "cellID").is_none());
    }

    #[test]
    fn decode_all_checks_length() {
        let schema = hit_schema();
        assert!(schema.decode_all(&[0u8; 3]).is_err());
        let fields = schema.decode_all(&[0u8; 28]).unwrap();
        let names: Vec<&str> = fields.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["cellID", "energy", "position", "quality"]);
    }

    #[test]
    fn value_views() {
        assert_eq!(Value::U64(u64::MAX).as_i64(), None);
        assert_eq!(Value::I32(3).as_f64(), Some(3.0));
        assert_eq!(Value::Vec3D([1.0, 2.0, 3.0]).as_f64(), None);
        assert_eq!(Value::F32(1.0).as_vec3(), None);
    }
}
