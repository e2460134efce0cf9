//! Feature values and array payloads

use crate::core::error::{GraphError, Result};
use crate::types::ids::FsId;
use crate::types::type_system::{ArrayKind, PrimitiveKind};
use std::sync::Arc;

/// Value stored in a feature slot
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    /// Unset string or reference
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// 8-bit signed integer
    Byte(i8),
    /// 16-bit signed integer
    Short(i16),
    /// 32-bit signed integer
    Integer(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// String value
    String(Arc<str>),
    /// Reference to another record of the same graph
    Ref(FsId),
}

impl Value {
    /// Initial value of a feature with the given range
    pub fn default_for(kind: Option<PrimitiveKind>) -> Self {
        match kind {
            Some(PrimitiveKind::Boolean) => Value::Boolean(false),
            Some(PrimitiveKind::Byte) => Value::Byte(0),
            Some(PrimitiveKind::Short) => Value::Short(0),
            Some(PrimitiveKind::Integer) => Value::Integer(0),
            Some(PrimitiveKind::Long) => Value::Long(0),
            Some(PrimitiveKind::Float) => Value::Float(0.0),
            Some(PrimitiveKind::Double) => Value::Double(0.0),
            Some(PrimitiveKind::String) | None => Value::Null,
        }
    }

    /// Short name of the value kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Integer(_) => "integer",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Ref(_) => "reference",
        }
    }

    /// True if the value fits a primitive range without conversion
    pub fn matches_primitive(&self, kind: PrimitiveKind) -> bool {
        matches!(
            (kind, self),
            (PrimitiveKind::Boolean, Value::Boolean(_))
                | (PrimitiveKind::Byte, Value::Byte(_))
                | (PrimitiveKind::Short, Value::Short(_))
                | (PrimitiveKind::Integer, Value::Integer(_))
                | (PrimitiveKind::Long, Value::Long(_))
                | (PrimitiveKind::Float, Value::Float(_))
                | (PrimitiveKind::Double, Value::Double(_))
                | (PrimitiveKind::String, Value::String(_) | Value::Null)
        )
    }

    /// True for [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral payload widened to `i64`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(*v as i64),
            Value::Short(v) => Some(*v as i64),
            Value::Integer(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// `Integer` payload
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Floating payload widened to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Referenced record
    pub fn as_fs(&self) -> Option<FsId> {
        match self {
            Value::Ref(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Byte(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Short(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<FsId> for Value {
    fn from(v: FsId) -> Self {
        Value::Ref(v)
    }
}

impl From<Option<FsId>> for Value {
    fn from(v: Option<FsId>) -> Self {
        v.map_or(Value::Null, Value::Ref)
    }
}

/// Element storage of an array record
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayData {
    /// `uima.cas.FSArray`
    Fs(Vec<Option<FsId>>),
    /// `uima.cas.BooleanArray`
    Boolean(Vec<bool>),
    /// `uima.cas.ByteArray`
    Byte(Vec<i8>),
    /// `uima.cas.ShortArray`
    Short(Vec<i16>),
    /// `uima.cas.IntegerArray`
    Integer(Vec<i32>),
    /// `uima.cas.LongArray`
    Long(Vec<i64>),
    /// `uima.cas.FloatArray`
    Float(Vec<f32>),
    /// `uima.cas.DoubleArray`
    Double(Vec<f64>),
    /// `uima.cas.StringArray`
    String(Vec<Option<Arc<str>>>),
}

impl ArrayData {
    /// Array of `len` default elements
    pub fn new(kind: ArrayKind, len: usize) -> Self {
        match kind {
            ArrayKind::Fs => ArrayData::Fs(vec![None; len]),
            ArrayKind::Boolean => ArrayData::Boolean(vec![false; len]),
            ArrayKind::Byte => ArrayData::Byte(vec![0; len]),
            ArrayKind::Short => ArrayData::Short(vec![0; len]),
            ArrayKind::Integer => ArrayData::Integer(vec![0; len]),
            ArrayKind::Long => ArrayData::Long(vec![0; len]),
            ArrayKind::Float => ArrayData::Float(vec![0.0; len]),
            ArrayKind::Double => ArrayData::Double(vec![0.0; len]),
            ArrayKind::String => ArrayData::String(vec![None; len]),
        }
    }

    /// Element kind
    pub fn kind(&self) -> ArrayKind {
        match self {
            ArrayData::Fs(_) => ArrayKind::Fs,
            ArrayData::Boolean(_) => ArrayKind::Boolean,
            ArrayData::Byte(_) => ArrayKind::Byte,
            ArrayData::Short(_) => ArrayKind::Short,
            ArrayData::Integer(_) => ArrayKind::Integer,
            ArrayData::Long(_) => ArrayKind::Long,
            ArrayData::Float(_) => ArrayKind::Float,
            ArrayData::Double(_) => ArrayKind::Double,
            ArrayData::String(_) => ArrayKind::String,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Fs(v) => v.len(),
            ArrayData::Boolean(v) => v.len(),
            ArrayData::Byte(v) => v.len(),
            ArrayData::Short(v) => v.len(),
            ArrayData::Integer(v) => v.len(),
            ArrayData::Long(v) => v.len(),
            ArrayData::Float(v) => v.len(),
            ArrayData::Double(v) => v.len(),
            ArrayData::String(v) => v.len(),
        }
    }

    /// True if the array has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index` as a [`Value`]
    pub fn get(&self, index: usize) -> Option<Value> {
        Some(match self {
            ArrayData::Fs(v) => Value::from(*v.get(index)?),
            ArrayData::Boolean(v) => Value::Boolean(*v.get(index)?),
            ArrayData::Byte(v) => Value::Byte(*v.get(index)?),
            ArrayData::Short(v) => Value::Short(*v.get(index)?),
            ArrayData::Integer(v) => Value::Integer(*v.get(index)?),
            ArrayData::Long(v) => Value::Long(*v.get(index)?),
            ArrayData::Float(v) => Value::Float(*v.get(index)?),
            ArrayData::Double(v) => Value::Double(*v.get(index)?),
            ArrayData::String(v) => v.get(index)?.clone().map_or(Value::Null, Value::String),
        })
    }

    /// Overwrite the element at `index`.
    ///
    /// Reference targets are not checked here; the owning graph does that.
    pub fn set(&mut self, index: usize, value: Value) -> Result<()> {
        let length = self.len();
        if index >= length {
            return Err(GraphError::IndexOutOfBounds { index, length }.into());
        }
        match (self, value) {
            (ArrayData::Fs(v), Value::Ref(id)) => v[index] = Some(id),
            (ArrayData::Fs(v), Value::Null) => v[index] = None,
            (ArrayData::Boolean(v), Value::Boolean(x)) => v[index] = x,
            (ArrayData::Byte(v), Value::Byte(x)) => v[index] = x,
            (ArrayData::Short(v), Value::Short(x)) => v[index] = x,
            (ArrayData::Integer(v), Value::Integer(x)) => v[index] = x,
            (ArrayData::Long(v), Value::Long(x)) => v[index] = x,
            (ArrayData::Float(v), Value::Float(x)) => v[index] = x,
            (ArrayData::Double(v), Value::Double(x)) => v[index] = x,
            (ArrayData::String(v), Value::String(x)) => v[index] = Some(x),
            (ArrayData::String(v), Value::Null) => v[index] = None,
            (data, value) => {
                return Err(GraphError::TypeMismatch {
                    feature: format!("[{}]", index),
                    expected: array_element_name(data.kind()).to_string(),
                    actual: value.kind_name().to_string(),
                }
                .into())
            }
        }
        Ok(())
    }

    /// Referenced records, in element order, skipping nulls
    pub fn references(&self) -> impl Iterator<Item = FsId> + '_ {
        let refs: &[Option<FsId>] = match self {
            ArrayData::Fs(v) => v,
            _ => &[],
        };
        refs.iter().flatten().copied()
    }
}

/// Element kind name used in error messages
pub fn array_element_name(kind: ArrayKind) -> &'static str {
    match kind {
        ArrayKind::Fs => "reference",
        ArrayKind::Boolean => "boolean",
        ArrayKind::Byte => "byte",
        ArrayKind::Short => "short",
        ArrayKind::Integer => "integer",
        ArrayKind::Long => "long",
        ArrayKind::Float => "float",
        ArrayKind::Double => "double",
        ArrayKind::String => "string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;

    #[test]
    fn test_defaults_by_range() {
        assert_eq!(Value::default_for(Some(PrimitiveKind::Integer)), Value::Integer(0));
        assert_eq!(Value::default_for(Some(PrimitiveKind::Boolean)), Value::Boolean(false));
        assert_eq!(Value::default_for(Some(PrimitiveKind::String)), Value::Null);
        assert_eq!(Value::default_for(None), Value::Null);
    }

    #[test]
    fn test_primitive_matching() {
        assert!(Value::from(3i32).matches_primitive(PrimitiveKind::Integer));
        assert!(!Value::from(3i64).matches_primitive(PrimitiveKind::Integer));
        assert!(Value::Null.matches_primitive(PrimitiveKind::String));
        assert!(!Value::Null.matches_primitive(PrimitiveKind::Double));
    }

    #[test]
    fn test_array_set_and_get() {
        let mut data = ArrayData::new(ArrayKind::String, 2);
        data.set(1, Value::from("x")).unwrap();
        assert_eq!(data.get(0), Some(Value::Null));
        assert_eq!(data.get(1), Some(Value::from("x")));
        assert_eq!(data.get(2), None);

        assert!(matches!(
            data.set(2, Value::Null),
            Err(Error::Graph(GraphError::IndexOutOfBounds { index: 2, length: 2 }))
        ));
        assert!(matches!(
            data.set(0, Value::Integer(1)),
            Err(Error::Graph(GraphError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn test_fs_array_references() {
        let mut data = ArrayData::new(ArrayKind::Fs, 3);
        data.set(0, Value::Ref(FsId(4))).unwrap();
        data.set(2, Value::Ref(FsId(2))).unwrap();
        let refs: Vec<FsId> = data.references().collect();
        assert_eq!(refs, vec![FsId(4), FsId(2)]);
        assert!(ArrayData::new(ArrayKind::Integer, 1).references().next().is_none());
    }
}
