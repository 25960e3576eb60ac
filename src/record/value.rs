/// Attribute data types, numbered to match the on-disk encoding in the
/// table-0 schema header: `0=int, 1=string, 2=float, 3=bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum DataType {
    Int = 0,
    String = 1,
    Float = 2,
    Bool = 3,
}

impl DataType {
    /// Decodes a data type tag read off page 0. An out-of-range value means
    /// the schema page is corrupt — not a condition this crate's error
    /// taxonomy models, so this panics, matching the original's own
    /// `assert(!"INVALID DATATYPE")`.
    pub(crate) fn from_i32(v: i32) -> Self {
        match v {
            0 => DataType::Int,
            1 => DataType::String,
            2 => DataType::Float,
            3 => DataType::Bool,
            other => panic!("corrupt schema page: unknown data type tag {other}"),
        }
    }
}

/// A typed attribute value, read or written via `Schema::get_attr`/`set_attr`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Bool(_) => DataType::Bool,
            Value::Str(_) => DataType::String,
        }
    }
}
