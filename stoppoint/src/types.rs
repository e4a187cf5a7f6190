// Target-side type definitions
//
// Identifiers and descriptors the engine exchanges with the target collaborator

use serde::{Deserialize, Serialize};
use std::fmt;

// Object IDs are opaque 8-byte handles owned by the target
pub type ObjectId = u64;
pub type ThreadId = ObjectId;

pub type ReferenceTypeId = u64;
pub type MethodId = u64;
pub type FieldId = u64;

/// Identifier of a live event subscription inside the target
pub type RequestId = i32;

/// Kind of a loaded reference type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Interface,
    Array,
}

/// A type the target has loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub type_id: ReferenceTypeId,
    /// Fully-qualified, dot-separated name (e.g. `com.example.Foo$Inner`)
    pub name: String,
    pub kind: TypeKind,
    /// Class-prepare has completed for this type
    pub prepared: bool,
}

impl TypeInfo {
    pub fn class(type_id: ReferenceTypeId, name: impl Into<String>) -> Self {
        Self {
            type_id,
            name: name.into(),
            kind: TypeKind::Class,
            prepared: true,
        }
    }
}

// Location identifies a code position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub type_id: ReferenceTypeId,
    pub method_id: MethodId,
    pub index: u64, // bytecode index (PC)
    pub line: Option<u32>,
}

/// A method of a loaded type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub method_id: MethodId,
    pub name: String,
    pub argument_type_names: Vec<String>,
    /// First executable location, absent for native/abstract methods
    pub location: Option<Location>,
}

/// A field resolved inside the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub declaring_type: ReferenceTypeId,
    pub field_id: FieldId,
    pub name: String,
}

/// Thread reported alongside an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRef {
    pub id: ThreadId,
    pub name: String,
}

/// Thread and frame an expression is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameContext {
    pub thread: ThreadId,
    /// 0 = top of stack
    pub frame: u32,
}

// Value as produced by the expression evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Null,
    Void,
    Boolean(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Object { id: ObjectId, type_name: String },
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Void => write!(f, "(void)"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "'{}'", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "\"{}\"", v),
            Value::Object { id, type_name } => write!(f, "{} @{:x}", type_name, id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::String("hi".into()).to_string(), "\"hi\"");
        assert_eq!(
            Value::Object {
                id: 0xff,
                type_name: "java.lang.Thread".into()
            }
            .to_string(),
            "java.lang.Thread @ff"
        );
    }

    #[test]
    fn test_value_serde_tagged() {
        let json = serde_json::to_string(&Value::Long(7)).unwrap();
        assert_eq!(json, r#"{"type":"Long","value":7}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Long(7));
    }
}
