use serde_json::{Map, Value};

/// A datum payload after type dispatch, before coercion to the caller's type.
#[derive(Debug, Clone, PartialEq)]
pub enum Typed {
    Json(Value),
    String(String),
    Int(i64),
    Double(f64),
    CollectionBytes(Vec<Vec<u8>>),
    CollectionString(Vec<String>),
    CollectionDouble(Vec<f64>),
    CollectionSint64(Vec<i64>),
}

impl Typed {
    /// Runtime type name used in coercion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Typed::Json(Value::Null) => "null",
            Typed::Json(Value::Bool(_)) => "bool",
            Typed::Json(Value::Number(n)) if n.is_f64() => "float",
            Typed::Json(Value::Number(_)) => "int",
            Typed::Json(Value::String(_)) | Typed::String(_) => "str",
            Typed::Json(Value::Array(_)) => "list",
            Typed::Json(Value::Object(_)) => "dict",
            Typed::Int(_) => "int",
            Typed::Double(_) => "float",
            Typed::CollectionBytes(_) => "collection_bytes",
            Typed::CollectionString(_) => "collection_string",
            Typed::CollectionDouble(_) => "collection_double",
            Typed::CollectionSint64(_) => "collection_sint64",
        }
    }

    fn into_json(self) -> Value {
        match self {
            Typed::Json(v) => v,
            Typed::String(s) => Value::String(s),
            Typed::Int(i) => Value::from(i),
            Typed::Double(d) => Value::from(d),
            Typed::CollectionBytes(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            Typed::CollectionString(items) => Value::from(items),
            Typed::CollectionDouble(items) => Value::from(items),
            Typed::CollectionSint64(items) => Value::from(items),
        }
    }
}

/// Target of typed decoding.
///
/// `coerce` accepts the value when it already has the target type and
/// otherwise attempts a conversion; `None` means the conversion failed.
pub trait Coerce: Sized {
    const TYPE_NAME: &'static str;

    fn coerce(value: Typed) -> Option<Self>;
}

impl Coerce for String {
    const TYPE_NAME: &'static str = "str";

    fn coerce(value: Typed) -> Option<Self> {
        match value {
            Typed::String(s) | Typed::Json(Value::String(s)) => Some(s),
            Typed::Int(i) => Some(i.to_string()),
            Typed::Double(d) => Some(d.to_string()),
            Typed::Json(Value::Null) => None,
            Typed::Json(other) => Some(other.to_string()),
            _ => None,
        }
    }
}

impl Coerce for i64 {
    const TYPE_NAME: &'static str = "int";

    fn coerce(value: Typed) -> Option<Self> {
        match value {
            Typed::Int(i) => Some(i),
            Typed::Double(d) if d.is_finite() => Some(d.trunc() as i64),
            Typed::Json(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
            Typed::Json(Value::Bool(b)) => Some(i64::from(b)),
            Typed::String(s) | Typed::Json(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl Coerce for f64 {
    const TYPE_NAME: &'static str = "float";

    fn coerce(value: Typed) -> Option<Self> {
        match value {
            Typed::Double(d) => Some(d),
            Typed::Int(i) => Some(i as f64),
            Typed::Json(Value::Number(n)) => n.as_f64(),
            Typed::String(s) | Typed::Json(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl Coerce for bool {
    const TYPE_NAME: &'static str = "bool";

    fn coerce(value: Typed) -> Option<Self> {
        match value {
            Typed::Json(Value::Bool(b)) => Some(b),
            Typed::Int(i) => Some(i != 0),
            Typed::String(s) | Typed::Json(Value::String(s)) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(true),
                    "false" => Some(false),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl Coerce for Map<String, Value> {
    const TYPE_NAME: &'static str = "dict";

    fn coerce(value: Typed) -> Option<Self> {
        match value {
            Typed::Json(Value::Object(map)) => Some(map),
            _ => None,
        }
    }
}

impl Coerce for Vec<Value> {
    const TYPE_NAME: &'static str = "list";

    fn coerce(value: Typed) -> Option<Self> {
        match value {
            Typed::Json(Value::Array(items)) => Some(items),
            Typed::Json(_) | Typed::String(_) | Typed::Int(_) | Typed::Double(_) => None,
            collection => match collection.into_json() {
                Value::Array(items) => Some(items),
                _ => None,
            },
        }
    }
}

impl Coerce for Vec<String> {
    const TYPE_NAME: &'static str = "list[str]";

    fn coerce(value: Typed) -> Option<Self> {
        match value {
            Typed::CollectionString(items) => Some(items),
            Typed::Json(Value::Array(items)) => items
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

/// Any decoded payload, as plain JSON.
impl Coerce for Value {
    const TYPE_NAME: &'static str = "any";

    fn coerce(value: Typed) -> Option<Self> {
        Some(value.into_json())
    }
}
