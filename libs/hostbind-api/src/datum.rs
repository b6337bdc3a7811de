use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Per-invocation metadata the host sends alongside a trigger payload.
///
/// Keys are host-defined field names (`"EnqueuedTimeUtc"`, `"PartitionKey"`, ...).
pub type TriggerMetadata = HashMap<String, Datum>;

/// Type discriminator of a [`Datum`].
///
/// Unknown discriminators survive as `Other` so converters can name them
/// when they reject the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DatumType {
    String,
    Bytes,
    Json,
    Int,
    Double,
    Http,
    CollectionBytes,
    CollectionString,
    CollectionDouble,
    CollectionSint64,
    ModelBindingData,
    Other(String),
}

impl DatumType {
    pub fn as_str(&self) -> &str {
        match self {
            DatumType::String => "string",
            DatumType::Bytes => "bytes",
            DatumType::Json => "json",
            DatumType::Int => "int",
            DatumType::Double => "double",
            DatumType::Http => "http",
            DatumType::CollectionBytes => "collection_bytes",
            DatumType::CollectionString => "collection_string",
            DatumType::CollectionDouble => "collection_double",
            DatumType::CollectionSint64 => "collection_sint64",
            DatumType::ModelBindingData => "model_binding_data",
            DatumType::Other(name) => name,
        }
    }
}

impl From<&str> for DatumType {
    fn from(s: &str) -> Self {
        match s {
            "string" => DatumType::String,
            "bytes" => DatumType::Bytes,
            "json" => DatumType::Json,
            "int" => DatumType::Int,
            "double" => DatumType::Double,
            "http" => DatumType::Http,
            "collection_bytes" => DatumType::CollectionBytes,
            "collection_string" => DatumType::CollectionString,
            "collection_double" => DatumType::CollectionDouble,
            "collection_sint64" => DatumType::CollectionSint64,
            "model_binding_data" => DatumType::ModelBindingData,
            other => DatumType::Other(other.to_string()),
        }
    }
}

impl From<String> for DatumType {
    fn from(s: String) -> Self {
        DatumType::from(s.as_str())
    }
}

impl From<DatumType> for String {
    fn from(t: DatumType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for DatumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload carried by a [`Datum`].
///
/// `json` datums carry their JSON text in `String`. `http` datums carry a
/// nested field map.
#[derive(Debug, Clone)]
pub enum DatumValue {
    String(String),
    Bytes(Vec<u8>),
    Int(i64),
    Double(f64),
    Fields(BTreeMap<String, Datum>),
    CollectionBytes(Vec<Vec<u8>>),
    CollectionString(Vec<String>),
    CollectionDouble(Vec<f64>),
    CollectionSint64(Vec<i64>),
}

impl DatumValue {
    fn tag(&self) -> u8 {
        match self {
            DatumValue::String(_) => 0,
            DatumValue::Bytes(_) => 1,
            DatumValue::Int(_) => 2,
            DatumValue::Double(_) => 3,
            DatumValue::Fields(_) => 4,
            DatumValue::CollectionBytes(_) => 5,
            DatumValue::CollectionString(_) => 6,
            DatumValue::CollectionDouble(_) => 7,
            DatumValue::CollectionSint64(_) => 8,
        }
    }
}

// Doubles compare by bit pattern so that equality and hashing agree.
impl PartialEq for DatumValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DatumValue::String(a), DatumValue::String(b)) => a == b,
            (DatumValue::Bytes(a), DatumValue::Bytes(b)) => a == b,
            (DatumValue::Int(a), DatumValue::Int(b)) => a == b,
            (DatumValue::Double(a), DatumValue::Double(b)) => a.to_bits() == b.to_bits(),
            (DatumValue::Fields(a), DatumValue::Fields(b)) => a == b,
            (DatumValue::CollectionBytes(a), DatumValue::CollectionBytes(b)) => a == b,
            (DatumValue::CollectionString(a), DatumValue::CollectionString(b)) => a == b,
            (DatumValue::CollectionDouble(a), DatumValue::CollectionDouble(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (DatumValue::CollectionSint64(a), DatumValue::CollectionSint64(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for DatumValue {}

impl Hash for DatumValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag().hash(state);
        match self {
            DatumValue::String(s) => s.hash(state),
            DatumValue::Bytes(b) => b.hash(state),
            DatumValue::Int(i) => i.hash(state),
            DatumValue::Double(d) => d.to_bits().hash(state),
            DatumValue::Fields(fields) => fields.hash(state),
            DatumValue::CollectionBytes(v) => v.hash(state),
            DatumValue::CollectionString(v) => v.hash(state),
            DatumValue::CollectionDouble(v) => {
                for d in v {
                    d.to_bits().hash(state);
                }
            }
            DatumValue::CollectionSint64(v) => v.hash(state),
        }
    }
}

/// Typed wire value exchanged with the host.
///
/// Immutable once built. Two datums are equal only when both the type
/// discriminator and the payload match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Datum {
    value: DatumValue,
    datum_type: DatumType,
}

impl Datum {
    pub fn new(value: DatumValue, datum_type: impl Into<DatumType>) -> Self {
        Self {
            value,
            datum_type: datum_type.into(),
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::new(DatumValue::String(s.into()), DatumType::String)
    }

    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Self::new(DatumValue::Bytes(b.into()), DatumType::Bytes)
    }

    /// JSON datum from already-serialized JSON text.
    pub fn json(text: impl Into<String>) -> Self {
        Self::new(DatumValue::String(text.into()), DatumType::Json)
    }

    pub fn json_value(value: &serde_json::Value) -> Self {
        Self::json(value.to_string())
    }

    pub fn int(i: i64) -> Self {
        Self::new(DatumValue::Int(i), DatumType::Int)
    }

    pub fn double(d: f64) -> Self {
        Self::new(DatumValue::Double(d), DatumType::Double)
    }

    pub fn http(fields: BTreeMap<String, Datum>) -> Self {
        Self::new(DatumValue::Fields(fields), DatumType::Http)
    }

    pub fn collection_bytes(items: Vec<Vec<u8>>) -> Self {
        Self::new(DatumValue::CollectionBytes(items), DatumType::CollectionBytes)
    }

    pub fn collection_string(items: Vec<String>) -> Self {
        Self::new(DatumValue::CollectionString(items), DatumType::CollectionString)
    }

    pub fn collection_sint64(items: Vec<i64>) -> Self {
        Self::new(DatumValue::CollectionSint64(items), DatumType::CollectionSint64)
    }

    pub fn collection_double(items: Vec<f64>) -> Self {
        Self::new(DatumValue::CollectionDouble(items), DatumType::CollectionDouble)
    }

    pub fn datum_type(&self) -> &DatumType {
        &self.datum_type
    }

    pub fn value(&self) -> &DatumValue {
        &self.value
    }

    pub fn into_value(self) -> DatumValue {
        self.value
    }

    /// Text payload (`string` and `json` datums).
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            DatumValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Payload as raw bytes: binary payloads verbatim, text payloads as UTF-8.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.value {
            DatumValue::Bytes(b) => Some(b),
            DatumValue::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn fields(&self) -> Option<&BTreeMap<String, Datum>> {
        match &self.value {
            DatumValue::Fields(f) => Some(f),
            _ => None,
        }
    }

    /// Plain JSON view of the datum, used by lazily materialized metadata maps.
    ///
    /// `json` text that fails to parse is kept as a JSON string. Bytes
    /// become an array of numbers.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match (&self.datum_type, &self.value) {
            (DatumType::Json, DatumValue::String(text)) => {
                serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
            }
            (_, DatumValue::String(s)) => Value::String(s.clone()),
            (_, DatumValue::Bytes(b)) => Value::from(b.clone()),
            (_, DatumValue::Int(i)) => Value::from(*i),
            (_, DatumValue::Double(d)) => Value::from(*d),
            (_, DatumValue::Fields(fields)) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            (_, DatumValue::CollectionBytes(items)) => {
                Value::Array(items.iter().map(|b| Value::from(b.clone())).collect())
            }
            (_, DatumValue::CollectionString(items)) => Value::from(items.clone()),
            (_, DatumValue::CollectionDouble(items)) => Value::from(items.clone()),
            (_, DatumValue::CollectionSint64(items)) => Value::from(items.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn equality_covers_type_and_value() {
        assert_eq!(Datum::string("a"), Datum::string("a"));
        assert_ne!(Datum::string("{}"), Datum::json("{}"));
        assert_ne!(Datum::int(1), Datum::int(2));
    }

    #[test]
    fn hashing_is_structural() {
        let mut set = HashSet::new();
        set.insert(Datum::double(1.5));
        set.insert(Datum::double(1.5));
        set.insert(Datum::json("1.5"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn unknown_type_round_trips_its_name() {
        let t = DatumType::from("xml");
        assert_eq!(t, DatumType::Other("xml".into()));
        assert_eq!(t.to_string(), "xml");
        assert_eq!(DatumType::from("collection_bytes"), DatumType::CollectionBytes);
    }

    #[test]
    fn json_view_parses_json_text() {
        let d = Datum::json(r#"{"a": [1, 2]}"#);
        assert_eq!(d.to_json(), serde_json::json!({"a": [1, 2]}));
        assert_eq!(Datum::json("not json").to_json(), serde_json::json!("not json"));
        assert_eq!(Datum::int(7).to_json(), serde_json::json!(7));
    }
}
