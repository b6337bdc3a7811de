//! Binding declarations: the metadata a function publishes about its bindings.
//!
//! Declarations are pure data. They name a binding kind but never touch the
//! converter that handles it; the registry is consulted separately when a
//! function is validated or invoked.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the output binding that receives a function's return value.
pub const RETURN_BINDING: &str = "$return";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BindingDirection {
    #[serde(alias = "in")]
    In,
    #[serde(alias = "out")]
    Out,
    #[serde(alias = "inout")]
    Inout,
}

impl BindingDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            BindingDirection::In => "IN",
            BindingDirection::Out => "OUT",
            BindingDirection::Inout => "INOUT",
        }
    }

    pub fn is_input(self) -> bool {
        matches!(self, BindingDirection::In | BindingDirection::Inout)
    }

    pub fn is_output(self) -> bool {
        matches!(self, BindingDirection::Out | BindingDirection::Inout)
    }
}

/// Payload hint passed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    #[serde(alias = "undefined")]
    Undefined,
    #[serde(alias = "string")]
    String,
    #[serde(alias = "binary")]
    Binary,
    #[serde(alias = "stream")]
    Stream,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Undefined => "UNDEFINED",
            DataType::String => "STRING",
            DataType::Binary => "BINARY",
            DataType::Stream => "STREAM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingRole {
    Trigger,
    Input,
    Output,
}

/// One declared binding of a function.
///
/// Settings are stored under camelCase keys; snake_case keys are converted
/// on insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    name: String,
    binding_type: String,
    role: BindingRole,
    direction: BindingDirection,
    data_type: Option<DataType>,
    settings: Map<String, Value>,
}

impl Binding {
    pub fn new(
        binding_type: impl Into<String>,
        name: impl Into<String>,
        role: BindingRole,
        direction: BindingDirection,
    ) -> Self {
        Self {
            name: name.into(),
            binding_type: binding_type.into(),
            role,
            direction,
            data_type: None,
            settings: Map::new(),
        }
    }

    pub fn trigger(binding_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(binding_type, name, BindingRole::Trigger, BindingDirection::In)
    }

    pub fn input(binding_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(binding_type, name, BindingRole::Input, BindingDirection::In)
    }

    pub fn output(binding_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(binding_type, name, BindingRole::Output, BindingDirection::Out)
    }

    pub fn with_direction(mut self, direction: BindingDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn with_setting(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Insert a binding-specific setting. `None`-like values are kept until serialization.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.settings.insert(snake_to_camel(key), value.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binding_type(&self) -> &str {
        &self.binding_type
    }

    pub fn role(&self) -> BindingRole {
        self.role
    }

    pub fn is_trigger(&self) -> bool {
        self.role == BindingRole::Trigger
    }

    pub fn direction(&self) -> BindingDirection {
        self.direction
    }

    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }

    /// Setting by snake_case or camelCase key.
    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(&snake_to_camel(key))
    }

    /// Manifest entry: the fixed fields plus settings, nulls stripped.
    pub fn dict_repr(&self) -> Value {
        let mut repr = Map::new();
        repr.insert("direction".into(), Value::from(self.direction.as_str()));
        repr.insert(
            "dataType".into(),
            self.data_type.map_or(Value::Null, |t| Value::from(t.as_str())),
        );
        repr.insert("type".into(), Value::from(self.binding_type.clone()));
        repr.insert("name".into(), Value::from(self.name.clone()));
        for (k, v) in &self.settings {
            repr.entry(k.clone()).or_insert_with(|| v.clone());
        }
        strip_nulls(Value::Object(repr))
    }

    pub fn to_json(&self) -> String {
        self.dict_repr().to_string()
    }
}

/// `connection_string_setting` → `connectionStringSetting`. camelCase input passes through.
pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, part) in key.split('_').filter(|p| !p.is_empty()).enumerate() {
        if i == 0 {
            out.push_str(part);
            continue;
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Drop `null` object entries and array elements, recursively.
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(strip_nulls)
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn converts_keys_mechanically() {
        assert_eq!(snake_to_camel("connection_string_setting"), "connectionStringSetting");
        assert_eq!(snake_to_camel("path"), "path");
        assert_eq!(snake_to_camel("queueName"), "queueName");
        assert_eq!(snake_to_camel("event_hub_name"), "eventHubName");
    }

    #[test]
    fn dict_repr_strips_nulls() {
        let binding = Binding::input("blob", "doc")
            .with_setting("path", "in/{name}")
            .with_setting("connection", Value::Null)
            .with_setting("extra", json!({"a": null, "b": [1, null]}));
        assert_eq!(
            binding.dict_repr(),
            json!({
                "direction": "IN",
                "type": "blob",
                "name": "doc",
                "path": "in/{name}",
                "extra": {"b": [1]}
            })
        );
    }

    #[test]
    fn enums_use_upper_case_names() {
        let binding = Binding::output("queue", "msg")
            .with_direction(BindingDirection::Inout)
            .with_data_type(DataType::Binary);
        let repr = binding.dict_repr();
        assert_eq!(repr["direction"], "INOUT");
        assert_eq!(repr["dataType"], "BINARY");
        let parsed: BindingDirection = serde_json::from_str("\"out\"").unwrap();
        assert_eq!(parsed, BindingDirection::Out);
    }

    #[test]
    fn settings_cannot_shadow_fixed_fields() {
        let binding = Binding::trigger("httpTrigger", "req").with_setting("type", "other");
        assert_eq!(binding.dict_repr()["type"], "httpTrigger");
        assert_eq!(binding.setting("type"), Some(&json!("other")));
    }
}
