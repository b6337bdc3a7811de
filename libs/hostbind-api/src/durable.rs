//! Durable-function payloads and the custom object round-trip protocol.
//!
//! A custom object travels through JSON as
//! `{"__class__": <class>, "__module__": <module>, "__data__": <to_wire text>}`.
//! Only types registered in a [`CustomTypes`] table can be revived.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::ConvertError;

pub const CLASS_KEY: &str = "__class__";
pub const MODULE_KEY: &str = "__module__";
pub const DATA_KEY: &str = "__data__";

/// Orchestration history handed to an `orchestrationTrigger` function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrchestrationContext {
    body: String,
}

impl OrchestrationContext {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Entity operation batch handed to an `entityTrigger` function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityContext {
    body: String,
}

impl EntityContext {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// A user type that can cross the boundary inside a JSON payload.
pub trait Serializable: fmt::Debug + Send + Sync + Sized + 'static {
    const CLASS: &'static str;
    const MODULE: &'static str;

    fn to_wire(&self) -> String;

    fn from_wire(data: &str) -> Result<Self, ConvertError>;
}

/// Object-safe view of a [`Serializable`] value.
pub trait WireObject: fmt::Debug + Send + Sync {
    fn class(&self) -> &'static str;
    fn module(&self) -> &'static str;
    fn to_wire(&self) -> String;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Serializable> WireObject for T {
    fn class(&self) -> &'static str {
        T::CLASS
    }

    fn module(&self) -> &'static str {
        T::MODULE
    }

    fn to_wire(&self) -> String {
        Serializable::to_wire(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A revived (or about-to-be-serialized) custom object.
#[derive(Debug, Clone)]
pub struct CustomObject(Arc<dyn WireObject>);

impl CustomObject {
    pub fn new<T: Serializable>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn type_name(&self) -> String {
        format!("{}.{}", self.0.module(), self.0.class())
    }

    pub fn downcast_ref<T: Serializable>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(CLASS_KEY.into(), Value::from(self.0.class()));
        map.insert(MODULE_KEY.into(), Value::from(self.0.module()));
        map.insert(DATA_KEY.into(), Value::from(self.0.to_wire()));
        Value::Object(map)
    }
}

impl PartialEq for CustomObject {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name() && self.0.to_wire() == other.0.to_wire()
    }
}

type Reviver = Box<dyn Fn(&str) -> Result<CustomObject, ConvertError> + Send + Sync>;

/// Explicit table of revivable custom types, keyed by `(module, class)`.
#[derive(Default)]
pub struct CustomTypes {
    revivers: HashMap<(String, String), Reviver>,
}

impl fmt::Debug for CustomTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self
            .revivers
            .keys()
            .map(|(m, c)| format!("{m}.{c}"))
            .collect();
        names.sort();
        f.debug_struct("CustomTypes").field("types", &names).finish()
    }
}

impl CustomTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Serializable>(&mut self) -> &mut Self {
        self.revivers.insert(
            (T::MODULE.to_string(), T::CLASS.to_string()),
            Box::new(|data: &str| T::from_wire(data).map(CustomObject::new)),
        );
        self
    }

    pub fn with<T: Serializable>(mut self) -> Self {
        self.register::<T>();
        self
    }

    pub fn contains(&self, module: &str, class: &str) -> bool {
        self.revivers
            .contains_key(&(module.to_string(), class.to_string()))
    }

    fn revive(&self, module: &str, class: &str, data: &str) -> Result<CustomObject, ConvertError> {
        match self.revivers.get(&(module.to_string(), class.to_string())) {
            Some(reviver) => reviver(data),
            None => Err(ConvertError::MissingProtocolMethod {
                type_name: format!("{module}.{class}"),
                method: "from_json",
            }),
        }
    }
}

/// JSON payload of activity and authentication-event triggers, with custom
/// objects revived wherever they appear.
#[derive(Debug, Clone, PartialEq)]
pub enum DurableValue {
    /// A subtree that contains no custom objects.
    Plain(Value),
    Custom(CustomObject),
    List(Vec<DurableValue>),
    Map(BTreeMap<String, DurableValue>),
}

impl DurableValue {
    /// Decode `value`, reviving every mapping that carries the three reserved keys.
    pub fn revive(value: Value, types: &CustomTypes) -> Result<Self, ConvertError> {
        match value {
            Value::Object(map) => {
                if let Some((class, module, data)) = custom_marker(&map) {
                    return types.revive(&module, &class, &data).map(DurableValue::Custom);
                }
                let mut children = BTreeMap::new();
                for (k, v) in map {
                    children.insert(k, DurableValue::revive(v, types)?);
                }
                if children.values().all(DurableValue::is_plain) {
                    Ok(DurableValue::Plain(Value::Object(
                        children
                            .into_iter()
                            .map(|(k, v)| (k, v.into_json()))
                            .collect(),
                    )))
                } else {
                    Ok(DurableValue::Map(children))
                }
            }
            Value::Array(items) => {
                let children = items
                    .into_iter()
                    .map(|v| DurableValue::revive(v, types))
                    .collect::<Result<Vec<_>, _>>()?;
                if children.iter().all(DurableValue::is_plain) {
                    Ok(DurableValue::Plain(Value::Array(
                        children.into_iter().map(DurableValue::into_json).collect(),
                    )))
                } else {
                    Ok(DurableValue::List(children))
                }
            }
            other => Ok(DurableValue::Plain(other)),
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, DurableValue::Plain(_))
    }

    /// Serialize back to JSON, writing custom objects in their reserved-key form.
    pub fn into_json(self) -> Value {
        match self {
            DurableValue::Plain(v) => v,
            DurableValue::Custom(obj) => obj.to_json(),
            DurableValue::List(items) => {
                Value::Array(items.into_iter().map(DurableValue::into_json).collect())
            }
            DurableValue::Map(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.into_json()))
                    .collect(),
            ),
        }
    }

    pub fn as_custom(&self) -> Option<&CustomObject> {
        match self {
            DurableValue::Custom(obj) => Some(obj),
            _ => None,
        }
    }
}

fn custom_marker(map: &Map<String, Value>) -> Option<(String, String, String)> {
    let class = map.get(CLASS_KEY)?.as_str()?;
    let module = map.get(MODULE_KEY)?.as_str()?;
    let data = match map.get(DATA_KEY)? {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Some((class.to_string(), module.to_string(), data))
}
