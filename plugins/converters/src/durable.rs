use std::sync::Arc;

use hostbind_api::durable::{CustomTypes, DurableValue, EntityContext, OrchestrationContext};
use hostbind_api::{
    ConvertError, Converter, Datum, DatumType, DatumValue, Native, NativeType, TriggerMetadata,
};
use serde_json::Value;

use crate::util::{require, unsupported_native};

const ORCHESTRATION: &str = "orchestrationTrigger";
const ENTITY: &str = "entityTrigger";
const ACTIVITY: &str = "activityTrigger";
const CLIENT: &str = "durableClient";

// ---------------------------------------------------------------------------
// Orchestration / entity: opaque context text in, return value out.
// ---------------------------------------------------------------------------

fn context_text(datum: Option<&Datum>, binding: &'static str) -> Result<String, ConvertError> {
    let datum = require(datum, binding)?;
    match (datum.datum_type(), datum.as_str()) {
        (DatumType::String | DatumType::Json, Some(text)) => Ok(text.to_string()),
        (other, _) => Err(ConvertError::unsupported_for_binding(binding, other)),
    }
}

fn encode_passthrough(value: Native, binding: &'static str) -> Result<Datum, ConvertError> {
    match value {
        Native::Str(s) => Ok(Datum::string(s)),
        Native::Bytes(b) => Ok(Datum::bytes(b)),
        Native::Json(v) => Ok(Datum::json_value(&v)),
        other => Err(unsupported_native(binding, &other)),
    }
}

#[derive(Debug, Default)]
pub struct OrchestrationTriggerConverter;

impl Converter for OrchestrationTriggerConverter {
    fn binding(&self) -> &'static str {
        ORCHESTRATION
    }

    fn trigger(&self) -> Option<&'static str> {
        Some(ORCHESTRATION)
    }

    fn has_implicit_output(&self) -> bool {
        true
    }

    fn check_input_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::OrchestrationContext)
    }

    fn check_output_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::Str | NativeType::Bytes | NativeType::Json)
    }

    fn decode(
        &self,
        datum: Option<&Datum>,
        _metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        let body = context_text(datum, ORCHESTRATION)?;
        Ok(Some(Native::Orchestration(OrchestrationContext::new(body))))
    }

    fn encode(&self, value: Native, _expected: Option<&NativeType>) -> Result<Datum, ConvertError> {
        encode_passthrough(value, ORCHESTRATION)
    }
}

#[derive(Debug, Default)]
pub struct EntityTriggerConverter;

impl Converter for EntityTriggerConverter {
    fn binding(&self) -> &'static str {
        ENTITY
    }

    fn trigger(&self) -> Option<&'static str> {
        Some(ENTITY)
    }

    fn has_implicit_output(&self) -> bool {
        true
    }

    fn check_input_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::EntityContext)
    }

    fn check_output_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::Str | NativeType::Bytes | NativeType::Json)
    }

    fn decode(
        &self,
        datum: Option<&Datum>,
        _metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        let body = context_text(datum, ENTITY)?;
        Ok(Some(Native::Entity(EntityContext::new(body))))
    }

    fn encode(&self, value: Native, _expected: Option<&NativeType>) -> Result<Datum, ConvertError> {
        encode_passthrough(value, ENTITY)
    }
}

// ---------------------------------------------------------------------------
// Custom-object payloads (activity and authentication-event triggers)
// ---------------------------------------------------------------------------

/// Lift a revived payload into the most specific native shape.
pub(crate) fn revived_native(value: DurableValue) -> Native {
    match value {
        DurableValue::Plain(v) => Native::Json(v),
        DurableValue::Custom(obj) => Native::Custom(obj),
        other => Native::Durable(other),
    }
}

/// Serialize a return value to JSON, writing custom objects in wire form.
///
/// Values with no JSON form fail with `MissingProtocolMethod { method: "to_json" }`.
pub(crate) fn wire_json(value: Native) -> Result<Value, ConvertError> {
    match value {
        Native::Json(v) => Ok(v),
        Native::Str(s) => Ok(Value::String(s)),
        Native::Int(i) => Ok(Value::from(i)),
        Native::Double(d) => Ok(Value::from(d)),
        Native::Custom(obj) => Ok(obj.to_json()),
        Native::Durable(v) => Ok(v.into_json()),
        Native::List(items) => items
            .into_iter()
            .map(wire_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Err(ConvertError::MissingProtocolMethod {
            type_name: other.type_name().to_string(),
            method: "to_json",
        }),
    }
}

/// `activityTrigger`: JSON input with custom objects revived.
///
/// Text that is not valid JSON is handed to the function unchanged.
#[derive(Debug, Clone, Default)]
pub struct ActivityTriggerConverter {
    types: Arc<CustomTypes>,
}

impl ActivityTriggerConverter {
    pub fn new(types: Arc<CustomTypes>) -> Self {
        Self { types }
    }
}

impl Converter for ActivityTriggerConverter {
    fn binding(&self) -> &'static str {
        ACTIVITY
    }

    fn trigger(&self) -> Option<&'static str> {
        Some(ACTIVITY)
    }

    fn has_implicit_output(&self) -> bool {
        true
    }

    // Activities accept any payload shape.
    fn check_input_type(&self, _ty: &NativeType) -> bool {
        true
    }

    fn check_output_type(&self, _ty: &NativeType) -> bool {
        true
    }

    fn decode(
        &self,
        datum: Option<&Datum>,
        _metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        let datum = require(datum, ACTIVITY)?;
        match (datum.datum_type(), datum.value()) {
            (DatumType::String | DatumType::Json, DatumValue::String(text)) => {
                match serde_json::from_str::<Value>(text) {
                    Ok(value) => Ok(Some(revived_native(DurableValue::revive(
                        value,
                        &self.types,
                    )?))),
                    Err(_) => Ok(Some(Native::Str(text.clone()))),
                }
            }
            (DatumType::Bytes, DatumValue::Bytes(b)) => Ok(Some(Native::Bytes(b.clone()))),
            (DatumType::Int, DatumValue::Int(i)) => Ok(Some(Native::Int(*i))),
            (DatumType::Double, DatumValue::Double(d)) => Ok(Some(Native::Double(*d))),
            (other, _) => Err(ConvertError::unsupported_for_binding(ACTIVITY, other)),
        }
    }

    fn encode(&self, value: Native, _expected: Option<&NativeType>) -> Result<Datum, ConvertError> {
        Ok(Datum::json_value(&wire_json(value)?))
    }
}

/// `durableClient`: the client configuration text, passed through.
#[derive(Debug, Default)]
pub struct DurableClientConverter;

impl Converter for DurableClientConverter {
    fn binding(&self) -> &'static str {
        CLIENT
    }

    fn check_input_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::Str | NativeType::Bytes | NativeType::Json)
    }

    fn check_output_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::Str | NativeType::Bytes | NativeType::Json)
    }

    fn decode(
        &self,
        datum: Option<&Datum>,
        _metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        let datum = require(datum, CLIENT)?;
        match (datum.datum_type(), datum.value()) {
            (DatumType::String | DatumType::Json, DatumValue::String(text)) => {
                Ok(Some(Native::Str(text.clone())))
            }
            (DatumType::Bytes, DatumValue::Bytes(b)) => Ok(Some(Native::Bytes(b.clone()))),
            (other, _) => Err(ConvertError::unsupported_for_binding(CLIENT, other)),
        }
    }

    fn encode(&self, value: Native, _expected: Option<&NativeType>) -> Result<Datum, ConvertError> {
        encode_passthrough(value, CLIENT)
    }
}
