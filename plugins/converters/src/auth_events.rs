use std::sync::Arc;

use hostbind_api::durable::{CustomTypes, DurableValue};
use hostbind_api::{ConvertError, Converter, Datum, Native, NativeType, TriggerMetadata};

use crate::durable::{revived_native, wire_json};
use crate::util::{body_json, require};

const TRIGGER: &str = "authenticationEventsTrigger";

/// `authenticationEventsTrigger`: a JSON event in, the JSON response returned.
///
/// Same custom-object protocol as activities, but the payload must be JSON.
#[derive(Debug, Clone, Default)]
pub struct AuthenticationEventsTriggerConverter {
    types: Arc<CustomTypes>,
}

impl AuthenticationEventsTriggerConverter {
    pub fn new(types: Arc<CustomTypes>) -> Self {
        Self { types }
    }
}

impl Converter for AuthenticationEventsTriggerConverter {
    fn binding(&self) -> &'static str {
        TRIGGER
    }

    fn trigger(&self) -> Option<&'static str> {
        Some(TRIGGER)
    }

    fn has_implicit_output(&self) -> bool {
        true
    }

    fn check_input_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::Json | NativeType::Str | NativeType::Custom(_) | NativeType::Any)
    }

    fn check_output_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::Json | NativeType::Str | NativeType::Custom(_) | NativeType::Any)
    }

    fn decode(
        &self,
        datum: Option<&Datum>,
        _metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        let value = body_json(require(datum, TRIGGER)?, TRIGGER)?;
        Ok(Some(revived_native(DurableValue::revive(value, &self.types)?)))
    }

    fn encode(&self, value: Native, _expected: Option<&NativeType>) -> Result<Datum, ConvertError> {
        Ok(Datum::json_value(&wire_json(value)?))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_plain_events_as_json() {
        let conv = AuthenticationEventsTriggerConverter::default();
        let event = json!({"type": "onTokenIssuanceStartCustomExtension", "data": {"tenantId": "t"}});
        assert_eq!(
            conv.decode(Some(&Datum::json(event.to_string())), None).unwrap(),
            Some(Native::Json(event))
        );
        assert!(conv.has_implicit_output());
    }

    #[test]
    fn malformed_json_fails() {
        let err = AuthenticationEventsTriggerConverter::default()
            .decode(Some(&Datum::string("{oops")), None)
            .unwrap_err();
        assert!(matches!(err, ConvertError::Json { .. }));
    }

    #[test]
    fn nested_unknown_objects_fail_to_revive() {
        let payload = json!({
            "actions": [{"__class__": "Claims", "__module__": "ext", "__data__": "{}"}]
        });
        let err = AuthenticationEventsTriggerConverter::default()
            .decode(Some(&Datum::json(payload.to_string())), None)
            .unwrap_err();
        assert!(matches!(err, ConvertError::MissingProtocolMethod { .. }));
    }

    #[test]
    fn encodes_response_json() {
        let response = json!({"data": {"actions": []}});
        let datum = AuthenticationEventsTriggerConverter::default()
            .encode(Native::Json(response.clone()), None)
            .unwrap();
        assert_eq!(datum.to_json(), response);
    }
}
