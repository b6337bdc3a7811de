use hostbind_api::decode::parse_datetime;
use hostbind_api::eventgrid::EventGridEvent;
use hostbind_api::{ConvertError, Converter, Datum, Native, NativeType, TriggerMetadata};
use serde_json::{Map, Value};

use crate::util::{body_json, require, unsupported_native};

const TRIGGER: &str = "eventGridTrigger";
const OUTPUT: &str = "eventGrid";

/// `eventGridTrigger`: one Event Grid schema event per invocation.
#[derive(Debug, Default)]
pub struct EventGridEventInConverter;

impl Converter for EventGridEventInConverter {
    fn binding(&self) -> &'static str {
        TRIGGER
    }

    fn trigger(&self) -> Option<&'static str> {
        Some(TRIGGER)
    }

    fn check_input_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::EventGridEvent)
    }

    fn decode(
        &self,
        datum: Option<&Datum>,
        _metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        let datum = require(datum, TRIGGER)?;
        let Value::Object(mut event) = body_json(datum, TRIGGER)? else {
            return Err(ConvertError::invalid(TRIGGER, "event must be a JSON object"));
        };

        let event_time = match event.get("eventTime").and_then(Value::as_str) {
            Some(text) => Some(parse_datetime(text)?),
            None => None,
        };
        Ok(Some(Native::EventGridEvent(EventGridEvent {
            id: text_field(&event, "id"),
            data: event.remove("data").unwrap_or(Value::Null),
            topic: event.get("topic").and_then(Value::as_str).map(str::to_string),
            subject: text_field(&event, "subject"),
            event_type: text_field(&event, "eventType"),
            event_time,
            data_version: text_field(&event, "dataVersion"),
        })))
    }
}

fn text_field(event: &Map<String, Value>, key: &str) -> String {
    event
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// `eventGrid` output: raw text or bytes, one event, or a list of events.
#[derive(Debug, Default)]
pub struct EventGridEventOutConverter;

impl Converter for EventGridEventOutConverter {
    fn binding(&self) -> &'static str {
        OUTPUT
    }

    fn check_output_type(&self, ty: &NativeType) -> bool {
        match ty {
            NativeType::Str | NativeType::Bytes | NativeType::EventGridEvent => true,
            NativeType::List(inner) => matches!(**inner, NativeType::EventGridEvent),
            _ => false,
        }
    }

    fn encode(&self, value: Native, _expected: Option<&NativeType>) -> Result<Datum, ConvertError> {
        match value {
            Native::Str(s) => Ok(Datum::string(s)),
            Native::Bytes(b) => Ok(Datum::bytes(b)),
            Native::EventGridEvent(event) => Ok(Datum::json_value(&event.to_output_json())),
            Native::EventGridEvents(events) => Ok(Datum::json_value(&Value::Array(
                events.iter().map(EventGridEvent::to_output_json).collect(),
            ))),
            Native::List(items) => {
                let events = items
                    .into_iter()
                    .map(|item| match item {
                        Native::EventGridEvent(event) => Ok(event.to_output_json()),
                        other => Err(unsupported_native(OUTPUT, &other)),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Datum::json_value(&Value::Array(events)))
            }
            other => Err(unsupported_native(OUTPUT, &other)),
        }
    }
}
