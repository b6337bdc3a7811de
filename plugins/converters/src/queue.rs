use hostbind_api::decode::{metadata_field, parse_datetime_metadata};
use hostbind_api::queue::QueueMessage;
use hostbind_api::{ConvertError, Converter, Datum, DatumType, Native, NativeType, TriggerMetadata};
use serde_json::{json, Value};

use crate::util::{require, unsupported_native};

const TRIGGER: &str = "queueTrigger";
const OUTPUT: &str = "queue";

/// `queueTrigger`: payload plus the delivery fields from trigger metadata.
#[derive(Debug, Default)]
pub struct QueueMessageInConverter;

impl Converter for QueueMessageInConverter {
    fn binding(&self) -> &'static str {
        TRIGGER
    }

    fn trigger(&self) -> Option<&'static str> {
        Some(TRIGGER)
    }

    fn check_input_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::QueueMessage)
    }

    fn decode(
        &self,
        datum: Option<&Datum>,
        metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        let datum = require(datum, TRIGGER)?;
        let body = match (datum.datum_type(), datum.as_bytes()) {
            (DatumType::String | DatumType::Json | DatumType::Bytes, Some(raw)) => raw.to_vec(),
            (other, _) => return Err(ConvertError::unsupported_for_binding(TRIGGER, other)),
        };
        if metadata.is_none() {
            return Err(ConvertError::MissingTriggerMetadata { binding: TRIGGER });
        }

        let mut msg = QueueMessage::new(body);
        msg.id = metadata_field(metadata, "Id")?;
        msg.dequeue_count = metadata_field(metadata, "DequeueCount")?;
        msg.expiration_time = parse_datetime_metadata(metadata, "ExpirationTime")?;
        msg.insertion_time = parse_datetime_metadata(metadata, "InsertionTime")?;
        msg.time_next_visible = parse_datetime_metadata(metadata, "NextVisibleTime")?;
        msg.pop_receipt = metadata_field(metadata, "PopReceipt")?;
        Ok(Some(Native::QueueMessage(msg)))
    }
}

/// `queue` output: strings, bytes, messages, or a list of strings/messages.
#[derive(Debug, Default)]
pub struct QueueMessageOutConverter;

impl Converter for QueueMessageOutConverter {
    fn binding(&self) -> &'static str {
        OUTPUT
    }

    fn check_output_type(&self, ty: &NativeType) -> bool {
        match ty {
            NativeType::Str | NativeType::Bytes | NativeType::QueueMessage => true,
            NativeType::List(inner) => matches!(**inner, NativeType::Str | NativeType::QueueMessage),
            _ => false,
        }
    }

    fn encode(&self, value: Native, _expected: Option<&NativeType>) -> Result<Datum, ConvertError> {
        match value {
            Native::Str(s) => Ok(Datum::string(s)),
            Native::Bytes(b) => Ok(Datum::bytes(b)),
            Native::QueueMessage(msg) => Ok(Datum::json_value(&message_json(&msg)?)),
            Native::List(items) => {
                let msgs = items
                    .into_iter()
                    .map(|item| match item {
                        Native::Str(s) => Ok(Value::String(s)),
                        Native::QueueMessage(msg) => message_json(&msg),
                        other => Err(unsupported_native(OUTPUT, &other)),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Datum::json_value(&Value::Array(msgs)))
            }
            other => Err(unsupported_native(OUTPUT, &other)),
        }
    }
}

fn message_json(msg: &QueueMessage) -> Result<Value, ConvertError> {
    let body = std::str::from_utf8(msg.get_body())
        .map_err(|e| ConvertError::invalid(OUTPUT, format!("message body is not UTF-8: {e}")))?;
    Ok(json!({ "id": msg.id, "body": body }))
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    fn metadata() -> TriggerMetadata {
        let mut m = TriggerMetadata::new();
        m.insert("Id".into(), Datum::string("a1"));
        m.insert("DequeueCount".into(), Datum::json("3"));
        m.insert("InsertionTime".into(), Datum::json(r#""2021-04-05T06:07:08.1234567+00:00""#));
        m.insert("PopReceipt".into(), Datum::string("AgAAAA=="));
        m
    }

    #[test]
    fn decodes_message_with_metadata() {
        let meta = metadata();
        let Some(Native::QueueMessage(msg)) = QueueMessageInConverter
            .decode(Some(&Datum::string("job")), Some(&meta))
            .unwrap()
        else {
            panic!("expected a queue message");
        };
        assert_eq!(msg.get_body(), b"job");
        assert_eq!(msg.id.as_deref(), Some("a1"));
        assert_eq!(msg.dequeue_count, Some(3));
        let inserted = msg.insertion_time.unwrap();
        assert_eq!((inserted.year(), inserted.second()), (2021, 8));
        assert_eq!(inserted.nanosecond(), 123_456_000);
        assert!(msg.expiration_time.is_none());
    }

    #[test]
    fn requires_trigger_metadata() {
        let err = QueueMessageInConverter
            .decode(Some(&Datum::string("job")), None)
            .unwrap_err();
        assert!(matches!(err, ConvertError::MissingTriggerMetadata { .. }));
    }

    #[test]
    fn encodes_message_lists_as_json() {
        let items = vec![
            Native::Str("plain".into()),
            Native::QueueMessage(QueueMessage::new(b"rich".to_vec()).with_id("m2")),
        ];
        let datum = QueueMessageOutConverter.encode(Native::List(items), None).unwrap();
        assert_eq!(datum.datum_type(), &DatumType::Json);
        assert_eq!(
            datum.to_json(),
            json!(["plain", {"id": "m2", "body": "rich"}])
        );
    }

    #[test]
    fn rejects_other_list_items() {
        let err = QueueMessageOutConverter
            .encode(Native::List(vec![Native::Int(1)]), None)
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedNativeType { native: "int", .. }));
    }
}
