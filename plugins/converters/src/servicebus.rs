use chrono::{DateTime, Utc};
use hostbind_api::decode::{
    coerce_json_value, decode_typed_value, metadata_field, parse_datetime, parse_datetime_metadata,
};
use hostbind_api::servicebus::ServiceBusMessage;
use hostbind_api::typed::Coerce;
use hostbind_api::{
    ConvertError, Converter, Datum, DatumType, DatumValue, Native, NativeType, TriggerMetadata,
};
use serde_json::{Map, Value};

use crate::util::{encode_plain, unsupported_native};

const TRIGGER: &str = "serviceBusTrigger";
const OUTPUT: &str = "serviceBus";

/// `serviceBusTrigger`. Trigger metadata is mandatory; the payload is not.
#[derive(Debug, Default)]
pub struct ServiceBusMessageInConverter;

impl Converter for ServiceBusMessageInConverter {
    fn binding(&self) -> &'static str {
        TRIGGER
    }

    fn trigger(&self) -> Option<&'static str> {
        Some(TRIGGER)
    }

    fn check_input_type(&self, ty: &NativeType) -> bool {
        match ty {
            NativeType::ServiceBusMessage => true,
            NativeType::List(inner) => matches!(**inner, NativeType::ServiceBusMessage),
            _ => false,
        }
    }

    fn decode(
        &self,
        datum: Option<&Datum>,
        metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        let batch = match datum {
            None => None,
            Some(d) => match (d.datum_type(), d.value()) {
                (DatumType::CollectionBytes, DatumValue::CollectionBytes(items)) => {
                    Some(items.clone())
                }
                (DatumType::CollectionString, DatumValue::CollectionString(items)) => {
                    Some(items.iter().map(|s| s.as_bytes().to_vec()).collect())
                }
                _ => None,
            },
        };
        let single_body = match (batch.is_some(), datum) {
            (true, _) => Vec::new(),
            (false, None) => Vec::new(),
            (false, Some(d)) => match (d.datum_type(), d.as_bytes()) {
                (DatumType::String | DatumType::Json | DatumType::Bytes, Some(raw)) => raw.to_vec(),
                (other, _) => return Err(ConvertError::unsupported_for_binding(TRIGGER, other)),
            },
        };
        let Some(metadata) = metadata else {
            return Err(ConvertError::MissingTriggerMetadata { binding: TRIGGER });
        };

        match batch {
            Some(bodies) => Ok(Some(Native::ServiceBusMessages(decode_batch(bodies, metadata)?))),
            None => Ok(Some(Native::ServiceBusMessage(Box::new(decode_single(
                single_body,
                metadata,
            )?)))),
        }
    }
}

fn decode_single(body: Vec<u8>, metadata: &TriggerMetadata) -> Result<ServiceBusMessage, ConvertError> {
    let m = Some(metadata);
    let mut msg = ServiceBusMessage::new(body).with_trigger_metadata(metadata.clone());
    msg.application_properties = metadata_field(m, "ApplicationProperties")?;
    msg.content_type = metadata_field(m, "ContentType")?;
    msg.correlation_id = metadata_field(m, "CorrelationId")?;
    msg.dead_letter_error_description = metadata_field(m, "DeadLetterErrorDescription")?;
    msg.dead_letter_reason = metadata_field(m, "DeadLetterReason")?;
    msg.dead_letter_source = metadata_field(m, "DeadLetterSource")?;
    msg.delivery_count = metadata_field(m, "DeliveryCount")?;
    msg.enqueued_sequence_number = metadata_field(m, "EnqueuedSequenceNumber")?;
    msg.enqueued_time_utc = parse_datetime_metadata(m, "EnqueuedTimeUtc")?;
    msg.expires_at_utc = parse_datetime_metadata(m, "ExpiresAtUtc")?;
    msg.label = metadata_field(m, "Label")?;
    msg.locked_until = parse_datetime_metadata(m, "LockedUntil")?;
    msg.lock_token = metadata_field(m, "LockToken")?;
    msg.message_id = metadata_field(m, "MessageId")?;
    msg.partition_key = metadata_field(m, "PartitionKey")?;
    msg.reply_to = metadata_field(m, "ReplyTo")?;
    msg.reply_to_session_id = metadata_field(m, "ReplyToSessionId")?;
    msg.scheduled_enqueue_time_utc = parse_datetime_metadata(m, "ScheduledEnqueueTimeUtc")?;
    msg.sequence_number = metadata_field(m, "SequenceNumber")?;
    msg.session_id = metadata_field(m, "SessionId")?;
    msg.state = metadata_field(m, "State")?;
    msg.subject = metadata_field(m, "Subject")?;
    msg.time_to_live = metadata_field(m, "TimeToLive")?;
    msg.to = metadata_field(m, "To")?;
    msg.transaction_partition_key = metadata_field(m, "TransactionPartitionKey")?;
    msg.user_properties = metadata_field(m, "UserProperties")?;
    Ok(msg)
}

/// Parallel `…Array` metadata columns of a batch.
struct Columns<'a> {
    metadata: &'a TriggerMetadata,
    bodies: usize,
}

impl Columns<'_> {
    fn get(&self, field: &str) -> Result<Vec<Option<Value>>, ConvertError> {
        let Some(datum) = self.metadata.get(field) else {
            return Ok(vec![None; self.bodies]);
        };
        let values: Vec<Value> =
            decode_typed_value(datum, &format!("field '{field}' in trigger metadata"))?;
        if values.len() != self.bodies {
            return Err(ConvertError::MismatchedBatchLengths {
                binding: TRIGGER,
                field: field.to_string(),
                bodies: self.bodies,
                metadata: values.len(),
            });
        }
        Ok(values
            .into_iter()
            .map(|v| if v.is_null() { None } else { Some(v) })
            .collect())
    }

    fn coerced<T: Coerce>(&self, field: &str) -> Result<Vec<Option<T>>, ConvertError> {
        self.get(field)?
            .iter()
            .enumerate()
            .map(|(i, v)| {
                coerce_json_value(
                    v.as_ref(),
                    &format!("entry {i} of field '{field}' in trigger metadata"),
                )
            })
            .collect()
    }

    fn strings(&self, field: &str) -> Result<Vec<Option<String>>, ConvertError> {
        self.coerced(field)
    }

    fn ints(&self, field: &str) -> Result<Vec<Option<i64>>, ConvertError> {
        self.coerced(field)
    }

    fn datetimes(&self, field: &str) -> Result<Vec<Option<DateTime<Utc>>>, ConvertError> {
        self.strings(field)?
            .into_iter()
            .map(|s| s.as_deref().map(parse_datetime).transpose())
            .collect()
    }

    fn maps(&self, field: &str) -> Result<Vec<Option<Map<String, Value>>>, ConvertError> {
        self.coerced(field)
    }
}

fn decode_batch(
    bodies: Vec<Vec<u8>>,
    metadata: &TriggerMetadata,
) -> Result<Vec<ServiceBusMessage>, ConvertError> {
    let cols = Columns {
        metadata,
        bodies: bodies.len(),
    };
    let mut application_properties = cols.maps("ApplicationPropertiesArray")?.into_iter();
    let mut content_types = cols.strings("ContentTypeArray")?.into_iter();
    let mut correlation_ids = cols.strings("CorrelationIdArray")?.into_iter();
    let mut delivery_counts = cols.ints("DeliveryCountArray")?.into_iter();
    let mut enqueued_times = cols.datetimes("EnqueuedTimeUtcArray")?.into_iter();
    let mut expires = cols.datetimes("ExpiresAtUtcArray")?.into_iter();
    let mut labels = cols.strings("LabelArray")?.into_iter();
    let mut lock_tokens = cols.strings("LockTokenArray")?.into_iter();
    let mut message_ids = cols.strings("MessageIdArray")?.into_iter();
    let mut partition_keys = cols.strings("PartitionKeyArray")?.into_iter();
    let mut reply_tos = cols.strings("ReplyToArray")?.into_iter();
    let mut sequence_numbers = cols.ints("SequenceNumberArray")?.into_iter();
    let mut session_ids = cols.strings("SessionIdArray")?.into_iter();
    let mut subjects = cols.strings("SubjectArray")?.into_iter();
    let mut tos = cols.strings("ToArray")?.into_iter();
    let mut user_properties = cols.maps("UserPropertiesArray")?.into_iter();

    Ok(bodies
        .into_iter()
        .map(|body| {
            let mut msg = ServiceBusMessage::new(body).with_trigger_metadata(metadata.clone());
            msg.application_properties = application_properties.next().flatten();
            msg.content_type = content_types.next().flatten();
            msg.correlation_id = correlation_ids.next().flatten();
            msg.delivery_count = delivery_counts.next().flatten();
            msg.enqueued_time_utc = enqueued_times.next().flatten();
            msg.expires_at_utc = expires.next().flatten();
            msg.label = labels.next().flatten();
            msg.lock_token = lock_tokens.next().flatten();
            msg.message_id = message_ids.next().flatten();
            msg.partition_key = partition_keys.next().flatten();
            msg.reply_to = reply_tos.next().flatten();
            msg.sequence_number = sequence_numbers.next().flatten();
            msg.session_id = session_ids.next().flatten();
            msg.subject = subjects.next().flatten();
            msg.to = tos.next().flatten();
            msg.user_properties = user_properties.next().flatten();
            msg
        })
        .collect())
}

/// `serviceBus` output: strings and bytes only.
#[derive(Debug, Default)]
pub struct ServiceBusMessageOutConverter;

impl Converter for ServiceBusMessageOutConverter {
    fn binding(&self) -> &'static str {
        OUTPUT
    }

    fn check_output_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::Str | NativeType::Bytes)
    }

    fn encode(&self, value: Native, _expected: Option<&NativeType>) -> Result<Datum, ConvertError> {
        match value {
            v @ (Native::Str(_) | Native::Bytes(_)) => encode_plain(v, OUTPUT),
            other => Err(unsupported_native(OUTPUT, &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> TriggerMetadata {
        let mut m = TriggerMetadata::new();
        m.insert("MessageId".into(), Datum::string("msg-1"));
        m.insert("DeliveryCount".into(), Datum::int(2));
        m.insert("EnqueuedTimeUtc".into(), Datum::string("2022-02-02T02:02:02.2222222Z"));
        m.insert("SessionId".into(), Datum::string("s-9"));
        m.insert("UserProperties".into(), Datum::json(r#"{"$AzureWebJobsParentId": "p"}"#));
        m.insert("TimeToLive".into(), Datum::string("00:05:00"));
        m
    }

    fn decode_one(datum: Option<&Datum>, meta: &TriggerMetadata) -> ServiceBusMessage {
        match ServiceBusMessageInConverter.decode(datum, Some(meta)).unwrap() {
            Some(Native::ServiceBusMessage(msg)) => *msg,
            other => panic!("expected a message, got {other:?}"),
        }
    }

    #[test]
    fn decodes_message_properties() {
        let meta = metadata();
        let msg = decode_one(Some(&Datum::string("hello")), &meta);
        assert_eq!(msg.get_body(), b"hello");
        assert_eq!(msg.message_id.as_deref(), Some("msg-1"));
        assert_eq!(msg.delivery_count, Some(2));
        assert_eq!(msg.session_id.as_deref(), Some("s-9"));
        assert_eq!(msg.time_to_live.as_deref(), Some("00:05:00"));
        assert_eq!(
            msg.enqueued_time_utc.unwrap().to_rfc3339(),
            "2022-02-02T02:02:02.222222+00:00"
        );
        assert_eq!(msg.metadata().unwrap()["DeliveryCount"], 2);
    }

    #[test]
    fn empty_payload_is_a_valid_message() {
        let msg = decode_one(None, &metadata());
        assert!(msg.get_body().is_empty());
        assert_eq!(msg.message_id.as_deref(), Some("msg-1"));
    }

    #[test]
    fn missing_metadata_fails() {
        let err = ServiceBusMessageInConverter
            .decode(Some(&Datum::string("hello")), None)
            .unwrap_err();
        assert!(matches!(err, ConvertError::MissingTriggerMetadata { binding: TRIGGER }));
    }

    #[test]
    fn decodes_batches_column_wise() {
        let mut meta = TriggerMetadata::new();
        meta.insert("MessageIdArray".into(), Datum::collection_string(vec!["a".into(), "b".into()]));
        meta.insert("DeliveryCountArray".into(), Datum::json("[1, 5]"));
        let Some(Native::ServiceBusMessages(msgs)) = ServiceBusMessageInConverter
            .decode(
                Some(&Datum::collection_bytes(vec![b"x".to_vec(), b"y".to_vec()])),
                Some(&meta),
            )
            .unwrap()
        else {
            panic!("expected a batch");
        };
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1].get_body(), b"y");
        assert_eq!(msgs[1].message_id.as_deref(), Some("b"));
        assert_eq!(msgs[1].delivery_count, Some(5));
        assert!(msgs[0].session_id.is_none());
    }

    #[test]
    fn batch_columns_coerce_like_single_fields() {
        let mut meta = TriggerMetadata::new();
        meta.insert(
            "DeliveryCountArray".into(),
            Datum::collection_string(vec!["3".into()]),
        );
        meta.insert("SequenceNumberArray".into(), Datum::collection_sint64(vec![7]));
        let Some(Native::ServiceBusMessages(msgs)) = ServiceBusMessageInConverter
            .decode(Some(&Datum::collection_string(vec!["x".into()])), Some(&meta))
            .unwrap()
        else {
            panic!("expected a batch");
        };
        assert_eq!(msgs[0].delivery_count, Some(3));
        assert_eq!(msgs[0].sequence_number, Some(7));

        meta.insert(
            "DeliveryCountArray".into(),
            Datum::collection_string(vec!["many".into()]),
        );
        let err = ServiceBusMessageInConverter
            .decode(Some(&Datum::collection_string(vec!["x".into()])), Some(&meta))
            .unwrap_err();
        assert!(
            matches!(err, ConvertError::TypeCoercion { from: "str", to: "int", .. }),
            "{err}"
        );
    }

    #[test]
    fn batch_column_length_is_checked() {
        let mut meta = TriggerMetadata::new();
        meta.insert("MessageIdArray".into(), Datum::collection_string(vec!["a".into()]));
        let err = ServiceBusMessageInConverter
            .decode(Some(&Datum::collection_string(vec!["x".into(), "y".into()])), Some(&meta))
            .unwrap_err();
        assert!(matches!(err, ConvertError::MismatchedBatchLengths { .. }));
    }

    #[test]
    fn output_accepts_text_and_bytes_only() {
        assert_eq!(
            ServiceBusMessageOutConverter.encode(Native::Bytes(vec![1]), None).unwrap(),
            Datum::bytes(vec![1])
        );
        assert!(ServiceBusMessageOutConverter.encode(Native::Json(Value::Null), None).is_err());
    }
}
