use std::collections::BTreeMap;

use hostbind_api::decode::{
    coerce_json_value, decode_trigger_metadata_field, decode_typed_value, metadata_field,
    parse_datetime, parse_datetime_metadata,
};
use hostbind_api::eventhub::EventHubEvent;
use hostbind_api::{
    ConvertError, Converter, Datum, DatumType, DatumValue, Native, NativeType, TriggerMetadata,
};
use serde_json::{Map, Value};

use crate::util::{body_bytes, require, unsupported_native};

const BINDING: &str = "eventHub";
const TRIGGER: &str = "eventHubTrigger";
const IOTHUB_PREFIX: &str = "iothub-";

/// `eventHub`: bodies only, no per-event metadata.
#[derive(Debug, Default)]
pub struct EventHubConverter;

impl Converter for EventHubConverter {
    fn binding(&self) -> &'static str {
        BINDING
    }

    fn check_input_type(&self, ty: &NativeType) -> bool {
        is_event_type(ty)
    }

    fn check_output_type(&self, ty: &NativeType) -> bool {
        match ty {
            NativeType::Str | NativeType::Bytes | NativeType::Int | NativeType::Json => true,
            NativeType::List(inner) => matches!(**inner, NativeType::Str | NativeType::Json),
            _ => false,
        }
    }

    fn decode(
        &self,
        datum: Option<&Datum>,
        _metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        let datum = require(datum, BINDING)?;
        match split_payload(datum, BINDING)? {
            Payload::Single(body) => Ok(Some(Native::EventHubEvent(EventHubEvent::new(body)))),
            Payload::Batch(bodies) => Ok(Some(Native::EventHubEvents(
                bodies.into_iter().map(EventHubEvent::new).collect(),
            ))),
        }
    }

    fn encode(&self, value: Native, _expected: Option<&NativeType>) -> Result<Datum, ConvertError> {
        encode_event_output(value, BINDING)
    }
}

/// `eventHubTrigger`: single events or batches with per-event system properties.
#[derive(Debug, Default)]
pub struct EventHubTriggerConverter;

impl Converter for EventHubTriggerConverter {
    fn binding(&self) -> &'static str {
        TRIGGER
    }

    fn trigger(&self) -> Option<&'static str> {
        Some(TRIGGER)
    }

    fn check_input_type(&self, ty: &NativeType) -> bool {
        is_event_type(ty)
    }

    fn check_output_type(&self, ty: &NativeType) -> bool {
        EventHubConverter.check_output_type(ty)
    }

    fn decode(
        &self,
        datum: Option<&Datum>,
        metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        let datum = require(datum, TRIGGER)?;
        match split_payload(datum, TRIGGER)? {
            Payload::Single(body) => Ok(Some(Native::EventHubEvent(decode_single_event(
                body, metadata,
            )?))),
            Payload::Batch(bodies) => Ok(Some(Native::EventHubEvents(decode_multiple_events(
                bodies, metadata,
            )?))),
        }
    }

    fn encode(&self, value: Native, _expected: Option<&NativeType>) -> Result<Datum, ConvertError> {
        encode_event_output(value, TRIGGER)
    }
}

fn is_event_type(ty: &NativeType) -> bool {
    match ty {
        NativeType::EventHubEvent => true,
        NativeType::List(inner) => matches!(**inner, NativeType::EventHubEvent),
        _ => false,
    }
}

pub(crate) enum Payload {
    Single(Vec<u8>),
    Batch(Vec<Vec<u8>>),
}

/// Singular (`string`/`bytes`/`json`) vs batch (`collection_*`) payload shapes.
pub(crate) fn split_payload(datum: &Datum, binding: &'static str) -> Result<Payload, ConvertError> {
    match (datum.datum_type(), datum.value()) {
        (DatumType::String | DatumType::Bytes | DatumType::Json, _) => {
            body_bytes(datum, binding).map(Payload::Single)
        }
        (DatumType::CollectionBytes, DatumValue::CollectionBytes(items)) => {
            Ok(Payload::Batch(items.clone()))
        }
        (DatumType::CollectionString, DatumValue::CollectionString(items)) => Ok(Payload::Batch(
            items.iter().map(|s| s.as_bytes().to_vec()).collect(),
        )),
        (other, _) => Err(ConvertError::unsupported_for_binding(binding, other)),
    }
}

fn decode_single_event(
    body: Vec<u8>,
    metadata: Option<&TriggerMetadata>,
) -> Result<EventHubEvent, ConvertError> {
    let mut event = EventHubEvent::new(body);
    event.enqueued_time = parse_datetime_metadata(metadata, "EnqueuedTimeUtc")?;
    event.partition_key = metadata_field(metadata, "PartitionKey")?;
    event.sequence_number = metadata_field(metadata, "SequenceNumber")?;
    event.offset = metadata_field(metadata, "Offset")?;
    if let Some(metadata) = metadata {
        for field in metadata.keys().filter(|k| k.starts_with(IOTHUB_PREFIX)) {
            if let Some(v) = decode_trigger_metadata_field::<String>(metadata, field)? {
                event
                    .iothub_metadata
                    .insert(field[IOTHUB_PREFIX.len()..].to_string(), v);
            }
        }
    }
    Ok(event)
}

fn decode_multiple_events(
    bodies: Vec<Vec<u8>>,
    metadata: Option<&TriggerMetadata>,
) -> Result<Vec<EventHubEvent>, ConvertError> {
    let Some(sys_props) = metadata.and_then(|m| m.get("SystemPropertiesArray")) else {
        tracing::warn!(binding = TRIGGER, events = bodies.len(), "batch without SystemPropertiesArray");
        return Ok(bodies.into_iter().map(EventHubEvent::new).collect());
    };
    let props: Vec<Value> =
        decode_typed_value(sys_props, "field 'SystemPropertiesArray' in trigger metadata")?;
    if props.len() != bodies.len() {
        return Err(ConvertError::MismatchedBatchLengths {
            binding: TRIGGER,
            field: "SystemPropertiesArray".to_string(),
            bodies: bodies.len(),
            metadata: props.len(),
        });
    }

    bodies
        .into_iter()
        .zip(props)
        .enumerate()
        .map(|(i, (body, props))| {
            let context = |field: &str| {
                format!("field '{field}' of entry {i} in 'SystemPropertiesArray'")
            };
            let props: Map<String, Value> =
                coerce_json_value(Some(&props), &format!("entry {i} of 'SystemPropertiesArray'"))?
                    .unwrap_or_default();
            let mut event = EventHubEvent::new(body);
            event.enqueued_time = coerce_json_value::<String>(
                props.get("EnqueuedTimeUtc"),
                &context("EnqueuedTimeUtc"),
            )?
            .map(|s| parse_datetime(&s))
            .transpose()?;
            event.partition_key =
                coerce_json_value(props.get("PartitionKey"), &context("PartitionKey"))?;
            event.sequence_number =
                coerce_json_value(props.get("SequenceNumber"), &context("SequenceNumber"))?;
            event.offset = coerce_json_value(props.get("Offset"), &context("Offset"))?;
            event.iothub_metadata = iothub_entries(&props);
            Ok(event)
        })
        .collect()
}

fn json_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn iothub_entries(props: &Map<String, Value>) -> BTreeMap<String, String> {
    props
        .iter()
        .filter_map(|(k, v)| {
            let name = k.strip_prefix(IOTHUB_PREFIX)?;
            Some((name.to_string(), json_text(v)?))
        })
        .collect()
}

/// Output shapes shared by the event-streaming bindings.
pub(crate) fn encode_event_output(value: Native, binding: &'static str) -> Result<Datum, ConvertError> {
    match value {
        Native::Str(s) => Ok(Datum::string(s)),
        Native::Bytes(b) => Ok(Datum::bytes(b)),
        Native::Int(i) => Ok(Datum::int(i)),
        Native::Json(v) => Ok(Datum::json_value(&v)),
        Native::List(items) => {
            let values = items
                .into_iter()
                .map(|item| match item {
                    Native::Str(s) => Ok(Value::String(s)),
                    Native::Int(i) => Ok(Value::from(i)),
                    Native::Json(v) => Ok(v),
                    other => Err(unsupported_native(binding, &other)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Datum::json_value(&Value::Array(values)))
        }
        other => Err(unsupported_native(binding, &other)),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const ENQUEUED: &str = "2020-03-04T05:06:07.123456Z";

    #[test]
    fn single_and_batch_agree() {
        let mut single_meta = TriggerMetadata::new();
        single_meta.insert("EnqueuedTimeUtc".into(), Datum::string(ENQUEUED));
        single_meta.insert("PartitionKey".into(), Datum::string("pk-1"));
        single_meta.insert("SequenceNumber".into(), Datum::int(42));
        single_meta.insert("Offset".into(), Datum::string("1024"));

        let mut batch_meta = TriggerMetadata::new();
        batch_meta.insert(
            "SystemPropertiesArray".into(),
            Datum::json(format!(
                r#"[{{"EnqueuedTimeUtc": "{ENQUEUED}", "PartitionKey": "pk-1", "SequenceNumber": 42, "Offset": "1024"}}]"#
            )),
        );

        let single = match EventHubTriggerConverter
            .decode(Some(&Datum::string("payload")), Some(&single_meta))
            .unwrap()
        {
            Some(Native::EventHubEvent(e)) => e,
            other => panic!("expected one event, got {other:?}"),
        };
        let batch = match EventHubTriggerConverter
            .decode(
                Some(&Datum::collection_string(vec!["payload".into()])),
                Some(&batch_meta),
            )
            .unwrap()
        {
            Some(Native::EventHubEvents(events)) => events,
            other => panic!("expected a batch, got {other:?}"),
        };

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].get_body(), single.get_body());
        assert_eq!(batch[0].enqueued_time, single.enqueued_time);
        assert_eq!(batch[0].partition_key, single.partition_key);
        assert_eq!(batch[0].sequence_number, single.sequence_number);
        assert_eq!(batch[0].offset, single.offset);
    }

    #[test]
    fn batch_properties_coerce_like_single_fields() {
        let mut meta = TriggerMetadata::new();
        meta.insert(
            "SystemPropertiesArray".into(),
            Datum::json(r#"[{"SequenceNumber": "42", "Offset": 1024}, null]"#),
        );
        let Some(Native::EventHubEvents(batch)) = EventHubTriggerConverter
            .decode(
                Some(&Datum::collection_string(vec!["a".into(), "b".into()])),
                Some(&meta),
            )
            .unwrap()
        else {
            panic!("expected a batch");
        };
        assert_eq!(batch[0].sequence_number, Some(42));
        assert_eq!(batch[0].offset.as_deref(), Some("1024"));
        assert_eq!(batch[1].sequence_number, None);
    }

    #[test]
    fn uncoercible_batch_properties_fail() {
        for props in [r#"[{"SequenceNumber": "forty-two"}]"#, r#"[["not", "a", "map"]]"#] {
            let mut meta = TriggerMetadata::new();
            meta.insert("SystemPropertiesArray".into(), Datum::json(props));
            let err = EventHubTriggerConverter
                .decode(Some(&Datum::collection_string(vec!["a".into()])), Some(&meta))
                .unwrap_err();
            assert!(matches!(err, ConvertError::TypeCoercion { .. }), "{props}: {err}");
        }
    }

    #[test]
    fn mismatched_batch_lengths_fail() {
        let mut meta = TriggerMetadata::new();
        meta.insert("SystemPropertiesArray".into(), Datum::json("[{}]"));
        let err = EventHubTriggerConverter
            .decode(
                Some(&Datum::collection_bytes(vec![b"a".to_vec(), b"b".to_vec()])),
                Some(&meta),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::MismatchedBatchLengths { bodies: 2, metadata: 1, .. }
        ));
    }

    #[test]
    fn tolerates_missing_metadata() {
        let decoded = EventHubTriggerConverter
            .decode(Some(&Datum::bytes(b"x".to_vec())), None)
            .unwrap();
        let Some(Native::EventHubEvent(event)) = decoded else {
            panic!("expected an event");
        };
        assert!(event.enqueued_time.is_none());
        assert!(event.partition_key.is_none());
    }

    #[test]
    fn collects_iothub_properties() {
        let mut meta = TriggerMetadata::new();
        meta.insert("iothub-device-id".into(), Datum::string("dev-7"));
        meta.insert("iothub-enqueuedtime".into(), Datum::string("2020-01-01T00:00:00Z"));
        let Some(Native::EventHubEvent(event)) = EventHubTriggerConverter
            .decode(Some(&Datum::string("{}")), Some(&meta))
            .unwrap()
        else {
            panic!("expected an event");
        };
        assert_eq!(event.iothub_metadata["device-id"], "dev-7");
        assert_eq!(event.iothub_metadata.len(), 2);
    }

    #[test]
    fn rejects_unknown_payload_types() {
        let xml = Datum::new(DatumValue::String("<e/>".into()), "xml");
        let msg = EventHubConverter.decode(Some(&xml), None).unwrap_err().to_string();
        assert!(msg.contains("xml") && msg.contains("eventHub"), "{msg}");
    }

    #[test]
    fn encodes_lists_as_json() {
        let datum = EventHubConverter
            .encode(
                Native::List(vec![Native::Str("a".into()), Native::Int(2)]),
                None,
            )
            .unwrap();
        assert_eq!(datum, Datum::json(r#"["a",2]"#));
        assert_eq!(EventHubConverter.encode(Native::Int(5), None).unwrap(), Datum::int(5));
    }
}
