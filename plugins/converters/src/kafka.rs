use hostbind_api::decode::{coerce_json_value, decode_typed_value, metadata_field};
use hostbind_api::kafka::KafkaEvent;
use hostbind_api::typed::Coerce;
use hostbind_api::{ConvertError, Converter, Datum, Native, NativeType, TriggerMetadata};
use serde_json::Value;

use crate::eventhub::{encode_event_output, split_payload, Payload};
use crate::util::require;

const BINDING: &str = "kafka";
const TRIGGER: &str = "kafkaTrigger";

/// `kafka`: bodies only.
#[derive(Debug, Default)]
pub struct KafkaConverter;

impl Converter for KafkaConverter {
    fn binding(&self) -> &'static str {
        BINDING
    }

    fn check_input_type(&self, ty: &NativeType) -> bool {
        is_kafka_type(ty)
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
            Payload::Single(body) => Ok(Some(Native::KafkaEvent(KafkaEvent::new(body)))),
            Payload::Batch(bodies) => Ok(Some(Native::KafkaEvents(
                bodies.into_iter().map(KafkaEvent::new).collect(),
            ))),
        }
    }

    fn encode(&self, value: Native, _expected: Option<&NativeType>) -> Result<Datum, ConvertError> {
        encode_event_output(value, BINDING)
    }
}

/// `kafkaTrigger`: records with key/partition/offset/topic/timestamp.
///
/// Batches carry each field as a parallel `…Array` column.
#[derive(Debug, Default)]
pub struct KafkaTriggerConverter;

impl Converter for KafkaTriggerConverter {
    fn binding(&self) -> &'static str {
        TRIGGER
    }

    fn trigger(&self) -> Option<&'static str> {
        Some(TRIGGER)
    }

    fn check_input_type(&self, ty: &NativeType) -> bool {
        is_kafka_type(ty)
    }

    fn decode(
        &self,
        datum: Option<&Datum>,
        metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        let datum = require(datum, TRIGGER)?;
        match split_payload(datum, TRIGGER)? {
            Payload::Single(body) => {
                let mut event = KafkaEvent::new(body);
                event.key = metadata_field(metadata, "Key")?;
                event.partition = metadata_field(metadata, "Partition")?;
                event.offset = metadata_field(metadata, "Offset")?;
                event.topic = metadata_field(metadata, "Topic")?;
                event.timestamp = metadata_field(metadata, "Timestamp")?;
                Ok(Some(Native::KafkaEvent(event)))
            }
            Payload::Batch(bodies) => {
                let n = bodies.len();
                let keys = column(metadata, "KeyArray", n)?;
                let partitions = column(metadata, "PartitionArray", n)?;
                let offsets = column(metadata, "OffsetArray", n)?;
                let topics = column(metadata, "TopicArray", n)?;
                let timestamps = column(metadata, "TimestampArray", n)?;

                let events = bodies
                    .into_iter()
                    .enumerate()
                    .map(|(i, body)| -> Result<KafkaEvent, ConvertError> {
                        let mut event = KafkaEvent::new(body);
                        event.key = cell(&keys, "KeyArray", i)?;
                        event.partition = cell(&partitions, "PartitionArray", i)?;
                        event.offset = cell(&offsets, "OffsetArray", i)?;
                        event.topic = cell(&topics, "TopicArray", i)?;
                        event.timestamp = cell(&timestamps, "TimestampArray", i)?;
                        Ok(event)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(Native::KafkaEvents(events)))
            }
        }
    }
}

fn is_kafka_type(ty: &NativeType) -> bool {
    match ty {
        NativeType::KafkaEvent => true,
        NativeType::List(inner) => matches!(**inner, NativeType::KafkaEvent),
        _ => false,
    }
}

/// A parallel metadata column, length-checked against the body count.
fn column(
    metadata: Option<&TriggerMetadata>,
    field: &str,
    bodies: usize,
) -> Result<Option<Vec<Value>>, ConvertError> {
    let Some(datum) = metadata.and_then(|m| m.get(field)) else {
        return Ok(None);
    };
    let values: Vec<Value> = decode_typed_value(datum, &format!("field '{field}' in trigger metadata"))?;
    if values.len() != bodies {
        return Err(ConvertError::MismatchedBatchLengths {
            binding: TRIGGER,
            field: field.to_string(),
            bodies,
            metadata: values.len(),
        });
    }
    Ok(Some(values))
}

fn cell<T: Coerce>(
    column: &Option<Vec<Value>>,
    field: &str,
    i: usize,
) -> Result<Option<T>, ConvertError> {
    let value = column.as_ref().and_then(|c| c.get(i));
    coerce_json_value(value, &format!("entry {i} of field '{field}' in trigger metadata"))
}
