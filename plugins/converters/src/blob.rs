use hostbind_api::blob::InputStream;
use hostbind_api::decode::decode_trigger_metadata_field;
use hostbind_api::{ConvertError, Converter, Datum, DatumType, Native, NativeType, TriggerMetadata};
use serde_json::{Map, Value};

use crate::util::unsupported_native;

const BINDING: &str = "blob";

/// `blob` / `blobTrigger`.
#[derive(Debug, Default)]
pub struct BlobConverter;

impl Converter for BlobConverter {
    fn binding(&self) -> &'static str {
        BINDING
    }

    fn trigger(&self) -> Option<&'static str> {
        Some("blobTrigger")
    }

    fn check_input_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::InputStream | NativeType::Bytes | NativeType::Str)
    }

    fn check_output_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::InputStream | NativeType::Bytes | NativeType::Str)
    }

    fn decode(
        &self,
        datum: Option<&Datum>,
        metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        let Some(datum) = datum else {
            return Ok(None);
        };
        let data = match (datum.datum_type(), datum.as_bytes()) {
            (DatumType::String | DatumType::Bytes, Some(raw)) => raw.to_vec(),
            (other, _) => return Err(ConvertError::unsupported_for_binding(BINDING, other)),
        };

        let mut stream = InputStream::new(data);
        if let Some(metadata) = metadata.filter(|m| !m.is_empty()) {
            let properties: Option<Map<String, Value>> =
                decode_trigger_metadata_field(metadata, "Properties")?;
            stream.length = properties
                .as_ref()
                .and_then(|p| p.get("Length"))
                .and_then(blob_length);
            stream.blob_properties = properties;
            stream.metadata = decode_trigger_metadata_field(metadata, "Metadata")?;
            stream.name = decode_trigger_metadata_field(metadata, "BlobTrigger")?;
            stream.uri = decode_trigger_metadata_field(metadata, "Uri")?;
        }
        Ok(Some(Native::Stream(stream)))
    }

    fn encode(&self, value: Native, _expected: Option<&NativeType>) -> Result<Datum, ConvertError> {
        match value {
            Native::Str(s) => Ok(Datum::string(s)),
            Native::Bytes(b) => Ok(Datum::bytes(b)),
            Native::Stream(mut stream) => Ok(Datum::bytes(stream.read_remaining())),
            other => Err(unsupported_native(BINDING, &other)),
        }
    }
}

fn blob_length(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
