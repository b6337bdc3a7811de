use hostbind_api::{ConvertError, Datum, DatumType, Native};

/// Payload datum, or `MissingPayload` when the host sent none.
pub(crate) fn require<'a>(
    datum: Option<&'a Datum>,
    binding: &'static str,
) -> Result<&'a Datum, ConvertError> {
    datum.ok_or(ConvertError::MissingPayload { binding })
}

/// Body bytes of a `string`, `bytes` or `json` datum.
pub(crate) fn body_bytes(datum: &Datum, binding: &'static str) -> Result<Vec<u8>, ConvertError> {
    match datum.datum_type() {
        DatumType::String | DatumType::Bytes | DatumType::Json => datum
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| ConvertError::invalid(binding, "payload value does not match its type")),
        other => Err(ConvertError::unsupported_for_binding(binding, other)),
    }
}

/// Parse JSON text from a `string`, `bytes` or `json` datum.
pub(crate) fn body_json(datum: &Datum, binding: &'static str) -> Result<serde_json::Value, ConvertError> {
    let raw = body_bytes(datum, binding)?;
    serde_json::from_slice(&raw)
        .map_err(|e| ConvertError::json(format!("data for the \"{binding}\" binding"), e))
}

pub(crate) fn unsupported_native(binding: &'static str, value: &Native) -> ConvertError {
    ConvertError::UnsupportedNativeType {
        binding,
        native: value.type_name(),
    }
}

/// `string` / `bytes` datums for the two plain native shapes.
pub(crate) fn encode_plain(value: Native, binding: &'static str) -> Result<Datum, ConvertError> {
    match value {
        Native::Str(s) => Ok(Datum::string(s)),
        Native::Bytes(b) => Ok(Datum::bytes(b)),
        other => Err(unsupported_native(binding, &other)),
    }
}
