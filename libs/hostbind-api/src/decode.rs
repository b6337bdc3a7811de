//! Decode helpers shared by every binding converter.
//!
//! Converters only describe the shape of their binding; typed coercion,
//! trigger-metadata lookups and timestamp parsing live here.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::datum::{Datum, DatumType, DatumValue, TriggerMetadata};
use crate::error::ConvertError;
use crate::typed::{Coerce, Typed};

/// Sub-second digits kept when parsing timestamps.
///
/// The host occasionally emits 7 fractional digits; anything past
/// microseconds is truncated, never rounded.
const MAX_FRACTION_DIGITS: usize = 6;

/// Dispatch on `datum`'s type and coerce the payload into `T`.
///
/// `context` names what is being decoded for error messages, e.g.
/// `field 'DequeueCount' in trigger metadata`.
pub fn decode_typed_value<T: Coerce>(datum: &Datum, context: &str) -> Result<T, ConvertError> {
    let typed = typed_payload(datum, context)?;
    let from = typed.type_name();
    T::coerce(typed).ok_or_else(|| ConvertError::TypeCoercion {
        from,
        to: T::TYPE_NAME,
        context: context.to_string(),
    })
}

fn typed_payload(datum: &Datum, context: &str) -> Result<Typed, ConvertError> {
    let typed = match (datum.datum_type(), datum.value()) {
        (DatumType::Json, DatumValue::String(text)) => {
            Typed::Json(serde_json::from_str(text).map_err(|e| ConvertError::json(context, e))?)
        }
        (DatumType::Json, DatumValue::Bytes(raw)) => {
            Typed::Json(serde_json::from_slice(raw).map_err(|e| ConvertError::json(context, e))?)
        }
        (DatumType::String, DatumValue::String(s)) => Typed::String(s.clone()),
        (DatumType::Int, DatumValue::Int(i)) => Typed::Int(*i),
        (DatumType::Double, DatumValue::Double(d)) => Typed::Double(*d),
        (DatumType::CollectionBytes, DatumValue::CollectionBytes(items)) => {
            Typed::CollectionBytes(items.clone())
        }
        (DatumType::CollectionString, DatumValue::CollectionString(items)) => {
            Typed::CollectionString(items.clone())
        }
        (DatumType::CollectionDouble, DatumValue::CollectionDouble(items)) => {
            Typed::CollectionDouble(items.clone())
        }
        (DatumType::CollectionSint64, DatumValue::CollectionSint64(items)) => {
            Typed::CollectionSint64(items.clone())
        }
        (other, _) => {
            return Err(ConvertError::UnsupportedDatumType {
                datum_type: other.to_string(),
                context: context.to_string(),
            });
        }
    };
    Ok(typed)
}

/// Look up `field` in the trigger metadata and decode it; absent fields are `None`.
pub fn decode_trigger_metadata_field<T: Coerce>(
    metadata: &TriggerMetadata,
    field: &str,
) -> Result<Option<T>, ConvertError> {
    match metadata.get(field) {
        None => Ok(None),
        Some(datum) => {
            decode_typed_value(datum, &format!("field '{field}' in trigger metadata")).map(Some)
        }
    }
}

/// Same as [`decode_trigger_metadata_field`], tolerating an absent metadata map.
pub fn metadata_field<T: Coerce>(
    metadata: Option<&TriggerMetadata>,
    field: &str,
) -> Result<Option<T>, ConvertError> {
    match metadata {
        Some(m) => decode_trigger_metadata_field(m, field),
        None => Ok(None),
    }
}

/// Coerce one already-parsed JSON value, e.g. a cell of a batch metadata
/// column. `null` and absent cells are `None`; anything else goes through the
/// same coercion as [`decode_typed_value`].
pub fn coerce_json_value<T: Coerce>(
    value: Option<&Value>,
    context: &str,
) -> Result<Option<T>, ConvertError> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    let typed = Typed::Json(value.clone());
    let from = typed.type_name();
    T::coerce(typed).map(Some).ok_or_else(|| ConvertError::TypeCoercion {
        from,
        to: T::TYPE_NAME,
        context: context.to_string(),
    })
}

/// Decode a timestamp field out of the trigger metadata.
pub fn parse_datetime_metadata(
    metadata: Option<&TriggerMetadata>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, ConvertError> {
    metadata_field::<String>(metadata, field)?
        .map(|s| parse_datetime(&s))
        .transpose()
}

/// Parse a UTC ISO-8601 timestamp.
///
/// Accepted: `YYYY-MM-DDTHH:MM:SS[.ffffff]` followed by `Z` or `+00:00`.
/// Fractions longer than 6 digits are truncated before parsing.
pub fn parse_datetime(text: &str) -> Result<DateTime<Utc>, ConvertError> {
    let err = || ConvertError::DatetimeParse {
        text: text.to_string(),
    };

    let body = text
        .strip_suffix('Z')
        .or_else(|| text.strip_suffix("+00:00"))
        .ok_or_else(err)?;
    let body = truncate_fraction(body);

    let format = if body.contains('.') {
        "%Y-%m-%dT%H:%M:%S%.f"
    } else {
        "%Y-%m-%dT%H:%M:%S"
    };
    NaiveDateTime::parse_from_str(&body, format)
        .map(|naive| naive.and_utc())
        .map_err(|_| err())
}

fn truncate_fraction(body: &str) -> Cow<'_, str> {
    match body.rsplit_once('.') {
        Some((head, frac))
            if frac.len() > MAX_FRACTION_DIGITS && frac.bytes().all(|b| b.is_ascii_digit()) =>
        {
            Cow::Owned(format!("{head}.{}", &frac[..MAX_FRACTION_DIGITS]))
        }
        _ => Cow::Borrowed(body),
    }
}

/// Durations are not decoded: the host's timedelta format is not pinned down,
/// so every caller gets an explicit failure instead of a guess.
pub fn parse_timedelta(_text: &str) -> Result<std::time::Duration, ConvertError> {
    Err(ConvertError::Unsupported("timedelta parsing"))
}
