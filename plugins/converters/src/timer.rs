use hostbind_api::timer::TimerRequest;
use hostbind_api::{ConvertError, Converter, Datum, DatumType, Native, NativeType, TriggerMetadata};
use serde_json::{Map, Value};

use crate::util::{body_json, require};

const TRIGGER: &str = "timerTrigger";

/// `timerTrigger`. Only `json` payloads are understood.
#[derive(Debug, Default)]
pub struct TimerRequestConverter;

impl Converter for TimerRequestConverter {
    fn binding(&self) -> &'static str {
        TRIGGER
    }

    fn trigger(&self) -> Option<&'static str> {
        Some(TRIGGER)
    }

    fn check_input_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::TimerRequest)
    }

    fn decode(
        &self,
        datum: Option<&Datum>,
        _metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        let datum = require(datum, TRIGGER)?;
        if datum.datum_type() != &DatumType::Json {
            return Err(ConvertError::unsupported_for_binding(TRIGGER, datum.datum_type()));
        }

        let Value::Object(info) = body_json(datum, TRIGGER)? else {
            return Err(ConvertError::invalid(TRIGGER, "timer info must be a JSON object"));
        };
        Ok(Some(Native::Timer(TimerRequest {
            past_due: info.get("IsPastDue").and_then(Value::as_bool).unwrap_or(false),
            schedule_status: object_field(&info, "ScheduleStatus"),
            schedule: object_field(&info, "Schedule"),
        })))
    }
}

fn object_field(info: &Map<String, Value>, key: &str) -> Map<String, Value> {
    match info.get(key) {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}
