use serde_json::{Map, Value};

/// Payload of a `timerTrigger` invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerRequest {
    pub past_due: bool,
    pub schedule_status: Map<String, Value>,
    pub schedule: Map<String, Value>,
}
