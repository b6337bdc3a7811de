use chrono::{DateTime, Utc};

/// Storage queue message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueMessage {
    pub id: Option<String>,
    body: Vec<u8>,
    pub dequeue_count: Option<i64>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub insertion_time: Option<DateTime<Utc>>,
    pub time_next_visible: Option<DateTime<Utc>>,
    pub pop_receipt: Option<String>,
}

impl QueueMessage {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn get_body(&self) -> &[u8] {
        &self.body
    }

    pub fn get_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
