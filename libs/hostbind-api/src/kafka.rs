/// A single Kafka record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KafkaEvent {
    body: Vec<u8>,
    pub key: Option<String>,
    pub offset: Option<i64>,
    pub partition: Option<i64>,
    pub topic: Option<String>,
    /// Broker timestamp as sent by the host.
    pub timestamp: Option<String>,
}

impl KafkaEvent {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn get_body(&self) -> &[u8] {
        &self.body
    }
}
