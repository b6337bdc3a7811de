//! Built-in binding converters.
//!
//! One module per binding family; each converter implements
//! [`hostbind_api::Converter`] for a single binding kind.

pub mod auth_events;
pub mod blob;
pub mod durable;
pub mod eventgrid;
pub mod eventhub;
pub mod http;
pub mod kafka;
pub mod queue;
pub mod rows;
pub mod servicebus;
pub mod timer;

mod util;

pub use auth_events::AuthenticationEventsTriggerConverter;
pub use blob::BlobConverter;
pub use durable::{
    ActivityTriggerConverter, DurableClientConverter, EntityTriggerConverter,
    OrchestrationTriggerConverter,
};
pub use eventgrid::{EventGridEventInConverter, EventGridEventOutConverter};
pub use eventhub::{EventHubConverter, EventHubTriggerConverter};
pub use http::{HttpRequestConverter, HttpResponseConverter};
pub use kafka::{KafkaConverter, KafkaTriggerConverter};
pub use queue::{QueueMessageInConverter, QueueMessageOutConverter};
pub use rows::RowsConverter;
pub use servicebus::{ServiceBusMessageInConverter, ServiceBusMessageOutConverter};
pub use timer::TimerRequestConverter;
