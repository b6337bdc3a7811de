use crate::blob::InputStream;
use crate::durable::{CustomObject, DurableValue, EntityContext, OrchestrationContext};
use crate::eventgrid::EventGridEvent;
use crate::eventhub::EventHubEvent;
use crate::http::{HttpRequest, HttpResponse};
use crate::kafka::KafkaEvent;
use crate::queue::QueueMessage;
use crate::rows::{Row, RowFlavor, RowList};
use crate::servicebus::ServiceBusMessage;
use crate::timer::TimerRequest;

/// In-process value on the function side of the boundary.
///
/// Closed set: a converter only encodes the variants it documents and
/// rejects everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum Native {
    Str(String),
    Bytes(Vec<u8>),
    Int(i64),
    Double(f64),
    Json(serde_json::Value),
    List(Vec<Native>),

    HttpRequest(HttpRequest),
    HttpResponse(HttpResponse),
    /// Readable blob content.
    Stream(InputStream),
    QueueMessage(QueueMessage),
    EventHubEvent(EventHubEvent),
    EventHubEvents(Vec<EventHubEvent>),
    KafkaEvent(KafkaEvent),
    KafkaEvents(Vec<KafkaEvent>),
    ServiceBusMessage(Box<ServiceBusMessage>),
    ServiceBusMessages(Vec<ServiceBusMessage>),
    Row(Row),
    Rows(RowList),
    Timer(TimerRequest),
    EventGridEvent(EventGridEvent),
    EventGridEvents(Vec<EventGridEvent>),
    Orchestration(OrchestrationContext),
    Entity(EntityContext),
    Custom(CustomObject),
    Durable(DurableValue),
}

impl Native {
    /// Variant name, used when a converter rejects a value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Native::Str(_) => "str",
            Native::Bytes(_) => "bytes",
            Native::Int(_) => "int",
            Native::Double(_) => "float",
            Native::Json(_) => "json",
            Native::List(_) => "list",
            Native::HttpRequest(_) => "HttpRequest",
            Native::HttpResponse(_) => "HttpResponse",
            Native::Stream(_) => "InputStream",
            Native::QueueMessage(_) => "QueueMessage",
            Native::EventHubEvent(_) => "EventHubEvent",
            Native::EventHubEvents(_) => "list[EventHubEvent]",
            Native::KafkaEvent(_) => "KafkaEvent",
            Native::KafkaEvents(_) => "list[KafkaEvent]",
            Native::ServiceBusMessage(_) => "ServiceBusMessage",
            Native::ServiceBusMessages(_) => "list[ServiceBusMessage]",
            Native::Row(_) => "Row",
            Native::Rows(_) => "RowList",
            Native::Timer(_) => "TimerRequest",
            Native::EventGridEvent(_) => "EventGridEvent",
            Native::EventGridEvents(_) => "list[EventGridEvent]",
            Native::Orchestration(_) => "OrchestrationContext",
            Native::Entity(_) => "EntityContext",
            Native::Custom(_) => "CustomObject",
            Native::Durable(_) => "DurableValue",
        }
    }
}

/// Declared type of a function parameter or return value.
///
/// Checked against a converter at declaration time, before any invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeType {
    Str,
    Bytes,
    Int,
    Double,
    Json,
    List(Box<NativeType>),
    HttpRequest,
    HttpResponse,
    InputStream,
    QueueMessage,
    EventHubEvent,
    KafkaEvent,
    ServiceBusMessage,
    Row(RowFlavor),
    RowList(RowFlavor),
    TimerRequest,
    EventGridEvent,
    OrchestrationContext,
    EntityContext,
    /// A registered custom type, by `module.class` name.
    Custom(String),
    /// No annotation.
    Any,
}

impl NativeType {
    pub fn list_of(inner: NativeType) -> Self {
        NativeType::List(Box::new(inner))
    }

    /// Element type when `self` is a list.
    pub fn element(&self) -> Option<&NativeType> {
        match self {
            NativeType::List(inner) => Some(inner),
            _ => None,
        }
    }
}
