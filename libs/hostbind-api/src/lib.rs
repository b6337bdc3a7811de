pub mod blob;
pub mod converter;
pub mod datum;
pub mod decode;
pub mod durable;
pub mod error;
pub mod eventgrid;
pub mod eventhub;
pub mod http;
pub mod kafka;
pub mod native;
pub mod queue;
pub mod rows;
pub mod servicebus;
pub mod timer;
pub mod typed;

pub use converter::Converter;
pub use datum::{Datum, DatumType, DatumValue, TriggerMetadata};
pub use error::ConvertError;
pub use native::{Native, NativeType};
