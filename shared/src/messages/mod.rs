mod error;
mod event_kind;
mod message;

pub use error::MessageError;
pub use event_kind::EventKind;
pub use message::{Message, MessageHeader, MESSAGE_HEADER_BYTES};
