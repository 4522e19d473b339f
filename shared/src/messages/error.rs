use thiserror::Error;

use intercession_serde::SerdeErr;

use super::EventKind;

/// Errors that can occur while reading or framing a [`Message`](super::Message)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// A pop ran past the end of the body
    #[error("Message body underflow: tried to read at byte {offset} of a {size} byte body. Values must be popped in the order they were pushed")]
    BodyUnderflow {
        offset: usize,
        size: usize,
    },

    /// A value in the body failed to decode
    #[error("Failed to decode a value from a {kind:?} message body: {source}")]
    Decode {
        kind: EventKind,
        #[source]
        source: SerdeErr,
    },

    /// The header carried a kind tag nobody registered
    #[error("Unknown event kind tag {tag}. Both sides of a timestream must agree on the event kinds in use")]
    UnknownKind {
        tag: u8,
    },

    /// The message kind was not what the reader expected
    #[error("Expected a {expected:?} message but received {actual:?}")]
    UnexpectedKind {
        expected: EventKind,
        actual: EventKind,
    },

    /// The framed header disagreed with the number of body bytes present
    #[error("Message header declares a {declared} byte body but {actual} bytes follow it")]
    SizeMismatch {
        declared: u32,
        actual: usize,
    },

    /// Not enough bytes for a header
    #[error("Truncated message frame of {length} bytes, a header needs {header} bytes")]
    TruncatedHeader {
        length: usize,
        header: usize,
    },
}
