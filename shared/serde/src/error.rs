use thiserror::Error;

/// Errors raised while reading or constructing serialized values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The reader reached the end of its buffer
    #[error("BitReader ran out of bits at bit offset {offset} (buffer holds {available} bits)")]
    OutOfBits { offset: usize, available: usize },

    /// The bits read do not describe a valid value of the requested type
    #[error("Invalid encoded value for type {type_name}")]
    InvalidValue { type_name: &'static str },

    /// An integer does not fit into the configured number of bits
    #[error("Integer {value} cannot be encoded with {bits} bits (signed: {signed})")]
    IntegerOutOfRange { value: i128, bits: u8, signed: bool },
}
