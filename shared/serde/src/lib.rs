//! # Intercession Serde
//! Bit-level serialization for messages that cross timeslice boundaries.
//! Values are written in the order they are pushed and must be read back in
//! that same order.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bit_reader;
mod bit_writer;
mod error;
mod integer;
mod serde;

pub use bit_reader::BitReader;
pub use bit_writer::{BitCounter, BitWrite, BitWriter};
pub use error::SerdeErr;
pub use integer::{
    SerdeInteger, SignedInteger, SignedVariableInteger, UnsignedInteger, UnsignedVariableInteger,
};
pub use serde::{ConstBitLength, Serde};
