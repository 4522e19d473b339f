use crate::{BitCounter, BitReader, BitWrite, SerdeErr, UnsignedVariableInteger};

/// A type that can be written to and read back from a bit stream.
pub trait Serde: Sized + Clone {
    fn ser(&self, writer: &mut dyn BitWrite);

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr>;

    fn bit_length(&self) -> u32 {
        let mut counter = BitCounter::new();
        self.ser(&mut counter);
        counter.bits_needed()
    }
}

/// Implemented by types that always serialize to the same number of bits.
pub trait ConstBitLength {
    fn const_bit_length() -> u32;
}

impl Serde for bool {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bit(*self);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        reader.read_bit()
    }
}

impl ConstBitLength for bool {
    fn const_bit_length() -> u32 {
        1
    }
}

impl Serde for () {
    fn ser(&self, _writer: &mut dyn BitWrite) {}

    fn de(_reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(())
    }
}

macro_rules! impl_serde_for_number {
    ($($type:ty),*) => {
        $(
            impl Serde for $type {
                fn ser(&self, writer: &mut dyn BitWrite) {
                    writer.write_bytes(&self.to_le_bytes());
                }

                fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
                    let mut bytes = [0u8; std::mem::size_of::<$type>()];
                    for byte in bytes.iter_mut() {
                        *byte = reader.read_byte()?;
                    }
                    Ok(<$type>::from_le_bytes(bytes))
                }
            }

            impl ConstBitLength for $type {
                fn const_bit_length() -> u32 {
                    (std::mem::size_of::<$type>() * 8) as u32
                }
            }
        )*
    };
}

impl_serde_for_number!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        match self {
            Some(value) => {
                writer.write_bit(true);
                value.ser(writer);
            }
            None => writer.write_bit(false),
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        if reader.read_bit()? {
            Ok(Some(T::de(reader)?))
        } else {
            Ok(None)
        }
    }
}

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_length(self.len(), writer);
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let length = read_length(reader)?;
        let mut output = Vec::with_capacity(length.min(1024));
        for _ in 0..length {
            output.push(T::de(reader)?);
        }
        Ok(output)
    }
}

impl<T: Serde, const N: usize> Serde for [T; N] {
    fn ser(&self, writer: &mut dyn BitWrite) {
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::de(reader)?);
        }
        items.try_into().map_err(|_| SerdeErr::InvalidValue {
            type_name: std::any::type_name::<[T; N]>(),
        })
    }
}

impl<A: Serde, B: Serde> Serde for (A, B) {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.0.ser(writer);
        self.1.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok((A::de(reader)?, B::de(reader)?))
    }
}

impl<A: Serde, B: Serde, C: Serde> Serde for (A, B, C) {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.0.ser(writer);
        self.1.ser(writer);
        self.2.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok((A::de(reader)?, B::de(reader)?, C::de(reader)?))
    }
}

fn write_length(length: usize, writer: &mut dyn BitWrite) {
    // a usize always fits in 127 bits
    let prefix = UnsignedVariableInteger::<5>::try_new(length as u64)
        .unwrap_or_else(|_| unreachable!("collection length exceeds 64 bits"));
    prefix.ser(writer);
}

fn read_length(reader: &mut BitReader) -> Result<usize, SerdeErr> {
    UnsignedVariableInteger::<5>::de(reader)?.to::<usize>()
}
