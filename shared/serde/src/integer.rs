use crate::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr};

pub type UnsignedInteger<const BITS: u8> = SerdeInteger<false, false, BITS>;
pub type SignedInteger<const BITS: u8> = SerdeInteger<true, false, BITS>;
pub type UnsignedVariableInteger<const BITS: u8> = SerdeInteger<false, true, BITS>;
pub type SignedVariableInteger<const BITS: u8> = SerdeInteger<true, true, BITS>;

/// An integer written with a configurable number of bits.
///
/// Fixed integers always take `BITS` bits (plus a sign bit when signed).
/// Variable integers are written in `BITS`-sized groups, each preceded by a
/// continuation bit, so small values stay small on the wire.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SerdeInteger<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> {
    value: i128,
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> SerdeInteger<SIGNED, VARIABLE, BITS> {
    pub fn try_new<T: Into<i128>>(value: T) -> Result<Self, SerdeErr> {
        let value = value.into();
        let out_of_range = SerdeErr::IntegerOutOfRange {
            value,
            bits: BITS,
            signed: SIGNED,
        };

        if BITS == 0 || BITS > 127 {
            return Err(out_of_range);
        }
        if !SIGNED && value < 0 {
            return Err(out_of_range);
        }
        if !VARIABLE && BITS < 127 {
            let limit: i128 = 1_i128 << BITS;
            if value >= limit || value <= -limit {
                return Err(out_of_range);
            }
        }

        Ok(Self { value })
    }

    pub fn get(&self) -> i128 {
        self.value
    }

    pub fn to<T: TryFrom<i128>>(&self) -> Result<T, SerdeErr> {
        T::try_from(self.value).map_err(|_| SerdeErr::InvalidValue {
            type_name: std::any::type_name::<T>(),
        })
    }
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> Serde
    for SerdeInteger<SIGNED, VARIABLE, BITS>
{
    fn ser(&self, writer: &mut dyn BitWrite) {
        if SIGNED {
            writer.write_bit(self.value < 0);
        }

        let mut magnitude = self.value.unsigned_abs();

        if VARIABLE {
            loop {
                let proceed = magnitude >> BITS != 0;
                writer.write_bit(proceed);
                for _ in 0..BITS {
                    writer.write_bit(magnitude & 1 != 0);
                    magnitude >>= 1;
                }
                if !proceed {
                    return;
                }
            }
        } else {
            for _ in 0..BITS {
                writer.write_bit(magnitude & 1 != 0);
                magnitude >>= 1;
            }
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let negative = SIGNED && reader.read_bit()?;

        let mut magnitude: u128 = 0;
        let mut shift: u32 = 0;

        loop {
            let proceed = VARIABLE && reader.read_bit()?;
            for _ in 0..BITS {
                if reader.read_bit()? {
                    if shift >= 127 {
                        return Err(SerdeErr::InvalidValue {
                            type_name: "SerdeInteger",
                        });
                    }
                    magnitude |= 1 << shift;
                }
                shift += 1;
            }
            if !proceed {
                break;
            }
        }

        let value = magnitude as i128;
        Ok(Self {
            value: if negative { -value } else { value },
        })
    }
}

impl<const SIGNED: bool, const BITS: u8> ConstBitLength for SerdeInteger<SIGNED, false, BITS> {
    fn const_bit_length() -> u32 {
        u32::from(BITS) + u32::from(SIGNED)
    }
}
