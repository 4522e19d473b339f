use crate::SerdeErr;

/// Reads bits in the order a `BitWriter` produced them.
pub struct BitReader<'b> {
    buffer: &'b [u8],
    bit_index: usize,
}

impl<'b> BitReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            bit_index: 0,
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, SerdeErr> {
        let available = self.buffer.len() * 8;
        if self.bit_index >= available {
            return Err(SerdeErr::OutOfBits {
                offset: self.bit_index,
                available,
            });
        }

        let byte = self.buffer[self.bit_index / 8];
        let bit = (byte >> (self.bit_index % 8)) & 1 != 0;
        self.bit_index += 1;
        Ok(bit)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let mut output: u8 = 0;
        for shift in 0..8 {
            if self.read_bit()? {
                output |= 1 << shift;
            }
        }
        Ok(output)
    }

    pub fn bits_read(&self) -> usize {
        self.bit_index
    }

    /// Number of whole bytes touched so far, counting a partial byte as consumed
    pub fn bytes_consumed(&self) -> usize {
        (self.bit_index + 7) / 8
    }

    pub fn bits_remaining(&self) -> usize {
        (self.buffer.len() * 8).saturating_sub(self.bit_index)
    }
}
