use std::fmt;

/// Number of bits shown per register.
pub const BITS_PER_REGISTER: usize = 8;

/// The binary form of a register value, most significant bit first.
///
/// Always derived from a value, never stored next to one, so it cannot
/// drift out of sync with the register it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BitVector([bool; BITS_PER_REGISTER]);

impl BitVector {
    /// Expand a value into its eight bits, index 0 carrying weight 128.
    pub fn from_value(value: u8) -> Self {
        let mut bits = [false; BITS_PER_REGISTER];
        for (pos, bit) in bits.iter_mut().enumerate() {
            *bit = value & (0x80 >> pos) != 0;
        }
        BitVector(bits)
    }

    /// Reassemble the value as the sum of `bit[i] * 2^(7 - i)`.
    pub fn to_value(&self) -> u8 {
        self.0
            .iter()
            .fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit))
    }

    /// Bit at `pos` (0 = MSB), or `None` past the end.
    pub fn get(&self, pos: usize) -> Option<bool> {
        self.0.get(pos).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    pub fn as_array(&self) -> &[bool; BITS_PER_REGISTER] {
        &self.0
    }

    pub fn len(&self) -> usize {
        BITS_PER_REGISTER
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl From<u8> for BitVector {
    fn from(value: u8) -> Self {
        BitVector::from_value(value)
    }
}

impl From<BitVector> for u8 {
    fn from(bits: BitVector) -> Self {
        bits.to_value()
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Weight of the bit at `pos`, where position 0 is the MSB (128) and
/// position 7 the LSB (1). `None` for positions past the register.
pub fn weight(pos: usize) -> Option<u8> {
    if pos < BITS_PER_REGISTER {
        Some(0x80 >> pos)
    } else {
        None
    }
}
