//! Address width types

/// Width of the address phase of a command
///
/// SPI-NAND uses three kinds of address: an 8-bit feature register address,
/// a 16-bit column (byte offset in the cache) and a 24-bit row (page index).
/// The bad-block link command carries a 32-bit LBA/PBA pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum AddressWidth {
    /// No address phase
    #[default]
    None,
    /// 8-bit address (feature registers)
    OneByte,
    /// 16-bit address (cache column)
    TwoByte,
    /// 24-bit address (page row)
    ThreeByte,
    /// 32-bit address
    FourByte,
}

impl AddressWidth {
    /// Returns the number of address bytes
    pub const fn bytes(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::OneByte => 1,
            Self::TwoByte => 2,
            Self::ThreeByte => 3,
            Self::FourByte => 4,
        }
    }

    /// Returns the number of address bits
    pub const fn bits(&self) -> u8 {
        self.bytes() * 8
    }

    /// Truncate an address to the bits carried by this width
    pub const fn mask(&self, address: u32) -> u32 {
        match self {
            Self::None => 0,
            Self::FourByte => address,
            _ => address & ((1u32 << self.bits()) - 1),
        }
    }

    /// Encode an address into bytes (MSB first)
    pub fn encode(&self, address: u32, buf: &mut [u8]) {
        let n = self.bytes() as usize;
        for (i, byte) in buf.iter_mut().take(n).enumerate() {
            *byte = (address >> (8 * (n - 1 - i))) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_and_encode() {
        assert_eq!(AddressWidth::None.mask(0x1234), 0);
        assert_eq!(AddressWidth::OneByte.mask(0x1C0), 0xC0);
        assert_eq!(AddressWidth::TwoByte.mask(0x12_0840), 0x0840);
        assert_eq!(AddressWidth::FourByte.mask(0xDEAD_BEEF), 0xDEAD_BEEF);

        let mut buf = [0u8; 4];
        AddressWidth::ThreeByte.encode(0x01_0203, &mut buf);
        assert_eq!(&buf[..3], &[0x01, 0x02, 0x03]);
    }
}
