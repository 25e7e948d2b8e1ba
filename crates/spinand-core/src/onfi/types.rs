//! ONFI parameter page layout

/// Signature at offset 0 of a valid parameter page
pub const ONFI_SIGNATURE: [u8; 4] = *b"ONFI";

/// Length of the parameter page in bytes
pub const PARAMETER_PAGE_LEN: usize = 256;

/// Row holding the parameter page while OTP access is enabled
pub const PARAMETER_PAGE_ROW: u32 = 1;

// Byte offsets of the fields used by the driver
const OFFSET_PAGE_SIZE: usize = 80;
const OFFSET_OOB_SIZE: usize = 84;
const OFFSET_PAGES_PER_BLOCK: usize = 92;
const OFFSET_BLOCK_COUNT: usize = 96;
const OFFSET_ECC_BITS: usize = 112;
const OFFSET_READ_RECOVERY: usize = 167;
const OFFSET_CONTINUOUS_READ: usize = 168;

const READ_RECOVERY_BIT: u8 = 1 << 0;
const CONTINUOUS_READ_BIT: u8 = 1 << 1;

/// Fields of the ONFI parameter page used by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterPage {
    /// Bytes 0-3, must equal "ONFI"
    pub signature: [u8; 4],
    /// Data bytes per page
    pub page_size: u32,
    /// Spare (OOB) bytes per page
    pub oob_size: u16,
    /// Pages per block
    pub pages_per_block: u16,
    /// Blocks per device
    pub block_count: u16,
    /// Bits of ECC correctability required per step (0 = on-die ECC)
    pub ecc_bits: u8,
    /// Device supports read recovery modes
    pub read_recovery: bool,
    /// Device supports continuous read
    pub continuous_read: bool,
}

fn le16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

impl ParameterPage {
    /// Parse a raw parameter page
    ///
    /// Multi-byte fields are little-endian. The signature is not checked
    /// here; see [`is_valid`](Self::is_valid).
    pub fn parse(buf: &[u8; PARAMETER_PAGE_LEN]) -> Self {
        Self {
            signature: [buf[0], buf[1], buf[2], buf[3]],
            page_size: u32::from_le_bytes([
                buf[OFFSET_PAGE_SIZE],
                buf[OFFSET_PAGE_SIZE + 1],
                buf[OFFSET_PAGE_SIZE + 2],
                0,
            ]),
            oob_size: le16(buf, OFFSET_OOB_SIZE),
            pages_per_block: le16(buf, OFFSET_PAGES_PER_BLOCK),
            block_count: le16(buf, OFFSET_BLOCK_COUNT),
            ecc_bits: buf[OFFSET_ECC_BITS],
            read_recovery: buf[OFFSET_READ_RECOVERY] & READ_RECOVERY_BIT != 0,
            continuous_read: buf[OFFSET_CONTINUOUS_READ] & CONTINUOUS_READ_BIT != 0,
        }
    }

    /// Check the "ONFI" signature
    pub fn is_valid(&self) -> bool {
        self.signature == ONFI_SIGNATURE
    }

    /// Serialize into a raw parameter page with a valid signature
    ///
    /// Bytes not covered by the fields above are left zero.
    pub fn encode(&self) -> [u8; PARAMETER_PAGE_LEN] {
        let mut buf = [0u8; PARAMETER_PAGE_LEN];
        buf[..4].copy_from_slice(&ONFI_SIGNATURE);
        buf[OFFSET_PAGE_SIZE..OFFSET_PAGE_SIZE + 3]
            .copy_from_slice(&self.page_size.to_le_bytes()[..3]);
        buf[OFFSET_OOB_SIZE..OFFSET_OOB_SIZE + 2].copy_from_slice(&self.oob_size.to_le_bytes());
        buf[OFFSET_PAGES_PER_BLOCK..OFFSET_PAGES_PER_BLOCK + 2]
            .copy_from_slice(&self.pages_per_block.to_le_bytes());
        buf[OFFSET_BLOCK_COUNT..OFFSET_BLOCK_COUNT + 2]
            .copy_from_slice(&self.block_count.to_le_bytes());
        buf[OFFSET_ECC_BITS] = self.ecc_bits;
        if self.read_recovery {
            buf[OFFSET_READ_RECOVERY] |= READ_RECOVERY_BIT;
        }
        if self.continuous_read {
            buf[OFFSET_CONTINUOUS_READ] |= CONTINUOUS_READ_BIT;
        }
        buf
    }
}
