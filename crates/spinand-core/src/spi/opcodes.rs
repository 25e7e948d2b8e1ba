//! SPI-NAND opcodes, feature register addresses and register bits
//!
//! Opcodes follow the Macronix SPI-NAND command set, which is shared by most
//! ONFI-compliant serial NAND parts.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before program, erase and BBM operations
pub const WREN: u8 = 0x06;
/// Write Disable - clears the WEL bit
pub const WRDI: u8 = 0x04;

// ============================================================================
// Identification and power
// ============================================================================

/// Read ID (manufacturer + device)
pub const RDID: u8 = 0x9F;
/// Device reset
pub const RESET: u8 = 0xFF;
/// Deep power-down
pub const DP: u8 = 0xB9;

// ============================================================================
// Registers
// ============================================================================

/// Read status register
pub const RSR1: u8 = 0x05;
/// Get feature
pub const GET_FEATURE: u8 = 0x0F;
/// Set feature
pub const SET_FEATURE: u8 = 0x1F;
/// Read ECC status register (corrected bit count of the last read)
pub const ECC_STAT_READ: u8 = 0x7C;

// ============================================================================
// Read
// ============================================================================

/// Page read: array to cache
pub const PAGE_READ: u8 = 0x13;
/// Read from cache
pub const READ_CACHE: u8 = 0x03;
/// Read from cache, alternative framing
pub const READ_CACHE_ALT: u8 = 0x0B;
/// Read from cache x2 (1-1-2)
pub const READ_CACHE_X2: u8 = 0x3B;
/// Read from cache x4 (1-1-4)
pub const READ_CACHE_X4: u8 = 0x6B;
/// Read from cache dual I/O (1-2-2)
pub const READ_CACHE_DUAL_IO: u8 = 0xBB;
/// Read from cache quad I/O (1-4-4)
pub const READ_CACHE_QUAD_IO: u8 = 0xEB;
/// Read cache sequential: move cache to data register and load the next page
pub const READ_CACHE_SEQ: u8 = 0x31;
/// Read cache end: move cache to data register, end the sequence
pub const READ_CACHE_END: u8 = 0x3F;

// ============================================================================
// Program and erase
// ============================================================================

/// Program load: reset cache to 0xFF and load data
pub const PP_LOAD: u8 = 0x02;
/// Program load random data: load data without resetting the cache
pub const PP_RAND_LOAD: u8 = 0x84;
/// Program load x4
pub const PP_LOAD_X4: u8 = 0x32;
/// Program load random data x4
pub const PP_RAND_LOAD_X4: u8 = 0x34;
/// Program execute: cache to array
pub const PROGRAM_EXEC: u8 = 0x10;
/// Block erase
pub const BE: u8 = 0xD8;

// ============================================================================
// Bad block management
// ============================================================================

/// Write a bad-block link (LBA to PBA)
pub const WRITE_BBM: u8 = 0xA1;
/// Read the bad-block link table
pub const READ_BBM: u8 = 0xA5;
/// Read the first/last ECC warning page addresses
pub const ECC_WARNING: u8 = 0xA9;

// ============================================================================
// Feature register addresses
// ============================================================================

/// Block protection register
pub const FEATURE_BLOCK_PROTECTION: u8 = 0xA0;
/// Secure OTP register
pub const FEATURE_SECURE_OTP: u8 = 0xB0;
/// Status register
pub const FEATURE_STATUS: u8 = 0xC0;
/// SPI-NOR emulation enable register
pub const FEATURE_SPI_NOR_EN: u8 = 0x60;
/// Output driver strength register
pub const FEATURE_IO_STRENGTH: u8 = 0xE0;
/// BBM program enable register
pub const FEATURE_ENPGM: u8 = 0x10;
/// Read recovery mode register
pub const FEATURE_SPEC: u8 = 0x70;
