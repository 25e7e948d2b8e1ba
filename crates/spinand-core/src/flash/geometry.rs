//! Device geometry derived from the ONFI parameter page

use crate::ecc::{ecc_bytes, field_degree, ECC_LAYOUT_OFFSET, ECC_STEP_SIZE};
use crate::error::{GeometryFailure, Result};
use crate::onfi::ParameterPage;

/// Immutable description of the attached device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceGeometry {
    /// Data bytes per page
    pub page_size: u32,
    /// OOB bytes per page
    pub oob_size: u32,
    /// Pages per block
    pub page_count: u32,
    /// Number of blocks
    pub block_count: u32,
    /// Bytes per block (`page_size * page_count`)
    pub block_size: u32,
    /// Total data bytes (`block_size * block_count`)
    pub flash_size: u32,
    /// log2(page_size)
    pub page_shift: u8,
    /// log2(block_size)
    pub block_shift: u8,
    /// Software ECC strength in bits per step (0 = on-die ECC)
    pub ecc_bit_strength: u8,
    /// Code bytes per step
    pub ecc_byte_count: u8,
    /// Steps per page
    pub ecc_step_count: u8,
    /// Data bytes per step
    pub ecc_step_size: u32,
    /// Offset of the first code in the OOB area
    pub ecc_layout_offset: u8,
    /// Device supports read recovery modes
    pub read_recovery_capable: bool,
    /// Device supports continuous read
    pub continuous_read_capable: bool,
}

impl DeviceGeometry {
    /// Derive the geometry from a validated parameter page
    ///
    /// Only 2048/4096 byte pages with 64/128/256 pages per block are
    /// supported.
    pub fn from_parameter_page(page: &ParameterPage) -> Result<Self> {
        let unsupported = GeometryFailure::UnsupportedGeometry {
            page_size: page.page_size,
            page_count: page.pages_per_block,
        };

        let page_shift: u8 = match page.page_size {
            2048 => 11,
            4096 => 12,
            _ => return Err(unsupported.into()),
        };
        let pages_shift: u8 = match page.pages_per_block {
            64 => 6,
            128 => 7,
            256 => 8,
            _ => return Err(unsupported.into()),
        };

        let page_count = page.pages_per_block as u32;
        let block_count = page.block_count as u32;
        let block_size = page.page_size * page_count;
        let flash_size = block_size
            .checked_mul(block_count)
            .filter(|&size| size > 0)
            .ok_or(unsupported)?;

        let (ecc_byte_count, ecc_step_count) = if page.ecc_bits > 0 {
            let bytes = ecc_bytes(field_degree(ECC_STEP_SIZE), page.ecc_bits as u32);
            (bytes as u8, (page.page_size as usize / ECC_STEP_SIZE) as u8)
        } else {
            (0, 0)
        };

        Ok(Self {
            page_size: page.page_size,
            oob_size: page.oob_size as u32,
            page_count,
            block_count,
            block_size,
            flash_size,
            page_shift,
            block_shift: page_shift + pages_shift,
            ecc_bit_strength: page.ecc_bits,
            ecc_byte_count,
            ecc_step_count,
            ecc_step_size: ECC_STEP_SIZE as u32,
            ecc_layout_offset: ECC_LAYOUT_OFFSET as u8,
            read_recovery_capable: page.read_recovery,
            continuous_read_capable: page.continuous_read,
        })
    }

    /// Page index (row address) of a byte address
    pub fn row(&self, addr: u32) -> u32 {
        addr >> self.page_shift
    }

    /// Byte offset within the page (column address)
    pub fn column(&self, addr: u32) -> u32 {
        addr & (self.page_size - 1)
    }

    /// Byte address of the first byte of a row
    pub fn row_addr(&self, row: u32) -> u32 {
        row << self.page_shift
    }

    /// Returns true if `addr` is on a block boundary
    pub fn is_block_aligned(&self, addr: u32) -> bool {
        addr & (self.block_size - 1) == 0
    }

    /// Returns true if `[addr, addr + len)` lies within the device
    pub fn contains(&self, addr: u32, len: usize) -> bool {
        addr as u64 + len as u64 <= self.flash_size as u64
    }

    /// Returns true if the device has no on-die ECC and needs software ECC
    pub fn uses_software_ecc(&self) -> bool {
        self.ecc_bit_strength > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::onfi::ONFI_SIGNATURE;

    fn page(page_size: u32, pages_per_block: u16, block_count: u16) -> ParameterPage {
        ParameterPage {
            signature: ONFI_SIGNATURE,
            page_size,
            oob_size: 64,
            pages_per_block,
            block_count,
            ..Default::default()
        }
    }

    #[test]
    fn test_2k_64_1024() {
        let geo = DeviceGeometry::from_parameter_page(&page(2048, 64, 1024)).unwrap();
        assert_eq!(geo.block_size, 131072);
        assert_eq!(geo.flash_size, 134217728);
        assert_eq!(geo.page_shift, 11);
        assert_eq!(geo.block_shift, 17);
        assert!(!geo.uses_software_ecc());
        assert_eq!(geo.ecc_step_count, 0);
    }

    #[test]
    fn test_4k_256() {
        let geo = DeviceGeometry::from_parameter_page(&page(4096, 256, 2048)).unwrap();
        assert_eq!(geo.page_shift, 12);
        assert_eq!(geo.block_shift, 20);
        assert_eq!(geo.block_size, 1 << 20);
        assert_eq!(geo.flash_size, 2048 << 20);
    }

    #[test]
    fn test_unsupported_combinations() {
        for (size, ppb) in [(512, 64), (2048, 32), (8192, 128), (4096, 512)] {
            assert_eq!(
                DeviceGeometry::from_parameter_page(&page(size, ppb, 1024)),
                Err(Error::GeometryDiscovery(GeometryFailure::UnsupportedGeometry {
                    page_size: size,
                    page_count: ppb,
                }))
            );
        }
    }

    #[test]
    fn test_software_ecc_fields() {
        let mut p = page(2048, 64, 1024);
        p.ecc_bits = 8;
        p.read_recovery = true;
        let geo = DeviceGeometry::from_parameter_page(&p).unwrap();
        assert!(geo.uses_software_ecc());
        assert_eq!(geo.ecc_byte_count, 12);
        assert_eq!(geo.ecc_step_count, 4);
        assert_eq!(geo.ecc_step_size, 410);
        assert_eq!(geo.ecc_layout_offset, 2);
        assert!(geo.read_recovery_capable);
    }

    #[test]
    fn test_address_split() {
        let geo = DeviceGeometry::from_parameter_page(&page(2048, 64, 1024)).unwrap();
        let addr = 5 * 2048 + 100;
        assert_eq!(geo.row(addr), 5);
        assert_eq!(geo.column(addr), 100);
        assert_eq!(geo.row_addr(5), 5 * 2048);
        assert!(geo.is_block_aligned(3 * 131072));
        assert!(!geo.is_block_aligned(2048));
        assert!(geo.contains(geo.flash_size - 10, 10));
        assert!(!geo.contains(geo.flash_size - 10, 11));
    }
}
