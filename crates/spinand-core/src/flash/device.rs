//! Generic flash device trait
//!
//! [`FlashDevice`] is the address-based view of the device used by code that
//! does not care about pages, OOB or ECC. [`SpiNand`] implements it on top of
//! its chunked read/program/erase paths.

use alloc::vec::Vec;

use crate::error::Result;
use crate::programmer::SequenceController;

use super::context::SpiNand;

/// Address-based flash access
///
/// # Example
///
/// ```ignore
/// use spinand_core::flash::FlashDevice;
///
/// fn read_first_block<D: FlashDevice>(device: &mut D) -> Result<Vec<u8>> {
///     let mut buf = vec![0u8; device.erase_granularity() as usize];
///     device.read(0, &mut buf)?;
///     Ok(buf)
/// }
/// ```
pub trait FlashDevice {
    /// Total data size in bytes
    fn size(&self) -> u32;

    /// Smallest erasable unit in bytes
    fn erase_granularity(&self) -> u32;

    /// Program unit in bytes
    fn page_size(&self) -> u32;

    /// Read `buf.len()` bytes starting at `addr`
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()>;

    /// Write `data` starting at `addr`
    ///
    /// The target region should be erased first.
    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()>;

    /// Erase `len` bytes starting at `addr`
    ///
    /// Both must be multiples of [`erase_granularity`](Self::erase_granularity).
    fn erase(&mut self, addr: u32, len: u32) -> Result<()>;

    /// Whether `addr..addr + len` lies inside the data area
    fn is_valid_range(&self, addr: u32, len: usize) -> bool {
        addr as u64 + len as u64 <= self.size() as u64
    }
}

/// Helpers built on [`FlashDevice`]
pub trait FlashDeviceExt: FlashDevice {
    /// Read the entire device
    fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut buf = alloc::vec![0u8; self.size() as usize];
        self.read(0, &mut buf)?;
        Ok(buf)
    }

    /// Erase the entire device
    fn erase_all(&mut self) -> Result<()> {
        self.erase(0, self.size())
    }
}

impl<D: FlashDevice + ?Sized> FlashDeviceExt for D {}

impl<C: SequenceController> FlashDevice for SpiNand<C> {
    fn size(&self) -> u32 {
        self.geometry().flash_size
    }

    fn erase_granularity(&self) -> u32 {
        self.geometry().block_size
    }

    fn page_size(&self) -> u32 {
        self.geometry().page_size
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        SpiNand::read(self, addr, buf)
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        SpiNand::write(self, addr, data)
    }

    fn erase(&mut self, addr: u32, len: u32) -> Result<()> {
        SpiNand::erase(self, addr, len)
    }
}
