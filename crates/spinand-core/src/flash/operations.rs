//! Read, program and erase paths
//!
//! Byte ranges are split into page-bounded chunks. Each chunk is one page
//! read (or program) cycle: on-die ECC devices transfer only the requested
//! columns, software ECC devices always move the full page plus OOB through
//! the page buffer so every step can be decoded or encoded.

use core::ops::Range;

use crate::ecc::{EccContext, EccStatus};
use crate::error::{Error, Result};
use crate::programmer::SequenceController;
use crate::protocol::nand;
use crate::protocol::{features, EccState, Status};

use super::context::SpiNand;

/// One page-bounded piece of a byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChunk {
    /// Page index
    pub row: u32,
    /// Byte offset within the page
    pub column: u32,
    /// Offset into the caller's buffer
    pub offset: usize,
    /// Bytes in this chunk
    pub len: usize,
}

impl PageChunk {
    /// Range of the caller's buffer covered by this chunk
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }

    /// Range of the page covered by this chunk
    pub fn columns(&self) -> Range<usize> {
        self.column as usize..self.column as usize + self.len
    }
}

/// Iterator splitting `[addr, addr + len)` at page boundaries
///
/// The first chunk starts at `addr % page_size`; every following chunk
/// starts at column 0.
#[derive(Debug, Clone)]
pub struct PageChunks {
    page_size: u32,
    page_shift: u32,
    addr: u32,
    offset: usize,
    remaining: usize,
}

impl PageChunks {
    /// Split a range for a device with `page_size` byte pages (a power of two)
    pub fn new(page_size: u32, addr: u32, len: usize) -> Self {
        Self {
            page_size,
            page_shift: page_size.trailing_zeros(),
            addr,
            offset: 0,
            remaining: len,
        }
    }
}

impl Iterator for PageChunks {
    type Item = PageChunk;

    fn next(&mut self) -> Option<PageChunk> {
        if self.remaining == 0 {
            return None;
        }

        let column = self.addr & (self.page_size - 1);
        let len = self.remaining.min((self.page_size - column) as usize);
        let chunk = PageChunk {
            row: self.addr >> self.page_shift,
            column,
            offset: self.offset,
            len,
        };

        self.addr = self.addr.wrapping_add(self.page_size) & !(self.page_size - 1);
        self.offset += len;
        self.remaining -= len;
        Some(chunk)
    }
}

/// Outcome of decoding every step of a page
#[derive(Debug, Clone, Copy, Default)]
struct PageDecode {
    max_bitflips: u8,
    total_bitflips: u32,
}

/// Decode a page buffer in place, `None` if any step is uncorrectable
fn decode_page(ecc: &EccContext, buf: &mut [u8]) -> Option<PageDecode> {
    let mut decoded = PageDecode::default();
    for step in 0..ecc.steps() {
        match ecc.decode_step(buf, step) {
            EccStatus::Uncorrectable => {
                log::debug!("ECC step {} uncorrectable", step);
                return None;
            }
            status => {
                let flips = status.bitflips().unwrap_or(0);
                decoded.max_bitflips = decoded.max_bitflips.max(flips);
                decoded.total_bitflips += flips as u32;
            }
        }
    }
    Some(decoded)
}

impl<C: SequenceController> SpiNand<C> {
    /// Read `buf.len()` bytes starting at `addr`
    ///
    /// Multi-page reads starting on a page boundary use continuous read when
    /// the device and configuration allow it.
    pub fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.check_range(addr, buf.len())?;
        if buf.is_empty() {
            return Ok(());
        }

        if self.continuous_read_applies(addr, buf.len()) {
            return self.read_continuous(addr, buf);
        }

        for chunk in PageChunks::new(self.geometry.page_size, addr, buf.len()) {
            let out = &mut buf[chunk.range()];
            if self.ecc.is_some() {
                self.read_chunk_software(chunk, out)?;
            } else {
                self.read_chunk_ondie(chunk, out)?;
            }
        }
        Ok(())
    }

    /// Write `data` starting at `addr`
    ///
    /// Target pages must be erased. With software ECC every touched page is
    /// programmed in full; bytes outside `data` are written as 0xFF.
    pub fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.check_range(addr, data.len())?;

        for chunk in PageChunks::new(self.geometry.page_size, addr, data.len()) {
            let src = &data[chunk.range()];
            if self.ecc.is_some() {
                self.write_chunk_software(chunk, src)?;
            } else {
                self.write_chunk_ondie(chunk, src)?;
            }
        }
        Ok(())
    }

    /// Erase `len` bytes starting at `addr`
    ///
    /// Both `addr` and `len` must be multiples of the block size and the
    /// range must lie within the device.
    pub fn erase(&mut self, addr: u32, len: u32) -> Result<()> {
        let block_size = self.geometry.block_size;
        if len == 0
            || !self.geometry.is_block_aligned(addr)
            || len % block_size != 0
            || !self.geometry.contains(addr, len as usize)
        {
            log::debug!("Rejecting erase of 0x{:X} bytes at 0x{:08X}", len, addr);
            return Err(Error::InvalidArgument);
        }

        for block in (0..len / block_size).map(|i| addr + i * block_size) {
            features::write_enable(&mut self.dispatcher)?;
            nand::block_erase(&mut self.dispatcher, self.geometry.row(block))?;
            let status = self.wait(self.config.erase_timeout_us)?;
            if status.contains(Status::ERASE_FAIL) {
                return Err(Error::EraseFailed { addr: block });
            }
            log::trace!("Erased block at 0x{:08X}", block);
        }
        Ok(())
    }

    /// Read the OOB area of page `row`
    ///
    /// The data is returned raw; software ECC codes are not interpreted.
    pub fn read_oob(&mut self, row: u32, buf: &mut [u8]) -> Result<()> {
        self.check_oob(row, buf.len())?;
        nand::page_read(&mut self.dispatcher, row)?;
        self.wait(self.config.read_timeout_us)?;
        nand::read_from_cache(
            &mut self.dispatcher,
            self.config.read_instruction.op(),
            self.geometry.page_size,
            buf,
        )
    }

    /// Program the OOB area of page `row`, leaving the page data untouched
    pub fn write_oob(&mut self, row: u32, data: &[u8]) -> Result<()> {
        self.check_oob(row, data.len())?;
        features::write_enable(&mut self.dispatcher)?;
        nand::page_load(
            &mut self.dispatcher,
            self.config.program_instruction.load_op(),
            self.geometry.page_size,
            data,
        )?;
        self.program_row(row)
    }

    /// Read consecutive pages with the sequential cache read commands
    ///
    /// `addr` must be page aligned. Devices using software ECC fall back to
    /// [`read`](Self::read) since the sequential commands only return page
    /// data.
    pub fn read_sequential(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.check_range(addr, buf.len())?;
        if self.geometry.column(addr) != 0 {
            return Err(Error::InvalidArgument);
        }
        if buf.is_empty() {
            return Ok(());
        }
        if self.ecc.is_some() {
            log::debug!("Sequential read with software ECC, using page reads");
            return self.read(addr, buf);
        }

        let op = self.config.read_instruction.op();
        nand::page_read(&mut self.dispatcher, self.geometry.row(addr))?;
        self.wait(self.config.read_timeout_us)?;

        let mut chunks = PageChunks::new(self.geometry.page_size, addr, buf.len()).peekable();
        while let Some(chunk) = chunks.next() {
            if chunks.peek().is_some() {
                nand::read_cache_sequential(&mut self.dispatcher)?;
            } else {
                nand::read_cache_end(&mut self.dispatcher)?;
            }
            let status = self.wait(self.config.read_timeout_us)?;
            nand::read_from_cache(&mut self.dispatcher, op, 0, &mut buf[chunk.range()])?;
            self.check_ondie_ecc(status, self.geometry.row_addr(chunk.row))?;
        }
        Ok(())
    }

    fn check_range(&self, addr: u32, len: usize) -> Result<()> {
        if self.geometry.contains(addr, len) {
            Ok(())
        } else {
            log::debug!("Range 0x{:08X}+0x{:X} outside device", addr, len);
            Err(Error::InvalidArgument)
        }
    }

    fn check_oob(&self, row: u32, len: usize) -> Result<()> {
        let rows = self.geometry.flash_size >> self.geometry.page_shift;
        if row < rows && len <= self.geometry.oob_size as usize {
            Ok(())
        } else {
            Err(Error::InvalidArgument)
        }
    }

    fn wait(&mut self, timeout_us: u32) -> Result<Status> {
        features::wait_ready(&mut self.dispatcher, self.config.poll_delay_us, timeout_us)
    }

    fn check_ondie_ecc(&mut self, status: Status, addr: u32) -> Result<()> {
        match status.ecc_state() {
            EccState::Uncorrectable => {
                self.stats.uncorrectable += 1;
                log::debug!("On-die ECC uncorrectable at 0x{:08X}", addr);
                Err(Error::EccUncorrectable { addr })
            }
            EccState::Corrected | EccState::Reserved => {
                log::debug!("On-die ECC corrected bitflips at 0x{:08X}", addr);
                Ok(())
            }
            EccState::Clean => Ok(()),
        }
    }

    fn program_row(&mut self, row: u32) -> Result<()> {
        nand::program_execute(&mut self.dispatcher, row)?;
        let status = self.wait(self.config.program_timeout_us)?;
        if status.contains(Status::PROGRAM_FAIL) {
            return Err(Error::ProgramFailed {
                addr: self.geometry.row_addr(row),
            });
        }
        Ok(())
    }

    fn read_chunk_ondie(&mut self, chunk: PageChunk, out: &mut [u8]) -> Result<()> {
        nand::page_read(&mut self.dispatcher, chunk.row)?;
        self.wait(self.config.read_timeout_us)?;
        nand::read_from_cache(
            &mut self.dispatcher,
            self.config.read_instruction.op(),
            chunk.column,
            out,
        )?;
        let status = features::get_status(&mut self.dispatcher)?;
        self.check_ondie_ecc(status, self.geometry.row_addr(chunk.row))
    }

    fn write_chunk_ondie(&mut self, chunk: PageChunk, data: &[u8]) -> Result<()> {
        features::write_enable(&mut self.dispatcher)?;
        nand::page_load(
            &mut self.dispatcher,
            self.config.program_instruction.load_op(),
            chunk.column,
            data,
        )?;
        self.program_row(chunk.row)
    }

    fn continuous_read_applies(&self, addr: u32, len: usize) -> bool {
        self.ecc.is_none()
            && self.geometry.continuous_read_capable
            && self.config.use_continuous_read
            && self.geometry.column(addr) == 0
            && len > self.geometry.page_size as usize
    }

    fn read_continuous(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        log::debug!("Continuous read of 0x{:X} bytes at 0x{:08X}", buf.len(), addr);
        features::continuous_read_enable(&mut self.dispatcher)?;
        let result = self.stream_pages(addr, buf);
        let disabled = features::continuous_read_disable(&mut self.dispatcher);
        result.and(disabled)
    }

    fn stream_pages(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        nand::page_read(&mut self.dispatcher, self.geometry.row(addr))?;
        self.wait(self.config.read_timeout_us)?;
        nand::read_from_cache(&mut self.dispatcher, self.config.read_instruction.op(), 0, buf)?;

        let status = features::get_status(&mut self.dispatcher)?;
        if status.ecc_state() != EccState::Clean {
            let warning = nand::ecc_warning(&mut self.dispatcher)?;
            log::debug!(
                "On-die ECC flagged pages {}..={} during continuous read",
                warning.first,
                warning.last
            );
        }
        self.check_ondie_ecc(status, addr)
    }

    fn load_raw_page(&mut self, row: u32) -> Result<()> {
        nand::page_read(&mut self.dispatcher, row)?;
        self.wait(self.config.read_timeout_us)?;
        nand::read_from_cache(
            &mut self.dispatcher,
            self.config.read_instruction.op(),
            0,
            &mut self.page_buf,
        )
    }

    fn decode_buffered(&mut self) -> Option<PageDecode> {
        match &self.ecc {
            Some(ecc) => decode_page(ecc, &mut self.page_buf),
            None => Some(PageDecode::default()),
        }
    }

    /// Read and decode page `row`, stepping through the recovery modes while
    /// it stays uncorrectable. `mode` is left at the last mode entered.
    fn read_recovering(&mut self, row: u32, mode: &mut u8) -> Result<Option<PageDecode>> {
        self.load_raw_page(row)?;
        let mut decoded = self.decode_buffered();

        while decoded.is_none()
            && self.geometry.read_recovery_capable
            && *mode < self.config.recovery_modes
        {
            *mode += 1;
            log::debug!("Page {} uncorrectable, retrying in recovery mode {}", row, mode);
            features::set_recovery_mode(&mut self.dispatcher, *mode)?;
            self.load_raw_page(row)?;
            decoded = self.decode_buffered();
        }
        Ok(decoded)
    }

    fn read_chunk_software(&mut self, chunk: PageChunk, out: &mut [u8]) -> Result<()> {
        let addr = self.geometry.row_addr(chunk.row);
        let mut mode = 0;
        let decoded = self.read_recovering(chunk.row, &mut mode);

        // RESET is the only way out of a recovery mode
        let exited = if mode > 0 {
            nand::reset(&mut self.dispatcher)
        } else {
            Ok(())
        };
        let decoded = decoded?;
        exited?;

        let Some(decoded) = decoded else {
            self.stats.uncorrectable += 1;
            log::warn!(
                "Page at 0x{:08X} uncorrectable after {} recovery modes",
                addr,
                mode
            );
            return Err(Error::EccUncorrectable { addr });
        };

        if mode > 0 {
            self.stats.recoveries += 1;
            log::debug!("Page at 0x{:08X} recovered in mode {}", addr, mode);
        }
        self.stats.corrected_bits += decoded.total_bitflips;
        out.copy_from_slice(&self.page_buf[chunk.columns()]);

        if self.config.ecc_threshold > 0 && decoded.max_bitflips >= self.config.ecc_threshold {
            self.stats.threshold_warnings += 1;
            if self.config.strict_ecc_threshold {
                return Err(Error::EccThresholdWarning {
                    addr,
                    bitflips: decoded.max_bitflips,
                });
            }
            log::warn!(
                "Page at 0x{:08X} needed {} corrections in one ECC step",
                addr,
                decoded.max_bitflips
            );
        }
        Ok(())
    }

    fn write_chunk_software(&mut self, chunk: PageChunk, data: &[u8]) -> Result<()> {
        let page_size = self.geometry.page_size as usize;
        self.page_buf.fill(0xFF);
        self.page_buf[chunk.columns()].copy_from_slice(data);
        if let Some(ecc) = &self.ecc {
            ecc.encode_page(&mut self.page_buf);
        }

        let program = self.config.program_instruction;
        features::write_enable(&mut self.dispatcher)?;
        nand::page_load(
            &mut self.dispatcher,
            program.load_op(),
            0,
            &self.page_buf[..page_size],
        )?;
        nand::page_load(
            &mut self.dispatcher,
            program.random_load_op(),
            page_size as u32,
            &self.page_buf[page_size..],
        )?;
        self.program_row(chunk.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_aligned() {
        let chunks: heapless::Vec<PageChunk, 8> = PageChunks::new(2048, 4096, 4096).collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], PageChunk { row: 2, column: 0, offset: 0, len: 2048 });
        assert_eq!(chunks[1], PageChunk { row: 3, column: 0, offset: 2048, len: 2048 });
    }

    #[test]
    fn test_chunks_unaligned() {
        // Starts 100 bytes into page 1, ends 50 bytes into page 3
        let chunks: heapless::Vec<PageChunk, 8> =
            PageChunks::new(2048, 2048 + 100, 1948 + 2048 + 50).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], PageChunk { row: 1, column: 100, offset: 0, len: 1948 });
        assert_eq!(chunks[1], PageChunk { row: 2, column: 0, offset: 1948, len: 2048 });
        assert_eq!(chunks[2], PageChunk { row: 3, column: 0, offset: 3996, len: 50 });
        assert_eq!(chunks[0].columns(), 100..2048);
    }

    #[test]
    fn test_chunks_within_page() {
        let chunks: heapless::Vec<PageChunk, 8> = PageChunks::new(4096, 10, 20).collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], PageChunk { row: 0, column: 10, offset: 0, len: 20 });
    }

    #[test]
    fn test_chunks_empty() {
        assert_eq!(PageChunks::new(2048, 0, 0).count(), 0);
    }
}
