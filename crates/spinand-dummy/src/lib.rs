//! spinand-dummy - In-memory SPI-NAND emulator for testing
//!
//! [`DummyNand`] implements [`SequenceController`] on top of a simulated
//! serial NAND device: a sequencer LUT, the feature registers, a page cache
//! and a sparse page array. Fault injection hooks make busy timeouts, ECC
//! failures and read recovery testable without hardware.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec;
use alloc::vec::Vec;

use spinand_core::error::{Error, Result};
use spinand_core::onfi::{ParameterPage, ONFI_SIGNATURE, PARAMETER_PAGE_LEN, PARAMETER_PAGE_ROW};
use spinand_core::programmer::{SequenceController, SpiFeatures};
use spinand_core::protocol::bbm::MAX_BBM_LINKS;
use spinand_core::protocol::{BlockProtection, EccState, Enpgm, SecureOtp, Status, SCRATCH_SLOT};
use spinand_core::spi::{check_io_mode_supported, opcodes, CommandTemplate, Transfer};

/// Bits flipped in the first ECC step by a disturbed read
const DISTURB_FLIPS: usize = 24;

/// Configuration for the dummy device
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Manufacturer ID
    pub manufacturer_id: u8,
    /// Device ID
    pub device_id: u8,
    /// Data bytes per page
    pub page_size: usize,
    /// OOB bytes per page
    pub oob_size: usize,
    /// Pages per block
    pub pages_per_block: usize,
    /// Number of blocks
    pub block_count: usize,
    /// Software ECC strength advertised in the parameter page (0 = on-die ECC)
    pub ecc_bits: u8,
    /// Advertise read recovery support
    pub read_recovery: bool,
    /// Advertise continuous read support
    pub continuous_read: bool,
    /// Status polls that report busy after each array operation
    pub busy_polls: u32,
    /// Bus widths supported by the emulated controller
    pub features: SpiFeatures,
    /// Sequencer slots
    pub slot_count: u8,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: 0xC2, // Macronix
            device_id: 0x12,       // MX35LF1GE4AB
            page_size: 2048,
            oob_size: 64,
            pages_per_block: 64,
            block_count: 1024,
            ecc_bits: 0,
            read_recovery: false,
            continuous_read: false,
            busy_polls: 2,
            features: SpiFeatures::DUAL | SpiFeatures::QUAD,
            slot_count: 16,
        }
    }
}

impl DummyConfig {
    /// Device without on-die ECC that needs `bits` of software correction
    pub fn software_ecc(bits: u8) -> Self {
        Self {
            ecc_bits: bits,
            read_recovery: true,
            ..Self::default()
        }
    }

    /// Total number of pages
    pub fn total_pages(&self) -> usize {
        self.pages_per_block * self.block_count
    }

    /// Bytes per page including OOB
    pub fn raw_page_size(&self) -> usize {
        self.page_size + self.oob_size
    }

    /// Parameter page describing this device
    pub fn parameter_page(&self) -> ParameterPage {
        ParameterPage {
            signature: ONFI_SIGNATURE,
            page_size: self.page_size as u32,
            oob_size: self.oob_size as u16,
            pages_per_block: self.pages_per_block as u16,
            block_count: self.block_count as u16,
            ecc_bits: self.ecc_bits,
            read_recovery: self.read_recovery,
            continuous_read: self.continuous_read,
        }
    }
}

/// Counters for test assertions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DummyStats {
    /// Transfers issued by the controller
    pub transfers: u32,
    /// Controller software resets
    pub controller_resets: u32,
    /// Sequencer slot loads
    pub loads: u32,
    /// PAGE READ commands
    pub page_reads: u32,
    /// Device RESET commands
    pub device_resets: u32,
    /// PROGRAM EXECUTE commands that reached the array
    pub programs: u32,
    /// BLOCK ERASE commands that reached the array
    pub erases: u32,
    /// Transfers issued while the scratch slot was not idle
    pub idle_violations: u32,
}

/// Dummy SPI-NAND device behind a sequencer controller
pub struct DummyNand {
    config: DummyConfig,
    parameter_page: [u8; PARAMETER_PAGE_LEN],
    pages: BTreeMap<u32, Vec<u8>>,
    lut: Vec<Option<CommandTemplate>>,
    registers: [u8; 256],
    cache: Vec<u8>,
    cache_ecc: EccState,
    data_reg: Vec<u8>,
    from_data_reg: bool,
    row: u32,
    busy: u32,
    stuck_busy: bool,
    powered_down: bool,
    needs_reset: bool,
    fail_next: bool,
    pending_link: Option<(u16, u16)>,
    bbm: Vec<(u16, u16)>,
    ondie_ecc: BTreeMap<u32, (EccState, u8)>,
    disturbed: BTreeMap<u32, u32>,
    failing_programs: BTreeSet<u32>,
    failing_erases: BTreeSet<u32>,
    ecc_count: u8,
    warning: (u16, u16),
    stats: DummyStats,
    opcode_log: Vec<u8>,
}

impl DummyNand {
    /// Create a new erased device
    pub fn new(config: DummyConfig) -> Self {
        let raw = config.raw_page_size();
        let mut registers = [0u8; 256];
        registers[opcodes::FEATURE_BLOCK_PROTECTION as usize] = BlockProtection::BP_MASK.bits();

        Self {
            parameter_page: config.parameter_page().encode(),
            pages: BTreeMap::new(),
            lut: vec![None; config.slot_count as usize],
            registers,
            cache: vec![0xFF; raw],
            cache_ecc: EccState::Clean,
            data_reg: vec![0xFF; raw],
            from_data_reg: false,
            row: 0,
            busy: 0,
            stuck_busy: false,
            powered_down: false,
            needs_reset: false,
            fail_next: false,
            pending_link: None,
            bbm: Vec::new(),
            ondie_ecc: BTreeMap::new(),
            disturbed: BTreeMap::new(),
            failing_programs: BTreeSet::new(),
            failing_erases: BTreeSet::new(),
            ecc_count: 0,
            warning: (0xFFFF, 0xFFFF),
            stats: DummyStats::default(),
            opcode_log: Vec::new(),
            config,
        }
    }

    /// Create a device with default configuration (1 Gbit, on-die ECC)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Stored page content (data + OOB), `None` if erased
    pub fn page(&self, row: u32) -> Option<&[u8]> {
        self.pages.get(&row).map(Vec::as_slice)
    }

    /// Mutable page content, materializing an erased page if needed
    pub fn page_mut(&mut self, row: u32) -> &mut [u8] {
        let raw = self.config.raw_page_size();
        self.pages.entry(row).or_insert_with(|| vec![0xFF; raw])
    }

    /// Raw feature register value
    pub fn register(&self, address: u8) -> u8 {
        self.registers[address as usize]
    }

    /// Overwrite a feature register
    pub fn set_register(&mut self, address: u8, value: u8) {
        self.registers[address as usize] = value;
    }

    /// Template loaded in a sequencer slot
    pub fn slot(&self, slot: u8) -> Option<CommandTemplate> {
        self.lut.get(slot as usize).copied().flatten()
    }

    /// Committed bad block links
    pub fn bbm_links(&self) -> &[(u16, u16)] {
        &self.bbm
    }

    /// Counters since creation or the last [`reset_stats`](Self::reset_stats)
    pub fn stats(&self) -> DummyStats {
        self.stats
    }

    /// Opcodes of all transfers since the last [`reset_stats`](Self::reset_stats)
    pub fn opcode_log(&self) -> &[u8] {
        &self.opcode_log
    }

    /// Clear counters and the opcode log
    pub fn reset_stats(&mut self) {
        self.stats = DummyStats::default();
        self.opcode_log.clear();
    }

    /// Fail the next transfer with [`Error::TransferFailed`]
    pub fn fail_next_transfer(&mut self) {
        self.fail_next = true;
    }

    /// Keep the WIP bit set forever
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Corrupt the next `reads` page reads of `row`
    ///
    /// With software ECC the first step receives more bitflips than any
    /// supported code corrects; with on-die ECC the status reports an
    /// uncorrectable page.
    pub fn disturb_reads(&mut self, row: u32, reads: u32) {
        self.disturbed.insert(row, reads);
    }

    /// Report an on-die ECC result for every read of `row`
    pub fn set_ondie_ecc(&mut self, row: u32, state: EccState, bitflips: u8) {
        self.ondie_ecc.insert(row, (state, bitflips));
    }

    /// Make programs of `row` fail
    pub fn fail_program(&mut self, row: u32) {
        self.failing_programs.insert(row);
    }

    /// Make erases of `block` fail
    pub fn fail_erase(&mut self, block: u32) {
        self.failing_erases.insert(block);
    }

    fn status(&self) -> Status {
        Status::from_bits_retain(self.registers[opcodes::FEATURE_STATUS as usize])
    }

    fn set_status(&mut self, flag: Status, on: bool) {
        let mut status = self.status();
        status.set(flag, on);
        self.registers[opcodes::FEATURE_STATUS as usize] = status.bits();
    }

    fn set_ecc_status(&mut self, state: EccState) {
        let status = (self.status() - Status::ECC_MASK) | state.status_bits();
        self.registers[opcodes::FEATURE_STATUS as usize] = status.bits();
    }

    fn otp(&self) -> SecureOtp {
        SecureOtp::from_bits_retain(self.registers[opcodes::FEATURE_SECURE_OTP as usize])
    }

    fn protected(&self) -> bool {
        BlockProtection::from_bits_retain(self.registers[opcodes::FEATURE_BLOCK_PROTECTION as usize])
            .intersects(BlockProtection::BP_MASK)
    }

    fn enpgm(&self) -> bool {
        Enpgm::from_bits_retain(self.registers[opcodes::FEATURE_ENPGM as usize])
            .contains(Enpgm::ENPGM)
    }

    fn start_busy(&mut self) {
        self.busy = self.config.busy_polls;
    }

    fn check_row(&self, row: u32) -> Result<()> {
        if (row as usize) < self.config.total_pages() {
            Ok(())
        } else {
            Err(Error::InvalidArgument)
        }
    }

    /// Load `row` from the array into the cache
    fn load_row(&mut self, row: u32) {
        match self.pages.get(&row) {
            Some(page) => self.cache.copy_from_slice(page),
            None => self.cache.fill(0xFF),
        }
        let (state, count) = self
            .ondie_ecc
            .get(&row)
            .copied()
            .unwrap_or((EccState::Clean, 0));
        self.cache_ecc = state;
        self.ecc_count = count;

        let disturbed = match self.disturbed.get_mut(&row) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        };
        if disturbed {
            if self.config.ecc_bits > 0 {
                for byte in &mut self.cache[..DISTURB_FLIPS] {
                    *byte ^= 0x01;
                }
            } else {
                self.cache_ecc = EccState::Uncorrectable;
            }
        }
    }

    fn execute(&mut self, template: CommandTemplate, xfer: &mut Transfer<'_>) -> Result<()> {
        if self.powered_down && template.opcode != opcodes::RESET {
            xfer.read_buf.fill(0xFF);
            return Ok(());
        }
        if template.io_mode.requires_quad() && !self.otp().contains(SecureOtp::QE) {
            return Err(Error::IoModeNotSupported);
        }

        let address = template.address_width.mask(xfer.address);
        match template.opcode {
            opcodes::GET_FEATURE => self.get_feature(address as u8, xfer.read_buf),
            opcodes::SET_FEATURE => self.set_feature(address as u8, xfer.write_data),
            opcodes::RSR1 => {
                put_byte(xfer.read_buf, self.status().bits());
                Ok(())
            }
            opcodes::WREN => {
                self.set_status(Status::WEL, true);
                Ok(())
            }
            opcodes::WRDI => {
                self.set_status(Status::WEL, false);
                Ok(())
            }
            opcodes::RDID => {
                let id = [self.config.manufacturer_id, self.config.device_id];
                for (dst, src) in xfer.read_buf.iter_mut().zip(id) {
                    *dst = src;
                }
                Ok(())
            }
            opcodes::RESET => {
                self.device_reset();
                Ok(())
            }
            opcodes::DP => {
                self.powered_down = true;
                Ok(())
            }
            opcodes::PAGE_READ => self.page_read(address),
            opcodes::READ_CACHE
            | opcodes::READ_CACHE_ALT
            | opcodes::READ_CACHE_X2
            | opcodes::READ_CACHE_X4
            | opcodes::READ_CACHE_DUAL_IO
            | opcodes::READ_CACHE_QUAD_IO => self.read_cache(address, xfer.read_buf),
            opcodes::READ_CACHE_SEQ => self.read_cache_sequential(true),
            opcodes::READ_CACHE_END => self.read_cache_sequential(false),
            opcodes::PP_LOAD | opcodes::PP_LOAD_X4 => self.load_cache(address, xfer.write_data, true),
            opcodes::PP_RAND_LOAD | opcodes::PP_RAND_LOAD_X4 => {
                self.load_cache(address, xfer.write_data, false)
            }
            opcodes::PROGRAM_EXEC => self.program_execute(address),
            opcodes::BE => self.block_erase(address),
            opcodes::WRITE_BBM => self.write_bbm(address),
            opcodes::READ_BBM => {
                self.read_bbm(xfer.read_buf);
                Ok(())
            }
            opcodes::ECC_WARNING => {
                let [f0, f1] = self.warning.0.to_be_bytes();
                let [l0, l1] = self.warning.1.to_be_bytes();
                for (dst, src) in xfer.read_buf.iter_mut().zip([f0, f1, l0, l1]) {
                    *dst = src;
                }
                Ok(())
            }
            opcodes::ECC_STAT_READ => {
                put_byte(xfer.read_buf, self.ecc_count);
                Ok(())
            }
            _ => Err(Error::OpcodeNotSupported),
        }
    }

    fn get_feature(&mut self, reg: u8, buf: &mut [u8]) -> Result<()> {
        let mut value = self.registers[reg as usize];
        if reg == opcodes::FEATURE_STATUS && (self.stuck_busy || self.busy > 0) {
            self.busy = self.busy.saturating_sub(1);
            value |= Status::WIP.bits();
        }
        put_byte(buf, value);
        Ok(())
    }

    fn set_feature(&mut self, reg: u8, data: &[u8]) -> Result<()> {
        let value = *data.first().ok_or(Error::InvalidArgument)?;
        // Status is read-only
        if reg != opcodes::FEATURE_STATUS {
            self.registers[reg as usize] = value;
        }
        Ok(())
    }

    fn device_reset(&mut self) {
        self.powered_down = false;
        self.from_data_reg = false;
        self.pending_link = None;
        self.registers[opcodes::FEATURE_SPEC as usize] = 0;
        self.registers[opcodes::FEATURE_STATUS as usize] = 0;
        self.start_busy();
        self.stats.device_resets += 1;
    }

    fn page_read(&mut self, row: u32) -> Result<()> {
        if self.otp().contains(SecureOtp::OTP_EN) {
            self.cache.fill(0xFF);
            if row == PARAMETER_PAGE_ROW {
                self.cache[..PARAMETER_PAGE_LEN].copy_from_slice(&self.parameter_page);
            }
            self.cache_ecc = EccState::Clean;
        } else {
            self.check_row(row)?;
            self.load_row(row);
        }

        log::trace!("dummy: page read row {}", row);
        self.row = row;
        self.from_data_reg = false;
        self.set_ecc_status(self.cache_ecc);
        self.stats.page_reads += 1;
        self.start_busy();
        Ok(())
    }

    fn read_cache(&mut self, column: u32, buf: &mut [u8]) -> Result<()> {
        if self.otp().contains(SecureOtp::CONT) && !self.from_data_reg {
            return self.read_continuous(buf);
        }

        let src = if self.from_data_reg {
            &self.data_reg
        } else {
            &self.cache
        };
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = src.get(column as usize + i).copied().unwrap_or(0xFF);
        }
        Ok(())
    }

    /// Stream page data starting with the cached page, ignoring the column
    fn read_continuous(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut row = self.row;
        let mut worst = EccState::Clean;
        let mut flagged: Option<(u16, u16)> = None;

        for (i, chunk) in buf.chunks_mut(self.config.page_size).enumerate() {
            if i > 0 {
                row += 1;
                self.check_row(row)?;
                self.load_row(row);
            }
            chunk.copy_from_slice(&self.cache[..chunk.len()]);
            if self.cache_ecc != EccState::Clean {
                flagged = Some(match flagged {
                    Some((first, _)) => (first, row as u16),
                    None => (row as u16, row as u16),
                });
                if severity(self.cache_ecc) > severity(worst) {
                    worst = self.cache_ecc;
                }
            }
        }

        self.row = row;
        self.warning = flagged.unwrap_or((0xFFFF, 0xFFFF));
        self.set_ecc_status(worst);
        Ok(())
    }

    fn read_cache_sequential(&mut self, more: bool) -> Result<()> {
        self.data_reg.copy_from_slice(&self.cache);
        self.from_data_reg = true;
        self.set_ecc_status(self.cache_ecc);
        if more {
            let next = self.row + 1;
            self.check_row(next)?;
            self.row = next;
            self.load_row(next);
        }
        self.start_busy();
        Ok(())
    }

    fn load_cache(&mut self, column: u32, data: &[u8], reset: bool) -> Result<()> {
        let start = column as usize;
        let end = start + data.len();
        if end > self.cache.len() {
            return Err(Error::InvalidArgument);
        }
        if reset {
            self.cache.fill(0xFF);
        }
        self.cache[start..end].copy_from_slice(data);
        self.from_data_reg = false;
        Ok(())
    }

    fn program_execute(&mut self, row: u32) -> Result<()> {
        if !self.status().contains(Status::WEL) {
            return Err(Error::WriteProtected);
        }
        self.set_status(Status::WEL, false);
        self.start_busy();

        if self.enpgm() {
            let fail = match self.pending_link.take() {
                Some(link) if self.bbm.len() < MAX_BBM_LINKS => {
                    self.bbm.push(link);
                    false
                }
                _ => true,
            };
            self.set_status(Status::PROGRAM_FAIL, fail);
            return Ok(());
        }

        self.check_row(row)?;
        let fail = self.protected() || self.failing_programs.contains(&row);
        self.set_status(Status::PROGRAM_FAIL, fail);
        if !fail {
            let raw = self.config.raw_page_size();
            let page = self.pages.entry(row).or_insert_with(|| vec![0xFF; raw]);
            // NAND programming only clears bits
            for (dst, src) in page.iter_mut().zip(&self.cache) {
                *dst &= *src;
            }
            self.stats.programs += 1;
        }
        Ok(())
    }

    fn block_erase(&mut self, row: u32) -> Result<()> {
        if !self.status().contains(Status::WEL) {
            return Err(Error::WriteProtected);
        }
        self.set_status(Status::WEL, false);
        self.start_busy();
        self.check_row(row)?;

        let ppb = self.config.pages_per_block as u32;
        let block = row / ppb;
        let fail = self.protected() || self.failing_erases.contains(&block);
        self.set_status(Status::ERASE_FAIL, fail);
        if !fail {
            let first = block * ppb;
            self.pages.retain(|&r, _| r < first || r >= first + ppb);
            self.stats.erases += 1;
        }
        Ok(())
    }

    fn write_bbm(&mut self, address: u32) -> Result<()> {
        if !self.enpgm() || !self.status().contains(Status::WEL) {
            return Err(Error::WriteProtected);
        }
        self.pending_link = Some(((address >> 16) as u16, address as u16));
        Ok(())
    }

    fn read_bbm(&self, buf: &mut [u8]) {
        buf.fill(0xFF);
        for (entry, &(logical, physical)) in buf.chunks_exact_mut(4).zip(&self.bbm) {
            entry[..2].copy_from_slice(&logical.to_be_bytes());
            entry[2..].copy_from_slice(&physical.to_be_bytes());
        }
    }
}

fn put_byte(buf: &mut [u8], value: u8) {
    if let Some(byte) = buf.first_mut() {
        *byte = value;
    }
}

fn severity(state: EccState) -> u8 {
    match state {
        EccState::Clean => 0,
        EccState::Corrected | EccState::Reserved => 1,
        EccState::Uncorrectable => 2,
    }
}

impl SequenceController for DummyNand {
    fn features(&self) -> SpiFeatures {
        self.config.features
    }

    fn slot_count(&self) -> u8 {
        self.config.slot_count
    }

    fn load_sequence(&mut self, slot: u8, template: &CommandTemplate) -> Result<()> {
        let entry = self
            .lut
            .get_mut(slot as usize)
            .ok_or(Error::InvalidArgument)?;
        *entry = Some(*template);
        self.stats.loads += 1;
        Ok(())
    }

    fn transfer(&mut self, xfer: &mut Transfer<'_>) -> Result<()> {
        // The sequencer refuses to start until the previous transfer was reset
        if self.needs_reset {
            return Err(Error::ProgrammerError);
        }
        self.needs_reset = true;

        let template = self.slot(xfer.slot).ok_or(Error::ProgrammerError)?;
        check_io_mode_supported(template.io_mode, self.config.features)?;

        self.stats.transfers += 1;
        self.opcode_log.push(template.opcode);
        if xfer.slot != SCRATCH_SLOT
            && self.slot(SCRATCH_SLOT).map(|t| t.opcode) != Some(opcodes::READ_CACHE)
        {
            self.stats.idle_violations += 1;
        }

        if self.fail_next {
            self.fail_next = false;
            return Err(Error::TransferFailed);
        }
        self.execute(template, xfer)
    }

    fn software_reset(&mut self) {
        self.needs_reset = false;
        self.stats.controller_resets += 1;
    }

    fn delay_us(&mut self, _us: u32) {
        // No delay needed for in-memory operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spinand_core::onfi;
    use spinand_core::protocol::{features, nand, Dispatcher, OpKind, Payload};

    fn dispatcher() -> Dispatcher<DummyNand> {
        let mut d = Dispatcher::new(DummyNand::new_default());
        d.install().unwrap();
        d
    }

    #[test]
    fn test_read_id() {
        let mut d = dispatcher();
        assert_eq!(nand::read_id(&mut d).unwrap(), (0xC2, 0x12));
    }

    #[test]
    fn test_parameter_page_in_otp_mode() {
        let mut d = dispatcher();
        let page = onfi::discover(&mut d, 0, 100).unwrap();
        assert_eq!(page.page_size, 2048);
        assert_eq!(page.block_count, 1024);
        assert_eq!(page.ecc_bits, 0);
        let otp = SecureOtp::from_bits_retain(d.controller().register(opcodes::FEATURE_SECURE_OTP));
        assert!(!otp.contains(SecureOtp::OTP_EN));
    }

    #[test]
    fn test_block_protection_blocks_program() {
        let mut d = dispatcher();
        features::write_enable(&mut d).unwrap();
        nand::page_load(&mut d, OpKind::PageLoad, 0, &[0x00; 4]).unwrap();
        nand::program_execute(&mut d, 3).unwrap();
        let status = features::wait_ready(&mut d, 0, 100).unwrap();
        assert!(status.contains(Status::PROGRAM_FAIL));
        assert!(d.controller().page(3).is_none());
    }

    #[test]
    fn test_program_and_read_back() {
        let mut d = dispatcher();
        features::clear_block_protection(&mut d).unwrap();
        features::write_enable(&mut d).unwrap();
        nand::page_load(&mut d, OpKind::PageLoad, 16, &[0x12, 0x34, 0x56, 0x78]).unwrap();
        nand::program_execute(&mut d, 7).unwrap();
        features::wait_ready(&mut d, 0, 100).unwrap();

        nand::page_read(&mut d, 7).unwrap();
        features::wait_ready(&mut d, 0, 100).unwrap();
        let mut buf = [0u8; 6];
        nand::read_from_cache(&mut d, OpKind::ReadCache, 15, &mut buf).unwrap();
        assert_eq!(buf, [0xFF, 0x12, 0x34, 0x56, 0x78, 0xFF]);
    }

    #[test]
    fn test_program_requires_write_enable() {
        let mut d = dispatcher();
        features::clear_block_protection(&mut d).unwrap();
        assert_eq!(nand::program_execute(&mut d, 0), Err(Error::WriteProtected));
    }

    #[test]
    fn test_transfer_without_reset_rejected() {
        let mut nand = DummyNand::new_default();
        nand.load_sequence(1, &OpKind::ReadId.template()).unwrap();
        let mut buf = [0u8; 2];
        let mut xfer = Transfer {
            slot: 1,
            address: 0,
            write_data: &[],
            read_buf: &mut buf,
        };
        nand.transfer(&mut xfer).unwrap();
        assert_eq!(nand.transfer(&mut xfer), Err(Error::ProgrammerError));
        nand.software_reset();
        assert!(nand.transfer(&mut xfer).is_ok());
    }

    #[test]
    fn test_quad_requires_qe() {
        let mut d = dispatcher();
        let mut buf = [0u8; 4];
        assert_eq!(
            d.execute(OpKind::ReadCacheX4, 0, Payload::Rx(&mut buf)),
            Err(Error::IoModeNotSupported)
        );
        features::quad_enable(&mut d).unwrap();
        assert!(d.execute(OpKind::ReadCacheX4, 0, Payload::Rx(&mut buf)).is_ok());
    }

    #[test]
    fn test_deep_power_down_until_reset() {
        let mut d = dispatcher();
        nand::deep_power_down(&mut d).unwrap();
        assert_eq!(nand::read_id(&mut d).unwrap(), (0xFF, 0xFF));
        nand::reset(&mut d).unwrap();
        assert_eq!(nand::read_id(&mut d).unwrap(), (0xC2, 0x12));
    }

    #[test]
    fn test_transfers_always_reset() {
        let mut d = dispatcher();
        nand::read_id(&mut d).unwrap();
        features::get_status(&mut d).unwrap();
        d.controller_mut().fail_next_transfer();
        assert!(nand::read_id(&mut d).is_err());
        let stats = d.controller().stats();
        assert_eq!(stats.transfers, 3);
        assert_eq!(stats.controller_resets, 3);
        assert_eq!(stats.idle_violations, 0);
    }
}
