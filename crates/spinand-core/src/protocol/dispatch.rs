//! Command dispatcher
//!
//! Every NAND operation maps to an [`OpKind`]. Frequently used operations
//! live permanently in their own sequencer slot. The rest share slot 0, the
//! scratch slot, which is loaded right before the transfer and put back to
//! the idle template afterwards.

use crate::error::{Error, Result};
use crate::programmer::SequenceController;
use crate::spi::{opcodes, AddressWidth, CommandTemplate, Direction, IoMode, Transfer};

/// Slot shared by all operations without a static slot
pub const SCRATCH_SLOT: u8 = 0;

/// Template left in the scratch slot while it is not bound
const IDLE_TEMPLATE: CommandTemplate = OpKind::ReadCache.template();

/// Bus operations known to the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Read from cache (0x03)
    ReadCache,
    /// Read from cache, alternative framing (0x0B)
    ReadCacheAlt,
    /// Read from cache x2 (0x3B)
    ReadCacheX2,
    /// Read from cache x4 (0x6B)
    ReadCacheX4,
    /// Read from cache dual I/O (0xBB)
    ReadCacheDualIo,
    /// Read from cache quad I/O (0xEB)
    ReadCacheQuadIo,
    /// Program load (0x02)
    PageLoad,
    /// Program load x4 (0x32)
    PageLoadX4,
    /// Program load random data (0x84)
    PageLoadRandom,
    /// Program load random data x4 (0x34)
    PageLoadRandomX4,
    /// Page read to cache (0x13)
    PageRead,
    /// Program execute (0x10)
    ProgramExecute,
    /// Block erase (0xD8)
    BlockErase,
    /// Read cache sequential (0x31)
    ReadCacheSequential,
    /// Read cache end (0x3F)
    ReadCacheEnd,
    /// Read BBM link table (0xA5)
    ReadBbm,
    /// Write BBM link (0xA1)
    WriteBbm,
    /// Read ECC warning page addresses (0xA9)
    EccWarning,
    /// Read ID (0x9F)
    ReadId,
    /// Deep power-down (0xB9)
    DeepPowerDown,
    /// Reset (0xFF)
    Reset,
    /// Write enable (0x06)
    WriteEnable,
    /// Write disable (0x04)
    WriteDisable,
    /// Read status register (0x05)
    ReadStatus,
    /// Get feature (0x0F)
    GetFeature,
    /// Set feature (0x1F)
    SetFeature,
    /// Read ECC status register (0x7C)
    ReadEccStatus,
}

impl OpKind {
    /// Operations with a permanent slot, in slot order starting at 1
    pub const STATIC: [OpKind; 13] = [
        OpKind::ReadCache,
        OpKind::ReadCacheAlt,
        OpKind::ReadCacheX2,
        OpKind::ReadCacheX4,
        OpKind::ReadCacheDualIo,
        OpKind::ReadCacheQuadIo,
        OpKind::PageLoad,
        OpKind::PageLoadX4,
        OpKind::PageLoadRandom,
        OpKind::PageLoadRandomX4,
        OpKind::PageRead,
        OpKind::ProgramExecute,
        OpKind::BlockErase,
    ];

    /// Bus template for this operation
    pub const fn template(self) -> CommandTemplate {
        match self {
            Self::ReadCache => CommandTemplate::read(opcodes::READ_CACHE, AddressWidth::TwoByte).with_dummy_cycles(8),
            Self::ReadCacheAlt => {
                CommandTemplate::read(opcodes::READ_CACHE_ALT, AddressWidth::TwoByte).with_dummy_cycles(8)
            }
            Self::ReadCacheX2 => CommandTemplate::read(opcodes::READ_CACHE_X2, AddressWidth::TwoByte)
                .with_dummy_cycles(8)
                .with_io_mode(IoMode::DualOut),
            Self::ReadCacheX4 => CommandTemplate::read(opcodes::READ_CACHE_X4, AddressWidth::TwoByte)
                .with_dummy_cycles(8)
                .with_io_mode(IoMode::QuadOut),
            Self::ReadCacheDualIo => CommandTemplate::read(opcodes::READ_CACHE_DUAL_IO, AddressWidth::TwoByte)
                .with_dummy_cycles(4)
                .with_io_mode(IoMode::DualIo),
            Self::ReadCacheQuadIo => CommandTemplate::read(opcodes::READ_CACHE_QUAD_IO, AddressWidth::TwoByte)
                .with_dummy_cycles(4)
                .with_io_mode(IoMode::QuadIo),
            Self::PageLoad => CommandTemplate::write(opcodes::PP_LOAD, AddressWidth::TwoByte),
            Self::PageLoadX4 => {
                CommandTemplate::write(opcodes::PP_LOAD_X4, AddressWidth::TwoByte).with_io_mode(IoMode::QuadOut)
            }
            Self::PageLoadRandom => CommandTemplate::write(opcodes::PP_RAND_LOAD, AddressWidth::TwoByte),
            Self::PageLoadRandomX4 => CommandTemplate::write(opcodes::PP_RAND_LOAD_X4, AddressWidth::TwoByte)
                .with_io_mode(IoMode::QuadOut),
            Self::PageRead => CommandTemplate::addressed(opcodes::PAGE_READ, AddressWidth::ThreeByte),
            Self::ProgramExecute => CommandTemplate::addressed(opcodes::PROGRAM_EXEC, AddressWidth::ThreeByte),
            Self::BlockErase => CommandTemplate::addressed(opcodes::BE, AddressWidth::ThreeByte),
            Self::ReadCacheSequential => CommandTemplate::command(opcodes::READ_CACHE_SEQ),
            Self::ReadCacheEnd => CommandTemplate::command(opcodes::READ_CACHE_END),
            Self::ReadBbm => CommandTemplate::read(opcodes::READ_BBM, AddressWidth::None).with_dummy_cycles(8),
            Self::WriteBbm => CommandTemplate::addressed(opcodes::WRITE_BBM, AddressWidth::FourByte),
            Self::EccWarning => {
                CommandTemplate::read(opcodes::ECC_WARNING, AddressWidth::None).with_dummy_cycles(8)
            }
            Self::ReadId => CommandTemplate::read(opcodes::RDID, AddressWidth::None).with_dummy_cycles(8),
            Self::DeepPowerDown => CommandTemplate::command(opcodes::DP),
            Self::Reset => CommandTemplate::command(opcodes::RESET),
            Self::WriteEnable => CommandTemplate::command(opcodes::WREN),
            Self::WriteDisable => CommandTemplate::command(opcodes::WRDI),
            Self::ReadStatus => CommandTemplate::read(opcodes::RSR1, AddressWidth::None),
            Self::GetFeature => CommandTemplate::read(opcodes::GET_FEATURE, AddressWidth::OneByte),
            Self::SetFeature => CommandTemplate::write(opcodes::SET_FEATURE, AddressWidth::OneByte),
            Self::ReadEccStatus => {
                CommandTemplate::read(opcodes::ECC_STAT_READ, AddressWidth::None).with_dummy_cycles(8)
            }
        }
    }

    /// Permanent slot for this operation, `None` for scratch operations
    pub const fn static_slot(self) -> Option<u8> {
        let slot = match self {
            Self::ReadCache => 1,
            Self::ReadCacheAlt => 2,
            Self::ReadCacheX2 => 3,
            Self::ReadCacheX4 => 4,
            Self::ReadCacheDualIo => 5,
            Self::ReadCacheQuadIo => 6,
            Self::PageLoad => 7,
            Self::PageLoadX4 => 8,
            Self::PageLoadRandom => 9,
            Self::PageLoadRandomX4 => 10,
            Self::PageRead => 11,
            Self::ProgramExecute => 12,
            Self::BlockErase => 13,
            _ => return None,
        };
        Some(slot)
    }

    /// Returns true if this operation runs from the scratch slot
    pub const fn is_scratch(self) -> bool {
        self.static_slot().is_none()
    }
}

/// Data phase of a dispatched operation
pub enum Payload<'a> {
    /// No data phase
    None,
    /// Data sent to the device
    Tx(&'a [u8]),
    /// Buffer filled by the device
    Rx(&'a mut [u8]),
}

impl Payload<'_> {
    fn direction(&self) -> Direction {
        match self {
            Self::None => Direction::None,
            Self::Tx(_) => Direction::Write,
            Self::Rx(_) => Direction::Read,
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Tx(data) => data.len(),
            Self::Rx(buf) => buf.len(),
        }
    }
}

/// Issues bus operations through a [`SequenceController`]
///
/// The dispatcher performs no retries. After every transfer, successful or
/// not, the controller is software-reset.
pub struct Dispatcher<C> {
    controller: C,
}

impl<C: SequenceController> Dispatcher<C> {
    /// Wrap a controller. Call [`install`](Self::install) before use.
    pub fn new(controller: C) -> Self {
        Self { controller }
    }

    /// Load all static templates and the idle scratch template
    pub fn install(&mut self) -> Result<()> {
        let needed = OpKind::STATIC.len() as u8 + 1;
        if self.controller.slot_count() < needed {
            log::debug!(
                "Controller has {} sequencer slots, {} needed",
                self.controller.slot_count(),
                needed
            );
            return Err(Error::ProgrammerError);
        }

        for op in OpKind::STATIC {
            if let Some(slot) = op.static_slot() {
                self.controller.load_sequence(slot, &op.template())?;
            }
        }
        self.controller.load_sequence(SCRATCH_SLOT, &IDLE_TEMPLATE)
    }

    /// Issue one operation
    ///
    /// Scratch operations bind the scratch slot for the duration of the
    /// transfer and restore the idle template before returning, on success
    /// and on error.
    pub fn execute(&mut self, op: OpKind, address: u32, payload: Payload<'_>) -> Result<()> {
        match op.static_slot() {
            Some(slot) => self.issue(slot, op, address, payload),
            None => {
                let mut guard = self.bind_scratch(op)?;
                let result = guard.execute(address, payload);
                let restored = guard.release();
                result.and(restored)
            }
        }
    }

    /// Load `op` into the scratch slot
    ///
    /// The returned guard restores the idle template when released or
    /// dropped.
    pub fn bind_scratch(&mut self, op: OpKind) -> Result<ScratchGuard<'_, C>> {
        if !op.is_scratch() {
            return Err(Error::InvalidArgument);
        }
        self.controller.load_sequence(SCRATCH_SLOT, &op.template())?;
        Ok(ScratchGuard {
            dispatcher: self,
            op,
            released: false,
        })
    }

    fn issue(&mut self, slot: u8, op: OpKind, address: u32, payload: Payload<'_>) -> Result<()> {
        let template = op.template();
        if template.direction != payload.direction() {
            log::debug!(
                "{:?} expects a {:?} data phase, got {:?}",
                op,
                template.direction,
                payload.direction()
            );
            return Err(Error::InvalidArgument);
        }

        log::trace!(
            "{:?} slot={} addr=0x{:X} len={}",
            op,
            slot,
            template.address_width.mask(address),
            payload.len()
        );

        let mut xfer = match payload {
            Payload::None => Transfer::command(slot, address),
            Payload::Tx(data) => Transfer {
                slot,
                address,
                write_data: data,
                read_buf: &mut [],
            },
            Payload::Rx(buf) => Transfer {
                slot,
                address,
                write_data: &[],
                read_buf: buf,
            },
        };

        let result = self.controller.transfer(&mut xfer);
        self.controller.software_reset();
        result
    }

    fn restore_idle(&mut self) -> Result<()> {
        self.controller.load_sequence(SCRATCH_SLOT, &IDLE_TEMPLATE)
    }

    /// Delay for the specified number of microseconds
    pub fn delay_us(&mut self, us: u32) {
        self.controller.delay_us(us);
    }

    /// Get a reference to the controller
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Get a mutable reference to the controller
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    /// Consume the dispatcher and return the controller
    pub fn into_inner(self) -> C {
        self.controller
    }
}

/// Scoped binding of the scratch slot to one operation
pub struct ScratchGuard<'d, C: SequenceController> {
    dispatcher: &'d mut Dispatcher<C>,
    op: OpKind,
    released: bool,
}

impl<C: SequenceController> ScratchGuard<'_, C> {
    /// Operation currently bound
    pub fn op(&self) -> OpKind {
        self.op
    }

    /// Run the bound operation; may be called repeatedly
    pub fn execute(&mut self, address: u32, payload: Payload<'_>) -> Result<()> {
        self.dispatcher.issue(SCRATCH_SLOT, self.op, address, payload)
    }

    /// Restore the idle template and report the result
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.dispatcher.restore_idle()
    }
}

impl<C: SequenceController> Drop for ScratchGuard<'_, C> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.dispatcher.restore_idle() {
            log::warn!("Failed to restore scratch slot after {:?}: {}", self.op, e);
        }
    }
}
