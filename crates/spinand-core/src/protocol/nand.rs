//! Raw SPI-NAND operations
//!
//! Row addresses are page indices; column addresses are byte offsets in the
//! on-chip cache (page data followed by the OOB area).

use crate::error::Result;
use crate::programmer::SequenceController;

use super::{Dispatcher, OpKind, Payload, Status};

/// Settle time after RESET
pub const RESET_DELAY_US: u32 = 500;
/// Settle time after deep power-down
pub const DEEP_POWER_DOWN_DELAY_US: u32 = 6000;

/// Move one page from the array into the cache
pub fn page_read<C: SequenceController>(dispatcher: &mut Dispatcher<C>, row: u32) -> Result<()> {
    dispatcher.execute(OpKind::PageRead, row, Payload::None)
}

/// Read from the cache starting at `column`
///
/// `op` selects the read-from-cache variant (width and framing).
pub fn read_from_cache<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
    op: OpKind,
    column: u32,
    buf: &mut [u8],
) -> Result<()> {
    dispatcher.execute(op, column, Payload::Rx(buf))
}

/// Load program data into the cache starting at `column`
///
/// The plain load variants reset the whole cache to 0xFF first; the random
/// variants keep the current cache content.
pub fn page_load<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
    op: OpKind,
    column: u32,
    data: &[u8],
) -> Result<()> {
    dispatcher.execute(op, column, Payload::Tx(data))
}

/// Program the cache into the array at `row`
pub fn program_execute<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
    row: u32,
) -> Result<()> {
    dispatcher.execute(OpKind::ProgramExecute, row, Payload::None)
}

/// Erase the block containing `row`
pub fn block_erase<C: SequenceController>(dispatcher: &mut Dispatcher<C>, row: u32) -> Result<()> {
    dispatcher.execute(OpKind::BlockErase, row, Payload::None)
}

/// Move the cache to the data register and start loading the next page
pub fn read_cache_sequential<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
) -> Result<()> {
    dispatcher.execute(OpKind::ReadCacheSequential, 0, Payload::None)
}

/// Move the cache to the data register and end a sequential read
pub fn read_cache_end<C: SequenceController>(dispatcher: &mut Dispatcher<C>) -> Result<()> {
    dispatcher.execute(OpKind::ReadCacheEnd, 0, Payload::None)
}

/// Read the manufacturer and device ID
pub fn read_id<C: SequenceController>(dispatcher: &mut Dispatcher<C>) -> Result<(u8, u8)> {
    let mut buf = [0u8; 2];
    dispatcher.execute(OpKind::ReadId, 0, Payload::Rx(&mut buf))?;
    Ok((buf[0], buf[1]))
}

/// Reset the device
///
/// Clears the status register and leaves read recovery mode.
pub fn reset<C: SequenceController>(dispatcher: &mut Dispatcher<C>) -> Result<()> {
    dispatcher.execute(OpKind::Reset, 0, Payload::None)?;
    dispatcher.delay_us(RESET_DELAY_US);
    Ok(())
}

/// Enter deep power-down
pub fn deep_power_down<C: SequenceController>(dispatcher: &mut Dispatcher<C>) -> Result<()> {
    dispatcher.execute(OpKind::DeepPowerDown, 0, Payload::None)?;
    dispatcher.delay_us(DEEP_POWER_DOWN_DELAY_US);
    Ok(())
}

/// Read the status register with the dedicated RSR1 command
pub fn read_status<C: SequenceController>(dispatcher: &mut Dispatcher<C>) -> Result<Status> {
    let mut buf = [0u8; 1];
    dispatcher.execute(OpKind::ReadStatus, 0, Payload::Rx(&mut buf))?;
    Ok(Status::from_bits_retain(buf[0]))
}

/// Read the number of bits corrected by on-die ECC during the last read
pub fn read_ecc_status<C: SequenceController>(dispatcher: &mut Dispatcher<C>) -> Result<u8> {
    let mut buf = [0u8; 1];
    dispatcher.execute(OpKind::ReadEccStatus, 0, Payload::Rx(&mut buf))?;
    Ok(buf[0])
}

/// First and last page that reached the on-die ECC warning threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EccWarning {
    /// First flagged page (row)
    pub first: u16,
    /// Last flagged page (row)
    pub last: u16,
}

/// Read the ECC warning page addresses recorded during a continuous read
pub fn ecc_warning<C: SequenceController>(dispatcher: &mut Dispatcher<C>) -> Result<EccWarning> {
    let mut buf = [0u8; 4];
    dispatcher.execute(OpKind::EccWarning, 0, Payload::Rx(&mut buf))?;
    Ok(EccWarning {
        first: u16::from_be_bytes([buf[0], buf[1]]),
        last: u16::from_be_bytes([buf[2], buf[3]]),
    })
}
