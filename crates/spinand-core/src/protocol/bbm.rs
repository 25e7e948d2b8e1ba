//! Bad-block management link table
//!
//! The device can redirect accesses to a logical block (LBA) to a spare
//! physical block (PBA). Links live in a dedicated OTP table of at most
//! [`MAX_BBM_LINKS`] entries. This module only reads and writes the table;
//! choosing replacement blocks is left to the caller.

use crate::error::{Error, Result};
use crate::programmer::SequenceController;

use super::features::{set_feature, update_feature, wait_ready, write_enable};
use super::nand::program_execute;
use super::{Dispatcher, Enpgm, FeatureRegister, OpKind, Payload};

/// Capacity of the link table
pub const MAX_BBM_LINKS: usize = 40;

/// One logical to physical block link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BbmLink {
    /// Logical block address
    pub logical: u16,
    /// Physical replacement block
    pub physical: u16,
}

impl BbmLink {
    /// Address phase of the WRITE BBM command
    pub const fn command_address(&self) -> u32 {
        ((self.logical as u32) << 16) | self.physical as u32
    }
}

/// Add a link to the table
///
/// Sets ENPGM for the duration of the operation. ENPGM is cleared again on
/// every exit path.
pub fn write_bbm_link<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
    link: BbmLink,
    poll_delay_us: u32,
    timeout_us: u32,
) -> Result<()> {
    log::debug!(
        "Writing BBM link LBA {} -> PBA {}",
        link.logical,
        link.physical
    );

    let enabled = update_feature(dispatcher, FeatureRegister::Enpgm, |v| {
        v | Enpgm::ENPGM.bits()
    })?;

    let result = program_link(dispatcher, link, poll_delay_us, timeout_us);
    let cleared = set_feature(
        dispatcher,
        FeatureRegister::Enpgm,
        enabled & !Enpgm::ENPGM.bits(),
    );
    result.and(cleared)
}

fn program_link<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
    link: BbmLink,
    poll_delay_us: u32,
    timeout_us: u32,
) -> Result<()> {
    write_enable(dispatcher)?;
    dispatcher.execute(OpKind::WriteBbm, link.command_address(), Payload::None)?;
    program_execute(dispatcher, 0)?;
    let status = wait_ready(dispatcher, poll_delay_us, timeout_us)?;
    if status.contains(super::Status::PROGRAM_FAIL) {
        return Err(Error::ProgramFailed { addr: 0 });
    }
    Ok(())
}

/// Read all used entries of the link table
///
/// Entries whose logical and physical block match are unused and skipped.
pub fn read_bbm_links<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
) -> Result<heapless::Vec<BbmLink, MAX_BBM_LINKS>> {
    let mut raw = [0u8; MAX_BBM_LINKS * 4];
    dispatcher.execute(OpKind::ReadBbm, 0, Payload::Rx(&mut raw))?;

    let mut links = heapless::Vec::new();
    for entry in raw.chunks_exact(4) {
        let link = BbmLink {
            logical: u16::from_be_bytes([entry[0], entry[1]]),
            physical: u16::from_be_bytes([entry[2], entry[3]]),
        };
        if link.logical == link.physical {
            continue;
        }
        // Capacity equals the number of entries read
        let _ = links.push(link);
    }
    Ok(links)
}
