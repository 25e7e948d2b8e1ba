//! Controller trait definitions

use crate::error::Result;
use crate::spi::{CommandTemplate, Transfer};
use bitflags::bitflags;

bitflags! {
    /// Multi-line transfers a controller can drive
    ///
    /// Checked against each template before it is loaded into a slot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpiFeatures: u32 {
        /// Two-line data phase, single-line address (cache read x2)
        const DUAL_IN        = 1 << 0;
        /// Two-line address and data (cache read dual I/O)
        const DUAL_IO        = 1 << 1;
        /// Four-line data phase, single-line address (cache read x4, program load x4)
        const QUAD_IN        = 1 << 2;
        /// Four-line address and data (cache read quad I/O)
        const QUAD_IO        = 1 << 3;

        /// Every two-line mode
        const DUAL = Self::DUAL_IN.bits() | Self::DUAL_IO.bits();
        /// Every four-line mode
        const QUAD = Self::QUAD_IN.bits() | Self::QUAD_IO.bits();
    }
}

impl Default for SpiFeatures {
    /// Single-line only
    fn default() -> Self {
        SpiFeatures::empty()
    }
}

/// Host controller with a programmable command sequencer
///
/// Controllers such as NXP FlexSPI do not execute raw byte streams. Instead
/// each bus transaction is described by a template stored in a numbered
/// slot of a look-up table, and an IP command triggers one slot with an
/// address and a data buffer.
///
/// The driver owns the slot layout (see
/// [`Dispatcher`](crate::protocol::Dispatcher)). Implementations only have
/// to store templates and run transfers.
///
/// ## Example
///
/// ```ignore
/// impl SequenceController for FlexSpi {
///     fn features(&self) -> SpiFeatures {
///         SpiFeatures::DUAL | SpiFeatures::QUAD
///     }
///
///     fn load_sequence(&mut self, slot: u8, template: &CommandTemplate) -> Result<()> {
///         self.write_lut(slot, &encode_lut(template));
///         Ok(())
///     }
///
///     fn transfer(&mut self, xfer: &mut Transfer<'_>) -> Result<()> {
///         self.ip_command(xfer.slot, xfer.address, xfer.write_data, xfer.read_buf)
///     }
///
///     fn software_reset(&mut self) {
///         self.reset_ahb_and_ip_fifos();
///     }
///
///     fn delay_us(&mut self, us: u32) {
///         self.timer.delay_us(us);
///     }
/// }
/// ```
pub trait SequenceController {
    /// Multi-line modes this controller can drive
    fn features(&self) -> SpiFeatures;

    /// Number of sequencer slots available
    fn slot_count(&self) -> u8 {
        16
    }

    /// Store a command template in a sequencer slot
    fn load_sequence(&mut self, slot: u8, template: &CommandTemplate) -> Result<()>;

    /// Run one bus transaction using the template in `xfer.slot`
    ///
    /// The data phase reads into `read_buf` or sends `write_data` depending
    /// on the direction of the loaded template.
    fn transfer(&mut self, xfer: &mut Transfer<'_>) -> Result<()>;

    /// Reset the controller state machines and FIFOs
    ///
    /// Called after every transfer, successful or not.
    fn software_reset(&mut self);

    /// Busy-wait between status polls
    fn delay_us(&mut self, us: u32);
}
