//! Command templates and bus transfers

use super::{AddressWidth, IoMode};

/// Direction of the data phase of a command
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// No data phase
    #[default]
    None,
    /// Device to host
    Read,
    /// Host to device
    Write,
}

/// One programmable sequencer entry
///
/// Describes the phases of a single bus transaction: the opcode byte, the
/// width of the address phase, the number of dummy cycles, the number of
/// lines used by the address/data phases and the direction of the data phase.
/// The controller stores templates in numbered slots; a [`Transfer`] then
/// refers to a slot and supplies the address and the data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CommandTemplate {
    /// The opcode byte
    pub opcode: u8,
    /// Address phase width
    pub address_width: AddressWidth,
    /// Number of dummy cycles between address and data
    pub dummy_cycles: u8,
    /// Lines used for the address and data phases
    pub io_mode: IoMode,
    /// Data phase direction
    pub direction: Direction,
}

impl CommandTemplate {
    /// Opcode-only command (e.g. WREN, RESET)
    pub const fn command(opcode: u8) -> Self {
        Self {
            opcode,
            address_width: AddressWidth::None,
            dummy_cycles: 0,
            io_mode: IoMode::Single,
            direction: Direction::None,
        }
    }

    /// Command with an address phase and no data
    pub const fn addressed(opcode: u8, address_width: AddressWidth) -> Self {
        Self {
            address_width,
            ..Self::command(opcode)
        }
    }

    /// Command reading data after an optional address phase
    pub const fn read(opcode: u8, address_width: AddressWidth) -> Self {
        Self {
            address_width,
            direction: Direction::Read,
            ..Self::command(opcode)
        }
    }

    /// Command writing data after an optional address phase
    pub const fn write(opcode: u8, address_width: AddressWidth) -> Self {
        Self {
            address_width,
            direction: Direction::Write,
            ..Self::command(opcode)
        }
    }

    /// Set the I/O mode for this template
    pub const fn with_io_mode(mut self, mode: IoMode) -> Self {
        self.io_mode = mode;
        self
    }

    /// Set the number of dummy cycles
    pub const fn with_dummy_cycles(mut self, cycles: u8) -> Self {
        self.dummy_cycles = cycles;
        self
    }

    /// Returns true if this template has an address phase
    pub const fn has_address(&self) -> bool {
        !matches!(self.address_width, AddressWidth::None)
    }
}

/// A single bus transaction against a loaded sequencer slot
///
/// Designed to avoid allocation - uses slices for data.
/// The lifetime parameter `'a` ties the transfer to the buffers it references.
pub struct Transfer<'a> {
    /// Sequencer slot holding the template to run
    pub slot: u8,
    /// Address for the address phase (ignored if the template has none)
    pub address: u32,
    /// Data to send during a write data phase
    pub write_data: &'a [u8],
    /// Buffer filled during a read data phase
    pub read_buf: &'a mut [u8],
}

impl<'a> Transfer<'a> {
    /// Transfer with no data phase
    pub fn command(slot: u8, address: u32) -> Self {
        Self {
            slot,
            address,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Returns the number of data bytes moved by this transfer
    pub fn data_len(&self) -> usize {
        self.write_data.len() + self.read_buf.len()
    }
}
