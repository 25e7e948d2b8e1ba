//! Recording controller for unit tests

use crate::error::{Error, Result};
use crate::programmer::{SequenceController, SpiFeatures};
use crate::protocol::{SecureOtp, Status};
use crate::spi::{opcodes, CommandTemplate, Transfer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Load { slot: u8, opcode: u8 },
    Transfer { slot: u8, opcode: u8, address: u32 },
    Reset,
    Delay(u32),
}

/// Minimal device model: feature registers, a busy counter and an ONFI
/// parameter page visible at row 1 while OTP access is enabled.
pub struct MockController {
    pub lut: [Option<CommandTemplate>; 16],
    pub slots: u8,
    pub events: heapless::Vec<Event, 512>,
    pub fail_next: bool,
    pub registers: [u8; 256],
    pub busy_polls: u32,
    pub otp_sticky: bool,
    pub parameter_page: [u8; 256],
    pub features: SpiFeatures,
    row: u32,
}

impl MockController {
    pub fn new() -> Self {
        Self {
            lut: [None; 16],
            slots: 16,
            events: heapless::Vec::new(),
            fail_next: false,
            registers: [0; 256],
            busy_polls: 0,
            otp_sticky: false,
            parameter_page: [0; 256],
            features: SpiFeatures::empty(),
            row: 0,
        }
    }

    pub fn register(&self, address: u8) -> u8 {
        self.registers[address as usize]
    }

    fn record(&mut self, event: Event) {
        let _ = self.events.push(event);
    }
}

impl SequenceController for MockController {
    fn features(&self) -> SpiFeatures {
        self.features
    }

    fn slot_count(&self) -> u8 {
        self.slots
    }

    fn load_sequence(&mut self, slot: u8, template: &CommandTemplate) -> Result<()> {
        self.lut[slot as usize] = Some(*template);
        self.record(Event::Load {
            slot,
            opcode: template.opcode,
        });
        Ok(())
    }

    fn transfer(&mut self, xfer: &mut Transfer<'_>) -> Result<()> {
        let template = self.lut[xfer.slot as usize].ok_or(Error::ProgrammerError)?;
        self.record(Event::Transfer {
            slot: xfer.slot,
            opcode: template.opcode,
            address: xfer.address,
        });
        if self.fail_next {
            self.fail_next = false;
            return Err(Error::TransferFailed);
        }

        let reg = (xfer.address & 0xFF) as usize;
        match template.opcode {
            opcodes::GET_FEATURE => {
                let mut value = self.registers[reg];
                if reg == opcodes::FEATURE_STATUS as usize && self.busy_polls > 0 {
                    self.busy_polls -= 1;
                    value |= Status::WIP.bits();
                }
                xfer.read_buf[0] = value;
            }
            opcodes::SET_FEATURE => {
                let mut value = xfer.write_data[0];
                if reg == opcodes::FEATURE_SECURE_OTP as usize && self.otp_sticky {
                    value &= !SecureOtp::OTP_EN.bits();
                }
                self.registers[reg] = value;
            }
            opcodes::PAGE_READ => self.row = xfer.address,
            opcodes::READ_CACHE | opcodes::READ_CACHE_ALT => {
                let otp = SecureOtp::from_bits_retain(
                    self.registers[opcodes::FEATURE_SECURE_OTP as usize],
                );
                let column = (xfer.address & 0xFFFF) as usize;
                for (i, byte) in xfer.read_buf.iter_mut().enumerate() {
                    *byte = if otp.contains(SecureOtp::OTP_EN) && self.row == 1 {
                        self.parameter_page.get(column + i).copied().unwrap_or(0)
                    } else {
                        0xFF
                    };
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn software_reset(&mut self) {
        self.record(Event::Reset);
    }

    fn delay_us(&mut self, us: u32) {
        self.record(Event::Delay(us));
    }
}
