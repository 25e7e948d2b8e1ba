//! Feature register access and busy polling
//!
//! All helpers take the [`Dispatcher`] by mutable reference. Read-modify-write
//! helpers assume a single caller per device.

use crate::error::{Error, Result};
use crate::programmer::SequenceController;

use super::{BlockProtection, Dispatcher, FeatureRegister, OpKind, Payload, SecureOtp, Status};

/// Read a feature register
pub fn get_feature<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
    reg: FeatureRegister,
) -> Result<u8> {
    let mut buf = [0u8; 1];
    dispatcher.execute(
        OpKind::GetFeature,
        reg.address() as u32,
        Payload::Rx(&mut buf),
    )?;
    Ok(buf[0])
}

/// Write a feature register
pub fn set_feature<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
    reg: FeatureRegister,
    value: u8,
) -> Result<()> {
    let data = [value];
    dispatcher.execute(OpKind::SetFeature, reg.address() as u32, Payload::Tx(&data))
}

/// Read-modify-write a feature register, returning the value written
///
/// The register is not written if `f` leaves the value unchanged.
pub fn update_feature<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
    reg: FeatureRegister,
    f: impl FnOnce(u8) -> u8,
) -> Result<u8> {
    let old = get_feature(dispatcher, reg)?;
    let new = f(old);
    if new != old {
        set_feature(dispatcher, reg, new)?;
    }
    Ok(new)
}

/// Read the status feature register
pub fn get_status<C: SequenceController>(dispatcher: &mut Dispatcher<C>) -> Result<Status> {
    get_feature(dispatcher, FeatureRegister::Status).map(Status::from_bits_retain)
}

/// Wait for the WIP bit to clear
///
/// Polls the status feature register every `poll_delay_us` until the device
/// is ready and returns the last status read. Gives up with
/// [`Error::BusyTimeout`] once `timeout_us` has elapsed.
pub fn wait_ready<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
    poll_delay_us: u32,
    timeout_us: u32,
) -> Result<Status> {
    let max_polls = if poll_delay_us > 0 {
        timeout_us / poll_delay_us
    } else {
        timeout_us
    }
    .max(1);

    for _ in 0..max_polls {
        let status = get_status(dispatcher)?;
        if !status.is_busy() {
            return Ok(status);
        }
        if poll_delay_us > 0 {
            dispatcher.delay_us(poll_delay_us);
        }
    }

    log::debug!("Device still busy after {} polls", max_polls);
    Err(Error::BusyTimeout)
}

/// Send the Write Enable command
pub fn write_enable<C: SequenceController>(dispatcher: &mut Dispatcher<C>) -> Result<()> {
    dispatcher.execute(OpKind::WriteEnable, 0, Payload::None)
}

/// Send the Write Disable command
pub fn write_disable<C: SequenceController>(dispatcher: &mut Dispatcher<C>) -> Result<()> {
    dispatcher.execute(OpKind::WriteDisable, 0, Payload::None)
}

fn set_otp_bits<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
    bits: SecureOtp,
    enable: bool,
) -> Result<()> {
    update_feature(dispatcher, FeatureRegister::SecureOtp, |v| {
        let mut otp = SecureOtp::from_bits_retain(v);
        otp.set(bits, enable);
        otp.bits()
    })
    .map(|_| ())
}

/// Set the QE bit so x4 commands are accepted
pub fn quad_enable<C: SequenceController>(dispatcher: &mut Dispatcher<C>) -> Result<()> {
    set_otp_bits(dispatcher, SecureOtp::QE, true)
}

/// Clear the QE bit
pub fn quad_disable<C: SequenceController>(dispatcher: &mut Dispatcher<C>) -> Result<()> {
    set_otp_bits(dispatcher, SecureOtp::QE, false)
}

/// Clear all block protection level bits
pub fn clear_block_protection<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
) -> Result<()> {
    update_feature(dispatcher, FeatureRegister::BlockProtection, |v| {
        v & !BlockProtection::BP_MASK.bits()
    })
    .map(|_| ())
}

/// Enter continuous read mode
pub fn continuous_read_enable<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
) -> Result<()> {
    set_otp_bits(dispatcher, SecureOtp::CONT, true)
}

/// Leave continuous read mode
pub fn continuous_read_disable<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
) -> Result<()> {
    set_otp_bits(dispatcher, SecureOtp::CONT, false)
}

/// Enable on-die ECC
pub fn ecc_enable<C: SequenceController>(dispatcher: &mut Dispatcher<C>) -> Result<()> {
    set_otp_bits(dispatcher, SecureOtp::ECC_EN, true)
}

/// Select a read recovery mode (0 leaves recovery)
pub fn set_recovery_mode<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
    mode: u8,
) -> Result<()> {
    set_feature(dispatcher, FeatureRegister::Spec, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::mock::{Event, MockController};
    use crate::spi::opcodes;

    fn installed() -> Dispatcher<MockController> {
        let mut d = Dispatcher::new(MockController::new());
        d.install().unwrap();
        d
    }

    #[test]
    fn test_wait_ready_polls_until_clear() {
        let mut d = installed();
        d.controller_mut().busy_polls = 3;
        let status = wait_ready(&mut d, 10, 1_000).unwrap();
        assert!(!status.is_busy());

        let delays = d
            .controller()
            .events
            .iter()
            .filter(|e| matches!(e, Event::Delay(10)))
            .count();
        assert_eq!(delays, 3);
    }

    #[test]
    fn test_wait_ready_timeout() {
        let mut d = installed();
        d.controller_mut().busy_polls = u32::MAX;
        assert_eq!(wait_ready(&mut d, 10, 100), Err(Error::BusyTimeout));
    }

    #[test]
    fn test_wait_ready_propagates_transfer_error() {
        let mut d = installed();
        d.controller_mut().fail_next = true;
        assert_eq!(wait_ready(&mut d, 10, 100), Err(Error::TransferFailed));
    }

    #[test]
    fn test_clear_block_protection_keeps_other_bits() {
        let mut d = installed();
        d.controller_mut().registers[opcodes::FEATURE_BLOCK_PROTECTION as usize] = 0xBE;
        clear_block_protection(&mut d).unwrap();
        assert_eq!(d.controller().register(opcodes::FEATURE_BLOCK_PROTECTION), 0x86);
    }

    #[test]
    fn test_otp_bits() {
        let mut d = installed();
        ecc_enable(&mut d).unwrap();
        quad_enable(&mut d).unwrap();
        continuous_read_enable(&mut d).unwrap();
        assert_eq!(d.controller().register(opcodes::FEATURE_SECURE_OTP), 0x15);

        continuous_read_disable(&mut d).unwrap();
        quad_disable(&mut d).unwrap();
        assert_eq!(d.controller().register(opcodes::FEATURE_SECURE_OTP), 0x10);
    }

    #[test]
    fn test_update_feature_skips_unchanged_write() {
        let mut d = installed();
        d.controller_mut().registers[opcodes::FEATURE_SECURE_OTP as usize] = 0x10;
        d.controller_mut().events.clear();
        ecc_enable(&mut d).unwrap();
        let writes = d
            .controller()
            .events
            .iter()
            .filter(|e| {
                matches!(e, Event::Transfer { opcode, .. } if *opcode == opcodes::SET_FEATURE)
            })
            .count();
        assert_eq!(writes, 0);
    }
}
