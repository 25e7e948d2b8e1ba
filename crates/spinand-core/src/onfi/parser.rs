//! ONFI parameter page discovery procedure

use crate::error::{GeometryFailure, Result};
use crate::programmer::SequenceController;
use crate::protocol::features::{get_feature, set_feature, wait_ready};
use crate::protocol::nand::{page_read, read_from_cache};
use crate::protocol::{Dispatcher, FeatureRegister, OpKind, SecureOtp};

use super::types::*;

/// Read the raw parameter page
///
/// Enables OTP access, verifies that OTP_EN latched, then reads the page at
/// row 1 from the cache. OTP_EN is cleared on every exit path; the other
/// bits of the secure OTP register keep their previous value.
pub fn read_parameter_page<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
    poll_delay_us: u32,
    timeout_us: u32,
) -> Result<[u8; PARAMETER_PAGE_LEN]> {
    let saved = SecureOtp::from_bits_retain(get_feature(dispatcher, FeatureRegister::SecureOtp)?);

    let result = read_in_otp_mode(dispatcher, saved, poll_delay_us, timeout_us);

    let exit = saved - SecureOtp::OTP_EN;
    let restored = set_feature(dispatcher, FeatureRegister::SecureOtp, exit.bits());
    if let Err(e) = restored {
        log::debug!("Failed to leave OTP mode: {}", e);
    }

    let raw = result?;
    restored?;
    Ok(raw)
}

fn read_in_otp_mode<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
    saved: SecureOtp,
    poll_delay_us: u32,
    timeout_us: u32,
) -> Result<[u8; PARAMETER_PAGE_LEN]> {
    let enable = saved | SecureOtp::OTP_EN;
    set_feature(dispatcher, FeatureRegister::SecureOtp, enable.bits())?;

    let readback =
        SecureOtp::from_bits_retain(get_feature(dispatcher, FeatureRegister::SecureOtp)?);
    if !readback.contains(SecureOtp::OTP_EN) {
        log::debug!("OTP_EN did not latch (secure OTP = 0x{:02X})", readback.bits());
        return Err(GeometryFailure::OtpEnableFailed.into());
    }

    log::debug!("Reading ONFI parameter page at row {}", PARAMETER_PAGE_ROW);
    page_read(dispatcher, PARAMETER_PAGE_ROW)?;
    wait_ready(dispatcher, poll_delay_us, timeout_us)?;

    let mut raw = [0u8; PARAMETER_PAGE_LEN];
    read_from_cache(dispatcher, OpKind::ReadCache, 0, &mut raw)?;
    Ok(raw)
}

/// Read and validate the ONFI parameter page
pub fn discover<C: SequenceController>(
    dispatcher: &mut Dispatcher<C>,
    poll_delay_us: u32,
    timeout_us: u32,
) -> Result<ParameterPage> {
    let raw = read_parameter_page(dispatcher, poll_delay_us, timeout_us)?;

    log::debug!(
        "Parameter page signature: {:02X} {:02X} {:02X} {:02X}",
        raw[0],
        raw[1],
        raw[2],
        raw[3]
    );

    let page = ParameterPage::parse(&raw);
    if !page.is_valid() {
        log::debug!("ONFI signature invalid (expected 'ONFI')");
        return Err(GeometryFailure::BadSignature.into());
    }

    log::debug!(
        "ONFI: page {} + {} OOB, {} pages/block, {} blocks, ECC {} bits, recovery={}, continuous={}",
        page.page_size,
        page.oob_size,
        page.pages_per_block,
        page.block_count,
        page.ecc_bits,
        page.read_recovery,
        page.continuous_read
    );

    Ok(page)
}
