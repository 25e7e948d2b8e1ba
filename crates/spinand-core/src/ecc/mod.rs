//! Software ECC for devices without on-die ECC
//!
//! A page is protected in steps of [`ECC_STEP_SIZE`] bytes. Each step gets
//! its own BCH code, and the codes are stored back to back in the OOB area
//! starting at [`ECC_LAYOUT_OFFSET`] (the first OOB bytes hold the bad
//! block marker).
//!
//! Stored codes are XORed with the inverted code of an all-0xFF step. An
//! erased page (data and OOB all 0xFF) therefore decodes as clean, and bit
//! flips in an erased page are corrected like in any other page.

mod bch;
mod gf;

pub use bch::{Bch, EccStatus};
pub use gf::GaloisField;

use alloc::vec;
use alloc::vec::Vec;

use crate::error::GeometryFailure;

/// Data bytes covered by one ECC code
pub const ECC_STEP_SIZE: usize = 410;

/// Offset of the first ECC code within the OOB area
pub const ECC_LAYOUT_OFFSET: usize = 2;

/// Largest supported code size in bytes
pub const MAX_ECC_BYTES: usize = 64;

/// Field degree used for a given step size
pub const fn field_degree(step_size: usize) -> u32 {
    32 - ((1 + 8 * step_size) as u32).leading_zeros()
}

/// Bytes reserved for one code, rounded up to whole 32-bit words
pub const fn ecc_bytes(m: u32, strength: u32) -> usize {
    (((m * strength + 31) / 32) * 4) as usize
}

/// Per-device software ECC state
///
/// Built once from the ECC strength advertised in the parameter page and
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct EccContext {
    bch: Bch,
    page_size: usize,
    steps: usize,
    ecc_bytes: usize,
    erased_mask: Vec<u8>,
}

impl EccContext {
    /// Create the context for `strength` correctable bits per step
    pub fn new(strength: u8, page_size: usize, oob_size: usize) -> Result<Self, GeometryFailure> {
        let m = field_degree(ECC_STEP_SIZE);
        let bch = Bch::new(m, strength as u32, ECC_STEP_SIZE)
            .ok_or(GeometryFailure::UnsupportedEccStrength(strength))?;

        let ecc_bytes = ecc_bytes(m, strength as u32);
        if ecc_bytes > MAX_ECC_BYTES {
            return Err(GeometryFailure::UnsupportedEccStrength(strength));
        }

        let steps = page_size / ECC_STEP_SIZE;
        if steps == 0 || ECC_LAYOUT_OFFSET + steps * ecc_bytes > oob_size {
            return Err(GeometryFailure::EccLayoutOverflow);
        }

        let mut erased_mask = vec![0u8; ecc_bytes];
        bch.encode(&[0xFF; ECC_STEP_SIZE], &mut erased_mask);
        for byte in erased_mask.iter_mut() {
            *byte = !*byte;
        }

        log::debug!(
            "Software ECC: GF(2^{}), t={}, {} steps of {} bytes, {} code bytes per step",
            m,
            strength,
            steps,
            ECC_STEP_SIZE,
            ecc_bytes
        );

        Ok(Self {
            bch,
            page_size,
            steps,
            ecc_bytes,
            erased_mask,
        })
    }

    /// Correctable bits per step
    pub fn strength(&self) -> u32 {
        self.bch.strength()
    }

    /// Number of steps per page
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Code bytes per step
    pub fn ecc_bytes(&self) -> usize {
        self.ecc_bytes
    }

    /// Data bytes per step
    pub fn step_size(&self) -> usize {
        ECC_STEP_SIZE
    }

    /// Code offset of the first step within the OOB area
    pub fn layout_offset(&self) -> usize {
        ECC_LAYOUT_OFFSET
    }

    /// Mask XORed onto every stored code
    pub fn erased_mask(&self) -> &[u8] {
        &self.erased_mask
    }

    fn code_range(&self, step: usize) -> core::ops::Range<usize> {
        let start = self.page_size + ECC_LAYOUT_OFFSET + step * self.ecc_bytes;
        start..start + self.ecc_bytes
    }

    fn data_range(step: usize) -> core::ops::Range<usize> {
        step * ECC_STEP_SIZE..(step + 1) * ECC_STEP_SIZE
    }

    /// Compute the codes of every step and store them in the OOB part of
    /// a `page_size + oob_size` buffer
    pub fn encode_page(&self, buf: &mut [u8]) {
        for step in 0..self.steps {
            let mut code = [0u8; MAX_ECC_BYTES];
            let code = &mut code[..self.ecc_bytes];
            self.bch.encode(&buf[Self::data_range(step)], code);
            for (c, m) in code.iter_mut().zip(&self.erased_mask) {
                *c ^= m;
            }
            buf[self.code_range(step)].copy_from_slice(code);
        }
    }

    /// Check and correct one step of a `page_size + oob_size` buffer
    pub fn decode_step(&self, buf: &mut [u8], step: usize) -> EccStatus {
        let mut code = [0u8; MAX_ECC_BYTES];
        let code = &mut code[..self.ecc_bytes];
        code.copy_from_slice(&buf[self.code_range(step)]);
        for (c, m) in code.iter_mut().zip(&self.erased_mask) {
            *c ^= m;
        }
        self.bch.decode(&mut buf[Self::data_range(step)], code)
    }
}
