//! SPI-NAND protocol implementation
//!
//! This module implements the command sequences of a serial NAND device on
//! top of a [`SequenceController`](crate::programmer::SequenceController):
//!
//! - [`Dispatcher`] owns the sequencer slot layout and issues one bus
//!   transaction per call, binding the shared scratch slot when needed
//! - [`features`] reads and writes the one-byte feature registers and polls
//!   the busy bit
//! - [`nand`] holds the raw page/cache/block operations
//! - [`bbm`] reads and writes the bad-block link table

pub mod bbm;
mod dispatch;
pub mod features;
pub mod nand;
mod registers;

#[cfg(test)]
pub(crate) mod mock;

pub use dispatch::{Dispatcher, OpKind, Payload, ScratchGuard, SCRATCH_SLOT};
pub use registers::{BlockProtection, EccState, Enpgm, FeatureRegister, SecureOtp, Status};
