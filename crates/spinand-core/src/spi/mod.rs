//! SPI types and command structures
//!
//! This module provides types for describing one sequencer entry (a
//! [`CommandTemplate`]), a single bus [`Transfer`] against a loaded slot,
//! I/O widths, and the SPI-NAND opcode set.

mod address;
mod command;
mod io_mode;
pub mod opcodes;

pub use address::AddressWidth;
pub use command::{CommandTemplate, Direction, Transfer};
pub use io_mode::{check_io_mode_supported, IoMode};
pub use opcodes::*;
