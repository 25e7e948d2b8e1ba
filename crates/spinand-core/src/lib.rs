//! spinand-core - SPI-NAND flash command layer
//!
//! This crate drives SPI-NAND flash through a controller with a programmable
//! command sequencer. It discovers the device geometry from the ONFI parameter
//! page, maps a linear byte address space onto page reads, page programs and
//! block erases, and optionally protects data with a software BCH code when
//! the device has no on-die ECC.
//!
//! It is designed to be `no_std` compatible. The device context and the
//! software ECC need a heap for the page buffer and Galois field tables.
//!
//! # Features
//!
//! - `alloc` (default) - Enable the `ecc` and `flash` modules
//! - `std` - Enable standard library support (includes `alloc` and serde)
//!
//! # Example
//!
//! ```ignore
//! use spinand_core::flash::{NandConfig, SpiNand};
//! use spinand_core::programmer::SequenceController;
//!
//! fn dump_first_page<C: SequenceController>(controller: C) -> spinand_core::Result<()> {
//!     let mut nand = SpiNand::new(controller, NandConfig::default())?;
//!     let mut page = vec![0u8; nand.geometry().page_size as usize];
//!     nand.read(0, &mut page)?;
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "alloc")]
pub mod ecc;
pub mod error;
#[cfg(feature = "alloc")]
pub mod flash;
pub mod onfi;
pub mod programmer;
pub mod protocol;
pub mod spi;

pub use error::{Error, GeometryFailure, Result};
