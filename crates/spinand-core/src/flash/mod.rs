//! High-level SPI-NAND access
//!
//! [`SpiNand`] ties the protocol layer together: it discovers the geometry,
//! picks on-die or software ECC and exposes byte-addressed read, write and
//! erase on top of page operations.

mod config;
mod context;
mod device;
mod geometry;
mod operations;

pub use config::{NandConfig, ProgramInstruction, ReadInstruction};
pub use context::{EccStats, SpiNand};
pub use device::{FlashDevice, FlashDeviceExt};
pub use geometry::DeviceGeometry;
pub use operations::{PageChunk, PageChunks};
