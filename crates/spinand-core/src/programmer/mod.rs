//! Controller abstraction
//!
//! The driver talks to the bus through a [`SequenceController`]: a host SPI
//! controller with a small table of programmable command sequences (a LUT).

mod traits;

pub use traits::*;
