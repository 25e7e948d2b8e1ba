//! ONFI parameter page discovery
//!
//! SPI-NAND parts describe their geometry in a 256-byte ONFI parameter page
//! stored in the OTP area. The page becomes readable at row 1 once the
//! OTP_EN bit of the secure OTP feature register is set.
//!
//! # Usage
//!
//! ```ignore
//! use spinand_core::onfi;
//!
//! let page = onfi::discover(&mut dispatcher, 10, 1_000)?;
//! println!("{} byte pages, {} pages per block", page.page_size, page.pages_per_block);
//! ```

mod parser;
mod types;

pub use parser::{discover, read_parameter_page};
pub use types::*;
