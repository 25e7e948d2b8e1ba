//! SPI-NAND device context

use alloc::vec;
use alloc::vec::Vec;

use crate::ecc::EccContext;
use crate::error::Result;
use crate::onfi;
use crate::programmer::SequenceController;
use crate::protocol::bbm::{self, BbmLink, MAX_BBM_LINKS};
use crate::protocol::nand::{self, EccWarning};
use crate::protocol::{features, Dispatcher, Status};
use crate::spi::check_io_mode_supported;

use super::config::{NandConfig, ProgramInstruction, ReadInstruction};
use super::geometry::DeviceGeometry;

/// Software ECC counters since the context was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EccStats {
    /// Total bits corrected by the software decoder
    pub corrected_bits: u32,
    /// Steps that reached the configured threshold
    pub threshold_warnings: u32,
    /// Pages recovered through a read recovery mode
    pub recoveries: u32,
    /// Pages reported uncorrectable
    pub uncorrectable: u32,
}

/// An initialized SPI-NAND device
///
/// Owns the dispatcher (and through it the controller), the geometry read
/// from the parameter page and, for devices without on-die ECC, the
/// software codec plus a page+OOB scratch buffer.
pub struct SpiNand<C: SequenceController> {
    pub(super) dispatcher: Dispatcher<C>,
    pub(super) geometry: DeviceGeometry,
    pub(super) config: NandConfig,
    pub(super) ecc: Option<EccContext>,
    pub(super) page_buf: Vec<u8>,
    pub(super) stats: EccStats,
}

impl<C: SequenceController> SpiNand<C> {
    /// Bring up the device behind `controller`
    ///
    /// Installs the static sequencer slots, clears block protection, reads
    /// the ONFI parameter page and sets up ECC: the software codec when the
    /// page asks for one, on-die ECC otherwise. Finally applies the
    /// configured read and program variants.
    pub fn new(controller: C, config: NandConfig) -> Result<Self> {
        let mut dispatcher = Dispatcher::new(controller);
        dispatcher.install()?;
        features::clear_block_protection(&mut dispatcher)?;

        let page = onfi::discover(&mut dispatcher, config.poll_delay_us, config.read_timeout_us)?;
        let geometry = DeviceGeometry::from_parameter_page(&page)?;

        let ecc = if geometry.uses_software_ecc() {
            Some(EccContext::new(
                geometry.ecc_bit_strength,
                geometry.page_size as usize,
                geometry.oob_size as usize,
            )?)
        } else {
            features::ecc_enable(&mut dispatcher)?;
            None
        };

        let page_buf = vec![0xFF; (geometry.page_size + geometry.oob_size) as usize];
        let mut nand = Self {
            dispatcher,
            geometry,
            config,
            ecc,
            page_buf,
            stats: EccStats::default(),
        };
        nand.set_io_mode(config.read_instruction, config.program_instruction)?;

        log::info!(
            "SPI-NAND ready: {} blocks x {} pages x {} bytes (+{} OOB), {} ECC",
            geometry.block_count,
            geometry.page_count,
            geometry.page_size,
            geometry.oob_size,
            if nand.ecc.is_some() { "software" } else { "on-die" }
        );
        Ok(nand)
    }

    /// Device geometry
    pub fn geometry(&self) -> &DeviceGeometry {
        &self.geometry
    }

    /// Active configuration
    pub fn config(&self) -> &NandConfig {
        &self.config
    }

    /// Software codec, if the device uses one
    pub fn ecc(&self) -> Option<&EccContext> {
        self.ecc.as_ref()
    }

    /// Software ECC counters
    pub fn ecc_stats(&self) -> EccStats {
        self.stats
    }

    /// Switch the read and program instruction variants
    ///
    /// Fails with [`Error::IoModeNotSupported`](crate::Error::IoModeNotSupported)
    /// if the controller lacks the bus width. Sets or clears the quad enable
    /// bit to match.
    pub fn set_io_mode(&mut self, read: ReadInstruction, program: ProgramInstruction) -> Result<()> {
        let controller_features = self.dispatcher.controller().features();
        check_io_mode_supported(read.io_mode(), controller_features)?;
        check_io_mode_supported(program.io_mode(), controller_features)?;

        if read.io_mode().requires_quad() || program.io_mode().requires_quad() {
            features::quad_enable(&mut self.dispatcher)?;
        } else {
            features::quad_disable(&mut self.dispatcher)?;
        }

        log::debug!("I/O mode: read {:?}, program {:?}", read, program);
        self.config.read_instruction = read;
        self.config.program_instruction = program;
        Ok(())
    }

    /// Read the manufacturer and device ID
    pub fn read_id(&mut self) -> Result<(u8, u8)> {
        nand::read_id(&mut self.dispatcher)
    }

    /// Reset the device
    pub fn reset(&mut self) -> Result<()> {
        nand::reset(&mut self.dispatcher)
    }

    /// Enter deep power-down; [`reset`](Self::reset) wakes the device up
    pub fn deep_power_down(&mut self) -> Result<()> {
        nand::deep_power_down(&mut self.dispatcher)
    }

    /// Read the status register
    pub fn read_status(&mut self) -> Result<Status> {
        nand::read_status(&mut self.dispatcher)
    }

    /// Bits corrected by on-die ECC during the last read
    pub fn read_ecc_status(&mut self) -> Result<u8> {
        nand::read_ecc_status(&mut self.dispatcher)
    }

    /// Pages flagged by on-die ECC during the last continuous read
    pub fn ecc_warning(&mut self) -> Result<EccWarning> {
        nand::ecc_warning(&mut self.dispatcher)
    }

    /// Add a bad block replacement link
    pub fn write_bbm_link(&mut self, link: BbmLink) -> Result<()> {
        bbm::write_bbm_link(
            &mut self.dispatcher,
            link,
            self.config.poll_delay_us,
            self.config.program_timeout_us,
        )
    }

    /// Read the bad block replacement table
    pub fn read_bbm_links(&mut self) -> Result<heapless::Vec<BbmLink, MAX_BBM_LINKS>> {
        bbm::read_bbm_links(&mut self.dispatcher)
    }

    /// Get a reference to the controller
    pub fn controller(&self) -> &C {
        self.dispatcher.controller()
    }

    /// Get a mutable reference to the controller
    pub fn controller_mut(&mut self) -> &mut C {
        self.dispatcher.controller_mut()
    }

    /// Release the controller
    pub fn into_inner(self) -> C {
        self.dispatcher.into_inner()
    }
}
