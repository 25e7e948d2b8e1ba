//! Driver configuration

use crate::protocol::OpKind;
use crate::spi::IoMode;

/// Read-from-cache instruction variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ReadInstruction {
    /// 0x03
    #[default]
    Single,
    /// 0x0B
    Alternative,
    /// 0x3B
    DualOutput,
    /// 0x6B
    QuadOutput,
    /// 0xBB
    DualIo,
    /// 0xEB
    QuadIo,
}

impl ReadInstruction {
    /// Operation issued for this variant
    pub const fn op(self) -> OpKind {
        match self {
            Self::Single => OpKind::ReadCache,
            Self::Alternative => OpKind::ReadCacheAlt,
            Self::DualOutput => OpKind::ReadCacheX2,
            Self::QuadOutput => OpKind::ReadCacheX4,
            Self::DualIo => OpKind::ReadCacheDualIo,
            Self::QuadIo => OpKind::ReadCacheQuadIo,
        }
    }

    /// Bus mode used by this variant
    pub const fn io_mode(self) -> IoMode {
        self.op().template().io_mode
    }
}

/// Program-load instruction variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ProgramInstruction {
    /// 0x02 / 0x84
    #[default]
    Single,
    /// 0x32 / 0x34
    QuadOutput,
}

impl ProgramInstruction {
    /// Load operation (resets the cache to 0xFF)
    pub const fn load_op(self) -> OpKind {
        match self {
            Self::Single => OpKind::PageLoad,
            Self::QuadOutput => OpKind::PageLoadX4,
        }
    }

    /// Random load operation (keeps the cache content)
    pub const fn random_load_op(self) -> OpKind {
        match self {
            Self::Single => OpKind::PageLoadRandom,
            Self::QuadOutput => OpKind::PageLoadRandomX4,
        }
    }

    /// Bus mode used by this variant
    pub const fn io_mode(self) -> IoMode {
        self.load_op().template().io_mode
    }
}

/// Runtime configuration for [`SpiNand`](super::SpiNand)
///
/// Timeouts bound every busy wait; a device that stays busy longer fails
/// the operation with [`Error::BusyTimeout`](crate::Error::BusyTimeout).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct NandConfig {
    /// Active read-from-cache variant
    pub read_instruction: ReadInstruction,
    /// Active program-load variant
    pub program_instruction: ProgramInstruction,
    /// Corrected bits per step at which a software ECC warning is raised
    pub ecc_threshold: u8,
    /// Number of read recovery modes to try (1..=5)
    pub recovery_modes: u8,
    /// Fail reads that reach `ecc_threshold` instead of logging a warning
    pub strict_ecc_threshold: bool,
    /// Use continuous read for multi-page reads when the device supports it
    pub use_continuous_read: bool,
    /// Delay between status polls
    pub poll_delay_us: u32,
    /// Page read busy timeout
    pub read_timeout_us: u32,
    /// Program busy timeout
    pub program_timeout_us: u32,
    /// Block erase busy timeout
    pub erase_timeout_us: u32,
}

impl Default for NandConfig {
    fn default() -> Self {
        Self {
            read_instruction: ReadInstruction::default(),
            program_instruction: ProgramInstruction::default(),
            ecc_threshold: 8,
            recovery_modes: 5,
            strict_ecc_threshold: false,
            use_continuous_read: true,
            poll_delay_us: 10,
            read_timeout_us: 1_000,
            program_timeout_us: 10_000,
            erase_timeout_us: 100_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_ops() {
        assert_eq!(ReadInstruction::QuadIo.op(), OpKind::ReadCacheQuadIo);
        assert_eq!(ReadInstruction::QuadIo.io_mode(), IoMode::QuadIo);
        assert_eq!(ReadInstruction::Single.io_mode(), IoMode::Single);
        assert_eq!(ProgramInstruction::QuadOutput.random_load_op(), OpKind::PageLoadRandomX4);
        assert!(ProgramInstruction::QuadOutput.io_mode().requires_quad());
    }

    #[test]
    fn test_defaults() {
        let config = NandConfig::default();
        assert_eq!(config.ecc_threshold, 8);
        assert_eq!(config.recovery_modes, 5);
        assert!(!config.strict_ecc_threshold);
    }
}
