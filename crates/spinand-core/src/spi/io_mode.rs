//! Bus widths of the address and data phases

use crate::error::{Error, Result};
use crate::programmer::SpiFeatures;

/// Line usage of one sequencer template
///
/// The opcode always goes out on one line. Notation is opcode-address-data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum IoMode {
    /// 1-1-1
    #[default]
    Single,
    /// 1-1-2, cache read x2
    DualOut,
    /// 1-2-2, cache read dual I/O
    DualIo,
    /// 1-1-4, cache read x4 and program load x4
    QuadOut,
    /// 1-4-4, cache read quad I/O
    QuadIo,
}

impl IoMode {
    /// Lines driven during the address and dummy phases
    pub const fn addr_lines(&self) -> u8 {
        match self {
            Self::DualIo => 2,
            Self::QuadIo => 4,
            _ => 1,
        }
    }

    /// Lines carrying the data phase
    pub const fn data_lines(&self) -> u8 {
        match self {
            Self::Single => 1,
            Self::DualOut | Self::DualIo => 2,
            Self::QuadOut | Self::QuadIo => 4,
        }
    }

    /// The device only accepts these with QE set in the secure OTP register
    pub const fn requires_quad(&self) -> bool {
        self.data_lines() == 4
    }

    const fn required_feature(&self) -> SpiFeatures {
        match self {
            Self::Single => SpiFeatures::empty(),
            Self::DualOut => SpiFeatures::DUAL_IN,
            Self::DualIo => SpiFeatures::DUAL_IO,
            Self::QuadOut => SpiFeatures::QUAD_IN,
            Self::QuadIo => SpiFeatures::QUAD_IO,
        }
    }
}

/// Fail with [`Error::IoModeNotSupported`] unless the controller can drive `mode`
pub fn check_io_mode_supported(mode: IoMode, features: SpiFeatures) -> Result<()> {
    if features.contains(mode.required_feature()) {
        Ok(())
    } else {
        log::debug!("Controller features {:?} lack {:?}", features, mode);
        Err(Error::IoModeNotSupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines() {
        assert_eq!(IoMode::DualIo.addr_lines(), 2);
        assert_eq!(IoMode::QuadOut.addr_lines(), 1);
        assert_eq!(IoMode::QuadOut.data_lines(), 4);
        assert!(IoMode::QuadIo.requires_quad());
        assert!(!IoMode::DualIo.requires_quad());
    }

    #[test]
    fn test_feature_check() {
        assert!(check_io_mode_supported(IoMode::Single, SpiFeatures::empty()).is_ok());
        assert!(check_io_mode_supported(IoMode::DualOut, SpiFeatures::DUAL).is_ok());
        assert_eq!(
            check_io_mode_supported(IoMode::QuadIo, SpiFeatures::DUAL | SpiFeatures::QUAD_IN),
            Err(Error::IoModeNotSupported)
        );
    }
}
