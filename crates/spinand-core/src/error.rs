//! Driver errors
//!
//! Every error is `Copy` and carries at most a byte address, so it can be
//! returned from `no_std` code without allocating.

use core::fmt;

/// Reasons geometry discovery can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFailure {
    /// The OTP enable bit did not read back as set
    OtpEnableFailed,
    /// The parameter page does not start with "ONFI"
    BadSignature,
    /// Page size / pages-per-block combination is not supported
    UnsupportedGeometry {
        /// Page size in bytes reported by the device
        page_size: u32,
        /// Pages per block reported by the device
        page_count: u16,
    },
    /// Requested ECC strength cannot be built for this geometry
    UnsupportedEccStrength(u8),
    /// ECC codes do not fit in the out-of-band area
    EccLayoutOverflow,
}

/// Errors returned by the dispatcher, the protocol helpers and `SpiNand`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Bus errors
    /// Controller reported a failed transfer
    TransferFailed,
    /// Opcode is not supported by the controller or device
    OpcodeNotSupported,
    /// Requested I/O mode is not supported by the controller
    IoModeNotSupported,
    /// Device stayed busy for longer than the allowed time
    BusyTimeout,

    // Argument errors
    /// Misaligned or out-of-range address, length or buffer
    InvalidArgument,

    // Discovery errors
    /// Geometry discovery failed
    GeometryDiscovery(GeometryFailure),

    // Data integrity errors
    /// Data could not be corrected
    EccUncorrectable {
        /// Byte address of the failing page
        addr: u32,
    },
    /// Bit flip count reached the configured threshold
    EccThresholdWarning {
        /// Byte address of the affected page
        addr: u32,
        /// Number of corrected bits in the worst step
        bitflips: u8,
    },

    // Operation errors
    /// Device reported a program failure
    ProgramFailed {
        /// Byte address of the page that failed
        addr: u32,
    },
    /// Device reported an erase failure
    EraseFailed {
        /// Byte address of the block that failed
        addr: u32,
    },

    // Protection errors
    /// Device rejected the operation (write enable latch not set)
    WriteProtected,

    // Controller errors
    /// General controller error
    ProgrammerError,
}

impl fmt::Display for GeometryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OtpEnableFailed => write!(f, "OTP enable bit did not latch"),
            Self::BadSignature => write!(f, "parameter page signature is not 'ONFI'"),
            Self::UnsupportedGeometry {
                page_size,
                page_count,
            } => write!(
                f,
                "unsupported geometry: {} byte pages, {} pages per block",
                page_size, page_count
            ),
            Self::UnsupportedEccStrength(bits) => {
                write!(f, "unsupported ECC strength: {} bits", bits)
            }
            Self::EccLayoutOverflow => write!(f, "ECC codes do not fit in the OOB area"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransferFailed => write!(f, "SPI transfer failed"),
            Self::OpcodeNotSupported => write!(f, "opcode not supported"),
            Self::IoModeNotSupported => write!(f, "I/O mode not supported by controller"),
            Self::BusyTimeout => write!(f, "timed out waiting for device ready"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::GeometryDiscovery(failure) => write!(f, "geometry discovery failed: {}", failure),
            Self::EccUncorrectable { addr } => {
                write!(f, "uncorrectable ECC error at 0x{:08X}", addr)
            }
            Self::EccThresholdWarning { addr, bitflips } => write!(
                f,
                "{} bit flips at 0x{:08X} reached the ECC threshold",
                bitflips, addr
            ),
            Self::ProgramFailed { addr } => write!(f, "program failed at 0x{:08X}", addr),
            Self::EraseFailed { addr } => write!(f, "erase failed at 0x{:08X}", addr),
            Self::WriteProtected => write!(f, "device is write protected"),
            Self::ProgrammerError => write!(f, "programmer error"),
        }
    }
}

impl From<GeometryFailure> for Error {
    fn from(failure: GeometryFailure) -> Self {
        Self::GeometryDiscovery(failure)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result with [`Error`]
pub type Result<T> = core::result::Result<T, Error>;
