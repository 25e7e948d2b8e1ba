//! Feature register addresses and bit definitions

use crate::spi::opcodes;
use bitflags::bitflags;

/// One-byte feature registers reachable with GET/SET FEATURE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureRegister {
    /// Block protection bits
    BlockProtection,
    /// Secure OTP: QE, continuous read, on-die ECC, OTP access
    SecureOtp,
    /// Status: busy, write enable latch, program/erase fail, ECC status
    Status,
    /// SPI-NOR emulation enable
    SpiNorEnable,
    /// Output driver strength
    IoStrength,
    /// Bad-block table program enable
    Enpgm,
    /// Read recovery mode selection
    Spec,
}

impl FeatureRegister {
    /// Register address sent in the address phase of GET/SET FEATURE
    pub const fn address(self) -> u8 {
        match self {
            Self::BlockProtection => opcodes::FEATURE_BLOCK_PROTECTION,
            Self::SecureOtp => opcodes::FEATURE_SECURE_OTP,
            Self::Status => opcodes::FEATURE_STATUS,
            Self::SpiNorEnable => opcodes::FEATURE_SPI_NOR_EN,
            Self::IoStrength => opcodes::FEATURE_IO_STRENGTH,
            Self::Enpgm => opcodes::FEATURE_ENPGM,
            Self::Spec => opcodes::FEATURE_SPEC,
        }
    }
}

bitflags! {
    /// Status register (feature 0xC0)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Operation in progress
        const WIP = 0x01;
        /// Write enable latch
        const WEL = 0x02;
        /// Last erase failed
        const ERASE_FAIL = 0x04;
        /// Last program failed
        const PROGRAM_FAIL = 0x08;
        /// ECC status, low bit
        const ECC_S0 = 0x10;
        /// ECC status, high bit
        const ECC_S1 = 0x20;
        /// Mask of the ECC status field
        const ECC_MASK = Self::ECC_S0.bits() | Self::ECC_S1.bits();
    }
}

impl Status {
    /// Decode the on-die ECC status field
    pub fn ecc_state(self) -> EccState {
        match (self & Self::ECC_MASK).bits() {
            0x00 => EccState::Clean,
            0x10 => EccState::Corrected,
            0x20 => EccState::Uncorrectable,
            _ => EccState::Reserved,
        }
    }

    /// Returns true while the device is busy
    pub fn is_busy(self) -> bool {
        self.contains(Self::WIP)
    }
}

/// Result of the last on-die ECC operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EccState {
    /// No bit errors
    Clean,
    /// Bit errors were detected and corrected
    Corrected,
    /// Bit errors exceeded the on-die correction capability
    Uncorrectable,
    /// Reserved encoding
    Reserved,
}

impl EccState {
    /// Encode as status register bits
    pub fn status_bits(self) -> Status {
        match self {
            Self::Clean => Status::empty(),
            Self::Corrected => Status::ECC_S0,
            Self::Uncorrectable => Status::ECC_S1,
            Self::Reserved => Status::ECC_MASK,
        }
    }
}

bitflags! {
    /// Secure OTP register (feature 0xB0)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SecureOtp: u8 {
        /// Quad enable
        const QE = 0x01;
        /// Continuous read mode
        const CONT = 0x04;
        /// On-die ECC enable
        const ECC_EN = 0x10;
        /// OTP / parameter page access
        const OTP_EN = 0x40;
        /// OTP protection
        const OTP_PROT = 0x80;
    }
}

bitflags! {
    /// Block protection register (feature 0xA0)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BlockProtection: u8 {
        /// Protection bit 0
        const BP0 = 0x08;
        /// Protection bit 1
        const BP1 = 0x10;
        /// Protection bit 2
        const BP2 = 0x20;
        /// All protection level bits
        const BP_MASK = Self::BP0.bits() | Self::BP1.bits() | Self::BP2.bits();
    }
}

bitflags! {
    /// Bad-block table program enable register (feature 0x10)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Enpgm: u8 {
        /// Allow programming the BBM link table
        const ENPGM = 0x01;
    }
}
