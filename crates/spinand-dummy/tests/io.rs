//! Read, write and erase through the chunker on an on-die ECC device

mod common;

use common::*;
use spinand_core::flash::{FlashDevice, FlashDeviceExt};
use spinand_core::Error;
use spinand_dummy::DummyConfig;

#[test]
fn test_geometry_from_parameter_page() {
    let nand = open(DummyConfig::default());
    let geo = nand.geometry();
    assert_eq!(geo.page_size, 2048);
    assert_eq!(geo.oob_size, 64);
    assert_eq!(geo.block_size, 131072);
    assert_eq!(geo.flash_size, 134217728);
    assert_eq!(geo.page_shift, 11);
    assert_eq!(geo.block_shift, 17);
    assert!(!geo.uses_software_ecc());
    assert!(nand.ecc().is_none());
}

#[test]
fn test_page_round_trip() {
    let mut nand = open(DummyConfig::default());
    for (i, len) in [1usize, 17, 1024, PAGE].into_iter().enumerate() {
        let addr = ((i + 3) * PAGE) as u32;
        let data = random_bytes(i as u64, len);
        nand.write(addr, &data).unwrap();

        let mut buf = vec![0u8; len];
        nand.read(addr, &mut buf).unwrap();
        assert_eq!(buf, data, "length {}", len);
    }
}

#[test]
fn test_two_page_write_resets_column() {
    let mut nand = open(DummyConfig::default());
    let data = random_bytes(7, 2 * PAGE);
    nand.write(4 * PAGE as u32, &data).unwrap();

    let stored4 = nand.controller().page(4).unwrap();
    assert_eq!(&stored4[..PAGE], &data[..PAGE]);
    let stored5 = nand.controller().page(5).unwrap();
    assert_eq!(&stored5[..PAGE], &data[PAGE..]);

    let mut buf = vec![0u8; 2 * PAGE];
    nand.read(4 * PAGE as u32, &mut buf).unwrap();
    assert_eq!(buf, data);
}

#[test]
fn test_unaligned_write_spans_pages() {
    let mut nand = open(DummyConfig::default());
    let addr = (2 * PAGE + 1500) as u32;
    let data = random_bytes(11, 3000);
    nand.write(addr, &data).unwrap();

    // Page 2 keeps 0xFF before the start column, page 4 after the end
    let page2 = nand.controller().page(2).unwrap();
    assert!(page2[..1500].iter().all(|&b| b == 0xFF));
    assert_eq!(&page2[1500..PAGE], &data[..548]);
    let page4 = nand.controller().page(4).unwrap();
    assert_eq!(&page4[..404], &data[548 + PAGE..]);
    assert!(page4[404..PAGE].iter().all(|&b| b == 0xFF));

    let mut buf = vec![0u8; 3000];
    nand.read(addr, &mut buf).unwrap();
    assert_eq!(buf, data);
}

#[test]
fn test_erase_restores_ff() {
    let mut nand = open(DummyConfig::default());
    let data = random_bytes(3, 3 * PAGE);
    nand.write(BLOCK as u32, &data).unwrap();

    nand.erase(BLOCK as u32, BLOCK as u32).unwrap();
    let mut buf = vec![0u8; 3 * PAGE];
    nand.read(BLOCK as u32, &mut buf).unwrap();
    assert!(buf.iter().all(|&b| b == 0xFF));
    assert_eq!(nand.controller().stats().erases, 1);
}

#[test]
fn test_erase_argument_validation() {
    let mut nand = open(DummyConfig::default());
    let size = nand.geometry().flash_size;
    let block = BLOCK as u32;

    assert_eq!(nand.erase(PAGE as u32, block), Err(Error::InvalidArgument));
    assert_eq!(nand.erase(0, block / 2), Err(Error::InvalidArgument));
    assert_eq!(nand.erase(0, 0), Err(Error::InvalidArgument));
    assert_eq!(nand.erase(size - block, 2 * block), Err(Error::InvalidArgument));
    assert_eq!(nand.controller().stats().transfers, 0);

    nand.erase(size - block, block).unwrap();
    nand.erase(0, 3 * block).unwrap();
    assert_eq!(nand.controller().stats().erases, 4);
}

#[test]
fn test_out_of_range_io_rejected() {
    let mut nand = open(DummyConfig::default());
    let size = nand.geometry().flash_size;
    let mut buf = [0u8; 16];
    assert_eq!(nand.read(size - 8, &mut buf), Err(Error::InvalidArgument));
    assert_eq!(nand.write(size, &buf), Err(Error::InvalidArgument));
    nand.read(size - 16, &mut buf).unwrap();
}

#[test]
fn test_program_and_erase_failures() {
    let mut nand = open(DummyConfig::default());
    nand.controller_mut().fail_program(6);
    assert_eq!(
        nand.write(6 * PAGE as u32, &[0u8; 4]),
        Err(Error::ProgramFailed {
            addr: 6 * PAGE as u32
        })
    );

    nand.controller_mut().fail_erase(2);
    assert_eq!(
        nand.erase(BLOCK as u32, 2 * BLOCK as u32),
        Err(Error::EraseFailed {
            addr: 2 * BLOCK as u32
        })
    );
    // Block 1 went through before block 2 failed
    assert_eq!(nand.controller().stats().erases, 1);
}

#[test]
fn test_oob_access() {
    let mut nand = open(DummyConfig::default());
    nand.write_oob(8, &[0x00, 0x5A, 0xA5]).unwrap();

    let mut oob = [0u8; 64];
    nand.read_oob(8, &mut oob).unwrap();
    assert_eq!(&oob[..3], &[0x00, 0x5A, 0xA5]);
    assert!(oob[3..].iter().all(|&b| b == 0xFF));
    assert!(nand.controller().page(8).unwrap()[..PAGE].iter().all(|&b| b == 0xFF));

    assert_eq!(nand.read_oob(8, &mut [0u8; 65]), Err(Error::InvalidArgument));
}

#[test]
fn test_flash_device_trait() {
    let mut nand = open(DummyConfig {
        block_count: 8,
        ..DummyConfig::default()
    });
    let device: &mut dyn FlashDevice = &mut nand;
    assert_eq!(device.size(), 8 * BLOCK as u32);
    assert_eq!(device.erase_granularity(), BLOCK as u32);
    assert_eq!(device.page_size(), PAGE as u32);
    assert!(device.is_valid_range(0, 8 * BLOCK));
    assert!(!device.is_valid_range(1, 8 * BLOCK));

    let data = random_bytes(21, 100);
    device.write(PAGE as u32 - 50, &data).unwrap();
    let all = device.read_all().unwrap();
    assert_eq!(&all[PAGE - 50..PAGE + 50], &data[..]);

    device.erase_all().unwrap();
    let all = device.read_all().unwrap();
    assert!(all.iter().all(|&b| b == 0xFF));
}
