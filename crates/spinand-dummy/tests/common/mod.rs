#![allow(dead_code)]

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use spinand_core::flash::{NandConfig, SpiNand};
use spinand_dummy::{DummyConfig, DummyNand};

pub const PAGE: usize = 2048;
pub const BLOCK: usize = 64 * PAGE;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn open(config: DummyConfig) -> SpiNand<DummyNand> {
    open_with(config, NandConfig::default())
}

pub fn open_with(config: DummyConfig, nand_config: NandConfig) -> SpiNand<DummyNand> {
    init_logging();
    let mut nand = SpiNand::new(DummyNand::new(config), nand_config).unwrap();
    nand.controller_mut().reset_stats();
    nand
}

pub fn random_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut buf = vec![0u8; len];
    rng.fill_bytes(&mut buf);
    buf
}
