//! Common utilities for tests

#![allow(dead_code)]

use std::sync::Arc;

use block_dev::RamDisk;
use lfs::{CheckpointPolicy, Mkfs, BSIZE, FSSIZE};

pub fn ram_disk() -> Arc<RamDisk> {
    Arc::new(RamDisk::new(BSIZE, FSSIZE))
}

pub fn format(policy: CheckpointPolicy) -> (Arc<RamDisk>, Mkfs) {
    let disk = ram_disk();
    let fs = Mkfs::format(disk.clone(), policy).unwrap();
    (disk, fs)
}

/// 可复现的伪随机内容
pub fn pattern(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}
