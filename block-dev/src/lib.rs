//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、光盘、U盘等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 驱动只提供一个原语：在第 M 块读写 N 字节，并报告成功或失败。

#![no_std]

extern crate alloc;

mod ram_disk;

use core::any::Any;

pub use self::ram_disk::RamDisk;

/// 块设备驱动特质
pub trait BlockDevice: Send + Sync + Any {
    /// 将第 `block_id` 块读入 `buf`，`buf` 的长度即块大小
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError>;

    /// 将 `buf` 写入第 `block_id` 块
    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError>;

    /// 设备容量，以块计
    fn num_blocks(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("block {0} is out of range")]
    OutOfRange(usize),
    #[error("I/O failure at block {0}")]
    Io(usize),
    #[error("incomplete transfer at block {0}")]
    ShortTransfer(usize),
}
