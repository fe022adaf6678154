//! # 磁盘数据结构层
//!
//! lfs 的磁盘布局：
//! 引导块 | 超级块 | 检查点1 | 检查点2 | 段区域
//!
//! 段区域由定长的段组成，每段的第 0 块是段摘要，其余块依次存放
//! inode、数据块、一级索引块与 imap 块。
//!
//! 所有结构体都是 `#[repr(C)]` 的定长无符号整数，按本机字节序存储，
//! 通过 [`DataBlock`] 在块内按偏移直接映射。

mod super_block;
pub use super_block::SuperBlock;

mod checkpoint;
pub use checkpoint::{Checkpoint, CheckpointSlot};

mod segment;
pub use segment::{BlockType, SegSumEntry, SegSummary};

mod imap;
pub use imap::ImapBlock;

mod inode;
pub use inode::{DiskInode, IndirectBlock, InodeKind};

/// 文件项，也属于磁盘文件系统数据结构
mod dir_entry;
pub use dir_entry::DirEntry;

use core::fmt;
use core::mem;
use core::ops::{Deref, DerefMut};

use crate::BSIZE;

/// 可以直接映射到块内字节上的磁盘结构
///
/// # Safety
///
/// 实现者必须是 `#[repr(C)]`、不含填充字节，且任意位模式都是合法值。
pub unsafe trait OnDisk: Sized {}

unsafe impl OnDisk for SuperBlock {}
unsafe impl OnDisk for Checkpoint {}
unsafe impl OnDisk for SegSummary {}
unsafe impl OnDisk for ImapBlock {}
unsafe impl OnDisk for DiskInode {}
unsafe impl OnDisk for DirEntry {}
unsafe impl<const N: usize> OnDisk for [u32; N] {}
unsafe impl<const N: usize> OnDisk for [u8; N] {}

/// 一个磁盘块的内容，按 8 字节对齐以便映射磁盘结构
#[derive(Clone, PartialEq, Eq)]
#[repr(C, align(8))]
pub struct DataBlock([u8; BSIZE]);

impl DataBlock {
    #[inline]
    pub const fn new() -> Self {
        Self([0; BSIZE])
    }

    pub fn get<T: OnDisk>(&self, offset: usize) -> &T {
        Self::check::<T>(offset);
        // SAFETY: 范围与对齐已检查，T 的任意位模式都合法
        unsafe { &*self.0.as_ptr().add(offset).cast() }
    }

    pub fn get_mut<T: OnDisk>(&mut self, offset: usize) -> &mut T {
        Self::check::<T>(offset);
        // SAFETY: 同上，且 &mut self 保证独占
        unsafe { &mut *self.0.as_mut_ptr().add(offset).cast() }
    }

    #[inline]
    pub fn map<T: OnDisk, V>(&self, offset: usize, f: impl FnOnce(&T) -> V) -> V {
        f(self.get(offset))
    }

    #[inline]
    pub fn map_mut<T: OnDisk, V>(&mut self, offset: usize, f: impl FnOnce(&mut T) -> V) -> V {
        f(self.get_mut(offset))
    }

    fn check<T>(offset: usize) {
        assert!(offset + mem::size_of::<T>() <= BSIZE);
        assert_eq!(offset % mem::align_of::<T>(), 0);
        const { assert!(mem::align_of::<T>() <= mem::align_of::<DataBlock>()) };
    }
}

impl Default for DataBlock {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for DataBlock {
    type Target = [u8; BSIZE];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DataBlock {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl fmt::Debug for DataBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used = self.0.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        f.debug_struct("DataBlock").field("used", &used).finish()
    }
}
