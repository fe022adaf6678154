//! 磁盘上的 inode
//!
//! 直接索引 `NDIRECT` 个数据块，再加一个一级索引块，
//! 一级索引块整块连续存储 `NINDIRECT` 个块编号。
//! 块编号为 0 表示尚未分配。

use crate::{BSIZE, MAXFILE, NDIRECT, NINDIRECT};

/// 一级索引块
pub type IndirectBlock = [u32; NINDIRECT];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct DiskInode {
    typ: u16,
    /// 主设备号，仅设备文件使用
    pub major: u16,
    /// 次设备号，仅设备文件使用
    pub minor: u16,
    /// 硬链接个数
    pub nlink: u16,
    /// 文件字节数
    pub size: u32,
    /// 前 NDIRECT 项为直接索引，最后一项指向一级索引块
    pub addrs: [u32; NDIRECT + 1],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum InodeKind {
    Free = 0,
    Directory = 1,
    File = 2,
    Device = 3,
}

impl DiskInode {
    #[inline]
    pub fn new(kind: InodeKind) -> Self {
        Self {
            typ: kind as u16,
            nlink: 1,
            ..Default::default()
        }
    }

    #[inline]
    pub fn kind(&self) -> Option<InodeKind> {
        match self.typ {
            0 => Some(InodeKind::Free),
            1 => Some(InodeKind::Directory),
            2 => Some(InodeKind::File),
            3 => Some(InodeKind::Device),
            _ => None,
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind() == Some(InodeKind::Directory)
    }

    #[inline]
    pub fn indirect(&self) -> u32 {
        self.addrs[NDIRECT]
    }

    /// 容纳 `size` 字节所需的数据块数，不含索引块
    #[inline]
    pub fn count_data_block(size: u32) -> usize {
        (size as usize).div_ceil(BSIZE)
    }

    /// 单个文件的最大字节数
    #[inline]
    pub const fn max_size() -> usize {
        MAXFILE * BSIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_inode() {
        let inode = DiskInode::new(InodeKind::File);
        assert_eq!(inode.kind(), Some(InodeKind::File));
        assert_eq!(inode.nlink, 1);
        assert_eq!(inode.size, 0);
        assert!(inode.addrs.iter().all(|&addr| addr == 0));
        assert!(!inode.is_dir());
    }

    #[test]
    fn block_count() {
        assert_eq!(DiskInode::count_data_block(0), 0);
        assert_eq!(DiskInode::count_data_block(1), 1);
        assert_eq!(DiskInode::count_data_block(BSIZE as u32), 1);
        assert_eq!(DiskInode::count_data_block(3000), 3);
    }
}
