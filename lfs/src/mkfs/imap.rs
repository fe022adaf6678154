//! 内存中的 inode 映射：inode 编号 -> 当前存放该 inode 的块号。
//! 提交时整体写成连续若干个 imap 块。

use log::debug;

use super::segment::SegmentAllocator;
use crate::disk::Disk;
use crate::layout::{BlockType, ImapBlock};
use crate::{Error, Result, NENTRY, NINODEMAP, NINODES};

#[derive(Debug)]
pub(super) struct InodeMap {
    addrs: [u32; NINODES],
    /// 最近一次写出的各 imap 块所在块号
    blocks: [u32; NINODEMAP],
}

impl InodeMap {
    #[inline]
    pub fn new() -> Self {
        Self {
            addrs: [0; NINODES],
            blocks: [0; NINODEMAP],
        }
    }

    /// 未映射的 inode 视为非法
    pub fn get(&self, inum: u32) -> Result<u32> {
        match self.addrs.get(inum as usize) {
            Some(&block_id) if block_id != 0 => Ok(block_id),
            _ => Err(Error::InvalidInode(inum)),
        }
    }

    #[inline]
    pub fn set(&mut self, inum: u32, block_id: u32) {
        self.addrs[inum as usize] = block_id;
    }

    #[inline]
    pub fn blocks(&self) -> &[u32; NINODEMAP] {
        &self.blocks
    }

    /// 为每个 imap 块分配新块并写出
    pub fn flush(&mut self, disk: &Disk, segments: &mut SegmentAllocator) -> Result<()> {
        for (index, chunk) in self.addrs.chunks(NENTRY).enumerate() {
            let block_id = segments.alloc(disk, BlockType::Imap, 0, index as u32)?;
            disk.map_mut(block_id, 0, |imap: &mut ImapBlock| {
                imap.addrs.fill(0);
                imap.addrs[..chunk.len()].copy_from_slice(chunk);
            })?;
            self.blocks[index] = block_id;
        }
        debug!("imap written to {:?}", self.blocks);
        Ok(())
    }
}
