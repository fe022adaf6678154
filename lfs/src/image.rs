//! # 镜像读取层
//!
//! 通过块缓存只读地解析一个已构建的镜像：校验超级块，
//! 在两个检查点中取较新的一个，载入 imap，再读出 inode、文件与目录。
//!
//! 每次只持有一个缓冲区，拷出所需内容后立即释放。

use alloc::vec;
use alloc::vec::Vec;

use log::debug;

use crate::bio::BufCache;
use crate::layout::*;
use crate::{Error, Result, BSIZE, NDIRECT, NENTRY, NINODES};

pub struct ImageReader<'c> {
    cache: &'c BufCache,
    dev: u32,
    super_block: SuperBlock,
    slot: CheckpointSlot,
    checkpoint: Checkpoint,
    imap: Vec<u32>,
}

impl<'c> ImageReader<'c> {
    pub fn open(cache: &'c BufCache, dev: u32) -> Result<Self> {
        let super_block = cache
            .read(dev, 1)?
            .map(0, |super_block: &SuperBlock| *super_block);
        if !super_block.is_valid() {
            return Err(Error::BadMagic);
        }

        let read_checkpoint = |block_id| -> Result<Checkpoint> {
            Ok(cache
                .read(dev, block_id)?
                .map(0, |checkpoint: &Checkpoint| checkpoint.clone()))
        };
        let first = read_checkpoint(super_block.checkpoint1)?;
        let second = read_checkpoint(super_block.checkpoint2)?;
        let (slot, checkpoint) =
            Checkpoint::newest(&first, &second).ok_or(Error::NoCheckpoint)?;
        let checkpoint = checkpoint.clone();
        debug!(
            "checkpoint {slot:?} selected, timestamp {}",
            checkpoint.timestamp
        );

        let mut imap = Vec::with_capacity(NINODES);
        for &block_id in &checkpoint.imap {
            let buf = cache.read(dev, block_id)?;
            let wanted = (NINODES - imap.len()).min(NENTRY);
            buf.map(0, |block: &ImapBlock| {
                imap.extend_from_slice(&block.addrs[..wanted])
            });
        }

        Ok(Self {
            cache,
            dev,
            super_block,
            slot,
            checkpoint,
            imap,
        })
    }

    #[inline]
    pub fn super_block(&self) -> &SuperBlock {
        &self.super_block
    }

    #[inline]
    pub fn checkpoint(&self) -> (CheckpointSlot, &Checkpoint) {
        (self.slot, &self.checkpoint)
    }

    pub fn inode_block(&self, inum: u32) -> Result<u32> {
        match self.imap.get(inum as usize) {
            Some(&block_id) if block_id != 0 => Ok(block_id),
            _ => Err(Error::InvalidInode(inum)),
        }
    }

    pub fn read_inode(&self, inum: u32) -> Result<DiskInode> {
        let block_id = self.inode_block(inum)?;
        Ok(self
            .cache
            .read(self.dev, block_id)?
            .map(0, |disk_inode: &DiskInode| *disk_inode))
    }

    /// 读出整个文件，未分配的块按全零处理
    pub fn read_file(&self, inum: u32) -> Result<Vec<u8>> {
        let disk_inode = self.read_inode(inum)?;
        let size = disk_inode.size as usize;
        // 镜像可能来自外部，大小越界的 inode 视为损坏
        if size > DiskInode::max_size() {
            return Err(Error::Corrupt(inum));
        }
        let indirect = match disk_inode.indirect() {
            0 => None,
            block_id => Some(
                self.cache
                    .read(self.dev, block_id)?
                    .map(0, |indirect: &IndirectBlock| *indirect),
            ),
        };

        let mut data = vec![0; size];
        for (block_index, chunk) in data.chunks_mut(BSIZE).enumerate() {
            let block_id = if block_index < NDIRECT {
                disk_inode.addrs[block_index]
            } else {
                indirect
                    .as_ref()
                    .map_or(0, |indirect| indirect[block_index - NDIRECT])
            };
            if block_id != 0 {
                let buf = self.cache.read(self.dev, block_id)?;
                chunk.copy_from_slice(&buf[..chunk.len()]);
            }
        }

        Ok(data)
    }

    /// 目录下的全部目录项，跳过空槽位
    pub fn read_dir(&self, inum: u32) -> Result<Vec<DirEntry>> {
        if !self.read_inode(inum)?.is_dir() {
            return Err(Error::NotADirectory(inum));
        }

        let data = self.read_file(inum)?;
        Ok(data
            .chunks_exact(DirEntry::SIZE)
            .map(|bytes| {
                let mut dir_entry = DirEntry::default();
                dir_entry.as_bytes_mut().copy_from_slice(bytes);
                dir_entry
            })
            .filter(|dir_entry| !dir_entry.is_empty())
            .collect())
    }

    /// 根据文件名获取 inode 编号
    pub fn lookup(&self, dir: u32, name: &str) -> Result<Option<u32>> {
        Ok(self
            .read_dir(dir)?
            .into_iter()
            .find(|dir_entry| dir_entry.name() == name)
            .map(|dir_entry| dir_entry.inum()))
    }

    pub fn segment_summary(&self, segno: usize) -> Result<SegSummary> {
        let block_id = SegSummary::block_of(segno).ok_or(Error::InvalidSegment(segno))?;
        Ok(self
            .cache
            .read(self.dev, block_id)?
            .map(0, |summary: &SegSummary| summary.clone()))
    }
}
