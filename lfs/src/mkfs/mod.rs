//! # 镜像构建层
//!
//! 离线、单线程地构建一个初始的 lfs 镜像：
//! 先格式化并创建根目录，再逐个加入文件，最后写出 imap 与检查点。
//!
//! 调用顺序决定正确性：根目录先于其它 inode 创建，
//! 目录项只在子 inode 已存在之后追加。

mod append;
mod checkpoint;
mod imap;
mod segment;

use alloc::sync::Arc;

use block_dev::BlockDevice;
use log::{debug, info};

pub use self::checkpoint::CheckpointPolicy;
use self::imap::InodeMap;
use self::segment::SegmentAllocator;
use crate::disk::Disk;
use crate::layout::*;
use crate::{Error, Result, BSIZE, FSSIZE, NINODES, NMETA, ROOTINO};

pub struct Mkfs {
    disk: Disk,
    segments: SegmentAllocator,
    imap: InodeMap,
    /// 下一个空闲的 inode 编号
    free_inode: u32,
    policy: CheckpointPolicy,
    /// 已提交的检查点个数，也是最近一次提交的时间戳
    timestamp: u32,
}

/// 构建结束时的统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MkfsReport {
    /// 段区域中已分配的块数，含段摘要块
    pub blocks_allocated: usize,
    pub inodes_allocated: usize,
    pub segments_used: usize,
    pub timestamp: u32,
}

impl Mkfs {
    /// 清零整个镜像，写入超级块并创建根目录
    pub fn format(block_device: Arc<dyn BlockDevice>, policy: CheckpointPolicy) -> Result<Self> {
        let disk = Disk::new(block_device);
        if disk.num_blocks() < FSSIZE {
            return Err(Error::DeviceTooSmall(disk.num_blocks()));
        }
        info!(
            "nmeta {NMETA} (boot, super, checkpoint1, checkpoint2) blocks {} total {FSSIZE}",
            FSSIZE - NMETA
        );

        let zeroes = DataBlock::new();
        for block_id in 0..FSSIZE as u32 {
            disk.write(block_id, &zeroes)?;
        }
        disk.map_mut(1, 0, |super_block: &mut SuperBlock| super_block.init())?;

        let mut fs = Self {
            disk,
            segments: SegmentAllocator::new(),
            imap: InodeMap::new(),
            free_inode: 1,
            policy,
            timestamp: 0,
        };

        let root = fs.allocate_inode(InodeKind::Directory)?;
        assert_eq!(root, ROOTINO);
        fs.append(root, DirEntry::new(".", root).as_bytes())?;
        fs.append(root, DirEntry::new("..", root).as_bytes())?;

        Ok(fs)
    }

    /// 在根目录下创建文件并写入内容，返回其 inode 编号
    pub fn add_file(&mut self, name: &str, data: &[u8]) -> Result<u32> {
        if data.len() > DiskInode::max_size() {
            return Err(Error::FileTooLarge {
                inum: self.free_inode,
                size: data.len(),
            });
        }

        let inum = self.allocate_inode(InodeKind::File)?;
        self.append(ROOTINO, DirEntry::new(name, inum).as_bytes())?;
        self.append(inum, data)?;
        debug!("file {name:?}: inode {inum}, {} bytes", data.len());

        Ok(inum)
    }

    /// 把根目录大小补齐到块边界，提交检查点
    pub fn finish(mut self) -> Result<MkfsReport> {
        let mut root = self.read_inode(ROOTINO)?;
        root.size = (root.size as usize).next_multiple_of(BSIZE) as u32;
        self.write_inode(ROOTINO, &root)?;

        self.commit()?;

        let report = MkfsReport {
            blocks_allocated: self.segments.blocks_allocated(),
            inodes_allocated: self.free_inode as usize - 1,
            segments_used: self.segments.segments_used(),
            timestamp: self.timestamp,
        };
        info!(
            "balloc: first {} blocks have been allocated",
            NMETA + report.blocks_allocated
        );
        Ok(report)
    }

    /// 分配一个新块，并在段摘要中记录其来历
    #[inline]
    pub fn allocate_block(
        &mut self,
        block_type: BlockType,
        inum: u32,
        logical_block: u32,
    ) -> Result<u32> {
        self.segments
            .alloc(&self.disk, block_type, inum, logical_block)
    }

    /// 创建 inode 并返回其编号
    pub fn allocate_inode(&mut self, kind: InodeKind) -> Result<u32> {
        let inum = self.free_inode;
        if inum as usize >= NINODES {
            return Err(Error::NoInodes);
        }

        let block_id = self.allocate_block(BlockType::Inode, inum, 0)?;
        self.free_inode += 1;
        self.imap.set(inum, block_id);
        self.write_inode(inum, &DiskInode::new(kind))?;
        debug!("ialloc {inum}: {kind:?} at block {block_id}");

        Ok(inum)
    }

    pub fn read_inode(&self, inum: u32) -> Result<DiskInode> {
        let block_id = self.imap.get(inum)?;
        self.disk.map(block_id, 0, |disk_inode: &DiskInode| *disk_inode)
    }

    pub fn write_inode(&mut self, inum: u32, disk_inode: &DiskInode) -> Result<()> {
        let block_id = self.imap.get(inum)?;
        self.disk
            .map_mut(block_id, 0, |slot: &mut DiskInode| *slot = *disk_inode)
    }

    /// 当前存放 inode 的块
    #[inline]
    pub fn inode_block(&self, inum: u32) -> Result<u32> {
        self.imap.get(inum)
    }

    pub fn segment_summary(&self, segno: usize) -> Result<SegSummary> {
        let block_id = SegSummary::block_of(segno).ok_or(Error::InvalidSegment(segno))?;
        self.disk
            .map(block_id, 0, |summary: &SegSummary| summary.clone())
    }

    #[inline]
    pub fn blocks_allocated(&self) -> usize {
        self.segments.blocks_allocated()
    }

    #[inline]
    pub fn segments_used(&self) -> usize {
        self.segments.segments_used()
    }
}
