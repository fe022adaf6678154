//! 段分配器
//!
//! 块号严格递增地发放，跳过每段的第 0 块（段摘要），
//! 每次分配都立即把来历写进所在段的摘要块，镜像随时都是自描述的。

use log::trace;

use crate::disk::Disk;
use crate::layout::{BlockType, SegSumEntry, SegSummary};
use crate::{Error, Result, SEGSIZE, SEGSTART};

#[derive(Debug)]
pub(super) struct SegmentAllocator {
    /// 下一个可分配的块
    next: u32,
}

impl SegmentAllocator {
    #[inline]
    pub fn new() -> Self {
        Self {
            next: SEGSTART as u32,
        }
    }

    pub fn alloc(
        &mut self,
        disk: &Disk,
        block_type: BlockType,
        inum: u32,
        block_no: u32,
    ) -> Result<u32> {
        let mut block_id = self.next;
        // 跳过段摘要块
        if SegSummary::slot_of(block_id).is_none() {
            block_id += 1;
        }
        let slot = SegSummary::slot_of(block_id).ok_or(Error::NoSpace)?;

        let summary_block = block_id - slot as u32 - 1;
        disk.map_mut(summary_block, 0, |summary: &mut SegSummary| {
            summary.entries[slot] = SegSumEntry::new(block_type, inum, block_no);
        })?;

        trace!("balloc {block_id}: {block_type:?} inum={inum} block_no={block_no}");
        self.next = block_id + 1;
        Ok(block_id)
    }

    /// 已分配的块数，含段摘要块
    #[inline]
    pub fn blocks_allocated(&self) -> usize {
        self.next as usize - SEGSTART
    }

    /// 已经用到的段数
    #[inline]
    pub fn segments_used(&self) -> usize {
        self.blocks_allocated().div_ceil(SEGSIZE)
    }
}
