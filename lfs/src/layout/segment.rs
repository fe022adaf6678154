//! 段摘要
//!
//! 每段的第 0 块记录段内其余各块的来历：块类型、所属 inode 与逻辑块号。
//! 摘要槽位下标 = 块在段内的偏移 - 1。

use crate::{NSEG, SEGSIZE, SEGSTART};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum BlockType {
    Empty = 0,
    Inode = 1,
    Data = 2,
    /// 一级索引块
    IndirectMap = 3,
    Imap = 4,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct SegSumEntry {
    block_type: u32,
    /// 所属 inode；imap 块为 0
    pub inum: u32,
    /// 文件内的逻辑块号；imap 块为其在 imap 中的序号
    pub block_no: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[repr(C)]
pub struct SegSummary {
    pub entries: [SegSumEntry; SEGSIZE - 1],
}

impl TryFrom<u32> for BlockType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Empty,
            1 => Self::Inode,
            2 => Self::Data,
            3 => Self::IndirectMap,
            4 => Self::Imap,
            _ => return Err(value),
        })
    }
}

impl SegSumEntry {
    #[inline]
    pub fn new(block_type: BlockType, inum: u32, block_no: u32) -> Self {
        Self {
            block_type: block_type as u32,
            inum,
            block_no,
        }
    }

    /// 损坏的类型字段返回 `None`
    #[inline]
    pub fn block_type(&self) -> Option<BlockType> {
        BlockType::try_from(self.block_type).ok()
    }
}

impl SegSummary {
    /// 块号所在的段号；段区域之外的块返回 `None`
    #[inline]
    pub fn segment_of(block_id: u32) -> Option<usize> {
        let segno = (block_id as usize).checked_sub(SEGSTART)? / SEGSIZE;
        (segno < NSEG).then_some(segno)
    }

    /// 段摘要所在块
    #[inline]
    pub fn block_of(segno: usize) -> Option<u32> {
        (segno < NSEG).then(|| (SEGSTART + segno * SEGSIZE) as u32)
    }

    /// 块在摘要中的槽位；段摘要块本身与段区域之外的块没有槽位
    #[inline]
    pub fn slot_of(block_id: u32) -> Option<usize> {
        Self::segment_of(block_id)?;
        ((block_id as usize - SEGSTART) % SEGSIZE).checked_sub(1)
    }
}
