//! 检查点：imap 块地址、段使用位图与时间戳。
//!
//! 磁盘上固定有两个槽位，恢复时取时间戳较新的一个；
//! 时间戳为 0 的槽位是尚未提交过的占位。

use crate::{NINODEMAP, NSEG, SEGTABLESIZE};

#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct Checkpoint {
    /// 各 imap 块所在块号
    pub imap: [u32; NINODEMAP],
    /// 段使用位图：第 i 字节的第 j 位表示段 8i+j
    pub segtable: [u8; SEGTABLESIZE],
    pub timestamp: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointSlot {
    First,
    Second,
}

impl Checkpoint {
    #[inline]
    pub const fn empty() -> Self {
        Self {
            imap: [0; NINODEMAP],
            segtable: [0; SEGTABLESIZE],
            timestamp: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timestamp == 0
    }

    /// 标记前 `used` 个段为已使用
    pub fn mark_segments(&mut self, used: usize) {
        assert!(used <= NSEG);
        for segno in 0..used {
            self.segtable[segno / 8] |= 1 << (segno % 8);
        }
    }

    #[inline]
    pub fn segment_in_use(&self, segno: usize) -> bool {
        segno < NSEG && self.segtable[segno / 8] & (1 << (segno % 8)) != 0
    }

    pub fn segments_in_use(&self) -> usize {
        self.segtable.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// 在两个槽位中选出时间戳较新的有效检查点，相同时取第一个
    pub fn newest<'a>(first: &'a Self, second: &'a Self) -> Option<(CheckpointSlot, &'a Self)> {
        match (first.is_empty(), second.is_empty()) {
            (true, true) => None,
            (false, true) => Some((CheckpointSlot::First, first)),
            (true, false) => Some((CheckpointSlot::Second, second)),
            (false, false) if second.timestamp > first.timestamp => {
                Some((CheckpointSlot::Second, second))
            }
            (false, false) => Some((CheckpointSlot::First, first)),
        }
    }
}

impl Default for Checkpoint {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl CheckpointSlot {
    /// 槽位所在块
    #[inline]
    pub fn block_id(self) -> u32 {
        match self {
            Self::First => 2,
            Self::Second => 3,
        }
    }

    #[inline]
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}
