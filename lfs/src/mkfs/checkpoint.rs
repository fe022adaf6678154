//! 检查点写出
//!
//! 第一个槽位记录 imap 块地址、段使用位图与时间戳；
//! 第二个槽位的用途由 [`CheckpointPolicy`] 决定。

use log::debug;

use super::Mkfs;
use crate::layout::{Checkpoint, CheckpointSlot};
use crate::Result;

/// 第二个检查点槽位的使用方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckpointPolicy {
    /// 每次提交都写第一个槽位，第二个槽位保持全零的占位
    #[default]
    Reserved,
    /// 两个槽位轮流提交，未被写到的槽位保留上一次的内容
    Alternating,
}

impl Mkfs {
    /// 写出指定槽位的检查点。
    ///
    /// `Reserved` 下第二个槽位总是写成全零的占位。
    pub fn write_checkpoint(&mut self, slot: CheckpointSlot) -> Result<()> {
        let checkpoint = match (self.policy, slot) {
            (CheckpointPolicy::Reserved, CheckpointSlot::Second) => Checkpoint::empty(),
            _ => self.live_checkpoint(),
        };
        self.disk
            .map_mut(slot.block_id(), 0, |on_disk: &mut Checkpoint| {
                *on_disk = checkpoint
            })
    }

    /// 写出 imap，再按策略提交一个时间戳更新的检查点，返回写入的槽位
    pub fn commit(&mut self) -> Result<CheckpointSlot> {
        self.imap.flush(&self.disk, &mut self.segments)?;
        self.timestamp += 1;

        let slot = match self.policy {
            CheckpointPolicy::Reserved => {
                self.write_checkpoint(CheckpointSlot::First)?;
                self.write_checkpoint(CheckpointSlot::Second)?;
                CheckpointSlot::First
            }
            CheckpointPolicy::Alternating => {
                let slot = if self.timestamp % 2 == 1 {
                    CheckpointSlot::First
                } else {
                    CheckpointSlot::Second
                };
                self.write_checkpoint(slot)?;
                slot
            }
        };
        debug!(
            "checkpoint {} committed to {slot:?}, {} segments in use",
            self.timestamp,
            self.segments.segments_used()
        );

        Ok(slot)
    }

    fn live_checkpoint(&self) -> Checkpoint {
        let mut checkpoint = Checkpoint {
            imap: *self.imap.blocks(),
            timestamp: self.timestamp,
            ..Checkpoint::empty()
        };
        checkpoint.mark_segments(self.segments.segments_used());
        checkpoint
    }
}
