//! 离线构建时对镜像的整块读写，不经过块缓存。

use alloc::sync::Arc;

use block_dev::BlockDevice;

use crate::layout::{DataBlock, OnDisk};
use crate::Result;

#[derive(Clone)]
pub(crate) struct Disk(Arc<dyn BlockDevice>);

impl Disk {
    #[inline]
    pub fn new(device: Arc<dyn BlockDevice>) -> Self {
        Self(device)
    }

    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.0.num_blocks()
    }

    pub fn read(&self, block_id: u32) -> Result<DataBlock> {
        let mut block = DataBlock::new();
        self.0.read_block(block_id as usize, block.as_mut_slice())?;
        Ok(block)
    }

    pub fn write(&self, block_id: u32, block: &DataBlock) -> Result<()> {
        self.0.write_block(block_id as usize, block.as_slice())?;
        Ok(())
    }

    #[inline]
    pub fn map<T: OnDisk, V>(
        &self,
        block_id: u32,
        offset: usize,
        f: impl FnOnce(&T) -> V,
    ) -> Result<V> {
        Ok(self.read(block_id)?.map(offset, f))
    }

    /// 读出整块，只改动 `offset` 处的结构，再整块写回
    pub fn map_mut<T: OnDisk, V>(
        &self,
        block_id: u32,
        offset: usize,
        f: impl FnOnce(&mut T) -> V,
    ) -> Result<V> {
        let mut block = self.read(block_id)?;
        let v = block.map_mut(offset, f);
        self.write(block_id, &block)?;
        Ok(v)
    }
}
