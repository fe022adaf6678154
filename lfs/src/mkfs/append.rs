//! 追加写
//!
//! 从文件当前末尾开始，按需分配直接块、一级索引块以及它指向的数据块，
//! 逐块“读-改-写”地拷贝数据，最后更新 inode 的大小。

use super::Mkfs;
use crate::layout::{BlockType, DiskInode, IndirectBlock};
use crate::{Error, Result, BSIZE, NDIRECT};

impl Mkfs {
    pub fn append(&mut self, inum: u32, data: &[u8]) -> Result<()> {
        let mut disk_inode = self.read_inode(inum)?;
        let mut offset = disk_inode.size as usize;

        // 超出文件上限时在分配任何块之前拒绝
        let end = offset + data.len();
        if end > DiskInode::max_size() {
            return Err(Error::FileTooLarge { inum, size: end });
        }

        let mut rest = data;
        while !rest.is_empty() {
            let block_index = offset / BSIZE;
            let block_id = self.data_block(inum, &mut disk_inode, block_index)?;

            let start = offset % BSIZE;
            let len = rest.len().min(BSIZE - start);
            let mut block = self.disk.read(block_id)?;
            block[start..start + len].copy_from_slice(&rest[..len]);
            self.disk.write(block_id, &block)?;

            offset += len;
            rest = &rest[len..];
        }

        disk_inode.size = offset as u32;
        self.write_inode(inum, &disk_inode)
    }

    /// 逻辑块号对应的数据块，尚未分配时就地分配
    fn data_block(
        &mut self,
        inum: u32,
        disk_inode: &mut DiskInode,
        block_index: usize,
    ) -> Result<u32> {
        if block_index < NDIRECT {
            if disk_inode.addrs[block_index] == 0 {
                disk_inode.addrs[block_index] =
                    self.allocate_block(BlockType::Data, inum, block_index as u32)?;
            }
            return Ok(disk_inode.addrs[block_index]);
        }

        if disk_inode.indirect() == 0 {
            disk_inode.addrs[NDIRECT] = self.allocate_block(BlockType::IndirectMap, inum, 0)?;
        }
        let indirect_id = disk_inode.indirect();

        // 剔去直接索引的部分
        let slot = block_index - NDIRECT;
        let mut indirect = self.disk.read(indirect_id)?;
        let block_id = indirect.map(0, |indirect: &IndirectBlock| indirect[slot]);
        if block_id != 0 {
            return Ok(block_id);
        }

        let block_id = self.allocate_block(BlockType::Data, inum, block_index as u32)?;
        indirect.map_mut(0, |indirect: &mut IndirectBlock| indirect[slot] = block_id);
        self.disk.write(indirect_id, &indirect)?;
        Ok(block_id)
    }
}
