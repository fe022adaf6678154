use alloc::vec;
use alloc::vec::Vec;

use spin::Mutex;

use crate::{BlockDevice, DeviceError};

/// 内存中的块设备，块大小在创建时确定
#[derive(Debug)]
pub struct RamDisk {
    block_size: usize,
    data: Mutex<Vec<u8>>,
}

impl RamDisk {
    pub fn new(block_size: usize, blocks: usize) -> Self {
        Self {
            block_size,
            data: Mutex::new(vec![0; block_size * blocks]),
        }
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// 整个磁盘内容的拷贝
    pub fn snapshot(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    fn range(&self, block_id: usize, len: usize) -> Result<core::ops::Range<usize>, DeviceError> {
        if len != self.block_size {
            return Err(DeviceError::ShortTransfer(block_id));
        }
        if block_id >= self.num_blocks() {
            return Err(DeviceError::OutOfRange(block_id));
        }
        let start = block_id * self.block_size;
        Ok(start..start + self.block_size)
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        let range = self.range(block_id, buf.len())?;
        buf.copy_from_slice(&self.data.lock()[range]);
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        let range = self.range(block_id, buf.len())?;
        self.data.lock()[range].copy_from_slice(buf);
        Ok(())
    }

    fn num_blocks(&self) -> usize {
        self.data.lock().len() / self.block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_back() {
        let disk = RamDisk::new(16, 4);
        disk.write_block(2, &[7; 16]).unwrap();

        let mut buf = [0; 16];
        disk.read_block(2, &mut buf).unwrap();
        assert_eq!(buf, [7; 16]);
        disk.read_block(1, &mut buf).unwrap();
        assert_eq!(buf, [0; 16]);
    }

    #[test]
    fn rejects_bad_requests() {
        let disk = RamDisk::new(16, 4);
        let mut buf = [0; 16];
        assert_eq!(disk.read_block(4, &mut buf), Err(DeviceError::OutOfRange(4)));
        assert_eq!(
            disk.write_block(0, &[0; 8]),
            Err(DeviceError::ShortTransfer(0))
        );
    }
}
