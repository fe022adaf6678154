use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

use block_dev::{BlockDevice, DeviceError};
use lfs::BSIZE;

/// 以宿主机上的普通文件作为块设备
#[derive(Debug)]
pub struct BlockFile {
    inner: Mutex<File>,
    num_blocks: usize,
}

impl BlockFile {
    pub fn new(fd: File) -> io::Result<Self> {
        let num_blocks = fd.metadata()?.len() as usize / BSIZE;
        Ok(Self {
            inner: Mutex::new(fd),
            num_blocks,
        })
    }

    fn with_block<T>(
        &self,
        block_id: usize,
        len: usize,
        f: impl FnOnce(&mut File) -> io::Result<T>,
    ) -> Result<T, DeviceError> {
        if block_id >= self.num_blocks {
            return Err(DeviceError::OutOfRange(block_id));
        }
        if len != BSIZE {
            return Err(DeviceError::ShortTransfer(block_id));
        }

        let mut file = self.inner.lock().map_err(|_| DeviceError::Io(block_id))?;
        file.seek(SeekFrom::Start((block_id * BSIZE) as u64))
            .and_then(|_| f(&mut file))
            .map_err(|e| {
                log::error!("block {block_id}: {e}");
                match e.kind() {
                    io::ErrorKind::UnexpectedEof | io::ErrorKind::WriteZero => {
                        DeviceError::ShortTransfer(block_id)
                    }
                    _ => DeviceError::Io(block_id),
                }
            })
    }
}

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        self.with_block(block_id, buf.len(), |file| file.read_exact(buf))
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        self.with_block(block_id, buf.len(), |file| file.write_all(buf))
    }

    #[inline]
    fn num_blocks(&self) -> usize {
        self.num_blocks
    }
}
