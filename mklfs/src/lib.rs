//! 在宿主机上构建与检查 lfs 镜像


mod block_file;
mod error;

use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lfs::layout::{CheckpointSlot, SuperBlock};
use lfs::{BufCache, CheckpointPolicy, ImageReader, Mkfs, MkfsReport};
use lfs::{BSIZE, DIRSIZ, FSSIZE, NBUF, ROOTINO};

pub use self::block_file::BlockFile;
pub use self::error::{Error, Result};

/// 镜像挂在块缓存上的设备号
pub const ROOTDEV: u32 = 1;

/// 创建镜像文件，把 `files` 逐个放进根目录
pub fn build(image: &Path, files: &[PathBuf], policy: CheckpointPolicy) -> Result<MkfsReport> {
    // 先确定全部名字，避免写了一半才发现输入有误
    let names = files
        .iter()
        .map(|path| image_name(path))
        .collect::<Result<Vec<_>>>()?;

    let fd = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(image)?;
    fd.set_len((FSSIZE * BSIZE) as u64)?;

    let mut mkfs = Mkfs::format(Arc::new(BlockFile::new(fd)?), policy)?;
    for (path, name) in files.iter().zip(&names) {
        let data = fs::read(path)?;
        mkfs.add_file(name, &data)?;
    }

    Ok(mkfs.finish()?)
}

/// 输入文件在镜像中的名字：去掉目录部分与开头的 `_`，
/// 超过 [`DIRSIZ`] 字节时截断
pub fn image_name(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.strip_prefix('_').unwrap_or(name))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::BadInputName(path.to_owned()))?;

    if name.len() <= DIRSIZ {
        return Ok(name.to_owned());
    }
    let mut len = DIRSIZ;
    while !name.is_char_boundary(len) {
        len -= 1;
    }
    log::warn!("name {name:?} truncated to {:?}", &name[..len]);
    Ok(name[..len].to_owned())
}

/// 已构建镜像的概况
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub super_block: SuperBlock,
    pub slot: CheckpointSlot,
    pub timestamp: u32,
    pub segments_in_use: usize,
    /// 根目录下的目录项：名字、inode 编号与文件大小
    pub entries: Vec<(String, u32, u32)>,
}

pub fn inspect(image: &Path) -> Result<Inspection> {
    let fd = OpenOptions::new().read(true).write(true).open(image)?;
    let mut cache = BufCache::new(NBUF);
    cache.attach(ROOTDEV, Arc::new(BlockFile::new(fd)?));

    let reader = ImageReader::open(&cache, ROOTDEV)?;
    let (slot, checkpoint) = reader.checkpoint();
    let entries = reader
        .read_dir(ROOTINO)?
        .into_iter()
        .map(|dir_entry| {
            let inum = dir_entry.inum();
            let size = reader.read_inode(inum)?.size;
            Ok((dir_entry.name().to_owned(), inum, size))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Inspection {
        super_block: *reader.super_block(),
        slot,
        timestamp: checkpoint.timestamp,
        segments_in_use: checkpoint.segments_in_use(),
        entries,
    })
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sb = &self.super_block;
        writeln!(
            f,
            "superblock: size {} nblocks {} nsegments {} ninodes {} segstart {}",
            sb.size, sb.nblocks, sb.nsegments, sb.ninodes, sb.segstart
        )?;
        writeln!(
            f,
            "checkpoint: {:?} timestamp {} segments {}",
            self.slot, self.timestamp, self.segments_in_use
        )?;
        for (name, inum, size) in &self.entries {
            writeln!(f, "{inum:>4} {name:<width$} {size:>8}", width = DIRSIZ)?;
        }
        Ok(())
    }
}
