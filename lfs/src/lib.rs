#![no_std]

extern crate alloc;

/* lfs 的整体架构，自上而下 */

// 镜像读取层：通过块缓存解析已构建的镜像
mod image;

// 镜像构建层：段分配、inode 映射、追加写与检查点
mod mkfs;

// 磁盘数据结构层：表示磁盘文件系统的数据结构
pub mod layout;

// 块缓存层：内核中所有磁盘访问的唯一通道
pub mod bio;

// 整块读写磁盘的辅助层
mod disk;

mod error;

pub use self::{
    bio::{Buf, BufCache, BufRef},
    error::{Error, Result},
    image::ImageReader,
    layout::DataBlock,
    mkfs::{CheckpointPolicy, Mkfs, MkfsReport},
};

/// 块大小
pub const BSIZE: usize = 1024;
pub const FSMAGIC: u32 = 0x10203040;
/// 根目录的 inode 编号
pub const ROOTINO: u32 = 1;

/// 段大小，以块计
pub const SEGSIZE: usize = 10;
/// 镜像大小，以块计
pub const FSSIZE: usize = 5000;
/// inode 编号取值为 0..NINODES
pub const NINODES: usize = 200;
/// 引导块、超级块、两个检查点
pub const NMETA: usize = 4;
/// 段区域起始块
pub const SEGSTART: usize = NMETA;
/// 段的个数
pub const NSEG: usize = (FSSIZE - NMETA) / SEGSIZE;

/// 每个 imap 块的表项数
pub const NENTRY: usize = BSIZE / 4;
/// imap 占用的块数
pub const NINODEMAP: usize = (NINODES * 4).div_ceil(BSIZE);
/// 段使用位图的字节数，总是 4 的倍数
pub const SEGTABLESIZE: usize = NSEG.div_ceil(32) * 4;

pub const NDIRECT: usize = 12;
pub const NINDIRECT: usize = BSIZE / 4;
/// 单个文件的最大块数
pub const MAXFILE: usize = NDIRECT + NINDIRECT;

/// 目录项名字的宽度
pub const DIRSIZ: usize = 14;

/// 块缓存默认容量
pub const NBUF: usize = 8;
