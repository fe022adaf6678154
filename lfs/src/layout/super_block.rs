use crate::{FSMAGIC, FSSIZE, NINODES, NMETA, NSEG, SEGSTART};

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 记录镜像规模并定位两个检查点与段区域
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    magic: u32,
    /// 镜像占据块数
    pub size: u32,
    /// 段区域块数
    pub nblocks: u32,
    pub nsegments: u32,
    pub ninodes: u32,
    /// 第一个检查点所在块
    pub checkpoint1: u32,
    /// 第二个检查点所在块
    pub checkpoint2: u32,
    /// 段区域起始块
    pub segstart: u32,
}

impl SuperBlock {
    #[inline]
    pub fn init(&mut self) {
        *self = Self {
            magic: FSMAGIC,
            size: FSSIZE as u32,
            nblocks: (FSSIZE - NMETA) as u32,
            nsegments: NSEG as u32,
            ninodes: NINODES as u32,
            checkpoint1: 2,
            checkpoint2: 3,
            segstart: SEGSTART as u32,
        };
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == FSMAGIC
    }
}
