use block_dev::DeviceError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
    #[error("all buffers are in use")]
    NoBuffers,
    #[error("device {0} is not attached")]
    NoDevice(u32),
    #[error("out of disk blocks")]
    NoSpace,
    #[error("out of inodes")]
    NoInodes,
    #[error("device has {0} blocks, image needs {needed}", needed = crate::FSSIZE)]
    DeviceTooSmall(usize),
    #[error("invalid inode {0}")]
    InvalidInode(u32),
    #[error("segment {0} is outside the segment region")]
    InvalidSegment(usize),
    #[error("inode {0} is corrupt")]
    Corrupt(u32),
    #[error("inode {inum} would grow to {size} bytes, beyond the maximum file size")]
    FileTooLarge { inum: u32, size: usize },
    #[error("not an lfs image")]
    BadMagic,
    #[error("no valid checkpoint")]
    NoCheckpoint,
    #[error("inode {0} is not a directory")]
    NotADirectory(u32),
}

pub type Result<T> = core::result::Result<T, Error>;
