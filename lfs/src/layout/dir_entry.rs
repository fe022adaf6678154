use core::{ptr, slice};

use crate::DIRSIZ;

/// 目录项：inode 编号与定长名字，
/// 目录的数据块就是这些目录项的字节序列
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct DirEntry {
    inum: u16,
    // 名字恰好 DIRSIZ 字节时没有结尾的 \0
    name: [u8; DIRSIZ],
}

impl DirEntry {
    /// 目录项大小恒为16字节
    pub const SIZE: usize = 16;

    /// 超长的名字在字符边界处截断
    pub fn new(name: &str, inum: u32) -> Self {
        debug_assert!(inum <= u16::MAX as u32);
        let mut len = name.len().min(DIRSIZ);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        let mut bytes = [0; DIRSIZ];
        bytes[..len].copy_from_slice(&name.as_bytes()[..len]);

        Self {
            inum: inum as u16,
            name: bytes,
        }
    }

    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&c| c == 0).unwrap_or(DIRSIZ);
        core::str::from_utf8(&self.name[..len]).unwrap_or_default()
    }

    #[inline]
    pub fn inum(&self) -> u32 {
        self.inum as u32
    }

    /// inode 0 保留，用来表示空槽位
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inum == 0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(ptr::from_ref(self).cast(), Self::SIZE) }
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(ptr::from_mut(self).cast(), Self::SIZE) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        let entry = DirEntry::new("cat", 2);
        assert_eq!(entry.name(), "cat");
        assert_eq!(entry.inum(), 2);
        assert!(!entry.is_empty());

        let long = DirEntry::new("a_rather_long_program", 3);
        assert_eq!(long.name(), "a_rather_long_");
        assert_eq!(long.name().len(), DIRSIZ);
    }

    #[test]
    fn bytes() {
        let entry = DirEntry::new("..", 1);
        let mut copy = DirEntry::default();
        assert!(copy.is_empty());
        copy.as_bytes_mut().copy_from_slice(entry.as_bytes());
        assert_eq!(copy, entry);
    }
}
