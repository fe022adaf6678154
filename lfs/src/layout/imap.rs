use crate::NENTRY;

/// 存放在一个磁盘块中的一段 imap，
/// 完整的 imap 可能跨越多个块
#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct ImapBlock {
    pub addrs: [u32; NENTRY],
}
