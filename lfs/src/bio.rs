//! # 块缓存层
//!
//! 运行中的系统对磁盘块的一切访问都经过块缓存：
//! 缓存把磁盘块复制到内存中的缓冲区，减少磁盘读写，
//! 同时也是多个调用者共享同一磁盘块时的同步点。
//!
//! - 缓冲池容量固定，由全局锁保护元数据与最近使用顺序；
//! - 每个缓冲区自带一把锁，同一时刻只有一个调用者能读写其数据；
//! - 引用计数归零的缓冲区才能被回收，回收时选最久未用的一个；
//! - 缓冲区用尽时直接返回 [`Error::NoBuffers`]，不会阻塞等待。
//!
//! 用法：
//! 1. [`BufCache::read`] 得到上锁且有效的 [`Buf`]；
//! 2. 修改数据后调用 [`Buf::write`] 写回磁盘；
//! 3. 用完后 [`Buf::release`] 或直接丢弃。

use alloc::collections::{BTreeMap, VecDeque};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};

use block_dev::BlockDevice;
use log::trace;
use spin::{Mutex, MutexGuard};

use crate::layout::DataBlock;
use crate::{Error, Result};

/// 缓冲区对应的磁盘块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockId {
    pub dev: u32,
    pub blockno: u32,
}

pub struct BufCache {
    /// 设备号到块设备驱动的映射，共享之前挂好
    devices: BTreeMap<u32, Arc<dyn BlockDevice>>,
    /// 全局锁，只保护元数据与最近使用顺序，从不跨越磁盘读写
    lru: Mutex<Lru>,
    bufs: Vec<Mutex<BufInner>>,
}

/// 缓冲池的元数据
struct Lru {
    slots: Vec<Slot>,
    /// 缓冲区下标，队首最近使用，队尾最久未用
    order: VecDeque<usize>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    id: Option<BlockId>,
    refcnt: usize,
    /// 每次换上新身份时递增
    generation: u64,
}

/// 缓冲区的一次身份：对应的块与换上该身份时的代数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    id: BlockId,
    generation: u64,
}

struct BufInner {
    /// 数据读入或写出时缓冲区的身份，与当前身份不符时数据无效
    filled: Option<Stamp>,
    data: DataBlock,
}

/// 持有引用但未上锁的缓冲区
pub struct BufRef<'a> {
    cache: &'a BufCache,
    index: usize,
    stamp: Stamp,
}

/// 持有引用且已上锁的缓冲区
pub struct Buf<'a> {
    cache: &'a BufCache,
    index: usize,
    stamp: Stamp,
    inner: MutexGuard<'a, BufInner>,
}

impl BufCache {
    pub fn new(nbuf: usize) -> Self {
        assert!(nbuf > 0, "empty buffer cache");
        Self {
            devices: BTreeMap::new(),
            lru: Mutex::new(Lru {
                slots: vec![Slot::default(); nbuf],
                order: (0..nbuf).collect(),
            }),
            bufs: (0..nbuf).map(|_| Mutex::new(BufInner::new())).collect(),
        }
    }

    /// 挂载块设备，重复挂载会替换原设备
    pub fn attach(&mut self, dev: u32, block_device: Arc<dyn BlockDevice>) {
        self.devices.insert(dev, block_device);
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.bufs.len()
    }

    /// 块当前的引用计数，未缓存时为 0
    pub fn refcnt(&self, dev: u32, blockno: u32) -> usize {
        let id = BlockId { dev, blockno };
        let lru = self.lru.lock();
        lru.slots
            .iter()
            .find(|slot| slot.id == Some(id))
            .map_or(0, |slot| slot.refcnt)
    }

    /// 查找已缓存的块，找不到就回收最久未用的空闲缓冲区；
    /// 返回的缓冲区持有一个引用但不上锁
    pub fn get(&self, dev: u32, blockno: u32) -> Result<BufRef<'_>> {
        if !self.devices.contains_key(&dev) {
            return Err(Error::NoDevice(dev));
        }

        let id = BlockId { dev, blockno };
        let mut lru = self.lru.lock();
        let index = match lru.lookup(id) {
            Some(index) => {
                trace!("bio hit {dev}:{blockno} in buffer {index}");
                index
            }
            None => {
                let index = lru.recycle(id).ok_or(Error::NoBuffers)?;
                trace!("bio miss {dev}:{blockno}, recycled buffer {index}");
                index
            }
        };

        let stamp = Stamp {
            id,
            generation: lru.slots[index].generation,
        };
        Ok(BufRef {
            cache: self,
            index,
            stamp,
        })
    }

    /// 返回上锁的缓冲区，其数据不一定有效
    #[inline]
    pub fn acquire(&self, dev: u32, blockno: u32) -> Result<Buf<'_>> {
        // 全局锁在 get 返回时已释放，再去等缓冲区的锁
        Ok(self.get(dev, blockno)?.lock())
    }

    /// 返回上锁且数据有效的缓冲区；读盘失败时缓冲区随即释放
    pub fn read(&self, dev: u32, blockno: u32) -> Result<Buf<'_>> {
        let mut buf = self.acquire(dev, blockno)?;
        if !buf.is_valid() {
            let block_device = self.device(dev)?;
            block_device.read_block(blockno as usize, buf.inner.data.as_mut_slice())?;
            buf.inner.filled = Some(buf.stamp);
        }
        Ok(buf)
    }

    #[inline]
    fn device(&self, dev: u32) -> Result<&Arc<dyn BlockDevice>> {
        self.devices.get(&dev).ok_or(Error::NoDevice(dev))
    }

    #[inline]
    fn unpin(&self, index: usize) {
        self.lru.lock().unpin(index);
    }
}

impl Lru {
    fn lookup(&mut self, id: BlockId) -> Option<usize> {
        let index = self
            .order
            .iter()
            .copied()
            .find(|&index| self.slots[index].id == Some(id))?;
        self.slots[index].refcnt += 1;
        Some(index)
    }

    /// 从最久未用的一端找第一个引用计数为 0 的缓冲区，换上新身份。
    /// 代数随之递增，缓冲区里原有的数据不再有效。
    fn recycle(&mut self, id: BlockId) -> Option<usize> {
        let index = self
            .order
            .iter()
            .rev()
            .copied()
            .find(|&index| self.slots[index].refcnt == 0)?;
        let slot = &mut self.slots[index];
        *slot = Slot {
            id: Some(id),
            refcnt: 1,
            generation: slot.generation.wrapping_add(1),
        };
        Some(index)
    }

    /// 引用计数归零时移到最近使用的一端
    fn unpin(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        assert!(slot.refcnt > 0, "release of an unreferenced buffer");
        slot.refcnt -= 1;
        if slot.refcnt == 0 {
            if let Some(position) = self.order.iter().position(|&i| i == index) {
                self.order.remove(position);
            }
            self.order.push_front(index);
        }
    }
}

impl BufInner {
    #[inline]
    fn new() -> Self {
        Self {
            filled: None,
            data: DataBlock::new(),
        }
    }
}

impl<'a> BufRef<'a> {
    #[inline]
    pub fn id(&self) -> BlockId {
        self.stamp.id
    }

    /// 缓冲区在池中的下标
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// 等待并取得缓冲区的锁，引用随之转交给 [`Buf`]
    pub fn lock(self) -> Buf<'a> {
        let this = ManuallyDrop::new(self);
        let inner = this.cache.bufs[this.index].lock();
        Buf {
            cache: this.cache,
            index: this.index,
            stamp: this.stamp,
            inner,
        }
    }
}

impl Drop for BufRef<'_> {
    fn drop(&mut self) {
        self.cache.unpin(self.index);
    }
}

impl Buf<'_> {
    #[inline]
    pub fn id(&self) -> BlockId {
        self.stamp.id
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn blockno(&self) -> u32 {
        self.stamp.id.blockno
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.inner.filled == Some(self.stamp)
    }

    /// 把缓冲区写回磁盘。持有 `Buf` 即持有缓冲区的锁。
    pub fn write(&mut self) -> Result<()> {
        let BlockId { dev, blockno } = self.stamp.id;
        let block_device = self.cache.device(dev)?;
        block_device.write_block(blockno as usize, self.inner.data.as_slice())?;
        self.inner.filled = Some(self.stamp);
        Ok(())
    }

    /// 释放引用与锁
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl Deref for Buf<'_> {
    type Target = DataBlock;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.inner.data
    }
}

impl DerefMut for Buf<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner.data
    }
}

impl Drop for Buf<'_> {
    // 先在全局锁下归还引用，缓冲区的锁随后随 inner 一起释放
    fn drop(&mut self) {
        self.cache.unpin(self.index);
    }
}
