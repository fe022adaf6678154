use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use block_dev::{BlockDevice, DeviceError, RamDisk};
use lfs::{BufCache, Error, BSIZE};

const DEV: u32 = 1;

fn cache_with(nbuf: usize, device: Arc<dyn BlockDevice>) -> BufCache {
    let mut cache = BufCache::new(nbuf);
    cache.attach(DEV, device);
    cache
}

fn cache(nbuf: usize) -> BufCache {
    cache_with(nbuf, Arc::new(RamDisk::new(BSIZE, 128)))
}

/// 可以让读写失败的块设备
struct FlakyDisk {
    inner: RamDisk,
    broken: AtomicBool,
}

impl BlockDevice for FlakyDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(DeviceError::Io(block_id));
        }
        self.inner.read_block(block_id, buf)
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(DeviceError::Io(block_id));
        }
        self.inner.write_block(block_id, buf)
    }

    fn num_blocks(&self) -> usize {
        self.inner.num_blocks()
    }
}

#[test]
fn same_block_same_buffer() {
    let cache = cache(4);

    let first = cache.get(DEV, 7).unwrap();
    let second = cache.get(DEV, 7).unwrap();
    assert_eq!(first.index(), second.index());
    assert_eq!(cache.refcnt(DEV, 7), 2);

    // 占满其余缓冲区
    let others: Vec<_> = (100..103).map(|b| cache.acquire(DEV, b).unwrap()).collect();
    drop(first);
    assert_eq!(cache.refcnt(DEV, 7), 1);
    assert!(matches!(cache.get(DEV, 50), Err(Error::NoBuffers)));

    drop(second);
    assert_eq!(cache.refcnt(DEV, 7), 0);
    let evicting = cache.get(DEV, 50).unwrap();
    assert_eq!(cache.refcnt(DEV, 7), 0);
    assert_eq!(cache.refcnt(DEV, 50), 1);
    drop(evicting);
    drop(others);
}

#[test]
fn least_recently_released_is_evicted() {
    const N: usize = 6;
    let cache = cache(N);

    let mut index_of = Vec::new();
    for blockno in 1..=N as u32 {
        let buf = cache.read(DEV, blockno).unwrap();
        index_of.push(buf.index());
        buf.release();
    }

    let buf = cache.read(DEV, N as u32 + 1).unwrap();
    assert_eq!(buf.index(), index_of[0]);
    assert_eq!(cache.refcnt(DEV, 1), 0);
    buf.release();

    // 块 1 已被换出，块 2..=N 仍在缓存中
    for blockno in 2..=N as u32 {
        let buf = cache.get(DEV, blockno).unwrap();
        assert_eq!(buf.index(), index_of[blockno as usize - 1]);
    }
}

#[test]
fn buffer_returning_to_old_block_is_reread() {
    const X: u32 = 10;
    let disk = Arc::new(RamDisk::new(BSIZE, 64));
    disk.write_block(X as usize, &[1; BSIZE]).unwrap();
    let cache = cache_with(2, disk.clone());

    let first = cache.read(DEV, X).unwrap();
    let old_index = first.index();
    assert_eq!(first[0], 1);
    first.release();
    cache.read(DEV, 20).unwrap().release();

    // 块 X 原来的缓冲区被换给块 30，没有读写过
    let other = cache.acquire(DEV, 30).unwrap();
    assert_eq!(other.index(), old_index);
    assert!(!other.is_valid());
    other.release();
    let pin = cache.get(DEV, 30).unwrap();

    // 通过另一个缓冲区改写块 X
    let mut x = cache.read(DEV, X).unwrap();
    assert_ne!(x.index(), old_index);
    x[0] = 2;
    x.write().unwrap();
    x.release();
    let held = cache.read(DEV, 40).unwrap();

    // 块 X 回到最初的缓冲区，必须重新读盘
    drop(pin);
    let x = cache.read(DEV, X).unwrap();
    assert_eq!(x.index(), old_index);
    assert_eq!(x[0], 2);
    drop(x);
    drop(held);
}

#[test]
fn failed_read_leaves_buffer_invalid() {
    const X: u32 = 4;
    let disk = Arc::new(FlakyDisk {
        inner: RamDisk::new(BSIZE, 16),
        broken: AtomicBool::new(false),
    });
    disk.inner.write_block(X as usize, &[1; BSIZE]).unwrap();
    let cache = cache_with(1, disk.clone());

    cache.read(DEV, X).unwrap().release();
    disk.broken.store(true, Ordering::SeqCst);
    assert!(cache.read(DEV, 5).is_err());

    // 块 X 在磁盘上被改写，唯一的缓冲区还留着它的旧内容
    disk.inner.write_block(X as usize, &[3; BSIZE]).unwrap();
    assert!(cache.read(DEV, X).is_err());
    assert!(!cache.acquire(DEV, X).unwrap().is_valid());

    disk.broken.store(false, Ordering::SeqCst);
    assert_eq!(cache.read(DEV, X).unwrap()[0], 3);
}

#[test]
fn pinned_pool_fails_instead_of_blocking() {
    let cache = cache(3);

    let held: Vec<_> = (0..3).map(|b| cache.read(DEV, b).unwrap()).collect();
    assert!(matches!(cache.acquire(DEV, 3), Err(Error::NoBuffers)));
    assert!(matches!(cache.read(DEV, 4), Err(Error::NoBuffers)));

    drop(held);
    assert!(cache.acquire(DEV, 3).is_ok());
}

#[test]
fn failed_read_releases_buffer() {
    let disk = Arc::new(FlakyDisk {
        inner: RamDisk::new(BSIZE, 16),
        broken: AtomicBool::new(true),
    });
    let cache = cache_with(2, disk.clone());

    assert!(matches!(
        cache.read(DEV, 3),
        Err(Error::Device(DeviceError::Io(3)))
    ));
    assert_eq!(cache.refcnt(DEV, 3), 0);

    // 缓冲区既未泄漏引用，也未留下无效数据
    disk.broken.store(false, Ordering::SeqCst);
    let held: Vec<_> = (3..5).map(|b| cache.read(DEV, b).unwrap()).collect();
    assert!(held.iter().all(|buf| buf.is_valid()));
}

#[test]
fn failed_write_keeps_lock_holder() {
    let disk = Arc::new(FlakyDisk {
        inner: RamDisk::new(BSIZE, 16),
        broken: AtomicBool::new(false),
    });
    let cache = cache_with(2, disk.clone());

    let mut buf = cache.read(DEV, 2).unwrap();
    buf[0] = 9;
    disk.broken.store(true, Ordering::SeqCst);
    assert_eq!(buf.write(), Err(Error::Device(DeviceError::Io(2))));
    disk.broken.store(false, Ordering::SeqCst);
    buf.write().unwrap();
    buf.release();

    let mut raw = [0; BSIZE];
    disk.inner.read_block(2, &mut raw).unwrap();
    assert_eq!(raw[0], 9);
}

#[test]
fn concurrent_increments_are_serialized() {
    const THREADS: u32 = 4;
    const ROUNDS: u32 = 200;
    let disk = Arc::new(RamDisk::new(BSIZE, 16));
    let cache = cache_with(4, disk.clone());

    thread::scope(|scope| {
        for t in 0..THREADS {
            let cache = &cache;
            scope.spawn(move || {
                for round in 0..ROUNDS {
                    let mut buf = cache.read(DEV, 5).unwrap();
                    buf.map_mut(0, |counter: &mut [u32; 1]| counter[0] += 1);
                    buf.write().unwrap();
                    buf.release();

                    // 顺带访问一些私有的块
                    let blockno = 6 + (t + round) % 8;
                    if let Ok(buf) = cache.read(DEV, blockno) {
                        assert_eq!(buf.blockno(), blockno);
                    }
                }
            });
        }
    });

    let buf = cache.read(DEV, 5).unwrap();
    assert_eq!(buf.get::<[u32; 1]>(0)[0], THREADS * ROUNDS);
    drop(buf);

    let mut raw = lfs::DataBlock::new();
    disk.read_block(5, raw.as_mut_slice()).unwrap();
    assert_eq!(raw.get::<[u32; 1]>(0)[0], THREADS * ROUNDS);
}
