use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// 进度与协作取消回调（原版 WaitingHandler 的替代）。
///
/// worker 每处理一个 tag 检查一次取消并上报一个单位；
/// 取消只在 tag 粒度生效，不抢占进行中的 finalize。
pub trait ProgressSink: Sync {
    fn is_cancelled(&self) -> bool {
        false
    }
    fn set_total_units(&self, _n: u64) {}
    fn report_unit(&self) {}
}

/// 不做任何事的 sink。
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// 基于原子计数器的 sink，可被多个 worker 线程共享。
#[derive(Debug, Default)]
pub struct AtomicProgress {
    total: AtomicU64,
    done: AtomicU64,
    cancelled: AtomicBool,
}

impl AtomicProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl ProgressSink for AtomicProgress {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn set_total_units(&self, n: u64) {
        self.total.store(n, Ordering::Relaxed);
    }

    fn report_unit(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }
}
