use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crossbeam_channel::Receiver;

use crate::error::TreeError;
use crate::progress::ProgressSink;
use crate::tree::corpus::ProteinCorpus;
use crate::tree::store::NodeStore;
use crate::tree::ProteinTree;

/// 每攒够这么多已完成 tag 才对 backlog 加一次锁批量移除。
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// 节点切分的尺寸上限。
#[derive(Debug, Clone, Copy)]
pub struct BuildLimits {
    /// 单节点最大出现数，超过则切分
    pub max_node_size: usize,
    /// 叶子序列（tag 深度）上限，到达后不再切分
    pub max_tag_length: usize,
}

impl Default for BuildLimits {
    fn default() -> Self {
        Self {
            max_node_size: 500,
            max_tag_length: 100,
        }
    }
}

/// 未固化 tag 的共享集合。
///
/// 唯一需要互斥访问的共享资源；`remove_batch` 在一次加锁内
/// 原子地移除整批，任何 worker 都不会观察到半移除的批次。
/// tag 只会在其节点成功持久化之后才被移除。
#[derive(Debug, Default)]
pub struct TagBacklog {
    tags: Mutex<HashSet<String>>,
    removals: AtomicU64,
}

impl TagBacklog {
    pub fn seed(tags: impl IntoIterator<Item = String>) -> Self {
        Self {
            tags: Mutex::new(tags.into_iter().collect()),
            removals: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.tags.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.lock().map(|t| t.contains(tag)).unwrap_or(false)
    }

    /// 仍然待处理的 tag（重跑时用来重新播种工作队列）。
    pub fn pending(&self) -> Vec<String> {
        self.tags
            .lock()
            .map(|t| t.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 一次加锁移除整批。
    pub fn remove_batch(&self, batch: &[String]) {
        if let Ok(mut tags) = self.tags.lock() {
            for tag in batch {
                tags.remove(tag);
            }
        }
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    /// 已执行的批量移除次数（进入构建报告）。
    pub fn removal_count(&self) -> u64 {
        self.removals.load(Ordering::Relaxed)
    }
}

/// 单个 worker 的运行统计。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub cancelled: bool,
}

/// 整个构建运行的汇总报告（替代原版的 print-and-continue）。
#[derive(Debug, Default, Clone)]
pub struct BuildReport {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub cancelled: bool,
    /// 运行结束后仍留在 backlog 中的 tag 数（失败或取消所致）
    pub pending: usize,
    pub batch_flushes: u64,
}

impl BuildReport {
    fn absorb(&mut self, w: WorkerReport) {
        self.processed += w.processed;
        self.succeeded += w.succeeded;
        self.failed += w.failed;
        self.cancelled |= w.cancelled;
    }
}

/// 索引构建 worker：把共享 backlog 驱动到空。
///
/// 从共享队列非阻塞弹出 tag，固化并持久化对应节点，把完成的
/// tag 攒批后从 backlog 移除。单个 tag 的失败被记录、计数并
/// 跳过，绝不中止 worker，也不影响已固化的 tag；取消在 tag
/// 粒度协作式生效。
pub struct IndexBuilderWorker<'a> {
    tree: &'a ProteinTree,
    corpus: &'a ProteinCorpus,
    backlog: &'a TagBacklog,
    queue: Receiver<String>,
    store: &'a dyn NodeStore,
    limits: BuildLimits,
    batch_size: usize,
    progress: Option<&'a dyn ProgressSink>,
}

impl<'a> IndexBuilderWorker<'a> {
    pub fn new(
        tree: &'a ProteinTree,
        corpus: &'a ProteinCorpus,
        backlog: &'a TagBacklog,
        queue: Receiver<String>,
        store: &'a dyn NodeStore,
        limits: BuildLimits,
        batch_size: usize,
        progress: Option<&'a dyn ProgressSink>,
    ) -> Self {
        Self {
            tree,
            corpus,
            backlog,
            queue,
            store,
            limits,
            batch_size: batch_size.max(1),
            progress,
        }
    }

    /// 主循环：队列弹空即结束（其他 worker 可能仍在处理各自
    /// 抢到的 tag）。返回本 worker 的统计。
    pub fn run(&self) -> WorkerReport {
        let mut report = WorkerReport::default();
        let mut done_batch: Vec<String> = Vec::new();

        while let Ok(tag) = self.queue.try_recv() {
            report.processed += 1;
            match self.finalize_one(&tag) {
                Ok(()) => {
                    report.succeeded += 1;
                    done_batch.push(tag);
                }
                Err(e) => {
                    report.failed += 1;
                    log::warn!("finalization of tag '{tag}' failed: {e}");
                }
            }

            if let Some(progress) = self.progress {
                if progress.is_cancelled() {
                    // 未冲刷的批次留在 backlog，等待下一次运行
                    report.cancelled = true;
                    return report;
                }
                progress.report_unit();
            }

            if done_batch.len() >= self.batch_size {
                self.backlog.remove_batch(&done_batch);
                done_batch.clear();
            }
        }

        if !done_batch.is_empty() {
            self.backlog.remove_batch(&done_batch);
        }
        report
    }

    /// 固化单个 tag：切分、持久化。backlog 移除严格发生在
    /// 持久化成功之后（由调用方攒批执行）。
    fn finalize_one(&self, tag: &str) -> Result<(), TreeError> {
        let cell = self
            .tree
            .get(tag)
            .ok_or_else(|| TreeError::UnknownTag(tag.to_string()))?;
        let mut node = cell
            .lock()
            .map_err(|_| TreeError::NodePoisoned(tag.to_string()))?;
        node.finalize_and_split(
            self.corpus,
            self.limits.max_node_size,
            self.limits.max_tag_length,
        )?;
        self.store.commit(tag, &node)?;
        Ok(())
    }
}

/// 以 `num_workers` 个并行 worker 驱动一次完整构建。
///
/// 队列在 worker 启动前由 backlog 的待处理 tag 播种，此后不再
/// 写入；运行可安全重跑——用 [`TagBacklog::pending`] 重新播种
/// 即可让索引收敛到完整。
pub fn build_tree(
    tree: &ProteinTree,
    corpus: &ProteinCorpus,
    backlog: &TagBacklog,
    store: &dyn NodeStore,
    limits: BuildLimits,
    num_workers: usize,
    progress: Option<&dyn ProgressSink>,
) -> BuildReport {
    let pending = backlog.pending();
    let (tx, rx) = crossbeam_channel::unbounded();
    for tag in pending {
        let _ = tx.send(tag);
    }
    drop(tx);

    if let Some(p) = progress {
        p.set_total_units(backlog.len() as u64);
    }

    let reports: Mutex<Vec<WorkerReport>> = Mutex::new(Vec::new());
    rayon::scope(|s| {
        for _ in 0..num_workers.max(1) {
            let rx = rx.clone();
            let reports = &reports;
            s.spawn(move |_| {
                let worker = IndexBuilderWorker::new(
                    tree,
                    corpus,
                    backlog,
                    rx,
                    store,
                    limits,
                    DEFAULT_BATCH_SIZE,
                    progress,
                );
                let r = worker.run();
                if let Ok(mut all) = reports.lock() {
                    all.push(r);
                }
            });
        }
    });

    let mut report = BuildReport::default();
    if let Ok(all) = reports.lock() {
        for w in all.iter() {
            report.absorb(*w);
        }
    }
    report.pending = backlog.len();
    report.batch_flushes = backlog.removal_count();
    report
}
