// executor.rs
// 工作线程执行器，负责按顺序处理一个切片中的输入，包含重试、快速失败时的提前停止等处理。
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::partition::WorkerSlice;
use crate::task::{ItemOutcome, WorkerStatus};

/// 一个工作线程的本地输出缓冲
#[derive(Debug)]
pub struct WorkerOutput<O, E> {
    pub worker_id: usize,
    pub status: WorkerStatus,
    /// 按处理顺序（即下标升序）排列的结果
    pub items: Vec<ItemOutcome<O, E>>,
    pub elapsed: Duration,
}

impl<O, E> WorkerOutput<O, E> {
    /// 已处理（含失败）的输入数
    pub fn processed(&self) -> usize {
        self.items.len()
    }
}

pub struct WorkerExecutor {
    pub worker_id: usize,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl WorkerExecutor {
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            max_attempts: 1,
            retry_backoff: Duration::from_millis(100),
        }
    }

    pub fn set_max_attempts(&mut self, max_attempts: u32) {
        self.max_attempts = max_attempts.max(1);
    }

    pub fn set_retry_backoff(&mut self, retry_backoff: Duration) {
        self.retry_backoff = retry_backoff;
    }

    /// 执行可能失败的任务
    ///
    /// `cancel` 为 `Some` 时采用快速失败：自身失败后置位标志并停止，
    /// 发现标志已置位则在下一个输入之前停止。为 `None` 时记录失败并继续。
    pub fn run_fallible<I, O, E, F>(
        &self,
        job: &F,
        inputs: &[I],
        slice: &WorkerSlice,
        cancel: Option<&AtomicBool>,
    ) -> WorkerOutput<O, E>
    where
        F: Fn(&I) -> Result<O, E>,
    {
        let start_time = Instant::now();
        debug!(worker_id = self.worker_id, assigned = slice.len(), "工作线程启动");

        let mut items = Vec::with_capacity(slice.len());
        let mut status = WorkerStatus::Completed;

        for &index in &slice.indices {
            if cancel.is_some_and(|flag| flag.load(Ordering::Acquire)) {
                status = WorkerStatus::Cancelled;
                break;
            }
            let (attempts, result) = self.execute_item(job, &inputs[index], index);
            let failed = result.is_err();
            items.push(ItemOutcome {
                index,
                worker_id: self.worker_id,
                attempts,
                result,
            });
            if failed {
                if let Some(flag) = cancel {
                    flag.store(true, Ordering::Release);
                    status = WorkerStatus::Failed;
                    break;
                }
            }
        }

        WorkerOutput {
            worker_id: self.worker_id,
            status,
            items,
            elapsed: start_time.elapsed(),
        }
    }

    /// 对单个输入执行任务，失败时按线性退避重试
    fn execute_item<I, O, E, F>(&self, job: &F, input: &I, index: usize) -> (u32, Result<O, E>)
    where
        F: Fn(&I) -> Result<O, E>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match job(input) {
                Ok(value) => return (attempts, Ok(value)),
                Err(e) => {
                    if attempts >= self.max_attempts {
                        warn!(worker_id = self.worker_id, index, attempts, "输入处理失败");
                        return (attempts, Err(e));
                    }
                    thread::sleep(self.retry_backoff * attempts);
                }
            }
        }
    }
}
