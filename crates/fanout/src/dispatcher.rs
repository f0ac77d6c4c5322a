// dispatcher.rs
// 任务分发器：把一批输入按静态拆分策略分给固定数量的工作线程，阻塞等待全部结束后返回结果集合。
use std::any::Any;
use std::convert::Infallible;
use std::fmt::Display;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{DispatcherConfig, FailurePolicy, DEFAULT_WORKER_COUNT};
use crate::error::{Error, Result};
use crate::executor::{WorkerExecutor, WorkerOutput};
use crate::merger::ResultMerger;
use crate::partition;
use crate::task::{DispatchReport, ItemOutcome};

/// 用指定数量的工作线程执行 `job`，返回每个输入对应的一条结果
///
/// 结果顺序反映工作线程的划分，不与输入位置一一对应。
pub fn dispatch<I, O, F>(job: F, inputs: &[I], worker_count: usize) -> Result<Vec<O>>
where
    I: Sync,
    O: Send,
    F: Fn(&I) -> O + Sync,
{
    Dispatcher::with_workers(worker_count)?.run(job, inputs)
}

/// 使用默认的8个工作线程
pub fn dispatch_default<I, O, F>(job: F, inputs: &[I]) -> Result<Vec<O>>
where
    I: Sync,
    O: Send,
    F: Fn(&I) -> O + Sync,
{
    dispatch(job, inputs, DEFAULT_WORKER_COUNT)
}

/// 任务分发器
///
/// 每次调用都新建工作线程，调用返回前全部join，不复用线程。
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: DispatcherConfig,
}

impl Dispatcher {
    /// 创建分发器，配置非法时立即返回错误
    pub fn new(config: DispatcherConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_workers(worker_count: usize) -> Result<Self> {
        Self::new(DispatcherConfig::with_workers(worker_count))
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// 执行不会失败的任务
    ///
    /// 任务panic时返回 `Error::WorkerPanicked`，不会返回缺条目的结果。
    pub fn run<I, O, F>(&self, job: F, inputs: &[I]) -> Result<Vec<O>>
    where
        I: Sync,
        O: Send,
        F: Fn(&I) -> O + Sync,
    {
        let wrapped = |input: &I| Ok::<O, Infallible>(job(input));
        let (run_id, outputs) = self.execute(&wrapped, inputs, None)?;
        let merged = ResultMerger::new(self.config.result_order).merge(outputs);
        ResultMerger::verify_complete(inputs.len(), merged.len())?;
        debug!(%run_id, results = merged.len(), "结果合并完成");
        Ok(ResultMerger::into_values(merged))
    }

    /// 快速失败：第一个失败的输入使整个调用返回 `Error::JobFailed`
    ///
    /// 其他工作线程在处理下一个输入之前停止。多个输入同时失败时报告下标最小的那个。
    pub fn try_run<I, O, E, F>(&self, job: F, inputs: &[I]) -> Result<Vec<O>>
    where
        I: Sync,
        O: Send,
        E: Display + Send,
        F: Fn(&I) -> std::result::Result<O, E> + Sync,
    {
        let (_, outcomes) = self.run_fail_fast(&job, inputs)?;
        Ok(outcomes
            .into_iter()
            .filter_map(|outcome| outcome.result.ok())
            .collect())
    }

    /// 按配置中的 `failure_policy` 执行
    ///
    /// `FailFast` 下第一个失败返回 `Error::JobFailed`，成功时报告中全部是成功记录；
    /// `CollectAll` 下返回包含全部成功和失败记录的报告。
    pub fn run_with_policy<I, O, E, F>(&self, job: F, inputs: &[I]) -> Result<DispatchReport<O, E>>
    where
        I: Sync,
        O: Send,
        E: Display + Send,
        F: Fn(&I) -> std::result::Result<O, E> + Sync,
    {
        match self.config.failure_policy {
            FailurePolicy::FailFast => {
                let (run_id, outcomes) = self.run_fail_fast(&job, inputs)?;
                Ok(DispatchReport {
                    run_id,
                    expected: inputs.len(),
                    outcomes,
                })
            }
            FailurePolicy::CollectAll => self.run_collect(job, inputs),
        }
    }

    /// 收集全部：每个输入都得到一条成功或失败记录，由调用方决定如何处理失败
    pub fn run_collect<I, O, E, F>(&self, job: F, inputs: &[I]) -> Result<DispatchReport<O, E>>
    where
        I: Sync,
        O: Send,
        E: Send,
        F: Fn(&I) -> std::result::Result<O, E> + Sync,
    {
        let (run_id, outputs) = self.execute(&job, inputs, None)?;
        let outcomes = ResultMerger::new(self.config.result_order).merge(outputs);
        ResultMerger::verify_complete(inputs.len(), outcomes.len())?;
        let report = DispatchReport {
            run_id,
            expected: inputs.len(),
            outcomes,
        };
        if report.failure_count() > 0 {
            warn!(run_id = %report.run_id, failures = report.failure_count(), "部分输入处理失败");
        }
        Ok(report)
    }

    /// 快速失败执行，全部成功时返回合并后的记录
    fn run_fail_fast<I, O, E, F>(
        &self,
        job: &F,
        inputs: &[I],
    ) -> Result<(String, Vec<ItemOutcome<O, E>>)>
    where
        I: Sync,
        O: Send,
        E: Display + Send,
        F: Fn(&I) -> std::result::Result<O, E> + Sync,
    {
        let cancel = AtomicBool::new(false);
        let (run_id, outputs) = self.execute(job, inputs, Some(&cancel))?;
        let merged = ResultMerger::new(self.config.result_order).merge(outputs);

        let first_failure = merged
            .iter()
            .filter(|outcome| !outcome.is_success())
            .min_by_key(|outcome| outcome.index)
            .map(|outcome| outcome.index);
        if let Some(failed_index) = first_failure {
            let failed = merged
                .into_iter()
                .find(|outcome| outcome.index == failed_index)
                .ok_or(Error::Incomplete {
                    expected: inputs.len(),
                    actual: 0,
                })?;
            let message = match failed.result {
                Err(e) => e.to_string(),
                Ok(_) => String::new(),
            };
            warn!(%run_id, index = failed_index, worker_id = failed.worker_id, "分发因任务失败而终止");
            return Err(Error::JobFailed {
                index: failed_index,
                worker_id: failed.worker_id,
                message,
            });
        }

        ResultMerger::verify_complete(inputs.len(), merged.len())?;
        Ok((run_id, merged))
    }

    /// 拆分输入、启动工作线程并等待全部结束
    fn execute<I, O, E, F>(
        &self,
        job: &F,
        inputs: &[I],
        cancel: Option<&AtomicBool>,
    ) -> Result<(String, Vec<WorkerOutput<O, E>>)>
    where
        I: Sync,
        O: Send,
        E: Send,
        F: Fn(&I) -> std::result::Result<O, E> + Sync,
    {
        let run_id = Uuid::new_v4().to_string();
        let slices = partition::split(
            inputs.len(),
            self.config.worker_count,
            self.config.split_strategy,
        )?;
        if inputs.is_empty() {
            debug!(%run_id, "输入为空，不启动工作线程");
            return Ok((run_id, Vec::new()));
        }

        let start_time = Instant::now();
        let outputs = thread::scope(|scope| {
            let handles: Vec<_> = slices
                .iter()
                .filter(|slice| !slice.is_empty())
                .map(|slice| {
                    let mut executor = WorkerExecutor::new(slice.worker_id);
                    executor.set_max_attempts(self.config.max_attempts);
                    executor.set_retry_backoff(self.config.retry_backoff());
                    let handle =
                        scope.spawn(move || executor.run_fallible(job, inputs, slice, cancel));
                    (slice.worker_id, handle)
                })
                .collect();

            let mut outputs = Vec::with_capacity(handles.len());
            let mut panicked = None;
            for (worker_id, handle) in handles {
                match handle.join() {
                    Ok(output) => {
                        debug!(
                            %run_id,
                            worker_id,
                            processed = output.processed(),
                            status = ?output.status,
                            elapsed_ms = output.elapsed.as_millis() as u64,
                            "工作线程结束"
                        );
                        outputs.push(output);
                    }
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        warn!(%run_id, worker_id, %message, "工作线程panic");
                        if panicked.is_none() {
                            panicked = Some(Error::WorkerPanicked { worker_id, message });
                        }
                    }
                }
            }
            match panicked {
                Some(e) => Err(e),
                None => Ok(outputs),
            }
        })?;

        let slowest_worker_ms = outputs
            .iter()
            .map(|output| output.elapsed.as_millis() as u64)
            .max()
            .unwrap_or(0);
        info!(
            %run_id,
            inputs = inputs.len(),
            workers = outputs.len(),
            slowest_worker_ms,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "分发完成"
        );
        Ok((run_id, outputs))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "未知panic".to_string()
    }
}
