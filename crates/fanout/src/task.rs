// task.rs
// 定义单个输入的执行结果、工作线程状态以及收集全部结果时返回的分发报告。
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 工作线程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerStatus {
    /// 处理完了分配到的全部输入
    Completed,
    /// 因其他工作线程快速失败而提前停止
    Cancelled,
    /// 自身遇到失败并停止
    Failed,
}

/// 单个输入的执行结果
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome<O, E> {
    /// 输入下标
    pub index: usize,
    /// 处理它的工作线程
    pub worker_id: usize,
    /// 实际尝试次数
    pub attempts: u32,
    /// 任务返回值
    pub result: std::result::Result<O, E>,
}

impl<O, E> ItemOutcome<O, E> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// 收集全部结果策略下的分发报告，每个输入恰好对应一条记录
#[derive(Debug, Clone)]
pub struct DispatchReport<O, E> {
    /// 本次分发的ID
    pub run_id: String,
    /// 输入总数
    pub expected: usize,
    /// 所有输入的执行结果
    pub outcomes: Vec<ItemOutcome<O, E>>,
}

impl<O, E> DispatchReport<O, E> {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// 所有成功的返回值
    pub fn successes(&self) -> impl Iterator<Item = &O> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// 所有失败记录：(输入下标, 错误)
    pub fn failures(&self) -> impl Iterator<Item = (usize, &E)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.index, e)))
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// 每个输入都有记录且全部成功
    pub fn is_complete(&self) -> bool {
        self.outcomes.len() == self.expected && self.outcomes.iter().all(ItemOutcome::is_success)
    }

    /// 丢弃下标信息，只保留每个输入的返回值
    pub fn into_results(self) -> Vec<std::result::Result<O, E>> {
        self.outcomes.into_iter().map(|o| o.result).collect()
    }

    /// 全部成功时返回值列表，否则返回第一个失败（按输入下标）
    pub fn into_values(self) -> Result<Vec<O>>
    where
        E: Display,
    {
        let first_failure = self
            .outcomes
            .iter()
            .filter(|o| !o.is_success())
            .min_by_key(|o| o.index)
            .map(|o| (o.index, o.worker_id));
        if let Some((index, worker_id)) = first_failure {
            let message = self
                .outcomes
                .into_iter()
                .find(|o| o.index == index)
                .and_then(|o| o.result.err())
                .map(|e| e.to_string())
                .unwrap_or_default();
            return Err(Error::JobFailed {
                index,
                worker_id,
                message,
            });
        }
        Ok(self
            .outcomes
            .into_iter()
            .filter_map(|o| o.result.ok())
            .collect())
    }
}
