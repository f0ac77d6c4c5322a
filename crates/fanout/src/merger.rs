// merger.rs
// 结果合并器，负责在所有工作线程结束后把各自的本地缓冲合并为最终的结果集合。
use std::convert::Infallible;

use crate::config::ResultOrder;
use crate::error::{Error, Result};
use crate::executor::WorkerOutput;
use crate::task::ItemOutcome;

pub struct ResultMerger {
    pub order: ResultOrder,
}

impl ResultMerger {
    pub fn new(order: ResultOrder) -> Self {
        Self { order }
    }

    /// 合并各工作线程的输出
    pub fn merge<O, E>(&self, mut outputs: Vec<WorkerOutput<O, E>>) -> Vec<ItemOutcome<O, E>> {
        outputs.sort_by_key(|output| output.worker_id);
        let total = outputs.iter().map(|output| output.items.len()).sum();
        let mut merged = Vec::with_capacity(total);
        for output in outputs {
            merged.extend(output.items);
        }
        if self.order == ResultOrder::InputOrder {
            merged.sort_by_key(|outcome| outcome.index);
        }
        merged
    }

    /// 结果条数必须与输入条数一致，绝不返回被截断的集合
    pub fn verify_complete(expected: usize, actual: usize) -> Result<()> {
        if expected != actual {
            return Err(Error::Incomplete { expected, actual });
        }
        Ok(())
    }

    /// 去掉下标等附加信息，只保留返回值
    pub fn into_values<O>(outcomes: Vec<ItemOutcome<O, Infallible>>) -> Vec<O> {
        outcomes
            .into_iter()
            .map(|outcome| match outcome.result {
                Ok(value) => value,
                Err(never) => match never {},
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::WorkerStatus;
    use std::time::Duration;

    fn output(worker_id: usize, indices: &[usize]) -> WorkerOutput<usize, Infallible> {
        WorkerOutput {
            worker_id,
            status: WorkerStatus::Completed,
            items: indices
                .iter()
                .map(|&index| ItemOutcome {
                    index,
                    worker_id,
                    attempts: 1,
                    result: Ok(index * 10),
                })
                .collect(),
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_unordered_is_worker_major() {
        let merger = ResultMerger::new(ResultOrder::Unordered);
        let merged = merger.merge(vec![output(1, &[1, 3]), output(0, &[0, 2, 4])]);
        let values = ResultMerger::into_values(merged);
        assert_eq!(values, vec![0, 20, 40, 10, 30]);
    }

    #[test]
    fn test_input_order() {
        let merger = ResultMerger::new(ResultOrder::InputOrder);
        let merged = merger.merge(vec![output(1, &[1, 3]), output(0, &[0, 2, 4])]);
        let values = ResultMerger::into_values(merged);
        assert_eq!(values, vec![0, 10, 20, 30, 40]);
    }

    #[test]
    fn test_verify_complete() {
        assert!(ResultMerger::verify_complete(3, 3).is_ok());
        assert!(matches!(
            ResultMerger::verify_complete(4, 3),
            Err(Error::Incomplete { expected: 4, actual: 3 })
        ));
    }
}
