// partition.rs
// 输入拆分器，负责按轮询或连续分块策略把输入下标分配给各个工作线程。
use crate::config::SplitStrategy;
use crate::error::{Error, Result};

/// 单个工作线程负责的输入下标，升序排列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSlice {
    pub worker_id: usize,
    pub indices: Vec<usize>,
}

impl WorkerSlice {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }
}

/// 把 [0, len) 拆分给 worker_count 个工作线程
/// 返回的切片数恰好等于 worker_count，多出来的工作线程得到空切片
pub fn split(len: usize, worker_count: usize, strategy: SplitStrategy) -> Result<Vec<WorkerSlice>> {
    if worker_count == 0 {
        return Err(Error::InvalidArgument("工作线程数必须大于0".to_string()));
    }
    let slices = match strategy {
        SplitStrategy::RoundRobin => split_round_robin(len, worker_count),
        SplitStrategy::Chunked => split_chunked(len, worker_count),
    };
    Ok(slices)
}

/// 轮询拆分：工作线程 k 处理 k, k+N, k+2N, ...
fn split_round_robin(len: usize, worker_count: usize) -> Vec<WorkerSlice> {
    (0..worker_count)
        .map(|worker_id| WorkerSlice {
            worker_id,
            indices: (worker_id..len).step_by(worker_count).collect(),
        })
        .collect()
}

/// 连续分块：每块 ceil(len / N) 个下标
fn split_chunked(len: usize, worker_count: usize) -> Vec<WorkerSlice> {
    let chunk_size = len.div_ceil(worker_count).max(1);
    (0..worker_count)
        .map(|worker_id| {
            let start = (worker_id * chunk_size).min(len);
            let end = (start + chunk_size).min(len);
            WorkerSlice {
                worker_id,
                indices: (start..end).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers_exactly_once(slices: &[WorkerSlice], len: usize) {
        let mut seen = vec![0usize; len];
        for slice in slices {
            assert!(slice.indices.windows(2).all(|w| w[0] < w[1]), "切片必须升序");
            for &i in &slice.indices {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
    }

    #[test]
    fn test_round_robin_assignment() {
        let slices = split(10, 4, SplitStrategy::RoundRobin).unwrap();
        assert_eq!(slices.len(), 4);
        assert_eq!(slices[0].indices, vec![0, 4, 8]);
        assert_eq!(slices[1].indices, vec![1, 5, 9]);
        assert_eq!(slices[2].indices, vec![2, 6]);
        assert_eq!(slices[3].indices, vec![3, 7]);
        assert_covers_exactly_once(&slices, 10);
    }

    #[test]
    fn test_round_robin_more_workers_than_inputs() {
        let slices = split(3, 8, SplitStrategy::RoundRobin).unwrap();
        assert_eq!(slices.len(), 8);
        assert_eq!(slices.iter().filter(|s| !s.is_empty()).count(), 3);
        assert_covers_exactly_once(&slices, 3);
    }

    #[test]
    fn test_chunked_assignment() {
        let slices = split(10, 4, SplitStrategy::Chunked).unwrap();
        assert_eq!(slices[0].indices, vec![0, 1, 2]);
        assert_eq!(slices[1].indices, vec![3, 4, 5]);
        assert_eq!(slices[2].indices, vec![6, 7, 8]);
        assert_eq!(slices[3].indices, vec![9]);
        assert_covers_exactly_once(&slices, 10);
    }

    #[test]
    fn test_chunked_sparse_tail() {
        let slices = split(5, 4, SplitStrategy::Chunked).unwrap();
        assert_eq!(slices.len(), 4);
        assert!(slices[3].is_empty());
        assert_covers_exactly_once(&slices, 5);
    }

    #[test]
    fn test_empty_input() {
        for strategy in [SplitStrategy::RoundRobin, SplitStrategy::Chunked] {
            let slices = split(0, 3, strategy).unwrap();
            assert_eq!(slices.len(), 3);
            assert!(slices.iter().all(WorkerSlice::is_empty));
        }
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(
            split(5, 0, SplitStrategy::RoundRobin),
            Err(Error::InvalidArgument(_))
        ));
    }
}
