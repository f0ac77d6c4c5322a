// config.rs
// 分发器全局配置结构体及其默认实现，包含工作线程数、拆分策略、结果顺序、失败策略和重试参数。
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 默认工作线程数
pub const DEFAULT_WORKER_COUNT: usize = 8;

/// 输入拆分策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// 轮询拆分：下标 i 分给工作线程 i % N
    #[default]
    RoundRobin,
    /// 按块拆分：每个工作线程处理一段连续下标
    Chunked,
}

/// 结果集合的顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrder {
    /// 按工作线程依次拼接，不保证与输入顺序对应
    #[default]
    Unordered,
    /// 按输入下标排序
    InputOrder,
}

/// 单个输入失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// 第一个失败立即返回错误，其余工作线程在下一个输入前停止
    #[default]
    FailFast,
    /// 收集所有输入的成功和失败记录
    CollectAll,
}

/// 分发器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// 工作线程数
    pub worker_count: usize,
    /// 拆分策略
    pub split_strategy: SplitStrategy,
    /// 结果顺序
    pub result_order: ResultOrder,
    /// 失败策略
    pub failure_policy: FailurePolicy,
    /// 每个输入最多尝试次数（含首次）
    pub max_attempts: u32,
    /// 重试退避基数（毫秒），第 n 次重试前等待 n * retry_backoff_ms
    pub retry_backoff_ms: u64,
}

impl Default for DispatcherConfig {
    /// 默认配置：8个工作线程，轮询拆分，无序结果，快速失败，不重试
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            split_strategy: SplitStrategy::RoundRobin,
            result_order: ResultOrder::Unordered,
            failure_policy: FailurePolicy::FailFast,
            max_attempts: 1,
            retry_backoff_ms: 100,
        }
    }
}

impl DispatcherConfig {
    /// 使用指定工作线程数，其余取默认值
    pub fn with_workers(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Self::default()
        }
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(Error::InvalidArgument("工作线程数必须大于0".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(Error::InvalidArgument("最大尝试次数必须大于0".to_string()));
        }
        Ok(())
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// 从JSON配置文件读取配置，缺省字段取默认值
    /// 如果文件不存在则返回错误
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Config(format!("未找到配置文件 {}", path.display())));
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("读取 {} 失败: {}", path.display(), e)))?;
        let config: DispatcherConfig = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("解析 {} 失败: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DispatcherConfig::default();
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.split_strategy, SplitStrategy::RoundRobin);
        assert_eq!(config.result_order, ResultOrder::Unordered);
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.max_attempts, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = DispatcherConfig::with_workers(0);
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = DispatcherConfig {
            max_attempts: 0,
            ..DispatcherConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_from_json_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"worker_count": 3, "result_order": "input_order", "failure_policy": "collect_all"}}"#
        )
        .unwrap();

        let config = DispatcherConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.result_order, ResultOrder::InputOrder);
        assert_eq!(config.failure_policy, FailurePolicy::CollectAll);
        // 未出现的字段取默认值
        assert_eq!(config.split_strategy, SplitStrategy::RoundRobin);
        assert_eq!(config.retry_backoff_ms, 100);
    }

    #[test]
    fn test_from_json_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = DispatcherConfig::from_json_file(dir.path().join("config.json"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_json_file_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"worker_count": 0}}"#).unwrap();
        let result = DispatcherConfig::from_json_file(file.path());
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
