// error.rs
// 定义分发器与辅助工具通用的错误类型（参数校验、任务失败、工作线程崩溃、归档读取等）和Result类型。
use std::path::PathBuf;

use thiserror::Error;

/// 项目通用错误类型
#[derive(Debug, Error)]
pub enum Error {
    /// 参数非法（工作线程数为0、重试次数为0等），在启动任何工作线程之前返回
    #[error("参数错误: {0}")]
    InvalidArgument(String),

    /// 快速失败策略下，某个输入上的任务执行失败
    #[error("任务失败: 输入下标 {index}（工作线程 {worker_id}）: {message}")]
    JobFailed {
        index: usize,
        worker_id: usize,
        message: String,
    },

    /// 任务函数在工作线程中panic
    #[error("工作线程 {worker_id} 异常退出: {message}")]
    WorkerPanicked { worker_id: usize, message: String },

    /// 结果数量与输入数量不一致
    #[error("结果不完整: 期望 {expected} 条，实际 {actual} 条")]
    Incomplete { expected: usize, actual: usize },

    /// 配置文件错误
    #[error("配置错误: {0}")]
    Config(String),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON解析错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// ZIP归档错误
    #[error("ZIP错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// RAR归档错误
    #[error("RAR错误: {0}")]
    Rar(String),

    /// 归档中找不到指定文件
    #[error("{archive} 中未找到 {entry}")]
    EntryNotFound { entry: String, archive: PathBuf },

    /// 既不是ZIP也不是RAR
    #[error("不支持的归档格式: {0}（仅支持ZIP和RAR）")]
    UnsupportedArchive(PathBuf),
}

/// 通用结果类型
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// 出错的输入下标（仅任务失败时存在）
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            Error::JobFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}
