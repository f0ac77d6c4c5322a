// lib.rs
// fanout 库入口，声明并导出各子模块。
pub mod archive;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod inspect;
pub mod merger;
pub mod partition;
pub mod task;
pub mod tokenize;

pub use config::{DispatcherConfig, FailurePolicy, ResultOrder, SplitStrategy, DEFAULT_WORKER_COUNT};
pub use dispatcher::{dispatch, dispatch_default, Dispatcher};
pub use error::{Error, Result};
pub use task::{DispatchReport, ItemOutcome, WorkerStatus};
