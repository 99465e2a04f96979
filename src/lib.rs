// lib.rs
// 门面crate，重新导出 parallel 成员的公共模块与核心类型。
pub use parallel::parallel::{Dispatch, DispatchMode, Parallel};
pub use parallel::{backend, config, error, future, partition, runtime, task};
