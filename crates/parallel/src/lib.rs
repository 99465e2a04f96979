// lib.rs
// 并行映射模块入口，声明并导出各子模块。
pub mod backend;
pub mod config;
pub mod error;
pub mod future;
pub mod parallel;
pub mod partition;
pub mod runtime;
pub mod task;
