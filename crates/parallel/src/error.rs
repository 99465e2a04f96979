// error.rs
// 定义项目通用的错误类型（配置、任务执行、IO等）和Result类型。
use std::fmt;
use std::io;

/// 项目通用错误类型，区分提交前的配置错误与提交后的执行错误
#[derive(Debug)]
pub enum Error {
    /// 配置错误（n_jobs越界、批量参数大小不一致、未知后端等），在任何任务提交前报告
    Config(String),
    /// 任务执行错误，发生在已提交的任务内部，经由FutureHandle传播到汇聚点
    Execution(String),
    /// IO错误
    Io(io::Error),
    /// 其他类型错误
    Other(String),
}

/// 通用结果类型
pub type Result<T> = std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "配置错误: {}", msg),
            Error::Execution(msg) => write!(f, "任务执行错误: {}", msg),
            Error::Io(e) => write!(f, "IO错误: {}", e),
            Error::Other(msg) => write!(f, "其他错误: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
