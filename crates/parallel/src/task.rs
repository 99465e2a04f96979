// task.rs
// 任务相关类型：任务提交选项、延迟调用、向量化调用的参数形态。
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 任务提交选项，原样透传给外部调度器
/// 一次调度中的所有块任务共用同一份选项
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskOptions {
    /// 任务名称
    pub name: Option<String>,
    /// 是否同步提交（提交后等待任务完成再返回）
    pub synchronous: bool,
    /// 任务优先级，大于0的任务会被排到队列前端
    pub priority: i32,
    /// 任务颜色标记（调试用）
    pub color: Option<u32>,
    /// 预估计算量（flops）
    pub flops: Option<f64>,
    /// 性能模型标识
    pub perfmodel: Option<String>,
}

/// 延迟调用：将可调用对象与其参数打包，不立即执行
/// 创建后不可变，由调度器在构建任务提交时消费一次
pub struct DeferredCall<R> {
    call: Box<dyn FnOnce() -> R + Send>,
}

impl<R> DeferredCall<R> {
    /// 包装一个无参闭包为延迟调用
    pub fn new(f: impl FnOnce() -> R + Send + 'static) -> Self {
        Self { call: Box::new(f) }
    }

    /// 执行被包装的调用（在工作线程侧）
    pub fn invoke(self) -> R {
        (self.call)()
    }
}

/// 包装可调用对象，返回一个延迟调用构造器
/// 参数顺序显式按位置给定，多个参数使用元组传入
pub fn delayed<A, R, F>(f: F) -> impl Fn(A) -> DeferredCall<R>
where
    F: Fn(A) -> R + Send + Sync + 'static,
    A: Send + 'static,
    R: 'static,
{
    let f = Arc::new(f);
    move |args| {
        let f = Arc::clone(&f);
        DeferredCall::new(move || f(args))
    }
}

/// 参数形态标签，在一次调度开始时对每个参数判定一次
pub enum ArgValue<T> {
    /// 标量参数：原样广播到每个块
    Scalar(T),
    /// 定长批量参数：按连续下标区间拆分
    Bulk(Vec<T>),
    /// 惰性批量参数：先物化，再与定长批量按相同方式拆分
    BulkLazy(Box<dyn Iterator<Item = T> + Send>),
}

/// 块内参数：批量参数的连续切片，或广播下来的标量
#[derive(Debug, Clone, PartialEq)]
pub enum BlockArg<T> {
    Scalar(T),
    Block(Vec<T>),
}

/// 向量化调用：一个块函数加上按位置给定的参数列表
/// 块函数每个块被调用一次，接收该块的参数并返回该块的结果列表
pub struct VectorizedCall<T, R> {
    pub func: Arc<dyn Fn(Vec<BlockArg<T>>) -> Vec<R> + Send + Sync>,
    pub args: Vec<ArgValue<T>>,
}

impl<T, R> VectorizedCall<T, R> {
    pub fn new(
        func: impl Fn(Vec<BlockArg<T>>) -> Vec<R> + Send + Sync + 'static,
        args: Vec<ArgValue<T>>,
    ) -> Self {
        Self {
            func: Arc::new(func),
            args,
        }
    }
}

/// 一次调度的输入形态
pub enum TaskBatch<T, R> {
    /// 向量化参数形态：单个调用，批量参数被拆分、标量参数被广播
    Vectorized(VectorizedCall<T, R>),
    /// 调用列表形态：一组独立的延迟调用，按调用序列拆分
    Calls(Vec<DeferredCall<R>>),
}
