// parallel.rs
// 并行映射入口：解析并行度、拆分参数、按块提交任务并按块序汇聚结果。
use crate::backend::{self, Backend};
use crate::error::{Error, Result};
use crate::future::{CombinedFuture, FutureHandle};
use crate::partition::partition;
use crate::runtime::{Job, TaskRuntime};
use crate::task::{ArgValue, BlockArg, DeferredCall, TaskBatch, TaskOptions, VectorizedCall};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// 调度模式，在构造并行映射器时确定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// 阻塞模式：等待全部块完成，返回按原始顺序展平的结果列表
    Normal,
    /// Future模式：立即返回覆盖全部块的组合Future
    Future,
}

/// 一次调度的返回值
pub enum Dispatch<R> {
    /// normal模式的产物：展平后的有序结果列表
    Results(Vec<R>),
    /// future模式的产物：待汇聚的组合Future
    Pending(CombinedFuture<R>),
}

impl<R> Dispatch<R> {
    /// 取出normal模式的结果列表
    pub fn results(self) -> Option<Vec<R>> {
        match self {
            Dispatch::Results(results) => Some(results),
            Dispatch::Pending(_) => None,
        }
    }

    /// 取出future模式的组合Future
    pub fn future(self) -> Option<CombinedFuture<R>> {
        match self {
            Dispatch::Results(_) => None,
            Dispatch::Pending(future) => Some(future),
        }
    }
}

/// 并行映射器：把一个调用批次拆分为若干块任务提交给外部运行时，
/// 并按块序汇聚结果
pub struct Parallel<Rt: TaskRuntime> {
    /// 调度模式
    pub mode: DispatchMode,
    /// 带符号的任务数：非负值直接作为块数，负值映射为 W+1+n_jobs（W为工作单元数）
    pub n_jobs: isize,
    /// 透传给每个块任务的提交选项，一次调度内各块完全相同
    pub task_options: TaskOptions,
    /// future模式汇聚成功时输出的消息
    pub end_msg: Option<String>,
    /// 超时配置。仅为接口兼容保留，当前未实现，调度过程不会读取
    pub timeout: Option<Duration>,
    runtime: Arc<Rt>,
    backend: Option<Arc<dyn Backend>>,
}

impl<Rt: TaskRuntime> Parallel<Rt> {
    /// 创建并行映射器，默认normal模式
    /// 当前线程存在活动后端时继承其后端与任务数，否则 n_jobs 为1
    pub fn new(runtime: Arc<Rt>) -> Self {
        let (backend, n_jobs) = match backend::active_backend() {
            Some((active, jobs)) => (Some(active), jobs),
            None => (None, 1),
        };
        Self {
            mode: DispatchMode::Normal,
            n_jobs,
            task_options: TaskOptions::default(),
            end_msg: None,
            timeout: None,
            runtime,
            backend,
        }
    }

    pub fn set_mode(&mut self, mode: DispatchMode) {
        self.mode = mode;
    }

    pub fn set_n_jobs(&mut self, n_jobs: isize) {
        self.n_jobs = n_jobs;
    }

    pub fn set_task_options(&mut self, task_options: TaskOptions) {
        self.task_options = task_options;
    }

    pub fn set_end_msg(&mut self, end_msg: impl Into<String>) {
        self.end_msg = Some(end_msg.into());
    }

    /// 切换到已注册的命名后端，未注册的名称属于配置错误
    pub fn set_backend(&mut self, name: &str) -> Result<()> {
        let backend = backend::backend_by_name(name, backend::active_nesting_level())?;
        self.backend = Some(backend);
        Ok(())
    }

    /// 底层运行时的可用工作单元数量
    pub fn effective_worker_count(&self) -> usize {
        self.runtime.worker_count()
    }

    /// 把带符号的 n_jobs 解析为块数
    /// 有效范围 [-(W+1), W]；负值映射为 W+1+n_jobs，-(W+1) 退化为单块；
    /// n_jobs 为0的行为未定义，这里作为配置错误拒绝
    fn resolve_block_count(&self) -> Result<usize> {
        let workers = self.runtime.worker_count() as isize;
        let n_jobs = self.n_jobs;
        if n_jobs < -workers - 1 || n_jobs > workers {
            return Err(Error::Config(format!(
                "n_jobs {} 超出有效范围 [{}, {}]，可用工作单元数量为 {}",
                n_jobs,
                -workers - 1,
                workers,
                workers
            )));
        }
        if n_jobs == 0 {
            return Err(Error::Config(
                "n_jobs 为0的行为未定义，请使用正的块数或负的相对并行度".to_string(),
            ));
        }
        let n_block = if n_jobs < 0 {
            (workers + 1 + n_jobs).max(1)
        } else {
            n_jobs
        };
        Ok(n_block as usize)
    }

    /// 拆分输入并为每个块提交一个任务，按块序返回句柄列表
    /// 所有配置校验都发生在第一次提交之前
    pub fn dispatch<T, R>(&self, batch: TaskBatch<T, R>) -> Result<Vec<FutureHandle<R>>>
    where
        T: Clone + Send + 'static,
        R: Send + 'static,
    {
        let n_block = self.resolve_block_count()?;
        match batch {
            TaskBatch::Vectorized(call) => self.dispatch_vectorized(call, n_block),
            TaskBatch::Calls(calls) => self.dispatch_calls(calls, n_block),
        }
    }

    /// 向量化参数形态：批量参数按块对齐拆分，标量参数广播到每个块
    fn dispatch_vectorized<T, R>(
        &self,
        call: VectorizedCall<T, R>,
        n_block: usize,
    ) -> Result<Vec<FutureHandle<R>>>
    where
        T: Clone + Send + 'static,
        R: Send + 'static,
    {
        let VectorizedCall { func, args } = call;

        // 物化惰性参数，并校验所有批量参数的总长度一致
        let mut resolved = Vec::with_capacity(args.len());
        let mut bulk_len: Option<usize> = None;
        for arg in args {
            let arg = match arg {
                ArgValue::Scalar(value) => ArgValue::Scalar(value),
                ArgValue::Bulk(values) => ArgValue::Bulk(values),
                ArgValue::BulkLazy(iter) => ArgValue::Bulk(iter.collect()),
            };
            if let ArgValue::Bulk(values) = &arg {
                match bulk_len {
                    None => bulk_len = Some(values.len()),
                    Some(expected) if expected != values.len() => {
                        return Err(Error::Config(format!(
                            "批量参数大小不一致: {} 与 {}",
                            expected,
                            values.len()
                        )));
                    }
                    Some(_) => {}
                }
            }
            resolved.push(arg);
        }

        // 实际块数：批量长度不足时由分块器的单元素规则封顶；
        // 完全没有批量参数时提交 n_block 个相同的标量调用
        let effective = match bulk_len {
            Some(len) => len.min(n_block),
            None => n_block,
        };
        let mut block_args: Vec<Vec<BlockArg<T>>> =
            (0..effective).map(|_| Vec::with_capacity(resolved.len())).collect();
        for arg in resolved {
            match arg {
                ArgValue::Scalar(value) => {
                    for args_i in block_args.iter_mut() {
                        args_i.push(BlockArg::Scalar(value.clone()));
                    }
                }
                ArgValue::Bulk(values) => {
                    for (args_i, chunk) in block_args.iter_mut().zip(partition(values, n_block)) {
                        args_i.push(BlockArg::Block(chunk));
                    }
                }
                ArgValue::BulkLazy(_) => unreachable!("惰性参数已在上一步物化"),
            }
        }

        let mut handles = Vec::with_capacity(block_args.len());
        for args_i in block_args {
            let func = Arc::clone(&func);
            let job: Job<R> = Box::new(move || {
                catch_unwind(AssertUnwindSafe(|| func(args_i))).map_err(panic_to_error)
            });
            handles.push(self.runtime.submit_task(&self.task_options, job));
        }
        println!("向量化调用拆分为 {} 个块任务", handles.len());
        Ok(handles)
    }

    /// 调用列表形态：按调用序列拆分，每个块任务顺序执行其中的延迟调用
    fn dispatch_calls<R>(
        &self,
        calls: Vec<DeferredCall<R>>,
        n_block: usize,
    ) -> Result<Vec<FutureHandle<R>>>
    where
        R: Send + 'static,
    {
        let blocks = partition(calls, n_block);
        let mut handles = Vec::with_capacity(blocks.len());
        for block in blocks {
            let job: Job<R> = Box::new(move || {
                catch_unwind(AssertUnwindSafe(|| {
                    block.into_iter().map(|call| call.invoke()).collect()
                }))
                .map_err(panic_to_error)
            });
            handles.push(self.runtime.submit_task(&self.task_options, job));
        }
        println!("调用列表拆分为 {} 个块任务", handles.len());
        Ok(handles)
    }

    /// 执行一次调度
    /// normal模式：阻塞到全部块完成，展平为按原始顺序排列的结果列表；
    /// future模式：立即返回组合Future，由调用方自行汇聚
    pub fn run<T, R>(&self, batch: TaskBatch<T, R>) -> Result<Dispatch<R>>
    where
        T: Clone + Send + 'static,
        R: Send + 'static,
    {
        if let Some(active) = &self.backend {
            active.start_call();
        }
        let outcome = self.run_inner(batch);
        if let Some(active) = &self.backend {
            active.stop_call();
        }
        outcome
    }

    fn run_inner<T, R>(&self, batch: TaskBatch<T, R>) -> Result<Dispatch<R>>
    where
        T: Clone + Send + 'static,
        R: Send + 'static,
    {
        let handles = self.dispatch(batch)?;
        match self.mode {
            DispatchMode::Normal => {
                let mut results = Vec::new();
                for handle in handles {
                    results.extend(handle.join()?);
                }
                Ok(Dispatch::Results(results))
            }
            DispatchMode::Future => {
                let mut combined = CombinedFuture::new(handles);
                if let Some(msg) = &self.end_msg {
                    combined = combined.with_end_msg(msg.clone());
                }
                Ok(Dispatch::Pending(combined))
            }
        }
    }
}

/// 把任务内部的恐慌信息转换为执行错误
fn panic_to_error(payload: Box<dyn Any + Send>) -> Error {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        Error::Execution(format!("任务执行过程中恐慌: {}", msg))
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        Error::Execution(format!("任务执行过程中恐慌: {}", msg))
    } else {
        Error::Execution("任务执行过程中发生未知恐慌".to_string())
    }
}
