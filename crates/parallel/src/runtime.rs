// runtime.rs
// 任务运行时：消费侧接口定义，以及基于工作线程池的本地参考实现。
use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::future::FutureHandle;
use crate::task::TaskOptions;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use uuid::Uuid;

/// 任务执行体：在工作线程侧运行一次，产出一个块的结果列表
pub type Job<R> = Box<dyn FnOnce() -> Result<Vec<R>> + Send>;

/// 外部任务运行时接口
/// 调度核心只通过这两个原语与底层运行时交互：
/// 查询可用工作单元数量，以及提交任务换取结果句柄
/// 提交接口要求可以被多线程并发调用
pub trait TaskRuntime: Send + Sync {
    /// 可用工作单元数量，至少为1
    fn worker_count(&self) -> usize;

    /// 提交一个任务，返回其结果句柄，句柄列表的顺序由调用方维护
    fn submit_task<R: Send + 'static>(&self, options: &TaskOptions, job: Job<R>) -> FutureHandle<R>;
}

/// 单次任务提交记录，选项字段原样存档
#[derive(Debug, Clone)]
pub struct TaskRecord {
    /// 提交时分配的任务唯一ID
    pub task_id: String,
    pub name: Option<String>,
    pub priority: i32,
    pub flops: Option<f64>,
    pub perfmodel: Option<String>,
}

/// 已入队、类型擦除后的任务
type QueuedJob = Box<dyn FnOnce() + Send>;

/// 工作线程共享状态：任务队列与关闭标志
struct QueueState {
    jobs: VecDeque<QueuedJob>,
    shutdown: bool,
}

struct RuntimeShared {
    state: Mutex<QueueState>,
    available: Condvar,
}

/// 本地运行时：固定数量的工作线程消费一个共享任务队列
/// 作为外部调度运行时的参考实现，满足 TaskRuntime 消费接口
pub struct LocalRuntime {
    /// 运行时配置
    pub config: RuntimeConfig,
    shared: Arc<RuntimeShared>,
    workers: Vec<JoinHandle<()>>,
    records: Mutex<Vec<TaskRecord>>,
    submitted: AtomicUsize,
    completed: Arc<AtomicUsize>,
}

impl LocalRuntime {
    /// 按配置启动工作线程池
    pub fn new(config: RuntimeConfig) -> Self {
        let shared = Arc::new(RuntimeShared {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                shutdown: false,
            }),
            available: Condvar::new(),
        });
        let completed = Arc::new(AtomicUsize::new(0));

        let mut workers = Vec::with_capacity(config.worker_count);
        for _ in 0..config.worker_count {
            let shared = Arc::clone(&shared);
            let completed = Arc::clone(&completed);
            workers.push(std::thread::spawn(move || {
                Self::worker_loop(shared, completed);
            }));
        }
        println!("本地运行时已启动 {} 个工作线程", config.worker_count);

        Self {
            config,
            shared,
            workers,
            records: Mutex::new(Vec::new()),
            submitted: AtomicUsize::new(0),
            completed,
        }
    }

    /// 工作线程主循环：取任务、执行、计数，队列空且收到关闭信号后退出
    fn worker_loop(shared: Arc<RuntimeShared>, completed: Arc<AtomicUsize>) {
        loop {
            let job = {
                let mut state = shared.state.lock().unwrap();
                loop {
                    if let Some(job) = state.jobs.pop_front() {
                        break job;
                    }
                    if state.shutdown {
                        return;
                    }
                    state = shared.available.wait(state).unwrap();
                }
            };
            job();
            completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// 已提交任务数
    pub fn tasks_submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    /// 已完成任务数
    pub fn tasks_completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// 全部提交记录的快照
    pub fn records(&self) -> Vec<TaskRecord> {
        self.records.lock().unwrap().clone()
    }

    /// 打印当前提交进度
    pub fn print_progress(&self) {
        println!(
            "已提交 {} 个任务，已完成 {} 个",
            self.tasks_submitted(),
            self.tasks_completed()
        );
    }
}

impl TaskRuntime for LocalRuntime {
    fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    fn submit_task<R: Send + 'static>(&self, options: &TaskOptions, job: Job<R>) -> FutureHandle<R> {
        let record = TaskRecord {
            task_id: Uuid::new_v4().to_string(),
            name: options.name.clone(),
            priority: options.priority,
            flops: options.flops,
            perfmodel: options.perfmodel.clone(),
        };
        self.records.lock().unwrap().push(record);
        self.submitted.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let synchronous = options.synchronous;
        let wrapped: QueuedJob = Box::new(move || {
            let result = job();
            let _ = tx.send(result);
            if synchronous {
                let _ = done_tx.send(());
            }
        });

        {
            let mut state = self.shared.state.lock().unwrap();
            // 高优先级任务排到队列前端
            if options.priority > 0 {
                state.jobs.push_front(wrapped);
            } else {
                state.jobs.push_back(wrapped);
            }
            self.shared.available.notify_one();
        }

        // 同步提交：等待本块执行完毕再返回句柄
        if synchronous {
            let _ = done_rx.recv();
        }
        FutureHandle::new(rx)
    }
}

impl Drop for LocalRuntime {
    /// 通知所有工作线程退出并等待它们结束，已入队任务会先被执行完
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.shutdown = true;
        }
        self.shared.available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
