//! call_list.rs
//!
//! 演示调用列表形态：用 delayed 包装若干独立调用，
//! 分块器按调用序列拆分，每个块任务顺序执行其中的延迟调用。

use parallel::config::RuntimeConfig;
use parallel::parallel::Parallel;
use parallel::runtime::LocalRuntime;
use parallel::task::{delayed, TaskBatch, TaskOptions};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    println!("=== 调用列表形态演示 ===");

    let runtime = Arc::new(LocalRuntime::new(RuntimeConfig::with_workers(4)));
    let mut parallel = Parallel::new(Arc::clone(&runtime));
    parallel.set_n_jobs(2);
    parallel.set_task_options(TaskOptions {
        name: Some("add_pair".to_string()),
        // 同步提交：每个块提交后等待其完成
        synchronous: true,
        ..TaskOptions::default()
    });

    let add = delayed(|(a, b): (i64, i64)| a + b);
    let batch: TaskBatch<i64, i64> = TaskBatch::Calls(vec![
        add((1, 2)),
        add((10, 20)),
        add((100, 200)),
        add((1000, 2000)),
        add((10000, 20000)),
    ]);

    let results = parallel
        .run(batch)?
        .results()
        .expect("normal模式返回结果列表");
    println!("结果（保持原始调用顺序）: {:?}", results);
    runtime.print_progress();

    Ok(())
}
