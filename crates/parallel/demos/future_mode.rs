//! future_mode.rs
//!
//! 演示future模式：调度立即返回组合Future，由调用方自行汇聚，
//! 汇聚成功后以固定消息触发完成回调。

use parallel::config::RuntimeConfig;
use parallel::parallel::{DispatchMode, Parallel};
use parallel::runtime::LocalRuntime;
use parallel::task::{ArgValue, BlockArg, TaskBatch, VectorizedCall};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    println!("=== future模式演示 ===");

    let runtime = Arc::new(LocalRuntime::new(RuntimeConfig::with_workers(4)));
    let mut parallel = Parallel::new(Arc::clone(&runtime));
    parallel.set_mode(DispatchMode::Future);
    // -1 表示使用全部工作单元
    parallel.set_n_jobs(-1);
    parallel.set_end_msg("全部块任务已完成");

    let input: Vec<i64> = (0..10).collect();
    let call = VectorizedCall::new(
        |args: Vec<BlockArg<i64>>| match args.into_iter().next() {
            Some(BlockArg::Block(xs)) => xs.into_iter().map(|x| x * x * x).collect(),
            _ => Vec::new(),
        },
        vec![ArgValue::Bulk(input)],
    );

    let mut combined = parallel
        .run(TaskBatch::Vectorized(call))?
        .future()
        .expect("future模式返回组合Future");
    println!("组合Future覆盖 {} 个块，调用方此刻未被阻塞", combined.len());
    combined.on_done(|msg| println!("完成回调: {}", msg));

    // 汇聚：结果按块序排列，不展平
    let blocks = combined.join()?;
    for (i, block) in blocks.iter().enumerate() {
        println!("块{} 的结果: {:?}", i, block);
    }
    let flat: Vec<i64> = blocks.into_iter().flatten().collect();
    println!("展平后的结果: {:?}", flat);

    Ok(())
}
