//! square_map.rs
//!
//! 演示normal模式的并行映射：
//! 1. 通过 serde_json 写出并读回运行时配置。
//! 2. 生成随机输入向量，按 n_jobs=4 拆分为块任务提交。
//! 3. 阻塞汇聚结果，并用表格打印任务提交记录。

use parallel::config::RuntimeConfig;
use parallel::parallel::Parallel;
use parallel::runtime::{LocalRuntime, TaskRuntime};
use parallel::task::{ArgValue, BlockArg, TaskBatch, TaskOptions, VectorizedCall};
use prettytable::{row, Table};
use rand::Rng;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    println!("=== normal模式并行映射演示 ===");

    // ---- 1. 配置 ----
    // 写出配置文件再读回，模拟从部署环境加载
    let dir = std::env::temp_dir().join("parallel_map_demo");
    std::fs::create_dir_all(&dir)?;
    let config_path = dir.join("runtime.json");
    let config_json = serde_json::json!({ "n_workers": 8 });
    std::fs::write(&config_path, serde_json::to_string_pretty(&config_json)?)?;
    let config = RuntimeConfig::from_json_file(&config_path)?;
    println!("运行时配置: {:?}", config);

    let runtime = Arc::new(LocalRuntime::new(config));
    println!("可用工作单元数量: {}", runtime.worker_count());

    // ---- 2. 输入与调度 ----
    let mut rng = rand::thread_rng();
    let input: Vec<i64> = (0..32).map(|_| rng.gen_range(0..100)).collect();
    println!("输入: {:?}", input);

    let mut parallel = Parallel::new(Arc::clone(&runtime));
    parallel.set_n_jobs(4);
    parallel.set_task_options(TaskOptions {
        name: Some("square".to_string()),
        flops: Some(32.0),
        perfmodel: Some("square_history".to_string()),
        ..TaskOptions::default()
    });

    let call = VectorizedCall::new(
        |args: Vec<BlockArg<i64>>| match args.into_iter().next() {
            Some(BlockArg::Block(xs)) => xs.into_iter().map(|x| x * x).collect(),
            _ => Vec::new(),
        },
        vec![ArgValue::Bulk(input)],
    );
    let results = parallel
        .run(TaskBatch::Vectorized(call))?
        .results()
        .expect("normal模式返回结果列表");

    // ---- 3. 结果与提交记录 ----
    println!("结果: {:?}", results);
    runtime.print_progress();

    let mut table = Table::new();
    table.add_row(row!["任务ID", "名称", "优先级", "flops", "性能模型"]);
    for record in runtime.records() {
        table.add_row(row![
            record.task_id,
            record.name.unwrap_or_default(),
            record.priority,
            record.flops.map(|f| f.to_string()).unwrap_or_default(),
            record.perfmodel.unwrap_or_default()
        ]);
    }
    table.printstd();

    Ok(())
}
