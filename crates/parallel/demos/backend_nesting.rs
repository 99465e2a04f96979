//! backend_nesting.rs
//!
//! 演示命名后端的注册与作用域激活：
//! 内层作用域退出后，外层后端自动恢复为当前线程的活动后端。

use parallel::backend::{self, Backend, BackendScope};
use parallel::config::RuntimeConfig;
use parallel::parallel::Parallel;
use parallel::runtime::LocalRuntime;
use parallel::task::{delayed, TaskBatch};
use std::sync::Arc;

struct LoggingBackend {
    name: String,
}

impl Backend for LoggingBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn start_call(&self) {
        println!("后端 {} 开始一次调度", self.name);
    }

    fn stop_call(&self) {
        println!("后端 {} 结束一次调度", self.name);
    }
}

fn print_active() {
    match backend::active_backend() {
        Some((active, n_jobs)) => println!(
            "当前活动后端: {}，n_jobs = {}，嵌套层级 = {}",
            active.name(),
            n_jobs,
            backend::active_nesting_level()
        ),
        None => println!("当前没有活动后端"),
    }
}

fn main() -> anyhow::Result<()> {
    println!("=== 作用域后端演示 ===");

    backend::register_backend("outer", |_level| {
        Arc::new(LoggingBackend {
            name: "outer".to_string(),
        })
    });
    backend::register_backend("inner", |_level| {
        Arc::new(LoggingBackend {
            name: "inner".to_string(),
        })
    });

    let runtime = Arc::new(LocalRuntime::new(RuntimeConfig::with_workers(4)));
    let double = delayed(|x: i64| x * 2);

    print_active();
    {
        let _outer = BackendScope::enter("outer", -1)?;
        print_active();

        // 作用域内构造的映射器继承活动后端与其 n_jobs
        let parallel = Parallel::new(Arc::clone(&runtime));
        let batch: TaskBatch<i64, i64> =
            TaskBatch::Calls((0..6).map(|i| double(i)).collect());
        let results = parallel.run(batch)?.results().expect("normal模式返回结果列表");
        println!("外层作用域的结果: {:?}", results);

        {
            let _inner = BackendScope::enter("inner", 2)?;
            print_active();

            let parallel = Parallel::new(Arc::clone(&runtime));
            let batch: TaskBatch<i64, i64> =
                TaskBatch::Calls((0..3).map(|i| double(i)).collect());
            let results = parallel.run(batch)?.results().expect("normal模式返回结果列表");
            println!("内层作用域的结果: {:?}", results);
        }
        // 内层作用域已退出，外层后端恢复
        print_active();
    }
    print_active();

    Ok(())
}
