// backend.rs
// 后端注册表与线程局部的作用域后端栈：注册命名后端工厂，按作用域激活与恢复。
use crate::error::{Error, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock, RwLock};

/// 并发后端策略接口
/// 对调度核心而言后端是不透明的命名策略，只暴露钩子与嵌套层级
pub trait Backend: Send + Sync {
    /// 后端名称
    fn name(&self) -> &str;

    /// 显式嵌套层级，返回None表示由作用域推导（父层级加一）
    fn nesting_level(&self) -> Option<usize> {
        None
    }

    /// 一次调度开始时的钩子
    fn start_call(&self) {}

    /// 一次调度结束时的钩子
    fn stop_call(&self) {}
}

/// 后端工厂：按嵌套层级构造后端实例
pub type BackendFactory = dyn Fn(usize) -> Arc<dyn Backend> + Send + Sync;

fn registry() -> &'static RwLock<HashMap<String, Arc<BackendFactory>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, Arc<BackendFactory>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// 注册命名后端工厂，同名注册会覆盖旧工厂
pub fn register_backend(
    name: &str,
    factory: impl Fn(usize) -> Arc<dyn Backend> + Send + Sync + 'static,
) {
    registry()
        .write()
        .unwrap()
        .insert(name.to_string(), Arc::new(factory));
}

/// 按名称构造后端实例，未注册的名称属于配置错误
pub fn backend_by_name(name: &str, nesting_level: usize) -> Result<Arc<dyn Backend>> {
    let registry = registry().read().unwrap();
    match registry.get(name) {
        Some(factory) => Ok(factory(nesting_level)),
        None => {
            let mut known: Vec<&str> = registry.keys().map(|k| k.as_str()).collect();
            known.sort_unstable();
            Err(Error::Config(format!(
                "未知后端: {}，已注册的后端: {:?}",
                name, known
            )))
        }
    }
}

/// 活动后端栈条目：后端实例、该作用域请求的任务数、生效的嵌套层级
struct ActiveEntry {
    backend: Arc<dyn Backend>,
    n_jobs: isize,
    level: usize,
}

thread_local! {
    // 每个线程独立维护自己的活动后端栈，禁止跨线程修改
    static ACTIVE_STACK: RefCell<Vec<ActiveEntry>> = RefCell::new(Vec::new());
}

/// 返回当前线程的活动后端及其请求的任务数
pub fn active_backend() -> Option<(Arc<dyn Backend>, isize)> {
    ACTIVE_STACK.with(|stack| {
        stack
            .borrow()
            .last()
            .map(|entry| (Arc::clone(&entry.backend), entry.n_jobs))
    })
}

/// 当前线程活动作用域的嵌套层级，没有活动后端时为0
pub fn active_nesting_level() -> usize {
    ACTIVE_STACK.with(|stack| stack.borrow().last().map(|entry| entry.level).unwrap_or(0))
}

/// 作用域后端守卫：进入时压栈，离开作用域（包括失败路径）时弹栈恢复上一个后端
/// 守卫绑定创建它的线程，不可跨线程移动
pub struct BackendScope {
    _not_send: PhantomData<*const ()>,
}

impl BackendScope {
    /// 以已注册的命名后端进入作用域
    pub fn enter(name: &str, n_jobs: isize) -> Result<Self> {
        let backend = backend_by_name(name, active_nesting_level())?;
        Ok(Self::enter_with(backend, n_jobs))
    }

    /// 以后端实例进入作用域
    /// 后端未给出显式嵌套层级时，生效层级为父作用域层级加一
    pub fn enter_with(backend: Arc<dyn Backend>, n_jobs: isize) -> Self {
        ACTIVE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let parent_level = stack.last().map(|entry| entry.level).unwrap_or(0);
            let level = backend.nesting_level().unwrap_or(parent_level + 1);
            stack.push(ActiveEntry {
                backend,
                n_jobs,
                level,
            });
        });
        BackendScope {
            _not_send: PhantomData,
        }
    }
}

impl Drop for BackendScope {
    fn drop(&mut self) {
        ACTIVE_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedBackend {
        name: String,
        level: usize,
    }

    impl Backend for NamedBackend {
        fn name(&self) -> &str {
            &self.name
        }

        fn nesting_level(&self) -> Option<usize> {
            Some(self.level)
        }
    }

    fn make(name: &str, level: usize) -> Arc<dyn Backend> {
        Arc::new(NamedBackend {
            name: name.to_string(),
            level,
        })
    }

    #[test]
    fn test_nested_scopes_restore_previous_backend() {
        assert!(active_backend().is_none());
        {
            let _a = BackendScope::enter_with(make("backend_a", 0), 4);
            assert_eq!(active_backend().unwrap().0.name(), "backend_a");
            assert_eq!(active_backend().unwrap().1, 4);
            {
                let _b = BackendScope::enter_with(make("backend_b", 1), 2);
                assert_eq!(active_backend().unwrap().0.name(), "backend_b");
                assert_eq!(active_backend().unwrap().1, 2);
            }
            // 退出内层作用域后恢复外层后端
            assert_eq!(active_backend().unwrap().0.name(), "backend_a");
        }
        assert!(active_backend().is_none());
    }

    #[test]
    fn test_scope_is_thread_local() {
        let _a = BackendScope::enter_with(make("main_thread_backend", 0), 3);

        let other = std::thread::spawn(|| active_backend().is_none())
            .join()
            .unwrap();
        // 其他线程看不到本线程的活动后端
        assert!(other);
        assert_eq!(active_backend().unwrap().0.name(), "main_thread_backend");
    }

    #[test]
    fn test_implicit_nesting_level_increments() {
        struct PlainBackend;
        impl Backend for PlainBackend {
            fn name(&self) -> &str {
                "plain"
            }
        }

        let _outer = BackendScope::enter_with(make("outer", 5), 1);
        assert_eq!(active_nesting_level(), 5);
        let _inner = BackendScope::enter_with(Arc::new(PlainBackend), 1);
        assert_eq!(active_nesting_level(), 6);
    }

    #[test]
    fn test_registry_lookup_and_unknown_name() {
        register_backend("threading_like", |level| make("threading_like", level));

        let backend = backend_by_name("threading_like", 2).unwrap();
        assert_eq!(backend.name(), "threading_like");
        assert_eq!(backend.nesting_level(), Some(2));

        let err = backend_by_name("no_such_backend", 0).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_enter_by_name() {
        register_backend("scoped_backend", |level| make("scoped_backend", level));
        {
            let _scope = BackendScope::enter("scoped_backend", -1).unwrap();
            let (backend, n_jobs) = active_backend().unwrap();
            assert_eq!(backend.name(), "scoped_backend");
            assert_eq!(n_jobs, -1);
        }
        assert!(BackendScope::enter("missing_backend", 1).is_err());
    }
}
