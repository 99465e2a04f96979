// config.rs
// 运行时全局配置结构体及其默认实现，包含工作线程数量和默认任务优先级。
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 运行时全局配置，控制本地运行时的工作线程数量与默认优先级
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// 工作线程数量
    pub worker_count: usize,
    /// 默认任务优先级
    pub default_priority: i32,
}

/// 用于直接反序列化配置文件的结构体
/// 使用 serde 属性来处理字段名不匹配的问题 (e.g., "n_workers" -> worker_count)
#[derive(Debug, Deserialize)]
pub(crate) struct RuntimeConfigJson {
    #[serde(rename = "n_workers")]
    worker_count: usize,
    #[serde(default)]
    default_priority: i32,
}

// 为 RuntimeConfigJson 实现一个转换方法，使其可以轻松地转为 RuntimeConfig
impl From<RuntimeConfigJson> for RuntimeConfig {
    fn from(config_json: RuntimeConfigJson) -> Self {
        Self {
            worker_count: config_json.worker_count,
            default_priority: config_json.default_priority,
        }
    }
}

impl Default for RuntimeConfig {
    /// 默认配置：4个工作线程，优先级0
    fn default() -> Self {
        Self {
            worker_count: 4,
            default_priority: 0,
        }
    }
}

impl RuntimeConfig {
    /// 创建指定工作线程数量的配置
    pub fn with_workers(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Self::default()
        }
    }

    /// 从 JSON 配置文件读取运行时配置
    /// 文件不存在或格式错误则返回配置错误
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!("未找到配置文件 {}", path.display())));
        }
        let mut file = File::open(path)
            .map_err(|e| Error::Config(format!("打开配置文件失败: {}", e)))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| Error::Config(format!("读取配置文件失败: {}", e)))?;
        let config_json: RuntimeConfigJson = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("解析配置文件失败: {}", e)))?;
        Ok(RuntimeConfig::from(config_json))
    }
}
