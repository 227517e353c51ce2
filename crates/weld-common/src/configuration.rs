//! 容器配置模型

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "weld.toml";

/// 环境变量前缀
pub const ENV_PREFIX: &str = "WELD";

/// 环境变量层级分隔符
pub const ENV_SEPARATOR: &str = "__";

/// 解析缓存默认容量
pub const DEFAULT_RESOLUTION_CACHE_SIZE: usize = 0x10000;

/// 长会话默认超时 (毫秒)
pub const DEFAULT_CONVERSATION_TIMEOUT_MS: u64 = 600_000;

/// 会话并发访问默认等待时间 (毫秒)
pub const DEFAULT_CONCURRENT_ACCESS_TIMEOUT_MS: u64 = 1_000;

/// Weld 容器配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeldConfiguration {
    /// 异步事件执行器
    pub executor: ExecutorSettings,
    /// 解析器
    pub resolution: ResolutionSettings,
    /// 会话作用域
    pub conversation: ConversationSettings,
    /// 全局启用的备选 Bean
    pub alternatives: AlternativeSettings,
    /// Bean 发现
    pub discovery: DiscoverySettings,
    /// 日志
    pub logging: LoggingSettings,
}

impl WeldConfiguration {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置异步执行器线程数
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.executor.thread_pool_size = size;
        self
    }

    /// 设置解析缓存容量
    pub fn with_resolution_cache_size(mut self, size: usize) -> Self {
        self.resolution.cache_size = size;
        self
    }

    /// 设置长会话超时
    pub fn with_conversation_timeout(mut self, timeout: Duration) -> Self {
        self.conversation.timeout_ms = duration_millis(timeout);
        self
    }

    /// 设置会话并发访问等待时间
    pub fn with_concurrent_access_timeout(mut self, timeout: Duration) -> Self {
        self.conversation.concurrent_access_timeout_ms = duration_millis(timeout);
        self
    }

    /// 全局启用一个备选 Bean (按 Bean 类名或标识符)
    pub fn enable_alternative(mut self, alternative: impl Into<String>) -> Self {
        self.alternatives.enabled.push(alternative.into());
        self
    }

    /// 校验配置, 返回全部问题
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.executor.thread_pool_size == 0 {
            errors.push("executor.thread_pool_size 必须大于 0".to_string());
        }
        if self.resolution.cache_size == 0 {
            errors.push("resolution.cache_size 必须大于 0".to_string());
        }
        if self.conversation.timeout_ms == 0 {
            errors.push("conversation.timeout_ms 必须大于 0".to_string());
        }
        if self.conversation.concurrent_access_timeout_ms == 0 {
            errors.push("conversation.concurrent_access_timeout_ms 必须大于 0".to_string());
        }
        for (index, name) in self.alternatives.enabled.iter().enumerate() {
            if name.trim().is_empty() {
                errors.push(format!("alternatives.enabled[{index}] 不能为空"));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// 异步执行器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSettings {
    /// 工作线程数, 默认为可用处理器数
    pub thread_pool_size: usize,
    /// 空闲线程保活时间 (秒)
    pub keep_alive_secs: u64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            thread_pool_size: std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1),
            keep_alive_secs: 60,
        }
    }
}

impl ExecutorSettings {
    /// 保活时间
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

/// 解析器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionSettings {
    /// 缓存条目上限, 超出后整体清空
    pub cache_size: usize,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_RESOLUTION_CACHE_SIZE,
        }
    }
}

/// 会话作用域配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationSettings {
    /// 长会话超时 (毫秒)
    pub timeout_ms: u64,
    /// 激活被其他线程占用的会话时的最长等待 (毫秒)
    pub concurrent_access_timeout_ms: u64,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_CONVERSATION_TIMEOUT_MS,
            concurrent_access_timeout_ms: DEFAULT_CONCURRENT_ACCESS_TIMEOUT_MS,
        }
    }
}

impl ConversationSettings {
    /// 超时
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// 并发访问等待时间
    pub fn concurrent_access_timeout(&self) -> Duration {
        Duration::from_millis(self.concurrent_access_timeout_ms)
    }
}

/// 备选 Bean 配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternativeSettings {
    /// 全局启用的备选 Bean 类名或标识符
    pub enabled: Vec<String>,
}

/// Bean 发现模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeanDiscoveryMode {
    /// 所有类型都是 Bean
    All,
    /// 仅带有 Bean 定义注解 (显式作用域) 的类型
    #[default]
    Annotated,
    /// 不发现任何 Bean
    None,
}

/// Bean 发现配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// 发现模式
    pub mode: BeanDiscoveryMode,
    /// 排除的 Bean 类名 glob 模式
    pub excludes: Vec<String>,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// 日志级别
    pub level: String,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = WeldConfiguration::default();
        assert!(config.executor.thread_pool_size >= 1);
        assert_eq!(config.resolution.cache_size, 65536);
        assert_eq!(config.conversation.timeout(), Duration::from_secs(600));
        assert_eq!(
            config.conversation.concurrent_access_timeout(),
            Duration::from_secs(1)
        );
        assert_eq!(config.discovery.mode, BeanDiscoveryMode::Annotated);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = WeldConfiguration::new()
            .with_thread_pool_size(0)
            .with_resolution_cache_size(0)
            .enable_alternative(" ");
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: WeldConfiguration =
            serde_json::from_str(r#"{"executor": {"thread_pool_size": 3}, "discovery": {"mode": "all"}}"#)
                .unwrap();
        assert_eq!(config.executor.thread_pool_size, 3);
        assert_eq!(config.executor.keep_alive_secs, 60);
        assert_eq!(config.discovery.mode, BeanDiscoveryMode::All);
        assert_eq!(config.resolution.cache_size, DEFAULT_RESOLUTION_CACHE_SIZE);
    }
}
