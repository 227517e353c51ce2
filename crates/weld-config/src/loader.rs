//! 分层配置加载
//!
//! 配置来源按优先级从低到高叠加:
//! 内置默认值, 配置文件 (TOML/JSON/YAML, 按扩展名识别), `WELD__` 前缀的环境变量。

use config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use weld_common::{ConfigError, ConfigResult, WeldConfiguration, DEFAULT_CONFIG_FILE, ENV_PREFIX, ENV_SEPARATOR};

/// 列表类型的配置键, 环境变量中以逗号分隔
const LIST_KEYS: [&str; 2] = ["alternatives.enabled", "discovery.excludes"];

/// 配置加载器
#[derive(Debug, Clone)]
pub struct ConfigurationLoader {
    files: Vec<PathBuf>,
    default_file: Option<PathBuf>,
    env_prefix: Option<String>,
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationLoader {
    /// 创建加载器: 可选的 `weld.toml` 加上 `WELD` 环境变量
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            default_file: Some(PathBuf::from(DEFAULT_CONFIG_FILE)),
            env_prefix: Some(ENV_PREFIX.to_string()),
        }
    }

    /// 不读取任何隐式来源, 只使用显式添加的文件
    pub fn empty() -> Self {
        Self {
            files: Vec::new(),
            default_file: None,
            env_prefix: None,
        }
    }

    /// 添加必需的配置文件, 后添加的覆盖先添加的
    pub fn add_file(mut self, path: impl AsRef<Path>) -> Self {
        self.files.push(path.as_ref().to_path_buf());
        self
    }

    /// 更换可选默认配置文件的位置
    pub fn with_default_file(mut self, path: impl AsRef<Path>) -> Self {
        self.default_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// 不读取默认配置文件
    pub fn without_default_file(mut self) -> Self {
        self.default_file = None;
        self
    }

    /// 设置环境变量前缀
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// 不读取环境变量
    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// 加载并校验配置
    pub fn load(&self) -> ConfigResult<WeldConfiguration> {
        // 第一步：检查显式文件是否存在
        for path in &self.files {
            if !path.exists() {
                error!("配置文件不存在: {}", path.display());
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
        }

        // 第二步：按优先级叠加配置源
        let mut builder = Config::builder();
        if let Some(default_file) = &self.default_file {
            builder = builder.add_source(File::from(default_file.as_path()).required(false));
        }
        for path in &self.files {
            debug!("添加配置文件: {}", path.display());
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }
        if let Some(prefix) = &self.env_prefix {
            let mut environment = Environment::with_prefix(prefix)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .list_separator(",");
            for key in LIST_KEYS {
                environment = environment.with_list_parse_key(key);
            }
            builder = builder.add_source(environment);
        }

        // 第三步：反序列化, 缺省字段取默认值
        let configuration: WeldConfiguration = builder
            .build()
            .and_then(|config| config.try_deserialize::<WeldConfiguration>())
            .map_err(|e| {
                error!("配置构建失败: {}", e);
                ConfigError::parse(e)
            })?;

        // 第四步：校验
        validate(&configuration)?;
        info!(
            "配置加载完成: 线程数 {}, 发现模式 {:?}",
            configuration.executor.thread_pool_size, configuration.discovery.mode
        );
        Ok(configuration)
    }
}

/// 校验配置, 一次性报告全部问题
pub fn validate(configuration: &WeldConfiguration) -> ConfigResult<()> {
    let mut errors = configuration.validate().err().unwrap_or_default();
    errors.extend(invalid_patterns("discovery.excludes", &configuration.discovery.excludes));
    if errors.is_empty() {
        Ok(())
    } else {
        error!("配置验证失败: {:?}", errors);
        Err(ConfigError::ValidationFailed { errors })
    }
}

/// 返回无法编译的 glob 模式的描述
pub(crate) fn invalid_patterns(key: &str, patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .enumerate()
        .filter_map(|(index, pattern)| {
            glob::Pattern::new(pattern)
                .err()
                .map(|e| format!("{key}[{index}] 不是合法的 glob 模式 '{pattern}': {e}"))
        })
        .collect()
}
