//! `Weld` 构建器
//!
//! 收集 Bean、观察者、拦截器、扩展与配置, 然后启动一个 [`WeldContainer`]。

use crate::container::WeldContainer;
use crate::logging::LoggingConfig;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use weld_common::{WeldConfiguration, WeldResult};
use weld_config::ConfigurationLoader;
use weld_core::{Deployment, TypeHierarchy, WeldBootstrap};
use weld_spi::{
    Bean, BeanDeploymentArchive, BeanType, BeansXml, Extension, Interceptor, ObserverMethod,
};

/// 通过构建器直接添加的 Bean 所在的合成归档
pub const SYNTHETIC_ARCHIVE_ID: &str = "weld-se-synthetic";

/// 配置来源
#[derive(Debug, Clone)]
enum ConfigurationSource {
    Defaults,
    Explicit(WeldConfiguration),
    Loaded(ConfigurationLoader),
}

/// SE 容器构建器
pub struct Weld {
    container_id: Option<String>,
    beans: Vec<Arc<dyn Bean>>,
    observers: Vec<Arc<dyn ObserverMethod>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    archives: Vec<BeanDeploymentArchive>,
    extensions: Vec<Arc<dyn Extension>>,
    hierarchy: TypeHierarchy,
    alternatives: Vec<String>,
    configuration: ConfigurationSource,
    logging: Option<LoggingConfig>,
    logging_from_configuration: bool,
}

impl Default for Weld {
    fn default() -> Self {
        Self::new()
    }
}

impl Weld {
    /// 创建构建器
    pub fn new() -> Self {
        Self {
            container_id: None,
            beans: Vec::new(),
            observers: Vec::new(),
            interceptors: Vec::new(),
            archives: Vec::new(),
            extensions: Vec::new(),
            hierarchy: TypeHierarchy::new(),
            alternatives: Vec::new(),
            configuration: ConfigurationSource::Defaults,
            logging: None,
            logging_from_configuration: false,
        }
    }

    /// 指定容器 ID, 默认生成 UUID
    pub fn container_id(mut self, id: impl Into<String>) -> Self {
        self.container_id = Some(id.into());
        self
    }

    /// 添加 Bean
    pub fn add_bean(mut self, bean: Arc<dyn Bean>) -> Self {
        self.beans.push(bean);
        self
    }

    /// 批量添加 Bean
    pub fn add_beans(mut self, beans: impl IntoIterator<Item = Arc<dyn Bean>>) -> Self {
        self.beans.extend(beans);
        self
    }

    /// 添加观察者
    pub fn add_observer(mut self, observer: Arc<dyn ObserverMethod>) -> Self {
        self.observers.push(observer);
        self
    }

    /// 添加拦截器
    pub fn add_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// 添加部署归档
    pub fn add_archive(mut self, archive: BeanDeploymentArchive) -> Self {
        self.archives.push(archive);
        self
    }

    /// 添加扩展, 按添加顺序通知
    pub fn add_extension(mut self, extension: Arc<dyn Extension>) -> Self {
        self.extensions.push(extension);
        self
    }

    /// 声明类的直接父类型
    pub fn declare_type(mut self, class: impl Into<String>, supertypes: Vec<BeanType>) -> Self {
        self.hierarchy.declare(class, supertypes);
        self
    }

    /// 合并一份类型层次
    pub fn with_type_hierarchy(mut self, hierarchy: &TypeHierarchy) -> Self {
        self.hierarchy.merge(hierarchy);
        self
    }

    /// 全局启用备选 Bean (Bean 类名或标识符)
    pub fn enable_alternative(mut self, alternative: impl Into<String>) -> Self {
        self.alternatives.push(alternative.into());
        self
    }

    /// 使用显式配置
    pub fn with_configuration(mut self, configuration: WeldConfiguration) -> Self {
        self.configuration = ConfigurationSource::Explicit(configuration);
        self
    }

    /// 从 `weld.toml` 与 `WELD__*` 环境变量加载配置
    pub fn load_configuration(mut self) -> Self {
        if !matches!(self.configuration, ConfigurationSource::Loaded(_)) {
            self.configuration = ConfigurationSource::Loaded(ConfigurationLoader::new());
        }
        self
    }

    /// 使用自定义的配置加载器
    pub fn with_configuration_loader(mut self, loader: ConfigurationLoader) -> Self {
        self.configuration = ConfigurationSource::Loaded(loader);
        self
    }

    /// 追加配置文件, 覆盖默认来源中的同名键
    pub fn add_config_file(mut self, path: impl AsRef<Path>) -> Self {
        let loader = match self.configuration {
            ConfigurationSource::Loaded(loader) => loader,
            _ => ConfigurationLoader::new(),
        };
        self.configuration = ConfigurationSource::Loaded(loader.add_file(path));
        self
    }

    /// 启动时初始化日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self.logging_from_configuration = false;
        self
    }

    /// 启动时按配置中的 `logging.*` 初始化日志
    pub fn with_configured_logging(mut self) -> Self {
        self.logging = None;
        self.logging_from_configuration = true;
        self
    }

    /// 启动容器
    pub fn initialize(self) -> WeldResult<WeldContainer> {
        // 第一步：确定配置
        let mut configuration = match self.configuration {
            ConfigurationSource::Defaults => WeldConfiguration::default(),
            ConfigurationSource::Explicit(configuration) => configuration,
            ConfigurationSource::Loaded(loader) => loader.load()?,
        };
        configuration.alternatives.enabled.extend(self.alternatives);
        weld_config::validate(&configuration)?;

        // 第二步：日志
        let logging = if self.logging_from_configuration {
            Some(LoggingConfig::from_settings(&configuration.logging)?)
        } else {
            self.logging
        };
        if let Some(logging) = logging {
            logging.try_init()?;
        }

        // 第三步：组装部署
        let container_id = self
            .container_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info!("初始化 Weld SE 容器: {}", container_id);
        let mut deployment = Deployment::new(container_id)
            .with_configuration(configuration)
            .with_hierarchy(self.hierarchy);

        if !self.beans.is_empty() || !self.observers.is_empty() || !self.interceptors.is_empty() {
            debug!(
                "合成归档: {} 个 Bean, {} 个观察者, {} 个拦截器",
                self.beans.len(),
                self.observers.len(),
                self.interceptors.len()
            );
            let mut synthetic = BeanDeploymentArchive::new(SYNTHETIC_ARCHIVE_ID, BeansXml::all());
            for bean in self.beans {
                synthetic = synthetic.add_bean(bean);
            }
            for observer in self.observers {
                synthetic = synthetic.add_observer(observer);
            }
            for interceptor in self.interceptors {
                synthetic = synthetic.add_interceptor(interceptor);
            }
            deployment = deployment.add_archive(synthetic);
        }
        for archive in self.archives {
            deployment = deployment.add_archive(archive);
        }
        for extension in self.extensions {
            deployment = deployment.add_extension(extension);
        }

        // 第四步：启动
        let manager = WeldBootstrap::start(deployment)?;
        Ok(WeldContainer::from(manager))
    }
}

impl std::fmt::Debug for Weld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Weld")
            .field("container_id", &self.container_id)
            .field("beans", &self.beans.len())
            .field("observers", &self.observers.len())
            .field("interceptors", &self.interceptors.len())
            .field("archives", &self.archives.len())
            .field("extensions", &self.extensions.len())
            .field("alternatives", &self.alternatives)
            .field("configuration", &self.configuration)
            .finish()
    }
}
