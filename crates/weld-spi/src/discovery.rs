//! Bean 发现 SPI
//!
//! 类路径扫描由外部协作者完成, 它交给容器的是若干 Bean 部署归档:
//! 每个归档带有 `beans.xml` 等价元数据与已经构建好的 Bean 定义。

use crate::bean::Bean;
use crate::interceptor::Interceptor;
use crate::observer::ObserverMethod;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
pub use weld_common::BeanDiscoveryMode;

/// `beans.xml` 元数据
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeansXml {
    /// 发现模式
    pub discovery_mode: BeanDiscoveryMode,
    /// 在该归档内启用的备选 Bean 类名或标识符
    pub enabled_alternatives: Vec<String>,
    /// 排除的 Bean 类名 glob 模式
    pub excludes: Vec<String>,
}

impl BeansXml {
    /// 指定发现模式
    pub fn new(discovery_mode: BeanDiscoveryMode) -> Self {
        Self {
            discovery_mode,
            ..Self::default()
        }
    }

    /// `bean-discovery-mode="all"`
    pub fn all() -> Self {
        Self::new(BeanDiscoveryMode::All)
    }

    /// `bean-discovery-mode="annotated"`
    pub fn annotated() -> Self {
        Self::new(BeanDiscoveryMode::Annotated)
    }

    /// `bean-discovery-mode="none"`
    pub fn none() -> Self {
        Self::new(BeanDiscoveryMode::None)
    }

    /// 启用备选 Bean
    pub fn enable_alternative(mut self, alternative: impl Into<String>) -> Self {
        self.enabled_alternatives.push(alternative.into());
        self
    }

    /// 排除匹配的 Bean 类
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }
}

/// Bean 部署归档
pub struct BeanDeploymentArchive {
    id: String,
    beans_xml: BeansXml,
    beans: Vec<Arc<dyn Bean>>,
    observers: Vec<Arc<dyn ObserverMethod>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl BeanDeploymentArchive {
    /// 创建归档
    pub fn new(id: impl Into<String>, beans_xml: BeansXml) -> Self {
        Self {
            id: id.into(),
            beans_xml,
            beans: Vec::new(),
            observers: Vec::new(),
            interceptors: Vec::new(),
        }
    }

    /// 加入 Bean
    pub fn add_bean(mut self, bean: Arc<dyn Bean>) -> Self {
        self.beans.push(bean);
        self
    }

    /// 加入观察者
    pub fn add_observer(mut self, observer: Arc<dyn ObserverMethod>) -> Self {
        self.observers.push(observer);
        self
    }

    /// 加入拦截器
    pub fn add_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// 归档 ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// `beans.xml` 元数据
    pub fn beans_xml(&self) -> &BeansXml {
        &self.beans_xml
    }

    /// 归档内的 Bean
    pub fn beans(&self) -> &[Arc<dyn Bean>] {
        &self.beans
    }

    /// 归档内的观察者
    pub fn observers(&self) -> &[Arc<dyn ObserverMethod>] {
        &self.observers
    }

    /// 归档内的拦截器
    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }
}

impl fmt::Debug for BeanDeploymentArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDeploymentArchive")
            .field("id", &self.id)
            .field("beans_xml", &self.beans_xml)
            .field("beans", &self.beans.len())
            .field("observers", &self.observers.len())
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}
