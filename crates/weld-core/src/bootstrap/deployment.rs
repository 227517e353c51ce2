//! 部署描述
//!
//! 一次启动的全部输入: 部署归档、扩展、类型层次与配置。

use crate::resolution::TypeHierarchy;
use std::fmt;
use std::sync::Arc;
use weld_common::WeldConfiguration;
use weld_spi::{BeanDeploymentArchive, Extension};

/// 部署
pub struct Deployment {
    container_id: String,
    archives: Vec<BeanDeploymentArchive>,
    extensions: Vec<Arc<dyn Extension>>,
    hierarchy: TypeHierarchy,
    configuration: WeldConfiguration,
}

impl Deployment {
    /// 以容器 ID 创建空部署
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            archives: Vec::new(),
            extensions: Vec::new(),
            hierarchy: TypeHierarchy::new(),
            configuration: WeldConfiguration::default(),
        }
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

    /// 类型层次
    pub fn with_hierarchy(mut self, hierarchy: TypeHierarchy) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    /// 配置
    pub fn with_configuration(mut self, configuration: WeldConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    /// 容器 ID
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// 部署归档
    pub fn archives(&self) -> &[BeanDeploymentArchive] {
        &self.archives
    }

    /// 配置
    pub fn configuration(&self) -> &WeldConfiguration {
        &self.configuration
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        String,
        Vec<BeanDeploymentArchive>,
        Vec<Arc<dyn Extension>>,
        TypeHierarchy,
        WeldConfiguration,
    ) {
        (
            self.container_id,
            self.archives,
            self.extensions,
            self.hierarchy,
            self.configuration,
        )
    }
}

impl fmt::Debug for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployment")
            .field("container_id", &self.container_id)
            .field("archives", &self.archives)
            .field("extensions", &self.extensions.len())
            .field("types", &self.hierarchy.len())
            .finish()
    }
}
