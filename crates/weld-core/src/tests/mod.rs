//! weld-core 单元测试

mod event_tests;

use crate::bootstrap::{Deployment, WeldBootstrap};
use crate::manager::BeanManager;
use uuid::Uuid;
use weld_common::WeldConfiguration;
use weld_spi::{BeanDeploymentArchive, BeansXml};

/// 以 `All` 模式的空归档开始
pub(crate) fn archive() -> BeanDeploymentArchive {
    BeanDeploymentArchive::new("unit-test", BeansXml::all())
}

/// 带唯一容器 ID 的部署
pub(crate) fn deployment() -> Deployment {
    Deployment::new(format!("unit-{}", Uuid::new_v4()))
        .with_configuration(WeldConfiguration::default().with_thread_pool_size(2))
}

/// 启动只包含一个归档的容器
pub(crate) fn start(archive: BeanDeploymentArchive) -> BeanManager {
    WeldBootstrap::start(deployment().add_archive(archive)).expect("容器启动失败")
}
