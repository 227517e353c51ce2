//! SE 容器句柄

use std::any::Any;
use tracing::info;
use weld_common::{WeldConfiguration, WeldResult};
use weld_core::{
    registry, ActivationGuard, AsyncEventDelivery, BeanManager, Event, Instance, Reference,
};
use weld_spi::Qualifier;

/// 运行中的 Weld 容器
///
/// 句柄可以廉价克隆; 关闭后所有克隆共享已关闭状态。
#[derive(Clone)]
pub struct WeldContainer {
    manager: BeanManager,
}

impl From<BeanManager> for WeldContainer {
    fn from(manager: BeanManager) -> Self {
        Self { manager }
    }
}

impl WeldContainer {
    /// 唯一运行中的容器
    ///
    /// 没有容器时返回 `NoContainer`, 多于一个时返回 `MultipleContainers`。
    pub fn current() -> WeldResult<Self> {
        registry::current().map(Self::from)
    }

    /// 按 ID 查找运行中的容器
    pub fn instance(id: &str) -> WeldResult<Self> {
        registry::instance(id).map(Self::from)
    }

    /// 已注册容器的 ID
    pub fn running_container_ids() -> Vec<String> {
        registry::ids()
    }

    /// 容器 ID
    pub fn id(&self) -> &str {
        self.manager.id()
    }

    /// Bean 管理器
    pub fn bean_manager(&self) -> &BeanManager {
        &self.manager
    }

    /// 容器配置
    pub fn configuration(&self) -> &WeldConfiguration {
        self.manager.configuration()
    }

    /// 是否运行中
    pub fn is_running(&self) -> bool {
        self.manager.is_running()
    }

    /// 按类型与限定符选择 Bean
    pub fn select<T: Any + Send + Sync>(&self, qualifiers: &[Qualifier]) -> Instance<T> {
        self.manager.select(qualifiers)
    }

    /// 解析唯一 Bean 并返回注入引用
    pub fn reference<T: Any + Send + Sync>(
        &self,
        qualifiers: &[Qualifier],
    ) -> WeldResult<Reference<T>> {
        self.manager.reference(qualifiers)
    }

    /// 事件句柄
    pub fn event<E: Any + Send + Sync>(&self) -> Event<E> {
        self.manager.event()
    }

    /// 同步触发事件
    pub fn fire<E: Any + Send + Sync>(
        &self,
        event: &E,
        qualifiers: &[Qualifier],
    ) -> WeldResult<()> {
        self.manager.fire(event, qualifiers)
    }

    /// 异步触发事件
    pub fn fire_async<E: Any + Send + Sync>(
        &self,
        event: E,
        qualifiers: &[Qualifier],
    ) -> WeldResult<AsyncEventDelivery> {
        self.manager.fire_async(event, qualifiers)
    }

    /// 在当前线程激活请求上下文, 守卫释放时销毁请求内实例
    pub fn activate_request(&self) -> ActivationGuard {
        self.manager.request_context().activate_scoped()
    }

    /// 关闭容器, 重复调用无副作用
    pub fn shutdown(&self) {
        if self.manager.is_running() {
            info!("关闭 Weld SE 容器: {}", self.id());
        }
        self.manager.shutdown();
    }
}

impl std::fmt::Debug for WeldContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeldContainer")
            .field("id", &self.id())
            .field("state", &self.manager.state())
            .finish()
    }
}
