//! # Weld Core
//!
//! 上下文与依赖注入容器的核心实现。
//!
//! ## 核心组件
//!
//! - [`TypeSafeBeanResolver`] - 按类型与限定符解析 Bean, 结果缓存
//! - [`TypeSafeObserverResolver`] - 按事件类型与限定符解析观察者
//! - [`contexts`] - 内置作用域上下文 (依赖、应用、单例、请求、会话、对话)
//! - [`ClientProxy`] / [`Reference`] - 注入引用与拦截链
//! - [`BeanManager`] - 启动后的容器入口
//! - [`WeldBootstrap`] - 分阶段启动与部署校验
//! - [`registry`] - 进程级容器注册表

pub mod bean;
pub mod bootstrap;
pub mod contexts;
pub mod event;
pub mod instance;
pub mod manager;
pub mod proxy;
pub mod registry;
pub mod resolution;
pub mod util;

pub use bean::{BeanBuilder, Injector, ManagedBean, SpecializedBean};
pub use bootstrap::{Deployment, Validator, WeldBootstrap};
pub use contexts::{
    ActivationGuard, ConcurrentBeanStore, ConversationContext, ConversationInfo, DependentContext,
    LocalBeanStore, RequestContext, SessionContext, SharedContext,
};
pub use event::{AsyncEventDelivery, Event, ObserverBuilder};
pub use instance::Instance;
pub use manager::{BeanManager, ManagerParts, ScopeLifecycleEvent};
pub use proxy::{ClientProxy, InterceptorBuilder, ProxyHandle, Reference};
pub use resolution::{TypeHierarchy, TypeSafeBeanResolver, TypeSafeObserverResolver};

#[cfg(test)]
mod tests;
