//! 客户端代理
//!
//! 正常作用域 Bean 的注入引用。代理本身只持有 Bean 与容器的弱引用,
//! 每次调用都经过 容器 -> 作用域上下文 -> 读取或创建 的查找, 再经拦截链转发到实例。

use super::interception::invoke_intercepted;
use crate::registry;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::any::{type_name, Any};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::{Arc, Weak};
use weld_common::{ContainerError, ResolutionError, WeldError};
use weld_spi::{Bean, BeanContainer, BeanIdentifier, BeanInstance, Qualifier};

/// 客户端代理
pub struct ClientProxy<T> {
    bean: Arc<dyn Bean>,
    container: Weak<dyn BeanContainer>,
    container_id: Arc<str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ClientProxy<T> {
    /// 为 Bean 创建代理
    pub fn new(container: &Arc<dyn BeanContainer>, bean: Arc<dyn Bean>) -> Self {
        Self {
            bean,
            container: Arc::downgrade(container),
            container_id: Arc::from(container.id()),
            _marker: PhantomData,
        }
    }

    /// 代理的 Bean
    pub fn bean(&self) -> &Arc<dyn Bean> {
        &self.bean
    }

    /// 所属容器 ID
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// 可序列化的代理句柄
    pub fn handle(&self) -> ProxyHandle {
        ProxyHandle {
            container_id: self.container_id.to_string(),
            bean_id: self.bean.id().clone(),
            qualifiers: self.bean.qualifiers().to_vec(),
        }
    }

    /// 查找当前的上下文实例, 不存在时创建
    pub fn instance(&self) -> Result<Arc<T>, WeldError> {
        let container = self.container()?;
        let instance = self.contextual_instance(container.as_ref())?;
        downcast_instance(&self.bean, instance)
    }

    /// 经拦截链调用实例上的方法
    pub fn invoke<R, F>(&self, method: &str, call: F) -> Result<R, WeldError>
    where
        R: Send + 'static,
        F: FnOnce(&T) -> R,
    {
        let container = self.container()?;
        let instance = self.contextual_instance(container.as_ref())?;
        let target = downcast_instance::<T>(&self.bean, instance)?;
        let chain = container.interceptors_for(self.bean.as_ref());
        invoke_intercepted(method, self.bean.as_ref(), target.as_ref(), &chain, call)
    }

    fn container(&self) -> Result<Arc<dyn BeanContainer>, WeldError> {
        let unavailable = || ContainerError::Unavailable {
            id: self.container_id.to_string(),
        };
        let container = self.container.upgrade().ok_or_else(unavailable)?;
        if !container.is_running() {
            return Err(unavailable().into());
        }
        if container.bean(self.bean.id()).is_none() {
            return Err(ResolutionError::BeanNotFound {
                bean: self.bean.id().to_string(),
            }
            .into());
        }
        Ok(container)
    }

    fn contextual_instance(&self, container: &dyn BeanContainer) -> Result<BeanInstance, WeldError> {
        let context = container.context(self.bean.scope())?;
        if let Some(instance) = context.get(&self.bean, None)? {
            return Ok(instance);
        }
        let creational_context = container.create_creational_context(Some(self.bean.id()));
        context
            .get(&self.bean, Some(&creational_context))?
            .ok_or_else(|| {
                ResolutionError::BeanNotFound {
                    bean: self.bean.id().to_string(),
                }
                .into()
            })
    }
}

/// 把类型擦除的实例转换为具体类型
pub(crate) fn downcast_instance<T: Any + Send + Sync>(
    bean: &Arc<dyn Bean>,
    instance: BeanInstance,
) -> Result<Arc<T>, WeldError> {
    instance.downcast::<T>().map_err(|_| {
        ResolutionError::TypeMismatch {
            bean: bean.id().to_string(),
            expected: type_name::<T>().to_string(),
        }
        .into()
    })
}

impl<T> Clone for ClientProxy<T> {
    fn clone(&self) -> Self {
        Self {
            bean: Arc::clone(&self.bean),
            container: Weak::clone(&self.container),
            container_id: Arc::clone(&self.container_id),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for ClientProxy<T> {
    fn eq(&self, other: &Self) -> bool {
        self.container_id == other.container_id && self.bean.id() == other.bean.id()
    }
}

impl<T> Eq for ClientProxy<T> {}

impl<T> Hash for ClientProxy<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.container_id.hash(state);
        self.bean.id().hash(state);
    }
}

impl<T> fmt::Debug for ClientProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientProxy")
            .field("container", &self.container_id)
            .field("bean", self.bean.id())
            .field("scope", self.bean.scope())
            .finish()
    }
}

impl<T> fmt::Display for ClientProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "客户端代理 {} @ {}", self.bean.id(), self.container_id)
    }
}

impl<T: Any + Send + Sync> Serialize for ClientProxy<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.handle().serialize(serializer)
    }
}

impl<'de, T: Any + Send + Sync> Deserialize<'de> for ClientProxy<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let handle = ProxyHandle::deserialize(deserializer)?;
        handle.resolve().map_err(serde::de::Error::custom)
    }
}

/// 代理句柄: 重新绑定代理所需的最少信息, 不包含实例本身
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyHandle {
    /// 容器 ID
    pub container_id: String,
    /// Bean 标识符
    pub bean_id: BeanIdentifier,
    /// Bean 的限定符
    pub qualifiers: Vec<Qualifier>,
}

impl ProxyHandle {
    /// 通过容器注册表重新绑定为代理
    pub fn resolve<T: Any + Send + Sync>(&self) -> Result<ClientProxy<T>, WeldError> {
        let manager = registry::instance(&self.container_id)?;
        let container = manager.container();
        let bean = container
            .bean(&self.bean_id)
            .ok_or_else(|| ResolutionError::BeanNotFound {
                bean: self.bean_id.to_string(),
            })?;
        Ok(ClientProxy::new(&container, bean))
    }
}
