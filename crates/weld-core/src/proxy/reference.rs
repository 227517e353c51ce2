//! 注入引用

use super::client::{downcast_instance, ClientProxy};
use super::interception::invoke_intercepted;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use weld_common::{ResolutionError, WeldError};
use weld_spi::{Bean, BeanContainer, CreationalContext, Interceptor};

/// 对 Bean 的引用: 正常作用域为客户端代理, 伪作用域为实例本身
pub enum Reference<T> {
    /// 客户端代理
    Proxy(ClientProxy<T>),
    /// 直接实例
    Direct {
        /// 所属 Bean
        bean: Arc<dyn Bean>,
        /// 实例
        instance: Arc<T>,
        /// 绑定的拦截器链
        interceptors: Arc<[Arc<dyn Interceptor>]>,
    },
}

impl<T: Any + Send + Sync> Reference<T> {
    /// 为 Bean 获取引用; 伪作用域的实例在给定创建上下文中创建
    pub fn obtain(
        container: &Arc<dyn BeanContainer>,
        bean: Arc<dyn Bean>,
        creational_context: &CreationalContext,
    ) -> Result<Self, WeldError> {
        if bean.scope().is_normal() {
            return Ok(Self::Proxy(ClientProxy::new(container, bean)));
        }
        let context = container.context(bean.scope())?;
        // 共享的伪作用域实例有自己的根创建上下文, 不随请求方销毁
        let owned;
        let creational_context = if bean.scope().is_dependent() {
            creational_context
        } else {
            owned = container.create_creational_context(Some(bean.id()));
            &owned
        };
        let instance = context
            .get(&bean, Some(creational_context))?
            .ok_or_else(|| ResolutionError::BeanNotFound {
                bean: bean.id().to_string(),
            })?;
        let instance = downcast_instance::<T>(&bean, instance)?;
        let interceptors = container.interceptors_for(bean.as_ref()).into();
        Ok(Self::Direct {
            bean,
            instance,
            interceptors,
        })
    }

    /// 引用的 Bean
    pub fn bean(&self) -> &Arc<dyn Bean> {
        match self {
            Self::Proxy(proxy) => proxy.bean(),
            Self::Direct { bean, .. } => bean,
        }
    }

    /// 是否为客户端代理
    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy(_))
    }

    /// 客户端代理
    pub fn as_proxy(&self) -> Option<&ClientProxy<T>> {
        match self {
            Self::Proxy(proxy) => Some(proxy),
            Self::Direct { .. } => None,
        }
    }

    /// 当前的实例; 代理每次都重新查找
    pub fn get(&self) -> Result<Arc<T>, WeldError> {
        match self {
            Self::Proxy(proxy) => proxy.instance(),
            Self::Direct { instance, .. } => Ok(Arc::clone(instance)),
        }
    }

    /// 经拦截链调用实例上的方法
    pub fn invoke<R, F>(&self, method: &str, call: F) -> Result<R, WeldError>
    where
        R: Send + 'static,
        F: FnOnce(&T) -> R,
    {
        match self {
            Self::Proxy(proxy) => proxy.invoke(method, call),
            Self::Direct {
                bean,
                instance,
                interceptors,
            } => invoke_intercepted(method, bean.as_ref(), instance.as_ref(), interceptors, call),
        }
    }
}

impl<T> Clone for Reference<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Proxy(proxy) => Self::Proxy(proxy.clone()),
            Self::Direct {
                bean,
                instance,
                interceptors,
            } => Self::Direct {
                bean: Arc::clone(bean),
                instance: Arc::clone(instance),
                interceptors: Arc::clone(interceptors),
            },
        }
    }
}

impl<T> fmt::Debug for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proxy(proxy) => f.debug_tuple("Reference::Proxy").field(proxy).finish(),
            Self::Direct { bean, .. } => f
                .debug_struct("Reference::Direct")
                .field("bean", bean.id())
                .finish_non_exhaustive(),
        }
    }
}
