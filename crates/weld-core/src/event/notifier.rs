//! 观察者通知
//!
//! 同步事件在触发线程上按优先级依次通知; 每个观察者的失败被隔离收集,
//! 全部观察者执行完后, 第一个失败作为主异常抛出, 其余作为被抑制异常。

use super::executor::{AsyncEventDelivery, AsyncExecutor};
use crate::resolution::{ResolvedObservers, TypeSafeObserverResolver};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, error, warn};
use weld_common::{ObserverException, ObserverFailure, ResolutionError, WeldError};
use weld_spi::{
    BeanContainer, BeanInstance, BeanType, CreationalContext, EventContext, EventMetadata,
    ObserverMethod, Qualifier, Reception,
};

/// 观察者通知器
pub struct ObserverNotifier {
    resolver: TypeSafeObserverResolver,
    executor: AsyncExecutor,
}

impl ObserverNotifier {
    /// 创建通知器
    pub fn new(resolver: TypeSafeObserverResolver, executor: AsyncExecutor) -> Self {
        Self { resolver, executor }
    }

    /// 解析事件的全部观察者 (同步与异步)
    pub fn resolve(
        &self,
        event_type: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<ResolvedObservers, WeldError> {
        self.resolver.resolve(event_type, qualifiers)
    }

    /// 全部观察者
    pub fn observers(&self) -> &[Arc<dyn ObserverMethod>] {
        self.resolver.observers()
    }

    /// 同步通知
    pub fn notify_sync(
        &self,
        container: &dyn BeanContainer,
        event: &(dyn Any + Send + Sync),
        event_type: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<(), WeldError> {
        let observers = self.resolve(event_type, qualifiers)?;
        let metadata = metadata(event_type, qualifiers);
        let failures: Vec<ObserverFailure> = observers
            .iter()
            .filter(|observer| !observer.is_async())
            .filter_map(|observer| notify_observer(container, observer.as_ref(), event, &metadata).err())
            .collect();
        match ObserverException::from_failures(failures) {
            Some(exception) => {
                error!(
                    "事件 {} 分发完成, {} 个观察者失败",
                    event_type,
                    exception.failure_count()
                );
                Err(exception.into())
            }
            None => Ok(()),
        }
    }

    /// 异步通知, 立即返回投递句柄
    pub fn notify_async(
        &self,
        container: Arc<dyn BeanContainer>,
        event: Arc<dyn Any + Send + Sync>,
        event_type: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<AsyncEventDelivery, WeldError> {
        let observers = self.resolve(event_type, qualifiers)?;
        let metadata = Arc::new(metadata(event_type, qualifiers));
        let tasks: Vec<_> = observers
            .iter()
            .filter(|observer| observer.is_async())
            .map(|observer| {
                let observer = Arc::clone(observer);
                let container = Arc::clone(&container);
                let event = Arc::clone(&event);
                let metadata = Arc::clone(&metadata);
                let name = observer.id().to_string();
                let task = move || {
                    notify_observer(container.as_ref(), observer.as_ref(), event.as_ref(), &metadata)
                };
                (name, task)
            })
            .collect();
        debug!("异步事件 {} 投递给 {} 个观察者", event_type, tasks.len());
        Ok(self.executor.deliver(tasks))
    }

    /// 清空解析缓存
    pub fn clear(&self) {
        self.resolver.clear();
    }

    /// 停止异步执行器
    pub fn shutdown(&self) {
        self.executor.shutdown();
    }
}

fn metadata(event_type: &BeanType, qualifiers: &[Qualifier]) -> EventMetadata {
    let mut qualifiers = qualifiers.to_vec();
    if qualifiers.iter().all(Qualifier::is_any) {
        qualifiers.insert(0, Qualifier::default_qualifier());
    }
    if !qualifiers.iter().any(Qualifier::is_any) {
        qualifiers.push(Qualifier::any());
    }
    EventMetadata {
        event_type: event_type.clone(),
        qualifiers,
    }
}

enum Receiver {
    Static,
    Skip,
    Bean {
        instance: BeanInstance,
        dependent: Option<CreationalContext>,
    },
}

/// 通知单个观察者, 跳过视为成功
fn notify_observer(
    container: &dyn BeanContainer,
    observer: &dyn ObserverMethod,
    event: &(dyn Any + Send + Sync),
    metadata: &EventMetadata,
) -> Result<(), ObserverFailure> {
    let failure = |message: String| {
        warn!("观察者 {} 调用失败: {}", observer.id(), message);
        ObserverFailure {
            observer: observer.id().to_string(),
            message,
        }
    };

    let receiver = receiver(container, observer).map_err(|e| failure(e.to_string()))?;
    let (context, dependent) = match receiver {
        Receiver::Skip => {
            debug!("条件观察者 {} 没有现存实例, 跳过", observer.id());
            return Ok(());
        }
        Receiver::Static => (EventContext::new(event, metadata), None),
        Receiver::Bean {
            instance,
            dependent,
        } => (EventContext::new(event, metadata).with_receiver(instance), dependent),
    };

    let result = observer.notify(&context).map_err(|e| failure(e.to_string()));
    if let Some(dependent) = dependent {
        dependent.release();
    }
    result
}

/// 解析声明观察者的 Bean 的接收者实例
fn receiver(container: &dyn BeanContainer, observer: &dyn ObserverMethod) -> Result<Receiver, WeldError> {
    let Some(bean_id) = observer.declaring_bean() else {
        return Ok(Receiver::Static);
    };
    let bean = container.bean(bean_id).ok_or_else(|| ResolutionError::BeanNotFound {
        bean: bean_id.to_string(),
    })?;

    if observer.reception() == Reception::IfExists {
        let context = match container.context(bean.scope()) {
            Ok(context) => context,
            Err(e) if e.is_context_not_active() => return Ok(Receiver::Skip),
            Err(e) => return Err(e),
        };
        return Ok(match context.get(&bean, None)? {
            Some(instance) => Receiver::Bean {
                instance,
                dependent: None,
            },
            None => Receiver::Skip,
        });
    }

    let context = container.context(bean.scope())?;
    let dependent = bean.scope().is_dependent();
    if !dependent {
        if let Some(instance) = context.get(&bean, None)? {
            return Ok(Receiver::Bean {
                instance,
                dependent: None,
            });
        }
    }
    let creational_context = container.create_creational_context(Some(bean.id()));
    let instance = context
        .get(&bean, Some(&creational_context))?
        .ok_or_else(|| ResolutionError::BeanNotFound {
            bean: bean.id().to_string(),
        })?;
    Ok(Receiver::Bean {
        instance,
        dependent: dependent.then_some(creational_context),
    })
}
