//! 观察者方法

use crate::bean::{BeanIdentifier, BeanInstance};
use crate::qualifier::Qualifier;
use crate::types::BeanType;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use weld_common::BoxError;

/// 观察者默认优先级
pub const DEFAULT_OBSERVER_PRIORITY: i32 = 2500;

/// 接收模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Reception {
    /// 必要时创建声明 Bean 的实例
    #[default]
    Always,
    /// 仅当声明 Bean 的上下文实例已存在时通知
    IfExists,
}

/// 事务阶段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TransactionPhase {
    #[default]
    InProgress,
    BeforeCompletion,
    AfterCompletion,
    AfterFailure,
    AfterSuccess,
}

/// 事件元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMetadata {
    /// 事件类型
    pub event_type: BeanType,
    /// 事件限定符 (含 `@Any`)
    pub qualifiers: Vec<Qualifier>,
}

/// 单次通知的上下文
pub struct EventContext<'a> {
    event: &'a (dyn Any + Send + Sync),
    metadata: &'a EventMetadata,
    receiver: Option<BeanInstance>,
}

impl<'a> EventContext<'a> {
    /// 创建通知上下文
    pub fn new(event: &'a (dyn Any + Send + Sync), metadata: &'a EventMetadata) -> Self {
        Self {
            event,
            metadata,
            receiver: None,
        }
    }

    /// 设置接收者实例
    pub fn with_receiver(mut self, receiver: BeanInstance) -> Self {
        self.receiver = Some(receiver);
        self
    }

    /// 事件负载
    pub fn event(&self) -> &(dyn Any + Send + Sync) {
        self.event
    }

    /// 按具体类型读取事件负载
    pub fn event_as<E: Any>(&self) -> Option<&E> {
        self.event.downcast_ref::<E>()
    }

    /// 事件元数据
    pub fn metadata(&self) -> &EventMetadata {
        self.metadata
    }

    /// 接收者实例
    pub fn receiver(&self) -> Option<&BeanInstance> {
        self.receiver.as_ref()
    }

    /// 按具体类型读取接收者
    pub fn receiver_as<R: Any + Send + Sync>(&self) -> Option<Arc<R>> {
        self.receiver.clone().and_then(|r| r.downcast::<R>().ok())
    }
}

/// 观察者方法
pub trait ObserverMethod: Send + Sync + fmt::Debug {
    /// 观察者描述
    fn id(&self) -> &str;

    /// 观察的类型
    fn observed_type(&self) -> &BeanType;

    /// 观察的限定符
    fn observed_qualifiers(&self) -> &[Qualifier];

    /// 声明观察者的 Bean; 静态注册的观察者为 `None`
    fn declaring_bean(&self) -> Option<&BeanIdentifier> {
        None
    }

    /// 优先级, 数值小者先调用
    fn priority(&self) -> i32 {
        DEFAULT_OBSERVER_PRIORITY
    }

    /// 接收模式
    fn reception(&self) -> Reception {
        Reception::Always
    }

    /// 事务阶段
    fn transaction_phase(&self) -> TransactionPhase {
        TransactionPhase::InProgress
    }

    /// 是否为异步观察者
    fn is_async(&self) -> bool {
        false
    }

    /// 通知观察者
    fn notify(&self, context: &EventContext<'_>) -> Result<(), BoxError>;
}
