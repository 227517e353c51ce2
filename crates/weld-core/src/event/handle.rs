//! 注入的事件句柄

use super::executor::AsyncEventDelivery;
use crate::manager::BeanManager;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use weld_common::WeldError;
use weld_spi::{BeanType, Qualifier};

/// `E` 类型事件的触发句柄
pub struct Event<E> {
    manager: BeanManager,
    event_type: BeanType,
    qualifiers: Vec<Qualifier>,
    _marker: PhantomData<fn(E)>,
}

impl<E: Any + Send + Sync> Event<E> {
    /// 创建句柄
    pub fn new(manager: BeanManager, event_type: BeanType, qualifiers: Vec<Qualifier>) -> Self {
        Self {
            manager,
            event_type,
            qualifiers,
            _marker: PhantomData,
        }
    }

    /// 追加限定符得到子句柄
    pub fn select(&self, qualifiers: &[Qualifier]) -> Self {
        let mut merged = self.qualifiers.clone();
        for qualifier in qualifiers {
            if !merged.contains(qualifier) {
                merged.push(qualifier.clone());
            }
        }
        Self::new(self.manager.clone(), self.event_type.clone(), merged)
    }

    /// 以显式的事件类型触发 (例如参数化类型)
    pub fn with_type(&self, event_type: BeanType) -> Self {
        Self::new(self.manager.clone(), event_type, self.qualifiers.clone())
    }

    /// 事件类型
    pub fn event_type(&self) -> &BeanType {
        &self.event_type
    }

    /// 同步触发
    pub fn fire(&self, event: &E) -> Result<(), WeldError> {
        self.manager
            .fire_typed(event, &self.event_type, &self.qualifiers)
    }

    /// 异步触发, 立即返回投递句柄
    pub fn fire_async(&self, event: E) -> Result<AsyncEventDelivery, WeldError> {
        self.manager
            .fire_async_typed(Arc::new(event), &self.event_type, &self.qualifiers)
    }
}

impl<E> Clone for Event<E> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            event_type: self.event_type.clone(),
            qualifiers: self.qualifiers.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Event<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("container", &self.manager.id())
            .field("event_type", &self.event_type)
            .field("qualifiers", &self.qualifiers)
            .finish()
    }
}
