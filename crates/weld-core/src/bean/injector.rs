//! 实例工厂的注入入口

use crate::event::Event;
use crate::instance::Instance;
use crate::manager::BeanManager;
use crate::proxy::Reference;
use std::any::Any;
use std::sync::Arc;
use weld_common::WeldError;
use weld_spi::{BeanContainer, BeanType, CreationalContext, Qualifier};

/// 传给实例工厂的注入器
///
/// 解析得到的伪作用域依赖在正在创建的 Bean 的创建上下文中创建,
/// 随该 Bean 一起销毁。
#[derive(Debug, Clone)]
pub struct Injector {
    creational_context: CreationalContext,
}

impl Injector {
    /// 包装正在创建的 Bean 的创建上下文
    pub fn new(creational_context: CreationalContext) -> Self {
        Self { creational_context }
    }

    /// 正在创建的 Bean 的创建上下文
    pub fn creational_context(&self) -> &CreationalContext {
        &self.creational_context
    }

    /// 所属容器
    pub fn container(&self) -> Result<Arc<dyn BeanContainer>, WeldError> {
        self.creational_context.container()
    }

    /// 注入 `T` 的唯一 Bean
    pub fn get<T: Any + Send + Sync>(&self, qualifiers: &[Qualifier]) -> Result<Reference<T>, WeldError> {
        self.get_type(&BeanType::of::<T>(), qualifiers)
    }

    /// 以显式的需求类型注入, 实例必须能转换为 `T`
    pub fn get_type<T: Any + Send + Sync>(
        &self,
        required: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<Reference<T>, WeldError> {
        let container = self.container()?;
        let bean = container
            .resolve(required, qualifiers)?
            .into_unique(required, qualifiers)?;
        Reference::obtain(&container, bean, &self.creational_context)
    }

    /// 注入 `T` 的编程式查找句柄
    pub fn instance<T: Any + Send + Sync>(&self) -> Result<Instance<T>, WeldError> {
        Ok(Instance::new(
            self.container()?,
            BeanType::of::<T>(),
            Vec::new(),
            self.creational_context.clone(),
        ))
    }

    /// 以给定限定符注入编程式查找句柄
    pub fn select<T: Any + Send + Sync>(&self, qualifiers: &[Qualifier]) -> Result<Instance<T>, WeldError> {
        Ok(self.instance::<T>()?.select(qualifiers))
    }

    /// 注入 `E` 的事件句柄
    pub fn event<E: Any + Send + Sync>(&self) -> Result<Event<E>, WeldError> {
        Ok(BeanManager::from_container(&self.container()?)?.event::<E>())
    }
}
