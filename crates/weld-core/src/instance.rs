//! 编程式查找
//!
//! `Instance<T>` 保存需求类型与限定符, 每次调用时重新解析。
//! 伪作用域的实例在句柄的创建上下文中创建, 可以通过 [`Instance::destroy`] 提前销毁。

use crate::proxy::Reference;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;
use weld_common::WeldError;
use weld_spi::{Bean, BeanContainer, BeanInstance, BeanType, CreationalContext, Qualifier, ResolutionOutcome};

/// 编程式查找句柄
pub struct Instance<T> {
    container: Arc<dyn BeanContainer>,
    required: BeanType,
    qualifiers: Vec<Qualifier>,
    creational_context: CreationalContext,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Instance<T> {
    /// 创建句柄
    pub fn new(
        container: Arc<dyn BeanContainer>,
        required: BeanType,
        qualifiers: Vec<Qualifier>,
        creational_context: CreationalContext,
    ) -> Self {
        Self {
            container,
            required,
            qualifiers,
            creational_context,
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
        Self::new(
            Arc::clone(&self.container),
            self.required.clone(),
            merged,
            self.creational_context.clone(),
        )
    }

    /// 改用显式的需求类型 (例如参数化类型), 实例仍转换为 `T`
    pub fn with_type(&self, required: BeanType) -> Self {
        Self::new(
            Arc::clone(&self.container),
            required,
            self.qualifiers.clone(),
            self.creational_context.clone(),
        )
    }

    /// 需求类型
    pub fn required_type(&self) -> &BeanType {
        &self.required
    }

    /// 需求限定符
    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }

    /// 解析
    pub fn resolve(&self) -> Result<ResolutionOutcome, WeldError> {
        self.container.resolve(&self.required, &self.qualifiers)
    }

    /// 没有匹配的 Bean
    pub fn is_unsatisfied(&self) -> bool {
        self.resolve().map_or(true, |outcome| outcome.is_unsatisfied())
    }

    /// 有多个匹配的 Bean
    pub fn is_ambiguous(&self) -> bool {
        self.resolve().map_or(false, |outcome| outcome.is_ambiguous())
    }

    /// 恰好一个匹配的 Bean
    pub fn is_resolvable(&self) -> bool {
        self.resolve().map_or(false, |outcome| outcome.is_unique())
    }

    /// 唯一 Bean 的引用
    pub fn get(&self) -> Result<Reference<T>, WeldError> {
        let bean = self
            .resolve()?
            .into_unique(&self.required, &self.qualifiers)?;
        Reference::obtain(&self.container, bean, &self.creational_context)
    }

    /// 全部匹配 Bean 的引用, 包括歧义消解会淘汰的 Bean
    pub fn all(&self) -> Result<Vec<Reference<T>>, WeldError> {
        self.container
            .candidates(&self.required, &self.qualifiers)?
            .into_iter()
            .map(|bean| Reference::obtain(&self.container, bean, &self.creational_context))
            .collect()
    }

    /// 销毁通过该句柄取得的实例
    ///
    /// 正常作用域销毁上下文中的当前实例; 依赖作用域从句柄的创建上下文中销毁。
    pub fn destroy(&self, reference: &Reference<T>) -> Result<(), WeldError> {
        match reference {
            Reference::Proxy(proxy) => {
                let bean = proxy.bean();
                let context = self.container.context(bean.scope())?;
                let destroyed = context.destroy(bean.as_ref())?;
                debug!("销毁 {} 的上下文实例: {}", bean.id(), destroyed);
                Ok(())
            }
            Reference::Direct { bean, instance, .. } => {
                if bean.scope().is_dependent() {
                    let instance: BeanInstance = Arc::clone(instance) as BeanInstance;
                    let destroyed = self.creational_context.destroy_dependent_instance(&instance);
                    debug!("销毁依赖实例 {}: {}", bean.id(), destroyed);
                    Ok(())
                } else {
                    let context = self.container.context(bean.scope())?;
                    context.destroy(bean.as_ref()).map(|_| ())
                }
            }
        }
    }

    /// 匹配的 Bean 定义
    pub fn beans(&self) -> Result<Vec<Arc<dyn Bean>>, WeldError> {
        self.container.candidates(&self.required, &self.qualifiers)
    }
}

impl<T> Clone for Instance<T> {
    fn clone(&self) -> Self {
        Self {
            container: Arc::clone(&self.container),
            required: self.required.clone(),
            qualifiers: self.qualifiers.clone(),
            creational_context: self.creational_context.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Instance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("container", &self.container.id())
            .field("required", &self.required)
            .field("qualifiers", &self.qualifiers)
            .finish()
    }
}
