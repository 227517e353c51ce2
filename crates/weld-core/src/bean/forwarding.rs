//! 特化后的 Bean
//!
//! 特化 Bean 继承被特化 Bean 的限定符与名称; 其余属性与实例的创建、销毁都转发给原 Bean。

use std::fmt;
use std::sync::Arc;
use weld_common::WeldError;
use weld_spi::{
    Bean, BeanIdentifier, BeanInstance, BeanType, Contextual, CreationalContext, InjectionPoint,
    Qualifier, Scope,
};

/// 合并了被特化 Bean 属性的特化 Bean
pub struct SpecializedBean {
    delegate: Arc<dyn Bean>,
    qualifiers: Vec<Qualifier>,
    name: Option<String>,
}

impl SpecializedBean {
    /// 合并特化链上全部被特化 Bean 的限定符与名称
    pub fn new(delegate: Arc<dyn Bean>, specialized: &[Arc<dyn Bean>]) -> Self {
        let mut qualifiers = delegate.qualifiers().to_vec();
        let mut name = delegate.name().map(ToString::to_string);
        for bean in specialized {
            for qualifier in bean.qualifiers() {
                if !qualifiers.contains(qualifier) {
                    qualifiers.push(qualifier.clone());
                }
            }
            if name.is_none() {
                name = bean.name().map(ToString::to_string);
            }
        }
        Self {
            delegate,
            qualifiers,
            name,
        }
    }

    /// 原 Bean
    pub fn delegate(&self) -> &Arc<dyn Bean> {
        &self.delegate
    }
}

impl Contextual for SpecializedBean {
    fn id(&self) -> &BeanIdentifier {
        self.delegate.id()
    }

    fn create(&self, creational_context: &CreationalContext) -> Result<BeanInstance, WeldError> {
        self.delegate.create(creational_context)
    }

    fn destroy(&self, instance: BeanInstance, creational_context: &CreationalContext) {
        self.delegate.destroy(instance, creational_context);
    }
}

impl Bean for SpecializedBean {
    fn bean_class(&self) -> &str {
        self.delegate.bean_class()
    }

    fn types(&self) -> &[BeanType] {
        self.delegate.types()
    }

    fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }

    fn scope(&self) -> &Scope {
        self.delegate.scope()
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn is_alternative(&self) -> bool {
        self.delegate.is_alternative()
    }

    fn priority(&self) -> Option<i32> {
        self.delegate.priority()
    }

    fn specializes(&self) -> Option<&BeanIdentifier> {
        self.delegate.specializes()
    }

    fn injection_points(&self) -> &[InjectionPoint] {
        self.delegate.injection_points()
    }

    fn interceptor_bindings(&self) -> &[Qualifier] {
        self.delegate.interceptor_bindings()
    }

    fn has_explicit_scope(&self) -> bool {
        self.delegate.has_explicit_scope()
    }
}

impl fmt::Debug for SpecializedBean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecializedBean")
            .field("id", self.delegate.id())
            .field("qualifiers", &self.qualifiers)
            .field("name", &self.name)
            .finish()
    }
}
