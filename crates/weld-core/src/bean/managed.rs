//! 托管 Bean 与构建器

use super::injector::Injector;
use crate::resolution::{normalize_bean_qualifiers, TypeHierarchy};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use weld_common::{BoxError, WeldError};
use weld_spi::{
    AsQualifier, Bean, BeanIdentifier, BeanInstance, BeanType, Contextual, CreationalContext,
    InjectionPoint, Qualifier, Scope,
};

type Factory<T> = Arc<dyn Fn(&Injector) -> Result<Arc<T>, BoxError> + Send + Sync>;
type PostConstruct<T> = Arc<dyn Fn(&T) -> Result<(), BoxError> + Send + Sync>;
type PreDestroy<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// 托管 Bean
pub struct ManagedBean<T> {
    id: BeanIdentifier,
    bean_class: String,
    types: Vec<BeanType>,
    qualifiers: Vec<Qualifier>,
    scope: Scope,
    explicit_scope: bool,
    name: Option<String>,
    alternative: bool,
    priority: Option<i32>,
    specializes: Option<BeanIdentifier>,
    injection_points: Vec<InjectionPoint>,
    interceptor_bindings: Vec<Qualifier>,
    factory: Factory<T>,
    post_construct: Option<PostConstruct<T>>,
    pre_destroy: Option<PreDestroy<T>>,
}

impl<T: Any + Send + Sync> Contextual for ManagedBean<T> {
    fn id(&self) -> &BeanIdentifier {
        &self.id
    }

    fn create(&self, creational_context: &CreationalContext) -> Result<BeanInstance, WeldError> {
        let injector = Injector::new(creational_context.clone());
        let instance = match (self.factory)(&injector) {
            Ok(instance) => instance,
            Err(e) => {
                creational_context.release();
                return Err(WeldError::creation(self.id.as_str(), e));
            }
        };
        if let Some(post_construct) = &self.post_construct {
            if let Err(e) = post_construct(instance.as_ref()) {
                creational_context.release();
                return Err(WeldError::creation(self.id.as_str(), e));
            }
        }
        debug!("创建 Bean 实例: {}", self.id);
        Ok(instance as BeanInstance)
    }

    fn destroy(&self, instance: BeanInstance, creational_context: &CreationalContext) {
        match instance.downcast::<T>() {
            Ok(instance) => {
                if let Some(pre_destroy) = &self.pre_destroy {
                    pre_destroy(instance.as_ref());
                }
            }
            Err(_) => warn!("销毁 {} 时实例类型不匹配, 跳过销毁回调", self.id),
        }
        creational_context.release();
        debug!("销毁 Bean 实例: {}", self.id);
    }
}

impl<T: Any + Send + Sync> Bean for ManagedBean<T> {
    fn bean_class(&self) -> &str {
        &self.bean_class
    }

    fn types(&self) -> &[BeanType] {
        &self.types
    }

    fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }

    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn is_alternative(&self) -> bool {
        self.alternative
    }

    fn priority(&self) -> Option<i32> {
        self.priority
    }

    fn specializes(&self) -> Option<&BeanIdentifier> {
        self.specializes.as_ref()
    }

    fn injection_points(&self) -> &[InjectionPoint] {
        &self.injection_points
    }

    fn interceptor_bindings(&self) -> &[Qualifier] {
        &self.interceptor_bindings
    }

    fn has_explicit_scope(&self) -> bool {
        self.explicit_scope
    }
}

impl<T> fmt::Debug for ManagedBean<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedBean")
            .field("id", &self.id)
            .field("bean_class", &self.bean_class)
            .field("types", &self.types)
            .field("qualifiers", &self.qualifiers)
            .field("scope", &self.scope)
            .field("name", &self.name)
            .field("alternative", &self.alternative)
            .field("priority", &self.priority)
            .finish()
    }
}

/// 托管 Bean 构建器
///
/// ```ignore
/// let bean = BeanBuilder::<Greeter>::new()
///     .scope(Scope::APPLICATION)
///     .inject::<Clock>(&[])
///     .produce(|injector| {
///         let clock = injector.get::<Clock>(&[])?;
///         Ok(Greeter::new(clock))
///     })
///     .build();
/// ```
pub struct BeanBuilder<T> {
    id: Option<String>,
    bean_class: String,
    types: Vec<BeanType>,
    qualifiers: Vec<Qualifier>,
    scope: Scope,
    explicit_scope: bool,
    name: Option<String>,
    alternative: bool,
    priority: Option<i32>,
    specializes: Option<BeanIdentifier>,
    injection_points: Vec<InjectionPoint>,
    interceptor_bindings: Vec<Qualifier>,
    factory: Option<Factory<T>>,
    post_construct: Option<PostConstruct<T>>,
    pre_destroy: Option<PreDestroy<T>>,
}

impl<T: Any + Send + Sync> BeanBuilder<T> {
    /// 以 `T` 的类型名作为 Bean 类
    pub fn new() -> Self {
        Self {
            id: None,
            bean_class: type_name::<T>().to_string(),
            types: Vec::new(),
            qualifiers: Vec::new(),
            scope: Scope::DEPENDENT,
            explicit_scope: false,
            name: None,
            alternative: false,
            priority: None,
            specializes: None,
            injection_points: Vec::new(),
            interceptor_bindings: Vec::new(),
            factory: None,
            post_construct: None,
            pre_destroy: None,
        }
    }

    /// Bean 标识符, 默认为 Bean 类名
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Bean 类名, 用于备选启用与发现排除
    pub fn bean_class(mut self, bean_class: impl Into<String>) -> Self {
        self.bean_class = bean_class.into();
        self
    }

    /// 添加暴露的类型
    pub fn add_type(mut self, bean_type: BeanType) -> Self {
        if !self.types.contains(&bean_type) {
            self.types.push(bean_type);
        }
        self
    }

    /// 替换暴露的类型集合
    pub fn types(mut self, types: Vec<BeanType>) -> Self {
        self.types = types;
        self
    }

    /// 暴露类型层次中给定类型的整个类型闭包
    pub fn types_from(mut self, hierarchy: &TypeHierarchy, bean_type: &BeanType) -> Self {
        for closure_type in hierarchy.type_closure(bean_type) {
            if !self.types.contains(&closure_type) {
                self.types.push(closure_type);
            }
        }
        self
    }

    /// 添加限定符
    pub fn qualifier(mut self, qualifier: impl AsQualifier) -> Self {
        self.qualifiers.push(qualifier.to_qualifier());
        self
    }

    /// 作用域, 声明即视为带有 Bean 定义注解
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self.explicit_scope = true;
        self
    }

    /// Bean 名称, 同时添加 `@Named` 限定符
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.qualifiers.push(Qualifier::named(name.clone()));
        self.name = Some(name);
        self
    }

    /// 标记为备选
    pub fn alternative(mut self) -> Self {
        self.alternative = true;
        self
    }

    /// 显式优先级; 对备选而言即全局启用
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// 特化另一个 Bean
    pub fn specializes(mut self, bean: impl Into<BeanIdentifier>) -> Self {
        self.specializes = Some(bean.into());
        self
    }

    /// 声明注入点, 用于启动校验
    pub fn injection_point(mut self, point: InjectionPoint) -> Self {
        self.injection_points.push(point);
        self
    }

    /// 声明对 `D` 的注入点
    pub fn inject<D: ?Sized + 'static>(self, qualifiers: &[Qualifier]) -> Self {
        self.inject_type(BeanType::of::<D>(), qualifiers)
    }

    /// 声明对任意类型的注入点
    pub fn inject_type(self, required: BeanType, qualifiers: &[Qualifier]) -> Self {
        self.injection_point(InjectionPoint::new(required, qualifiers.to_vec()))
    }

    /// 添加拦截器绑定
    pub fn intercepted(mut self, binding: impl AsQualifier) -> Self {
        self.interceptor_bindings.push(binding.to_qualifier());
        self
    }

    /// 实例工厂
    pub fn produce<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Injector) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(move |injector: &Injector| factory(injector).map(Arc::new)));
        self
    }

    /// 使用预先构建好的实例, 每次创建都返回同一实例
    pub fn from_instance(mut self, instance: Arc<T>) -> Self {
        self.factory = Some(Arc::new(move |_: &Injector| Ok(Arc::clone(&instance))));
        self
    }

    /// 构造完成后的回调
    pub fn post_construct<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.post_construct = Some(Arc::new(callback));
        self
    }

    /// 销毁前的回调
    pub fn pre_destroy<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.pre_destroy = Some(Arc::new(callback));
        self
    }

    /// 构建 Bean
    ///
    /// 类型集合默认为 `{T, Object}` 并总是包含 `Object`; 限定符被规范化;
    /// 没有工厂时实例化会失败, 启动校验之外的调用方会得到创建错误。
    pub fn build(self) -> Arc<dyn Bean> {
        let mut types = self.types;
        if types.is_empty() {
            types.push(BeanType::of::<T>());
        }
        if !types.iter().any(BeanType::is_object) {
            types.push(BeanType::object());
        }
        let id = self.id.unwrap_or_else(|| self.bean_class.clone());
        let factory = self.factory.unwrap_or_else(|| {
            let bean = id.clone();
            let missing: Factory<T> = Arc::new(move |_: &Injector| -> Result<Arc<T>, BoxError> {
                Err(format!("Bean {bean} 没有实例工厂").into())
            });
            missing
        });
        Arc::new(ManagedBean {
            id: BeanIdentifier::new(id),
            bean_class: self.bean_class,
            types,
            qualifiers: normalize_bean_qualifiers(&self.qualifiers),
            scope: self.scope,
            explicit_scope: self.explicit_scope,
            name: self.name,
            alternative: self.alternative,
            priority: self.priority,
            specializes: self.specializes,
            injection_points: self.injection_points,
            interceptor_bindings: self.interceptor_bindings,
            factory,
            post_construct: self.post_construct,
            pre_destroy: self.pre_destroy,
        })
    }
}

impl<T: Any + Send + Sync> Default for BeanBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
