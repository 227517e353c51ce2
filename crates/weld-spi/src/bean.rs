//! Bean 元数据模型

use crate::creational::CreationalContext;
use crate::qualifier::{describe_qualifiers, Qualifier};
use crate::scope::Scope;
use crate::types::BeanType;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use weld_common::WeldError;

/// 类型擦除后的 Bean 实例
pub type BeanInstance = Arc<dyn Any + Send + Sync>;

/// 判断两个实例引用是否指向同一对象
pub fn same_instance(a: &BeanInstance, b: &BeanInstance) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

/// 稳定的 Bean 标识符, 作为 Bean 存储的键
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeanIdentifier(String);

impl BeanIdentifier {
    /// 创建标识符
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 字符串形式
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BeanIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BeanIdentifier {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BeanIdentifier {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// 注入点: 所需类型与限定符
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionPoint {
    /// 所需类型
    pub required_type: BeanType,
    /// 所需限定符, 为空表示 `@Default`
    pub qualifiers: Vec<Qualifier>,
    /// 成员名 (字段或参数), 用于错误信息
    pub member: Option<String>,
    /// 编程式查找 (`Instance<T>`) 注入点不做满足性校验
    pub dynamic: bool,
}

impl InjectionPoint {
    /// 创建注入点
    pub fn new(required_type: BeanType, qualifiers: Vec<Qualifier>) -> Self {
        Self {
            required_type,
            qualifiers,
            member: None,
            dynamic: false,
        }
    }

    /// 创建编程式查找注入点
    pub fn dynamic(required_type: BeanType, qualifiers: Vec<Qualifier>) -> Self {
        Self {
            dynamic: true,
            ..Self::new(required_type, qualifiers)
        }
    }

    /// 设置成员名
    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }
}

impl fmt::Display for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            describe_qualifiers(&self.qualifiers),
            self.required_type
        )?;
        if let Some(member) = &self.member {
            write!(f, " ({member})")?;
        }
        Ok(())
    }
}

/// 上下文化类型: 能够创建并销毁自身实例
pub trait Contextual: Send + Sync {
    /// Bean 标识符
    fn id(&self) -> &BeanIdentifier;

    /// 创建新实例, 依赖对象登记到给定的创建上下文
    fn create(&self, creational_context: &CreationalContext) -> Result<BeanInstance, WeldError>;

    /// 销毁实例: 调用销毁前回调并释放其依赖对象
    fn destroy(&self, instance: BeanInstance, creational_context: &CreationalContext);
}

/// Bean 定义
pub trait Bean: Contextual + fmt::Debug {
    /// Bean 类名, 用于备选启用与发现排除
    fn bean_class(&self) -> &str;

    /// 暴露的类型闭包, 总是包含 `Object`
    fn types(&self) -> &[BeanType];

    /// 声明的限定符 (已规范化, 含 `@Any`)
    fn qualifiers(&self) -> &[Qualifier];

    /// 作用域
    fn scope(&self) -> &Scope;

    /// Bean 名称
    fn name(&self) -> Option<&str> {
        None
    }

    /// 是否为备选
    fn is_alternative(&self) -> bool {
        false
    }

    /// 显式优先级
    fn priority(&self) -> Option<i32> {
        None
    }

    /// 被特化的 Bean
    fn specializes(&self) -> Option<&BeanIdentifier> {
        None
    }

    /// 注入点
    fn injection_points(&self) -> &[InjectionPoint] {
        &[]
    }

    /// 拦截器绑定
    fn interceptor_bindings(&self) -> &[Qualifier] {
        &[]
    }

    /// 是否显式声明了作用域 (Bean 定义注解)
    fn has_explicit_scope(&self) -> bool {
        true
    }
}

/// Bean 的简短描述, 用于日志与错误信息
pub fn describe_bean(bean: &dyn Bean) -> String {
    format!("{} {} [{}]", bean.scope(), bean.bean_class(), bean.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_instance_uses_identity() {
        let a: BeanInstance = Arc::new(1_u32);
        let b: BeanInstance = Arc::new(1_u32);
        assert!(same_instance(&a, &a.clone()));
        assert!(!same_instance(&a, &b));
    }

    #[test]
    fn test_injection_point_display() {
        let point = InjectionPoint::new(BeanType::class("Foo"), vec![Qualifier::named("x")])
            .with_member("foo");
        assert_eq!(point.to_string(), "{@Named(value=\"x\")} Foo (foo)");
    }
}
