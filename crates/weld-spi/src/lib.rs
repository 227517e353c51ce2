//! # Weld SPI
//!
//! 容器与协作者之间的契约。
//!
//! ## 核心契约
//!
//! - [`BeanType`] / [`Qualifier`] / [`Scope`] - Bean 元数据的基本构件
//! - [`Bean`] / [`Contextual`] - Bean 定义与实例的创建、销毁
//! - [`CreationalContext`] - 依赖对象链
//! - [`Context`] / [`BeanStore`] - 作用域上下文与实例存储
//! - [`BeanContainer`] - 代理与编程式查找回到容器的入口
//! - [`ObserverMethod`] / [`Interceptor`] / [`Extension`] - 事件、拦截与扩展
//!
//! ## 设计原则
//!
//! - 所有契约都是对象安全的 trait, 以 `Arc<dyn ...>` 在层间传递
//! - 类型擦除的实例统一为 [`BeanInstance`], 在边界处向下转型

pub mod bean;
pub mod container;
pub mod context;
pub mod creational;
pub mod discovery;
pub mod extension;
pub mod interceptor;
pub mod observer;
pub mod qualifier;
pub mod scope;
pub mod types;

pub use bean::*;
pub use container::*;
pub use context::*;
pub use creational::*;
pub use discovery::*;
pub use extension::*;
pub use interceptor::*;
pub use observer::*;
pub use qualifier::{
    describe_qualifiers, AsQualifier, Qualifier, QualifierValue, ANY, BEFORE_DESTROYED, DEFAULT,
    DESTROYED, INITIALIZED, NAMED,
};
pub use scope::*;
pub use types::*;
