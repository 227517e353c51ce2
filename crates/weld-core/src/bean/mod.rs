//! Bean 定义
//!
//! 托管 Bean 由 [`BeanBuilder`] 以编程方式声明, 工厂通过 [`Injector`] 获取依赖。

pub mod forwarding;
pub mod injector;
pub mod managed;

pub use forwarding::SpecializedBean;
pub use injector::Injector;
pub use managed::{BeanBuilder, ManagedBean};
