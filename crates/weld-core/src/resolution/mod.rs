//! 类型安全解析
//!
//! - [`TypeHierarchy`] - 显式声明的类型层次与类型闭包
//! - [`AssignabilityRules`] - Bean 与事件的可赋值性规则
//! - [`TypeSafeBeanResolver`] / [`TypeSafeObserverResolver`] - 带缓存的解析器

pub mod assignability;
pub mod hierarchy;
pub mod observers;
pub mod qualifiers;
pub mod resolver;

pub use assignability::AssignabilityRules;
pub use hierarchy::TypeHierarchy;
pub use observers::{ResolvedObservers, TypeSafeObserverResolver};
pub use qualifiers::{
    contains_all_qualifiers, normalize_bean_qualifiers, normalize_event_qualifiers,
    normalize_required_qualifiers,
};
pub use resolver::{disambiguate, Resolvable, TypeSafeBeanResolver};
