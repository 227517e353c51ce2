//! # Weld Common
//!
//! 这个 crate 提供了 Weld 容器各层共享的基础类型。
//!
//! ## 核心内容
//!
//! - [`WeldError`] - 顶层错误类型及各领域错误
//! - [`WeldConfiguration`] - 容器配置模型
//! - [`ContainerState`] - 容器生命周期状态
//! - [`ScopeGuard`] - 作用域清理守卫

pub mod configuration;
pub mod errors;
pub mod lifecycle;

pub use configuration::*;
pub use errors::*;
pub use lifecycle::*;
