//! 客户端代理、注入引用与拦截链

pub mod client;
pub mod interception;
pub mod reference;

pub use client::{ClientProxy, ProxyHandle};
pub use interception::{interceptors_for, invoke_intercepted, InterceptorBuilder};
pub use reference::Reference;
