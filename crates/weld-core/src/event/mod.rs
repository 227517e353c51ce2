//! 事件
//!
//! 观察者解析、同步与异步通知、事件句柄与编程式观察者构建。

pub mod builder;
pub mod executor;
pub mod handle;
pub mod notifier;

pub use builder::ObserverBuilder;
pub use executor::{AsyncEventDelivery, AsyncExecutor};
pub use handle::Event;
pub use notifier::ObserverNotifier;
