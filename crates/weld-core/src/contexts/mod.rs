//! 内置作用域上下文与 Bean 存储

pub mod bean_store;
pub mod conversation;
pub mod dependent;
pub mod request;
pub mod session;
pub mod shared;
pub mod support;
pub mod thread_bound;

pub use bean_store::{ConcurrentBeanStore, LocalBeanStore};
pub use conversation::{ConversationContext, ConversationInfo};
pub use dependent::DependentContext;
pub use request::{ActivationGuard, RequestContext};
pub use session::SessionContext;
pub use shared::SharedContext;
pub use thread_bound::ThreadBound;
