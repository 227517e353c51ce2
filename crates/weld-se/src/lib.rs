//! # Weld SE
//!
//! 独立运行环境下的容器启动入口。
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use weld_core::BeanBuilder;
//! use weld_se::Weld;
//!
//! struct Greeter;
//!
//! fn main() -> Result<(), weld_common::WeldError> {
//!     let container = Weld::new()
//!         .add_bean(BeanBuilder::<Greeter>::new().produce(|_| Ok(Greeter)).build())
//!         .initialize()?;
//!
//!     let _greeter = container.reference::<Greeter>(&[])?.get()?;
//!     container.shutdown();
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod container;
pub mod logging;

pub use builder::{Weld, SYNTHETIC_ARCHIVE_ID};
pub use container::WeldContainer;
pub use logging::LoggingConfig;

#[cfg(test)]
mod tests;
