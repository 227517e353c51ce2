//! # Weld Config
//!
//! 容器配置的加载与校验。
//!
//! ## 主要组件
//!
//! - [`ConfigurationLoader`] - 分层加载 [`WeldConfiguration`]
//! - [`load_descriptor`] - 读取 Bean 归档描述文件 (`beans.xml` 等价物)

pub mod descriptor;
pub mod loader;

pub use descriptor::{load_descriptor, parse_descriptor, DescriptorFormat};
pub use loader::{validate, ConfigurationLoader};
pub use weld_common::{ConfigError, WeldConfiguration};

#[cfg(test)]
mod tests;
