//! # Weld Macros
//!
//! 这个 crate 提供了限定符与客户端代理的过程宏。
//!
//! ## 核心宏
//!
//! - [`Qualifier`] - 把结构体派生为限定符
//! - [`client_proxy`] - 为 trait 生成经过代理与拦截链的实现
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use weld_macros::{client_proxy, Qualifier};
//!
//! #[derive(Clone, Qualifier)]
//! #[qualifier(name = "app.Cached")]
//! pub struct Cached {
//!     region: String,
//!     #[qualifier(nonbinding)]
//!     ttl_secs: u32,
//! }
//!
//! #[client_proxy]
//! pub trait Greeter {
//!     fn greet(&self, name: &str) -> String;
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod client_proxy;
mod qualifier;

/// 限定符派生宏
///
/// 生成 `weld_spi::AsQualifier` 实现与到 `weld_spi::Qualifier` 的转换。
/// 限定符类型名默认为结构体名, 每个具名字段成为一个成员, 字段类型需要能转换为
/// `QualifierValue`。
///
/// # 参数
///
/// - `#[qualifier(name = "...")]` - 覆盖限定符类型名
/// - `#[qualifier(nonbinding)]` - 标记字段为非绑定成员, 不参与匹配
///
/// # 示例
///
/// ```rust,ignore
/// #[derive(Clone, Qualifier)]
/// pub struct Region {
///     value: String,
/// }
/// ```
#[proc_macro_derive(Qualifier, attributes(qualifier))]
pub fn derive_qualifier(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    qualifier::derive_qualifier_impl(input)
}

/// 客户端代理宏
///
/// 为 trait 生成 `weld_core::ClientProxy<T>` 与 `weld_core::Reference<T>` 上的实现,
/// 每次调用都解析当前上下文实例并经过拦截链。trait 方法没有错误通道,
/// 解析或调用失败时生成的实现会 panic。
///
/// 只支持 `&self` 方法, 返回值不能借用目标实例。
///
/// # 示例
///
/// ```rust,ignore
/// #[client_proxy]
/// pub trait Counter {
///     fn increment(&self) -> u64;
/// }
///
/// let counter = manager.reference::<MyCounter>(&[])?;
/// counter.increment();
/// ```
#[proc_macro_attribute]
pub fn client_proxy(args: TokenStream, input: TokenStream) -> TokenStream {
    client_proxy::client_proxy_impl(args, input)
}
