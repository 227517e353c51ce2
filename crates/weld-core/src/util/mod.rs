//! 内部工具

pub mod computing_cache;

pub use computing_cache::ComputingCache;
