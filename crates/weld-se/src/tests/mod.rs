//! weld-se 单元测试
