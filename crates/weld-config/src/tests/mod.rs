//! weld-config 单元测试

mod loader_tests;
