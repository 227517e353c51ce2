//! 集成测试公共工具

#![allow(dead_code)]

use std::sync::Once;
use weld_common::WeldConfiguration;
use weld_se::Weld;

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
pub fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init()
            .ok(); // 忽略初始化失败的错误
    });
}

/// 小线程池的测试配置
pub fn test_configuration() -> WeldConfiguration {
    WeldConfiguration::default().with_thread_pool_size(2)
}

/// 使用测试配置的构建器
pub fn weld() -> Weld {
    init_test_logger();
    Weld::new().with_configuration(test_configuration())
}
