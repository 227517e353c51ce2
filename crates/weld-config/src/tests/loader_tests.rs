//! 分层配置加载测试

use crate::ConfigurationLoader;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use weld_common::{BeanDiscoveryMode, ConfigError, DEFAULT_RESOLUTION_CACHE_SIZE};

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_empty_loader_yields_defaults() {
    let configuration = ConfigurationLoader::empty().load().unwrap();
    assert_eq!(configuration.resolution.cache_size, DEFAULT_RESOLUTION_CACHE_SIZE);
    assert_eq!(configuration.discovery.mode, BeanDiscoveryMode::Annotated);
    assert!(configuration.alternatives.enabled.is_empty());
}

#[test]
fn test_toml_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "weld.toml",
        r#"
[executor]
thread_pool_size = 3

[conversation]
timeout_ms = 5000

[alternatives]
enabled = ["app.MockRepository"]

[discovery]
mode = "all"
excludes = ["app.internal.*"]
"#,
    );

    let configuration = ConfigurationLoader::empty().add_file(&path).load().unwrap();
    assert_eq!(configuration.executor.thread_pool_size, 3);
    assert_eq!(configuration.executor.keep_alive_secs, 60);
    assert_eq!(configuration.conversation.timeout_ms, 5000);
    assert_eq!(configuration.conversation.concurrent_access_timeout_ms, 1000);
    assert_eq!(configuration.alternatives.enabled, vec!["app.MockRepository"]);
    assert_eq!(configuration.discovery.mode, BeanDiscoveryMode::All);
    assert_eq!(configuration.discovery.excludes, vec!["app.internal.*"]);
}

/// 后添加的文件覆盖先添加的, 不同格式可以混用
#[test]
fn test_later_files_take_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let base = write(&dir, "base.yaml", "executor:\n  thread_pool_size: 2\nlogging:\n  level: debug\n");
    let overlay = write(&dir, "overlay.json", r#"{"executor": {"thread_pool_size": 6}}"#);

    let configuration = ConfigurationLoader::empty()
        .add_file(&base)
        .add_file(&overlay)
        .load()
        .unwrap();
    assert_eq!(configuration.executor.thread_pool_size, 6);
    assert_eq!(configuration.logging.level, "debug");
}

#[test]
fn test_environment_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "weld.toml", "[executor]\nthread_pool_size = 3\n");
    std::env::set_var("WELD_LOADER_TEST__EXECUTOR__THREAD_POOL_SIZE", "8");
    std::env::set_var("WELD_LOADER_TEST__ALTERNATIVES__ENABLED", "first,second");

    let result = ConfigurationLoader::empty()
        .add_file(&path)
        .with_env_prefix("WELD_LOADER_TEST")
        .load();
    std::env::remove_var("WELD_LOADER_TEST__EXECUTOR__THREAD_POOL_SIZE");
    std::env::remove_var("WELD_LOADER_TEST__ALTERNATIVES__ENABLED");

    let configuration = result.unwrap();
    assert_eq!(configuration.executor.thread_pool_size, 8);
    assert_eq!(configuration.alternatives.enabled, vec!["first", "second"]);
}

#[test]
fn test_missing_explicit_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let error = ConfigurationLoader::empty().add_file(&missing).load().unwrap_err();
    assert!(matches!(error, ConfigError::FileNotFound { ref path } if path.ends_with("absent.toml")));
}

#[test]
fn test_missing_default_file_is_optional() {
    let dir = tempfile::tempdir().unwrap();
    let configuration = ConfigurationLoader::empty()
        .with_default_file(dir.path().join("weld.toml"))
        .load()
        .unwrap();
    assert_eq!(configuration.resolution.cache_size, DEFAULT_RESOLUTION_CACHE_SIZE);
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "broken.toml", "[executor\nthread_pool_size = ");
    let error = ConfigurationLoader::empty().add_file(&path).load().unwrap_err();
    assert!(matches!(error, ConfigError::ParseError { .. }));
}

/// 校验一次性报告全部问题, 包括非法的 glob 模式
#[test]
fn test_validation_reports_every_problem() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "invalid.toml",
        r#"
[executor]
thread_pool_size = 0

[conversation]
timeout_ms = 0

[discovery]
excludes = ["app.[internal"]
"#,
    );
    let error = ConfigurationLoader::empty().add_file(&path).load().unwrap_err();
    match error {
        ConfigError::ValidationFailed { errors } => {
            assert_eq!(errors.len(), 3);
            assert!(errors.iter().any(|e| e.contains("discovery.excludes[0]")));
        }
        other => panic!("期望验证失败, 实际 {other}"),
    }
}
