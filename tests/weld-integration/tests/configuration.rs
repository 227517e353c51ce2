//! 配置文件与 Bean 描述文件驱动的部署

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use weld_common::{BeanDiscoveryMode, ConfigError, WeldError};
use weld_config::{load_descriptor, ConfigurationLoader};
use weld_core::BeanBuilder;
use weld_se::Weld;
use weld_spi::{BeanDeploymentArchive, BeanType, Scope};

struct Mailer {
    transport: &'static str,
}

struct Helper;
struct Plain;

fn write(dir: &Path, name: &str, content: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, content)?;
    Ok(path)
}

fn archive(path: &Path, default_mode: BeanDiscoveryMode) -> anyhow::Result<BeanDeploymentArchive> {
    let beans_xml = load_descriptor(path, default_mode)?;
    Ok(BeanDeploymentArchive::new("app", beans_xml)
        .add_bean(
            BeanBuilder::<Mailer>::new()
                .bean_class("app.SmtpMailer")
                .scope(Scope::APPLICATION)
                .produce(|_| Ok(Mailer { transport: "smtp" }))
                .build(),
        )
        .add_bean(
            BeanBuilder::<Mailer>::new()
                .bean_class("app.MockMailer")
                .scope(Scope::APPLICATION)
                .alternative()
                .produce(|_| Ok(Mailer { transport: "mock" }))
                .build(),
        )
        .add_bean(
            BeanBuilder::<Helper>::new()
                .bean_class("app.internal.Helper")
                .scope(Scope::APPLICATION)
                .produce(|_| Ok(Helper))
                .build(),
        )
        .add_bean(
            BeanBuilder::<Plain>::new()
                .bean_class("app.Plain")
                .produce(|_| Ok(Plain))
                .build(),
        ))
}

/// 配置文件提供执行器与全局排除, 描述文件启用归档内的备选
#[test]
fn files_drive_discovery_and_alternatives() -> anyhow::Result<()> {
    common::init_test_logger();
    let dir = tempfile::tempdir()?;
    let config = write(
        dir.path(),
        "weld.toml",
        r#"
[executor]
thread_pool_size = 3

[discovery]
mode = "annotated"
excludes = ["app.internal.*"]
"#,
    )?;
    let descriptor = write(dir.path(), "beans.yaml", "alternatives:\n  - app.MockMailer\n")?;

    let loader = ConfigurationLoader::empty().add_file(&config);
    let default_mode = loader.load()?.discovery.mode;
    let container = Weld::new()
        .with_configuration_loader(loader)
        .add_archive(archive(&descriptor, default_mode)?)
        .initialize()?;

    assert_eq!(container.configuration().executor.thread_pool_size, 3);
    assert_eq!(container.reference::<Mailer>(&[])?.get()?.transport, "mock");

    let manager = container.bean_manager();
    // 全局排除
    assert!(manager.resolve(&BeanType::of::<Helper>(), &[])?.is_unsatisfied());
    // annotated 模式下没有显式作用域的 Bean 不被发现
    assert!(manager.resolve(&BeanType::of::<Plain>(), &[])?.is_unsatisfied());
    container.shutdown();
    Ok(())
}

/// 描述文件未启用备选时, 使用普通 Bean
#[test]
fn descriptor_without_alternatives_keeps_default_bean() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let descriptor = write(dir.path(), "beans.toml", "bean-discovery-mode = \"all\"\n")?;

    let container = Weld::new()
        .with_configuration_loader(ConfigurationLoader::empty())
        .add_archive(archive(&descriptor, BeanDiscoveryMode::Annotated)?)
        .initialize()?;
    assert_eq!(container.reference::<Mailer>(&[])?.get()?.transport, "smtp");
    // all 模式下没有显式作用域的 Bean 也被发现
    assert!(container.select::<Plain>(&[]).is_resolvable());
    container.shutdown();
    Ok(())
}

#[test]
fn invalid_configuration_stops_bootstrap() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = write(
        dir.path(),
        "weld.json",
        r#"{"executor": {"thread_pool_size": 0}, "discovery": {"excludes": ["app.[broken"]}}"#,
    )?;

    let result = Weld::new().add_config_file(&config).initialize();
    match result {
        Err(WeldError::Config {
            source: ConfigError::ValidationFailed { errors },
        }) => assert_eq!(errors.len(), 2),
        Err(other) => panic!("期望配置校验失败, 实际 {other}"),
        Ok(container) => {
            container.shutdown();
            panic!("期望配置校验失败");
        }
    }
    Ok(())
}

#[test]
fn missing_descriptor_is_reported() {
    let error = match load_descriptor(Path::new("/nonexistent/beans.toml"), BeanDiscoveryMode::All) {
        Err(error) => error,
        Ok(_) => panic!("期望文件不存在错误"),
    };
    assert!(matches!(error, ConfigError::FileNotFound { .. }));
}
