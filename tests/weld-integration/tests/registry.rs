//! 进程级容器注册表
//!
//! `current()` 观察整个进程, 所以这个测试二进制只包含一个测试函数。

mod common;

use common::weld;
use weld_common::{ContainerError, WeldError};
use weld_core::{BeanBuilder, ClientProxy};
use weld_se::WeldContainer;
use weld_spi::Scope;

struct Session {
    user: String,
}

#[test]
fn current_container_lookup_and_proxy_handles() -> anyhow::Result<()> {
    // 没有运行中的容器
    assert!(matches!(
        WeldContainer::current(),
        Err(WeldError::Container {
            source: ContainerError::NoContainer
        })
    ));

    let bean = || {
        BeanBuilder::<Session>::new()
            .id("session")
            .scope(Scope::APPLICATION)
            .produce(|_| {
                Ok(Session {
                    user: "alice".to_string(),
                })
            })
            .build()
    };
    let first = weld().container_id("registry-first").add_bean(bean()).initialize()?;
    assert_eq!(WeldContainer::current()?.id(), "registry-first");

    // 代理句柄序列化后可以在同一进程中重新绑定
    let reference = first.reference::<Session>(&[])?;
    let proxy = reference.as_proxy().expect("应用作用域使用客户端代理");
    let json = serde_json::to_string(proxy)?;
    let restored: ClientProxy<Session> = serde_json::from_str(&json)?;
    assert_eq!(&restored, proxy);
    assert_eq!(restored.instance()?.user, "alice");

    let second = weld().container_id("registry-second").initialize()?;
    assert!(matches!(
        WeldContainer::current(),
        Err(WeldError::Container {
            source: ContainerError::MultipleContainers { count: 2 }
        })
    ));
    assert_eq!(
        WeldContainer::running_container_ids(),
        vec!["registry-first".to_string(), "registry-second".to_string()]
    );
    assert_eq!(WeldContainer::instance("registry-second")?.id(), "registry-second");

    first.shutdown();
    assert_eq!(WeldContainer::current()?.id(), "registry-second");
    // 容器已关闭, 句柄无法再绑定
    assert!(serde_json::from_str::<ClientProxy<Session>>(&json).is_err());

    second.shutdown();
    assert!(WeldContainer::current().is_err());
    Ok(())
}
