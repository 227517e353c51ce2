//! 会话与对话上下文经由容器的行为

mod common;

use common::weld;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use weld_common::{ContextError, WeldError};
use weld_core::BeanBuilder;
use weld_spi::{Bean, Scope};

struct Cart {
    serial: usize,
}

struct Wizard {
    serial: usize,
}

fn serial_bean<T, F>(id: &str, scope: Scope, destroyed: &Arc<AtomicUsize>, make: F) -> Arc<dyn Bean>
where
    T: std::any::Any + Send + Sync,
    F: Fn(usize) -> T + Send + Sync + 'static,
{
    let created = Arc::new(AtomicUsize::new(0));
    let destroyed = Arc::clone(destroyed);
    BeanBuilder::<T>::new()
        .id(id)
        .scope(scope)
        .produce(move |_| Ok(make(created.fetch_add(1, Ordering::SeqCst))))
        .pre_destroy(move |_| {
            destroyed.fetch_add(1, Ordering::SeqCst);
        })
        .build()
}

/// 不同会话得到不同实例, 会话恢复后仍是原实例
#[test]
fn session_scoped_bean_follows_session() -> anyhow::Result<()> {
    let destroyed = Arc::new(AtomicUsize::new(0));
    let container = weld()
        .add_bean(serial_bean("cart", Scope::SESSION, &destroyed, |serial| Cart { serial }))
        .initialize()?;
    let sessions = container.bean_manager().session_context();
    let cart = container.reference::<Cart>(&[])?;
    assert!(cart.is_proxy());

    // 未激活时通过代理访问失败
    let error = match cart.get() {
        Err(error) => error,
        Ok(_) => panic!("会话未激活时不应返回实例"),
    };
    assert!(error.is_context_not_active());

    sessions.activate("alice");
    let alice = cart.get()?;
    sessions.activate("bob");
    let bob = cart.get()?;
    assert_ne!(alice.serial, bob.serial);

    sessions.activate("alice");
    assert!(Arc::ptr_eq(&alice, &cart.get()?));
    assert_eq!(sessions.session_ids(), vec!["alice", "bob"]);

    assert!(sessions.destroy_session("bob"));
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    sessions.invalidate()?;
    assert_eq!(destroyed.load(Ordering::SeqCst), 2);
    assert!(sessions.current_session().is_none());

    sessions.activate("carol");
    cart.get()?;
    sessions.deactivate();
    container.shutdown();
    assert_eq!(destroyed.load(Ordering::SeqCst), 3);
    Ok(())
}

/// 长期对话跨激活保留实例, 临时对话在停用时销毁
#[test]
fn conversation_scoped_bean_lifecycle() -> anyhow::Result<()> {
    let destroyed = Arc::new(AtomicUsize::new(0));
    let container = weld()
        .add_bean(serial_bean("wizard", Scope::CONVERSATION, &destroyed, |serial| Wizard {
            serial,
        }))
        .initialize()?;
    let conversations = container.bean_manager().conversation_context();
    let wizard = container.reference::<Wizard>(&[])?;

    // 临时对话
    conversations.activate(None)?;
    let transient = wizard.get()?;
    conversations.deactivate();
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);

    // 长期对话
    conversations.activate(None)?;
    let cid = conversations.begin(Some("checkout".to_string()))?;
    let long_running = wizard.get()?;
    assert_ne!(transient.serial, long_running.serial);
    conversations.deactivate();
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);

    conversations.activate(Some(cid.as_str()))?;
    assert!(Arc::ptr_eq(&long_running, &wizard.get()?));
    conversations.end()?;
    conversations.deactivate();
    assert_eq!(destroyed.load(Ordering::SeqCst), 2);
    assert!(conversations.conversation_ids().is_empty());

    // 不存在的对话: 报错但仍关联一个临时对话
    let error = conversations.activate(Some("missing"));
    assert!(matches!(
        error,
        Err(WeldError::Context {
            source: ContextError::NonexistentConversation { .. }
        })
    ));
    assert!(conversations.current().is_some());
    conversations.deactivate();

    container.shutdown();
    Ok(())
}

/// 请求上下文守卫在作用域结束时销毁实例
#[test]
fn request_guard_destroys_instances() -> anyhow::Result<()> {
    let destroyed = Arc::new(AtomicUsize::new(0));
    let container = weld()
        .add_bean(serial_bean("request-cart", Scope::REQUEST, &destroyed, |serial| Cart { serial }))
        .initialize()?;
    let cart = container.reference::<Cart>(&[])?;
    {
        let _guard = container.activate_request();
        let first = cart.get()?;
        assert!(Arc::ptr_eq(&first, &cart.get()?));
    }
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    assert!(cart.get().is_err());
    container.shutdown();
    Ok(())
}
