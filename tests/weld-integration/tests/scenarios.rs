//! 端到端场景: 解析, 作用域, 依赖对象, 备选与事件分发

mod common;

use common::weld;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use weld_common::WeldError;
use weld_core::{BeanBuilder, ObserverBuilder};
use weld_spi::{same_instance, BeanType, Context, CreationalContext, Qualifier, ResolutionOutcome, Scope};

#[derive(Debug)]
struct Foo {
    serial: usize,
}

struct Bar;

/// 应用作用域 Bean 唯一解析, 不同线程拿到同一个目标实例
#[test]
fn application_scoped_bean_is_shared_across_threads() -> anyhow::Result<()> {
    let created = Arc::new(AtomicUsize::new(0));
    let foo = {
        let created = Arc::clone(&created);
        BeanBuilder::<Foo>::new()
            .id("foo")
            .scope(Scope::APPLICATION)
            .produce(move |_| {
                Ok(Foo {
                    serial: created.fetch_add(1, Ordering::SeqCst),
                })
            })
            .build()
    };
    let container = weld().add_bean(foo).initialize()?;

    let outcome = container.bean_manager().resolve(&BeanType::of::<Foo>(), &[])?;
    assert_eq!(outcome.unique().map(|b| b.id().as_str()), Some("foo"));

    let instance = container.select::<Foo>(&[]);
    let targets: Vec<Arc<Foo>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| scope.spawn(|| instance.get().and_then(|reference| reference.get())))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("线程 panic"))
            .collect::<Result<_, WeldError>>()
    })?;
    assert!(Arc::ptr_eq(&targets[0], &targets[1]));
    assert_eq!(targets[0].serial, 0);
    assert_eq!(created.load(Ordering::SeqCst), 1);

    container.shutdown();
    Ok(())
}

/// 两个优先级同为 100 的备选 Bean 构成歧义
#[test]
fn equal_priority_alternatives_are_ambiguous() -> anyhow::Result<()> {
    struct FooAlternative;
    let foo = BeanBuilder::<Foo>::new()
        .id("foo")
        .alternative()
        .priority(100)
        .build();
    let alternative = BeanBuilder::<FooAlternative>::new()
        .id("foo-alternative")
        .add_type(BeanType::of::<Foo>())
        .alternative()
        .priority(100)
        .build();
    let container = weld().add_bean(foo).add_bean(alternative).initialize()?;

    let outcome = container
        .bean_manager()
        .resolve(&BeanType::of::<Foo>(), &[Qualifier::default_qualifier()])?;
    assert!(matches!(outcome, ResolutionOutcome::Ambiguous(ref beans) if beans.len() == 2));
    assert!(container.select::<Foo>(&[]).is_ambiguous());

    container.shutdown();
    Ok(())
}

/// 请求上下文未激活时失败, 激活后建立存储条目, 失效时销毁一次
#[test]
fn request_context_activation_and_invalidation() -> anyhow::Result<()> {
    let destroyed = Arc::new(AtomicUsize::new(0));
    let bar = {
        let destroyed = Arc::clone(&destroyed);
        BeanBuilder::<Bar>::new()
            .id("bar")
            .scope(Scope::REQUEST)
            .produce(|_| Ok(Bar))
            .pre_destroy(move |_| {
                destroyed.fetch_add(1, Ordering::SeqCst);
            })
            .build()
    };
    let container = weld().add_bean(bar).initialize()?;
    let manager = container.bean_manager();
    let bean = manager.bean(&"bar".into()).expect("bar 已注册");
    let request = manager.request_context();

    let error = request.get(&bean, None).unwrap_err();
    assert!(error.is_context_not_active());

    request.activate();
    let cc = manager.create_creational_context(Some(bean.id()));
    request.get(&bean, Some(&cc))?;
    assert!(request.current_store().expect("已激活").contains(bean.id()));

    request.invalidate()?;
    request.deactivate();
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);

    container.shutdown();
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    Ok(())
}

/// 索引不变时解析结果稳定
#[test]
fn resolution_is_deterministic() -> anyhow::Result<()> {
    let beans = (0..4).map(|i| {
        BeanBuilder::<Foo>::new()
            .id(format!("foo-{i}"))
            .qualifier(Qualifier::new("Shard").with_member("index", i % 2))
            .build()
    });
    let container = weld().add_beans(beans).initialize()?;
    let manager = container.bean_manager();

    let requirements = [
        vec![],
        vec![Qualifier::any()],
        vec![Qualifier::new("Shard").with_member("index", 0)],
        vec![Qualifier::new("Shard").with_member("index", 7)],
    ];
    for qualifiers in &requirements {
        let first = manager.resolve(&BeanType::of::<Foo>(), qualifiers)?;
        for _ in 0..5 {
            assert_eq!(manager.resolve(&BeanType::of::<Foo>(), qualifiers)?, first);
        }
    }
    container.shutdown();
    Ok(())
}

/// 非绑定成员不影响限定符匹配
#[test]
fn nonbinding_members_do_not_affect_matching() -> anyhow::Result<()> {
    let cache = BeanBuilder::<Foo>::new()
        .id("cache")
        .qualifier(
            Qualifier::new("Cache")
                .with_member("value", 1)
                .with_nonbinding_member("nonBinding", 5),
        )
        .produce(|_| Ok(Foo { serial: 1 }))
        .build();
    let container = weld().add_bean(cache).initialize()?;

    let required = Qualifier::new("Cache").with_member("value", 1);
    let foo = container.reference::<Foo>(&[required])?.get()?;
    assert_eq!(foo.serial, 1);
    assert_eq!(
        Qualifier::new("Cache").with_member("value", 1).with_nonbinding_member("nonBinding", 5),
        Qualifier::new("Cache").with_member("value", 1).with_nonbinding_member("nonBinding", 9),
    );
    container.shutdown();
    Ok(())
}

/// N 个线程并发首次访问只创建一个实例
#[test]
fn one_normal_scoped_instance_under_contention() -> anyhow::Result<()> {
    let created = Arc::new(AtomicUsize::new(0));
    let foo = {
        let created = Arc::clone(&created);
        BeanBuilder::<Foo>::new()
            .scope(Scope::APPLICATION)
            .produce(move |_| {
                std::thread::sleep(std::time::Duration::from_millis(5));
                Ok(Foo {
                    serial: created.fetch_add(1, Ordering::SeqCst),
                })
            })
            .build()
    };
    let container = weld().add_bean(foo).initialize()?;
    let reference = container.reference::<Foo>(&[])?;
    let threads = 12;
    let barrier = Barrier::new(threads);

    let targets: Vec<Arc<Foo>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    reference.get()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("线程 panic"))
            .collect::<Result<_, WeldError>>()
    })?;

    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(targets.len(), threads);
    assert!(targets.iter().all(|t| Arc::ptr_eq(t, &targets[0])));
    container.shutdown();
    Ok(())
}

/// 每个注入点拿到独立的依赖实例, 所有者销毁时各销毁一次
#[test]
fn dependent_instances_are_distinct_and_destroyed_once() -> anyhow::Result<()> {
    struct Pair {
        left: Arc<Foo>,
        right: Arc<Foo>,
    }
    let serial = Arc::new(AtomicUsize::new(0));
    let destroyed = Arc::new(Mutex::new(Vec::<usize>::new()));
    let foo = {
        let serial = Arc::clone(&serial);
        let destroyed = Arc::clone(&destroyed);
        BeanBuilder::<Foo>::new()
            .produce(move |_| {
                Ok(Foo {
                    serial: serial.fetch_add(1, Ordering::SeqCst),
                })
            })
            .pre_destroy(move |foo| {
                destroyed.lock().push(foo.serial);
            })
            .build()
    };
    let pair = BeanBuilder::<Pair>::new()
        .scope(Scope::APPLICATION)
        .inject::<Foo>(&[])
        .inject::<Foo>(&[])
        .produce(|injector| {
            Ok(Pair {
                left: injector.get::<Foo>(&[])?.get()?,
                right: injector.get::<Foo>(&[])?.get()?,
            })
        })
        .build();
    let container = weld().add_bean(foo).add_bean(pair).initialize()?;

    let pair = container.reference::<Pair>(&[])?.get()?;
    assert!(!Arc::ptr_eq(&pair.left, &pair.right));
    assert_ne!(pair.left.serial, pair.right.serial);
    assert!(destroyed.lock().is_empty());

    container.shutdown();
    let mut destroyed = destroyed.lock().clone();
    destroyed.sort_unstable();
    assert_eq!(destroyed, vec![0, 1]);
    Ok(())
}

/// 数值较小的优先级胜出
#[test]
fn lower_priority_value_wins() -> anyhow::Result<()> {
    let alternative = |id: &str, priority: i32, serial: usize| {
        BeanBuilder::<Foo>::new()
            .id(id)
            .alternative()
            .priority(priority)
            .produce(move |_| Ok(Foo { serial }))
            .build()
    };
    let container = weld()
        .add_bean(BeanBuilder::<Foo>::new().id("plain").build())
        .add_bean(alternative("late", 200, 2))
        .add_bean(alternative("early", 50, 1))
        .initialize()?;

    for _ in 0..3 {
        let foo = container.reference::<Foo>(&[])?.get()?;
        assert_eq!(foo.serial, 1);
    }
    container.shutdown();
    Ok(())
}

/// 特化 Bean 把被特化的 Bean 移出候选集合
#[test]
fn specialization_replaces_candidate() -> anyhow::Result<()> {
    let original = BeanBuilder::<Foo>::new()
        .id("original")
        .qualifier(Qualifier::new("Mock"))
        .produce(|_| Ok(Foo { serial: 0 }))
        .build();
    let special = BeanBuilder::<Foo>::new()
        .id("special")
        .specializes("original")
        .produce(|_| Ok(Foo { serial: 1 }))
        .build();
    let container = weld().add_bean(original).add_bean(special).initialize()?;

    let instance = container.select::<Foo>(&[Qualifier::new("Mock")]);
    let beans = instance.beans()?;
    assert_eq!(beans.len(), 1);
    assert_eq!(beans[0].id().as_str(), "special");
    assert_eq!(instance.get()?.get()?.serial, 1);
    container.shutdown();
    Ok(())
}

/// 按优先级 [5, 10, 20] 调用, 中间的失败不影响第三个观察者
#[test]
fn observer_order_and_isolation() -> anyhow::Result<()> {
    let calls = Arc::new(Mutex::new(Vec::<i32>::new()));
    let observer = |priority: i32, failure: Option<&'static str>| {
        let calls = Arc::clone(&calls);
        ObserverBuilder::<String>::new()
            .id(format!("observer-{priority}"))
            .priority(priority)
            .notify(move |_, _| {
                calls.lock().push(priority);
                match failure {
                    Some(message) => Err(message.into()),
                    None => Ok(()),
                }
            })
            .build()
    };
    let container = weld()
        .add_observer(observer(10, Some("middle")))
        .add_observer(observer(5, None))
        .add_observer(observer(20, Some("last")))
        .initialize()?;

    let error = container.fire(&"payload".to_string(), &[]).unwrap_err();
    assert_eq!(*calls.lock(), vec![5, 10, 20]);
    let source = match error {
        WeldError::Observer { source } => source,
        other => anyhow::bail!("期望观察者异常, 实际 {other}"),
    };
    assert_eq!(source.primary.observer, "observer-10");
    assert_eq!(source.suppressed.len(), 1);
    assert_eq!(source.suppressed[0].observer, "observer-20");

    container.shutdown();
    Ok(())
}

#[test]
fn dependent_context_registers_with_owner() -> anyhow::Result<()> {
    let container = weld()
        .add_bean(BeanBuilder::<Bar>::new().id("bar").produce(|_| Ok(Bar)).build())
        .initialize()?;
    let manager = container.bean_manager();
    let bean = manager.bean(&"bar".into()).expect("bar 已注册");
    let dependent = manager.context(&Scope::DEPENDENT)?;
    let owner = CreationalContext::detached();

    let first = dependent.get(&bean, Some(&owner))?.expect("依赖实例");
    let second = dependent.get(&bean, Some(&owner))?.expect("依赖实例");
    assert!(!same_instance(&first, &second));
    assert_eq!(owner.dependent_count(), 2);
    owner.release();
    container.shutdown();
    Ok(())
}
