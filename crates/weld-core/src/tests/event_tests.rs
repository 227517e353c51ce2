//! 事件分发测试

use super::{archive, start};
use crate::bean::BeanBuilder;
use crate::event::ObserverBuilder;
use crate::manager::ScopeLifecycleEvent;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use weld_common::{ObserverException, ResolutionError, WeldError};
use weld_spi::{BeanType, Qualifier, Reception, Scope};

#[derive(Debug, Clone)]
struct OrderPlaced {
    id: u32,
}

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

/// 观察者按优先级升序调用; 中间的失败被隔离, 其余观察者照常执行
#[test]
fn test_observers_run_in_priority_order_with_isolated_failures() {
    let calls = log();
    let observer = |name: &'static str, priority: i32, fail: bool| {
        let calls = Arc::clone(&calls);
        ObserverBuilder::<OrderPlaced>::new()
            .id(name)
            .priority(priority)
            .notify(move |event, _| {
                calls.lock().push(format!("{name}:{}", event.id));
                if fail {
                    return Err(format!("{name} 失败").into());
                }
                Ok(())
            })
            .build()
    };
    let manager = start(
        archive()
            .add_observer(observer("late", 20, false))
            .add_observer(observer("early", 5, false))
            .add_observer(observer("middle", 10, true)),
    );

    let error = manager.fire(&OrderPlaced { id: 1 }, &[]).unwrap_err();
    assert_eq!(*calls.lock(), vec!["early:1", "middle:1", "late:1"]);
    match error {
        WeldError::Observer { source } => {
            assert_eq!(source.primary.observer, "middle");
            assert!(source.suppressed.is_empty());
        }
        other => panic!("期望观察者异常, 实际 {other}"),
    }
    manager.shutdown();
}

#[test]
fn test_first_failure_is_primary_and_rest_suppressed() {
    let failing = |name: &'static str, priority: i32| {
        ObserverBuilder::<OrderPlaced>::new()
            .id(name)
            .priority(priority)
            .notify(move |_, _| Err(format!("{name} 失败").into()))
            .build()
    };
    let manager = start(
        archive()
            .add_observer(failing("third", 30))
            .add_observer(failing("first", 1))
            .add_observer(failing("second", 2)),
    );

    let Err(WeldError::Observer { source }) = manager.fire(&OrderPlaced { id: 2 }, &[]) else {
        panic!("期望观察者异常");
    };
    assert_eq!(source.primary.observer, "first");
    let suppressed: Vec<&str> = source.suppressed.iter().map(|f| f.observer.as_str()).collect();
    assert_eq!(suppressed, vec!["second", "third"]);
    assert_eq!(source.failure_count(), 3);
    manager.shutdown();
}

#[test]
fn test_observer_qualifiers_must_be_present_on_event() {
    let urgent = Arc::new(AtomicUsize::new(0));
    let all = Arc::new(AtomicUsize::new(0));
    let manager = start(
        archive()
            .add_observer({
                let urgent = Arc::clone(&urgent);
                ObserverBuilder::<OrderPlaced>::new()
                    .qualifier(Qualifier::new("Urgent"))
                    .notify(move |_, _| {
                        urgent.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .build()
            })
            .add_observer({
                let all = Arc::clone(&all);
                ObserverBuilder::<OrderPlaced>::new()
                    .notify(move |_, _| {
                        all.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .build()
            }),
    );

    manager.fire(&OrderPlaced { id: 3 }, &[]).unwrap();
    manager
        .event::<OrderPlaced>()
        .select(&[Qualifier::new("Urgent")])
        .fire(&OrderPlaced { id: 4 })
        .unwrap();
    assert_eq!(urgent.load(Ordering::SeqCst), 1);
    assert_eq!(all.load(Ordering::SeqCst), 2);
    manager.shutdown();
}

/// 不带限定符的事件隐含 `@Default`; 带其他限定符的事件不再匹配 `@Default` 观察者
#[test]
fn test_unqualified_event_reaches_default_observer() {
    let calls = log();
    let manager = start(archive().add_observer({
        let calls = Arc::clone(&calls);
        ObserverBuilder::<OrderPlaced>::new()
            .qualifier(Qualifier::default_qualifier())
            .notify(move |event, context| {
                assert!(context
                    .metadata()
                    .qualifiers
                    .contains(&Qualifier::default_qualifier()));
                calls.lock().push(format!("default:{}", event.id));
                Ok(())
            })
            .build()
    }));

    manager.fire(&OrderPlaced { id: 7 }, &[]).unwrap();
    manager.fire(&OrderPlaced { id: 8 }, &[Qualifier::any()]).unwrap();
    manager
        .fire(&OrderPlaced { id: 9 }, &[Qualifier::new("Fast")])
        .unwrap();
    assert_eq!(*calls.lock(), vec!["default:7", "default:8"]);
    manager.shutdown();
}

#[test]
fn test_object_observer_sees_every_event() {
    let seen = log();
    let manager = start(archive().add_observer({
        let seen = Arc::clone(&seen);
        ObserverBuilder::<OrderPlaced>::new()
            .observed_type(BeanType::object())
            .notify_any(move |context| {
                seen.lock().push(context.metadata().event_type.to_string());
                Ok(())
            })
            .build()
    }));

    manager.fire(&OrderPlaced { id: 5 }, &[]).unwrap();
    manager.fire(&"text".to_string(), &[]).unwrap();
    // 启动时的 @Initialized 事件也被观察到
    assert!(seen.lock().len() >= 2);
    manager.shutdown();
}

#[test]
fn test_parameterized_event_matches_raw_observer() {
    let count = Arc::new(AtomicUsize::new(0));
    let manager = start(archive().add_observer({
        let count = Arc::clone(&count);
        ObserverBuilder::<Vec<String>>::new()
            .observed_type(BeanType::class("List"))
            .notify_any(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
    }));

    let event_type = BeanType::parameterized("List", vec![BeanType::class("String")]);
    manager
        .event::<Vec<String>>()
        .with_type(event_type)
        .fire(&vec!["a".to_string()])
        .unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    let error = manager
        .fire_typed(&1_u8, &BeanType::variable("T"), &[])
        .unwrap_err();
    assert!(matches!(
        error,
        WeldError::Resolution {
            source: ResolutionError::IllegalEventType { .. }
        }
    ));
    manager.shutdown();
}

/// 声明 Bean 的观察者: `Always` 按需创建接收者, `IfExists` 在实例不存在时跳过
#[test]
fn test_receiver_resolution() {
    struct Auditor {
        seen: Mutex<Vec<u32>>,
    }
    let created = Arc::new(AtomicUsize::new(0));
    let auditor = {
        let created = Arc::clone(&created);
        BeanBuilder::<Auditor>::new()
            .id("auditor")
            .scope(Scope::REQUEST)
            .produce(move |_| {
                created.fetch_add(1, Ordering::SeqCst);
                Ok(Auditor {
                    seen: Mutex::new(Vec::new()),
                })
            })
            .build()
    };
    let conditional = ObserverBuilder::<OrderPlaced>::new()
        .id("conditional")
        .declared_by("auditor")
        .reception(Reception::IfExists)
        .notify(|event, context| {
            let auditor = context.receiver_as::<Auditor>().ok_or("没有接收者")?;
            auditor.seen.lock().push(event.id);
            Ok(())
        })
        .build();
    let manager = start(archive().add_bean(auditor).add_observer(conditional));

    // 上下文未激活: 跳过
    manager.fire(&OrderPlaced { id: 1 }, &[]).unwrap();
    let request = manager.request_context();
    request.activate();
    // 激活但没有实例: 跳过
    manager.fire(&OrderPlaced { id: 2 }, &[]).unwrap();
    assert_eq!(created.load(Ordering::SeqCst), 0);

    let auditor = manager.reference::<Auditor>(&[]).unwrap().get().unwrap();
    manager.fire(&OrderPlaced { id: 3 }, &[]).unwrap();
    assert_eq!(*auditor.seen.lock(), vec![3]);
    request.invalidate().unwrap();
    request.deactivate();
    manager.shutdown();
}

#[test]
fn test_dependent_receiver_is_destroyed_after_notification() {
    struct Listener;
    let destroyed = Arc::new(AtomicUsize::new(0));
    let listener = {
        let destroyed = Arc::clone(&destroyed);
        BeanBuilder::<Listener>::new()
            .id("listener")
            .produce(|_| Ok(Listener))
            .pre_destroy(move |_| {
                destroyed.fetch_add(1, Ordering::SeqCst);
            })
            .build()
    };
    let observer = ObserverBuilder::<OrderPlaced>::new()
        .declared_by("listener")
        .notify(|_, context| {
            context.receiver_as::<Listener>().ok_or("没有接收者")?;
            Ok(())
        })
        .build();
    let manager = start(archive().add_bean(listener).add_observer(observer));

    manager.fire(&OrderPlaced { id: 1 }, &[]).unwrap();
    manager.fire(&OrderPlaced { id: 2 }, &[]).unwrap();
    assert_eq!(destroyed.load(Ordering::SeqCst), 2);
    manager.shutdown();
}

#[test]
fn test_lifecycle_events_are_fired() {
    let events = Arc::new(Mutex::new(Vec::<ScopeLifecycleEvent>::new()));
    let observer = |qualifier: Qualifier| {
        let events = Arc::clone(&events);
        ObserverBuilder::<ScopeLifecycleEvent>::new()
            .qualifier(qualifier)
            .notify(move |event, _| {
                events.lock().push(event.clone());
                Ok(())
            })
            .build()
    };
    let manager = start(
        archive()
            .add_observer(observer(Qualifier::initialized(&Scope::APPLICATION)))
            .add_observer(observer(Qualifier::before_destroyed(&Scope::APPLICATION)))
            .add_observer(observer(Qualifier::destroyed(&Scope::APPLICATION))),
    );
    assert_eq!(events.lock().len(), 1);

    manager.shutdown();
    manager.shutdown();
    let events = events.lock();
    assert_eq!(events.len(), 3);
    assert!(events
        .iter()
        .all(|e| e.container_id == manager.id() && e.scope == Scope::APPLICATION));
}

#[test]
fn test_sync_fire_skips_async_observers() {
    let count = Arc::new(AtomicUsize::new(0));
    let manager = start(archive().add_observer({
        let count = Arc::clone(&count);
        ObserverBuilder::<OrderPlaced>::new()
            .asynchronous()
            .notify(move |_, _| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
    }));
    manager.fire(&OrderPlaced { id: 1 }, &[]).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);
    manager.shutdown();
}

#[tokio::test]
async fn test_async_delivery_completes() {
    let seen = log();
    let manager = start(
        archive()
            .add_observer({
                let seen = Arc::clone(&seen);
                ObserverBuilder::<OrderPlaced>::new()
                    .id("async-a")
                    .asynchronous()
                    .notify(move |event, _| {
                        seen.lock().push(format!("a:{}", event.id));
                        Ok(())
                    })
                    .build()
            })
            .add_observer({
                let seen = Arc::clone(&seen);
                ObserverBuilder::<OrderPlaced>::new()
                    .id("sync")
                    .notify(move |event, _| {
                        seen.lock().push(format!("sync:{}", event.id));
                        Ok(())
                    })
                    .build()
            }),
    );

    let delivery = manager.fire_async(OrderPlaced { id: 9 }, &[]).unwrap();
    delivery.await.unwrap();
    assert_eq!(*seen.lock(), vec!["a:9"]);
    manager.shutdown();
}

/// 投递句柄由执行器自己的运行时驱动, 在运行时之外也能等待
#[test]
fn test_async_delivery_outside_runtime() {
    let count = Arc::new(AtomicUsize::new(0));
    let manager = start(archive().add_observer({
        let count = Arc::clone(&count);
        ObserverBuilder::<OrderPlaced>::new()
            .asynchronous()
            .notify(move |_, _| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
    }));

    let delivery = manager.fire_async(OrderPlaced { id: 4 }, &[]).unwrap();
    tokio_test::block_on(delivery).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
    manager.shutdown();
}

#[tokio::test]
async fn test_async_failures_are_aggregated() {
    let failing = |name: &'static str| {
        ObserverBuilder::<OrderPlaced>::new()
            .id(name)
            .asynchronous()
            .notify(move |_, _| Err(format!("{name} 失败").into()))
            .build()
    };
    let manager = start(
        archive()
            .add_observer(failing("first"))
            .add_observer(failing("second")),
    );

    let result: Result<(), ObserverException> = manager
        .event::<OrderPlaced>()
        .fire_async(OrderPlaced { id: 1 })
        .unwrap()
        .await;
    let exception = result.unwrap_err();
    assert_eq!(exception.failure_count(), 2);
    assert_eq!(exception.primary.observer, "first");
    manager.shutdown();
}

#[tokio::test]
async fn test_async_without_observers_completes_immediately() {
    let manager = start(archive());
    let delivery = manager.fire_async(OrderPlaced { id: 0 }, &[]).unwrap();
    assert!(delivery.is_finished());
    delivery.await.unwrap();
    manager.shutdown();
}
