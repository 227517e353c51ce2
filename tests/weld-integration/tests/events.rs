//! 经由容器的同步与异步事件

mod common;

use common::weld;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use weld_common::WeldError;
use weld_core::{BeanBuilder, ObserverBuilder};
use weld_spi::{Qualifier, Scope};

#[derive(Debug, Clone)]
struct PriceChanged {
    sku: String,
    cents: u64,
}

struct PriceBoard {
    prices: Mutex<Vec<(String, u64)>>,
}

fn price_board() -> Arc<dyn weld_spi::Bean> {
    BeanBuilder::<PriceBoard>::new()
        .id("price-board")
        .scope(Scope::APPLICATION)
        .produce(|_| {
            Ok(PriceBoard {
                prices: Mutex::new(Vec::new()),
            })
        })
        .build()
}

fn record_on_board(id: &str, asynchronous: bool) -> Arc<dyn weld_spi::ObserverMethod> {
    let builder = ObserverBuilder::<PriceChanged>::new()
        .id(id)
        .declared_by("price-board");
    let builder = if asynchronous { builder.asynchronous() } else { builder };
    builder
        .notify(|event, context| {
            let board = context.receiver_as::<PriceBoard>().ok_or("没有接收者")?;
            board.prices.lock().push((event.sku.clone(), event.cents));
            Ok(())
        })
        .build()
}

/// 限定符事件只通知匹配的观察者, 接收者是应用作用域的同一实例
#[test]
fn qualified_events_reach_declaring_bean() -> anyhow::Result<()> {
    let discounts = Arc::new(AtomicUsize::new(0));
    let container = weld()
        .add_bean(price_board())
        .add_observer(record_on_board("board", false))
        .add_observer({
            let discounts = Arc::clone(&discounts);
            ObserverBuilder::<PriceChanged>::new()
                .qualifier(Qualifier::new("Discount"))
                .notify(move |_, _| {
                    discounts.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .build()
        })
        .initialize()?;

    let prices = container.event::<PriceChanged>();
    prices.fire(&PriceChanged {
        sku: "apple".to_string(),
        cents: 120,
    })?;
    prices.select(&[Qualifier::new("Discount")]).fire(&PriceChanged {
        sku: "pear".to_string(),
        cents: 80,
    })?;

    let board = container.reference::<PriceBoard>(&[])?.get()?;
    assert_eq!(
        *board.prices.lock(),
        vec![("apple".to_string(), 120), ("pear".to_string(), 80)]
    );
    assert_eq!(discounts.load(Ordering::SeqCst), 1);
    container.shutdown();
    Ok(())
}

/// 异步交付在运行时中完成, 同步观察者不参与
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_events_complete_on_executor() -> anyhow::Result<()> {
    let sync_calls = Arc::new(AtomicUsize::new(0));
    let container = weld()
        .add_bean(price_board())
        .add_observer(record_on_board("board-async", true))
        .add_observer({
            let sync_calls = Arc::clone(&sync_calls);
            ObserverBuilder::<PriceChanged>::new()
                .notify(move |_, _| {
                    sync_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .build()
        })
        .initialize()?;

    let deliveries = (0..4)
        .map(|n| {
            container.fire_async(
                PriceChanged {
                    sku: format!("sku-{n}"),
                    cents: n,
                },
                &[],
            )
        })
        .collect::<Result<Vec<_>, WeldError>>()?;
    for delivery in deliveries {
        delivery.await?;
    }

    let board = container.reference::<PriceBoard>(&[])?.get()?;
    let mut skus: Vec<String> = board.prices.lock().iter().map(|(sku, _)| sku.clone()).collect();
    skus.sort();
    assert_eq!(skus, vec!["sku-0", "sku-1", "sku-2", "sku-3"]);
    assert_eq!(sync_calls.load(Ordering::SeqCst), 0);
    container.shutdown();
    Ok(())
}

/// 异步失败汇总为复合异常, 第一个失败为主异常
#[tokio::test]
async fn async_failures_are_reported_together() -> anyhow::Result<()> {
    let failing = |id: &'static str, priority: i32| {
        ObserverBuilder::<PriceChanged>::new()
            .id(id)
            .priority(priority)
            .asynchronous()
            .notify(move |_, _| Err(format!("{id} 拒绝价格").into()))
            .build()
    };
    let container = weld()
        .add_observer(failing("audit", 2))
        .add_observer(failing("limits", 1))
        .initialize()?;

    let delivery = container.event::<PriceChanged>().fire_async(PriceChanged {
        sku: "plum".to_string(),
        cents: 0,
    })?;
    let exception = match delivery.await {
        Err(exception) => exception,
        Ok(()) => panic!("期望异步交付失败"),
    };
    assert_eq!(exception.failure_count(), 2);
    assert_eq!(exception.primary.observer, "limits");
    assert_eq!(exception.suppressed[0].observer, "audit");
    container.shutdown();
    Ok(())
}
