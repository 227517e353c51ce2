//! `#[derive(Qualifier)]` 与 `#[client_proxy]` 在容器中的使用

mod common;

use common::weld;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use weld_core::{BeanBuilder, InterceptorBuilder};
use weld_macros::{client_proxy, Qualifier};
use weld_spi::{AsQualifier, Qualifier, Scope};

#[derive(Qualifier)]
struct Premium;

#[derive(Qualifier)]
#[qualifier(name = "Region")]
struct RegionQualifier {
    code: String,
    #[qualifier(nonbinding)]
    note: String,
}

#[derive(Qualifier)]
struct Audited;

#[client_proxy]
trait PriceService {
    fn quote(&self, sku: &str, quantity: u32) -> u64;
    fn currency(&self) -> String;
}

struct StandardPrices {
    unit: u64,
    calls: AtomicUsize,
}

impl PriceService for StandardPrices {
    fn quote(&self, _sku: &str, quantity: u32) -> u64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.unit * u64::from(quantity)
    }

    fn currency(&self) -> String {
        "CNY".to_string()
    }
}

fn prices(id: &str, unit: u64, qualifier: Qualifier) -> Arc<dyn weld_spi::Bean> {
    BeanBuilder::<StandardPrices>::new()
        .id(id)
        .scope(Scope::APPLICATION)
        .qualifier(qualifier)
        .intercepted(Audited)
        .produce(move |_| {
            Ok(StandardPrices {
                unit,
                calls: AtomicUsize::new(0),
            })
        })
        .build()
}

#[test]
fn derived_qualifiers_carry_members() {
    let premium: Qualifier = Premium.into();
    assert_eq!(premium.type_name(), "Premium");

    let north = RegionQualifier {
        code: "north".to_string(),
        note: "first".to_string(),
    };
    let qualifier = north.to_qualifier();
    assert_eq!(qualifier.type_name(), "Region");
    assert!(qualifier.is_binding("code"));
    assert!(!qualifier.is_binding("note"));

    // 非绑定成员不影响相等性
    let same_region = RegionQualifier {
        code: "north".to_string(),
        note: "second".to_string(),
    }
    .to_qualifier();
    assert_eq!(qualifier, same_region);
    let other_region = RegionQualifier {
        code: "south".to_string(),
        note: "first".to_string(),
    }
    .to_qualifier();
    assert_ne!(qualifier, other_region);
}

/// 代理 trait 的调用经过拦截链, 到达按限定符选中的上下文实例
#[test]
fn client_proxy_trait_calls_go_through_interceptors() -> anyhow::Result<()> {
    let audit = Arc::new(Mutex::new(Vec::<String>::new()));
    let container = weld()
        .add_bean(prices("standard", 10, Qualifier::new("Standard")))
        .add_bean(prices("premium", 25, Premium.into()))
        .add_interceptor({
            let audit = Arc::clone(&audit);
            InterceptorBuilder::new("audit")
                .binding(Audited)
                .around_invoke(move |ctx| {
                    audit.lock().push(format!("{}#{}", ctx.bean().id(), ctx.method()));
                    ctx.proceed()
                })
                .build()
        })
        .initialize()?;

    let premium = container.reference::<StandardPrices>(&[Premium.into()])?;
    assert!(premium.is_proxy());
    assert_eq!(premium.quote("tea", 2), 50);
    assert_eq!(premium.currency(), "CNY");

    let proxy = premium.as_proxy().cloned().ok_or_else(|| anyhow::anyhow!("应为客户端代理"))?;
    assert_eq!(proxy.quote("tea", 4), 100);
    assert_eq!(premium.get()?.calls.load(Ordering::SeqCst), 2);

    // 以 trait 对象使用
    let service: &dyn PriceService = &proxy;
    assert_eq!(service.quote("tea", 1), 25);

    assert_eq!(
        *audit.lock(),
        vec![
            "premium#quote",
            "premium#currency",
            "premium#quote",
            "premium#quote",
        ]
    );
    container.shutdown();
    Ok(())
}
