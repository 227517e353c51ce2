//! 启动校验、扩展与关闭顺序

mod common;

use common::weld;
use parking_lot::Mutex;
use std::sync::Arc;
use weld_common::{ProblemKind, WeldError};
use weld_core::{BeanBuilder, InterceptorBuilder, ObserverBuilder, ScopeLifecycleEvent};
use weld_spi::{
    AfterBeanDiscovery, AfterDeploymentValidation, BeanType, BeforeShutdown, Extension,
    ProcessBeanAttributes, Qualifier, Scope,
};

struct Service;
struct Repository;
struct Cache;

type Log = Arc<Mutex<Vec<String>>>;

struct AuditExtension {
    log: Log,
}

impl Extension for AuditExtension {
    fn name(&self) -> &str {
        "audit"
    }

    fn process_bean_attributes(&self, event: &mut ProcessBeanAttributes) {
        if event.bean().id().as_str() == "legacy" {
            event.veto();
        }
    }

    fn after_bean_discovery(&self, event: &mut AfterBeanDiscovery) {
        self.log.lock().push("after-bean-discovery".to_string());
        event.add_bean(
            BeanBuilder::<Cache>::new()
                .id("synthetic-cache")
                .scope(Scope::APPLICATION)
                .produce(|_| Ok(Cache))
                .build(),
        );
    }

    fn after_deployment_validation(&self, _event: &mut AfterDeploymentValidation) {
        self.log.lock().push("after-deployment-validation".to_string());
    }

    fn before_shutdown(&self, _event: &BeforeShutdown) {
        self.log.lock().push("before-shutdown".to_string());
    }
}

fn lifecycle_observer(log: &Log, label: &'static str, qualifier: Qualifier) -> Arc<dyn weld_spi::ObserverMethod> {
    let log = Arc::clone(log);
    ObserverBuilder::<ScopeLifecycleEvent>::new()
        .qualifier(qualifier)
        .notify(move |_, _| {
            log.lock().push(label.to_string());
            Ok(())
        })
        .build()
}

/// 启动与关闭按固定顺序通知扩展、观察者与销毁回调
#[test]
fn bootstrap_and_shutdown_order() -> anyhow::Result<()> {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let service = {
        let log = Arc::clone(&log);
        BeanBuilder::<Service>::new()
            .id("service")
            .scope(Scope::APPLICATION)
            .produce(|_| Ok(Service))
            .pre_destroy(move |_| log.lock().push("pre-destroy".to_string()))
            .build()
    };
    let legacy = BeanBuilder::<Repository>::new().id("legacy").build();

    let container = weld()
        .add_bean(service)
        .add_bean(legacy)
        .add_observer(lifecycle_observer(&log, "initialized", Qualifier::initialized(&Scope::APPLICATION)))
        .add_observer(lifecycle_observer(
            &log,
            "before-destroyed",
            Qualifier::before_destroyed(&Scope::APPLICATION),
        ))
        .add_observer(lifecycle_observer(&log, "destroyed", Qualifier::destroyed(&Scope::APPLICATION)))
        .add_extension(Arc::new(AuditExtension {
            log: Arc::clone(&log),
        }))
        .initialize()?;

    let manager = container.bean_manager();
    assert!(manager.resolve(&BeanType::of::<Repository>(), &[])?.is_unsatisfied());
    assert!(manager.resolve(&BeanType::of::<Cache>(), &[])?.is_unique());
    container.reference::<Service>(&[])?.get()?;

    container.shutdown();
    assert_eq!(
        *log.lock(),
        vec![
            "after-bean-discovery",
            "after-deployment-validation",
            "initialized",
            "before-destroyed",
            "before-shutdown",
            "pre-destroy",
            "destroyed",
        ]
    );
    Ok(())
}

/// 所有部署问题在一次失败中报告
#[test]
fn deployment_problems_are_aggregated() {
    let cache = |id: &str| BeanBuilder::<Cache>::new().id(id).build();
    let service = BeanBuilder::<Service>::new()
        .id("service")
        .inject::<Repository>(&[])
        .inject::<Cache>(&[])
        .build();
    let conflicting = BeanBuilder::<Repository>::new()
        .id("conflicting")
        .qualifier(Qualifier::new("Conflicting"))
        .intercepted(Qualifier::new("Timed").with_member("unit", "ms"))
        .intercepted(Qualifier::new("Timed").with_member("unit", "s"))
        .build();
    let unbound = InterceptorBuilder::new("unbound").build();

    let result = weld()
        .add_bean(service)
        .add_bean(cache("cache-a"))
        .add_bean(cache("cache-b"))
        .add_bean(conflicting)
        .add_interceptor(unbound)
        .initialize();

    let failure = match result {
        Err(WeldError::Deployment { source }) => source,
        Err(other) => panic!("期望部署失败, 实际 {other}"),
        Ok(container) => {
            container.shutdown();
            panic!("期望部署失败");
        }
    };
    assert_eq!(failure.deployment_errors().count(), 2);
    assert_eq!(failure.definition_errors().count(), 2);
    assert!(failure
        .problems
        .iter()
        .any(|p| p.kind == ProblemKind::Deployment && p.message.contains("歧义")));
    let rendered = failure.to_string();
    assert_eq!(rendered.lines().count(), 1 + failure.problems.len());
}

struct Gatekeeper;

impl Extension for Gatekeeper {
    fn after_deployment_validation(&self, event: &mut AfterDeploymentValidation) {
        if event.container().bean(&"forbidden".into()).is_some() {
            event.add_deployment_problem("forbidden 不允许部署");
        }
    }
}

#[test]
fn extension_can_abort_deployment() {
    let result = weld()
        .add_bean(BeanBuilder::<Service>::new().id("forbidden").build())
        .add_extension(Arc::new(Gatekeeper))
        .initialize();
    let Err(WeldError::Deployment { source }) = result else {
        panic!("期望部署失败");
    };
    assert_eq!(source.problems.len(), 1);
    assert!(source.problems[0].message.contains("forbidden"));
}
