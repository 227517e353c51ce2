//! 请求作用域上下文
//!
//! 存储绑定到当前线程: `activate()` 建立新的存储, `deactivate()` 把它从线程上摘下
//! (可以稍后通过 `activate_with` 在同一或另一个线程上恢复), `invalidate()` 销毁实例。
//! 上下文同时登记所有线程上仍处于激活状态的存储, 容器关闭时由 `destroy_all_active` 统一销毁。

use super::bean_store::LocalBeanStore;
use super::support::{destroy_all, destroy_in_store, get_from_store, not_active};
use super::thread_bound::ThreadBound;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;
use weld_common::{ScopeGuard, WeldError};
use weld_spi::{Bean, BeanInstance, BeanStore, Context, CreationalContext, Scope};

/// 请求上下文
pub struct RequestContext {
    scope: Scope,
    store: ThreadBound<Arc<dyn BeanStore>>,
    active: DashMap<String, Arc<dyn BeanStore>>,
}

impl RequestContext {
    /// 创建
    pub fn new() -> Self {
        Self::with_scope(Scope::REQUEST)
    }

    /// 为其他线程绑定的作用域复用同一实现
    pub fn with_scope(scope: Scope) -> Self {
        Self {
            scope,
            store: ThreadBound::new(),
            active: DashMap::new(),
        }
    }

    /// 在当前线程上以新的存储激活; 已激活时保留现有存储
    pub fn activate(&self) {
        if self.store.is_set() {
            debug!("{} 上下文已经激活", self.scope);
            return;
        }
        let compartment = format!("{}-{}", self.scope.name(), Uuid::new_v4());
        debug!("激活 {} 上下文: {}", self.scope, compartment);
        let store: Arc<dyn BeanStore> = Arc::new(LocalBeanStore::new(compartment.clone()));
        self.active.insert(compartment, Arc::clone(&store));
        self.store.set(store);
    }

    /// 以已有存储激活 (恢复挂起的请求)
    pub fn activate_with(&self, store: Arc<dyn BeanStore>) {
        debug!("以已有存储激活 {} 上下文: {}", self.scope, store.compartment());
        let compartment = store.compartment().to_string();
        if let Some(previous) = self.store.set(Arc::clone(&store)) {
            self.active.remove(previous.compartment());
            warn!(
                "{} 上下文激活时替换了未停用的存储: {}",
                self.scope,
                previous.compartment()
            );
        }
        self.active.insert(compartment, store);
    }

    /// 停用: 把存储从当前线程上摘下并返回, 不销毁实例
    pub fn deactivate(&self) -> Option<Arc<dyn BeanStore>> {
        let store = self.store.take();
        if let Some(store) = &store {
            debug!("停用 {} 上下文: {}", self.scope, store.compartment());
            self.active.remove(store.compartment());
        }
        store
    }

    /// 以创建逆序销毁当前存储中的全部实例, 上下文保持激活
    pub fn invalidate(&self) -> Result<(), WeldError> {
        let store = self.store.get().ok_or_else(|| not_active(&self.scope))?;
        destroy_all(store.as_ref());
        Ok(())
    }

    /// 激活并返回守卫, 守卫释放时销毁实例并停用
    pub fn activate_scoped(self: &Arc<Self>) -> ActivationGuard {
        self.activate();
        let context = Arc::clone(self);
        ActivationGuard {
            _guard: ScopeGuard::new(
                format!("{}-activation", self.scope.name()),
                Box::new(move || {
                    if let Some(store) = context.deactivate() {
                        destroy_all(store.as_ref());
                    }
                }),
            ),
        }
    }

    /// 销毁所有线程上仍激活的存储中的实例, 返回存储数量
    ///
    /// 其他线程上的绑定保留, 但存储已被清空; 这些线程停用后绑定随之释放。
    pub fn destroy_all_active(&self) -> usize {
        let compartments: Vec<String> = self.active.iter().map(|e| e.key().clone()).collect();
        let mut destroyed = 0;
        for compartment in compartments {
            if let Some((_, store)) = self.active.remove(&compartment) {
                debug!("销毁仍激活的 {} 存储: {}", self.scope, compartment);
                destroy_all(store.as_ref());
                destroyed += 1;
            }
        }
        destroyed
    }

    /// 当前线程上的存储
    pub fn current_store(&self) -> Option<Arc<dyn BeanStore>> {
        self.store.get()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Context for RequestContext {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn is_active(&self) -> bool {
        self.store.is_set()
    }

    fn get(
        &self,
        bean: &Arc<dyn Bean>,
        creational_context: Option<&CreationalContext>,
    ) -> Result<Option<BeanInstance>, WeldError> {
        let store = self.store.get().ok_or_else(|| not_active(&self.scope))?;
        get_from_store(store.as_ref(), bean, creational_context)
    }

    fn destroy(&self, bean: &dyn Bean) -> Result<bool, WeldError> {
        let store = self.store.get().ok_or_else(|| not_active(&self.scope))?;
        Ok(destroy_in_store(store.as_ref(), bean))
    }
}

/// 请求激活守卫
///
/// 守卫必须在激活它的线程上释放。
#[must_use = "守卫释放时请求上下文即被销毁"]
pub struct ActivationGuard {
    _guard: ScopeGuard,
}

impl std::fmt::Debug for ActivationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationGuard").finish_non_exhaustive()
    }
}
