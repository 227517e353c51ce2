//! 共享存储上下文
//!
//! 应用作用域、单例伪作用域以及扩展注册的自定义作用域都使用同一种实现:
//! 一个全局共享的并发存储, 从激活一直存活到容器关闭。

use super::bean_store::ConcurrentBeanStore;
use super::support::{destroy_all, destroy_in_store, get_from_store, not_active};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use weld_common::WeldError;
use weld_spi::{Bean, BeanInstance, BeanStore, Context, CreationalContext, Scope};

/// 共享存储上下文
pub struct SharedContext {
    scope: Scope,
    store: ConcurrentBeanStore,
    active: AtomicBool,
}

impl SharedContext {
    /// 为任意作用域创建已激活的上下文
    pub fn new(scope: Scope) -> Self {
        let compartment = scope.name().to_string();
        Self {
            scope,
            store: ConcurrentBeanStore::new(compartment),
            active: AtomicBool::new(true),
        }
    }

    /// 应用作用域上下文
    pub fn application() -> Self {
        Self::new(Scope::APPLICATION)
    }

    /// 单例上下文
    pub fn singleton() -> Self {
        Self::new(Scope::SINGLETON)
    }

    /// 激活
    pub fn activate(&self) {
        self.active.store(true, Ordering::SeqCst);
    }

    /// 停用, 不销毁实例
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// 以创建逆序销毁全部实例
    pub fn invalidate(&self) {
        info!("销毁 {} 上下文中的 {} 个实例", self.scope, self.store.len());
        destroy_all(&self.store);
    }

    /// 底层存储
    pub fn bean_store(&self) -> &dyn BeanStore {
        &self.store
    }
}

impl Context for SharedContext {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn get(
        &self,
        bean: &Arc<dyn Bean>,
        creational_context: Option<&CreationalContext>,
    ) -> Result<Option<BeanInstance>, WeldError> {
        if !self.is_active() {
            return Err(not_active(&self.scope));
        }
        get_from_store(&self.store, bean, creational_context)
    }

    fn destroy(&self, bean: &dyn Bean) -> Result<bool, WeldError> {
        if !self.is_active() {
            return Err(not_active(&self.scope));
        }
        Ok(destroy_in_store(&self.store, bean))
    }
}
