//! 上下文共用的存储操作

use std::sync::Arc;
use tracing::{debug, warn};
use weld_common::{ContextError, WeldError};
use weld_spi::{Bean, BeanInstance, BeanStore, ContextualInstance, CreationalContext, Scope};

/// 从存储读取实例, 不存在且提供了创建上下文时创建
///
/// 创建在该键的创建锁下进行并二次检查, 同一隔间内同一 Bean 只创建一次;
/// 锁是可重入的, 创建函数可以查找同一存储中的其他 Bean。
pub fn get_from_store(
    store: &dyn BeanStore,
    bean: &Arc<dyn Bean>,
    creational_context: Option<&CreationalContext>,
) -> Result<Option<BeanInstance>, WeldError> {
    let id = bean.id();
    if let Some(existing) = store.get(id) {
        return Ok(Some(existing.instance().clone()));
    }
    let Some(creational_context) = creational_context else {
        return Ok(None);
    };

    let lock = store.creation_lock(id);
    let _guard = lock.as_ref().map(|lock| lock.lock());
    if let Some(existing) = store.get(id) {
        return Ok(Some(existing.instance().clone()));
    }

    let instance = bean.create(creational_context)?;
    store.put(
        id.clone(),
        ContextualInstance::new(bean.clone(), instance.clone(), creational_context.clone()),
    );
    debug!("创建上下文实例: {} (隔间 {})", id, store.compartment());
    Ok(Some(instance))
}

/// 销毁存储中的单个实例, 返回是否存在
pub fn destroy_in_store(store: &dyn BeanStore, bean: &dyn Bean) -> bool {
    match store.remove(bean.id()) {
        Some(instance) => {
            debug!("销毁上下文实例: {} (隔间 {})", bean.id(), store.compartment());
            instance.destroy();
            true
        }
        None => false,
    }
}

/// 以创建逆序销毁存储中的全部实例
pub fn destroy_all(store: &dyn BeanStore) {
    let ids = store.ids();
    if ids.is_empty() {
        return;
    }
    debug!("销毁隔间 {} 中的 {} 个实例", store.compartment(), ids.len());
    for id in ids.iter().rev() {
        if let Some(instance) = store.remove(id) {
            instance.destroy();
        }
    }
    if !store.is_empty() {
        warn!("隔间 {} 销毁期间又创建了实例, 一并清理", store.compartment());
        for id in store.ids().iter().rev() {
            if let Some(instance) = store.remove(id) {
                instance.destroy();
            }
        }
    }
}

/// 上下文未激活错误
pub fn not_active(scope: &Scope) -> WeldError {
    ContextError::NotActive {
        scope: scope.to_string(),
    }
    .into()
}

/// 激活的上下文缺少存储
pub fn store_missing(scope: &Scope) -> WeldError {
    ContextError::BeanStoreMissing {
        scope: scope.to_string(),
    }
    .into()
}
