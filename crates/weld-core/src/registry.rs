//! 进程级容器注册表
//!
//! 上线的容器按 ID 注册, 关闭时移除。反序列化的代理句柄通过注册表找回容器。

use crate::manager::BeanManager;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info};
use weld_common::{ContainerError, WeldError};

static CONTAINERS: Lazy<RwLock<HashMap<String, BeanManager>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// 注册上线的容器
pub fn register(manager: BeanManager) -> Result<(), WeldError> {
    let mut containers = CONTAINERS.write();
    let id = manager.id().to_string();
    if containers.contains_key(&id) {
        return Err(ContainerError::DuplicateContainer { id }.into());
    }
    info!("注册容器: {}", id);
    containers.insert(id, manager);
    Ok(())
}

/// 移除容器, 返回是否存在
pub fn unregister(id: &str) -> bool {
    let removed = CONTAINERS.write().remove(id).is_some();
    if removed {
        debug!("注销容器: {}", id);
    }
    removed
}

/// 按 ID 查找容器
pub fn instance(id: &str) -> Result<BeanManager, WeldError> {
    CONTAINERS
        .read()
        .get(id)
        .cloned()
        .ok_or_else(|| ContainerError::UnknownContainer { id: id.to_string() }.into())
}

/// 唯一运行中的容器
pub fn current() -> Result<BeanManager, WeldError> {
    let containers = CONTAINERS.read();
    let mut running = containers.values().filter(|manager| manager.is_running());
    let Some(manager) = running.next() else {
        return Err(ContainerError::NoContainer.into());
    };
    let others = running.count();
    if others > 0 {
        return Err(ContainerError::MultipleContainers { count: others + 1 }.into());
    }
    Ok(manager.clone())
}

/// 已注册容器的 ID, 已排序
pub fn ids() -> Vec<String> {
    let mut ids: Vec<String> = CONTAINERS.read().keys().cloned().collect();
    ids.sort();
    ids
}

/// 是否已注册
pub fn contains(id: &str) -> bool {
    CONTAINERS.read().contains_key(id)
}
