//! Bean 存储实现

use dashmap::DashMap;
use parking_lot::{Mutex, ReentrantMutex};
use std::fmt;
use std::sync::Arc;
use weld_spi::{BeanIdentifier, BeanStore, ContextualInstance};

/// 并发 Bean 存储
///
/// 应用、单例与会话隔间使用: 多个线程可以同时读写,
/// 每个键带一把可重入的创建锁, 保证同一 Bean 最多创建一次。
/// 创建锁在实例移除后保留 (数量以 Bean 数为上限), 移除期间仍在创建的线程与后来者共用同一把锁。
pub struct ConcurrentBeanStore {
    compartment: String,
    instances: DashMap<BeanIdentifier, ContextualInstance>,
    order: Mutex<Vec<BeanIdentifier>>,
    locks: DashMap<BeanIdentifier, Arc<ReentrantMutex<()>>>,
}

impl ConcurrentBeanStore {
    /// 创建存储
    pub fn new(compartment: impl Into<String>) -> Self {
        Self {
            compartment: compartment.into(),
            instances: DashMap::new(),
            order: Mutex::new(Vec::new()),
            locks: DashMap::new(),
        }
    }
}

impl BeanStore for ConcurrentBeanStore {
    fn compartment(&self) -> &str {
        &self.compartment
    }

    fn get(&self, id: &BeanIdentifier) -> Option<ContextualInstance> {
        self.instances.get(id).map(|entry| entry.value().clone())
    }

    fn put(&self, id: BeanIdentifier, instance: ContextualInstance) {
        if self.instances.insert(id.clone(), instance).is_none() {
            self.order.lock().push(id);
        }
    }

    fn remove(&self, id: &BeanIdentifier) -> Option<ContextualInstance> {
        let removed = self.instances.remove(id).map(|(_, instance)| instance);
        if removed.is_some() {
            self.order.lock().retain(|existing| existing != id);
        }
        removed
    }

    fn ids(&self) -> Vec<BeanIdentifier> {
        self.order.lock().clone()
    }

    fn clear(&self) {
        self.instances.clear();
        self.order.lock().clear();
    }

    fn len(&self) -> usize {
        self.instances.len()
    }

    fn creation_lock(&self, id: &BeanIdentifier) -> Option<Arc<ReentrantMutex<()>>> {
        Some(
            self.locks
                .entry(id.clone())
                .or_insert_with(|| Arc::new(ReentrantMutex::new(())))
                .clone(),
        )
    }
}

impl fmt::Debug for ConcurrentBeanStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentBeanStore")
            .field("compartment", &self.compartment)
            .field("ids", &self.ids())
            .finish()
    }
}

/// 线程本地隔间使用的 Bean 存储 (请求、对话)
///
/// 正常使用下只有一个线程访问, 仍以互斥锁保护, 误用时不会破坏状态。
pub struct LocalBeanStore {
    compartment: String,
    entries: Mutex<Vec<(BeanIdentifier, ContextualInstance)>>,
}

impl LocalBeanStore {
    /// 创建存储
    pub fn new(compartment: impl Into<String>) -> Self {
        Self {
            compartment: compartment.into(),
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl BeanStore for LocalBeanStore {
    fn compartment(&self) -> &str {
        &self.compartment
    }

    fn get(&self, id: &BeanIdentifier) -> Option<ContextualInstance> {
        self.entries
            .lock()
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, instance)| instance.clone())
    }

    fn put(&self, id: BeanIdentifier, instance: ContextualInstance) {
        let mut entries = self.entries.lock();
        match entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = instance,
            None => entries.push((id, instance)),
        }
    }

    fn remove(&self, id: &BeanIdentifier) -> Option<ContextualInstance> {
        let mut entries = self.entries.lock();
        let index = entries.iter().position(|(existing, _)| existing == id)?;
        Some(entries.remove(index).1)
    }

    fn ids(&self) -> Vec<BeanIdentifier> {
        self.entries.lock().iter().map(|(id, _)| id.clone()).collect()
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

impl fmt::Debug for LocalBeanStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBeanStore")
            .field("compartment", &self.compartment)
            .field("ids", &self.ids())
            .finish()
    }
}
