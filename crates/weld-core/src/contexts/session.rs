//! 会话作用域上下文
//!
//! 每个会话 ID 对应一个并发存储, 同一会话的多个请求线程可以同时访问;
//! 线程通过 `activate(session_id)` 关联到会话, 存储的生命周期跟随会话而不是请求。

use super::bean_store::ConcurrentBeanStore;
use super::support::{destroy_all, destroy_in_store, get_from_store, not_active, store_missing};
use super::thread_bound::ThreadBound;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};
use weld_common::WeldError;
use weld_spi::{Bean, BeanInstance, BeanStore, Context, CreationalContext, Scope};

/// 会话上下文
pub struct SessionContext {
    scope: Scope,
    sessions: DashMap<String, Arc<ConcurrentBeanStore>>,
    current: ThreadBound<String>,
}

impl SessionContext {
    /// 创建
    pub fn new() -> Self {
        Self {
            scope: Scope::SESSION,
            sessions: DashMap::new(),
            current: ThreadBound::new(),
        }
    }

    /// 把当前线程关联到会话, 会话不存在时创建其存储
    pub fn activate(&self, session_id: impl Into<String>) {
        let session_id = session_id.into();
        self.sessions
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(ConcurrentBeanStore::new(session_id.clone())));
        debug!("激活会话上下文: {}", session_id);
        self.current.set(session_id);
    }

    /// 解除当前线程与会话的关联, 会话及其实例保留
    pub fn deactivate(&self) -> Option<String> {
        let session_id = self.current.take();
        if let Some(session_id) = &session_id {
            debug!("停用会话上下文: {}", session_id);
        }
        session_id
    }

    /// 结束当前会话: 销毁其实例并解除关联
    pub fn invalidate(&self) -> Result<(), WeldError> {
        let session_id = self.current.take().ok_or_else(|| not_active(&self.scope))?;
        self.destroy_session(&session_id);
        Ok(())
    }

    /// 外部结束会话 (例如会话超时), 返回会话是否存在
    pub fn destroy_session(&self, session_id: &str) -> bool {
        match self.sessions.remove(session_id) {
            Some((_, store)) => {
                info!("销毁会话: {} ({} 个实例)", session_id, store.len());
                destroy_all(store.as_ref());
                true
            }
            None => false,
        }
    }

    /// 销毁全部会话
    pub fn destroy_all_sessions(&self) {
        for session_id in self.session_ids() {
            self.destroy_session(&session_id);
        }
    }

    /// 现存会话 ID
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// 当前线程关联的会话
    pub fn current_session(&self) -> Option<String> {
        self.current.get()
    }

    fn current_store(&self) -> Result<Arc<ConcurrentBeanStore>, WeldError> {
        let session_id = self.current.get().ok_or_else(|| not_active(&self.scope))?;
        self.sessions
            .get(&session_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| store_missing(&self.scope))
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Context for SessionContext {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn is_active(&self) -> bool {
        self.current.is_set()
    }

    fn get(
        &self,
        bean: &Arc<dyn Bean>,
        creational_context: Option<&CreationalContext>,
    ) -> Result<Option<BeanInstance>, WeldError> {
        let store = self.current_store()?;
        get_from_store(store.as_ref(), bean, creational_context)
    }

    fn destroy(&self, bean: &dyn Bean) -> Result<bool, WeldError> {
        let store = self.current_store()?;
        Ok(destroy_in_store(store.as_ref(), bean))
    }
}
