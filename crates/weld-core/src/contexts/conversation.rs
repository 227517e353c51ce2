//! 对话作用域上下文
//!
//! 每次激活都关联一个对话: 要么恢复一个长期对话, 要么开始一个临时对话。
//! 临时对话在停用时销毁; 长期对话跨多次激活存活, 直到 `end()` 或超时。
//! 同一长期对话同一时刻只能被一个线程使用。

use super::bean_store::LocalBeanStore;
use super::support::{destroy_all, destroy_in_store, get_from_store, not_active};
use super::thread_bound::ThreadBound;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;
use weld_common::{ContextError, ConversationSettings, WeldError};
use weld_spi::{Bean, BeanInstance, Context, CreationalContext, Scope};

struct ConversationState {
    id: Mutex<Option<String>>,
    store: LocalBeanStore,
    transient: AtomicBool,
    last_used: Mutex<Instant>,
    in_use: Mutex<bool>,
    released: Condvar,
}

impl ConversationState {
    fn transient() -> Self {
        Self {
            id: Mutex::new(None),
            store: LocalBeanStore::new(format!("conversation-{}", Uuid::new_v4())),
            transient: AtomicBool::new(true),
            last_used: Mutex::new(Instant::now()),
            in_use: Mutex::new(true),
            released: Condvar::new(),
        }
    }

    fn id(&self) -> Option<String> {
        self.id.lock().clone()
    }

    fn is_transient(&self) -> bool {
        self.transient.load(Ordering::SeqCst)
    }

    fn acquire(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut in_use = self.in_use.lock();
        while *in_use {
            if self.released.wait_until(&mut in_use, deadline).timed_out() && *in_use {
                return false;
            }
        }
        *in_use = true;
        true
    }

    fn release(&self) {
        *self.last_used.lock() = Instant::now();
        *self.in_use.lock() = false;
        self.released.notify_one();
    }

    fn is_expired(&self, timeout: Duration) -> bool {
        !*self.in_use.lock() && self.last_used.lock().elapsed() >= timeout
    }
}

/// 当前对话的信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationInfo {
    /// 对话 ID, 临时对话为 `None`
    pub id: Option<String>,
    /// 是否为临时对话
    pub transient: bool,
}

/// 对话上下文
pub struct ConversationContext {
    scope: Scope,
    conversations: DashMap<String, Arc<ConversationState>>,
    current: ThreadBound<Arc<ConversationState>>,
    counter: AtomicU64,
    timeout: Duration,
    concurrent_access_timeout: Duration,
}

impl ConversationContext {
    /// 按配置创建
    pub fn new(settings: &ConversationSettings) -> Self {
        Self::with_timeouts(settings.timeout(), settings.concurrent_access_timeout())
    }

    /// 指定超时创建
    pub fn with_timeouts(timeout: Duration, concurrent_access_timeout: Duration) -> Self {
        Self {
            scope: Scope::CONVERSATION,
            conversations: DashMap::new(),
            current: ThreadBound::new(),
            counter: AtomicU64::new(0),
            timeout,
            concurrent_access_timeout,
        }
    }

    /// 激活: 给定 ID 时恢复对应的长期对话, 否则开始临时对话
    ///
    /// ID 不存在时仍然关联一个临时对话, 并返回 `NonexistentConversation`;
    /// 对话正被其他线程使用时最多等待并发访问超时, 随后返回 `ConversationBusy`。
    pub fn activate(&self, cid: Option<&str>) -> Result<(), WeldError> {
        if self.current.is_set() {
            return Err(ContextError::IllegalConversationState {
                message: "当前线程已关联对话".to_string(),
            }
            .into());
        }
        let Some(cid) = cid else {
            debug!("激活对话上下文: 临时对话");
            self.current.set(Arc::new(ConversationState::transient()));
            return Ok(());
        };

        let existing = self.conversations.get(cid).map(|entry| entry.value().clone());
        match existing {
            Some(conversation) => {
                if !conversation.acquire(self.concurrent_access_timeout) {
                    warn!("对话 {} 正被其他线程使用", cid);
                    return Err(ContextError::ConversationBusy {
                        cid: cid.to_string(),
                    }
                    .into());
                }
                debug!("恢复长期对话: {}", cid);
                self.current.set(conversation);
                Ok(())
            }
            None => {
                debug!("对话 {} 不存在, 关联临时对话", cid);
                self.current.set(Arc::new(ConversationState::transient()));
                Err(ContextError::NonexistentConversation {
                    cid: cid.to_string(),
                }
                .into())
            }
        }
    }

    /// 把当前临时对话提升为长期对话, 返回对话 ID
    pub fn begin(&self, id: Option<String>) -> Result<String, WeldError> {
        let conversation = self.current.get().ok_or_else(|| not_active(&self.scope))?;
        if !conversation.is_transient() {
            return Err(ContextError::IllegalConversationState {
                message: format!("对话 {:?} 已经是长期对话", conversation.id()),
            }
            .into());
        }
        loop {
            let candidate = match &id {
                Some(id) => id.clone(),
                None => (self.counter.fetch_add(1, Ordering::SeqCst) + 1).to_string(),
            };
            match self.conversations.entry(candidate.clone()) {
                Entry::Occupied(_) if id.is_some() => {
                    return Err(ContextError::IllegalConversationState {
                        message: format!("对话 ID 已被占用: {candidate}"),
                    }
                    .into());
                }
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    *conversation.id.lock() = Some(candidate.clone());
                    conversation.transient.store(false, Ordering::SeqCst);
                    slot.insert(conversation);
                    info!("开始长期对话: {}", candidate);
                    return Ok(candidate);
                }
            }
        }
    }

    /// 把当前长期对话降为临时对话, 停用时随之销毁
    pub fn end(&self) -> Result<(), WeldError> {
        let conversation = self.current.get().ok_or_else(|| not_active(&self.scope))?;
        if conversation.is_transient() {
            return Err(ContextError::IllegalConversationState {
                message: "临时对话不能结束".to_string(),
            }
            .into());
        }
        conversation.transient.store(true, Ordering::SeqCst);
        if let Some(id) = conversation.id.lock().take() {
            self.conversations.remove(&id);
            info!("结束长期对话: {}", id);
        }
        Ok(())
    }

    /// 停用: 临时对话被销毁, 长期对话被释放以便后续恢复
    pub fn deactivate(&self) {
        let Some(conversation) = self.current.take() else {
            return;
        };
        if conversation.is_transient() {
            debug!("停用对话上下文, 销毁临时对话");
            destroy_all(&conversation.store);
        } else {
            debug!("停用对话上下文, 保留长期对话 {:?}", conversation.id());
            conversation.release();
        }
    }

    /// 使当前对话在停用时被销毁
    pub fn invalidate(&self) -> Result<(), WeldError> {
        let conversation = self.current.get().ok_or_else(|| not_active(&self.scope))?;
        if !conversation.is_transient() {
            self.end()?;
        }
        Ok(())
    }

    /// 销毁超时且空闲的长期对话, 返回销毁数量
    pub fn destroy_expired(&self) -> usize {
        let expired: Vec<String> = self
            .conversations
            .iter()
            .filter(|entry| entry.value().is_expired(self.timeout))
            .map(|entry| entry.key().clone())
            .collect();
        let mut destroyed = 0;
        for id in expired {
            if let Some((_, conversation)) = self.conversations.remove(&id) {
                info!("长期对话超时: {}", id);
                destroy_all(&conversation.store);
                destroyed += 1;
            }
        }
        destroyed
    }

    /// 销毁全部长期对话与当前线程的对话
    pub fn destroy_all_conversations(&self) {
        if let Some(conversation) = self.current.take() {
            destroy_all(&conversation.store);
        }
        let ids: Vec<String> = self.conversation_ids();
        for id in ids {
            if let Some((_, conversation)) = self.conversations.remove(&id) {
                destroy_all(&conversation.store);
            }
        }
    }

    /// 现存长期对话 ID
    pub fn conversation_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .conversations
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        ids
    }

    /// 当前线程关联的对话
    pub fn current(&self) -> Option<ConversationInfo> {
        self.current.get().map(|conversation| ConversationInfo {
            id: conversation.id(),
            transient: conversation.is_transient(),
        })
    }

    /// 长期对话超时
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Context for ConversationContext {
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
        let conversation = self.current.get().ok_or_else(|| not_active(&self.scope))?;
        get_from_store(&conversation.store, bean, creational_context)
    }

    fn destroy(&self, bean: &dyn Bean) -> Result<bool, WeldError> {
        let conversation = self.current.get().ok_or_else(|| not_active(&self.scope))?;
        Ok(destroy_in_store(&conversation.store, bean))
    }
}

impl std::fmt::Debug for ConversationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationContext")
            .field("conversations", &self.conversation_ids())
            .field("timeout", &self.timeout)
            .finish()
    }
}
