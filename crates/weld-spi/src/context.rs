//! 作用域上下文与 Bean 存储

use crate::bean::{Bean, BeanIdentifier, BeanInstance};
use crate::creational::CreationalContext;
use crate::scope::Scope;
use chrono::{DateTime, Utc};
use parking_lot::ReentrantMutex;
use std::fmt;
use std::sync::Arc;
use weld_common::WeldError;

/// 上下文实例: (实例, 创建上下文, 所属 Bean)
#[derive(Clone)]
pub struct ContextualInstance {
    bean: Arc<dyn Bean>,
    instance: BeanInstance,
    creational_context: CreationalContext,
    created_at: DateTime<Utc>,
}

impl ContextualInstance {
    /// 创建上下文实例
    pub fn new(
        bean: Arc<dyn Bean>,
        instance: BeanInstance,
        creational_context: CreationalContext,
    ) -> Self {
        Self {
            bean,
            instance,
            creational_context,
            created_at: Utc::now(),
        }
    }

    /// 所属 Bean
    pub fn bean(&self) -> &Arc<dyn Bean> {
        &self.bean
    }

    /// 实例
    pub fn instance(&self) -> &BeanInstance {
        &self.instance
    }

    /// 创建上下文
    pub fn creational_context(&self) -> &CreationalContext {
        &self.creational_context
    }

    /// 创建时间
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 销毁实例
    pub fn destroy(self) {
        let Self {
            bean,
            instance,
            creational_context,
            ..
        } = self;
        bean.destroy(instance, &creational_context);
    }
}

impl fmt::Debug for ContextualInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextualInstance")
            .field("bean", self.bean.id())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Bean 存储: 一个隔间 (一次请求、一个会话、整个应用) 内标识符到实例的映射
pub trait BeanStore: Send + Sync {
    /// 隔间标识 (会话 ID、对话 ID 等)
    fn compartment(&self) -> &str;

    /// 读取实例
    fn get(&self, id: &BeanIdentifier) -> Option<ContextualInstance>;

    /// 写入实例
    fn put(&self, id: BeanIdentifier, instance: ContextualInstance);

    /// 移除实例
    fn remove(&self, id: &BeanIdentifier) -> Option<ContextualInstance>;

    /// 按创建顺序列出标识符
    fn ids(&self) -> Vec<BeanIdentifier>;

    /// 清空, 不调用销毁回调
    fn clear(&self);

    /// 实例数量
    fn len(&self) -> usize;

    /// 是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 是否包含实例
    fn contains(&self, id: &BeanIdentifier) -> bool {
        self.get(id).is_some()
    }

    /// 按键的可重入创建锁; 单线程存储返回 `None`
    fn creation_lock(&self, _id: &BeanIdentifier) -> Option<Arc<ReentrantMutex<()>>> {
        None
    }
}

/// 作用域上下文
pub trait Context: Send + Sync {
    /// 作用域
    fn scope(&self) -> &Scope;

    /// 当前线程 / 隔间是否激活
    fn is_active(&self) -> bool;

    /// 读取实例; 不存在且提供了创建上下文时创建, 否则返回 `None`
    fn get(
        &self,
        bean: &Arc<dyn Bean>,
        creational_context: Option<&CreationalContext>,
    ) -> Result<Option<BeanInstance>, WeldError>;

    /// 销毁实例, 返回是否存在
    fn destroy(&self, bean: &dyn Bean) -> Result<bool, WeldError>;
}
