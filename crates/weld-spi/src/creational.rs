//! 创建上下文
//!
//! 创建上下文构成一棵树: 为某个 Bean 创建的子上下文把依赖对象登记到父上下文,
//! 所有者被销毁时, 其依赖对象随之以登记的逆序销毁且只销毁一次。

use crate::bean::{same_instance, BeanIdentifier, BeanInstance};
use crate::container::BeanContainer;
use crate::context::ContextualInstance;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;
use weld_common::{ContainerError, WeldError};

struct CreationalContextInner {
    bean: Option<BeanIdentifier>,
    dependents: Mutex<Vec<ContextualInstance>>,
    parent: Option<Weak<CreationalContextInner>>,
    container: Option<Weak<dyn BeanContainer>>,
}

/// 创建上下文
#[derive(Clone)]
pub struct CreationalContext {
    inner: Arc<CreationalContextInner>,
}

impl CreationalContext {
    /// 创建根上下文
    pub fn new(container: Option<Weak<dyn BeanContainer>>, bean: Option<BeanIdentifier>) -> Self {
        Self {
            inner: Arc::new(CreationalContextInner {
                bean,
                dependents: Mutex::new(Vec::new()),
                parent: None,
                container,
            }),
        }
    }

    /// 创建不关联容器的根上下文
    pub fn detached() -> Self {
        Self::new(None, None)
    }

    /// 为依赖 Bean 创建子上下文, 子上下文中的依赖对象登记到当前上下文
    pub fn child(&self, bean: &BeanIdentifier) -> Self {
        Self {
            inner: Arc::new(CreationalContextInner {
                bean: Some(bean.clone()),
                dependents: Mutex::new(Vec::new()),
                parent: Some(Arc::downgrade(&self.inner)),
                container: self.inner.container.clone(),
            }),
        }
    }

    /// 所属 Bean
    pub fn bean(&self) -> Option<&BeanIdentifier> {
        self.inner.bean.as_ref()
    }

    /// 所属容器
    pub fn container(&self) -> Result<Arc<dyn BeanContainer>, WeldError> {
        self.inner
            .container
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or_else(|| {
                ContainerError::Unavailable {
                    id: self
                        .inner
                        .bean
                        .as_ref()
                        .map_or_else(|| "<detached>".to_string(), ToString::to_string),
                }
                .into()
            })
    }

    /// 登记依赖对象: 子上下文登记到父上下文, 根上下文登记到自身
    pub fn add_dependent_instance(&self, instance: ContextualInstance) {
        self.owner().dependents.lock().push(instance);
    }

    fn owner(&self) -> Arc<CreationalContextInner> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .unwrap_or_else(|| Arc::clone(&self.inner))
    }

    /// 当前登记的依赖对象快照
    pub fn dependent_instances(&self) -> Vec<ContextualInstance> {
        self.inner.dependents.lock().clone()
    }

    /// 依赖对象数量
    pub fn dependent_count(&self) -> usize {
        self.inner.dependents.lock().len()
    }

    /// 销毁登记在当前上下文中的单个依赖对象, 返回是否找到
    pub fn destroy_dependent_instance(&self, instance: &BeanInstance) -> bool {
        let removed = {
            let mut dependents = self.inner.dependents.lock();
            dependents
                .iter()
                .position(|d| same_instance(d.instance(), instance))
                .map(|index| dependents.remove(index))
        };
        match removed {
            Some(dependent) => {
                dependent.destroy();
                true
            }
            None => false,
        }
    }

    /// 释放: 以登记逆序销毁全部依赖对象, 重复调用不会重复销毁
    pub fn release(&self) {
        let dependents = std::mem::take(&mut *self.inner.dependents.lock());
        if dependents.is_empty() {
            return;
        }
        debug!(
            "释放创建上下文: {:?}, 依赖对象 {} 个",
            self.inner.bean,
            dependents.len()
        );
        for dependent in dependents.into_iter().rev() {
            dependent.destroy();
        }
    }

    /// 是否为同一个创建上下文
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for CreationalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationalContext")
            .field("bean", &self.inner.bean)
            .field("dependents", &self.dependent_count())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}
