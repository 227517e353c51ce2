//! 依赖伪作用域上下文

use std::sync::Arc;
use tracing::debug;
use weld_common::{ContextError, WeldError};
use weld_spi::{Bean, BeanInstance, Context, ContextualInstance, CreationalContext, Scope};

static DEPENDENT: Scope = Scope::DEPENDENT;

/// 依赖上下文: 总是激活, 每次获取都创建新实例
///
/// 新实例登记为调用方创建上下文的依赖对象, 随其所有者一起销毁。
#[derive(Debug, Default)]
pub struct DependentContext;

impl DependentContext {
    /// 创建
    pub fn new() -> Self {
        Self
    }
}

impl Context for DependentContext {
    fn scope(&self) -> &Scope {
        &DEPENDENT
    }

    fn is_active(&self) -> bool {
        true
    }

    fn get(
        &self,
        bean: &Arc<dyn Bean>,
        creational_context: Option<&CreationalContext>,
    ) -> Result<Option<BeanInstance>, WeldError> {
        let Some(parent) = creational_context else {
            return Ok(None);
        };
        let own = parent.child(bean.id());
        let instance = bean.create(&own)?;
        debug!("创建依赖实例: {}", bean.id());
        own.add_dependent_instance(ContextualInstance::new(bean.clone(), instance.clone(), own.clone()));
        Ok(Some(instance))
    }

    fn destroy(&self, _bean: &dyn Bean) -> Result<bool, WeldError> {
        Err(ContextError::UnsupportedOperation {
            scope: Scope::DEPENDENT.to_string(),
            operation: "destroy".to_string(),
        }
        .into())
    }
}
