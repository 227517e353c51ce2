//! 容器契约
//!
//! 客户端代理、创建上下文与编程式查找通过该 trait 回到容器,
//! 而不依赖具体的 Bean 管理器实现。

use crate::bean::{Bean, BeanIdentifier};
use crate::context::Context;
use crate::creational::CreationalContext;
use crate::interceptor::Interceptor;
use crate::qualifier::{describe_qualifiers, Qualifier};
use crate::scope::Scope;
use crate::types::BeanType;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use weld_common::{ResolutionError, WeldError};

/// 解析结果
#[derive(Clone)]
pub enum ResolutionOutcome {
    /// 没有候选
    Unsatisfied,
    /// 唯一候选
    Unique(Arc<dyn Bean>),
    /// 多个候选, 按标识符排序
    Ambiguous(Vec<Arc<dyn Bean>>),
}

impl ResolutionOutcome {
    /// 由收窄后的候选集构建结果
    pub fn from_candidates(mut candidates: Vec<Arc<dyn Bean>>) -> Self {
        match candidates.len() {
            0 => Self::Unsatisfied,
            1 => Self::Unique(candidates.remove(0)),
            _ => {
                candidates.sort_by(|a, b| a.id().cmp(b.id()));
                Self::Ambiguous(candidates)
            }
        }
    }

    /// 是否未满足
    pub fn is_unsatisfied(&self) -> bool {
        matches!(self, Self::Unsatisfied)
    }

    /// 是否有歧义
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous(_))
    }

    /// 是否唯一
    pub fn is_unique(&self) -> bool {
        matches!(self, Self::Unique(_))
    }

    /// 唯一候选
    pub fn unique(&self) -> Option<&Arc<dyn Bean>> {
        match self {
            Self::Unique(bean) => Some(bean),
            _ => None,
        }
    }

    /// 转换为需要唯一结果的调用方所用的 `Result`
    pub fn into_unique(
        self,
        required: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<Arc<dyn Bean>, ResolutionError> {
        match self {
            Self::Unique(bean) => Ok(bean),
            Self::Unsatisfied => Err(ResolutionError::Unsatisfied {
                required: required.to_string(),
                qualifiers: describe_qualifiers(qualifiers),
            }),
            Self::Ambiguous(beans) => Err(ResolutionError::Ambiguous {
                required: required.to_string(),
                qualifiers: describe_qualifiers(qualifiers),
                candidates: beans.iter().map(|b| b.id().to_string()).collect(),
            }),
        }
    }
}

impl fmt::Debug for ResolutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsatisfied => f.write_str("Unsatisfied"),
            Self::Unique(bean) => f.debug_tuple("Unique").field(bean.id()).finish(),
            Self::Ambiguous(beans) => f
                .debug_tuple("Ambiguous")
                .field(&beans.iter().map(|b| b.id()).collect::<Vec<_>>())
                .finish(),
        }
    }
}

impl PartialEq for ResolutionOutcome {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unsatisfied, Self::Unsatisfied) => true,
            (Self::Unique(a), Self::Unique(b)) => a.id() == b.id(),
            (Self::Ambiguous(a), Self::Ambiguous(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.id() == y.id())
            }
            _ => false,
        }
    }
}

/// Bean 容器
pub trait BeanContainer: Send + Sync {
    /// 容器 ID
    fn id(&self) -> &str;

    /// 容器是否处于运行状态
    fn is_running(&self) -> bool;

    /// 按标识符查找 Bean
    fn bean(&self, id: &BeanIdentifier) -> Option<Arc<dyn Bean>>;

    /// 类型安全解析
    fn resolve(
        &self,
        required: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<ResolutionOutcome, WeldError>;

    /// 全部启用的匹配 Bean (歧义消解之前)
    fn candidates(
        &self,
        required: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<Vec<Arc<dyn Bean>>, WeldError>;

    /// 作用域对应的激活上下文
    fn context(&self, scope: &Scope) -> Result<Arc<dyn Context>, WeldError>;

    /// 绑定到 Bean 的拦截器链, 已排序
    fn interceptors_for(&self, bean: &dyn Bean) -> Vec<Arc<dyn Interceptor>>;

    /// 创建根创建上下文
    fn create_creational_context(&self, bean: Option<&BeanIdentifier>) -> CreationalContext;

    /// 转换为 `Any`, 供核心实现取回具体的容器类型
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// 同步触发事件
    fn fire_event(
        &self,
        event: &(dyn Any + Send + Sync),
        event_type: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<(), WeldError>;
}
