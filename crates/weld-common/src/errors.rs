//! 错误类型定义

use std::fmt;
use thiserror::Error;

/// 用户代码 (工厂、观察者、拦截器) 返回的任意错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError { source: BoxError },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置验证失败: {errors:?}")]
    ValidationFailed { errors: Vec<String> },
}

impl ConfigError {
    /// 包装底层解析错误
    pub fn parse(source: impl Into<BoxError>) -> Self {
        Self::ParseError {
            source: source.into(),
        }
    }
}

/// 类型安全解析错误
#[derive(Error, Debug, Clone)]
pub enum ResolutionError {
    #[error("未满足的依赖: 类型 {required}, 限定符 {qualifiers}")]
    Unsatisfied { required: String, qualifiers: String },

    #[error("有歧义的依赖: 类型 {required}, 限定符 {qualifiers}, 候选 {candidates:?}")]
    Ambiguous {
        required: String,
        qualifiers: String,
        candidates: Vec<String>,
    },

    #[error("非法的查找类型 (通配符或类型变量): {required}")]
    IllegalRequiredType { required: String },

    #[error("事件类型包含未解析的类型变量: {event_type}")]
    IllegalEventType { event_type: String },

    #[error("Bean 不存在或已不再注册: {bean}")]
    BeanNotFound { bean: String },

    #[error("Bean 实例类型不匹配: {bean}, 期望 {expected}")]
    TypeMismatch { bean: String, expected: String },

    #[error("名称解析有歧义: {name}, 候选 {candidates:?}")]
    AmbiguousName { name: String, candidates: Vec<String> },
}

/// 上下文错误类型
#[derive(Error, Debug, Clone)]
pub enum ContextError {
    #[error("作用域上下文未激活: {scope}")]
    NotActive { scope: String },

    #[error("作用域没有注册上下文: {scope}")]
    NoContextRegistered { scope: String },

    #[error("作用域存在多个激活的上下文: {scope}")]
    MultipleActiveContexts { scope: String },

    #[error("激活的上下文缺少 Bean 存储: {scope}")]
    BeanStoreMissing { scope: String },

    #[error("作用域不支持该操作: {scope}, 操作: {operation}")]
    UnsupportedOperation { scope: String, operation: String },

    #[error("会话不存在: {cid}")]
    NonexistentConversation { cid: String },

    #[error("会话正被其他线程使用: {cid}")]
    ConversationBusy { cid: String },

    #[error("会话状态非法: {message}")]
    IllegalConversationState { message: String },
}

/// 部署问题的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemKind {
    /// 单个 Bean 的结构性元数据问题
    Definition,
    /// 跨 Bean 的问题
    Deployment,
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Definition => write!(f, "定义错误"),
            Self::Deployment => write!(f, "部署错误"),
        }
    }
}

/// 启动校验发现的单个问题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentProblem {
    /// 问题种类
    pub kind: ProblemKind,
    /// 问题描述
    pub message: String,
}

impl DeploymentProblem {
    /// 创建定义错误
    pub fn definition(message: impl Into<String>) -> Self {
        Self {
            kind: ProblemKind::Definition,
            message: message.into(),
        }
    }

    /// 创建部署错误
    pub fn deployment(message: impl Into<String>) -> Self {
        Self {
            kind: ProblemKind::Deployment,
            message: message.into(),
        }
    }
}

impl fmt::Display for DeploymentProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// 聚合后的部署失败
#[derive(Error, Debug, Clone)]
pub struct DeploymentException {
    /// 全部问题
    pub problems: Vec<DeploymentProblem>,
}

impl DeploymentException {
    /// 定义错误列表
    pub fn definition_errors(&self) -> impl Iterator<Item = &DeploymentProblem> {
        self.problems
            .iter()
            .filter(|p| p.kind == ProblemKind::Definition)
    }

    /// 部署错误列表
    pub fn deployment_errors(&self) -> impl Iterator<Item = &DeploymentProblem> {
        self.problems
            .iter()
            .filter(|p| p.kind == ProblemKind::Deployment)
    }
}

impl fmt::Display for DeploymentException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "部署失败, 共 {} 个问题:", self.problems.len())?;
        for problem in &self.problems {
            write!(f, "\n  - {problem}")?;
        }
        Ok(())
    }
}

/// 单个观察者的调用失败
#[derive(Error, Debug, Clone)]
#[error("观察者调用失败: {observer}, 原因: {message}")]
pub struct ObserverFailure {
    /// 观察者描述
    pub observer: String,
    /// 失败原因
    pub message: String,
}

/// 事件分发的复合异常: 第一个失败为主异常, 其余为被抑制异常
#[derive(Error, Debug, Clone)]
pub struct ObserverException {
    /// 主异常
    pub primary: ObserverFailure,
    /// 被抑制的异常, 按观察者调用顺序
    pub suppressed: Vec<ObserverFailure>,
}

impl ObserverException {
    /// 从失败列表构建复合异常, 空列表返回 `None`
    pub fn from_failures(failures: Vec<ObserverFailure>) -> Option<Self> {
        let mut failures = failures.into_iter();
        let primary = failures.next()?;
        Some(Self {
            primary,
            suppressed: failures.collect(),
        })
    }

    /// 全部失败数量
    pub fn failure_count(&self) -> usize {
        1 + self.suppressed.len()
    }
}

impl fmt::Display for ObserverException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)?;
        if !self.suppressed.is_empty() {
            write!(f, " (另有 {} 个被抑制的失败)", self.suppressed.len())?;
        }
        Ok(())
    }
}

/// 拦截调用错误
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("调用上下文已经 proceed 过: {method}")]
    AlreadyProceeded { method: String },

    #[error("调用返回值类型不匹配: {method}")]
    ReturnTypeMismatch { method: String },

    #[error("拦截器调用失败: {interceptor}, 原因: {source}")]
    InterceptorFailed { interceptor: String, source: BoxError },
}

/// 容器注册表与生命周期错误
#[derive(Error, Debug, Clone)]
pub enum ContainerError {
    #[error("没有运行中的容器")]
    NoContainer,

    #[error("存在多个运行中的容器 ({count}), 请显式指定容器 ID")]
    MultipleContainers { count: usize },

    #[error("容器不存在: {id}")]
    UnknownContainer { id: String },

    #[error("容器 ID 已被占用: {id}")]
    DuplicateContainer { id: String },

    #[error("容器不可用 (已关闭或已释放): {id}")]
    Unavailable { id: String },

    #[error("容器启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// Weld 顶层错误类型
#[derive(Error, Debug)]
pub enum WeldError {
    #[error("配置错误: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("解析错误: {source}")]
    Resolution {
        #[from]
        source: ResolutionError,
    },

    #[error("上下文错误: {source}")]
    Context {
        #[from]
        source: ContextError,
    },

    #[error("{source}")]
    Deployment {
        #[from]
        source: DeploymentException,
    },

    #[error("事件分发错误: {source}")]
    Observer {
        #[from]
        source: ObserverException,
    },

    #[error("调用错误: {source}")]
    Invocation {
        #[from]
        source: InvocationError,
    },

    #[error("容器错误: {source}")]
    Container {
        #[from]
        source: ContainerError,
    },

    #[error("Bean 创建失败: {bean}, 原因: {source}")]
    Creation { bean: String, source: BoxError },
}

impl WeldError {
    /// 包装 Bean 创建过程中的用户错误
    pub fn creation(bean: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Creation {
            bean: bean.into(),
            source: source.into(),
        }
    }

    /// 是否为上下文未激活错误
    pub fn is_context_not_active(&self) -> bool {
        matches!(
            self,
            Self::Context {
                source: ContextError::NotActive { .. }
            }
        )
    }
}

/// 结果类型别名
pub type WeldResult<T> = Result<T, WeldError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
