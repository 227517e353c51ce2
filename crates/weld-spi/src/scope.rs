//! 作用域

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// 作用域: 决定上下文实例生命周期的策略
///
/// 普通作用域的 Bean 通过客户端代理注入, 伪作用域 (`Dependent`、`Singleton`)
/// 直接注入实例。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scope {
    name: Cow<'static, str>,
    normal: bool,
    passivating: bool,
}

impl Scope {
    /// 依赖作用域, 每个注入点独立实例
    pub const DEPENDENT: Self = Self::builtin("Dependent", false, false);
    /// 单例伪作用域
    pub const SINGLETON: Self = Self::builtin("Singleton", false, false);
    /// 应用作用域
    pub const APPLICATION: Self = Self::builtin("ApplicationScoped", true, false);
    /// 请求作用域
    pub const REQUEST: Self = Self::builtin("RequestScoped", true, false);
    /// 会话 (HTTP session) 作用域
    pub const SESSION: Self = Self::builtin("SessionScoped", true, true);
    /// 对话作用域
    pub const CONVERSATION: Self = Self::builtin("ConversationScoped", true, true);

    const fn builtin(name: &'static str, normal: bool, passivating: bool) -> Self {
        Self {
            name: Cow::Borrowed(name),
            normal,
            passivating,
        }
    }

    /// 自定义普通作用域
    pub fn normal(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            normal: true,
            passivating: false,
        }
    }

    /// 自定义伪作用域
    pub fn pseudo(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            normal: false,
            passivating: false,
        }
    }

    /// 标记为钝化作用域
    pub fn passivating(mut self) -> Self {
        self.passivating = true;
        self
    }

    /// 作用域名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 是否为普通作用域
    pub fn is_normal(&self) -> bool {
        self.normal
    }

    /// 是否为伪作用域
    pub fn is_pseudo(&self) -> bool {
        !self.normal
    }

    /// 是否为钝化作用域
    pub fn is_passivating(&self) -> bool {
        self.passivating
    }

    /// 是否为依赖作用域
    pub fn is_dependent(&self) -> bool {
        *self == Self::DEPENDENT
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::DEPENDENT
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)
    }
}
