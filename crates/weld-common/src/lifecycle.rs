//! 容器生命周期状态

use serde::{Deserialize, Serialize};
use std::fmt;

/// 容器生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContainerState {
    /// 正在启动
    Starting,
    /// Bean 发现完成
    Discovered,
    /// 校验通过
    Validated,
    /// 已上线, 可以处理请求
    Running,
    /// 正在关闭
    ShuttingDown,
    /// 已关闭
    Shutdown,
}

impl ContainerState {
    /// 容器是否已上线
    pub fn is_live(self) -> bool {
        self == Self::Running
    }

    /// 是否可以处理查找与调用: 校验通过之后、关闭完成之前
    pub fn is_usable(self) -> bool {
        matches!(self, Self::Validated | Self::Running | Self::ShuttingDown)
    }

    /// 是否允许迁移到目标状态
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Shutdown, _) => false,
            (_, Self::ShuttingDown) => self != Self::ShuttingDown,
            (current, next) => next > current,
        }
    }
}

impl Default for ContainerState {
    fn default() -> Self {
        Self::Starting
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Starting => "启动中",
            Self::Discovered => "已发现",
            Self::Validated => "已校验",
            Self::Running => "运行中",
            Self::ShuttingDown => "关闭中",
            Self::Shutdown => "已关闭",
        };
        f.write_str(name)
    }
}

/// 作用域守卫, 离开作用域时执行清理
pub struct ScopeGuard {
    name: String,
    cleanup: Option<Box<dyn FnOnce() + Send>>,
}

impl ScopeGuard {
    /// 创建新的作用域守卫
    pub fn new(name: impl Into<String>, cleanup: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            name: name.into(),
            cleanup: Some(cleanup),
        }
    }

    /// 守卫名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 放弃清理
    pub fn disarm(mut self) {
        self.cleanup = None;
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            tracing::debug!("作用域守卫释放: {}", self.name);
            cleanup();
        }
    }
}

impl fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("name", &self.name)
            .field("armed", &self.cleanup.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_state_transitions() {
        assert!(ContainerState::Starting.can_transition_to(ContainerState::Discovered));
        assert!(ContainerState::Validated.can_transition_to(ContainerState::Running));
        assert!(ContainerState::Running.can_transition_to(ContainerState::ShuttingDown));
        assert!(ContainerState::Starting.can_transition_to(ContainerState::ShuttingDown));
        assert!(!ContainerState::Running.can_transition_to(ContainerState::Starting));
        assert!(!ContainerState::Shutdown.can_transition_to(ContainerState::Running));
        assert!(ContainerState::Running.is_live());
        assert!(ContainerState::Validated.is_usable());
        assert!(!ContainerState::Shutdown.is_usable());
    }

    #[test]
    fn test_scope_guard_runs_cleanup_once() {
        let flag = Arc::new(AtomicBool::new(false));
        let captured = flag.clone();
        {
            let _guard = ScopeGuard::new("test", Box::new(move || captured.store(true, Ordering::SeqCst)));
        }
        assert!(flag.load(Ordering::SeqCst));

        let flag = Arc::new(AtomicBool::new(false));
        let captured = flag.clone();
        let guard = ScopeGuard::new("disarmed", Box::new(move || captured.store(true, Ordering::SeqCst)));
        guard.disarm();
        assert!(!flag.load(Ordering::SeqCst));
    }
}
