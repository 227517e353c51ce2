//! 拦截器调用契约
//!
//! 拦截器链以显式的 `proceed()` 续延方式执行: 每个调用上下文持有链中的位置,
//! `proceed()` 调用下一个拦截器, 链尾调用目标方法。

use crate::bean::Bean;
use crate::qualifier::Qualifier;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use weld_common::{InvocationError, WeldError};

/// 类型擦除后的调用返回值
pub type InvocationValue = Box<dyn Any + Send>;

/// 拦截器
pub trait Interceptor: Send + Sync + fmt::Debug {
    /// 拦截器名称
    fn name(&self) -> &str;

    /// 拦截器绑定
    fn bindings(&self) -> &[Qualifier];

    /// 优先级, 数值小者在外层
    fn priority(&self) -> i32;

    /// 环绕调用
    fn around_invoke(&self, context: &mut InvocationContext<'_>) -> Result<InvocationValue, WeldError>;
}

/// 调用上下文
pub struct InvocationContext<'a> {
    method: &'a str,
    bean: &'a dyn Bean,
    target: &'a (dyn Any + Send + Sync),
    chain: &'a [Arc<dyn Interceptor>],
    position: usize,
    terminal: Option<Box<dyn FnOnce() -> InvocationValue + 'a>>,
    data: HashMap<String, String>,
    proceeded: bool,
}

impl<'a> InvocationContext<'a> {
    /// 创建位于链首的调用上下文
    pub fn new(
        method: &'a str,
        bean: &'a dyn Bean,
        target: &'a (dyn Any + Send + Sync),
        chain: &'a [Arc<dyn Interceptor>],
        terminal: Box<dyn FnOnce() -> InvocationValue + 'a>,
    ) -> Self {
        Self {
            method,
            bean,
            target,
            chain,
            position: 0,
            terminal: Some(terminal),
            data: HashMap::new(),
            proceeded: false,
        }
    }

    /// 被调用的方法名
    pub fn method(&self) -> &str {
        self.method
    }

    /// 目标 Bean
    pub fn bean(&self) -> &dyn Bean {
        self.bean
    }

    /// 目标实例
    pub fn target(&self) -> &(dyn Any + Send + Sync) {
        self.target
    }

    /// 当前在链中的位置
    pub fn position(&self) -> usize {
        self.position
    }

    /// 上下文数据, 在整条链上共享
    pub fn context_data(&self) -> &HashMap<String, String> {
        &self.data
    }

    /// 可写的上下文数据
    pub fn context_data_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.data
    }

    /// 调用链中的下一个拦截器, 链尾调用目标方法; 每个上下文只能调用一次
    pub fn proceed(&mut self) -> Result<InvocationValue, WeldError> {
        if self.proceeded {
            return Err(InvocationError::AlreadyProceeded {
                method: self.method.to_string(),
            }
            .into());
        }
        self.proceeded = true;

        let chain = self.chain;
        if let Some(interceptor) = chain.get(self.position) {
            let mut next = InvocationContext {
                method: self.method,
                bean: self.bean,
                target: self.target,
                chain,
                position: self.position + 1,
                terminal: self.terminal.take(),
                data: std::mem::take(&mut self.data),
                proceeded: false,
            };
            let result = interceptor.around_invoke(&mut next);
            self.data = next.data;
            result
        } else {
            let terminal = self.terminal.take().ok_or_else(|| InvocationError::AlreadyProceeded {
                method: self.method.to_string(),
            })?;
            Ok(terminal())
        }
    }
}

impl fmt::Debug for InvocationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("method", &self.method)
            .field("bean", self.bean.id())
            .field("position", &self.position)
            .field("chain_length", &self.chain.len())
            .finish()
    }
}
