//! 拦截链执行

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use weld_common::{InvocationError, WeldError};
use weld_spi::{AsQualifier, Bean, Interceptor, InvocationContext, InvocationValue, Qualifier};

/// 经拦截链调用目标方法
///
/// 链为空时直接调用; 否则从链首开始 `proceed()`, 链尾执行 `call`。
/// 拦截器可以替换返回值, 但类型必须与目标方法一致。
pub fn invoke_intercepted<'a, T, R, F>(
    method: &'a str,
    bean: &'a dyn Bean,
    target: &'a T,
    chain: &'a [Arc<dyn Interceptor>],
    call: F,
) -> Result<R, WeldError>
where
    T: Any + Send + Sync,
    R: Send + 'static,
    F: FnOnce(&T) -> R + 'a,
{
    if chain.is_empty() {
        return Ok(call(target));
    }
    let terminal: Box<dyn FnOnce() -> InvocationValue + 'a> =
        Box::new(move || Box::new(call(target)) as InvocationValue);
    let mut context = InvocationContext::new(method, bean, target, chain, terminal);
    let value = context.proceed()?;
    value.downcast::<R>().map(|value| *value).map_err(|_| {
        InvocationError::ReturnTypeMismatch {
            method: method.to_string(),
        }
        .into()
    })
}

/// 按绑定筛选并排序拦截器
///
/// 拦截器的每个绑定都必须出现在 Bean 的拦截器绑定中;
/// 结果按优先级升序排列, 同优先级保持注册顺序。
pub fn interceptors_for(
    interceptors: &[Arc<dyn Interceptor>],
    bean: &dyn Bean,
) -> Vec<Arc<dyn Interceptor>> {
    let bindings = bean.interceptor_bindings();
    if bindings.is_empty() {
        return Vec::new();
    }
    let mut chain: Vec<Arc<dyn Interceptor>> = interceptors
        .iter()
        .filter(|interceptor| {
            !interceptor.bindings().is_empty()
                && interceptor
                    .bindings()
                    .iter()
                    .all(|binding| bindings.contains(binding))
        })
        .cloned()
        .collect();
    chain.sort_by_key(|interceptor| interceptor.priority());
    chain
}

type AroundInvoke =
    Arc<dyn Fn(&mut InvocationContext<'_>) -> Result<InvocationValue, WeldError> + Send + Sync>;

/// 以编程方式构建拦截器
///
/// ```ignore
/// let timing = InterceptorBuilder::new("timing")
///     .binding(Qualifier::new("Timed"))
///     .priority(100)
///     .around_invoke(|ctx| {
///         let started = Instant::now();
///         let value = ctx.proceed();
///         debug!("{} 耗时 {:?}", ctx.method(), started.elapsed());
///         value
///     })
///     .build();
/// ```
pub struct InterceptorBuilder {
    name: String,
    bindings: Vec<Qualifier>,
    priority: i32,
    around_invoke: Option<AroundInvoke>,
}

impl InterceptorBuilder {
    /// 以名称创建
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
            priority: 0,
            around_invoke: None,
        }
    }

    /// 添加拦截器绑定
    pub fn binding(mut self, binding: impl AsQualifier) -> Self {
        self.bindings.push(binding.to_qualifier());
        self
    }

    /// 优先级
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 环绕调用; 未设置时直接 `proceed()`
    pub fn around_invoke<F>(mut self, around_invoke: F) -> Self
    where
        F: Fn(&mut InvocationContext<'_>) -> Result<InvocationValue, WeldError> + Send + Sync + 'static,
    {
        self.around_invoke = Some(Arc::new(around_invoke));
        self
    }

    /// 构建拦截器
    pub fn build(self) -> Arc<dyn Interceptor> {
        Arc::new(SyntheticInterceptor {
            name: self.name,
            bindings: self.bindings,
            priority: self.priority,
            around_invoke: self
                .around_invoke
                .unwrap_or_else(|| Arc::new(|ctx: &mut InvocationContext<'_>| ctx.proceed())),
        })
    }
}

struct SyntheticInterceptor {
    name: String,
    bindings: Vec<Qualifier>,
    priority: i32,
    around_invoke: AroundInvoke,
}

impl Interceptor for SyntheticInterceptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn bindings(&self) -> &[Qualifier] {
        &self.bindings
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn around_invoke(&self, context: &mut InvocationContext<'_>) -> Result<InvocationValue, WeldError> {
        (self.around_invoke)(context)
    }
}

impl fmt::Debug for SyntheticInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("name", &self.name)
            .field("bindings", &self.bindings)
            .field("priority", &self.priority)
            .finish()
    }
}
