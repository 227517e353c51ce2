//! 观察者构建器

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;
use weld_common::BoxError;
use weld_spi::{
    AsQualifier, BeanIdentifier, BeanType, EventContext, ObserverMethod, Qualifier, Reception,
    TransactionPhase, DEFAULT_OBSERVER_PRIORITY,
};

static OBSERVER_SEQUENCE: AtomicUsize = AtomicUsize::new(0);

type Callback = Arc<dyn Fn(&EventContext<'_>) -> Result<(), BoxError> + Send + Sync>;

/// 以编程方式构建观察者方法
///
/// ```ignore
/// let observer = ObserverBuilder::<OrderPlaced>::new()
///     .qualifier(Qualifier::new("Urgent"))
///     .priority(10)
///     .notify(|event, _| {
///         println!("{}", event.id);
///         Ok(())
///     })
///     .build();
/// ```
pub struct ObserverBuilder<E> {
    id: Option<String>,
    observed_type: BeanType,
    qualifiers: Vec<Qualifier>,
    priority: i32,
    reception: Reception,
    transaction_phase: TransactionPhase,
    asynchronous: bool,
    declaring_bean: Option<BeanIdentifier>,
    callback: Option<Callback>,
    _marker: PhantomData<fn(&E)>,
}

impl<E: Any + Send + Sync> ObserverBuilder<E> {
    /// 观察 `E` 的构建器
    pub fn new() -> Self {
        Self {
            id: None,
            observed_type: BeanType::of::<E>(),
            qualifiers: Vec::new(),
            priority: DEFAULT_OBSERVER_PRIORITY,
            reception: Reception::Always,
            transaction_phase: TransactionPhase::InProgress,
            asynchronous: false,
            declaring_bean: None,
            callback: None,
            _marker: PhantomData,
        }
    }

    /// 观察者描述
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// 观察的类型, 默认为 `E`
    pub fn observed_type(mut self, observed_type: BeanType) -> Self {
        self.observed_type = observed_type;
        self
    }

    /// 添加观察的限定符
    pub fn qualifier(mut self, qualifier: impl AsQualifier) -> Self {
        self.qualifiers.push(qualifier.to_qualifier());
        self
    }

    /// 优先级, 默认 2500
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 接收模式
    pub fn reception(mut self, reception: Reception) -> Self {
        self.reception = reception;
        self
    }

    /// 事务阶段
    pub fn transaction_phase(mut self, phase: TransactionPhase) -> Self {
        self.transaction_phase = phase;
        self
    }

    /// 异步观察者
    pub fn asynchronous(mut self) -> Self {
        self.asynchronous = true;
        self
    }

    /// 声明观察者的 Bean, 通知时解析其实例作为接收者
    pub fn declared_by(mut self, bean: impl Into<BeanIdentifier>) -> Self {
        self.declaring_bean = Some(bean.into());
        self
    }

    /// 按具体类型接收事件负载; 负载不是 `E` 时跳过
    pub fn notify<F>(mut self, callback: F) -> Self
    where
        F: Fn(&E, &EventContext<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(move |context: &EventContext<'_>| {
            match context.event_as::<E>() {
                Some(event) => callback(event, context),
                None => {
                    debug!(
                        "事件负载不是 {}, 跳过: {}",
                        type_name::<E>(),
                        context.metadata().event_type
                    );
                    Ok(())
                }
            }
        }));
        self
    }

    /// 接收类型擦除的事件负载
    pub fn notify_any<F>(mut self, callback: F) -> Self
    where
        F: Fn(&EventContext<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// 构建观察者方法
    pub fn build(self) -> Arc<dyn ObserverMethod> {
        let id = self.id.unwrap_or_else(|| {
            format!(
                "{}#{}",
                self.observed_type,
                OBSERVER_SEQUENCE.fetch_add(1, Ordering::Relaxed)
            )
        });
        Arc::new(SyntheticObserver {
            id,
            observed_type: self.observed_type,
            qualifiers: self.qualifiers,
            priority: self.priority,
            reception: self.reception,
            transaction_phase: self.transaction_phase,
            asynchronous: self.asynchronous,
            declaring_bean: self.declaring_bean,
            callback: self.callback.unwrap_or_else(|| Arc::new(|_: &EventContext<'_>| Ok(()))),
        })
    }
}

impl<E: Any + Send + Sync> Default for ObserverBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

struct SyntheticObserver {
    id: String,
    observed_type: BeanType,
    qualifiers: Vec<Qualifier>,
    priority: i32,
    reception: Reception,
    transaction_phase: TransactionPhase,
    asynchronous: bool,
    declaring_bean: Option<BeanIdentifier>,
    callback: Callback,
}

impl ObserverMethod for SyntheticObserver {
    fn id(&self) -> &str {
        &self.id
    }

    fn observed_type(&self) -> &BeanType {
        &self.observed_type
    }

    fn observed_qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }

    fn declaring_bean(&self) -> Option<&BeanIdentifier> {
        self.declaring_bean.as_ref()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn reception(&self) -> Reception {
        self.reception
    }

    fn transaction_phase(&self) -> TransactionPhase {
        self.transaction_phase
    }

    fn is_async(&self) -> bool {
        self.asynchronous
    }

    fn notify(&self, context: &EventContext<'_>) -> Result<(), BoxError> {
        (self.callback)(context)
    }
}

impl fmt::Debug for SyntheticObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverMethod")
            .field("id", &self.id)
            .field("observed_type", &self.observed_type)
            .field("qualifiers", &self.qualifiers)
            .field("priority", &self.priority)
            .field("async", &self.asynchronous)
            .finish()
    }
}
