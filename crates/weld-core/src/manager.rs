//! Bean 管理器
//!
//! 启动完成后对外的容器入口: 持有启用的 Bean、解析器、作用域上下文、
//! 拦截器链与事件通知器。除状态外全部只读, 可以在任意线程上并发使用。

use crate::contexts::{
    ConversationContext, DependentContext, RequestContext, SessionContext, SharedContext,
};
use crate::event::{AsyncEventDelivery, AsyncExecutor, Event, ObserverNotifier};
use crate::instance::Instance;
use crate::proxy::{interceptors_for, Reference};
use crate::registry;
use crate::resolution::{ResolvedObservers, TypeHierarchy, TypeSafeBeanResolver, TypeSafeObserverResolver};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};
use weld_common::{
    ContainerError, ContainerState, ContextError, WeldConfiguration, WeldError,
};
use weld_spi::{
    Bean, BeanContainer, BeanIdentifier, BeanType, BeforeShutdown, Context, CreationalContext,
    Extension, Interceptor, ObserverMethod, Qualifier, ResolutionOutcome, Scope,
};

/// 作用域生命周期事件的负载, 以 `@Initialized` / `@BeforeDestroyed` / `@Destroyed` 限定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeLifecycleEvent {
    /// 容器 ID
    pub container_id: String,
    /// 作用域
    pub scope: Scope,
}

/// 构建管理器所需的全部部件
pub struct ManagerParts {
    /// 容器 ID
    pub id: String,
    /// 启用的 Bean (已完成过滤与特化)
    pub beans: Vec<Arc<dyn Bean>>,
    /// 观察者
    pub observers: Vec<Arc<dyn ObserverMethod>>,
    /// 拦截器, 按注册顺序
    pub interceptors: Vec<Arc<dyn Interceptor>>,
    /// 扩展注册的自定义上下文
    pub custom_contexts: Vec<Arc<dyn Context>>,
    /// 扩展
    pub extensions: Vec<Arc<dyn Extension>>,
    /// 类型层次
    pub hierarchy: Arc<TypeHierarchy>,
    /// 配置
    pub configuration: WeldConfiguration,
}

struct BuiltinContexts {
    application: Arc<SharedContext>,
    singleton: Arc<SharedContext>,
    request: Arc<RequestContext>,
    session: Arc<SessionContext>,
    conversation: Arc<ConversationContext>,
}

/// Bean 管理器的实现, 实现容器契约
pub struct BeanManagerImpl {
    id: String,
    self_ref: Weak<BeanManagerImpl>,
    state: RwLock<ContainerState>,
    beans: Vec<Arc<dyn Bean>>,
    beans_by_id: HashMap<BeanIdentifier, Arc<dyn Bean>>,
    resolver: TypeSafeBeanResolver,
    notifier: ObserverNotifier,
    interceptors: Vec<Arc<dyn Interceptor>>,
    chains: HashMap<BeanIdentifier, Vec<Arc<dyn Interceptor>>>,
    contexts: HashMap<Scope, Vec<Arc<dyn Context>>>,
    builtin: BuiltinContexts,
    extensions: Vec<Arc<dyn Extension>>,
    hierarchy: Arc<TypeHierarchy>,
    configuration: WeldConfiguration,
}

/// Bean 管理器句柄, 克隆开销很小
#[derive(Clone)]
pub struct BeanManager {
    inner: Arc<BeanManagerImpl>,
}

impl BeanManager {
    /// 由部件构建管理器, 初始状态为 `Discovered`
    pub fn new(parts: ManagerParts) -> Result<Self, WeldError> {
        let ManagerParts {
            id,
            beans,
            observers,
            interceptors,
            custom_contexts,
            extensions,
            hierarchy,
            configuration,
        } = parts;

        let executor = AsyncExecutor::new(&configuration.executor).map_err(|e| {
            ContainerError::BootstrapFailed {
                message: format!("异步执行器创建失败: {e}"),
            }
        })?;
        let cache_size = configuration.resolution.cache_size;
        let resolver = TypeSafeBeanResolver::new(beans.clone(), Arc::clone(&hierarchy), cache_size);
        let notifier = ObserverNotifier::new(
            TypeSafeObserverResolver::new(observers, Arc::clone(&hierarchy), cache_size),
            executor,
        );

        let builtin = BuiltinContexts {
            application: Arc::new(SharedContext::application()),
            singleton: Arc::new(SharedContext::singleton()),
            request: Arc::new(RequestContext::new()),
            session: Arc::new(SessionContext::new()),
            conversation: Arc::new(ConversationContext::new(&configuration.conversation)),
        };
        let mut contexts: HashMap<Scope, Vec<Arc<dyn Context>>> = HashMap::new();
        let registered: Vec<Arc<dyn Context>> = vec![
            Arc::new(DependentContext::new()),
            builtin.application.clone(),
            builtin.singleton.clone(),
            builtin.request.clone(),
            builtin.session.clone(),
            builtin.conversation.clone(),
        ];
        for context in registered.into_iter().chain(custom_contexts) {
            contexts
                .entry(context.scope().clone())
                .or_default()
                .push(context);
        }

        let beans_by_id: HashMap<BeanIdentifier, Arc<dyn Bean>> = beans
            .iter()
            .map(|bean| (bean.id().clone(), Arc::clone(bean)))
            .collect();
        let chains: HashMap<BeanIdentifier, Vec<Arc<dyn Interceptor>>> = beans
            .iter()
            .map(|bean| (bean.id().clone(), interceptors_for(&interceptors, bean.as_ref())))
            .filter(|(_, chain)| !chain.is_empty())
            .collect();

        info!(
            "构建 Bean 管理器 {}: {} 个 Bean, {} 个观察者, {} 个拦截器, {} 个作用域",
            id,
            beans.len(),
            notifier.observers().len(),
            interceptors.len(),
            contexts.len()
        );

        let inner = Arc::new_cyclic(|self_ref| BeanManagerImpl {
            id,
            self_ref: self_ref.clone(),
            state: RwLock::new(ContainerState::Discovered),
            beans,
            beans_by_id,
            resolver,
            notifier,
            interceptors,
            chains,
            contexts,
            builtin,
            extensions,
            hierarchy,
            configuration,
        });
        Ok(Self { inner })
    }

    /// 从容器契约取回管理器
    pub fn from_container(container: &Arc<dyn BeanContainer>) -> Result<Self, WeldError> {
        Arc::clone(container)
            .as_any_arc()
            .downcast::<BeanManagerImpl>()
            .map(|inner| Self { inner })
            .map_err(|_| {
                ContainerError::Unavailable {
                    id: container.id().to_string(),
                }
                .into()
            })
    }

    /// 以容器契约的形式共享
    pub fn container(&self) -> Arc<dyn BeanContainer> {
        self.inner.clone()
    }

    /// 容器 ID
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// 当前状态
    pub fn state(&self) -> ContainerState {
        *self.inner.state.read()
    }

    /// 迁移状态, 非法迁移被拒绝
    pub fn transition(&self, next: ContainerState) -> Result<(), WeldError> {
        let mut state = self.inner.state.write();
        if !state.can_transition_to(next) {
            return Err(ContainerError::BootstrapFailed {
                message: format!("非法的容器状态迁移: {} -> {}", *state, next),
            }
            .into());
        }
        debug!("容器 {} 状态: {} -> {}", self.inner.id, *state, next);
        *state = next;
        Ok(())
    }

    /// 是否已上线
    pub fn is_running(&self) -> bool {
        self.state().is_live()
    }

    /// 启用的全部 Bean
    pub fn beans(&self) -> &[Arc<dyn Bean>] {
        &self.inner.beans
    }

    /// 按标识符查找 Bean
    pub fn bean(&self, id: &BeanIdentifier) -> Option<Arc<dyn Bean>> {
        self.inner.bean(id)
    }

    /// 类型安全解析
    pub fn resolve(
        &self,
        required: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<ResolutionOutcome, WeldError> {
        self.inner.resolver.resolve(required, qualifiers)
    }

    /// 歧义消解之前的匹配 Bean
    pub fn candidates(
        &self,
        required: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<Vec<Arc<dyn Bean>>, WeldError> {
        self.inner.resolver.candidates(required, qualifiers)
    }

    /// 按名称解析
    pub fn resolve_by_name(&self, name: &str) -> ResolutionOutcome {
        self.inner.resolver.resolve_by_name(name)
    }

    /// 解析器
    pub fn resolver(&self) -> &TypeSafeBeanResolver {
        &self.inner.resolver
    }

    /// 获取 `T` 的唯一 Bean 的引用
    pub fn reference<T: Any + Send + Sync>(&self, qualifiers: &[Qualifier]) -> Result<Reference<T>, WeldError> {
        self.instance::<T>().select(qualifiers).get()
    }

    /// 为给定 Bean 获取引用
    pub fn reference_for<T: Any + Send + Sync>(
        &self,
        bean: Arc<dyn Bean>,
        creational_context: &CreationalContext,
    ) -> Result<Reference<T>, WeldError> {
        Reference::obtain(&self.container(), bean, creational_context)
    }

    /// `T` 的编程式查找句柄
    pub fn instance<T: Any + Send + Sync>(&self) -> Instance<T> {
        let creational_context = self.inner.create_creational_context(None);
        Instance::new(self.container(), BeanType::of::<T>(), Vec::new(), creational_context)
    }

    /// 以给定限定符查找 `T`
    pub fn select<T: Any + Send + Sync>(&self, qualifiers: &[Qualifier]) -> Instance<T> {
        self.instance::<T>().select(qualifiers)
    }

    /// `E` 的事件句柄
    pub fn event<E: Any + Send + Sync>(&self) -> Event<E> {
        Event::new(self.clone(), BeanType::of::<E>(), Vec::new())
    }

    /// 同步触发事件, 事件类型为 `E`
    pub fn fire<E: Any + Send + Sync>(&self, event: &E, qualifiers: &[Qualifier]) -> Result<(), WeldError> {
        self.fire_typed(event, &BeanType::of::<E>(), qualifiers)
    }

    /// 以显式的事件类型同步触发
    pub fn fire_typed(
        &self,
        event: &(dyn Any + Send + Sync),
        event_type: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<(), WeldError> {
        self.inner.fire_event(event, event_type, qualifiers)
    }

    /// 异步触发事件
    pub fn fire_async<E: Any + Send + Sync>(
        &self,
        event: E,
        qualifiers: &[Qualifier],
    ) -> Result<AsyncEventDelivery, WeldError> {
        self.fire_async_typed(Arc::new(event), &BeanType::of::<E>(), qualifiers)
    }

    /// 以显式的事件类型异步触发
    pub fn fire_async_typed(
        &self,
        event: Arc<dyn Any + Send + Sync>,
        event_type: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<AsyncEventDelivery, WeldError> {
        self.inner
            .notifier
            .notify_async(self.container(), event, event_type, qualifiers)
    }

    /// 解析事件的观察者
    pub fn resolve_observers(
        &self,
        event_type: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<ResolvedObservers, WeldError> {
        self.inner.notifier.resolve(event_type, qualifiers)
    }

    /// 全部观察者
    pub fn observers(&self) -> &[Arc<dyn ObserverMethod>] {
        self.inner.notifier.observers()
    }

    /// 全部拦截器
    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.inner.interceptors
    }

    /// 绑定到 Bean 的拦截器链
    pub fn interceptors_for(&self, bean: &dyn Bean) -> Vec<Arc<dyn Interceptor>> {
        self.inner.interceptors_for(bean)
    }

    /// 作用域的激活上下文
    pub fn context(&self, scope: &Scope) -> Result<Arc<dyn Context>, WeldError> {
        self.inner.context(scope)
    }

    /// 作用域是否注册了上下文
    pub fn has_context(&self, scope: &Scope) -> bool {
        self.inner.contexts.contains_key(scope)
    }

    /// 应用上下文
    pub fn application_context(&self) -> &Arc<SharedContext> {
        &self.inner.builtin.application
    }

    /// 单例上下文
    pub fn singleton_context(&self) -> &Arc<SharedContext> {
        &self.inner.builtin.singleton
    }

    /// 请求上下文
    pub fn request_context(&self) -> &Arc<RequestContext> {
        &self.inner.builtin.request
    }

    /// 会话上下文
    pub fn session_context(&self) -> &Arc<SessionContext> {
        &self.inner.builtin.session
    }

    /// 对话上下文
    pub fn conversation_context(&self) -> &Arc<ConversationContext> {
        &self.inner.builtin.conversation
    }

    /// 创建根创建上下文
    pub fn create_creational_context(&self, bean: Option<&BeanIdentifier>) -> CreationalContext {
        self.inner.create_creational_context(bean)
    }

    /// 类型层次
    pub fn type_hierarchy(&self) -> &Arc<TypeHierarchy> {
        &self.inner.hierarchy
    }

    /// 配置
    pub fn configuration(&self) -> &WeldConfiguration {
        &self.inner.configuration
    }

    /// 扩展
    pub fn extensions(&self) -> &[Arc<dyn Extension>] {
        &self.inner.extensions
    }

    /// 触发作用域生命周期事件, 观察者失败只记录日志
    pub fn fire_lifecycle_event(&self, scope: &Scope, qualifier: Qualifier) {
        let event = ScopeLifecycleEvent {
            container_id: self.inner.id.clone(),
            scope: scope.clone(),
        };
        if let Err(e) = self.fire(&event, &[qualifier]) {
            warn!("容器 {} 生命周期事件的观察者失败: {}", self.inner.id, e);
        }
    }

    /// 关闭容器, 可重复调用
    ///
    /// 依次: 触发 `@BeforeDestroyed(ApplicationScoped)`, 通知扩展, 销毁对话、会话、
    /// 请求、应用与单例上下文, 触发 `@Destroyed(ApplicationScoped)`, 从注册表移除, 停止异步执行器。
    pub fn shutdown(&self) {
        {
            let mut state = self.inner.state.write();
            if !state.can_transition_to(ContainerState::ShuttingDown) {
                return;
            }
            *state = ContainerState::ShuttingDown;
        }
        info!("关闭容器: {}", self.inner.id);

        self.fire_lifecycle_event(&Scope::APPLICATION, Qualifier::before_destroyed(&Scope::APPLICATION));

        let before_shutdown = BeforeShutdown {
            container_id: self.inner.id.clone(),
        };
        for extension in &self.inner.extensions {
            debug!("通知扩展容器关闭: {}", extension.name());
            extension.before_shutdown(&before_shutdown);
        }

        let builtin = &self.inner.builtin;
        builtin.conversation.destroy_all_conversations();
        builtin.session.destroy_all_sessions();
        if let Some(store) = builtin.request.deactivate() {
            crate::contexts::support::destroy_all(store.as_ref());
        }
        let orphaned = builtin.request.destroy_all_active();
        if orphaned > 0 {
            debug!("关闭时销毁其他线程上仍激活的请求存储: {}", orphaned);
        }
        builtin.application.invalidate();
        builtin.application.deactivate();
        builtin.singleton.invalidate();
        builtin.singleton.deactivate();

        self.fire_lifecycle_event(&Scope::APPLICATION, Qualifier::destroyed(&Scope::APPLICATION));

        *self.inner.state.write() = ContainerState::Shutdown;
        registry::unregister(&self.inner.id);
        self.inner.notifier.shutdown();
        self.inner.resolver.clear();
        self.inner.notifier.clear();
        info!("容器已关闭: {}", self.inner.id);
    }

    /// 启动失败时释放资源, 不触发生命周期事件也不通知扩展
    pub(crate) fn abort(&self) {
        warn!("容器 {} 启动中止", self.inner.id);
        *self.inner.state.write() = ContainerState::Shutdown;
        self.inner.builtin.application.invalidate();
        self.inner.builtin.singleton.invalidate();
        self.inner.notifier.shutdown();
    }
}

impl fmt::Debug for BeanManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanManager")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("beans", &self.inner.beans.len())
            .finish()
    }
}

impl BeanManagerImpl {
    fn bean(&self, id: &BeanIdentifier) -> Option<Arc<dyn Bean>> {
        self.beans_by_id.get(id).cloned()
    }
}

impl BeanContainer for BeanManagerImpl {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_running(&self) -> bool {
        self.state.read().is_usable()
    }

    fn bean(&self, id: &BeanIdentifier) -> Option<Arc<dyn Bean>> {
        BeanManagerImpl::bean(self, id)
    }

    fn resolve(
        &self,
        required: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<ResolutionOutcome, WeldError> {
        self.resolver.resolve(required, qualifiers)
    }

    fn candidates(
        &self,
        required: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<Vec<Arc<dyn Bean>>, WeldError> {
        self.resolver.candidates(required, qualifiers)
    }

    fn context(&self, scope: &Scope) -> Result<Arc<dyn Context>, WeldError> {
        let registered = self.contexts.get(scope).ok_or_else(|| ContextError::NoContextRegistered {
            scope: scope.to_string(),
        })?;
        let mut active = registered.iter().filter(|context| context.is_active());
        let context = active.next().ok_or_else(|| ContextError::NotActive {
            scope: scope.to_string(),
        })?;
        if active.next().is_some() {
            return Err(ContextError::MultipleActiveContexts {
                scope: scope.to_string(),
            }
            .into());
        }
        Ok(Arc::clone(context))
    }

    fn interceptors_for(&self, bean: &dyn Bean) -> Vec<Arc<dyn Interceptor>> {
        self.chains.get(bean.id()).cloned().unwrap_or_default()
    }

    fn create_creational_context(&self, bean: Option<&BeanIdentifier>) -> CreationalContext {
        let container: Weak<dyn BeanContainer> = self.self_ref.clone();
        CreationalContext::new(Some(container), bean.cloned())
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn fire_event(
        &self,
        event: &(dyn Any + Send + Sync),
        event_type: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<(), WeldError> {
        self.notifier.notify_sync(self, event, event_type, qualifiers)
    }
}
