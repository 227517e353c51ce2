//! 容器启动
//!
//! 启动按固定阶段推进: 发现开始前 -> 发现与过滤 -> 处理 Bean 属性 -> 发现完成后
//! -> 特化 -> 构建管理器 -> 校验 -> 部署校验完成后 -> 上线注册 -> `@Initialized`。
//! 校验阶段收集全部问题, 一次性以 `DeploymentException` 报告。

pub mod deployment;
pub(crate) mod discovery;
pub mod validator;

pub use deployment::Deployment;
pub use validator::Validator;

use crate::manager::{BeanManager, ManagerParts};
use crate::registry;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};
use weld_common::{ContainerError, ContainerState, DeploymentException, DeploymentProblem, WeldError};
use weld_spi::{
    AfterBeanDiscovery, AfterDeploymentValidation, BeforeBeanDiscovery, ProcessBeanAttributes,
    Qualifier, Scope,
};

/// 容器启动器
#[derive(Debug, Default)]
pub struct WeldBootstrap;

impl WeldBootstrap {
    /// 启动部署, 成功时返回已上线并注册的管理器
    pub fn start(deployment: Deployment) -> Result<BeanManager, WeldError> {
        let (container_id, archives, extensions, hierarchy, configuration) = deployment.into_parts();
        info!("开始启动容器: {}", container_id);
        if registry::contains(&container_id) {
            return Err(ContainerError::DuplicateContainer { id: container_id }.into());
        }
        let mut problems: Vec<DeploymentProblem> = Vec::new();

        // 第一步：发现开始前
        let mut before = BeforeBeanDiscovery::new();
        for extension in &extensions {
            debug!("通知扩展发现开始: {}", extension.name());
            extension.before_bean_discovery(&mut before);
        }
        let (added_beans, added_interceptors) = before.into_parts();

        // 第二步：发现与过滤
        let mut discovered = discovery::discover(
            &archives,
            &configuration.discovery,
            &configuration.alternatives,
            &mut problems,
        );
        for bean in added_beans {
            if discovery::is_enabled(bean.as_ref(), &configuration.alternatives, None) {
                discovered.beans.push(bean);
            } else {
                discovered.removed.insert(bean.id().clone());
            }
        }
        discovered.interceptors.extend(added_interceptors);
        info!(
            "Bean 发现完成: {} 个 Bean, {} 个观察者, {} 个拦截器",
            discovered.beans.len(),
            discovered.observers.len(),
            discovered.interceptors.len()
        );

        // 第三步：处理 Bean 属性
        let mut beans = Vec::with_capacity(discovered.beans.len());
        for bean in discovered.beans {
            let mut event = ProcessBeanAttributes::new(Arc::clone(&bean));
            for extension in &extensions {
                extension.process_bean_attributes(&mut event);
            }
            problems.extend(event.take_problems());
            if event.is_vetoed() {
                info!("Bean 被扩展否决: {}", bean.id());
                discovered.removed.insert(bean.id().clone());
            } else {
                beans.push(bean);
            }
        }

        // 第四步：发现完成后
        let mut after = AfterBeanDiscovery::new();
        for extension in &extensions {
            debug!("通知扩展发现完成: {}", extension.name());
            extension.after_bean_discovery(&mut after);
        }
        let parts = after.into_parts();
        problems.extend(parts.problems);
        for bean in parts.beans {
            if discovery::is_enabled(bean.as_ref(), &configuration.alternatives, None) {
                beans.push(bean);
            } else {
                discovered.removed.insert(bean.id().clone());
            }
        }
        let mut observers = discovered.observers;
        observers.extend(parts.observers);
        let mut interceptors = discovered.interceptors;
        interceptors.extend(parts.interceptors);

        // 第五步：特化
        let (beans, specialized) = discovery::specialize(beans, &mut problems);
        let removed: HashSet<_> = discovered
            .removed
            .into_iter()
            .chain(specialized)
            .filter(|id| !beans.iter().any(|bean| bean.id() == id))
            .collect();
        observers.retain(|observer| match observer.declaring_bean() {
            Some(bean) if removed.contains(bean) => {
                debug!("声明 Bean 未启用, 移除观察者: {}", observer.id());
                false
            }
            _ => true,
        });

        // 第六步：构建管理器
        let manager = BeanManager::new(ManagerParts {
            id: container_id.clone(),
            beans,
            observers,
            interceptors,
            custom_contexts: parts.contexts,
            extensions: extensions.clone(),
            hierarchy: Arc::new(hierarchy),
            configuration,
        })?;

        // 第七步：校验
        problems.extend(Validator::new(&manager).validate());
        fail_on_problems(&manager, problems)?;
        manager.transition(ContainerState::Validated)?;

        // 第八步：部署校验完成后
        let mut validated = AfterDeploymentValidation::new(manager.container());
        for extension in &extensions {
            debug!("通知扩展部署校验完成: {}", extension.name());
            extension.after_deployment_validation(&mut validated);
        }
        fail_on_problems(&manager, validated.take_problems())?;

        // 第九步：上线并注册
        manager.transition(ContainerState::Running)?;
        if let Err(e) = registry::register(manager.clone()) {
            manager.abort();
            return Err(e);
        }

        // 第十步：应用作用域初始化事件
        manager.fire_lifecycle_event(&Scope::APPLICATION, Qualifier::initialized(&Scope::APPLICATION));
        info!(
            "容器启动完成: {} ({} 个 Bean, {} 个扩展)",
            container_id,
            manager.beans().len(),
            extensions.len()
        );
        Ok(manager)
    }
}

fn fail_on_problems(manager: &BeanManager, problems: Vec<DeploymentProblem>) -> Result<(), WeldError> {
    if problems.is_empty() {
        return Ok(());
    }
    let exception = DeploymentException { problems };
    error!("容器 {} 部署失败: {}", manager.id(), exception);
    manager.abort();
    Err(exception.into())
}
