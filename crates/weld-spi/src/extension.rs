//! 扩展 SPI
//!
//! 扩展在启动期间按注册顺序接收容器生命周期事件,
//! 可以否决 Bean、以编程方式注册 Bean、观察者、拦截器与上下文, 并报告问题。

use crate::bean::Bean;
use crate::container::BeanContainer;
use crate::context::Context;
use crate::interceptor::Interceptor;
use crate::observer::ObserverMethod;
use std::sync::Arc;
use weld_common::DeploymentProblem;

/// 可移植扩展
pub trait Extension: Send + Sync {
    /// 扩展名称
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Bean 发现开始前
    fn before_bean_discovery(&self, _event: &mut BeforeBeanDiscovery) {}

    /// 每个发现的 Bean
    fn process_bean_attributes(&self, _event: &mut ProcessBeanAttributes) {}

    /// Bean 发现完成后
    fn after_bean_discovery(&self, _event: &mut AfterBeanDiscovery) {}

    /// 部署校验完成后
    fn after_deployment_validation(&self, _event: &mut AfterDeploymentValidation) {}

    /// 容器关闭前
    fn before_shutdown(&self, _event: &BeforeShutdown) {}
}

/// Bean 发现开始前的事件
#[derive(Default)]
pub struct BeforeBeanDiscovery {
    beans: Vec<Arc<dyn Bean>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl BeforeBeanDiscovery {
    /// 创建事件
    pub fn new() -> Self {
        Self::default()
    }

    /// 在发现之前加入 Bean, 这些 Bean 同样经过发现过滤
    pub fn add_bean(&mut self, bean: Arc<dyn Bean>) {
        self.beans.push(bean);
    }

    /// 注册拦截器
    pub fn add_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    /// 取出收集的内容
    pub fn into_parts(self) -> (Vec<Arc<dyn Bean>>, Vec<Arc<dyn Interceptor>>) {
        (self.beans, self.interceptors)
    }
}

/// 处理单个 Bean 属性的事件
pub struct ProcessBeanAttributes {
    bean: Arc<dyn Bean>,
    vetoed: bool,
    problems: Vec<DeploymentProblem>,
}

impl ProcessBeanAttributes {
    /// 创建事件
    pub fn new(bean: Arc<dyn Bean>) -> Self {
        Self {
            bean,
            vetoed: false,
            problems: Vec::new(),
        }
    }

    /// 正在处理的 Bean
    pub fn bean(&self) -> &Arc<dyn Bean> {
        &self.bean
    }

    /// 否决该 Bean, 使其不参与部署
    pub fn veto(&mut self) {
        self.vetoed = true;
    }

    /// 是否被否决
    pub fn is_vetoed(&self) -> bool {
        self.vetoed
    }

    /// 报告定义错误
    pub fn add_definition_error(&mut self, message: impl Into<String>) {
        self.problems.push(DeploymentProblem::definition(message));
    }

    /// 取出报告的问题
    pub fn take_problems(&mut self) -> Vec<DeploymentProblem> {
        std::mem::take(&mut self.problems)
    }
}

/// Bean 发现完成后的事件
#[derive(Default)]
pub struct AfterBeanDiscovery {
    beans: Vec<Arc<dyn Bean>>,
    observers: Vec<Arc<dyn ObserverMethod>>,
    contexts: Vec<Arc<dyn Context>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    problems: Vec<DeploymentProblem>,
}

/// 扩展在 [`AfterBeanDiscovery`] 中注册的全部内容
#[derive(Default)]
pub struct AfterBeanDiscoveryParts {
    /// Bean
    pub beans: Vec<Arc<dyn Bean>>,
    /// 观察者
    pub observers: Vec<Arc<dyn ObserverMethod>>,
    /// 自定义上下文
    pub contexts: Vec<Arc<dyn Context>>,
    /// 拦截器
    pub interceptors: Vec<Arc<dyn Interceptor>>,
    /// 定义错误
    pub problems: Vec<DeploymentProblem>,
}

impl AfterBeanDiscovery {
    /// 创建事件
    pub fn new() -> Self {
        Self::default()
    }

    /// 以编程方式注册 Bean
    pub fn add_bean(&mut self, bean: Arc<dyn Bean>) {
        self.beans.push(bean);
    }

    /// 以编程方式注册观察者
    pub fn add_observer_method(&mut self, observer: Arc<dyn ObserverMethod>) {
        self.observers.push(observer);
    }

    /// 注册自定义作用域上下文
    pub fn add_context(&mut self, context: Arc<dyn Context>) {
        self.contexts.push(context);
    }

    /// 注册拦截器
    pub fn add_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    /// 报告定义错误
    pub fn add_definition_error(&mut self, message: impl Into<String>) {
        self.problems.push(DeploymentProblem::definition(message));
    }

    /// 取出收集的内容
    pub fn into_parts(self) -> AfterBeanDiscoveryParts {
        AfterBeanDiscoveryParts {
            beans: self.beans,
            observers: self.observers,
            contexts: self.contexts,
            interceptors: self.interceptors,
            problems: self.problems,
        }
    }
}

/// 部署校验完成后的事件
pub struct AfterDeploymentValidation {
    container: Arc<dyn BeanContainer>,
    problems: Vec<DeploymentProblem>,
}

impl AfterDeploymentValidation {
    /// 创建事件
    pub fn new(container: Arc<dyn BeanContainer>) -> Self {
        Self {
            container,
            problems: Vec::new(),
        }
    }

    /// 已构建 (尚未上线) 的容器
    pub fn container(&self) -> &Arc<dyn BeanContainer> {
        &self.container
    }

    /// 报告部署问题, 将中止启动
    pub fn add_deployment_problem(&mut self, message: impl Into<String>) {
        self.problems.push(DeploymentProblem::deployment(message));
    }

    /// 取出报告的问题
    pub fn take_problems(&mut self) -> Vec<DeploymentProblem> {
        std::mem::take(&mut self.problems)
    }
}

/// 容器关闭前的事件
#[derive(Debug, Clone)]
pub struct BeforeShutdown {
    /// 容器 ID
    pub container_id: String,
}
