//! 部署校验
//!
//! 收集全部定义错误与部署错误, 由启动流程聚合为一个 `DeploymentException`。

use crate::manager::BeanManager;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use weld_common::DeploymentProblem;
use weld_spi::{
    describe_bean, Bean, BeanIdentifier, Reception, ResolutionOutcome, TransactionPhase,
};

static BEAN_NAME: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$").ok());

/// 部署校验器
pub struct Validator<'a> {
    manager: &'a BeanManager,
    problems: Vec<DeploymentProblem>,
}

impl<'a> Validator<'a> {
    /// 校验给定管理器中的部署
    pub fn new(manager: &'a BeanManager) -> Self {
        Self {
            manager,
            problems: Vec::new(),
        }
    }

    /// 运行全部检查
    pub fn validate(mut self) -> Vec<DeploymentProblem> {
        self.validate_bean_ids();
        self.validate_bean_types();
        self.validate_scopes();
        self.validate_injection_points();
        self.validate_names();
        self.validate_interceptors();
        self.validate_observers();
        self.validate_pseudo_scoped_cycles();
        debug!("部署校验完成, 发现 {} 个问题", self.problems.len());
        self.problems
    }

    fn definition(&mut self, message: String) {
        self.problems.push(DeploymentProblem::definition(message));
    }

    fn deployment(&mut self, message: String) {
        self.problems.push(DeploymentProblem::deployment(message));
    }

    fn validate_bean_ids(&mut self) {
        let manager = self.manager;
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for bean in manager.beans() {
            if !seen.insert(bean.id().clone()) && reported.insert(bean.id().clone()) {
                self.definition(format!("Bean 标识符重复: {}", bean.id()));
            }
        }
    }

    fn validate_bean_types(&mut self) {
        let manager = self.manager;
        for bean in manager.beans() {
            for bean_type in bean.types() {
                if !bean_type.is_legal_bean_type() {
                    self.definition(format!(
                        "{} 暴露了非法的 Bean 类型: {}",
                        describe_bean(bean.as_ref()),
                        bean_type
                    ));
                }
            }
        }
    }

    fn validate_scopes(&mut self) {
        let manager = self.manager;
        for bean in manager.beans() {
            if !manager.has_context(bean.scope()) {
                self.deployment(format!(
                    "{} 的作用域没有注册上下文",
                    describe_bean(bean.as_ref())
                ));
            }
        }
    }

    fn validate_injection_points(&mut self) {
        let manager = self.manager;
        for bean in manager.beans() {
            for point in bean.injection_points().iter().filter(|point| !point.dynamic) {
                match manager.resolve(&point.required_type, &point.qualifiers) {
                    Ok(ResolutionOutcome::Unique(_)) => {}
                    Ok(ResolutionOutcome::Unsatisfied) => self.deployment(format!(
                        "{} 的注入点 [{}] 未满足",
                        describe_bean(bean.as_ref()),
                        point
                    )),
                    Ok(ResolutionOutcome::Ambiguous(candidates)) => self.deployment(format!(
                        "{} 的注入点 [{}] 有歧义, 候选 {:?}",
                        describe_bean(bean.as_ref()),
                        point,
                        candidates.iter().map(|c| c.id().to_string()).collect::<Vec<_>>()
                    )),
                    Err(e) => self.definition(format!(
                        "{} 的注入点 [{}] 非法: {}",
                        describe_bean(bean.as_ref()),
                        point,
                        e
                    )),
                }
            }
        }
    }

    fn validate_names(&mut self) {
        let manager = self.manager;
        let mut names: Vec<&str> = manager.beans().iter().filter_map(|b| b.name()).collect();
        names.sort_unstable();
        names.dedup();
        for name in names {
            if !BEAN_NAME.as_ref().map_or(true, |pattern| pattern.is_match(name)) {
                self.definition(format!("Bean 名称格式非法: {name}"));
            }
            if let ResolutionOutcome::Ambiguous(candidates) = manager.resolve_by_name(name) {
                self.deployment(format!(
                    "Bean 名称 {} 有歧义, 候选 {:?}",
                    name,
                    candidates.iter().map(|c| c.id().to_string()).collect::<Vec<_>>()
                ));
            }
        }
    }

    fn validate_interceptors(&mut self) {
        let manager = self.manager;
        for interceptor in manager.interceptors() {
            if interceptor.bindings().is_empty() {
                self.definition(format!("拦截器 {} 没有声明拦截器绑定", interceptor.name()));
            }
        }
        for bean in manager.beans() {
            let bindings = bean.interceptor_bindings();
            for (index, binding) in bindings.iter().enumerate() {
                let conflict = bindings[index + 1..]
                    .iter()
                    .any(|other| other.type_name() == binding.type_name() && other != binding);
                if conflict {
                    self.definition(format!(
                        "{} 的拦截器绑定 {} 存在冲突的成员值",
                        describe_bean(bean.as_ref()),
                        binding.type_name()
                    ));
                }
            }
        }
    }

    fn validate_observers(&mut self) {
        let manager = self.manager;
        for observer in manager.observers() {
            if observer.is_async() && observer.transaction_phase() != TransactionPhase::InProgress {
                self.definition(format!("异步观察者 {} 不能声明事务阶段", observer.id()));
            }
            let Some(bean_id) = observer.declaring_bean() else {
                continue;
            };
            match manager.bean(bean_id) {
                None => self.definition(format!(
                    "观察者 {} 的声明 Bean 不存在: {}",
                    observer.id(),
                    bean_id
                )),
                Some(bean) if bean.scope().is_dependent() && observer.reception() == Reception::IfExists => {
                    self.definition(format!(
                        "依赖作用域 Bean {} 不能声明条件观察者 {}",
                        bean_id,
                        observer.id()
                    ))
                }
                Some(_) => {}
            }
        }
    }

    /// 伪作用域 Bean 之间的依赖不经过代理, 环路无法构造
    fn validate_pseudo_scoped_cycles(&mut self) {
        let graph: HashMap<BeanIdentifier, Vec<BeanIdentifier>> = self
            .manager
            .beans()
            .iter()
            .filter(|bean| !bean.scope().is_normal())
            .map(|bean| (bean.id().clone(), self.pseudo_scoped_dependencies(bean)))
            .collect();

        let mut ids: Vec<&BeanIdentifier> = graph.keys().collect();
        ids.sort();
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        let mut cycles = Vec::new();
        for id in ids {
            if !visited.contains(id) {
                dfs(id, &graph, &mut visited, &mut path, &mut cycles);
            }
        }
        for cycle in cycles {
            self.deployment(format!("伪作用域 Bean 之间存在循环依赖: {}", cycle));
        }
    }

    fn pseudo_scoped_dependencies(&self, bean: &Arc<dyn Bean>) -> Vec<BeanIdentifier> {
        bean.injection_points()
            .iter()
            .filter(|point| !point.dynamic)
            .filter_map(|point| {
                match self.manager.resolve(&point.required_type, &point.qualifiers) {
                    Ok(ResolutionOutcome::Unique(target)) if !target.scope().is_normal() => {
                        Some(target.id().clone())
                    }
                    _ => None,
                }
            })
            .collect()
    }
}

fn dfs<'g>(
    current: &'g BeanIdentifier,
    graph: &'g HashMap<BeanIdentifier, Vec<BeanIdentifier>>,
    visited: &mut HashSet<&'g BeanIdentifier>,
    path: &mut Vec<&'g BeanIdentifier>,
    cycles: &mut Vec<String>,
) {
    if let Some(start) = path.iter().position(|id| *id == current) {
        let chain: Vec<String> = path[start..]
            .iter()
            .chain(std::iter::once(&current))
            .map(ToString::to_string)
            .collect();
        cycles.push(chain.join(" -> "));
        return;
    }
    if visited.contains(current) {
        return;
    }
    path.push(current);
    if let Some(dependencies) = graph.get(current) {
        for dependency in dependencies {
            dfs(dependency, graph, visited, path, cycles);
        }
    }
    path.pop();
    visited.insert(current);
}
