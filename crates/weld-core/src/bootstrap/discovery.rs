//! 发现过滤、备选启用与特化

use crate::bean::SpecializedBean;
use glob::Pattern;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use weld_common::{AlternativeSettings, BeanDiscoveryMode, DeploymentProblem, DiscoverySettings};
use weld_spi::{Bean, BeanDeploymentArchive, BeanIdentifier, BeansXml, Interceptor, ObserverMethod};

/// 发现阶段的结果
#[derive(Default)]
pub(crate) struct Discovered {
    pub beans: Vec<Arc<dyn Bean>>,
    pub observers: Vec<Arc<dyn ObserverMethod>>,
    pub interceptors: Vec<Arc<dyn Interceptor>>,
    /// 被过滤掉的 Bean, 其声明的观察者随之移除
    pub removed: HashSet<BeanIdentifier>,
}

/// 编译 glob 模式, 非法模式记为定义错误
fn compile_patterns(
    source: &str,
    patterns: &[String],
    problems: &mut Vec<DeploymentProblem>,
) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|pattern| match Pattern::new(pattern) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                problems.push(DeploymentProblem::definition(format!(
                    "{source} 中的排除模式非法: {pattern} ({e})"
                )));
                None
            }
        })
        .collect()
}

/// 备选是否在全局或归档内启用
pub(crate) fn is_enabled(bean: &dyn Bean, global: &AlternativeSettings, archive: Option<&BeansXml>) -> bool {
    if !bean.is_alternative() || bean.priority().is_some() {
        return true;
    }
    let selected = |name: &String| name == bean.bean_class() || name == bean.id().as_str();
    global.enabled.iter().any(selected)
        || archive.map_or(false, |xml| xml.enabled_alternatives.iter().any(selected))
}

/// 按归档的发现模式与排除规则过滤, 并移除未启用的备选
pub(crate) fn discover(
    archives: &[BeanDeploymentArchive],
    settings: &DiscoverySettings,
    alternatives: &AlternativeSettings,
    problems: &mut Vec<DeploymentProblem>,
) -> Discovered {
    let global_excludes = compile_patterns("discovery.excludes", &settings.excludes, problems);
    let mut discovered = Discovered::default();

    for archive in archives {
        let xml = archive.beans_xml();
        let excludes = compile_patterns(archive.id(), &xml.excludes, problems);
        let excluded = |bean: &dyn Bean| {
            global_excludes
                .iter()
                .chain(&excludes)
                .any(|pattern| pattern.matches(bean.bean_class()))
        };

        for bean in archive.beans() {
            let keep = match xml.discovery_mode {
                BeanDiscoveryMode::None => false,
                BeanDiscoveryMode::Annotated => bean.has_explicit_scope(),
                BeanDiscoveryMode::All => true,
            };
            if !keep || excluded(bean.as_ref()) {
                debug!("归档 {} 中的 Bean 未被发现: {}", archive.id(), bean.id());
                discovered.removed.insert(bean.id().clone());
            } else if !is_enabled(bean.as_ref(), alternatives, Some(xml)) {
                debug!("备选未启用: {}", bean.id());
                discovered.removed.insert(bean.id().clone());
            } else {
                discovered.beans.push(Arc::clone(bean));
            }
        }
        if xml.discovery_mode != BeanDiscoveryMode::None {
            discovered.observers.extend(archive.observers().iter().cloned());
            discovered.interceptors.extend(archive.interceptors().iter().cloned());
        }
        debug!(
            "归档 {} ({:?}): {} 个 Bean",
            archive.id(),
            xml.discovery_mode,
            archive.beans().len()
        );
    }
    discovered
}

/// 应用特化: 被特化的 Bean 移出部署, 特化 Bean 继承其限定符与名称
///
/// 返回特化后的 Bean 集合与被移除的标识符。
pub(crate) fn specialize(
    beans: Vec<Arc<dyn Bean>>,
    problems: &mut Vec<DeploymentProblem>,
) -> (Vec<Arc<dyn Bean>>, HashSet<BeanIdentifier>) {
    let by_id: HashMap<BeanIdentifier, Arc<dyn Bean>> = beans
        .iter()
        .map(|bean| (bean.id().clone(), Arc::clone(bean)))
        .collect();

    let mut specializers: HashMap<&BeanIdentifier, Vec<&BeanIdentifier>> = HashMap::new();
    for bean in &beans {
        if let Some(target) = bean.specializes() {
            specializers.entry(target).or_default().push(bean.id());
        }
    }
    for (target, by) in &specializers {
        if by.len() > 1 {
            let mut names: Vec<String> = by.iter().map(ToString::to_string).collect();
            names.sort();
            problems.push(DeploymentProblem::deployment(format!(
                "Bean {target} 被多个启用的 Bean 特化: {names:?}"
            )));
        }
    }

    let mut removed = HashSet::new();
    let mut chains: HashMap<BeanIdentifier, Vec<Arc<dyn Bean>>> = HashMap::new();
    for bean in &beans {
        let Some(mut target_id) = bean.specializes() else {
            continue;
        };
        let mut chain = Vec::new();
        let mut seen = HashSet::from([bean.id().clone()]);
        loop {
            let Some(target) = by_id.get(target_id) else {
                problems.push(DeploymentProblem::definition(format!(
                    "Bean {} 特化的 Bean 不存在或未启用: {}",
                    bean.id(),
                    target_id
                )));
                break;
            };
            if !seen.insert(target_id.clone()) {
                problems.push(DeploymentProblem::definition(format!(
                    "Bean {} 的特化链存在循环",
                    bean.id()
                )));
                break;
            }
            if let Some(missing) = target.types().iter().find(|t| !bean.types().contains(t)) {
                problems.push(DeploymentProblem::definition(format!(
                    "特化 Bean {} 没有暴露被特化 Bean {} 的类型 {}",
                    bean.id(),
                    target.id(),
                    missing
                )));
            }
            removed.insert(target_id.clone());
            chain.push(Arc::clone(target));
            match target.specializes() {
                Some(next) => target_id = next,
                None => break,
            }
        }
        chains.insert(bean.id().clone(), chain);
    }

    let specialized = beans
        .into_iter()
        .filter(|bean| !removed.contains(bean.id()))
        .map(|bean| match chains.remove(bean.id()) {
            Some(chain) if !chain.is_empty() => {
                debug!("Bean {} 特化了 {} 个 Bean", bean.id(), chain.len());
                Arc::new(SpecializedBean::new(bean, &chain)) as Arc<dyn Bean>
            }
            _ => bean,
        })
        .collect();
    (specialized, removed)
}
