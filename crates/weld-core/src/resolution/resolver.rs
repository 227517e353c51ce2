//! 类型安全 Bean 解析器
//!
//! 给定所需类型与限定符, 把全部启用的 Bean 收窄为 0、1 或多个候选,
//! 结果按 (类型, 限定符) 缓存。容器上线后缓存只读, 可以并发查询。

use super::assignability::AssignabilityRules;
use super::hierarchy::TypeHierarchy;
use super::qualifiers::{contains_all_qualifiers, normalize_required_qualifiers};
use crate::util::ComputingCache;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;
use weld_common::{ResolutionError, WeldError, DEFAULT_RESOLUTION_CACHE_SIZE};
use weld_spi::{Bean, BeanType, Qualifier, ResolutionOutcome};

/// 解析请求, 作为缓存键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resolvable {
    /// 所需类型
    pub required: BeanType,
    /// 规范化后的限定符
    pub qualifiers: BTreeSet<Qualifier>,
}

impl Resolvable {
    /// 创建 Bean 解析请求
    pub fn new(required: &BeanType, qualifiers: &[Qualifier]) -> Self {
        Self {
            required: required.clone(),
            qualifiers: normalize_required_qualifiers(qualifiers),
        }
    }
}

#[derive(Clone)]
struct Resolved {
    candidates: Arc<Vec<Arc<dyn Bean>>>,
    outcome: ResolutionOutcome,
}

/// 类型安全 Bean 解析器
pub struct TypeSafeBeanResolver {
    beans: Vec<Arc<dyn Bean>>,
    by_type: HashMap<String, Vec<usize>>,
    hierarchy: Arc<TypeHierarchy>,
    cache: ComputingCache<Resolvable, Resolved>,
    names: ComputingCache<String, ResolutionOutcome>,
}

impl TypeSafeBeanResolver {
    /// 基于启用的 Bean 创建解析器
    pub fn new(beans: Vec<Arc<dyn Bean>>, hierarchy: Arc<TypeHierarchy>, cache_size: usize) -> Self {
        let mut by_type: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, bean) in beans.iter().enumerate() {
            for ty in bean.types() {
                let indices = by_type.entry(ty.index_key()).or_default();
                if indices.last() != Some(&index) {
                    indices.push(index);
                }
            }
        }
        debug!("构建解析器索引: {} 个 Bean, {} 个类型键", beans.len(), by_type.len());
        Self {
            beans,
            by_type,
            hierarchy,
            cache: ComputingCache::new(cache_size),
            names: ComputingCache::new(cache_size),
        }
    }

    /// 以默认缓存容量创建解析器
    pub fn with_default_cache(beans: Vec<Arc<dyn Bean>>, hierarchy: Arc<TypeHierarchy>) -> Self {
        Self::new(beans, hierarchy, DEFAULT_RESOLUTION_CACHE_SIZE)
    }

    /// 参与解析的 Bean
    pub fn beans(&self) -> &[Arc<dyn Bean>] {
        &self.beans
    }

    /// 解析
    pub fn resolve(
        &self,
        required: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<ResolutionOutcome, WeldError> {
        Ok(self.resolved(required, qualifiers)?.outcome)
    }

    /// 歧义消解之前的全部匹配 Bean
    pub fn candidates(
        &self,
        required: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<Vec<Arc<dyn Bean>>, WeldError> {
        Ok(self.resolved(required, qualifiers)?.candidates.to_vec())
    }

    /// 按名称解析
    pub fn resolve_by_name(&self, name: &str) -> ResolutionOutcome {
        self.names.get_or_compute(&name.to_string(), |name| {
            let matching: Vec<Arc<dyn Bean>> = self
                .beans
                .iter()
                .filter(|bean| bean.name() == Some(name.as_str()))
                .cloned()
                .collect();
            ResolutionOutcome::from_candidates(disambiguate(matching))
        })
    }

    /// 清空缓存
    pub fn clear(&self) {
        self.cache.clear();
        self.names.clear();
    }

    /// 缓存条目数
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    fn resolved(&self, required: &BeanType, qualifiers: &[Qualifier]) -> Result<Resolved, WeldError> {
        if !required.is_actual_type() {
            return Err(ResolutionError::IllegalRequiredType {
                required: required.to_string(),
            }
            .into());
        }
        let key = Resolvable::new(required, qualifiers);
        Ok(self.cache.get_or_compute(&key, |key| {
            let candidates = self.matching(key);
            let outcome = ResolutionOutcome::from_candidates(disambiguate(candidates.clone()));
            debug!("解析 {} {:?} -> {:?}", key.required, key.qualifiers, outcome);
            Resolved {
                candidates: Arc::new(candidates),
                outcome,
            }
        }))
    }

    fn matching(&self, key: &Resolvable) -> Vec<Arc<dyn Bean>> {
        let rules = AssignabilityRules::new(&self.hierarchy);
        let accepts = |bean: &Arc<dyn Bean>| {
            rules.matches_bean_types(&key.required, bean.types())
                && contains_all_qualifiers(&key.qualifiers, bean.qualifiers())
        };
        if key.required.is_object() {
            return self.beans.iter().filter(|b| accepts(*b)).cloned().collect();
        }
        self.by_type
            .get(&key.required.index_key())
            .map(|indices| {
                indices
                    .iter()
                    .map(|&index| &self.beans[index])
                    .filter(|b| accepts(*b))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// 歧义消解
///
/// 多个候选时只保留备选或带显式优先级的 Bean; 若其中仍有多个且都带优先级,
/// 选出数值最小的优先级组; 同一最小优先级下仍有多个时保持歧义。
pub fn disambiguate(candidates: Vec<Arc<dyn Bean>>) -> Vec<Arc<dyn Bean>> {
    if candidates.len() <= 1 {
        return candidates;
    }
    let prioritized: Vec<Arc<dyn Bean>> = candidates
        .iter()
        .filter(|bean| bean.is_alternative() || bean.priority().is_some())
        .cloned()
        .collect();
    if prioritized.is_empty() {
        return candidates;
    }
    if prioritized.len() == 1 || prioritized.iter().any(|bean| bean.priority().is_none()) {
        return prioritized;
    }
    let lowest = prioritized.iter().filter_map(|bean| bean.priority()).min();
    prioritized
        .into_iter()
        .filter(|bean| bean.priority() == lowest)
        .collect()
}
