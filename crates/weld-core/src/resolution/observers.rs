//! 类型安全观察者解析器

use super::assignability::AssignabilityRules;
use super::hierarchy::TypeHierarchy;
use super::qualifiers::{contains_all_qualifiers, normalize_event_qualifiers};
use crate::util::ComputingCache;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;
use weld_common::{ResolutionError, WeldError, DEFAULT_RESOLUTION_CACHE_SIZE};
use weld_spi::{BeanType, ObserverMethod, Qualifier};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EventResolvable {
    event_type: BeanType,
    qualifiers: BTreeSet<Qualifier>,
}

/// 已排序的观察者列表
pub type ResolvedObservers = Arc<Vec<Arc<dyn ObserverMethod>>>;

/// 类型安全观察者解析器
///
/// 观察者的类型须匹配事件类型闭包中的某个类型, 且其限定符全部出现在事件限定符中;
/// 结果按优先级升序排列, 同优先级保持注册顺序。
pub struct TypeSafeObserverResolver {
    observers: Vec<Arc<dyn ObserverMethod>>,
    hierarchy: Arc<TypeHierarchy>,
    cache: ComputingCache<EventResolvable, ResolvedObservers>,
}

impl TypeSafeObserverResolver {
    /// 创建解析器
    pub fn new(
        observers: Vec<Arc<dyn ObserverMethod>>,
        hierarchy: Arc<TypeHierarchy>,
        cache_size: usize,
    ) -> Self {
        Self {
            observers,
            hierarchy,
            cache: ComputingCache::new(cache_size),
        }
    }

    /// 以默认缓存容量创建解析器
    pub fn with_default_cache(
        observers: Vec<Arc<dyn ObserverMethod>>,
        hierarchy: Arc<TypeHierarchy>,
    ) -> Self {
        Self::new(observers, hierarchy, DEFAULT_RESOLUTION_CACHE_SIZE)
    }

    /// 全部观察者
    pub fn observers(&self) -> &[Arc<dyn ObserverMethod>] {
        &self.observers
    }

    /// 解析事件的观察者
    pub fn resolve(
        &self,
        event_type: &BeanType,
        qualifiers: &[Qualifier],
    ) -> Result<ResolvedObservers, WeldError> {
        if event_type.contains_type_variable() {
            return Err(ResolutionError::IllegalEventType {
                event_type: event_type.to_string(),
            }
            .into());
        }
        let key = EventResolvable {
            event_type: event_type.clone(),
            qualifiers: normalize_event_qualifiers(qualifiers),
        };
        Ok(self.cache.get_or_compute(&key, |key| {
            let resolved = self.matching(key);
            debug!(
                "事件 {} 解析到 {} 个观察者",
                key.event_type,
                resolved.len()
            );
            Arc::new(resolved)
        }))
    }

    /// 清空缓存
    pub fn clear(&self) {
        self.cache.clear();
    }

    fn matching(&self, key: &EventResolvable) -> Vec<Arc<dyn ObserverMethod>> {
        let rules = AssignabilityRules::new(&self.hierarchy);
        let closure = self.hierarchy.type_closure(&key.event_type);
        let event_qualifiers: Vec<Qualifier> = key.qualifiers.iter().cloned().collect();
        let mut resolved: Vec<Arc<dyn ObserverMethod>> = self
            .observers
            .iter()
            .filter(|observer| {
                rules.matches_event_types(observer.observed_type(), &closure)
                    && contains_all_qualifiers(observer.observed_qualifiers(), &event_qualifiers)
            })
            .cloned()
            .collect();
        resolved.sort_by_key(|observer| observer.priority());
        resolved
    }
}
