//! 限定符规范化与匹配

use std::collections::BTreeSet;
use weld_spi::Qualifier;

/// 规范化 Bean 声明的限定符
///
/// 除 `@Named` 与 `@Any` 外没有其他限定符时补充 `@Default`; 总是补充 `@Any`。
pub fn normalize_bean_qualifiers(declared: &[Qualifier]) -> Vec<Qualifier> {
    let mut qualifiers: Vec<Qualifier> = Vec::with_capacity(declared.len() + 2);
    for qualifier in declared {
        if !qualifiers.contains(qualifier) {
            qualifiers.push(qualifier.clone());
        }
    }
    let needs_default = qualifiers.iter().all(|q| q.is_named() || q.is_any());
    if needs_default {
        qualifiers.push(Qualifier::default_qualifier());
    }
    if !qualifiers.iter().any(Qualifier::is_any) {
        qualifiers.push(Qualifier::any());
    }
    qualifiers
}

/// 规范化查找所需的限定符: 空集合表示 `@Default`, 结果有序去重, 用作缓存键
pub fn normalize_required_qualifiers(required: &[Qualifier]) -> BTreeSet<Qualifier> {
    if required.is_empty() {
        return BTreeSet::from([Qualifier::default_qualifier()]);
    }
    required.iter().cloned().collect()
}

/// Bean 的限定符是否覆盖全部所需限定符
pub fn contains_all_qualifiers<'a>(
    required: impl IntoIterator<Item = &'a Qualifier>,
    bean_qualifiers: &[Qualifier],
) -> bool {
    required
        .into_iter()
        .all(|required| bean_qualifiers.iter().any(|q| q == required))
}

/// 规范化事件限定符: 除 `@Any` 外没有限定符时补充 `@Default`; 总是包含 `@Any`
pub fn normalize_event_qualifiers(qualifiers: &[Qualifier]) -> BTreeSet<Qualifier> {
    let mut normalized: BTreeSet<Qualifier> = qualifiers.iter().cloned().collect();
    if normalized.iter().all(Qualifier::is_any) {
        normalized.insert(Qualifier::default_qualifier());
    }
    normalized.insert(Qualifier::any());
    normalized
}
