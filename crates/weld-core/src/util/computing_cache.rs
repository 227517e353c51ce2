//! 计算缓存
//!
//! 每个键对应一个 `OnceCell`, 计算期间不持有任何分片锁,
//! 因此计算函数可以递归查询同一缓存中的其他键而不会死锁;
//! 同一个键的并发首次计算只会执行一次。

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

/// 可重入的计算缓存
pub struct ComputingCache<K, V> {
    entries: DashMap<K, Arc<OnceCell<V>>>,
    max_size: usize,
}

impl<K, V> ComputingCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// 创建缓存, 条目超过 `max_size` 时整体清空
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_size: max_size.max(1),
        }
    }

    /// 读取或计算
    pub fn get_or_compute(&self, key: &K, compute: impl FnOnce(&K) -> V) -> V {
        self.cell(key).get_or_init(|| compute(key)).clone()
    }

    /// 读取或计算, 计算失败时不缓存
    pub fn get_or_try_compute<E>(
        &self,
        key: &K,
        compute: impl FnOnce(&K) -> Result<V, E>,
    ) -> Result<V, E> {
        self.cell(key).get_or_try_init(|| compute(key)).cloned()
    }

    /// 读取已经计算完成的值
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).and_then(|cell| cell.get().cloned())
    }

    /// 清空
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn cell(&self, key: &K) -> Arc<OnceCell<V>> {
        if let Some(cell) = self.entries.get(key) {
            return cell.clone();
        }
        if self.entries.len() >= self.max_size {
            debug!("计算缓存达到上限 {}, 整体清空", self.max_size);
            self.entries.clear();
        }
        self.entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }
}
