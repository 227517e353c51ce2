//! 线程绑定的上下文状态

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use uuid::Uuid;

thread_local! {
    static SLOTS: RefCell<HashMap<Uuid, Box<dyn Any>>> = RefCell::new(HashMap::new());
}

/// 每个上下文实例在每个线程上各自持有的一个值
///
/// 同一进程中的多个容器各有独立的上下文实例, 以 UUID 区分, 互不干扰。
/// 释放时只清理释放所在线程上的值; 其他线程上的值保留到该线程 `take` 或退出。
/// 需要跨线程清理的上下文自行登记状态 (见 `RequestContext::destroy_all_active`)。
pub struct ThreadBound<T: Clone + 'static> {
    key: Uuid,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Clone + 'static> ThreadBound<T> {
    /// 创建
    pub fn new() -> Self {
        Self {
            key: Uuid::new_v4(),
            _marker: PhantomData,
        }
    }

    /// 当前线程上的值
    pub fn get(&self) -> Option<T> {
        SLOTS.with(|slots| {
            slots
                .borrow()
                .get(&self.key)
                .and_then(|value| value.downcast_ref::<T>())
                .cloned()
        })
    }

    /// 设置当前线程上的值, 返回旧值
    pub fn set(&self, value: T) -> Option<T> {
        SLOTS.with(|slots| {
            slots
                .borrow_mut()
                .insert(self.key, Box::new(value))
                .and_then(|old| old.downcast::<T>().ok())
                .map(|old| *old)
        })
    }

    /// 取出当前线程上的值
    pub fn take(&self) -> Option<T> {
        SLOTS.with(|slots| {
            slots
                .borrow_mut()
                .remove(&self.key)
                .and_then(|old| old.downcast::<T>().ok())
                .map(|old| *old)
        })
    }

    /// 当前线程上是否有值
    pub fn is_set(&self) -> bool {
        SLOTS.with(|slots| slots.borrow().contains_key(&self.key))
    }
}

impl<T: Clone + 'static> Default for ThreadBound<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Drop for ThreadBound<T> {
    fn drop(&mut self) {
        let _ = SLOTS.try_with(|slots| {
            let removed = slots
                .try_borrow_mut()
                .ok()
                .and_then(|mut slots| slots.remove(&self.key));
            drop(removed);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_values_are_per_thread() {
        let bound: Arc<ThreadBound<u32>> = Arc::new(ThreadBound::new());
        bound.set(1);
        let other = bound.clone();
        let seen = thread::spawn(move || {
            let before = other.get();
            other.set(2);
            (before, other.get())
        })
        .join()
        .unwrap();
        assert_eq!(seen, (None, Some(2)));
        assert_eq!(bound.get(), Some(1));
        assert_eq!(bound.take(), Some(1));
        assert!(!bound.is_set());
    }

    #[test]
    fn test_instances_are_independent() {
        let a: ThreadBound<&'static str> = ThreadBound::new();
        let b: ThreadBound<&'static str> = ThreadBound::new();
        a.set("a");
        assert_eq!(b.get(), None);
        assert_eq!(a.get(), Some("a"));
    }
}
