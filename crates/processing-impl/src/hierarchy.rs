//! 内存中的绑定层次实现
//!
//! 把查找键映射到按优先级降序的提供者列表；优先级相同的条目保持
//! 登记顺序。解析算法本身由宿主决定，这里只提供登记与查询。

use component_common::ComponentKey;
use dashmap::DashMap;
use processing_abstractions::{BindingHierarchy, BindingProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

struct BindingEntry {
    priority: i32,
    sequence: usize,
    provider: Arc<BindingProvider>,
}

/// 内存中的绑定层次
#[derive(Default)]
pub struct InMemoryBindingHierarchy {
    bindings: DashMap<ComponentKey, Vec<BindingEntry>>,
    sequence: AtomicUsize,
}

impl InMemoryBindingHierarchy {
    /// 创建新的绑定层次
    pub fn new() -> Self {
        Self::default()
    }
}

impl BindingHierarchy for InMemoryBindingHierarchy {
    fn bind(&self, key: ComponentKey, priority: i32, provider: BindingProvider) {
        debug!("登记绑定提供者: {}, 优先级: {}", key, priority);
        let entry = BindingEntry {
            priority,
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            provider: Arc::new(provider),
        };

        let mut entries = self.bindings.entry(key).or_default();
        entries.push(entry);
        entries.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.sequence.cmp(&b.sequence))
        });
    }

    fn providers(&self, key: &ComponentKey) -> Vec<Arc<BindingProvider>> {
        self.bindings
            .get(key)
            .map(|entries| entries.iter().map(|entry| entry.provider.clone()).collect())
            .unwrap_or_default()
    }

    fn keys(&self) -> Vec<ComponentKey> {
        self.bindings.iter().map(|entry| entry.key().clone()).collect()
    }
}
