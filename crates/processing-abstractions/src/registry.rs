//! 组件注册表抽象接口

use component_common::{ComponentContainer, ComponentKind, ComponentResult, TypeInfo};
use std::sync::Arc;

/// 组件注册表 trait
///
/// 发现并缓存扫描根下的组件容器元数据；`container` 的"缺席"结果是整个
/// 管线的准入门：处理器拒绝处理注册表不认识的组件
pub trait ComponentRegistry: Send + Sync {
    /// 注册扫描根下的全部组件，按根幂等
    fn register(&self, scan_root: &str) -> ComponentResult<usize>;

    /// 所有已注册组件容器的只读快照
    fn containers(&self) -> Vec<Arc<ComponentContainer>>;

    /// 按组件种类过滤的只读快照
    fn containers_by_kind(&self, kind: ComponentKind) -> Vec<Arc<ComponentContainer>>;

    /// 按精确类型查找组件容器；未注册返回 `None`，不是错误
    fn container(&self, type_info: &TypeInfo) -> Option<Arc<ComponentContainer>>;

    /// 检查类型是否已注册
    fn contains(&self, type_info: &TypeInfo) -> bool {
        self.container(type_info).is_some()
    }
}
