//! 组件注册表实现
//!
//! 在扫描根下发现带组件标记的类型，为每个类型构建一次组件容器并缓存。
//! 扫描按根幂等；纯标记声明被丢弃；必需激活器未全部激活的组件被过滤。

use chrono::{DateTime, Utc};
use component_common::{
    attributes, markers, ActivatorKey, ActivatorSource, ComponentContainer, ComponentError,
    ComponentKind, ComponentResult, Marker, TypeDescriptor, TypeInfo, TypeIntrospector, TypeKind,
};
use dashmap::DashMap;
use processing_abstractions::ComponentRegistry;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 一次扫描根注册的记录
#[derive(Debug, Clone)]
struct ScanRecord {
    containers: Vec<Arc<ComponentContainer>>,
    registered_at: DateTime<Utc>,
}

/// 组件注册表实现
pub struct ComponentRegistryImpl {
    introspector: Arc<dyn TypeIntrospector>,
    activators: Arc<dyn ActivatorSource>,
    roots: DashMap<String, ScanRecord>,
    by_type: DashMap<TypeInfo, Arc<ComponentContainer>>,
}

impl ComponentRegistryImpl {
    /// 创建新的组件注册表
    pub fn new(introspector: Arc<dyn TypeIntrospector>, activators: Arc<dyn ActivatorSource>) -> Self {
        Self {
            introspector,
            activators,
            roots: DashMap::new(),
            by_type: DashMap::new(),
        }
    }

    fn container_from_descriptor(
        &self,
        descriptor: &TypeDescriptor,
        marker: &Marker,
    ) -> ComponentResult<ComponentContainer> {
        let mut builder = ComponentContainer::builder(descriptor.type_info.clone());

        if let Some(id) = marker.text_attribute(attributes::ID) {
            builder = builder.id(id);
        }
        if let Some(name) = marker.text_attribute(attributes::NAME) {
            builder = builder.name(name);
        }
        if let Some(kind) = marker.text_attribute(attributes::KIND) {
            builder = builder.kind(kind.parse::<ComponentKind>()?);
        }
        if let Some(owner) = marker.text_attribute(attributes::OWNER) {
            match self.introspector.find_by_name(owner) {
                Some(owner_descriptor) => {
                    builder = builder.owner(owner_descriptor.type_info.clone());
                }
                None => warn!(
                    "治理父类型未注册, 回退为组件自身: {} -> {}",
                    descriptor.type_info.name, owner
                ),
            }
        }
        for activator in marker.list_attribute(attributes::ACTIVATORS) {
            builder = builder.activator(ActivatorKey::new(activator));
        }

        Ok(builder
            .singleton(marker.flag_attribute(attributes::SINGLETON, false))
            .lazy(marker.flag_attribute(attributes::LAZY, false))
            .permits_proxying(marker.flag_attribute(attributes::PERMITS_PROXYING, true))
            .permits_processing(marker.flag_attribute(attributes::PERMITS_PROCESSING, true))
            .build())
    }

    /// 已注册的扫描根及其注册时间
    pub fn scanned_roots(&self) -> Vec<(String, DateTime<Utc>)> {
        self.roots
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().registered_at))
            .collect()
    }

    fn activators_satisfied(&self, container: &ComponentContainer) -> bool {
        container
            .activators()
            .iter()
            .all(|key| self.activators.has_activator(key))
    }
}

impl ComponentRegistry for ComponentRegistryImpl {
    fn register(&self, scan_root: &str) -> ComponentResult<usize> {
        if let Some(record) = self.roots.get(scan_root) {
            debug!("使用缓存的扫描结果: {}", scan_root);
            return Ok(record.containers.len());
        }

        debug!("开始扫描根: {}", scan_root);
        let mut candidates: Vec<Arc<TypeDescriptor>> = self
            .introspector
            .known_types()
            .into_iter()
            .filter(|descriptor| descriptor.type_info.within(scan_root))
            .collect();
        // DashMap 迭代无序, 按类型名称排序保证扫描结果确定
        candidates.sort_by(|a, b| a.type_info.name.cmp(&b.type_info.name));

        let mut containers = Vec::new();
        for descriptor in candidates {
            let Some(marker) = descriptor.markers.get(markers::COMPONENT) else {
                continue;
            };
            if descriptor.kind == TypeKind::MarkerDeclaration {
                debug!("丢弃纯标记声明: {}", descriptor.type_info.name);
                continue;
            }

            let container = self.container_from_descriptor(&descriptor, marker)?;
            if !self.activators_satisfied(&container) {
                debug!(
                    "必需激活器未激活, 过滤组件: {}",
                    container.type_info().name
                );
                continue;
            }

            // 同一类型跨扫描根复用首个容器, 保证按类型唯一
            let container = self
                .by_type
                .entry(container.type_info().clone())
                .or_insert_with(|| Arc::new(container))
                .clone();
            containers.push(container);
        }

        info!(
            "扫描根 {} 注册完成, 发现 {} 个组件",
            scan_root,
            containers.len()
        );
        let count = containers.len();
        self.roots.insert(
            scan_root.to_string(),
            ScanRecord {
                containers,
                registered_at: Utc::now(),
            },
        );
        Ok(count)
    }

    fn containers(&self) -> Vec<Arc<ComponentContainer>> {
        let mut containers: Vec<Arc<ComponentContainer>> = self
            .by_type
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        containers.sort_by(|a, b| a.name().cmp(b.name()));
        containers
    }

    fn containers_by_kind(&self, kind: ComponentKind) -> Vec<Arc<ComponentContainer>> {
        self.containers()
            .into_iter()
            .filter(|container| container.kind() == kind)
            .collect()
    }

    fn container(&self, type_info: &TypeInfo) -> Option<Arc<ComponentContainer>> {
        self.by_type.get(type_info).map(|entry| entry.clone())
    }
}

impl std::fmt::Debug for ComponentRegistryImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistryImpl")
            .field("roots", &self.roots.len())
            .field("containers", &self.by_type.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use component_common::{ActivatorSet, InMemoryTypeIntrospector};

    struct OrderService;
    struct AuditService;
    struct Experimental;
    struct ComponentTag;

    fn introspector() -> Arc<InMemoryTypeIntrospector> {
        let introspector = Arc::new(InMemoryTypeIntrospector::new());
        introspector.register(
            TypeDescriptor::of::<OrderService>().with_marker(
                Marker::new(markers::COMPONENT).with_attribute(attributes::SINGLETON, true),
            ),
        );
        introspector.register(
            TypeDescriptor::of::<AuditService>()
                .with_marker(Marker::new(markers::COMPONENT).with_attribute(attributes::LAZY, true)),
        );
        introspector.register(
            TypeDescriptor::of::<Experimental>().with_marker(
                Marker::new(markers::COMPONENT)
                    .with_attribute(attributes::ACTIVATORS, serde_json::json!(["experimental"])),
            ),
        );
        introspector.register(
            TypeDescriptor::of::<ComponentTag>()
                .with_kind(TypeKind::MarkerDeclaration)
                .with_marker(Marker::new(markers::COMPONENT)),
        );
        introspector
    }

    fn scan_root() -> &'static str {
        "processing_impl"
    }

    #[test]
    fn register_is_idempotent_per_root() {
        let registry =
            ComponentRegistryImpl::new(introspector(), Arc::new(ActivatorSet::standard()));

        let first = registry.register(scan_root()).unwrap();
        let second = registry.register(scan_root()).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.containers().len(), first);
    }

    #[test]
    fn containers_are_unique_by_type() {
        let registry =
            ComponentRegistryImpl::new(introspector(), Arc::new(ActivatorSet::standard()));
        registry.register(scan_root()).unwrap();

        let matches = registry
            .containers()
            .into_iter()
            .filter(|container| container.type_info() == &TypeInfo::of::<OrderService>())
            .count();
        assert_eq!(matches, 1);
    }

    #[test]
    fn inactive_activator_excludes_component() {
        let registry =
            ComponentRegistryImpl::new(introspector(), Arc::new(ActivatorSet::standard()));
        registry.register(scan_root()).unwrap();

        assert!(registry.container(&TypeInfo::of::<Experimental>()).is_none());

        let activated = ComponentRegistryImpl::new(
            introspector(),
            Arc::new(ActivatorSet::standard().with_activator("experimental")),
        );
        activated.register(scan_root()).unwrap();
        assert!(activated.container(&TypeInfo::of::<Experimental>()).is_some());
    }

    #[test]
    fn marker_declarations_are_discarded() {
        let registry =
            ComponentRegistryImpl::new(introspector(), Arc::new(ActivatorSet::standard()));
        registry.register(scan_root()).unwrap();

        assert!(registry.container(&TypeInfo::of::<ComponentTag>()).is_none());
    }

    #[test]
    fn absence_is_not_an_error() {
        struct Unregistered;

        let registry =
            ComponentRegistryImpl::new(introspector(), Arc::new(ActivatorSet::standard()));
        registry.register(scan_root()).unwrap();

        assert!(registry.container(&TypeInfo::of::<Unregistered>()).is_none());
        assert!(!registry.contains(&TypeInfo::of::<Unregistered>()));
    }

    #[test]
    fn container_metadata_comes_from_marker() {
        let registry =
            ComponentRegistryImpl::new(introspector(), Arc::new(ActivatorSet::standard()));
        registry.register(scan_root()).unwrap();

        let container = registry
            .container(&TypeInfo::of::<OrderService>())
            .unwrap();
        assert!(container.singleton());
        assert!(!container.lazy());
        assert_eq!(container.id(), "order_service");

        let lazy = registry.container(&TypeInfo::of::<AuditService>()).unwrap();
        assert!(lazy.lazy());
        assert!(!lazy.singleton());
    }
}
