//! 单元测试共享的处理上下文桩

use crate::hierarchy::InMemoryBindingHierarchy;
use crate::registry::ComponentRegistryImpl;
use component_common::{
    ActivatorKey, ActivatorSet, ComponentKey, DefaultLifecycleManager, DependencyError,
    DependencyResult, InMemoryTypeIntrospector, Instance, LifecycleManager, TypeInfo,
    TypeIntrospector,
};
use processing_abstractions::{
    BindingHierarchy, BindingProvider, ComponentRegistry, FactoryContext, ProcessingContext,
};
use std::sync::Arc;

/// 单元测试用的处理上下文
///
/// 解析逻辑刻意保持简单：命中实例/供应者绑定，否则调用无参绑定构造函数
#[derive(Clone)]
pub(crate) struct TestContext {
    pub introspector: Arc<InMemoryTypeIntrospector>,
    pub hierarchy: Arc<InMemoryBindingHierarchy>,
    pub registry: Arc<ComponentRegistryImpl>,
    pub factory: Arc<FactoryContext>,
    pub lifecycle: Arc<DefaultLifecycleManager>,
    pub activators: Arc<ActivatorSet>,
}

impl TestContext {
    pub fn new(activators: ActivatorSet) -> Self {
        let introspector = Arc::new(InMemoryTypeIntrospector::new());
        let activators = Arc::new(activators);
        let registry = Arc::new(ComponentRegistryImpl::new(
            introspector.clone(),
            activators.clone(),
        ));
        Self {
            introspector,
            hierarchy: Arc::new(InMemoryBindingHierarchy::new()),
            registry,
            factory: Arc::new(FactoryContext::new()),
            lifecycle: Arc::new(DefaultLifecycleManager::new()),
            activators,
        }
    }

    pub fn standard() -> Self {
        Self::new(ActivatorSet::standard())
    }

    fn instantiate(&self, type_info: &TypeInfo) -> DependencyResult<Instance> {
        let descriptor = self.introspector.describe(type_info).ok_or_else(|| {
            DependencyError::ComponentNotRegistered {
                type_name: type_info.name.clone(),
            }
        })?;
        let constructor = descriptor
            .bound_constructors()
            .into_iter()
            .find(|constructor| constructor.parameter_types.is_empty())
            .ok_or_else(|| DependencyError::ComponentCreationFailed {
                type_name: type_info.name.clone(),
                message: "没有无参绑定构造函数".to_string(),
            })?;
        constructor
            .invoke(&[])
            .map_err(|e| DependencyError::ComponentCreationFailed {
                type_name: type_info.name.clone(),
                message: e.to_string(),
            })
    }
}

impl ProcessingContext for TestContext {
    fn introspector(&self) -> Arc<dyn TypeIntrospector> {
        self.introspector.clone()
    }

    fn hierarchy(&self) -> Arc<dyn BindingHierarchy> {
        self.hierarchy.clone()
    }

    fn registry(&self) -> Arc<dyn ComponentRegistry> {
        self.registry.clone()
    }

    fn factory_context(&self) -> Arc<FactoryContext> {
        self.factory.clone()
    }

    fn lifecycle(&self) -> Arc<dyn LifecycleManager> {
        self.lifecycle.clone()
    }

    fn has_activator(&self, key: &ActivatorKey) -> bool {
        use component_common::ActivatorSource;
        self.activators.has_activator(key)
    }

    fn resolve(&self, key: &ComponentKey) -> DependencyResult<Instance> {
        for provider in self.hierarchy.providers(key) {
            match provider.as_ref() {
                BindingProvider::Instance(existing) => return Ok(existing.clone()),
                BindingProvider::Supplier(context) => return context.get(self),
                BindingProvider::ConstructorBound { target } => {
                    return self.instantiate(target);
                }
            }
        }
        self.instantiate(&key.type_info)
    }

    fn populate(&self, _type_info: &TypeInfo, _instance: &Instance) -> DependencyResult<()> {
        Ok(())
    }

    fn enable(&self, _type_info: &TypeInfo, _instance: &Instance) -> DependencyResult<()> {
        Ok(())
    }

    fn handle(&self) -> Arc<dyn ProcessingContext> {
        Arc::new(self.clone())
    }
}
