//! 应用上下文
//!
//! 把内省服务、绑定层次、注册表、工厂绑定上下文、生命周期管理器与
//! 处理管线组合为一个可克隆的上下文对象。所有注册表与工厂状态都由
//! 上下文显式持有，同一进程可以承载多个互不相关的应用上下文。

use crate::options::RuntimeOptions;
use component_common::{
    markers, ActivatorKey, ActivatorSource, ComponentKey, DependencyError, DependencyResult,
    Instance, LifecycleManager, TypeInfo, TypeIntrospector,
};
use component_proxy::ProxyInstance;
use dashmap::DashMap;
use processing_abstractions::{
    BindingHierarchy, BindingProvider, ComponentRegistry, FactoryContext, ProcessingContext,
};
use processing_impl::ProcessingPipeline;
use std::cell::RefCell;
use std::sync::Arc;
use tracing::debug;

thread_local! {
    /// 当前线程的解析链，用于检测循环依赖
    static RESOLUTION_CHAIN: RefCell<Vec<ComponentKey>> = const { RefCell::new(Vec::new()) };
}

pub(crate) struct ContextInner {
    pub(crate) introspector: Arc<dyn TypeIntrospector>,
    pub(crate) hierarchy: Arc<dyn BindingHierarchy>,
    pub(crate) registry: Arc<dyn ComponentRegistry>,
    pub(crate) factory: Arc<FactoryContext>,
    pub(crate) lifecycle: Arc<dyn LifecycleManager>,
    pub(crate) activators: Arc<dyn ActivatorSource>,
    pub(crate) pipeline: Arc<ProcessingPipeline>,
    pub(crate) options: RuntimeOptions,
    pub(crate) singletons: DashMap<ComponentKey, Instance>,
}

/// 应用上下文
///
/// 克隆共享同一底层状态
#[derive(Clone)]
pub struct ApplicationContext {
    inner: Arc<ContextInner>,
}

impl ApplicationContext {
    pub(crate) fn new(inner: ContextInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// 运行时配置
    pub fn options(&self) -> &RuntimeOptions {
        &self.inner.options
    }

    /// 处理管线
    pub fn pipeline(&self) -> &ProcessingPipeline {
        &self.inner.pipeline
    }

    fn enter(&self, key: &ComponentKey) -> DependencyResult<()> {
        RESOLUTION_CHAIN.with(|chain| {
            let mut chain = chain.borrow_mut();
            if chain.contains(key) {
                let rendered = chain
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(DependencyError::CircularDependency {
                    dependency_chain: format!("{} -> {}", rendered, key),
                });
            }
            if chain.len() >= self.inner.options.max_resolution_depth {
                return Err(DependencyError::MaxDepthExceeded {
                    key: key.to_string(),
                    max_depth: self.inner.options.max_resolution_depth,
                });
            }
            chain.push(key.clone());
            Ok(())
        })
    }

    fn exit(&self) {
        RESOLUTION_CHAIN.with(|chain| {
            chain.borrow_mut().pop();
        });
    }

    /// 按描述符实例化具体类型，构造参数按类型递归解析
    fn instantiate(&self, target: &TypeInfo) -> DependencyResult<Instance> {
        let descriptor = self.inner.introspector.describe(target).ok_or_else(|| {
            DependencyError::ComponentNotRegistered {
                type_name: target.name.clone(),
            }
        })?;
        let constructor = descriptor
            .bound_constructors()
            .into_iter()
            .min_by_key(|constructor| constructor.parameter_types.len())
            .ok_or_else(|| DependencyError::ComponentCreationFailed {
                type_name: target.name.clone(),
                message: "没有绑定构造函数".to_string(),
            })?;

        let mut args = Vec::with_capacity(constructor.parameter_types.len());
        for parameter in &constructor.parameter_types {
            args.push(self.resolve(&ComponentKey::of(parameter.clone()))?);
        }
        constructor
            .invoke(&args)
            .map_err(|e| DependencyError::ComponentCreationFailed {
                type_name: target.name.clone(),
                message: e.to_string(),
            })
    }

    fn resolve_guarded(&self, key: &ComponentKey) -> DependencyResult<Instance> {
        if let Some(cached) = self.inner.singletons.get(key) {
            return Ok(cached.clone());
        }

        let container = self.inner.registry.container(&key.type_info);

        // 先从绑定层次取原料实例
        let mut instance: Option<Instance> = None;
        for provider in self.inner.hierarchy.providers(key) {
            match provider.as_ref() {
                BindingProvider::Instance(existing) => {
                    instance = Some(existing.clone());
                }
                BindingProvider::Supplier(context) => {
                    instance = Some(context.get(self)?);
                }
                BindingProvider::ConstructorBound { target } => {
                    instance = Some(self.instantiate(target)?);
                }
            }
            if instance.is_some() {
                break;
            }
        }

        // 没有提供者时按自身描述符实例化
        if instance.is_none() {
            let has_constructor = self
                .inner
                .introspector
                .describe(&key.type_info)
                .is_some_and(|descriptor| !descriptor.bound_constructors().is_empty());
            if has_constructor {
                instance = Some(self.instantiate(&key.type_info)?);
            }
        }

        // 注册表认识的组件走处理管线; 抽象组件的实例可能由管线中的代理产生
        let instance = match &container {
            Some(_) => self
                .inner
                .pipeline
                .process_instance(self, key, instance)
                .map_err(|e| DependencyError::ProcessingFailed {
                    type_name: key.type_info.name.clone(),
                    source: Box::new(e),
                })?,
            None => instance.ok_or_else(|| DependencyError::ComponentNotRegistered {
                type_name: key.to_string(),
            })?,
        };

        if container.is_some() {
            self.populate(&key.type_info, &instance)?;
            self.enable(&key.type_info, &instance)?;
        }

        if container.as_ref().is_some_and(|c| c.singleton()) {
            debug!("缓存单例组件: {}", key);
            self.inner.singletons.insert(key.clone(), instance.clone());
        }
        Ok(instance)
    }
}

/// 代理实例回退到原始实例，供字段注入与启用钩子使用
fn concrete_target(instance: &Instance) -> Instance {
    if let Some(proxy) = instance.downcast_ref::<ProxyInstance>() {
        if let Some(original) = proxy.original() {
            return original.clone();
        }
    }
    instance.clone()
}

impl ProcessingContext for ApplicationContext {
    fn introspector(&self) -> Arc<dyn TypeIntrospector> {
        self.inner.introspector.clone()
    }

    fn hierarchy(&self) -> Arc<dyn BindingHierarchy> {
        self.inner.hierarchy.clone()
    }

    fn registry(&self) -> Arc<dyn ComponentRegistry> {
        self.inner.registry.clone()
    }

    fn factory_context(&self) -> Arc<FactoryContext> {
        self.inner.factory.clone()
    }

    fn lifecycle(&self) -> Arc<dyn LifecycleManager> {
        self.inner.lifecycle.clone()
    }

    fn has_activator(&self, key: &ActivatorKey) -> bool {
        self.inner.activators.has_activator(key)
    }

    fn resolve(&self, key: &ComponentKey) -> DependencyResult<Instance> {
        self.enter(key)?;
        let result = self.resolve_guarded(key);
        self.exit();
        result
    }

    fn populate(&self, type_info: &TypeInfo, instance: &Instance) -> DependencyResult<()> {
        let Some(descriptor) = self.inner.introspector.describe(type_info) else {
            return Ok(());
        };
        let target = concrete_target(instance);

        for field in &descriptor.fields {
            let Some(marker) = field.markers.get(markers::INJECT) else {
                continue;
            };
            let Some(setter) = field.setter.clone() else {
                debug!(
                    "注入字段没有写入器, 跳过: {}::{}",
                    type_info.name, field.name
                );
                continue;
            };

            let mut field_key = ComponentKey::of(field.field_type.clone());
            if let Some(name) = marker.text_attribute(component_common::attributes::NAME) {
                field_key = field_key.named(name);
            }

            let value = self.resolve(&field_key)?;
            setter(&target, value).map_err(|e| DependencyError::ComponentCreationFailed {
                type_name: type_info.name.clone(),
                message: format!("字段注入失败: {}, 原因: {}", field.name, e),
            })?;
            debug!("注入字段: {}::{}", type_info.name, field.name);
        }
        Ok(())
    }

    fn enable(&self, type_info: &TypeInfo, instance: &Instance) -> DependencyResult<()> {
        let Some(descriptor) = self.inner.introspector.describe(type_info) else {
            return Ok(());
        };
        let target = concrete_target(instance);

        for method in &descriptor.methods {
            if !method.markers.contains(markers::ON_ENABLE) {
                continue;
            }
            let Some(invoker) = method.invoker.as_ref() else {
                continue;
            };
            invoker(Some(&target), &[]).map_err(|e| {
                DependencyError::ComponentCreationFailed {
                    type_name: type_info.name.clone(),
                    message: format!("启用钩子失败: {}, 原因: {}", method.name, e),
                }
            })?;
            debug!("执行启用钩子: {}", method.qualified_name());
        }
        Ok(())
    }

    fn handle(&self) -> Arc<dyn ProcessingContext> {
        Arc::new(self.clone())
    }
}

impl std::fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("singletons", &self.inner.singletons.len())
            .field("options", &self.inner.options)
            .finish()
    }
}
