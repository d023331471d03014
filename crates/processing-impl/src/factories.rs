//! 工厂解析处理器
//!
//! 预处理器在启动期把抽象工厂方法绑定到具体的绑定构造函数；阶段一的
//! 后处理器为抽象工厂方法安装代理拦截器，调用期查找绑定并以调用参数
//! 执行构造函数，随后对产物做递归注入与可选启用。

use component_common::{
    activators, attributes, markers, ActivatorKey, BindingError, ComponentContainer, ComponentKey,
    Instance, InvocationError, MethodDescriptor, ProcessingResult, ProxyError, TypeDescriptor,
};
use processing_abstractions::{
    ComponentPreProcessor, ComponentProcessor, InstancePostProcessor, ProcessingContext,
    ProcessingOrder, ProcessingPass,
};
use std::sync::Arc;
use tracing::debug;

fn factory_methods(descriptor: &TypeDescriptor) -> Vec<Arc<MethodDescriptor>> {
    descriptor
        .methods
        .iter()
        .filter(|method| method.markers.contains(markers::FACTORY) && method.return_type.is_some())
        .cloned()
        .collect()
}

fn factory_key(method: &MethodDescriptor) -> Option<ComponentKey> {
    let mut key = ComponentKey::of(method.return_type.clone()?);
    if let Some(name) = method
        .markers
        .get(markers::FACTORY)
        .and_then(|marker| marker.text_attribute(attributes::NAME))
    {
        key = key.named(name);
    }
    Some(key)
}

/// 工厂绑定预处理器
///
/// 顺序 `First`：为每个带返回类型的工厂方法确定绑定构造函数。
/// 查找键没有构造函数绑定的提供者、或没有参数序列完全相等的绑定
/// 构造函数时，以绑定错误终止启动。
#[derive(Debug, Default)]
pub struct FactoryBindingPreProcessor;

impl FactoryBindingPreProcessor {
    /// 创建新的工厂绑定预处理器
    pub fn new() -> Self {
        Self
    }
}

impl ComponentProcessor for FactoryBindingPreProcessor {
    fn name(&self) -> &str {
        "FactoryBindingPreProcessor"
    }

    fn activator(&self) -> ActivatorKey {
        ActivatorKey::from(activators::FACTORIES)
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::First
    }
}

impl ComponentPreProcessor for FactoryBindingPreProcessor {
    fn preconditions(&self, ctx: &dyn ProcessingContext, container: &ComponentContainer) -> bool {
        ctx.introspector()
            .describe(container.type_info())
            .is_some_and(|descriptor| !factory_methods(&descriptor).is_empty())
    }

    fn process(
        &self,
        ctx: &dyn ProcessingContext,
        container: &ComponentContainer,
    ) -> ProcessingResult<()> {
        let introspector = ctx.introspector();
        let Some(descriptor) = introspector.describe(container.type_info()) else {
            return Ok(());
        };

        for method in factory_methods(&descriptor) {
            let Some(key) = factory_key(&method) else {
                continue;
            };
            let candidates: Vec<_> = ctx
                .hierarchy()
                .providers(&key)
                .into_iter()
                .filter_map(|provider| provider.constructor_target().cloned())
                .collect();
            if candidates.is_empty() {
                return Err(BindingError::NoConstructorProvider {
                    key: key.to_string(),
                }
                .into());
            }

            let bound = candidates.iter().find_map(|target| {
                introspector.describe(target).and_then(|target_descriptor| {
                    target_descriptor
                        .bound_constructors()
                        .into_iter()
                        .find(|constructor| {
                            constructor.parameter_types == method.parameter_types
                        })
                })
            });

            match bound {
                Some(constructor) => {
                    debug!(
                        "工厂方法绑定到构造函数: {} -> {}({})",
                        method.qualified_name(),
                        constructor.declaring_type.name,
                        constructor.parameter_display()
                    );
                    ctx.factory_context().bind(&method, constructor);
                }
                None => {
                    let expected = method
                        .parameter_types
                        .iter()
                        .map(|p| p.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    return Err(BindingError::NoMatchingConstructor {
                        key: key.to_string(),
                        expected,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}

/// 工厂方法后处理器
///
/// 阶段一顺序 `First`：为抽象工厂方法安装代理拦截器。有方法体的工厂
/// 方法不安装拦截器，代理的默认委托路径会直接执行方法体。
#[derive(Debug, Default)]
pub struct FactoryMethodPostProcessor;

impl FactoryMethodPostProcessor {
    /// 创建新的工厂方法后处理器
    pub fn new() -> Self {
        Self
    }
}

impl ComponentProcessor for FactoryMethodPostProcessor {
    fn name(&self) -> &str {
        "FactoryMethodPostProcessor"
    }

    fn activator(&self) -> ActivatorKey {
        ActivatorKey::from(activators::FACTORIES)
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::First
    }
}

impl InstancePostProcessor for FactoryMethodPostProcessor {
    fn preconditions(&self, ctx: &dyn ProcessingContext, pass: &ProcessingPass) -> bool {
        ctx.introspector()
            .describe(pass.container().type_info())
            .is_some_and(|descriptor| {
                factory_methods(&descriptor)
                    .iter()
                    .any(|method| method.is_abstract())
            })
    }

    fn process(
        &self,
        ctx: &dyn ProcessingContext,
        pass: &mut ProcessingPass,
    ) -> ProcessingResult<Option<Instance>> {
        let introspector = ctx.introspector();
        let Some(descriptor) = introspector.describe(pass.container().type_info()) else {
            return Ok(None);
        };

        let handler = pass.handler(introspector)?;
        for method in factory_methods(&descriptor) {
            if !method.is_abstract() {
                continue;
            }

            let factory_context = ctx.factory_context();
            let context = ctx.handle();
            let enable = method
                .markers
                .get(markers::FACTORY)
                .map_or(true, |marker| marker.flag_attribute(attributes::ENABLE, true));
            let bound_method = method.clone();

            handler.delegate(&method, Arc::new(move |invocation| {
                let constructor = factory_context.get(&bound_method).ok_or_else(|| {
                    ProxyError::Binding {
                        source: BindingError::FactoryBindingMissing {
                            method: bound_method.qualified_name(),
                        },
                    }
                })?;

                let built = constructor.invoke(invocation.args).map_err(ProxyError::from)?;

                // 构造后: 递归注入字段依赖, 再按标记决定是否启用
                context
                    .populate(&constructor.declaring_type, &built)
                    .map_err(|e| lifecycle_failure(&bound_method, e))?;
                if enable {
                    context
                        .enable(&constructor.declaring_type, &built)
                        .map_err(|e| lifecycle_failure(&bound_method, e))?;
                }
                Ok(Some(built))
            }));
            debug!("安装工厂方法拦截器: {}", method.qualified_name());
        }
        Ok(None)
    }
}

fn lifecycle_failure(
    method: &MethodDescriptor,
    error: component_common::DependencyError,
) -> ProxyError {
    ProxyError::Invocation {
        source: InvocationError::InvocationFailed {
            method: method.qualified_name(),
            message: error.to_string(),
        },
    }
}
