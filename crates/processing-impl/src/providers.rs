//! 提供者解析处理器
//!
//! 扫描组件上带提供者标记的方法与字段，为每个成员派生查找键并向绑定
//! 层次登记一个惰性供应条目。方法提供者在预处理期登记，供应时解析
//! 所属组件再调用方法；字段提供者需要已处理完的实例，因此在阶段二
//! 登记，供应时从该实例读取字段。

use component_common::{
    activators, attributes, markers, ActivatorKey, ComponentContainer, ComponentKey, Instance,
    Marker, ProcessingResult, TypeDescriptor,
};
use component_proxy::ProxyInstance;
use processing_abstractions::{
    supplier_error, ComponentPreProcessor, ComponentProcessor, ModifierPostProcessor,
    ProcessingContext, ProcessingOrder, ProcessingPass, ProviderContext,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// 代理实例回退到原始实例，供成员访问器使用
pub(crate) fn concrete_target(instance: &Instance) -> Instance {
    if let Some(proxy) = instance.downcast_ref::<ProxyInstance>() {
        if let Some(original) = proxy.original() {
            return original.clone();
        }
    }
    instance.clone()
}

fn provider_key(base: component_common::TypeInfo, marker: &Marker) -> ComponentKey {
    let mut key = ComponentKey::of(base);
    if let Some(name) = marker.text_attribute(attributes::NAME) {
        key = key.named(name);
    }
    key
}

/// 提供者方法预处理器
#[derive(Debug, Default)]
pub struct ProviderMethodPreProcessor;

impl ProviderMethodPreProcessor {
    /// 创建新的提供者方法预处理器
    pub fn new() -> Self {
        Self
    }
}

impl ComponentProcessor for ProviderMethodPreProcessor {
    fn name(&self) -> &str {
        "ProviderMethodPreProcessor"
    }

    fn activator(&self) -> ActivatorKey {
        ActivatorKey::from(activators::PROVIDERS)
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::Normal
    }
}

impl ComponentPreProcessor for ProviderMethodPreProcessor {
    fn preconditions(&self, ctx: &dyn ProcessingContext, container: &ComponentContainer) -> bool {
        ctx.introspector()
            .describe(container.type_info())
            .is_some_and(|descriptor: Arc<TypeDescriptor>| {
                descriptor
                    .methods
                    .iter()
                    .any(|method| method.markers.contains(markers::PROVIDER))
            })
    }

    fn process(
        &self,
        ctx: &dyn ProcessingContext,
        container: &ComponentContainer,
    ) -> ProcessingResult<()> {
        let Some(descriptor) = ctx.introspector().describe(container.type_info()) else {
            return Ok(());
        };

        for method in &descriptor.methods {
            let Some(marker) = method.markers.get(markers::PROVIDER) else {
                continue;
            };
            let Some(return_type) = method.return_type.clone() else {
                warn!("提供者方法没有返回类型, 跳过: {}", method.qualified_name());
                continue;
            };
            let Some(invoker) = method.invoker.clone() else {
                warn!("提供者方法没有方法体, 跳过: {}", method.qualified_name());
                continue;
            };

            let key = provider_key(return_type, marker);
            let singleton = marker.flag_attribute(attributes::SINGLETON, container.singleton());
            let priority = marker.int_attribute(attributes::PRIORITY, 0) as i32;

            let owner_key = container.key();
            let supplier_key = key.clone();
            let method_name = method.qualified_name();
            ctx.hierarchy().install(ProviderContext::new(
                key.clone(),
                singleton,
                priority,
                Arc::new(move |ctx| {
                    let owner = ctx.resolve(&owner_key)?;
                    let owner = concrete_target(&owner);
                    let value = invoker(Some(&owner), &[])
                        .map_err(|e| supplier_error(&supplier_key, e.to_string()))?;
                    value.ok_or_else(|| {
                        supplier_error(
                            &supplier_key,
                            format!("提供者方法没有产出值: {}", method_name),
                        )
                    })
                }),
            ));
            debug!(
                "登记提供者方法: {} -> {}, 单例: {}",
                method.qualified_name(),
                key,
                singleton
            );
        }
        Ok(())
    }
}

/// 提供者字段后处理器
///
/// 阶段二：供应闭包捕获处理完成的组件实例，首次解析时读取字段
#[derive(Debug, Default)]
pub struct ProviderFieldPostProcessor;

impl ProviderFieldPostProcessor {
    /// 创建新的提供者字段后处理器
    pub fn new() -> Self {
        Self
    }
}

impl ComponentProcessor for ProviderFieldPostProcessor {
    fn name(&self) -> &str {
        "ProviderFieldPostProcessor"
    }

    fn activator(&self) -> ActivatorKey {
        ActivatorKey::from(activators::PROVIDERS)
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::Normal
    }
}

impl ModifierPostProcessor for ProviderFieldPostProcessor {
    fn preconditions(&self, ctx: &dyn ProcessingContext, pass: &ProcessingPass) -> bool {
        pass.instance().is_some()
            && ctx
                .introspector()
                .describe(pass.container().type_info())
                .is_some_and(|descriptor| {
                    descriptor
                        .fields
                        .iter()
                        .any(|field| field.markers.contains(markers::PROVIDER))
                })
    }

    fn process(&self, ctx: &dyn ProcessingContext, pass: &ProcessingPass) -> ProcessingResult<()> {
        let Some(descriptor) = ctx.introspector().describe(pass.container().type_info()) else {
            return Ok(());
        };
        let Some(instance) = pass.instance() else {
            return Ok(());
        };
        let owner = concrete_target(instance);

        for field in &descriptor.fields {
            let Some(marker) = field.markers.get(markers::PROVIDER) else {
                continue;
            };
            let Some(getter) = field.getter.clone() else {
                warn!(
                    "提供者字段没有读取器, 跳过: {}::{}",
                    descriptor.type_info.name, field.name
                );
                continue;
            };

            let key = provider_key(field.field_type.clone(), marker);
            let singleton = marker.flag_attribute(attributes::SINGLETON, pass.container().singleton());
            let priority = marker.int_attribute(attributes::PRIORITY, 0) as i32;

            let owner = owner.clone();
            let supplier_key = key.clone();
            ctx.hierarchy().install(ProviderContext::new(
                key.clone(),
                singleton,
                priority,
                Arc::new(move |_ctx| {
                    getter(&owner).map_err(|e| supplier_error(&supplier_key, e.to_string()))
                }),
            ));
            debug!(
                "登记提供者字段: {}::{} -> {}",
                descriptor.type_info.name, field.name, key
            );
        }
        Ok(())
    }
}
