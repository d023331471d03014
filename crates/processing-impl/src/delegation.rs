//! 父接口委托处理器
//!
//! 阶段一：对组件的每个带委托标记的父接口，把基础类型上没有覆盖的
//! 父方法委托给上下文解析出的父类型实例。缺失委托目标按处理器的失败
//! 策略处理：默认快速失败，宽松模式由执行器记录日志后跳过。

use component_common::{
    activators, markers, ActivatorKey, BindingError, ComponentKey, Instance, ProcessingError,
    ProcessingResult,
};
use component_proxy::delegate_to_parent;
use processing_abstractions::{
    ComponentProcessor, InstancePostProcessor, ProcessingContext, ProcessingOrder, ProcessingPass,
};
use tracing::{debug, error};

/// 父接口委托后处理器
#[derive(Debug)]
pub struct ParentDelegationPostProcessor {
    fail_on_precondition: bool,
}

impl ParentDelegationPostProcessor {
    /// 创建快速失败的父接口委托处理器
    pub fn new() -> Self {
        Self {
            fail_on_precondition: true,
        }
    }

    /// 创建宽松模式的父接口委托处理器：缺失目标记录日志后跳过
    pub fn lenient() -> Self {
        Self {
            fail_on_precondition: false,
        }
    }
}

impl Default for ParentDelegationPostProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentProcessor for ParentDelegationPostProcessor {
    fn name(&self) -> &str {
        "ParentDelegationPostProcessor"
    }

    fn activator(&self) -> ActivatorKey {
        ActivatorKey::from(activators::PROXIES)
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::Early
    }

    fn fail_on_precondition(&self) -> bool {
        self.fail_on_precondition
    }
}

impl InstancePostProcessor for ParentDelegationPostProcessor {
    fn preconditions(&self, ctx: &dyn ProcessingContext, pass: &ProcessingPass) -> bool {
        let introspector = ctx.introspector();
        introspector
            .describe(pass.container().type_info())
            .is_some_and(|descriptor| {
                descriptor.supertypes.iter().any(|parent| {
                    introspector
                        .describe(parent)
                        .is_some_and(|parent_descriptor| {
                            parent_descriptor.markers.contains(markers::DELEGATE)
                        })
                })
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

        let mut first_missing: Option<BindingError> = None;
        for parent_info in descriptor.supertypes.clone() {
            let Some(parent_descriptor) = introspector.describe(&parent_info) else {
                continue;
            };
            if !parent_descriptor.markers.contains(markers::DELEGATE) {
                continue;
            }

            let parent_instance = ctx
                .resolve(&ComponentKey::of(parent_info.clone()))
                .map_err(ProcessingError::from)?;
            let parent_instance = crate::providers::concrete_target(&parent_instance);

            let handler = pass.handler(ctx.introspector())?;
            let outcome = delegate_to_parent(&handler, &parent_descriptor, parent_instance);
            debug!(
                "父接口委托完成: {} -> {}, 安装 {} 个拦截器",
                parent_info.name,
                descriptor.type_info.name,
                outcome.installed
            );

            for signature in &outcome.missing {
                error!(
                    "委托目标方法不存在: {}::{}",
                    parent_info.name, signature
                );
                if first_missing.is_none() {
                    first_missing = Some(BindingError::DelegationTargetMissing {
                        parent: parent_info.name.clone(),
                        method: signature.to_string(),
                    });
                }
            }
        }

        match first_missing {
            Some(source) => Err(source.into()),
            None => Ok(None),
        }
    }
}
