//! 生命周期观察者注册处理器
//!
//! 由启动期激活器门控：组件类型是生命周期观察者变体时，立即解析组件
//! 实例并注册到环境的生命周期管理器，供之后的启动/关闭通知使用。
//! 每个匹配组件执行一次，去重只依赖注册表本身。

use component_common::{
    activators, ActivatorKey, ComponentContainer, ObservesLifecycle, ProcessingError,
    ProcessingResult, TypeInfo,
};
use processing_abstractions::{
    ComponentPreProcessor, ComponentProcessor, ProcessingContext, ProcessingOrder,
};
use tracing::info;

/// 生命周期观察者预处理器
#[derive(Debug, Default)]
pub struct LifecycleObserverPreProcessor;

impl LifecycleObserverPreProcessor {
    /// 创建新的生命周期观察者预处理器
    pub fn new() -> Self {
        Self
    }
}

impl ComponentProcessor for LifecycleObserverPreProcessor {
    fn name(&self) -> &str {
        "LifecycleObserverPreProcessor"
    }

    fn activator(&self) -> ActivatorKey {
        ActivatorKey::from(activators::BOOTSTRAP)
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::Late
    }
}

impl ComponentPreProcessor for LifecycleObserverPreProcessor {
    fn preconditions(&self, ctx: &dyn ProcessingContext, container: &ComponentContainer) -> bool {
        ctx.introspector()
            .is_subtype_of(container.type_info(), &TypeInfo::of::<ObservesLifecycle>())
    }

    fn process(
        &self,
        ctx: &dyn ProcessingContext,
        container: &ComponentContainer,
    ) -> ProcessingResult<()> {
        let key = container.key();
        let instance = ctx.resolve(&key).map_err(ProcessingError::from)?;
        ctx.lifecycle().register_observer(&key, instance);
        info!("注册生命周期观察者: {}", key);
        Ok(())
    }
}
