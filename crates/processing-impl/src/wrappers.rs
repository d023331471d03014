//! 方法调用日志包装处理器
//!
//! 阶段二内置处理器：对带调用日志标记的方法，在共享代理句柄上追加
//! Before/After/Throwing 三个观察回调。只有本过程已经产生代理的组件
//! 才会被修饰。

use component_common::{activators, markers, ActivatorKey, ProcessingResult};
use component_proxy::WrapperPhase;
use processing_abstractions::{
    ComponentProcessor, ModifierPostProcessor, ProcessingContext, ProcessingOrder, ProcessingPass,
};
use std::sync::Arc;
use tracing::{debug, error};

/// 方法调用日志包装处理器
#[derive(Debug, Default)]
pub struct TracingWrapperPostProcessor;

impl TracingWrapperPostProcessor {
    /// 创建新的方法调用日志包装处理器
    pub fn new() -> Self {
        Self
    }
}

impl ComponentProcessor for TracingWrapperPostProcessor {
    fn name(&self) -> &str {
        "TracingWrapperPostProcessor"
    }

    fn activator(&self) -> ActivatorKey {
        ActivatorKey::from(activators::PROXIES)
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::Normal
    }
}

impl ModifierPostProcessor for TracingWrapperPostProcessor {
    fn preconditions(&self, ctx: &dyn ProcessingContext, pass: &ProcessingPass) -> bool {
        pass.existing_handler().is_some()
            && ctx
                .introspector()
                .describe(pass.container().type_info())
                .is_some_and(|descriptor| {
                    descriptor
                        .methods
                        .iter()
                        .any(|method| method.markers.contains(markers::TRACED))
                })
    }

    fn process(&self, ctx: &dyn ProcessingContext, pass: &ProcessingPass) -> ProcessingResult<()> {
        let Some(handler) = pass.existing_handler() else {
            return Ok(());
        };
        let Some(descriptor) = ctx.introspector().describe(pass.container().type_info()) else {
            return Ok(());
        };

        for method in &descriptor.methods {
            if !method.markers.contains(markers::TRACED) {
                continue;
            }

            let entered = method.qualified_name();
            handler.wrapper(WrapperPhase::Before, method, Arc::new(move |cx| {
                debug!("方法调用开始: {}, 参数数: {}", entered, cx.args.len());
            }));
            let returned = method.qualified_name();
            handler.wrapper(WrapperPhase::After, method, Arc::new(move |_cx| {
                debug!("方法调用完成: {}", returned);
            }));
            let failed = method.qualified_name();
            handler.wrapper(WrapperPhase::Throwing, method, Arc::new(move |cx| {
                if let Some(err) = cx.error {
                    error!("方法调用失败: {}, 原因: {}", failed, err);
                }
            }));
            debug!("追加方法调用日志包装: {}", method.qualified_name());
        }
        Ok(())
    }
}
