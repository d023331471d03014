//! 父接口委托合成
//!
//! 对标记为委托的父接口：基础类型上没有覆盖的父方法会得到一个合成的
//! 拦截器，调用落在已解析的父类型实例的同名同参方法上；父调用没有
//! 产出时回退到返回类型的零值。

use crate::handler::{zero_value, MethodInterceptor, ProxyHandler};
use component_common::{Instance, MethodSignature, TypeDescriptor};
use std::sync::Arc;
use tracing::debug;

/// 一次父接口委托的结果
#[derive(Debug, Default)]
pub struct DelegationOutcome {
    /// 成功合成的拦截器数量
    pub installed: usize,
    /// 缺少可调用目标的方法签名
    pub missing: Vec<MethodSignature>,
}

impl DelegationOutcome {
    /// 是否所有父方法都已委托
    pub fn complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// 将父接口上未被覆盖的方法委托给已解析的父类型实例
///
/// 缺少方法体的目标记入 [`DelegationOutcome::missing`]，由调用方按
/// 失败策略决定报错或跳过
pub fn delegate_to_parent(
    handler: &ProxyHandler,
    parent: &TypeDescriptor,
    parent_instance: Instance,
) -> DelegationOutcome {
    let mut outcome = DelegationOutcome::default();

    for method in &parent.methods {
        let signature = method.signature();
        if handler.declares_own(&signature) {
            // 基础类型已有覆盖
            continue;
        }

        let Some(invoker) = method.invoker.clone() else {
            outcome.missing.push(signature);
            continue;
        };

        let parent_instance = parent_instance.clone();
        let introspector = handler.introspector().clone();
        let return_type = method.return_type.clone();
        let interceptor: MethodInterceptor = Arc::new(move |invocation| {
            let result = invoker(Some(&parent_instance), invocation.args)?;
            Ok(result.or_else(|| zero_value(introspector.as_ref(), return_type.as_ref())))
        });

        debug!(
            "委托父接口方法: {} -> {}",
            method.qualified_name(),
            handler.base().name
        );
        handler.delegate(method, interceptor);
        outcome.installed += 1;
    }

    outcome
}
