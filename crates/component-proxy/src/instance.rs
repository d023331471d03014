//! 完成构建后的代理实例
//!
//! 所有调用经由单一的 `invoke` 入口分发：先执行 `Before` 回调，再按
//! "拦截器 > 原始方法体 > 返回类型零值" 的次序求值，最后按结果执行
//! `After` 或 `Throwing` 回调。

use crate::handler::{zero_value, ProxyInvocation, ProxyTables, WrapperContext, WrapperPhase};
use component_common::{
    Instance, MethodDescriptor, MethodSignature, ProxyError, ProxyResult, TypeInfo,
    TypeIntrospector,
};
use std::collections::HashMap;
use std::sync::Arc;

/// 代理实例
///
/// 实现基础类型契约的委托替身；表与创建它的句柄共享，阶段二的处理器
/// 仍可通过句柄追加包装器
pub struct ProxyInstance {
    base: TypeInfo,
    original: Option<Instance>,
    methods: HashMap<MethodSignature, Arc<MethodDescriptor>>,
    tables: Arc<ProxyTables>,
    introspector: Arc<dyn TypeIntrospector>,
}

impl ProxyInstance {
    pub(crate) fn new(
        base: TypeInfo,
        original: Option<Instance>,
        methods: HashMap<MethodSignature, Arc<MethodDescriptor>>,
        tables: Arc<ProxyTables>,
        introspector: Arc<dyn TypeIntrospector>,
    ) -> Self {
        Self {
            base,
            original,
            methods,
            tables,
            introspector,
        }
    }

    /// 基础类型信息
    pub fn base(&self) -> &TypeInfo {
        &self.base
    }

    /// 原始实例
    pub fn original(&self) -> Option<&Instance> {
        self.original.as_ref()
    }

    /// 调用指定签名的方法
    pub fn invoke(
        &self,
        signature: &MethodSignature,
        args: &[Instance],
    ) -> ProxyResult<Option<Instance>> {
        let method = self
            .methods
            .get(signature)
            .ok_or_else(|| ProxyError::UnknownMethod {
                base: self.base.name.clone(),
                method: signature.to_string(),
            })?
            .clone();

        self.run_callbacks(signature, WrapperPhase::Before, &method, args, None);

        match self.dispatch(&method, signature, args) {
            Ok(value) => {
                self.run_callbacks(signature, WrapperPhase::After, &method, args, None);
                Ok(value)
            }
            Err(error) => {
                self.run_callbacks(signature, WrapperPhase::Throwing, &method, args, Some(&error));
                Err(error)
            }
        }
    }

    /// 按方法名调用，方法名必须在基础类型上唯一
    pub fn invoke_named(&self, name: &str, args: &[Instance]) -> ProxyResult<Option<Instance>> {
        let mut candidates = self
            .methods
            .keys()
            .filter(|signature| signature.name == name);

        let signature = candidates
            .next()
            .ok_or_else(|| ProxyError::UnknownMethod {
                base: self.base.name.clone(),
                method: name.to_string(),
            })?
            .clone();
        if candidates.next().is_some() {
            return Err(ProxyError::UnknownMethod {
                base: self.base.name.clone(),
                method: format!("{} (重载方法需要完整签名)", name),
            });
        }

        self.invoke(&signature, args)
    }

    fn dispatch(
        &self,
        method: &Arc<MethodDescriptor>,
        signature: &MethodSignature,
        args: &[Instance],
    ) -> ProxyResult<Option<Instance>> {
        let interceptor = self.tables.interceptors.read().get(signature).cloned();
        if let Some(interceptor) = interceptor {
            let invocation = ProxyInvocation {
                method: method.as_ref(),
                target: self.original.as_ref(),
                args,
            };
            return interceptor(&invocation);
        }

        if let Some(original) = self.original.as_ref() {
            if let Some(invoker) = method.invoker.as_ref() {
                return invoker(Some(original), args).map_err(ProxyError::from);
            }
        }

        // 无原始实例或无方法体: 回退到返回类型的零值
        Ok(zero_value(
            self.introspector.as_ref(),
            method.return_type.as_ref(),
        ))
    }

    fn run_callbacks(
        &self,
        signature: &MethodSignature,
        phase: WrapperPhase,
        method: &Arc<MethodDescriptor>,
        args: &[Instance],
        error: Option<&ProxyError>,
    ) {
        let callbacks = self
            .tables
            .callbacks
            .read()
            .get(&(signature.clone(), phase))
            .cloned()
            .unwrap_or_default();

        let cx = WrapperContext {
            method: method.as_ref(),
            target: self.original.as_ref(),
            args,
            error,
        };
        for callback in callbacks {
            callback(&cx);
        }
    }
}

impl std::fmt::Debug for ProxyInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyInstance")
            .field("base", &self.base)
            .field("methods", &self.methods.len())
            .field("has_original", &self.original.is_some())
            .finish()
    }
}
