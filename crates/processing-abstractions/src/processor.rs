//! 处理器契约与实例化过程状态
//!
//! 处理器分三类：预处理器（组件实例存在之前，仅面向类型元数据）、
//! 阶段一后处理器（可丢弃并替换实例）、阶段二后处理器（只能原地修饰，
//! 契约上没有能够替换实例的返回值）。

use crate::context::ProcessingContext;
use crate::order::ProcessingOrder;
use component_common::{
    ActivatorKey, ComponentContainer, ComponentKey, Instance, ProcessingError, ProcessingResult,
    ProxyError, TypeIntrospector,
};
use component_proxy::ProxyHandler;
use std::sync::Arc;
use uuid::Uuid;

/// 处理器公共契约
pub trait ComponentProcessor: Send + Sync {
    /// 处理器名称，用于日志与错误信息
    fn name(&self) -> &str;

    /// 处理器参与处理所必需的激活器
    fn activator(&self) -> ActivatorKey;

    /// 声明的处理顺序级别
    fn order(&self) -> ProcessingOrder;

    /// 绑定步骤无法完成时是否快速失败；`false` 表示记录日志后跳过
    fn fail_on_precondition(&self) -> bool {
        true
    }
}

/// 预处理器 trait
///
/// 在组件实例化之前运行，只面向类型元数据
pub trait ComponentPreProcessor: ComponentProcessor {
    /// 按组件评估的前置条件
    fn preconditions(&self, _ctx: &dyn ProcessingContext, _container: &ComponentContainer) -> bool {
        true
    }

    /// 处理组件类型
    fn process(
        &self,
        ctx: &dyn ProcessingContext,
        container: &ComponentContainer,
    ) -> ProcessingResult<()>;
}

/// 阶段一后处理器 trait
///
/// 声明顺序必须位于阶段一；返回 `Some` 表示替换组件实例
pub trait InstancePostProcessor: ComponentProcessor {
    /// 按组件评估的前置条件
    fn preconditions(&self, _ctx: &dyn ProcessingContext, _pass: &ProcessingPass) -> bool {
        true
    }

    /// 处理组件实例化过程
    fn process(
        &self,
        ctx: &dyn ProcessingContext,
        pass: &mut ProcessingPass,
    ) -> ProcessingResult<Option<Instance>>;
}

/// 阶段二后处理器 trait
///
/// 声明顺序必须位于阶段二；只能通过共享代理句柄的内部可变表修饰实例
pub trait ModifierPostProcessor: ComponentProcessor {
    /// 按组件评估的前置条件
    fn preconditions(&self, _ctx: &dyn ProcessingContext, _pass: &ProcessingPass) -> bool {
        true
    }

    /// 修饰组件实例
    fn process(&self, ctx: &dyn ProcessingContext, pass: &ProcessingPass) -> ProcessingResult<()>;
}

/// 一次组件实例化过程的状态
///
/// 代理句柄在此保存并被同一过程中的所有处理器复用；处理器不得为同一
/// 过程构建第二个独立代理
pub struct ProcessingPass {
    id: Uuid,
    key: ComponentKey,
    container: Arc<ComponentContainer>,
    instance: Option<Instance>,
    handler: Option<ProxyHandler>,
}

impl ProcessingPass {
    /// 开始一次实例化过程
    pub fn new(key: ComponentKey, container: Arc<ComponentContainer>, instance: Option<Instance>) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            container,
            instance,
            handler: None,
        }
    }

    /// 过程标识
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 组件查找键
    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    /// 组件容器
    pub fn container(&self) -> &ComponentContainer {
        &self.container
    }

    /// 当前实例
    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    /// 替换当前实例（仅限阶段一与代理完成时）
    pub fn replace_instance(&mut self, instance: Instance) {
        self.instance = Some(instance);
    }

    /// 获取本过程共享的代理句柄，首次调用时创建
    pub fn handler(
        &mut self,
        introspector: Arc<dyn TypeIntrospector>,
    ) -> ProcessingResult<ProxyHandler> {
        if let Some(handler) = &self.handler {
            return Ok(handler.clone());
        }

        if !self.container.permits_proxying() {
            return Err(ProcessingError::Proxy {
                source: ProxyError::ProxyingNotPermitted {
                    type_name: self.container.type_info().name.clone(),
                },
            });
        }

        let handler = ProxyHandler::new(
            introspector,
            self.container.type_info(),
            self.instance.clone(),
        )
        .map_err(ProcessingError::from)?;
        self.handler = Some(handler.clone());
        Ok(handler)
    }

    /// 已创建的代理句柄
    pub fn existing_handler(&self) -> Option<&ProxyHandler> {
        self.handler.as_ref()
    }
}

impl std::fmt::Debug for ProcessingPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingPass")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("has_instance", &self.instance.is_some())
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}
