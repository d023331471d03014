//! 处理上下文抽象接口
//!
//! 处理器通过上下文访问宿主应用的协作者：内省服务、绑定层次、
//! 注册表、工厂绑定上下文与生命周期管理器。

use crate::binding::BindingHierarchy;
use crate::factory::FactoryContext;
use crate::registry::ComponentRegistry;
use component_common::{
    ActivatorKey, ComponentKey, DependencyResult, Instance, LifecycleManager, TypeInfo,
    TypeIntrospector,
};
use std::sync::Arc;

/// 处理上下文 trait
///
/// 访问器返回 `Arc` 句柄，便于处理器在安装拦截器时捕获到调用期闭包中
pub trait ProcessingContext: Send + Sync {
    /// 类型内省服务
    fn introspector(&self) -> Arc<dyn TypeIntrospector>;

    /// 绑定层次
    fn hierarchy(&self) -> Arc<dyn BindingHierarchy>;

    /// 组件注册表
    fn registry(&self) -> Arc<dyn ComponentRegistry>;

    /// 工厂绑定上下文
    fn factory_context(&self) -> Arc<FactoryContext>;

    /// 生命周期管理器
    fn lifecycle(&self) -> Arc<dyn LifecycleManager>;

    /// 检查激活器是否处于激活状态
    fn has_activator(&self, key: &ActivatorKey) -> bool;

    /// 解析查找键对应的组件实例
    fn resolve(&self, key: &ComponentKey) -> DependencyResult<Instance>;

    /// 递归注入实例的字段依赖
    fn populate(&self, type_info: &TypeInfo, instance: &Instance) -> DependencyResult<()>;

    /// 调用实例的构造后启用钩子
    fn enable(&self, type_info: &TypeInfo, instance: &Instance) -> DependencyResult<()>;

    /// 获取可被闭包持有的上下文句柄
    fn handle(&self) -> Arc<dyn ProcessingContext>;
}
