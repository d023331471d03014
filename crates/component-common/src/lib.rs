//! # Component Common
//!
//! 这个 crate 提供了 Lorn Components 运行时的公共组件模型和工具。
//!
//! ## 核心组件
//!
//! - [`TypeIntrospector`] - 类型内省服务（预注册描述符表）
//! - [`ComponentContainer`] - 组件容器元数据
//! - [`ActivatorSource`] - 激活器来源
//! - [`LifecycleManager`] - 生命周期管理协作者
//!
//! ## 设计原则
//!
//! - 基于显式类型描述符的内省，不依赖运行时反射
//! - 显式 `Result` 错误传播，绑定失败不使用异常式控制流
//! - 约定优于配置

pub mod activation;
pub mod component;
pub mod errors;
pub mod introspection;
pub mod lifecycle;
pub mod metadata;
pub mod naming;

pub use activation::*;
pub use component::*;
pub use errors::*;
pub use introspection::*;
pub use lifecycle::*;
pub use metadata::*;
pub use naming::*;
