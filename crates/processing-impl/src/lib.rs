//! # Processing Impl
//!
//! 组件处理管线的具体实现：组件注册表、内存绑定层次、两阶段管线
//! 执行器与内置处理器（工厂绑定/工厂方法、提供者方法/提供者字段、
//! 父接口委托、生命周期观察者、方法调用日志包装）。

pub mod delegation;
pub mod factories;
pub mod hierarchy;
pub mod observers;
pub mod pipeline;
pub mod providers;
pub mod registry;
#[cfg(test)]
pub(crate) mod testing;
pub mod wrappers;

pub use delegation::*;
pub use factories::*;
pub use hierarchy::*;
pub use observers::*;
pub use pipeline::*;
pub use providers::*;
pub use registry::*;
pub use wrappers::*;
