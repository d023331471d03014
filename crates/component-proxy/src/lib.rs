//! # Component Proxy
//!
//! 组件代理子系统：为给定的基础类型和（可能不存在的）具体实例构建一个
//! 委托替身。未被修改的方法转发给原始实例（或在无实例时回退到返回类型
//! 的零值），被修改的方法经过已安装的拦截器与包装器链。
//!
//! 运行时不做字节码生成：代理是一个持有"方法签名 -> 拦截器/包装器表"的
//! 装饰器对象，所有调用经由单一的 `invoke(签名, 参数)` 入口分发。
//!
//! ## 核心类型
//!
//! - [`ProxyHandler`] - 同一实例化过程中所有处理器复用的代理句柄
//! - [`ProxyInstance`] - 完成构建后的代理实例
//! - [`delegate_to_parent`] - 父接口委托合成

pub mod delegation;
pub mod handler;
pub mod instance;

pub use delegation::*;
pub use handler::*;
pub use instance::*;
