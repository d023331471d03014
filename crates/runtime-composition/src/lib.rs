//! # 运行时组合层
//!
//! 这个 crate 是 Lorn Components 的组合层，负责把内省服务、绑定层次、
//! 组件注册表与处理管线组装成一个完整的、可运行的组件运行时。
//!
//! ## 主要功能
//!
//! - **运行时构建器**: 使用构建者模式组装应用上下文与处理管线
//! - **应用上下文**: 显式持有全部注册表状态，支持同进程多上下文
//! - **启动顺序**: 注册扫描根 -> 预处理 -> 立即实例化单例 -> 启动通知
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use component_common::InMemoryTypeIntrospector;
//! use runtime_composition::RuntimeBuilder;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let introspector = Arc::new(InMemoryTypeIntrospector::new());
//!     // ... 注册类型描述符 ...
//!
//!     let runtime = RuntimeBuilder::new()
//!         .with_introspector(introspector)
//!         .with_standard_processors()
//!         .add_scan_root("my_app")
//!         .build()?;
//!
//!     runtime.start().await?;
//!     // ... 通过 runtime.context() 解析组件 ...
//!     runtime.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod context;
pub mod options;

pub use builder::{init_tracing, ComponentRuntime, RuntimeBuilder};
pub use context::ApplicationContext;
pub use options::RuntimeOptions;

// 重新导出错误类型
pub use component_common::RuntimeError;
