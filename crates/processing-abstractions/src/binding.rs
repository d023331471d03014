//! 绑定层次抽象接口
//!
//! 绑定层次是外部协作者：把查找键映射到零个或多个按优先级有序的
//! 提供者。本 crate 只定义管线消费与登记绑定所需的契约。

use crate::context::ProcessingContext;
use component_common::{ComponentKey, DependencyError, DependencyResult, Instance, TypeInfo};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::debug;

/// 提供者供应闭包
///
/// 惰性求值，首次解析时才执行；执行错误原样上抛给请求解析的调用方
pub type ProviderSupplier =
    Arc<dyn Fn(&dyn ProcessingContext) -> DependencyResult<Instance> + Send + Sync>;

/// 提供者绑定条目
///
/// 由提供者处理器在扫描组件成员时创建，由绑定层次消费
pub struct ProviderContext {
    key: ComponentKey,
    singleton: bool,
    priority: i32,
    supplier: ProviderSupplier,
    cached: OnceCell<Instance>,
}

impl ProviderContext {
    /// 创建新的提供者绑定条目
    pub fn new(
        key: ComponentKey,
        singleton: bool,
        priority: i32,
        supplier: ProviderSupplier,
    ) -> Self {
        Self {
            key,
            singleton,
            priority,
            supplier,
            cached: OnceCell::new(),
        }
    }

    /// 查找键
    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    /// 是否为单例
    pub fn singleton(&self) -> bool {
        self.singleton
    }

    /// 绑定优先级
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// 解析提供的值
    ///
    /// 单例条目缓存首次结果（发布一次语义）；供应闭包的错误不吞不重试
    pub fn get(&self, ctx: &dyn ProcessingContext) -> DependencyResult<Instance> {
        if self.singleton {
            self.cached
                .get_or_try_init(|| {
                    debug!("首次解析单例提供者: {}", self.key);
                    (self.supplier)(ctx)
                })
                .cloned()
        } else {
            (self.supplier)(ctx)
        }
    }
}

impl std::fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderContext")
            .field("key", &self.key)
            .field("singleton", &self.singleton)
            .field("priority", &self.priority)
            .field("resolved", &self.cached.get().is_some())
            .finish()
    }
}

/// 绑定提供者
pub enum BindingProvider {
    /// 构造函数绑定到具体类型
    ConstructorBound {
        /// 目标具体类型
        target: TypeInfo,
    },
    /// 供应闭包绑定
    Supplier(Arc<ProviderContext>),
    /// 既有实例绑定
    Instance(Instance),
}

impl BindingProvider {
    /// 构造函数绑定的目标类型
    pub fn constructor_target(&self) -> Option<&TypeInfo> {
        match self {
            Self::ConstructorBound { target } => Some(target),
            _ => None,
        }
    }
}

impl std::fmt::Debug for BindingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConstructorBound { target } => f
                .debug_struct("ConstructorBound")
                .field("target", target)
                .finish(),
            Self::Supplier(context) => f.debug_tuple("Supplier").field(context).finish(),
            Self::Instance(_) => f.write_str("Instance(..)"),
        }
    }
}

/// 绑定层次 trait
pub trait BindingHierarchy: Send + Sync {
    /// 为查找键登记一个提供者
    fn bind(&self, key: ComponentKey, priority: i32, provider: BindingProvider);

    /// 查找键的全部提供者，按优先级降序
    fn providers(&self, key: &ComponentKey) -> Vec<Arc<BindingProvider>>;

    /// 枚举所有已登记的查找键
    fn keys(&self) -> Vec<ComponentKey>;

    /// 登记一个提供者绑定条目
    fn install(&self, context: ProviderContext) {
        let key = context.key().clone();
        let priority = context.priority();
        self.bind(key, priority, BindingProvider::Supplier(Arc::new(context)));
    }
}

/// 供应闭包错误的统一包装
pub fn supplier_error(key: &ComponentKey, message: impl Into<String>) -> DependencyError {
    DependencyError::SupplierFailed {
        key: key.to_string(),
        message: message.into(),
    }
}
