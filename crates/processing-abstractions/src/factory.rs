//! 工厂绑定上下文
//!
//! 应用上下文范围内的"抽象工厂方法 -> 具体绑定构造函数"映射。
//! 预处理期间写入一次（首写生效，条目永不移除），此后每次经代理调用
//! 工厂方法时读取。

use component_common::{ConstructorDescriptor, MethodDescriptor, MethodSignature, TypeInfo};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// 工厂方法标识
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FactoryKey {
    /// 声明工厂方法的组件类型
    pub declaring_type: TypeInfo,
    /// 工厂方法签名
    pub signature: MethodSignature,
}

impl FactoryKey {
    /// 从方法描述符创建工厂方法标识
    pub fn of(method: &MethodDescriptor) -> Self {
        Self {
            declaring_type: method.declaring_type.clone(),
            signature: method.signature(),
        }
    }
}

impl std::fmt::Display for FactoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.declaring_type.name, self.signature)
    }
}

/// 工厂绑定上下文
#[derive(Debug, Default)]
pub struct FactoryContext {
    bindings: DashMap<FactoryKey, Arc<ConstructorDescriptor>>,
}

impl FactoryContext {
    /// 创建新的工厂绑定上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 绑定工厂方法到构造函数
    ///
    /// 首写生效：同一方法的重复绑定保持原有条目，返回是否新建
    pub fn bind(&self, method: &MethodDescriptor, constructor: Arc<ConstructorDescriptor>) -> bool {
        let key = FactoryKey::of(method);
        let mut newly_bound = false;
        self.bindings.entry(key.clone()).or_insert_with(|| {
            newly_bound = true;
            constructor
        });
        if newly_bound {
            debug!("绑定工厂方法: {}", key);
        } else {
            debug!("工厂方法已有绑定, 保持原有条目: {}", key);
        }
        newly_bound
    }

    /// 查找工厂方法的绑定构造函数
    pub fn get(&self, method: &MethodDescriptor) -> Option<Arc<ConstructorDescriptor>> {
        self.bindings
            .get(&FactoryKey::of(method))
            .map(|entry| entry.clone())
    }

    /// 已绑定的工厂方法数量
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// 是否没有任何绑定
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use component_common::instance;

    struct Shop;
    #[derive(Debug)]
    struct Widget;
    #[derive(Debug)]
    struct Gadget;

    fn make_method() -> MethodDescriptor {
        MethodDescriptor::new(
            TypeInfo::of::<Shop>(),
            "make",
            vec![TypeInfo::of::<i32>()],
            Some(TypeInfo::of::<Widget>()),
        )
    }

    #[test]
    fn first_binding_wins() {
        let context = FactoryContext::new();
        let method = make_method();

        let widget_ctor = Arc::new(ConstructorDescriptor::bound(
            TypeInfo::of::<Widget>(),
            vec![TypeInfo::of::<i32>()],
            Arc::new(|_args| Ok(instance(Widget))),
        ));
        let gadget_ctor = Arc::new(ConstructorDescriptor::bound(
            TypeInfo::of::<Gadget>(),
            vec![TypeInfo::of::<i32>()],
            Arc::new(|_args| Ok(instance(Gadget))),
        ));

        assert!(context.bind(&method, widget_ctor.clone()));
        assert!(!context.bind(&method, gadget_ctor));

        let bound = context.get(&method).unwrap();
        assert!(Arc::ptr_eq(&bound, &widget_ctor));
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn lookup_misses_are_none() {
        let context = FactoryContext::new();
        assert!(context.get(&make_method()).is_none());
        assert!(context.is_empty());
    }
}
