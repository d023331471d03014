//! 代理句柄
//!
//! 句柄在一次组件实例化过程中被所有处理器共享：阶段一的处理器创建句柄
//! 并安装拦截器，阶段二的处理器继续通过同一句柄向内部可变的表中追加
//! 包装器。`proxy` 在阶段一结束时只完成一次。

use crate::instance::ProxyInstance;
use component_common::{
    BindingError, Instance, MethodDescriptor, MethodSignature, ProxyError, ProxyResult,
    TypeDescriptor, TypeInfo, TypeIntrospector,
};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// 包装器挂接点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapperPhase {
    /// 方法体执行之前
    Before,
    /// 方法体成功返回之后
    After,
    /// 方法体抛出错误之后
    Throwing,
}

/// 拦截器收到的调用信息
pub struct ProxyInvocation<'a> {
    /// 被调用的方法
    pub method: &'a MethodDescriptor,
    /// 原始实例（可能不存在）
    pub target: Option<&'a Instance>,
    /// 调用参数
    pub args: &'a [Instance],
}

/// 包装器收到的调用信息
pub struct WrapperContext<'a> {
    /// 被调用的方法
    pub method: &'a MethodDescriptor,
    /// 原始实例（可能不存在）
    pub target: Option<&'a Instance>,
    /// 调用参数
    pub args: &'a [Instance],
    /// 仅在 `Throwing` 挂接点提供的错误
    pub error: Option<&'a ProxyError>,
}

/// 方法拦截器：完整替换方法体
pub type MethodInterceptor =
    Arc<dyn Fn(&ProxyInvocation<'_>) -> ProxyResult<Option<Instance>> + Send + Sync>;

/// 包装器回调：不替换方法体的观察钩子
pub type WrapperCallback = Arc<dyn Fn(&WrapperContext<'_>) + Send + Sync>;

/// 方法包装器：一次性提供三个挂接点的对象形式
pub trait MethodWrapper: Send + Sync {
    /// 方法体执行之前
    fn before(&self, _cx: &WrapperContext<'_>) {}

    /// 方法体成功返回之后
    fn after(&self, _cx: &WrapperContext<'_>) {}

    /// 方法体抛出错误之后
    fn throwing(&self, _cx: &WrapperContext<'_>) {}
}

/// 拦截器与包装器表
///
/// 完成构建后仍保持内部可变，供阶段二的处理器继续追加
#[derive(Default)]
pub(crate) struct ProxyTables {
    pub(crate) interceptors: RwLock<HashMap<MethodSignature, MethodInterceptor>>,
    pub(crate) callbacks: RwLock<HashMap<(MethodSignature, WrapperPhase), Vec<WrapperCallback>>>,
}

struct HandlerInner {
    base: Arc<TypeDescriptor>,
    original: Option<Instance>,
    introspector: Arc<dyn TypeIntrospector>,
    /// 基础类型自身与父类型的可调用方法全集
    methods: HashMap<MethodSignature, Arc<MethodDescriptor>>,
    /// 基础类型自身声明的方法签名
    own: HashSet<MethodSignature>,
    tables: Arc<ProxyTables>,
    finalized: OnceCell<()>,
}

/// 代理句柄
///
/// 克隆共享同一底层状态
#[derive(Clone)]
pub struct ProxyHandler {
    inner: Arc<HandlerInner>,
}

impl ProxyHandler {
    /// 为基础类型和可选的原始实例创建代理句柄
    pub fn new(
        introspector: Arc<dyn TypeIntrospector>,
        base: &TypeInfo,
        original: Option<Instance>,
    ) -> ProxyResult<Self> {
        let descriptor = introspector
            .describe(base)
            .ok_or_else(|| ProxyError::UnknownBaseType {
                type_name: base.name.clone(),
            })?;

        let mut methods = HashMap::new();
        let mut own = HashSet::new();
        for method in &descriptor.methods {
            let signature = method.signature();
            own.insert(signature.clone());
            methods.insert(signature, method.clone());
        }

        // 沿父类型闭包补齐继承方法，基础类型的声明优先
        let mut visited = HashSet::new();
        let mut queue = descriptor.supertypes.clone();
        while let Some(parent) = queue.pop() {
            if !visited.insert(parent.clone()) {
                continue;
            }
            if let Some(parent_descriptor) = introspector.describe(&parent) {
                for method in &parent_descriptor.methods {
                    methods.entry(method.signature()).or_insert_with(|| method.clone());
                }
                queue.extend(parent_descriptor.supertypes.iter().cloned());
            }
        }

        debug!("创建代理句柄: {}, 方法数: {}", base.name, methods.len());
        Ok(Self {
            inner: Arc::new(HandlerInner {
                base: descriptor,
                original,
                introspector,
                methods,
                own,
                tables: Arc::new(ProxyTables::default()),
                finalized: OnceCell::new(),
            }),
        })
    }

    /// 基础类型信息
    pub fn base(&self) -> &TypeInfo {
        &self.inner.base.type_info
    }

    /// 原始实例
    pub fn original(&self) -> Option<&Instance> {
        self.inner.original.as_ref()
    }

    /// 内省服务
    pub fn introspector(&self) -> &Arc<dyn TypeIntrospector> {
        &self.inner.introspector
    }

    /// 按签名查找可调用方法（含继承方法）
    pub fn method(&self, signature: &MethodSignature) -> Option<Arc<MethodDescriptor>> {
        self.inner.methods.get(signature).cloned()
    }

    /// 基础类型自身是否声明了指定签名的方法
    pub fn declares_own(&self, signature: &MethodSignature) -> bool {
        self.inner.own.contains(signature)
    }

    /// 安装方法拦截器：完整替换方法体
    pub fn delegate(&self, method: &MethodDescriptor, interceptor: MethodInterceptor) {
        debug!("安装方法拦截器: {}", method.qualified_name());
        self.inner
            .tables
            .interceptors
            .write()
            .insert(method.signature(), interceptor);
    }

    /// 安装包装器回调，同一方法/挂接点按注册顺序组合
    pub fn wrapper(&self, phase: WrapperPhase, method: &MethodDescriptor, callback: WrapperCallback) {
        self.inner
            .tables
            .callbacks
            .write()
            .entry((method.signature(), phase))
            .or_default()
            .push(callback);
    }

    /// 安装包装器回调（参数顺序变体）
    pub fn callback(&self, method: &MethodDescriptor, phase: WrapperPhase, callback: WrapperCallback) {
        self.wrapper(phase, method, callback);
    }

    /// 以对象形式一次性安装三个挂接点
    pub fn wrap(&self, method: &MethodDescriptor, wrapper: Arc<dyn MethodWrapper>) {
        let w = wrapper.clone();
        self.wrapper(WrapperPhase::Before, method, Arc::new(move |cx| w.before(cx)));
        let w = wrapper.clone();
        self.wrapper(WrapperPhase::After, method, Arc::new(move |cx| w.after(cx)));
        self.wrapper(WrapperPhase::Throwing, method, Arc::new(move |cx| wrapper.throwing(cx)));
    }

    /// 完成代理构建
    ///
    /// 校验每个拦截/包装目标都存在于基础类型（含继承方法）上；
    /// 同一句柄只允许完成一次
    pub fn proxy(&self, original: Option<Instance>) -> ProxyResult<Instance> {
        self.inner
            .finalized
            .set(())
            .map_err(|_| ProxyError::AlreadyFinalized {
                base: self.base().name.clone(),
            })?;

        for signature in self.inner.tables.interceptors.read().keys() {
            self.require_target(signature)?;
        }
        for (signature, _phase) in self.inner.tables.callbacks.read().keys() {
            self.require_target(signature)?;
        }

        let original = original.or_else(|| self.inner.original.clone());
        debug!("完成代理构建: {}", self.base().name);
        Ok(Arc::new(ProxyInstance::new(
            self.inner.base.type_info.clone(),
            original,
            self.inner.methods.clone(),
            self.inner.tables.clone(),
            self.inner.introspector.clone(),
        )) as Instance)
    }

    fn require_target(&self, signature: &MethodSignature) -> ProxyResult<()> {
        if self.inner.methods.contains_key(signature) {
            Ok(())
        } else {
            Err(ProxyError::Binding {
                source: BindingError::InterceptionTargetMissing {
                    target: self.base().name.clone(),
                    method: signature.to_string(),
                },
            })
        }
    }
}

impl std::fmt::Debug for ProxyHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyHandler")
            .field("base", &self.inner.base.type_info)
            .field("methods", &self.inner.methods.len())
            .field("has_original", &self.inner.original.is_some())
            .finish()
    }
}

/// 查找类型的注册零值
pub fn zero_value(
    introspector: &dyn TypeIntrospector,
    type_info: Option<&TypeInfo>,
) -> Option<Instance> {
    type_info
        .and_then(|info| introspector.describe(info))
        .and_then(|descriptor| descriptor.default_value.clone())
        .map(|supply| supply())
}
