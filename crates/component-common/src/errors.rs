//! 错误类型定义

use thiserror::Error;

/// 绑定错误类型
///
/// 启动期致命的配置/绑定错误
#[derive(Error, Debug)]
pub enum BindingError {
    #[error("查找键没有构造函数绑定的提供者: {key}")]
    NoConstructorProvider { key: String },

    #[error("工厂方法参数不匹配任何构造函数: {key}, 期望参数: [{expected}]")]
    NoMatchingConstructor { key: String, expected: String },

    #[error("工厂方法缺少绑定: {method}")]
    FactoryBindingMissing { method: String },

    #[error("委托目标方法不存在: {parent}::{method}")]
    DelegationTargetMissing { parent: String, method: String },

    #[error("拦截目标方法不存在: {target}::{method}")]
    InterceptionTargetMissing { target: String, method: String },

    #[error("方法绑定失败: {method}, 原因: {message}")]
    MethodBindingFailed { method: String, message: String },
}

/// 调用错误类型
///
/// 描述符闭包（方法体、构造函数、字段访问器）执行失败
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("参数数量不匹配: 期望 {expected}, 实际 {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("参数类型转换失败: 位置 {index}, 期望 {expected}")]
    ArgumentMismatch { index: usize, expected: String },

    #[error("实例类型转换失败: 期望 {expected}")]
    TargetMismatch { expected: String },

    #[error("抽象方法没有方法体: {method}")]
    AbstractMethod { method: String },

    #[error("方法调用失败: {method}, 原因: {message}")]
    InvocationFailed { method: String, message: String },
}

/// 代理错误类型
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("组件禁止代理: {type_name}")]
    ProxyingNotPermitted { type_name: String },

    #[error("基础类型未知: {type_name}")]
    UnknownBaseType { type_name: String },

    #[error("代理方法不存在: {base}::{method}")]
    UnknownMethod { base: String, method: String },

    #[error("代理已完成构建: {base}")]
    AlreadyFinalized { base: String },

    #[error("代理构建失败: {source}")]
    Binding {
        #[from]
        source: BindingError,
    },

    #[error("代理调用失败: {source}")]
    Invocation {
        #[from]
        source: InvocationError,
    },
}

/// 组件错误类型
///
/// 组件扫描和注册期间的错误
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("组件扫描失败: {message}")]
    ScanError { message: String },

    #[error("组件注册失败: {type_name}, 原因: {message}")]
    RegistrationError { type_name: String, message: String },

    #[error("组件元数据无效: {message}")]
    InvalidMetadata { message: String },

    #[error("组件元数据解析失败: {message}")]
    ParseError { message: String },
}

impl ComponentError {
    /// 创建扫描错误
    pub fn scan_error(message: impl Into<String>) -> Self {
        Self::ScanError {
            message: message.into(),
        }
    }
}

/// 依赖解析错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件未注册: {type_name}")]
    ComponentNotRegistered { type_name: String },

    #[error("组件创建失败: {type_name}, 原因: {message}")]
    ComponentCreationFailed { type_name: String, message: String },

    #[error("检测到循环依赖: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("超过最大解析深度: {max_depth}, 查找键: {key}")]
    MaxDepthExceeded { key: String, max_depth: usize },

    #[error("提供者执行失败: {key}, 原因: {message}")]
    SupplierFailed { key: String, message: String },

    #[error("组件处理失败: {type_name}")]
    ProcessingFailed {
        type_name: String,
        #[source]
        source: Box<ProcessingError>,
    },
}

/// 管线处理错误类型
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("绑定错误: {source}")]
    Binding {
        #[from]
        source: BindingError,
    },

    #[error("代理错误: {source}")]
    Proxy {
        #[from]
        source: ProxyError,
    },

    #[error("组件未注册, 拒绝处理: {key}")]
    ComponentNotRegistered { key: String },

    #[error("处理阶段与声明顺序不符: 处理器 {processor} 声明为 {order}")]
    PhaseMismatch { processor: String, order: String },

    #[error("处理器执行失败: {processor}, 组件: {key}, 原因: {message}")]
    ProcessorFailed {
        processor: String,
        key: String,
        message: String,
    },

    #[error("处理后没有产生组件实例: {key}")]
    NoInstanceProduced { key: String },

    #[error("依赖解析失败: {source}")]
    Dependency {
        #[source]
        source: Box<DependencyError>,
    },
}

impl From<DependencyError> for ProcessingError {
    fn from(source: DependencyError) -> Self {
        Self::Dependency {
            source: Box::new(source),
        }
    }
}

/// 运行时错误类型
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("组件错误: {source}")]
    Component {
        #[from]
        source: ComponentError,
    },

    #[error("处理错误: {source}")]
    Processing {
        #[from]
        source: ProcessingError,
    },

    #[error("依赖解析错误: {source}")]
    Dependency {
        #[from]
        source: DependencyError,
    },

    #[error("运行时启动失败: {message}")]
    BootstrapFailed { message: String },

    #[error("运行时关闭失败: {message}")]
    ShutdownFailed { message: String },
}

/// 结果类型别名
pub type BindingResult<T> = Result<T, BindingError>;
pub type InvocationResult<T> = Result<T, InvocationError>;
pub type ProxyResult<T> = Result<T, ProxyError>;
pub type ComponentResult<T> = Result<T, ComponentError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type ProcessingResult<T> = Result<T, ProcessingError>;
pub type RuntimeResult<T> = Result<T, RuntimeError>;
