//! 类型内省服务
//!
//! 以预先注册的类型描述符表代替运行时反射：每个参与处理的类型在启动期
//! 注册一份 [`TypeDescriptor`]，内省服务据此枚举方法、字段、构造函数，
//! 读取元数据标记并判断父子类型关系。

use crate::errors::{InvocationError, InvocationResult};
use crate::metadata::{Instance, MarkerSet, TypeInfo};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

/// 方法体调用闭包
///
/// 第一个参数为目标实例（静态方法为 `None`），第二个参数为调用参数
pub type MethodInvoker =
    Arc<dyn Fn(Option<&Instance>, &[Instance]) -> InvocationResult<Option<Instance>> + Send + Sync>;

/// 构造函数调用闭包
pub type ConstructorInvoker = Arc<dyn Fn(&[Instance]) -> InvocationResult<Instance> + Send + Sync>;

/// 字段读取闭包
pub type FieldGetter = Arc<dyn Fn(&Instance) -> InvocationResult<Instance> + Send + Sync>;

/// 字段写入闭包
pub type FieldSetter = Arc<dyn Fn(&Instance, Instance) -> InvocationResult<()> + Send + Sync>;

/// 类型零值供应闭包
pub type DefaultValueFn = Arc<dyn Fn() -> Instance + Send + Sync>;

/// 方法签名
///
/// 方法按 (名称, 参数类型序列) 标识；返回类型不参与标识
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// 方法名称
    pub name: String,
    /// 参数类型序列
    pub parameters: Vec<TypeInfo>,
}

impl MethodSignature {
    /// 创建新的方法签名
    pub fn new(name: impl Into<String>, parameters: Vec<TypeInfo>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }
}

impl std::fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parameters = self
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}({})", self.name, parameters)
    }
}

/// 方法描述符
#[derive(Clone)]
pub struct MethodDescriptor {
    /// 方法名称
    pub name: String,
    /// 声明类型
    pub declaring_type: TypeInfo,
    /// 参数类型序列
    pub parameter_types: Vec<TypeInfo>,
    /// 返回类型，`None` 表示无返回值
    pub return_type: Option<TypeInfo>,
    /// 方法标记
    pub markers: MarkerSet,
    /// 方法体，抽象方法为 `None`
    pub invoker: Option<MethodInvoker>,
}

impl MethodDescriptor {
    /// 创建新的方法描述符
    pub fn new(
        declaring_type: TypeInfo,
        name: impl Into<String>,
        parameter_types: Vec<TypeInfo>,
        return_type: Option<TypeInfo>,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            parameter_types,
            return_type,
            markers: MarkerSet::new(),
            invoker: None,
        }
    }

    /// 添加标记
    pub fn with_marker(mut self, marker: crate::metadata::Marker) -> Self {
        self.markers.insert(marker);
        self
    }

    /// 设置方法体
    pub fn with_invoker(mut self, invoker: MethodInvoker) -> Self {
        self.invoker = Some(invoker);
        self
    }

    /// 是否为抽象方法
    pub fn is_abstract(&self) -> bool {
        self.invoker.is_none()
    }

    /// 方法签名
    pub fn signature(&self) -> MethodSignature {
        MethodSignature::new(self.name.clone(), self.parameter_types.clone())
    }

    /// 带声明类型的完整名称
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.declaring_type.name, self.name)
    }
}

impl std::fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("parameter_types", &self.parameter_types)
            .field("return_type", &self.return_type)
            .field("markers", &self.markers)
            .field("invoker", &self.invoker.as_ref().map(|_| "<function>"))
            .finish()
    }
}

/// 字段描述符
#[derive(Clone)]
pub struct FieldDescriptor {
    /// 字段名称
    pub name: String,
    /// 声明类型
    pub declaring_type: TypeInfo,
    /// 字段类型
    pub field_type: TypeInfo,
    /// 字段标记
    pub markers: MarkerSet,
    /// 字段读取器
    pub getter: Option<FieldGetter>,
    /// 字段写入器
    pub setter: Option<FieldSetter>,
}

impl FieldDescriptor {
    /// 创建新的字段描述符
    pub fn new(declaring_type: TypeInfo, name: impl Into<String>, field_type: TypeInfo) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            field_type,
            markers: MarkerSet::new(),
            getter: None,
            setter: None,
        }
    }

    /// 添加标记
    pub fn with_marker(mut self, marker: crate::metadata::Marker) -> Self {
        self.markers.insert(marker);
        self
    }

    /// 设置读取器
    pub fn with_getter(mut self, getter: FieldGetter) -> Self {
        self.getter = Some(getter);
        self
    }

    /// 设置写入器
    pub fn with_setter(mut self, setter: FieldSetter) -> Self {
        self.setter = Some(setter);
        self
    }
}

impl std::fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("field_type", &self.field_type)
            .field("markers", &self.markers)
            .finish()
    }
}

/// 构造函数描述符
#[derive(Clone)]
pub struct ConstructorDescriptor {
    /// 声明类型
    pub declaring_type: TypeInfo,
    /// 参数类型序列
    pub parameter_types: Vec<TypeInfo>,
    /// 是否为显式绑定的构造函数
    pub bound: bool,
    /// 构造函数体
    pub invoker: ConstructorInvoker,
}

impl ConstructorDescriptor {
    /// 创建新的构造函数描述符
    pub fn new(
        declaring_type: TypeInfo,
        parameter_types: Vec<TypeInfo>,
        invoker: ConstructorInvoker,
    ) -> Self {
        Self {
            declaring_type,
            parameter_types,
            bound: false,
            invoker,
        }
    }

    /// 创建显式绑定的构造函数描述符
    pub fn bound(
        declaring_type: TypeInfo,
        parameter_types: Vec<TypeInfo>,
        invoker: ConstructorInvoker,
    ) -> Self {
        Self {
            declaring_type,
            parameter_types,
            bound: true,
            invoker,
        }
    }

    /// 调用构造函数
    pub fn invoke(&self, args: &[Instance]) -> InvocationResult<Instance> {
        if args.len() != self.parameter_types.len() {
            return Err(InvocationError::ArityMismatch {
                expected: self.parameter_types.len(),
                actual: args.len(),
            });
        }
        (self.invoker)(args)
    }

    /// 参数列表的可读形式
    pub fn parameter_display(&self) -> String {
        self.parameter_types
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("declaring_type", &self.declaring_type)
            .field("parameter_types", &self.parameter_types)
            .field("bound", &self.bound)
            .finish()
    }
}

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// 具体类型
    Concrete,
    /// 抽象类型（接口或抽象类）
    Abstract,
    /// 纯标记声明
    MarkerDeclaration,
}

/// 类型描述符
///
/// 一个类型可被内省的全部信息
#[derive(Clone)]
pub struct TypeDescriptor {
    /// 类型信息
    pub type_info: TypeInfo,
    /// 类型种类
    pub kind: TypeKind,
    /// 类型标记
    pub markers: MarkerSet,
    /// 直接父类型列表
    pub supertypes: Vec<TypeInfo>,
    /// 声明的方法
    pub methods: Vec<Arc<MethodDescriptor>>,
    /// 声明的字段
    pub fields: Vec<Arc<FieldDescriptor>>,
    /// 构造函数
    pub constructors: Vec<Arc<ConstructorDescriptor>>,
    /// 类型零值
    pub default_value: Option<DefaultValueFn>,
}

impl TypeDescriptor {
    /// 创建新的类型描述符
    pub fn new(type_info: TypeInfo) -> Self {
        Self {
            type_info,
            kind: TypeKind::Concrete,
            markers: MarkerSet::new(),
            supertypes: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            default_value: None,
        }
    }

    /// 从类型创建描述符
    pub fn of<T: 'static>() -> Self {
        Self::new(TypeInfo::of::<T>())
    }

    /// 设置类型种类
    pub fn with_kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    /// 添加标记
    pub fn with_marker(mut self, marker: crate::metadata::Marker) -> Self {
        self.markers.insert(marker);
        self
    }

    /// 添加父类型
    pub fn with_supertype(mut self, supertype: TypeInfo) -> Self {
        self.supertypes.push(supertype);
        self
    }

    /// 添加方法
    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(Arc::new(method));
        self
    }

    /// 添加字段
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(Arc::new(field));
        self
    }

    /// 添加构造函数
    pub fn with_constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.constructors.push(Arc::new(constructor));
        self
    }

    /// 设置类型零值
    pub fn with_default_value(mut self, default_value: DefaultValueFn) -> Self {
        self.default_value = Some(default_value);
        self
    }

    /// 使用 `Default` 实现作为类型零值
    pub fn with_default_of<T: Default + Send + Sync + 'static>(self) -> Self {
        self.with_default_value(Arc::new(|| Arc::new(T::default()) as Instance))
    }

    /// 按签名查找声明的方法
    pub fn method(&self, signature: &MethodSignature) -> Option<Arc<MethodDescriptor>> {
        self.methods
            .iter()
            .find(|method| &method.signature() == signature)
            .cloned()
    }

    /// 是否声明了指定签名的方法
    pub fn declares(&self, signature: &MethodSignature) -> bool {
        self.method(signature).is_some()
    }

    /// 显式绑定的构造函数
    pub fn bound_constructors(&self) -> Vec<Arc<ConstructorDescriptor>> {
        self.constructors
            .iter()
            .filter(|constructor| constructor.bound)
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_info", &self.type_info)
            .field("kind", &self.kind)
            .field("markers", &self.markers)
            .field("supertypes", &self.supertypes)
            .field("methods", &self.methods)
            .field("fields", &self.fields)
            .field("constructors", &self.constructors)
            .field("has_default_value", &self.default_value.is_some())
            .finish()
    }
}

/// 类型内省服务 trait
pub trait TypeIntrospector: Send + Sync {
    /// 获取类型描述符
    fn describe(&self, type_info: &TypeInfo) -> Option<Arc<TypeDescriptor>>;

    /// 枚举所有已注册的类型描述符
    fn known_types(&self) -> Vec<Arc<TypeDescriptor>>;

    /// 判断父子类型关系（自反、沿父类型闭包传递）
    fn is_subtype_of(&self, sub: &TypeInfo, sup: &TypeInfo) -> bool {
        if sub == sup {
            return true;
        }

        let mut visited = HashSet::new();
        let mut queue = vec![sub.clone()];
        while let Some(current) = queue.pop() {
            if let Some(descriptor) = self.describe(&current) {
                for parent in &descriptor.supertypes {
                    if parent == sup {
                        return true;
                    }
                    if visited.insert(parent.clone()) {
                        queue.push(parent.clone());
                    }
                }
            }
        }
        false
    }

    /// 按名称查找类型描述符
    fn find_by_name(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.known_types()
            .into_iter()
            .find(|descriptor| descriptor.type_info.name == name)
    }
}

/// 内存中的类型内省服务实现
#[derive(Debug, Default)]
pub struct InMemoryTypeIntrospector {
    descriptors: DashMap<TypeInfo, Arc<TypeDescriptor>>,
}

impl InMemoryTypeIntrospector {
    /// 创建新的内省服务
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册类型描述符
    pub fn register(&self, descriptor: TypeDescriptor) -> Arc<TypeDescriptor> {
        let descriptor = Arc::new(descriptor);
        self.descriptors
            .insert(descriptor.type_info.clone(), descriptor.clone());
        descriptor
    }
}

impl TypeIntrospector for InMemoryTypeIntrospector {
    fn describe(&self, type_info: &TypeInfo) -> Option<Arc<TypeDescriptor>> {
        self.descriptors.get(type_info).map(|entry| entry.clone())
    }

    fn known_types(&self) -> Vec<Arc<TypeDescriptor>> {
        self.descriptors
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

/// 按位置读取并转换调用参数
pub fn argument<T: Clone + Send + Sync + 'static>(
    args: &[Instance],
    index: usize,
) -> InvocationResult<T> {
    let value = args.get(index).ok_or(InvocationError::ArityMismatch {
        expected: index + 1,
        actual: args.len(),
    })?;
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| InvocationError::ArgumentMismatch {
            index,
            expected: std::any::type_name::<T>().to_string(),
        })
}

/// 转换调用目标实例
pub fn target<'a, T: Send + Sync + 'static>(
    instance: Option<&'a Instance>,
) -> InvocationResult<&'a T> {
    instance
        .and_then(|value| value.downcast_ref::<T>())
        .ok_or_else(|| InvocationError::TargetMismatch {
            expected: std::any::type_name::<T>().to_string(),
        })
}
