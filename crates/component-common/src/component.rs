//! 组件模型定义
//!
//! 提供组件查找键与组件容器元数据

use crate::activation::ActivatorKey;
use crate::errors::ComponentError;
use crate::metadata::TypeInfo;
use std::collections::HashSet;

/// 组件种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// 功能组件
    Functional,
    /// 配置组件
    Configuration,
}

impl Default for ComponentKind {
    fn default() -> Self {
        Self::Functional
    }
}

impl std::str::FromStr for ComponentKind {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "functional" => Ok(Self::Functional),
            "configuration" => Ok(Self::Configuration),
            _ => Err(ComponentError::ParseError {
                message: format!("未知的组件种类: {}", s),
            }),
        }
    }
}

/// 组件查找键
///
/// 绑定解析使用的 (类型, 可选限定名称) 二元组
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    /// 组件类型
    pub type_info: TypeInfo,
    /// 可选限定名称
    pub name: Option<String>,
}

impl ComponentKey {
    /// 按类型创建查找键
    pub fn of(type_info: TypeInfo) -> Self {
        Self {
            type_info,
            name: None,
        }
    }

    /// 按类型参数创建查找键
    pub fn for_type<T: 'static>() -> Self {
        Self::of(TypeInfo::of::<T>())
    }

    /// 设置限定名称
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl std::fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}#{}", self.type_info.name, name),
            None => f.write_str(&self.type_info.name),
        }
    }
}

/// 组件容器
///
/// 注册表为每个被发现的组件类型缓存的元数据；创建后不可变，
/// 两个容器当且仅当 `type_info` 相等时相等
#[derive(Debug, Clone)]
pub struct ComponentContainer {
    id: String,
    name: String,
    type_info: TypeInfo,
    owner: TypeInfo,
    activators: HashSet<ActivatorKey>,
    singleton: bool,
    lazy: bool,
    kind: ComponentKind,
    permits_proxying: bool,
    permits_processing: bool,
}

impl ComponentContainer {
    /// 创建新的组件容器构建器
    pub fn builder(type_info: TypeInfo) -> ComponentContainerBuilder {
        ComponentContainerBuilder::new(type_info)
    }

    /// 组件标识
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 组件显示名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 组件类型
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 治理父类型，未指定时为组件自身
    pub fn owner(&self) -> &TypeInfo {
        &self.owner
    }

    /// 必需激活器集合
    pub fn activators(&self) -> &HashSet<ActivatorKey> {
        &self.activators
    }

    /// 是否为单例
    pub fn singleton(&self) -> bool {
        self.singleton
    }

    /// 是否延迟实例化
    pub fn lazy(&self) -> bool {
        self.lazy
    }

    /// 组件种类
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// 是否允许代理
    pub fn permits_proxying(&self) -> bool {
        self.permits_proxying
    }

    /// 是否允许处理
    pub fn permits_processing(&self) -> bool {
        self.permits_processing
    }

    /// 组件查找键
    pub fn key(&self) -> ComponentKey {
        ComponentKey::of(self.type_info.clone())
    }
}

impl PartialEq for ComponentContainer {
    fn eq(&self, other: &Self) -> bool {
        self.type_info == other.type_info
    }
}

impl Eq for ComponentContainer {}

impl std::hash::Hash for ComponentContainer {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_info.hash(state);
    }
}

/// 组件容器构建器
#[derive(Debug)]
pub struct ComponentContainerBuilder {
    id: Option<String>,
    name: Option<String>,
    type_info: TypeInfo,
    owner: Option<TypeInfo>,
    activators: HashSet<ActivatorKey>,
    singleton: bool,
    lazy: bool,
    kind: ComponentKind,
    permits_proxying: bool,
    permits_processing: bool,
}

impl ComponentContainerBuilder {
    fn new(type_info: TypeInfo) -> Self {
        Self {
            id: None,
            name: None,
            type_info,
            owner: None,
            activators: HashSet::new(),
            singleton: false,
            lazy: false,
            kind: ComponentKind::default(),
            permits_proxying: true,
            permits_processing: true,
        }
    }

    /// 设置组件标识
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// 设置组件显示名称
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 设置治理父类型
    pub fn owner(mut self, owner: TypeInfo) -> Self {
        self.owner = Some(owner);
        self
    }

    /// 添加必需激活器
    pub fn activator(mut self, key: ActivatorKey) -> Self {
        self.activators.insert(key);
        self
    }

    /// 设置单例标志
    pub fn singleton(mut self, singleton: bool) -> Self {
        self.singleton = singleton;
        self
    }

    /// 设置延迟实例化标志
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// 设置组件种类
    pub fn kind(mut self, kind: ComponentKind) -> Self {
        self.kind = kind;
        self
    }

    /// 设置是否允许代理
    pub fn permits_proxying(mut self, permits: bool) -> Self {
        self.permits_proxying = permits;
        self
    }

    /// 设置是否允许处理
    pub fn permits_processing(mut self, permits: bool) -> Self {
        self.permits_processing = permits;
        self
    }

    /// 构建组件容器
    ///
    /// 标识未指定时从显示名称派生
    pub fn build(self) -> ComponentContainer {
        let name = self
            .name
            .unwrap_or_else(|| self.type_info.short_name().to_string());
        let id = self
            .id
            .unwrap_or_else(|| crate::naming::derive_component_id(&name));
        let owner = self.owner.unwrap_or_else(|| self.type_info.clone());

        ComponentContainer {
            id,
            name,
            type_info: self.type_info,
            owner,
            activators: self.activators,
            singleton: self.singleton,
            lazy: self.lazy,
            kind: self.kind,
            permits_proxying: self.permits_proxying,
            permits_processing: self.permits_processing,
        }
    }
}
