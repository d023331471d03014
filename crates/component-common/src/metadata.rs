//! 元数据定义
//!
//! 提供类型信息、实例句柄和元数据标记

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// 类型擦除的组件实例句柄
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 将值包装为实例句柄
pub fn instance<T: Send + Sync + 'static>(value: T) -> Instance {
    Arc::new(value)
}

/// 类型信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 类型名称
    pub name: String,
    /// 类型ID
    pub id: TypeId,
    /// 模块路径
    pub module_path: String,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: 'static>() -> Self {
        Self {
            name: std::any::type_name::<T>()
                .split("::")
                .last()
                .unwrap_or("Unknown")
                .to_string(),
            id: TypeId::of::<T>(),
            module_path: std::any::type_name::<T>().to_string(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &str {
        self.name.split("::").last().unwrap_or(&self.name)
    }

    /// 检查模块路径是否位于指定扫描根之下
    pub fn within(&self, scan_root: &str) -> bool {
        self.module_path == scan_root
            || self
                .module_path
                .strip_prefix(scan_root)
                .is_some_and(|rest| rest.starts_with("::"))
    }
}

impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// 常用标记名称
pub mod markers {
    /// 组件标记
    pub const COMPONENT: &str = "component";
    /// 工厂方法标记
    pub const FACTORY: &str = "factory";
    /// 提供者标记
    pub const PROVIDER: &str = "provider";
    /// 父接口委托标记
    pub const DELEGATE: &str = "delegate";
    /// 字段注入标记
    pub const INJECT: &str = "inject";
    /// 启用钩子方法标记
    pub const ON_ENABLE: &str = "on_enable";
    /// 生命周期启动通知方法标记
    pub const ON_STARTED: &str = "on_started";
    /// 生命周期停止通知方法标记
    pub const ON_STOPPING: &str = "on_stopping";
    /// 方法调用日志标记
    pub const TRACED: &str = "traced";
}

/// 常用标记属性键
pub mod attributes {
    /// 组件标识
    pub const ID: &str = "id";
    /// 限定名称
    pub const NAME: &str = "name";
    /// 组件种类
    pub const KIND: &str = "kind";
    /// 治理父类型
    pub const OWNER: &str = "owner";
    /// 单例标志
    pub const SINGLETON: &str = "singleton";
    /// 延迟实例化标志
    pub const LAZY: &str = "lazy";
    /// 必需激活器列表
    pub const ACTIVATORS: &str = "activators";
    /// 是否允许代理
    pub const PERMITS_PROXYING: &str = "permits_proxying";
    /// 是否允许处理
    pub const PERMITS_PROCESSING: &str = "permits_processing";
    /// 是否在构造后启用
    pub const ENABLE: &str = "enable";
    /// 绑定优先级
    pub const PRIORITY: &str = "priority";
}

/// 元数据标记
///
/// 标记是附加在类型或成员上的命名标签，可携带任意属性值
#[derive(Debug, Clone)]
pub struct Marker {
    /// 标记名称
    pub name: String,
    /// 标记属性
    pub attributes: HashMap<String, serde_json::Value>,
}

impl Marker {
    /// 创建新的标记
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
        }
    }

    /// 添加属性
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// 获取属性值
    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    /// 获取字符串属性
    pub fn text_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|value| value.as_str())
    }

    /// 获取布尔属性，缺失时返回默认值
    pub fn flag_attribute(&self, key: &str, default: bool) -> bool {
        self.attributes
            .get(key)
            .and_then(|value| value.as_bool())
            .unwrap_or(default)
    }

    /// 获取整数属性，缺失时返回默认值
    pub fn int_attribute(&self, key: &str, default: i64) -> i64 {
        self.attributes
            .get(key)
            .and_then(|value| value.as_i64())
            .unwrap_or(default)
    }

    /// 获取字符串列表属性
    pub fn list_attribute(&self, key: &str) -> Vec<String> {
        self.attributes
            .get(key)
            .and_then(|value| value.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// 标记集合
#[derive(Debug, Clone, Default)]
pub struct MarkerSet {
    markers: Vec<Marker>,
}

impl MarkerSet {
    /// 创建空的标记集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加标记
    pub fn insert(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    /// 链式添加标记
    pub fn with(mut self, marker: Marker) -> Self {
        self.insert(marker);
        self
    }

    /// 检查是否包含指定名称的标记
    pub fn contains(&self, name: &str) -> bool {
        self.markers.iter().any(|marker| marker.name == name)
    }

    /// 获取指定名称的标记
    pub fn get(&self, name: &str) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.name == name)
    }

    /// 迭代所有标记
    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    /// 标记数量
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl FromIterator<Marker> for MarkerSet {
    fn from_iter<I: IntoIterator<Item = Marker>>(iter: I) -> Self {
        Self {
            markers: iter.into_iter().collect(),
        }
    }
}
