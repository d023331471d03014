//! 激活器模型
//!
//! 激活器是宿主上下文中的开关标记：处理器与组件只有在其声明的
//! 激活器全部处于激活状态时才会参与处理。

use std::collections::HashSet;

/// 激活器键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivatorKey(String);

impl ActivatorKey {
    /// 创建新的激活器键
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// 激活器名称
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActivatorKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl std::fmt::Display for ActivatorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 常用激活器名称
pub mod activators {
    /// 工厂解析激活器
    pub const FACTORIES: &str = "factories";
    /// 提供者解析激活器
    pub const PROVIDERS: &str = "providers";
    /// 代理构建激活器
    pub const PROXIES: &str = "proxies";
    /// 启动期观察者注册激活器
    pub const BOOTSTRAP: &str = "use_bootstrap";
}

/// 激活器来源 trait
pub trait ActivatorSource: Send + Sync {
    /// 检查激活器是否处于激活状态
    fn has_activator(&self, key: &ActivatorKey) -> bool;

    /// 枚举所有激活的激活器
    fn active_activators(&self) -> Vec<ActivatorKey>;
}

/// 激活器集合
#[derive(Debug, Clone, Default)]
pub struct ActivatorSet {
    active: HashSet<ActivatorKey>,
}

impl ActivatorSet {
    /// 创建空的激活器集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建包含标准激活器的集合
    pub fn standard() -> Self {
        Self::new()
            .with_activator(activators::FACTORIES)
            .with_activator(activators::PROVIDERS)
            .with_activator(activators::PROXIES)
    }

    /// 激活指定激活器
    pub fn with_activator(mut self, key: impl Into<ActivatorKey>) -> Self {
        self.active.insert(key.into());
        self
    }

    /// 激活指定激活器
    pub fn activate(&mut self, key: impl Into<ActivatorKey>) {
        self.active.insert(key.into());
    }
}

impl ActivatorSource for ActivatorSet {
    fn has_activator(&self, key: &ActivatorKey) -> bool {
        self.active.contains(key)
    }

    fn active_activators(&self) -> Vec<ActivatorKey> {
        self.active.iter().cloned().collect()
    }
}
