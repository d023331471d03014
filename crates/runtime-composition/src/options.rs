//! 运行时配置选项

use serde::{Deserialize, Serialize};

/// 运行时配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeOptions {
    /// 最大解析深度
    pub max_resolution_depth: usize,
    /// 启动时是否立即实例化非延迟单例组件
    pub eager_singletons: bool,
    /// 启动时是否对全部组件执行预处理
    pub preprocess_on_start: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            max_resolution_depth: 100,
            eager_singletons: true,
            preprocess_on_start: true,
        }
    }
}

impl RuntimeOptions {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置最大解析深度
    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    /// 设置是否立即实例化非延迟单例
    pub fn with_eager_singletons(mut self, eager: bool) -> Self {
        self.eager_singletons = eager;
        self
    }

    /// 设置启动时是否执行预处理
    pub fn with_preprocess_on_start(mut self, preprocess: bool) -> Self {
        self.preprocess_on_start = preprocess;
        self
    }
}
