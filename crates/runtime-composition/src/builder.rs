//! 运行时构建器与组件运行时
//!
//! 使用构建者模式组装应用上下文，并负责协调启动顺序：注册扫描根、
//! 预处理全部组件、立即实例化非延迟单例、发出生命周期启动通知。

use crate::context::{ApplicationContext, ContextInner};
use crate::options::RuntimeOptions;
use component_common::{
    ActivatorKey, ActivatorSet, DefaultLifecycleManager, LifecycleManager, RuntimeError,
    RuntimeResult, TypeIntrospector,
};
use dashmap::DashMap;
use processing_abstractions::{
    BindingHierarchy, ComponentPreProcessor, ComponentRegistry, FactoryContext,
    InstancePostProcessor, ModifierPostProcessor, ProcessingContext,
};
use processing_impl::{
    ComponentRegistryImpl, FactoryBindingPreProcessor, FactoryMethodPostProcessor,
    InMemoryBindingHierarchy, LifecycleObserverPreProcessor, ParentDelegationPostProcessor,
    ProcessingPipeline, ProviderFieldPostProcessor, ProviderMethodPreProcessor,
    TracingWrapperPostProcessor,
};
use std::sync::Arc;
use tracing::{debug, info};

/// 运行时构建器
pub struct RuntimeBuilder {
    introspector: Option<Arc<dyn TypeIntrospector>>,
    hierarchy: Option<Arc<dyn BindingHierarchy>>,
    lifecycle: Option<Arc<dyn LifecycleManager>>,
    activators: ActivatorSet,
    options: RuntimeOptions,
    scan_roots: Vec<String>,
    pre_processors: Vec<Arc<dyn ComponentPreProcessor>>,
    instance_processors: Vec<Arc<dyn InstancePostProcessor>>,
    modifier_processors: Vec<Arc<dyn ModifierPostProcessor>>,
}

impl RuntimeBuilder {
    /// 创建新的运行时构建器
    pub fn new() -> Self {
        Self {
            introspector: None,
            hierarchy: None,
            lifecycle: None,
            activators: ActivatorSet::standard(),
            options: RuntimeOptions::default(),
            scan_roots: Vec::new(),
            pre_processors: Vec::new(),
            instance_processors: Vec::new(),
            modifier_processors: Vec::new(),
        }
    }

    /// 配置内省服务
    pub fn with_introspector(mut self, introspector: Arc<dyn TypeIntrospector>) -> Self {
        self.introspector = Some(introspector);
        self
    }

    /// 配置绑定层次
    pub fn with_hierarchy(mut self, hierarchy: Arc<dyn BindingHierarchy>) -> Self {
        self.hierarchy = Some(hierarchy);
        self
    }

    /// 配置生命周期管理器
    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn LifecycleManager>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// 替换整套激活器
    pub fn with_activators(mut self, activators: ActivatorSet) -> Self {
        self.activators = activators;
        self
    }

    /// 追加激活一个激活器
    pub fn with_activator(mut self, key: impl Into<ActivatorKey>) -> Self {
        self.activators.activate(key);
        self
    }

    /// 配置运行时选项
    pub fn with_options(mut self, options: RuntimeOptions) -> Self {
        self.options = options;
        self
    }

    /// 添加扫描根
    pub fn add_scan_root(mut self, root: impl Into<String>) -> Self {
        self.scan_roots.push(root.into());
        self
    }

    /// 注册预处理器
    pub fn with_pre_processor(mut self, processor: Arc<dyn ComponentPreProcessor>) -> Self {
        self.pre_processors.push(processor);
        self
    }

    /// 注册阶段一后处理器
    pub fn with_instance_processor(mut self, processor: Arc<dyn InstancePostProcessor>) -> Self {
        self.instance_processors.push(processor);
        self
    }

    /// 注册阶段二后处理器
    pub fn with_modifier_processor(mut self, processor: Arc<dyn ModifierPostProcessor>) -> Self {
        self.modifier_processors.push(processor);
        self
    }

    /// 注册全部内置处理器
    pub fn with_standard_processors(self) -> Self {
        self.with_pre_processor(Arc::new(FactoryBindingPreProcessor::new()))
            .with_pre_processor(Arc::new(ProviderMethodPreProcessor::new()))
            .with_pre_processor(Arc::new(LifecycleObserverPreProcessor::new()))
            .with_instance_processor(Arc::new(FactoryMethodPostProcessor::new()))
            .with_instance_processor(Arc::new(ParentDelegationPostProcessor::new()))
            .with_modifier_processor(Arc::new(ProviderFieldPostProcessor::new()))
            .with_modifier_processor(Arc::new(TracingWrapperPostProcessor::new()))
    }

    /// 构建组件运行时
    pub fn build(self) -> RuntimeResult<ComponentRuntime> {
        let introspector = self.introspector.ok_or_else(|| RuntimeError::BootstrapFailed {
            message: "未配置类型内省服务".to_string(),
        })?;
        let hierarchy = self
            .hierarchy
            .unwrap_or_else(|| Arc::new(InMemoryBindingHierarchy::new()));
        let lifecycle = self
            .lifecycle
            .unwrap_or_else(|| Arc::new(DefaultLifecycleManager::new()));
        let activators = Arc::new(self.activators);

        let mut pipeline = ProcessingPipeline::new();
        for processor in self.pre_processors {
            pipeline.register_pre_processor(processor);
        }
        for processor in self.instance_processors {
            pipeline.register_instance_processor(processor)?;
        }
        for processor in self.modifier_processors {
            pipeline.register_modifier_processor(processor)?;
        }

        let registry = Arc::new(ComponentRegistryImpl::new(
            introspector.clone(),
            activators.clone(),
        ));

        let context = ApplicationContext::new(ContextInner {
            introspector,
            hierarchy,
            registry,
            factory: Arc::new(FactoryContext::new()),
            lifecycle,
            activators,
            pipeline: Arc::new(pipeline),
            options: self.options,
            singletons: DashMap::new(),
        });

        Ok(ComponentRuntime {
            context,
            scan_roots: self.scan_roots,
        })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 组件运行时
pub struct ComponentRuntime {
    context: ApplicationContext,
    scan_roots: Vec<String>,
}

impl ComponentRuntime {
    /// 应用上下文
    pub fn context(&self) -> &ApplicationContext {
        &self.context
    }

    /// 启动组件运行时
    pub async fn start(&self) -> RuntimeResult<()> {
        info!("开始启动组件运行时");
        let registry = self.context.registry();

        // 第一步: 注册扫描根
        for root in &self.scan_roots {
            let count = registry.register(root)?;
            info!("注册扫描根: {}, 发现 {} 个组件", root, count);
        }

        // 第二步: 预处理全部组件
        if self.context.options().preprocess_on_start {
            for container in registry.containers() {
                debug!("预处理组件: {}", container.type_info().name);
                self.context
                    .pipeline()
                    .process_type(&self.context, &container)?;
            }
        }

        // 第三步: 立即实例化非延迟单例
        if self.context.options().eager_singletons {
            for container in registry.containers() {
                if container.singleton() && !container.lazy() {
                    debug!("立即实例化单例组件: {}", container.type_info().name);
                    self.context.resolve(&container.key())?;
                }
            }
        }

        // 第四步: 发出生命周期启动通知
        self.context
            .lifecycle()
            .notify_started(self.context.introspector().as_ref())
            .await;

        info!("组件运行时启动完成");
        Ok(())
    }

    /// 关闭组件运行时
    pub async fn stop(&self) -> RuntimeResult<()> {
        info!("开始关闭组件运行时");
        self.context
            .lifecycle()
            .notify_stopping(self.context.introspector().as_ref())
            .await;
        info!("组件运行时关闭完成");
        Ok(())
    }
}

impl std::fmt::Debug for ComponentRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRuntime")
            .field("scan_roots", &self.scan_roots)
            .finish()
    }
}

/// 初始化日志订阅器，失败时静默忽略（例如已由宿主初始化）
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
