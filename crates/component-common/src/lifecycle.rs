//! 组件生命周期管理
//!
//! 生命周期管理器是宿主环境提供的外部协作者：启动期注册的观察者组件
//! 会在运行时启动/关闭时收到通知。

use crate::component::ComponentKey;
use crate::introspection::TypeIntrospector;
use crate::metadata::{markers, Instance};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, error};

/// 生命周期观察者父类型哨兵
///
/// 组件类型描述符将本类型列为父类型即声明自己为生命周期观察者
#[derive(Debug)]
pub struct ObservesLifecycle;

/// 已注册的观察者条目
#[derive(Clone)]
pub struct ObserverRegistration {
    /// 观察者组件查找键
    pub key: ComponentKey,
    /// 已解析的观察者实例
    pub instance: Instance,
}

impl std::fmt::Debug for ObserverRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistration")
            .field("key", &self.key)
            .finish()
    }
}

/// 生命周期管理器 trait
#[async_trait]
pub trait LifecycleManager: Send + Sync {
    /// 注册生命周期观察者
    fn register_observer(&self, key: &ComponentKey, instance: Instance);

    /// 枚举已注册的观察者
    fn observers(&self) -> Vec<ObserverRegistration>;

    /// 通知所有观察者运行时已启动
    async fn notify_started(&self, introspector: &dyn TypeIntrospector);

    /// 通知所有观察者运行时即将关闭
    async fn notify_stopping(&self, introspector: &dyn TypeIntrospector);
}

/// 默认生命周期管理器实现
///
/// 通过类型描述符查找 `on_started` / `on_stopping` 标记的方法并逐个调用；
/// 单个观察者的失败只记录日志，不影响其他观察者
#[derive(Debug, Default)]
pub struct DefaultLifecycleManager {
    observers: RwLock<Vec<ObserverRegistration>>,
}

impl DefaultLifecycleManager {
    /// 创建新的生命周期管理器
    pub fn new() -> Self {
        Self::default()
    }

    fn notify(&self, introspector: &dyn TypeIntrospector, marker: &str) {
        for registration in self.observers() {
            let Some(descriptor) = introspector.describe(&registration.key.type_info) else {
                debug!("观察者类型缺少描述符, 跳过通知: {}", registration.key);
                continue;
            };

            for method in &descriptor.methods {
                if !method.markers.contains(marker) {
                    continue;
                }
                let Some(invoker) = &method.invoker else {
                    error!("观察者通知方法没有方法体: {}", method.qualified_name());
                    continue;
                };
                if let Err(e) = invoker(Some(&registration.instance), &[]) {
                    error!(
                        "观察者通知失败: {}, 原因: {}",
                        method.qualified_name(),
                        e
                    );
                }
            }
        }
    }
}

#[async_trait]
impl LifecycleManager for DefaultLifecycleManager {
    fn register_observer(&self, key: &ComponentKey, instance: Instance) {
        debug!("注册生命周期观察者: {}", key);
        self.observers.write().push(ObserverRegistration {
            key: key.clone(),
            instance,
        });
    }

    fn observers(&self) -> Vec<ObserverRegistration> {
        self.observers.read().clone()
    }

    async fn notify_started(&self, introspector: &dyn TypeIntrospector) {
        self.notify(introspector, markers::ON_STARTED);
    }

    async fn notify_stopping(&self, introspector: &dyn TypeIntrospector) {
        self.notify(introspector, markers::ON_STOPPING);
    }
}
