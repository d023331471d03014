//! Centralized integration tests for the component processing pipeline (migrated)

use component_common::{
    activators, argument, attributes, instance, markers, target, ComponentKey,
    ConstructorDescriptor, FieldDescriptor, InMemoryTypeIntrospector, InvocationError,
    LifecycleManager, Marker, MethodDescriptor, MethodSignature, ObservesLifecycle,
    TypeDescriptor, TypeInfo, TypeIntrospector, TypeKind,
};
use component_proxy::{ProxyInstance, WrapperPhase};
use parking_lot::{Mutex, RwLock};
use processing_abstractions::{
    BindingHierarchy, BindingProvider, ComponentProcessor, ComponentRegistry,
    ModifierPostProcessor, ProcessingContext, ProcessingOrder, ProcessingPass,
};
use runtime_composition::{ComponentRuntime, RuntimeBuilder};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// 测试组件: 由工厂构造的产品
#[derive(Debug)]
struct Widget {
    x: i32,
    label: RwLock<String>,
    enabled: AtomicBool,
}

/// 测试组件: 抽象工厂
struct WidgetShop;

/// 测试组件: 提供者宿主
#[derive(Debug)]
struct TimeConfig {
    clock: Clock,
}

#[derive(Debug, Clone)]
struct Clock {
    tick: u64,
}

/// 委托父接口及其解析目标
struct Greeter;

#[derive(Debug)]
struct ConsoleGreeter;

/// 测试组件: 没有覆盖 greet 的宿主
#[derive(Debug)]
struct Host;

/// 测试组件: 生命周期观察者
#[derive(Debug)]
struct BootWatcher;

/// 测试组件: 需要未激活激活器
#[derive(Debug)]
struct Experimental;

static PROVIDER_CALLS: AtomicUsize = AtomicUsize::new(0);
static WATCHER_STARTED: AtomicUsize = AtomicUsize::new(0);

fn widget_descriptor() -> TypeDescriptor {
    TypeDescriptor::of::<Widget>()
        .with_constructor(ConstructorDescriptor::bound(
            TypeInfo::of::<Widget>(),
            vec![TypeInfo::of::<i32>()],
            Arc::new(|args| {
                Ok(instance(Widget {
                    x: argument::<i32>(args, 0)?,
                    label: RwLock::new(String::new()),
                    enabled: AtomicBool::new(false),
                }))
            }),
        ))
        .with_field(
            FieldDescriptor::new(
                TypeInfo::of::<Widget>(),
                "label",
                TypeInfo::of::<String>(),
            )
            .with_marker(Marker::new(markers::INJECT))
            .with_setter(Arc::new(|owner, value| {
                let widget = target::<Widget>(Some(owner))?;
                let label = value
                    .downcast_ref::<String>()
                    .ok_or_else(|| InvocationError::ArgumentMismatch {
                        index: 0,
                        expected: "String".to_string(),
                    })?;
                *widget.label.write() = label.clone();
                Ok(())
            })),
        )
        .with_method(
            MethodDescriptor::new(TypeInfo::of::<Widget>(), "on_enable", Vec::new(), None)
                .with_marker(Marker::new(markers::ON_ENABLE))
                .with_invoker(Arc::new(|t, _args| {
                    let widget = target::<Widget>(t)?;
                    widget.enabled.store(true, Ordering::SeqCst);
                    Ok(None)
                })),
        )
}

fn widget_shop_descriptor() -> TypeDescriptor {
    TypeDescriptor::of::<WidgetShop>()
        .with_kind(TypeKind::Abstract)
        .with_marker(Marker::new(markers::COMPONENT))
        .with_method(
            MethodDescriptor::new(
                TypeInfo::of::<WidgetShop>(),
                "make",
                vec![TypeInfo::of::<i32>()],
                Some(TypeInfo::of::<Widget>()),
            )
            .with_marker(Marker::new(markers::FACTORY)),
        )
}

fn time_config_descriptor() -> TypeDescriptor {
    TypeDescriptor::of::<TimeConfig>()
        .with_marker(Marker::new(markers::COMPONENT).with_attribute(attributes::SINGLETON, true))
        .with_constructor(ConstructorDescriptor::bound(
            TypeInfo::of::<TimeConfig>(),
            Vec::new(),
            Arc::new(|_args| {
                Ok(instance(TimeConfig {
                    clock: Clock { tick: 42 },
                }))
            }),
        ))
        .with_method(
            MethodDescriptor::new(
                TypeInfo::of::<TimeConfig>(),
                "provide_clock",
                Vec::new(),
                Some(TypeInfo::of::<Clock>()),
            )
            .with_marker(Marker::new(markers::PROVIDER).with_attribute(attributes::SINGLETON, true))
            .with_invoker(Arc::new(|t, _args| {
                PROVIDER_CALLS.fetch_add(1, Ordering::SeqCst);
                let config = target::<TimeConfig>(t)?;
                Ok(Some(instance(config.clock.clone())))
            })),
        )
}

fn greeter_descriptor() -> TypeDescriptor {
    TypeDescriptor::of::<Greeter>()
        .with_kind(TypeKind::Abstract)
        .with_marker(Marker::new(markers::DELEGATE))
        .with_method(
            MethodDescriptor::new(
                TypeInfo::of::<Greeter>(),
                "greet",
                Vec::new(),
                Some(TypeInfo::of::<String>()),
            )
            .with_invoker(Arc::new(|t, _args| {
                target::<ConsoleGreeter>(t)?;
                Ok(Some(instance("来自控制台的问候".to_string())))
            })),
        )
}

fn host_descriptor() -> TypeDescriptor {
    TypeDescriptor::of::<Host>()
        .with_marker(Marker::new(markers::COMPONENT))
        .with_supertype(TypeInfo::of::<Greeter>())
        .with_constructor(ConstructorDescriptor::bound(
            TypeInfo::of::<Host>(),
            Vec::new(),
            Arc::new(|_args| Ok(instance(Host))),
        ))
}

fn boot_watcher_descriptor() -> TypeDescriptor {
    TypeDescriptor::of::<BootWatcher>()
        .with_marker(Marker::new(markers::COMPONENT))
        .with_supertype(TypeInfo::of::<ObservesLifecycle>())
        .with_constructor(ConstructorDescriptor::bound(
            TypeInfo::of::<BootWatcher>(),
            Vec::new(),
            Arc::new(|_args| Ok(instance(BootWatcher))),
        ))
        .with_method(
            MethodDescriptor::new(TypeInfo::of::<BootWatcher>(), "on_started", Vec::new(), None)
                .with_marker(Marker::new(markers::ON_STARTED))
                .with_invoker(Arc::new(|_t, _args| {
                    WATCHER_STARTED.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                })),
        )
}

fn full_introspector() -> Arc<InMemoryTypeIntrospector> {
    let introspector = Arc::new(InMemoryTypeIntrospector::new());
    introspector.register(TypeDescriptor::of::<String>().with_default_of::<String>());
    introspector.register(widget_descriptor());
    introspector.register(widget_shop_descriptor());
    introspector.register(time_config_descriptor());
    introspector.register(greeter_descriptor());
    introspector.register(host_descriptor());
    introspector.register(boot_watcher_descriptor());
    introspector.register(
        TypeDescriptor::of::<ConsoleGreeter>().with_constructor(ConstructorDescriptor::bound(
            TypeInfo::of::<ConsoleGreeter>(),
            Vec::new(),
            Arc::new(|_args| Ok(instance(ConsoleGreeter))),
        )),
    );
    introspector.register(
        TypeDescriptor::of::<Experimental>().with_marker(
            Marker::new(markers::COMPONENT)
                .with_attribute(attributes::ACTIVATORS, serde_json::json!(["experimental"])),
        ),
    );
    introspector
}

fn bind_widget(runtime: &ComponentRuntime) {
    runtime.context().hierarchy().bind(
        ComponentKey::for_type::<Widget>(),
        0,
        BindingProvider::ConstructorBound {
            target: TypeInfo::of::<Widget>(),
        },
    );
}

fn bind_greeter(runtime: &ComponentRuntime) {
    runtime.context().hierarchy().bind(
        ComponentKey::for_type::<Greeter>(),
        0,
        BindingProvider::ConstructorBound {
            target: TypeInfo::of::<ConsoleGreeter>(),
        },
    );
}

fn bind_label(runtime: &ComponentRuntime) {
    runtime.context().hierarchy().bind(
        ComponentKey::for_type::<String>(),
        0,
        BindingProvider::Instance(instance("声波工坊".to_string())),
    );
}

/// 绑定在启动前完成的标准运行时
async fn standard_runtime() -> ComponentRuntime {
    let runtime = RuntimeBuilder::new()
        .with_introspector(full_introspector())
        .with_standard_processors()
        .add_scan_root("integration_test")
        .build()
        .unwrap();
    bind_widget(&runtime);
    bind_greeter(&runtime);
    bind_label(&runtime);
    runtime.start().await.unwrap();
    runtime
}

#[tokio::test]
async fn register_is_idempotent_and_unique_by_type() {
    let runtime = standard_runtime().await;
    let registry = runtime.context().registry();

    let first = registry.register("integration_test").unwrap();
    let second = registry.register("integration_test").unwrap();
    assert_eq!(first, second);

    let shops = registry
        .containers()
        .into_iter()
        .filter(|container| container.type_info() == &TypeInfo::of::<WidgetShop>())
        .count();
    assert_eq!(shops, 1);
}

#[tokio::test]
async fn inactive_activator_excludes_component() {
    let runtime = standard_runtime().await;
    let registry = runtime.context().registry();

    assert!(registry.container(&TypeInfo::of::<Experimental>()).is_none());

    let activated = RuntimeBuilder::new()
        .with_activator("experimental")
        .with_introspector(full_introspector())
        .with_standard_processors()
        .add_scan_root("integration_test")
        .build()
        .unwrap();
    bind_widget(&activated);
    bind_greeter(&activated);
    bind_label(&activated);
    activated.start().await.unwrap();

    assert!(activated
        .context()
        .registry()
        .container(&TypeInfo::of::<Experimental>())
        .is_some());
}

#[tokio::test]
async fn factory_method_builds_populated_and_enabled_widget() -> anyhow::Result<()> {
    let runtime = standard_runtime().await;

    let shop = runtime
        .context()
        .resolve(&ComponentKey::for_type::<WidgetShop>())?;
    let proxy = shop
        .downcast_ref::<ProxyInstance>()
        .expect("抽象工厂组件应当解析为代理实例");

    let result = proxy.invoke_named("make", &[instance(5_i32)])?;
    let widget = result.expect("工厂方法应当产出产品");
    let widget = widget.downcast_ref::<Widget>().expect("产品类型应当正确");

    assert_eq!(widget.x, 5);
    // 构造后被递归注入
    assert_eq!(widget.label.read().as_str(), "声波工坊");
    // 构造后被启用
    assert!(widget.enabled.load(Ordering::SeqCst));
    Ok(())
}

#[tokio::test]
async fn factory_binding_is_deterministic() {
    let runtime = standard_runtime().await;
    let factory = runtime.context().factory_context();
    assert_eq!(factory.len(), 1);

    let descriptor = runtime
        .context()
        .introspector()
        .describe(&TypeInfo::of::<WidgetShop>())
        .unwrap();
    let make = descriptor
        .method(&MethodSignature::new("make", vec![TypeInfo::of::<i32>()]))
        .unwrap();

    let first = factory.get(&make).unwrap();
    let second = factory.get(&make).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.declaring_type, TypeInfo::of::<Widget>());
}

#[tokio::test]
async fn unmatched_factory_signature_aborts_bootstrap() {
    // Widget 绑定缺失: 工厂键没有构造函数绑定的提供者
    let runtime = RuntimeBuilder::new()
        .with_introspector(full_introspector())
        .with_standard_processors()
        .add_scan_root("integration_test")
        .build()
        .unwrap();
    bind_greeter(&runtime);
    bind_label(&runtime);

    let result = runtime.start().await;
    assert!(result.is_err(), "缺失工厂绑定应当以绑定错误终止启动");
}

#[tokio::test]
async fn delegated_method_matches_direct_parent_call() -> anyhow::Result<()> {
    let runtime = standard_runtime().await;

    let host = runtime.context().resolve(&ComponentKey::for_type::<Host>())?;
    let proxy = host.downcast_ref::<ProxyInstance>().expect("宿主应当被代理");

    let via_proxy = proxy
        .invoke(&MethodSignature::new("greet", Vec::new()), &[])?
        .expect("委托调用应当有产出");

    // 直接在上下文解析出的父实例上调用
    let parent = runtime
        .context()
        .resolve(&ComponentKey::for_type::<Greeter>())?;
    let greet = runtime
        .context()
        .introspector()
        .describe(&TypeInfo::of::<Greeter>())
        .unwrap()
        .method(&MethodSignature::new("greet", Vec::new()))
        .unwrap();
    let direct = greet.invoker.as_ref().unwrap()(Some(&parent), &[])?.unwrap();

    assert_eq!(
        via_proxy.downcast_ref::<String>(),
        direct.downcast_ref::<String>()
    );
    Ok(())
}

#[tokio::test]
async fn singleton_provider_method_is_invoked_once() {
    PROVIDER_CALLS.store(0, Ordering::SeqCst);
    let runtime = standard_runtime().await;

    let first = runtime
        .context()
        .resolve(&ComponentKey::for_type::<Clock>())
        .unwrap();
    let second = runtime
        .context()
        .resolve(&ComponentKey::for_type::<Clock>())
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(PROVIDER_CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(first.downcast_ref::<Clock>().unwrap().tick, 42);
}

#[tokio::test]
async fn lifecycle_observer_receives_start_notification() {
    WATCHER_STARTED.store(0, Ordering::SeqCst);

    let runtime = RuntimeBuilder::new()
        .with_activator(activators::BOOTSTRAP)
        .with_introspector(full_introspector())
        .with_standard_processors()
        .add_scan_root("integration_test")
        .build()
        .unwrap();
    bind_widget(&runtime);
    bind_greeter(&runtime);
    bind_label(&runtime);
    runtime.start().await.unwrap();

    assert_eq!(WATCHER_STARTED.load(Ordering::SeqCst), 1);
    assert_eq!(runtime.context().lifecycle().observers().len(), 1);

    runtime.stop().await.unwrap();
}

/// 阶段二处理器: 记录最终实例并在 greet 上追加两个 Before 回调
struct WrapperOrderProcessor {
    seen: Arc<Mutex<Vec<&'static str>>>,
    observed: Arc<Mutex<Option<component_common::Instance>>>,
}

impl ComponentProcessor for WrapperOrderProcessor {
    fn name(&self) -> &str {
        "WrapperOrderProcessor"
    }
    fn activator(&self) -> component_common::ActivatorKey {
        component_common::ActivatorKey::from(activators::PROXIES)
    }
    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::Late
    }
}

impl ModifierPostProcessor for WrapperOrderProcessor {
    fn preconditions(&self, _ctx: &dyn ProcessingContext, pass: &ProcessingPass) -> bool {
        pass.existing_handler().is_some()
            && pass.container().type_info() == &TypeInfo::of::<Host>()
    }

    fn process(
        &self,
        _ctx: &dyn ProcessingContext,
        pass: &ProcessingPass,
    ) -> component_common::ProcessingResult<()> {
        *self.observed.lock() = pass.instance().cloned();

        let handler = pass.existing_handler().unwrap();
        let greet = handler
            .method(&MethodSignature::new("greet", Vec::new()))
            .unwrap();

        let seen = self.seen.clone();
        handler.wrapper(WrapperPhase::Before, &greet, Arc::new(move |_cx| {
            seen.lock().push("w1");
        }));
        let seen = self.seen.clone();
        handler.wrapper(WrapperPhase::Before, &greet, Arc::new(move |_cx| {
            seen.lock().push("w2");
        }));
        Ok(())
    }
}

#[tokio::test]
async fn wrappers_compose_in_order_and_phase_two_preserves_identity() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let observed = Arc::new(Mutex::new(None));

    let runtime = RuntimeBuilder::new()
        .with_introspector(full_introspector())
        .with_standard_processors()
        .with_modifier_processor(Arc::new(WrapperOrderProcessor {
            seen: seen.clone(),
            observed: observed.clone(),
        }))
        .add_scan_root("integration_test")
        .build()
        .unwrap();
    bind_widget(&runtime);
    bind_greeter(&runtime);
    bind_label(&runtime);
    runtime.start().await.unwrap();

    let host = runtime
        .context()
        .resolve(&ComponentKey::for_type::<Host>())
        .unwrap();

    // 阶段二观察到的实例与最终返回的实例是同一个对象
    let during_phase_two = observed.lock().clone().unwrap();
    assert!(Arc::ptr_eq(&during_phase_two, &host));

    let proxy = host.downcast_ref::<ProxyInstance>().unwrap();
    proxy
        .invoke(&MethodSignature::new("greet", Vec::new()), &[])
        .unwrap();
    assert_eq!(seen.lock().as_slice(), &["w1", "w2"]);
}

#[tokio::test]
async fn unregistered_type_resolution_is_an_error() {
    #[derive(Debug)]
    struct Stranger;

    let runtime = standard_runtime().await;
    let result = runtime
        .context()
        .resolve(&ComponentKey::for_type::<Stranger>());
    assert!(result.is_err());
}
