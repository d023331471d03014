//! 处理管线执行器
//!
//! 按"阶段一 -> 代理完成 -> 阶段二"的固定次序对组件执行全部已注册的
//! 处理器，同一阶段内按声明级别排序，级别相同按注册顺序。阶段二的
//! 契约在类型上不允许替换实例。

use component_common::{
    ComponentKey, Instance, ProcessingError, ProcessingResult,
};
use processing_abstractions::{
    ComponentPreProcessor, ComponentProcessor, InstancePostProcessor, ModifierPostProcessor,
    ProcessingContext, ProcessingOrder, ProcessingPass, ProcessingPhase,
};
use std::sync::Arc;
use tracing::{debug, warn};

struct Registered<P> {
    sequence: usize,
    processor: P,
}

/// 处理管线执行器
#[derive(Default)]
pub struct ProcessingPipeline {
    pre: Vec<Registered<Arc<dyn ComponentPreProcessor>>>,
    instance_phase: Vec<Registered<Arc<dyn InstancePostProcessor>>>,
    modifier_phase: Vec<Registered<Arc<dyn ModifierPostProcessor>>>,
    sequence: usize,
}

impl ProcessingPipeline {
    /// 创建新的处理管线
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册预处理器
    pub fn register_pre_processor(&mut self, processor: Arc<dyn ComponentPreProcessor>) {
        debug!("注册预处理器: {}, 顺序: {}", processor.name(), processor.order());
        self.sequence += 1;
        self.pre.push(Registered {
            sequence: self.sequence,
            processor,
        });
    }

    /// 注册阶段一后处理器
    ///
    /// 声明顺序必须位于阶段一
    pub fn register_instance_processor(
        &mut self,
        processor: Arc<dyn InstancePostProcessor>,
    ) -> ProcessingResult<()> {
        Self::require_phase(processor.as_ref(), ProcessingPhase::One)?;
        debug!("注册阶段一后处理器: {}, 顺序: {}", processor.name(), processor.order());
        self.sequence += 1;
        self.instance_phase.push(Registered {
            sequence: self.sequence,
            processor,
        });
        Ok(())
    }

    /// 注册阶段二后处理器
    ///
    /// 声明顺序必须位于阶段二
    pub fn register_modifier_processor(
        &mut self,
        processor: Arc<dyn ModifierPostProcessor>,
    ) -> ProcessingResult<()> {
        Self::require_phase(processor.as_ref(), ProcessingPhase::Two)?;
        debug!("注册阶段二后处理器: {}, 顺序: {}", processor.name(), processor.order());
        self.sequence += 1;
        self.modifier_phase.push(Registered {
            sequence: self.sequence,
            processor,
        });
        Ok(())
    }

    fn require_phase(processor: &dyn ComponentProcessor, phase: ProcessingPhase) -> ProcessingResult<()> {
        if processor.order().phase() == phase {
            Ok(())
        } else {
            Err(ProcessingError::PhaseMismatch {
                processor: processor.name().to_string(),
                order: processor.order().to_string(),
            })
        }
    }

    fn ordered<P: Clone>(registered: &[Registered<P>], order_of: impl Fn(&P) -> ProcessingOrder) -> Vec<P> {
        let mut entries: Vec<(&Registered<P>, ProcessingOrder)> = registered
            .iter()
            .map(|entry| (entry, order_of(&entry.processor)))
            .collect();
        entries.sort_by_key(|(entry, order)| (*order, entry.sequence));
        entries
            .into_iter()
            .map(|(entry, _)| entry.processor.clone())
            .collect()
    }

    /// 对组件类型执行全部预处理器
    pub fn process_type(
        &self,
        ctx: &dyn ProcessingContext,
        container: &component_common::ComponentContainer,
    ) -> ProcessingResult<()> {
        for processor in Self::ordered(&self.pre, |p| p.order()) {
            if !ctx.has_activator(&processor.activator()) {
                debug!("激活器未激活, 跳过预处理器: {}", processor.name());
                continue;
            }
            if !processor.preconditions(ctx, container) {
                debug!(
                    "前置条件不满足, 跳过预处理器: {}, 组件: {}",
                    processor.name(),
                    container.type_info().name
                );
                continue;
            }

            match processor.process(ctx, container) {
                Ok(()) => {}
                Err(ProcessingError::Binding { source }) if !processor.fail_on_precondition() => {
                    warn!(
                        "绑定步骤未完成, 按处理器策略跳过: {}, 组件: {}, 原因: {}",
                        processor.name(),
                        container.type_info().name,
                        source
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// 对组件实例化过程执行全部后处理器
    ///
    /// 阶段一可替换实例；阶段边界完成共享代理句柄；阶段二只做修饰
    pub fn process_instance(
        &self,
        ctx: &dyn ProcessingContext,
        key: &ComponentKey,
        instance: Option<Instance>,
    ) -> ProcessingResult<Instance> {
        let container = ctx.registry().container(&key.type_info).ok_or_else(|| {
            ProcessingError::ComponentNotRegistered {
                key: key.to_string(),
            }
        })?;

        if !container.permits_processing() {
            debug!("组件禁止处理, 原样返回实例: {}", key);
            return instance.ok_or_else(|| ProcessingError::NoInstanceProduced {
                key: key.to_string(),
            });
        }

        let mut pass = ProcessingPass::new(key.clone(), container, instance);

        // 阶段一: 实例可被替换
        for processor in Self::ordered(&self.instance_phase, |p| p.order()) {
            if !ctx.has_activator(&processor.activator()) {
                debug!("激活器未激活, 跳过后处理器: {}", processor.name());
                continue;
            }
            if !processor.preconditions(ctx, &pass) {
                debug!("前置条件不满足, 跳过后处理器: {}, 组件: {}", processor.name(), key);
                continue;
            }

            match processor.process(ctx, &mut pass) {
                Ok(Some(replacement)) => {
                    debug!("阶段一处理器替换实例: {}, 组件: {}", processor.name(), key);
                    pass.replace_instance(replacement);
                }
                Ok(None) => {}
                Err(ProcessingError::Binding { source }) if !processor.fail_on_precondition() => {
                    warn!(
                        "绑定步骤未完成, 按处理器策略跳过: {}, 组件: {}, 原因: {}",
                        processor.name(),
                        key,
                        source
                    );
                }
                Err(e) => return Err(e),
            }
        }

        // 阶段边界: 共享代理句柄存在时恰好完成一次
        if let Some(handler) = pass.existing_handler().cloned() {
            let finalized = handler
                .proxy(pass.instance().cloned())
                .map_err(ProcessingError::from)?;
            pass.replace_instance(finalized);
        }

        // 阶段二: 实例身份保持不变
        for processor in Self::ordered(&self.modifier_phase, |p| p.order()) {
            if !ctx.has_activator(&processor.activator()) {
                debug!("激活器未激活, 跳过后处理器: {}", processor.name());
                continue;
            }
            if !processor.preconditions(ctx, &pass) {
                debug!("前置条件不满足, 跳过后处理器: {}, 组件: {}", processor.name(), key);
                continue;
            }

            match processor.process(ctx, &pass) {
                Ok(()) => {}
                Err(ProcessingError::Binding { source }) if !processor.fail_on_precondition() => {
                    warn!(
                        "绑定步骤未完成, 按处理器策略跳过: {}, 组件: {}, 原因: {}",
                        processor.name(),
                        key,
                        source
                    );
                }
                Err(e) => return Err(e),
            }
        }

        pass.instance()
            .cloned()
            .ok_or_else(|| ProcessingError::NoInstanceProduced {
                key: key.to_string(),
            })
    }
}

impl std::fmt::Debug for ProcessingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingPipeline")
            .field("pre", &self.pre.len())
            .field("instance_phase", &self.instance_phase.len())
            .field("modifier_phase", &self.modifier_phase.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;
    use component_common::{
        instance, markers, ActivatorKey, BindingError, Marker, TypeDescriptor, TypeInfo,
    };
    use parking_lot::Mutex;
    use processing_abstractions::ComponentRegistry;

    #[derive(Debug)]
    struct Sample;

    fn context_with_sample() -> TestContext {
        let ctx = TestContext::standard();
        ctx.introspector
            .register(TypeDescriptor::of::<Sample>().with_marker(Marker::new(markers::COMPONENT)));
        ctx.registry.register("processing_impl").unwrap();
        ctx
    }

    struct RecordingPre {
        label: &'static str,
        order: ProcessingOrder,
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ComponentProcessor for RecordingPre {
        fn name(&self) -> &str {
            self.label
        }
        fn activator(&self) -> ActivatorKey {
            ActivatorKey::from(component_common::activators::FACTORIES)
        }
        fn order(&self) -> ProcessingOrder {
            self.order
        }
    }

    impl ComponentPreProcessor for RecordingPre {
        fn process(
            &self,
            _ctx: &dyn ProcessingContext,
            _container: &component_common::ComponentContainer,
        ) -> ProcessingResult<()> {
            self.seen.lock().push(self.label);
            Ok(())
        }
    }

    struct Replacer {
        order: ProcessingOrder,
    }

    impl ComponentProcessor for Replacer {
        fn name(&self) -> &str {
            "Replacer"
        }
        fn activator(&self) -> ActivatorKey {
            ActivatorKey::from(component_common::activators::FACTORIES)
        }
        fn order(&self) -> ProcessingOrder {
            self.order
        }
    }

    impl InstancePostProcessor for Replacer {
        fn process(
            &self,
            _ctx: &dyn ProcessingContext,
            _pass: &mut ProcessingPass,
        ) -> ProcessingResult<Option<Instance>> {
            Ok(Some(instance(Sample)))
        }
    }

    struct IdentityWatcher {
        observed: Arc<Mutex<Option<Instance>>>,
    }

    impl ComponentProcessor for IdentityWatcher {
        fn name(&self) -> &str {
            "IdentityWatcher"
        }
        fn activator(&self) -> ActivatorKey {
            ActivatorKey::from(component_common::activators::FACTORIES)
        }
        fn order(&self) -> ProcessingOrder {
            ProcessingOrder::Normal
        }
    }

    impl ModifierPostProcessor for IdentityWatcher {
        fn process(&self, _ctx: &dyn ProcessingContext, pass: &ProcessingPass) -> ProcessingResult<()> {
            *self.observed.lock() = pass.instance().cloned();
            Ok(())
        }
    }

    struct LenientBinder;

    impl ComponentProcessor for LenientBinder {
        fn name(&self) -> &str {
            "LenientBinder"
        }
        fn activator(&self) -> ActivatorKey {
            ActivatorKey::from(component_common::activators::FACTORIES)
        }
        fn order(&self) -> ProcessingOrder {
            ProcessingOrder::First
        }
        fn fail_on_precondition(&self) -> bool {
            false
        }
    }

    impl ComponentPreProcessor for LenientBinder {
        fn process(
            &self,
            _ctx: &dyn ProcessingContext,
            _container: &component_common::ComponentContainer,
        ) -> ProcessingResult<()> {
            Err(ProcessingError::Binding {
                source: BindingError::DelegationTargetMissing {
                    parent: "Greeter".to_string(),
                    method: "greet".to_string(),
                },
            })
        }
    }

    #[test]
    fn registration_validates_declared_phase() {
        let mut pipeline = ProcessingPipeline::new();

        let wrong_phase = Arc::new(Replacer {
            order: ProcessingOrder::Normal,
        });
        assert!(matches!(
            pipeline.register_instance_processor(wrong_phase),
            Err(ProcessingError::PhaseMismatch { .. })
        ));

        let right_phase = Arc::new(Replacer {
            order: ProcessingOrder::First,
        });
        assert!(pipeline.register_instance_processor(right_phase).is_ok());
    }

    #[test]
    fn pre_processors_run_in_declared_order() {
        let ctx = context_with_sample();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut pipeline = ProcessingPipeline::new();
        for (label, order) in [
            ("late", ProcessingOrder::Late),
            ("first", ProcessingOrder::First),
            ("normal-1", ProcessingOrder::Normal),
            ("normal-2", ProcessingOrder::Normal),
        ] {
            pipeline.register_pre_processor(Arc::new(RecordingPre {
                label,
                order,
                seen: seen.clone(),
            }));
        }

        let container = ctx.registry.container(&TypeInfo::of::<Sample>()).unwrap();
        pipeline.process_type(&ctx, &container).unwrap();

        assert_eq!(seen.lock().as_slice(), &["first", "normal-1", "normal-2", "late"]);
    }

    #[test]
    fn unknown_component_is_rejected() {
        struct Unregistered;

        let ctx = context_with_sample();
        let pipeline = ProcessingPipeline::new();

        let result = pipeline.process_instance(
            &ctx,
            &ComponentKey::for_type::<Unregistered>(),
            Some(instance(Sample)),
        );
        assert!(matches!(
            result,
            Err(ProcessingError::ComponentNotRegistered { .. })
        ));
    }

    #[test]
    fn phase_one_may_replace_and_phase_two_preserves_identity() {
        let ctx = context_with_sample();
        let observed = Arc::new(Mutex::new(None));

        let mut pipeline = ProcessingPipeline::new();
        pipeline
            .register_instance_processor(Arc::new(Replacer {
                order: ProcessingOrder::First,
            }))
            .unwrap();
        pipeline
            .register_modifier_processor(Arc::new(IdentityWatcher {
                observed: observed.clone(),
            }))
            .unwrap();

        let original = instance(Sample);
        let processed = pipeline
            .process_instance(&ctx, &ComponentKey::for_type::<Sample>(), Some(original.clone()))
            .unwrap();

        // 阶段一替换了实例
        assert!(!Arc::ptr_eq(&processed, &original));
        // 阶段二观察到的实例与最终返回的实例是同一个对象
        let seen = observed.lock().clone().unwrap();
        assert!(Arc::ptr_eq(&seen, &processed));
    }

    #[test]
    fn lenient_binding_failures_are_skipped() {
        let ctx = context_with_sample();
        let mut pipeline = ProcessingPipeline::new();
        pipeline.register_pre_processor(Arc::new(LenientBinder));

        let container = ctx.registry.container(&TypeInfo::of::<Sample>()).unwrap();
        assert!(pipeline.process_type(&ctx, &container).is_ok());
    }

    #[test]
    fn processing_can_be_disabled_per_component() {
        let ctx = TestContext::standard();
        ctx.introspector.register(
            TypeDescriptor::of::<Sample>().with_marker(
                Marker::new(markers::COMPONENT)
                    .with_attribute(component_common::attributes::PERMITS_PROCESSING, false),
            ),
        );
        ctx.registry.register("processing_impl").unwrap();

        let mut pipeline = ProcessingPipeline::new();
        pipeline
            .register_instance_processor(Arc::new(Replacer {
                order: ProcessingOrder::First,
            }))
            .unwrap();

        let original = instance(Sample);
        let processed = pipeline
            .process_instance(&ctx, &ComponentKey::for_type::<Sample>(), Some(original.clone()))
            .unwrap();
        assert!(Arc::ptr_eq(&processed, &original));
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let ctx = context_with_sample();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut pipeline = ProcessingPipeline::new();
        for (label, order) in [
            ("b", ProcessingOrder::Early),
            ("a", ProcessingOrder::First),
        ] {
            pipeline.register_pre_processor(Arc::new(RecordingPre {
                label,
                order,
                seen: seen.clone(),
            }));
        }

        let container = ctx.registry.container(&TypeInfo::of::<Sample>()).unwrap();
        pipeline.process_type(&ctx, &container).unwrap();
        pipeline.process_type(&ctx, &container).unwrap();

        assert_eq!(seen.lock().as_slice(), &["a", "b", "a", "b"]);
    }
}
