//! Method wrapping and dispatch

use crate::registry::METHOD_REGISTRY;
use bridge_traits::error::Result as SdkResult;
use bridge_traits::{
    BackendSdk, CallContext, CallError, CallResult, Dispatch, EntityType, Invocation, MethodCall,
    MethodKind, MethodTable, NativeFuture, NativeMethod, Payload, Receiver, SdkError,
};
use core_interceptor::InterceptorChain;
use core_promise::HostRuntime;
use core_runtime::{Error, FeatureFlags, Result};
use futures::future::{self, BoxFuture, FutureExt, TryFutureExt};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Wrapped slots of one entity/kind, by method name.
pub type PatchedSlots = HashMap<String, PatchedMethod>;

/// A typed, already-dispatched call.
pub type CallFuture<T> = BoxFuture<'static, CallResult<T>>;

/// A wrapped SDK method. Owns the original, which nothing else can reach.
#[derive(Clone)]
pub struct PatchedMethod {
    label: String,
    original: NativeMethod,
}

impl PatchedMethod {
    pub fn label(&self) -> &str {
        &self.label
    }

    fn invoke_original(
        &self,
        ctx: &CallContext,
        receiver: Receiver,
        args: Vec<Payload>,
    ) -> NativeFuture {
        match (self.original)(ctx, receiver, args) {
            Ok(native) => native,
            Err(error) => {
                debug!(method = %self.label, code = error.code, "Method failed synchronously");
                future::err(error).boxed()
            }
        }
    }

    fn call(
        &self,
        ctx: &CallContext,
        receiver: Receiver,
        args: Vec<Payload>,
        host: &HostRuntime,
        chain: &Arc<InterceptorChain>,
    ) -> Invocation {
        if ctx.is_internal() {
            return Invocation::Native(self.invoke_original(ctx, receiver, args));
        }

        let native = {
            let internal = ctx.to_internal();
            self.invoke_original(&internal, receiver.clone(), args)
        };
        let promise = host.adapt(native.map_err(CallError::from));
        Invocation::Bridged(chain.run(receiver, promise))
    }
}

impl fmt::Debug for PatchedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchedMethod")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Wrap each named slot.
///
/// `label` is the owner as reported in errors: `"User"` for statics,
/// `"User.prototype"` for instance methods.
///
/// # Errors
///
/// [`Error::MissingMethod`] for the first name `slots` does not contain.
pub fn patch_methods(
    slots: &HashMap<String, NativeMethod>,
    names: &[&str],
    label: &str,
) -> Result<PatchedSlots> {
    names
        .iter()
        .map(|name| -> Result<(String, PatchedMethod)> {
            let original = slots.get(*name).ok_or_else(|| Error::MissingMethod {
                target: label.to_string(),
                method: name.to_string(),
            })?;
            let method = PatchedMethod {
                label: format!("{label}.{name}"),
                original: Arc::clone(original),
            };
            Ok((name.to_string(), method))
        })
        .collect()
}

fn owner_label(entity: EntityType, kind: MethodKind) -> String {
    match kind {
        MethodKind::Static => entity.name().to_string(),
        MethodKind::Instance => format!("{entity}.prototype"),
    }
}

/// The SDK as seen through the bridge.
///
/// Registered methods are wrapped; anything else in the SDK's tables is
/// reachable unwrapped. The SDK itself is never modified.
pub struct PatchedSdk {
    sdk: Arc<dyn BackendSdk>,
    tables: HashMap<EntityType, MethodTable>,
    patched: HashMap<(EntityType, MethodKind), PatchedSlots>,
    host: HostRuntime,
    chain: Arc<InterceptorChain>,
    trace_calls: bool,
}

impl PatchedSdk {
    /// Wrap every registered method.
    ///
    /// # Errors
    ///
    /// [`Error::MissingEntity`] or [`Error::MissingMethod`] when the SDK does
    /// not provide part of the registered surface.
    pub fn patch(
        sdk: Arc<dyn BackendSdk>,
        chain: Arc<InterceptorChain>,
        host: HostRuntime,
    ) -> Result<Arc<Self>> {
        Self::patch_with_flags(sdk, chain, host, FeatureFlags::default())
    }

    pub fn patch_with_flags(
        sdk: Arc<dyn BackendSdk>,
        chain: Arc<InterceptorChain>,
        host: HostRuntime,
        features: FeatureFlags,
    ) -> Result<Arc<Self>> {
        let mut tables = HashMap::new();
        let mut patched = HashMap::new();

        for set in METHOD_REGISTRY {
            let table = sdk
                .method_table(set.entity)
                .ok_or_else(|| Error::MissingEntity {
                    entity: set.entity.name().to_string(),
                })?;
            for kind in [MethodKind::Static, MethodKind::Instance] {
                let slots = patch_methods(
                    table.slots(kind),
                    set.names(kind),
                    &owner_label(set.entity, kind),
                )?;
                patched.insert((set.entity, kind), slots);
            }
            tables.insert(set.entity, table);
        }

        debug!(
            methods = patched.values().map(HashMap::len).sum::<usize>(),
            "Patched SDK methods"
        );

        Ok(Arc::new(Self {
            sdk,
            tables,
            patched,
            host,
            chain,
            trace_calls: features.trace_calls,
        }))
    }

    pub fn sdk(&self) -> &Arc<dyn BackendSdk> {
        &self.sdk
    }

    pub fn chain(&self) -> &Arc<InterceptorChain> {
        &self.chain
    }

    pub fn host(&self) -> &HostRuntime {
        &self.host
    }

    pub fn is_patched(&self, entity: EntityType, kind: MethodKind, method: &str) -> bool {
        self.patched
            .get(&(entity, kind))
            .is_some_and(|slots| slots.contains_key(method))
    }

    /// Labels of every wrapped method, sorted.
    pub fn patched_methods(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .patched
            .values()
            .flat_map(|slots| slots.values().map(|m| m.label.clone()))
            .collect();
        labels.sort();
        labels
    }

    /// The context host code calls through.
    pub fn context(self: &Arc<Self>) -> CallContext {
        let dispatch: Arc<dyn Dispatch> = self.clone();
        CallContext::outer(dispatch)
    }

    /// Make an outer call.
    pub fn call(self: &Arc<Self>, call: MethodCall) -> Invocation {
        self.context().invoke(call)
    }

    /// Make an outer call and convert the resolved payload.
    pub fn call_as<T: Send + 'static>(
        self: &Arc<Self>,
        call: MethodCall,
        convert: fn(Payload) -> SdkResult<T>,
    ) -> CallFuture<T> {
        self.call(call)
            .map(move |result| result.and_then(|payload| convert(payload).map_err(CallError::from)))
            .boxed()
    }

    fn unpatched(&self, ctx: &CallContext, call: MethodCall) -> Invocation {
        let original = self
            .tables
            .get(&call.entity)
            .and_then(|table| table.method(call.kind, &call.method));
        let native = match original {
            Some(original) => match original(ctx, call.receiver, call.args) {
                Ok(native) => native,
                Err(error) => future::err(error).boxed(),
            },
            None => future::err(SdkError::other(format!("{} does not exist", call.label()))).boxed(),
        };
        Invocation::Native(native)
    }
}

impl Dispatch for PatchedSdk {
    fn dispatch(&self, ctx: &CallContext, call: MethodCall) -> Invocation {
        let method = self
            .patched
            .get(&(call.entity, call.kind))
            .and_then(|slots| slots.get(&call.method));

        let Some(method) = method else {
            if self.trace_calls {
                debug!(target_method = %call.label(), bridged = false, "Unwrapped call");
            }
            return self.unpatched(ctx, call);
        };

        if self.trace_calls {
            debug!(
                entity = %call.entity,
                method = %method.label,
                bridged = !ctx.is_internal(),
                "Wrapped call"
            );
        }
        method.call(ctx, call.receiver, call.args, &self.host, &self.chain)
    }
}

impl fmt::Debug for PatchedSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchedSdk")
            .field("methods", &self.patched_methods().len())
            .field("chain", &self.chain)
            .field("trace_calls", &self.trace_calls)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_local::{CountingDigest, MemoryBackend, TokioTaskSpawner};
    use bridge_traits::{DispatchMode, SdkObject, TaskSpawner};
    use core_interceptor::Interceptor;
    use mockall::mock;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Provides every registered method, minus the ones listed in `skip`.
    struct StubSdk {
        skip: Vec<(EntityType, MethodKind, &'static str)>,
        drop_entity: Option<EntityType>,
    }

    impl StubSdk {
        fn complete() -> Self {
            Self {
                skip: Vec::new(),
                drop_entity: None,
            }
        }
    }

    impl BackendSdk for StubSdk {
        fn initialize(&self, _args: &[Value]) -> SdkResult<()> {
            Ok(())
        }

        fn method_table(&self, entity: EntityType) -> Option<MethodTable> {
            if self.drop_entity == Some(entity) {
                return None;
            }
            let set = METHOD_REGISTRY.iter().find(|set| set.entity == entity)?;
            let mut table = MethodTable::new();
            for kind in [MethodKind::Static, MethodKind::Instance] {
                for name in set.names(kind) {
                    if self.skip.contains(&(entity, kind, *name)) {
                        continue;
                    }
                    let method = |_: &CallContext, _: Receiver, _: Vec<Payload>| {
                        Ok(future::ok(Payload::Unit).boxed())
                    };
                    table = match kind {
                        MethodKind::Static => table.with_static(*name, method),
                        MethodKind::Instance => table.with_instance(*name, method),
                    };
                }
            }
            Some(table)
        }
    }

    mock! {
        Spawner {}

        impl TaskSpawner for Spawner {
            fn spawn(&self, task: BoxFuture<'static, ()>);
        }
    }

    fn host() -> (HostRuntime, Arc<CountingDigest>) {
        let digest = Arc::new(CountingDigest::new());
        (
            HostRuntime::new(Arc::new(TokioTaskSpawner::new()), digest.clone()),
            digest,
        )
    }

    fn counting_chain() -> (Arc<InterceptorChain>, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let chain = InterceptorChain::from_interceptors([Interceptor::new("count").on_success(
            move |value| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok(value) }
            },
        )]);
        (Arc::new(chain), runs)
    }

    #[test]
    fn test_patch_wraps_whole_registry() {
        let (host, _) = host();
        let patched = PatchedSdk::patch(
            Arc::new(StubSdk::complete()),
            Arc::new(InterceptorChain::empty()),
            host,
        )
        .unwrap();

        let labels = patched.patched_methods();
        assert_eq!(labels.len(), 28);
        assert!(labels.contains(&"User.become".to_string()));
        assert!(labels.contains(&"Query.prototype.find".to_string()));
        assert!(patched.is_patched(EntityType::File, MethodKind::Instance, "save"));
    }

    #[test]
    fn test_missing_static_method_fails_setup() {
        let sdk = StubSdk {
            skip: vec![(EntityType::Object, MethodKind::Static, "fetch_all")],
            drop_entity: None,
        };
        let (host, _) = host();
        let err = PatchedSdk::patch(Arc::new(sdk), Arc::new(InterceptorChain::empty()), host)
            .unwrap_err();
        assert_eq!(err.to_string(), "Object.fetch_all does not exist, patching failed!");
    }

    #[test]
    fn test_missing_instance_method_fails_setup() {
        let sdk = StubSdk {
            skip: vec![(EntityType::Query, MethodKind::Instance, "count")],
            drop_entity: None,
        };
        let (host, _) = host();
        let err = PatchedSdk::patch(Arc::new(sdk), Arc::new(InterceptorChain::empty()), host)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingMethod { ref target, ref method }
                if target == "Query.prototype" && method == "count"
        ));
    }

    #[test]
    fn test_missing_entity_fails_setup() {
        let sdk = StubSdk {
            skip: Vec::new(),
            drop_entity: Some(EntityType::Push),
        };
        let (host, _) = host();
        let err = PatchedSdk::patch(Arc::new(sdk), Arc::new(InterceptorChain::empty()), host)
            .unwrap_err();
        assert_eq!(err.to_string(), "Push does not exist, patching failed!");
    }

    #[test]
    fn test_patch_methods_labels() {
        let table =
            MethodTable::new().with_static("run", |_, _, _| Ok(future::ok(Payload::Unit).boxed()));
        let slots = patch_methods(table.slots(MethodKind::Static), &["run"], "Cloud").unwrap();
        assert_eq!(slots["run"].label(), "Cloud.run");

        let err = patch_methods(table.slots(MethodKind::Static), &["run", "nope"], "Cloud")
            .unwrap_err();
        assert!(matches!(err, Error::MissingMethod { .. }));
    }

    #[core_async::test]
    async fn test_context_dispatches_outer_calls_through_patched_sdk() {
        let (host, digest) = host();
        let (chain, runs) = counting_chain();
        let patched = PatchedSdk::patch(Arc::new(MemoryBackend::new()), chain, host).unwrap();

        let context = patched.context();
        assert_eq!(context.mode(), DispatchMode::Outer);
        assert!(!context.is_internal());

        let invocation = context.invoke(MethodCall::on_class(EntityType::Config, "get", vec![]));
        assert!(invocation.is_bridged());
        invocation.await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(digest.count(), 1);
    }

    #[core_async::test]
    async fn test_outer_call_is_bridged_and_intercepted() {
        let (host, digest) = host();
        let (chain, runs) = counting_chain();
        let patched = PatchedSdk::patch(Arc::new(MemoryBackend::new()), chain, host).unwrap();

        let invocation = patched.call(MethodCall::on_class(EntityType::Config, "get", vec![]));
        assert!(invocation.is_bridged());
        invocation.await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(digest.count(), 1);
    }

    #[core_async::test]
    async fn test_internal_context_bypasses_bridge() {
        let (host, digest) = host();
        let (chain, runs) = counting_chain();
        let patched = PatchedSdk::patch(Arc::new(MemoryBackend::new()), chain, host).unwrap();

        let internal = patched.context().to_internal();
        let invocation = internal.invoke(MethodCall::on_class(EntityType::Config, "get", vec![]));
        assert!(!invocation.is_bridged());
        invocation.await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(digest.count(), 0);
    }

    #[core_async::test]
    async fn test_nested_sdk_calls_are_not_rewrapped() {
        let (host, digest) = host();
        let (chain, runs) = counting_chain();
        let backend = MemoryBackend::new();
        let patched = PatchedSdk::patch(Arc::new(backend.clone()), chain, host).unwrap();

        // User.sign_up -> User.prototype.sign_up -> Object.prototype.save
        let user = patched
            .call(MethodCall::on_class(
                EntityType::User,
                "sign_up",
                vec!["ada".into(), "pw".into()],
            ))
            .await
            .unwrap()
            .into_object()
            .unwrap();

        assert!(user.id.is_some());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(digest.count(), 1);
        assert_eq!(backend.object_count("_User").await, 1);
    }

    #[core_async::test]
    async fn test_nested_invocation_is_native() {
        let nested_bridged = Arc::new(AtomicBool::new(true));
        let observed = Arc::clone(&nested_bridged);

        struct Probe {
            observed: Arc<AtomicBool>,
        }

        impl BackendSdk for Probe {
            fn initialize(&self, _args: &[Value]) -> SdkResult<()> {
                Ok(())
            }

            fn method_table(&self, entity: EntityType) -> Option<MethodTable> {
                let mut table = StubSdk::complete().method_table(entity)?;
                if entity == EntityType::Object {
                    let observed = Arc::clone(&self.observed);
                    table = table.with_static("save_all", move |ctx, _, _| {
                        let nested = ctx.invoke(MethodCall::on_instance(
                            EntityType::Object,
                            "save",
                            Receiver::Object(SdkObject::new("Item")),
                            vec![],
                        ));
                        observed.store(nested.is_bridged(), Ordering::SeqCst);
                        Ok(nested.map_err(|e| e.error).boxed())
                    });
                }
                Some(table)
            }
        }

        let (host, _) = host();
        let patched = PatchedSdk::patch(
            Arc::new(Probe { observed }),
            Arc::new(InterceptorChain::empty()),
            host,
        )
        .unwrap();

        patched
            .call(MethodCall::on_class(EntityType::Object, "save_all", vec![]))
            .await
            .unwrap();
        assert!(!nested_bridged.load(Ordering::SeqCst));
    }

    #[core_async::test]
    async fn test_synchronous_failure_enters_error_chain() {
        let (host, digest) = host();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let chain = InterceptorChain::from_interceptors([Interceptor::new("observe").on_error(
            move |err| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Err(err) }
            },
        )]);
        let patched =
            PatchedSdk::patch(Arc::new(MemoryBackend::new()), Arc::new(chain), host).unwrap();

        let err = patched
            .call(MethodCall::on_class(EntityType::Analytics, "track", vec!["".into()]))
            .await
            .unwrap_err();
        assert_eq!(err.object, Some(Receiver::Class(EntityType::Analytics)));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(digest.count(), 1);

        // The failure left no internal state behind
        let next = patched.call(MethodCall::on_class(EntityType::Config, "get", vec![]));
        assert!(next.is_bridged());
        next.await.unwrap();
    }

    #[core_async::test]
    async fn test_spawner_used_once_per_outer_call() {
        let mut spawner = MockSpawner::new();
        spawner.expect_spawn().times(1).returning(|task| {
            core_async::spawn(task);
        });
        let host = HostRuntime::new(Arc::new(spawner), Arc::new(CountingDigest::new()));
        let patched = PatchedSdk::patch(
            Arc::new(MemoryBackend::new()),
            Arc::new(InterceptorChain::empty()),
            host,
        )
        .unwrap();

        patched
            .call(MethodCall::on_class(EntityType::User, "current_async", vec![]))
            .await
            .unwrap();
        patched
            .context()
            .to_internal()
            .invoke(MethodCall::on_class(EntityType::User, "current_async", vec![]))
            .await
            .unwrap();
    }

    #[core_async::test]
    async fn test_unregistered_method_passes_through() {
        let (host, digest) = host();
        let sdk = StubSdk::complete();
        struct Extended(StubSdk);

        impl BackendSdk for Extended {
            fn initialize(&self, args: &[Value]) -> SdkResult<()> {
                self.0.initialize(args)
            }

            fn method_table(&self, entity: EntityType) -> Option<MethodTable> {
                let table = self.0.method_table(entity)?;
                Some(match entity {
                    EntityType::Query => table.with_instance("each", |_, _, _| {
                        Ok(future::ok(Payload::Count(7)).boxed())
                    }),
                    _ => table,
                })
            }
        }

        let patched = PatchedSdk::patch(
            Arc::new(Extended(sdk)),
            Arc::new(InterceptorChain::empty()),
            host,
        )
        .unwrap();

        let invocation = patched.call(MethodCall::on_instance(
            EntityType::Query,
            "each",
            Receiver::Query(bridge_traits::Query::new("Item")),
            vec![],
        ));
        assert!(!invocation.is_bridged());
        assert_eq!(invocation.await.unwrap(), Payload::Count(7));
        assert_eq!(digest.count(), 0);

        let missing = patched
            .call(MethodCall::on_class(EntityType::Cloud, "nope", vec![]))
            .await
            .unwrap_err();
        assert!(missing.message().contains("Cloud.nope does not exist"));
    }

    #[core_async::test]
    async fn test_call_as_reports_payload_mismatch() {
        let (host, _) = host();
        let patched = PatchedSdk::patch(
            Arc::new(MemoryBackend::new()),
            Arc::new(InterceptorChain::empty()),
            host,
        )
        .unwrap();

        let err = patched
            .call_as(
                MethodCall::on_class(EntityType::Config, "get", vec![]),
                Payload::into_count,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), SdkError::OTHER_CAUSE);
    }
}
