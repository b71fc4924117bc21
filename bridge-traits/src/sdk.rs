//! Backend SDK contract
//!
//! The SDK is described by method tables rather than by one Rust trait per
//! entity type. Each [`EntityType`] exposes a [`MethodTable`] of named static
//! and instance methods. This keeps the wrapped surface data-driven: the core
//! checks that every method it intends to wrap is present, wraps each slot,
//! and dispatches by name.
//!
//! ## Re-entrant calls
//!
//! Every native method receives a [`CallContext`]. When an SDK method needs
//! another SDK operation (say `User.sign_up` saving the user object) it calls
//! [`CallContext::invoke`]. The context handed to an original method is
//! always [`DispatchMode::Internal`], so the dispatcher returns the other
//! method's native future unwrapped instead of bridging it a second time.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::error::{CallResult, Result};
use crate::model::{Payload, Receiver};

/// SDK entity types whose methods can be wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    Object,
    Query,
    Cloud,
    User,
    Config,
    File,
    Session,
    Push,
    GeoPoint,
    Analytics,
}

impl EntityType {
    pub const ALL: [EntityType; 10] = [
        EntityType::Object,
        EntityType::Query,
        EntityType::Cloud,
        EntityType::User,
        EntityType::Config,
        EntityType::File,
        EntityType::Session,
        EntityType::Push,
        EntityType::GeoPoint,
        EntityType::Analytics,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::Query => "Query",
            Self::Cloud => "Cloud",
            Self::User => "User",
            Self::Config => "Config",
            Self::File => "File",
            Self::Session => "Session",
            Self::Push => "Push",
            Self::GeoPoint => "GeoPoint",
            Self::Analytics => "Analytics",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a method lives on the class (static) or on its instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Static,
    Instance,
}

/// The SDK's own future type for a single operation.
pub type NativeFuture = BoxFuture<'static, Result<Payload>>;

/// The host-side future returned for a bridged call.
pub type BridgedFuture = BoxFuture<'static, CallResult<Payload>>;

/// One SDK operation.
///
/// The outer `Result` is the synchronous part of the call: an `Err` means the
/// method failed before producing a future at all.
pub type NativeMethod =
    Arc<dyn Fn(&CallContext, Receiver, Vec<Payload>) -> Result<NativeFuture> + Send + Sync>;

/// Named static and instance methods of one SDK entity type.
#[derive(Clone, Default)]
pub struct MethodTable {
    statics: HashMap<String, NativeMethod>,
    prototype: HashMap<String, NativeMethod>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_static<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&CallContext, Receiver, Vec<Payload>) -> Result<NativeFuture> + Send + Sync + 'static,
    {
        self.statics.insert(name.into(), Arc::new(method));
        self
    }

    pub fn with_instance<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&CallContext, Receiver, Vec<Payload>) -> Result<NativeFuture> + Send + Sync + 'static,
    {
        self.prototype.insert(name.into(), Arc::new(method));
        self
    }

    pub fn method(&self, kind: MethodKind, name: &str) -> Option<&NativeMethod> {
        self.slots(kind).get(name)
    }

    pub fn slots(&self, kind: MethodKind) -> &HashMap<String, NativeMethod> {
        match kind {
            MethodKind::Static => &self.statics,
            MethodKind::Instance => &self.prototype,
        }
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut statics: Vec<_> = self.statics.keys().collect();
        let mut prototype: Vec<_> = self.prototype.keys().collect();
        statics.sort();
        prototype.sort();
        f.debug_struct("MethodTable")
            .field("statics", &statics)
            .field("prototype", &prototype)
            .finish()
    }
}

/// The backend SDK as seen by the bridge.
pub trait BackendSdk: Send + Sync {
    /// SDK initialization (application id, client key, server URL, ...).
    ///
    /// The bridge forwards arguments verbatim and adds no validation.
    fn initialize(&self, args: &[Value]) -> Result<()>;

    /// The method table for an entity type, or `None` if the SDK does not
    /// provide that entity at all.
    fn method_table(&self, entity: EntityType) -> Option<MethodTable>;
}

/// A call by name against one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub entity: EntityType,
    pub kind: MethodKind,
    pub method: String,
    pub receiver: Receiver,
    pub args: Vec<Payload>,
}

impl MethodCall {
    /// A static call, received by the entity's class.
    pub fn on_class(entity: EntityType, method: impl Into<String>, args: Vec<Payload>) -> Self {
        Self {
            entity,
            kind: MethodKind::Static,
            method: method.into(),
            receiver: Receiver::Class(entity),
            args,
        }
    }

    /// An instance call on `receiver`.
    pub fn on_instance(
        entity: EntityType,
        method: impl Into<String>,
        receiver: Receiver,
        args: Vec<Payload>,
    ) -> Self {
        Self {
            entity,
            kind: MethodKind::Instance,
            method: method.into(),
            receiver,
            args,
        }
    }

    /// `Type.method` or `Type.prototype.method`, as used in logs and errors.
    pub fn label(&self) -> String {
        match self.kind {
            MethodKind::Static => format!("{}.{}", self.entity, self.method),
            MethodKind::Instance => format!("{}.prototype.{}", self.entity, self.method),
        }
    }
}

/// Where a call is coming from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// A call made by the host application. Bridged and intercepted.
    Outer,
    /// A call made by an SDK method while it is being dispatched. Passed
    /// straight to the original method.
    Internal,
}

/// Something that can route a [`MethodCall`] to an SDK method.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, ctx: &CallContext, call: MethodCall) -> Invocation;
}

/// The context a call is made in: the dispatcher to route through and the
/// dispatch mode.
#[derive(Clone)]
pub struct CallContext {
    dispatch: Arc<dyn Dispatch>,
    mode: DispatchMode,
}

impl CallContext {
    pub fn outer(dispatch: Arc<dyn Dispatch>) -> Self {
        Self {
            dispatch,
            mode: DispatchMode::Outer,
        }
    }

    pub fn internal(dispatch: Arc<dyn Dispatch>) -> Self {
        Self {
            dispatch,
            mode: DispatchMode::Internal,
        }
    }

    /// The same dispatcher in internal mode.
    pub fn to_internal(&self) -> Self {
        Self::internal(Arc::clone(&self.dispatch))
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn is_internal(&self) -> bool {
        self.mode == DispatchMode::Internal
    }

    pub fn invoke(&self, call: MethodCall) -> Invocation {
        self.dispatch.dispatch(self, call)
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// The result of dispatching a call.
///
/// Internal calls yield the SDK's native future untouched; outer calls yield
/// the bridged host promise with interceptors attached. Both can be awaited
/// directly; a native rejection surfaces as a [`CallError`](crate::CallError)
/// without a receiver annotation.
pub enum Invocation {
    Native(NativeFuture),
    Bridged(BridgedFuture),
}

impl Invocation {
    pub fn is_bridged(&self) -> bool {
        matches!(self, Self::Bridged(_))
    }

    pub fn into_native(self) -> Option<NativeFuture> {
        match self {
            Self::Native(future) => Some(future),
            Self::Bridged(_) => None,
        }
    }
}

impl Future for Invocation {
    type Output = CallResult<Payload>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.get_mut() {
            Self::Native(future) => future.as_mut().poll(cx).map(|r| r.map_err(Into::into)),
            Self::Bridged(future) => future.as_mut().poll(cx),
        }
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(_) => f.write_str("Invocation::Native(..)"),
            Self::Bridged(_) => f.write_str("Invocation::Bridged(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SdkError;
    use crate::model::SdkObject;
    use futures::FutureExt;

    struct DirectDispatch {
        table: MethodTable,
    }

    impl Dispatch for DirectDispatch {
        fn dispatch(&self, ctx: &CallContext, call: MethodCall) -> Invocation {
            let method = self
                .table
                .method(call.kind, &call.method)
                .expect("method present");
            match method(&ctx.to_internal(), call.receiver, call.args) {
                Ok(future) => Invocation::Native(future),
                Err(err) => Invocation::Native(futures::future::err(err).boxed()),
            }
        }
    }

    fn table() -> MethodTable {
        MethodTable::new()
            .with_static("ping", |_, _, _| Ok(async { Ok(Payload::Count(1)) }.boxed()))
            .with_instance("save", |_, receiver, _| {
                let object = receiver.as_object().cloned();
                Ok(async move {
                    object
                        .map(|o| Payload::Object(o.with_id("saved")))
                        .ok_or_else(|| SdkError::other("not an object"))
                }
                .boxed())
            })
            .with_static("fail_sync", |_, _, _| Err(SdkError::other("sync failure")))
    }

    #[test]
    fn test_method_table_lookup() {
        let table = table();
        assert!(table.method(MethodKind::Static, "ping").is_some());
        assert!(table.method(MethodKind::Instance, "ping").is_none());
        assert!(table.method(MethodKind::Instance, "save").is_some());
        assert_eq!(table.slots(MethodKind::Static).len(), 2);
    }

    #[test]
    fn test_method_table_debug_lists_names() {
        let debug = format!("{:?}", table());
        assert!(debug.contains("ping"));
        assert!(debug.contains("save"));
    }

    #[test]
    fn test_method_call_labels() {
        let call = MethodCall::on_class(EntityType::Object, "save_all", vec![]);
        assert_eq!(call.label(), "Object.save_all");
        assert_eq!(call.receiver, Receiver::Class(EntityType::Object));

        let call = MethodCall::on_instance(
            EntityType::Query,
            "find",
            Receiver::Query(crate::model::Query::new("A")),
            vec![],
        );
        assert_eq!(call.label(), "Query.prototype.find");
    }

    #[core_async::test]
    async fn test_context_invoke_and_await() {
        let dispatch: Arc<dyn Dispatch> = Arc::new(DirectDispatch { table: table() });
        let ctx = CallContext::outer(dispatch);
        assert!(!ctx.is_internal());
        assert!(ctx.to_internal().is_internal());

        let invocation = ctx.invoke(MethodCall::on_instance(
            EntityType::Object,
            "save",
            Receiver::Object(SdkObject::new("A")),
            vec![],
        ));
        assert!(!invocation.is_bridged());

        let saved = invocation.await.unwrap().into_object().unwrap();
        assert_eq!(saved.id.as_deref(), Some("saved"));
    }

    #[core_async::test]
    async fn test_native_rejection_surfaces_as_call_error() {
        let dispatch: Arc<dyn Dispatch> = Arc::new(DirectDispatch { table: table() });
        let ctx = CallContext::outer(dispatch);
        let err = ctx
            .invoke(MethodCall::on_class(EntityType::Object, "fail_sync", vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "sync failure");
        assert!(err.object.is_none());
    }

    #[test]
    fn test_entity_names() {
        assert_eq!(EntityType::ALL.len(), 10);
        assert_eq!(EntityType::GeoPoint.to_string(), "GeoPoint");
    }
}
