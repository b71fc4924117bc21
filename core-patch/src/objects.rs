//! Object operations

use crate::patcher::{CallFuture, PatchedSdk};
use bridge_traits::{EntityType, MethodCall, Payload, Receiver, SdkObject};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Save, fetch and destroy objects through the bridge.
///
/// Every method dispatches immediately; the returned future only waits for
/// the result.
#[derive(Debug, Clone)]
pub struct Objects {
    sdk: Arc<PatchedSdk>,
}

impl Objects {
    pub fn new(sdk: Arc<PatchedSdk>) -> Self {
        Self { sdk }
    }

    fn on_object(
        &self,
        method: &str,
        object: SdkObject,
        args: Vec<Payload>,
    ) -> CallFuture<SdkObject> {
        let call =
            MethodCall::on_instance(EntityType::Object, method, Receiver::Object(object), args);
        self.sdk.call_as(call, Payload::into_object)
    }

    fn on_all(&self, method: &str, objects: Vec<SdkObject>) -> CallFuture<Vec<SdkObject>> {
        let call = MethodCall::on_class(EntityType::Object, method, vec![objects.into()]);
        self.sdk.call_as(call, Payload::into_objects)
    }

    pub fn save(&self, object: SdkObject) -> CallFuture<SdkObject> {
        self.on_object("save", object, Vec::new())
    }

    /// Set `attrs` on the object, then save it.
    pub fn save_with(&self, object: SdkObject, attrs: Map<String, Value>) -> CallFuture<SdkObject> {
        self.on_object("save", object, vec![Value::Object(attrs).into()])
    }

    pub fn fetch(&self, object: SdkObject) -> CallFuture<SdkObject> {
        self.on_object("fetch", object, Vec::new())
    }

    /// Resolves with the destroyed object.
    pub fn destroy(&self, object: SdkObject) -> CallFuture<SdkObject> {
        self.on_object("destroy", object, Vec::new())
    }

    pub fn save_all(&self, objects: Vec<SdkObject>) -> CallFuture<Vec<SdkObject>> {
        self.on_all("save_all", objects)
    }

    pub fn destroy_all(&self, objects: Vec<SdkObject>) -> CallFuture<Vec<SdkObject>> {
        self.on_all("destroy_all", objects)
    }

    pub fn fetch_all(&self, objects: Vec<SdkObject>) -> CallFuture<Vec<SdkObject>> {
        self.on_all("fetch_all", objects)
    }

    pub fn fetch_all_if_needed(&self, objects: Vec<SdkObject>) -> CallFuture<Vec<SdkObject>> {
        self.on_all("fetch_all_if_needed", objects)
    }
}
