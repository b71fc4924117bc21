//! Cloud functions, config, push, geolocation, analytics and files

use crate::patcher::{CallFuture, PatchedSdk};
use bridge_traits::{EntityType, GeoPoint, MethodCall, Payload, Receiver, SdkFile};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Cloud {
    sdk: Arc<PatchedSdk>,
}

impl Cloud {
    pub fn new(sdk: Arc<PatchedSdk>) -> Self {
        Self { sdk }
    }

    /// Run the cloud function `name`.
    pub fn run(&self, name: impl Into<String>, params: Value) -> CallFuture<Value> {
        let args = vec![Payload::from(name.into()), Payload::Json(params)];
        let call = MethodCall::on_class(EntityType::Cloud, "run", args);
        self.sdk.call_as(call, Payload::into_json)
    }
}

/// Remote application config.
#[derive(Debug, Clone)]
pub struct AppConfig {
    sdk: Arc<PatchedSdk>,
}

impl AppConfig {
    pub fn new(sdk: Arc<PatchedSdk>) -> Self {
        Self { sdk }
    }

    pub fn get(&self) -> CallFuture<Value> {
        let call = MethodCall::on_class(EntityType::Config, "get", vec![]);
        self.sdk.call_as(call, Payload::into_json)
    }
}

#[derive(Debug, Clone)]
pub struct Push {
    sdk: Arc<PatchedSdk>,
}

impl Push {
    pub fn new(sdk: Arc<PatchedSdk>) -> Self {
        Self { sdk }
    }

    pub fn send(&self, data: Value) -> CallFuture<()> {
        let call = MethodCall::on_class(EntityType::Push, "send", vec![Payload::Json(data)]);
        self.sdk.call_as(call, Payload::into_unit)
    }
}

#[derive(Debug, Clone)]
pub struct GeoPoints {
    sdk: Arc<PatchedSdk>,
}

impl GeoPoints {
    pub fn new(sdk: Arc<PatchedSdk>) -> Self {
        Self { sdk }
    }

    /// The device's current location.
    pub fn current(&self) -> CallFuture<GeoPoint> {
        let call = MethodCall::on_class(EntityType::GeoPoint, "current", vec![]);
        self.sdk.call_as(call, Payload::into_geo_point)
    }
}

#[derive(Debug, Clone)]
pub struct Analytics {
    sdk: Arc<PatchedSdk>,
}

impl Analytics {
    pub fn new(sdk: Arc<PatchedSdk>) -> Self {
        Self { sdk }
    }

    pub fn track(&self, name: impl Into<String>, dimensions: Value) -> CallFuture<()> {
        let args = vec![Payload::from(name.into()), Payload::Json(dimensions)];
        let call = MethodCall::on_class(EntityType::Analytics, "track", args);
        self.sdk.call_as(call, Payload::into_unit)
    }
}

#[derive(Debug, Clone)]
pub struct Files {
    sdk: Arc<PatchedSdk>,
}

impl Files {
    pub fn new(sdk: Arc<PatchedSdk>) -> Self {
        Self { sdk }
    }

    /// Upload the file. Resolves with the saved file, which carries its URL.
    pub fn save(&self, file: SdkFile) -> CallFuture<SdkFile> {
        let call = MethodCall::on_instance(EntityType::File, "save", Receiver::File(file), vec![]);
        self.sdk.call_as(call, Payload::into_file)
    }
}
