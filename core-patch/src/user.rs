//! Users and sessions

use crate::patcher::{CallFuture, PatchedSdk};
use bridge_traits::{EntityType, MethodCall, Payload, Receiver, SdkObject};
use core_runtime::logging::redact_if_sensitive;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// User accounts through the bridge.
///
/// Instance methods take the user object they act on; the `*_with` variants
/// are the class-level forms that take credentials directly.
#[derive(Debug, Clone)]
pub struct Users {
    sdk: Arc<PatchedSdk>,
}

impl Users {
    pub fn new(sdk: Arc<PatchedSdk>) -> Self {
        Self { sdk }
    }

    fn on_user(&self, method: &str, user: SdkObject) -> CallFuture<SdkObject> {
        let call = MethodCall::on_instance(EntityType::User, method, Receiver::Object(user), vec![]);
        self.sdk.call_as(call, Payload::into_object)
    }

    fn on_class(&self, method: &str, args: Vec<Payload>) -> MethodCall {
        MethodCall::on_class(EntityType::User, method, args)
    }

    pub fn sign_up(&self, user: SdkObject) -> CallFuture<SdkObject> {
        self.on_user("sign_up", user)
    }

    /// Log in with the `username` and `password` set on `user`.
    pub fn log_in(&self, user: SdkObject) -> CallFuture<SdkObject> {
        self.on_user("log_in", user)
    }

    pub fn upgrade_to_revocable_session(&self, user: SdkObject) -> CallFuture<SdkObject> {
        self.on_user("upgrade_to_revocable_session", user)
    }

    /// Adopt an existing session token.
    pub fn become_user(&self, session_token: impl Into<String>) -> CallFuture<SdkObject> {
        let session_token = session_token.into();
        debug!(
            session_token = %redact_if_sensitive("session_token", &session_token),
            "Becoming user"
        );
        let call = self.on_class("become", vec![Payload::from(session_token)]);
        self.sdk.call_as(call, Payload::into_object)
    }

    pub fn current_async(&self) -> CallFuture<Option<SdkObject>> {
        self.sdk
            .call_as(self.on_class("current_async", vec![]), Payload::into_maybe_object)
    }

    pub fn enable_revocable_session(&self) -> CallFuture<()> {
        self.sdk
            .call_as(self.on_class("enable_revocable_session", vec![]), Payload::into_unit)
    }

    pub fn log_in_with(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> CallFuture<SdkObject> {
        let args = vec![
            Payload::from(username.into()),
            Payload::from(password.into()),
        ];
        self.sdk
            .call_as(self.on_class("log_in", args), Payload::into_object)
    }

    pub fn log_out(&self) -> CallFuture<()> {
        self.sdk
            .call_as(self.on_class("log_out", vec![]), Payload::into_unit)
    }

    pub fn request_password_reset(&self, email: impl Into<String>) -> CallFuture<()> {
        let email = email.into();
        debug!(email = %redact_if_sensitive("email", &email), "Requesting password reset");
        let call = self.on_class("request_password_reset", vec![Payload::from(email)]);
        self.sdk.call_as(call, Payload::into_unit)
    }

    /// Create and log in a new user. `attrs`, if an object, is copied onto
    /// the user before signing up.
    pub fn sign_up_with(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
        attrs: Value,
    ) -> CallFuture<SdkObject> {
        let args = vec![
            Payload::from(username.into()),
            Payload::from(password.into()),
            Payload::Json(attrs),
        ];
        self.sdk
            .call_as(self.on_class("sign_up", args), Payload::into_object)
    }
}

/// The current session.
#[derive(Debug, Clone)]
pub struct Sessions {
    sdk: Arc<PatchedSdk>,
}

impl Sessions {
    pub fn new(sdk: Arc<PatchedSdk>) -> Self {
        Self { sdk }
    }

    pub fn current(&self) -> CallFuture<SdkObject> {
        let call = MethodCall::on_class(EntityType::Session, "current", vec![]);
        self.sdk.call_as(call, Payload::into_object)
    }
}
