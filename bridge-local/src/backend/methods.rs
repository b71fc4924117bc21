//! Method tables for the in-memory backend
//!
//! Each native method validates its arguments synchronously (an `Err` here is
//! the SDK throwing before it returns a future) and does the actual work in
//! the returned future. Operations built from other operations go through the
//! call context, never by calling the helpers directly, so they observe the
//! same dispatch rules as any other SDK-internal call.

use super::Shared;
use bridge_traits::error::Result;
use bridge_traits::model::USER_CLASS;
use bridge_traits::{
    CallContext, EntityType, MethodCall, MethodTable, NativeFuture, Payload, Receiver, SdkError,
    SdkFile, SdkObject,
};
use serde_json::Value;
use std::sync::Arc;

fn object_receiver(receiver: &Receiver) -> Result<SdkObject> {
    receiver
        .as_object()
        .cloned()
        .ok_or_else(|| SdkError::other("method must be called on an object"))
}

fn saved_id(object: &SdkObject) -> Result<String> {
    object
        .id
        .clone()
        .ok_or_else(|| SdkError::new(SdkError::MISSING_OBJECT_ID, "Object does not have an ID"))
}

fn string_arg(args: &[Payload], index: usize, what: &str) -> Result<String> {
    args.get(index)
        .and_then(Payload::as_str)
        .map(str::to_string)
        .ok_or_else(|| SdkError::other(format!("{what} must be a string")))
}

fn objects_arg(args: Vec<Payload>) -> Result<Vec<SdkObject>> {
    args.into_iter()
        .next()
        .ok_or_else(|| SdkError::other("a list of objects is required"))?
        .into_objects()
}

fn json_arg(args: &[Payload], index: usize) -> Value {
    match args.get(index) {
        Some(Payload::Json(value)) => value.clone(),
        _ => Value::Null,
    }
}

/// Run an instance method on every object, one at a time, through the
/// context.
async fn each_object(
    ctx: CallContext,
    method: &'static str,
    objects: Vec<SdkObject>,
) -> Result<Vec<SdkObject>> {
    let mut results = Vec::with_capacity(objects.len());
    for object in objects {
        let call =
            MethodCall::on_instance(EntityType::Object, method, Receiver::Object(object), vec![]);
        let payload = ctx.invoke(call).await.map_err(|e| e.error)?;
        results.push(payload.into_object()?);
    }
    Ok(results)
}

fn ready(payload: Payload) -> Result<NativeFuture> {
    Ok(Box::pin(async move { Ok(payload) }))
}

pub(super) fn object_table(shared: &Arc<Shared>) -> MethodTable {
    let save = Arc::clone(shared);
    let fetch = Arc::clone(shared);
    let destroy = Arc::clone(shared);

    MethodTable::new()
        .with_instance("save", move |_ctx, receiver, args| {
            let mut object = object_receiver(&receiver)?;
            if object.class_name.is_empty() {
                return Err(SdkError::new(
                    SdkError::INVALID_CLASS_NAME,
                    "Object has no class name",
                ));
            }
            if let Some(Payload::Json(Value::Object(attrs))) = args.into_iter().next() {
                for (key, value) in attrs {
                    object.set(key, value);
                }
            }
            let shared = Arc::clone(&save);
            Ok(Box::pin(async move {
                shared.save_object(object).await.map(Payload::Object)
            }))
        })
        .with_instance("fetch", move |_ctx, receiver, _args| {
            let object = object_receiver(&receiver)?;
            let id = saved_id(&object)?;
            let shared = Arc::clone(&fetch);
            Ok(Box::pin(async move {
                shared
                    .fetch_object(&object.class_name, &id)
                    .await
                    .map(Payload::Object)
            }))
        })
        .with_instance("destroy", move |_ctx, receiver, _args| {
            let object = object_receiver(&receiver)?;
            let id = saved_id(&object)?;
            let shared = Arc::clone(&destroy);
            Ok(Box::pin(async move {
                shared
                    .destroy_object(&object.class_name, &id)
                    .await
                    .map(Payload::Object)
            }))
        })
        .with_static("save_all", |ctx, _receiver, args| {
            let objects = objects_arg(args)?;
            let ctx = ctx.clone();
            Ok(Box::pin(async move {
                each_object(ctx, "save", objects).await.map(Payload::Objects)
            }))
        })
        .with_static("destroy_all", |ctx, _receiver, args| {
            let objects = objects_arg(args)?;
            let ctx = ctx.clone();
            Ok(Box::pin(async move {
                each_object(ctx, "destroy", objects)
                    .await
                    .map(Payload::Objects)
            }))
        })
        .with_static("fetch_all", |ctx, _receiver, args| {
            let objects = objects_arg(args)?;
            for object in &objects {
                saved_id(object)?;
            }
            let ctx = ctx.clone();
            Ok(Box::pin(async move {
                each_object(ctx, "fetch", objects).await.map(Payload::Objects)
            }))
        })
        .with_static("fetch_all_if_needed", |ctx, _receiver, args| {
            let objects = objects_arg(args)?;
            let ctx = ctx.clone();
            Ok(Box::pin(async move {
                let mut results = Vec::with_capacity(objects.len());
                for object in objects {
                    // Only bare pointers (an id but no data) need a round trip
                    if object.id.is_some() && object.attributes().is_empty() {
                        let mut fetched = each_object(ctx.clone(), "fetch", vec![object]).await?;
                        results.append(&mut fetched);
                    } else {
                        results.push(object);
                    }
                }
                Ok(Payload::Objects(results))
            }))
        })
}

fn query_receiver(receiver: &Receiver) -> Result<bridge_traits::Query> {
    let query = receiver
        .as_query()
        .cloned()
        .ok_or_else(|| SdkError::other("method must be called on a query"))?;
    if query.class_name.is_empty() {
        return Err(SdkError::new(
            SdkError::INVALID_CLASS_NAME,
            "Query has no class name",
        ));
    }
    Ok(query)
}

pub(super) fn query_table(shared: &Arc<Shared>) -> MethodTable {
    let count = Arc::clone(shared);
    let find = Arc::clone(shared);
    let first = Arc::clone(shared);
    let get = Arc::clone(shared);

    MethodTable::new()
        .with_instance("count", move |_ctx, receiver, _args| {
            let query = query_receiver(&receiver)?;
            let shared = Arc::clone(&count);
            Ok(Box::pin(async move {
                Ok(Payload::Count(shared.count(&query).await))
            }))
        })
        .with_instance("find", move |_ctx, receiver, _args| {
            let query = query_receiver(&receiver)?;
            let shared = Arc::clone(&find);
            Ok(Box::pin(async move {
                Ok(Payload::Objects(shared.find(&query).await))
            }))
        })
        .with_instance("first", move |_ctx, receiver, _args| {
            let query = query_receiver(&receiver)?.limit(1);
            let shared = Arc::clone(&first);
            Ok(Box::pin(async move {
                let first = shared.find(&query).await.into_iter().next();
                Ok(Payload::MaybeObject(first))
            }))
        })
        .with_instance("get", move |_ctx, receiver, args| {
            let id = string_arg(&args, 0, "object id")?;
            let query = query_receiver(&receiver)?.equal_to("objectId", id.clone());
            let shared = Arc::clone(&get);
            Ok(Box::pin(async move {
                shared
                    .find(&query.limit(1))
                    .await
                    .into_iter()
                    .next()
                    .map(Payload::Object)
                    .ok_or_else(|| SdkError::object_not_found(format!("Object {id} not found")))
            }))
        })
}

fn credentials_of(user: &SdkObject) -> Result<(String, String)> {
    let username = user
        .get_str("username")
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            SdkError::new(
                SdkError::USERNAME_MISSING,
                "Cannot sign up user with an empty username.",
            )
        })?;
    let password = user
        .get_str("password")
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            SdkError::new(
                SdkError::PASSWORD_MISSING,
                "Cannot sign up user with an empty password.",
            )
        })?;
    Ok((username.to_string(), password.to_string()))
}

fn user_receiver(receiver: &Receiver) -> Result<SdkObject> {
    let user = object_receiver(receiver)?;
    if !user.is_user() {
        return Err(SdkError::new(
            SdkError::INVALID_CLASS_NAME,
            format!("{} is not a user class", user.class_name),
        ));
    }
    Ok(user)
}

pub(super) fn user_table(shared: &Arc<Shared>) -> MethodTable {
    let upgrade = Arc::clone(shared);
    let sign_up = Arc::clone(shared);
    let log_in = Arc::clone(shared);
    let log_in_static = Arc::clone(shared);
    let become_user = Arc::clone(shared);
    let current = Arc::clone(shared);
    let revocable = Arc::clone(shared);
    let log_out = Arc::clone(shared);
    let reset = Arc::clone(shared);

    MethodTable::new()
        .with_instance("upgrade_to_revocable_session", move |_ctx, receiver, _args| {
            let user = user_receiver(&receiver)?;
            let shared = Arc::clone(&upgrade);
            Ok(Box::pin(async move {
                shared.upgrade_session(user).await.map(Payload::Object)
            }))
        })
        .with_instance("log_in", move |_ctx, receiver, _args| {
            let user = user_receiver(&receiver)?;
            let (username, password) = credentials_of(&user)?;
            let shared = Arc::clone(&log_in);
            Ok(Box::pin(async move {
                shared
                    .log_in(&username, &password)
                    .await
                    .map(Payload::Object)
            }))
        })
        .with_instance("sign_up", move |ctx, receiver, args| {
            let mut user = user_receiver(&receiver)?;
            if let Some(Payload::Json(Value::Object(attrs))) = args.into_iter().next() {
                for (key, value) in attrs {
                    user.set(key, value);
                }
            }
            let (username, password) = credentials_of(&user)?;
            user.unset("password");
            let ctx = ctx.clone();
            let shared = Arc::clone(&sign_up);
            Ok(Box::pin(async move {
                shared.ensure_username_free(&username).await?;
                let save =
                    MethodCall::on_instance(EntityType::Object, "save", Receiver::Object(user), vec![]);
                let saved = ctx.invoke(save).await.map_err(|e| e.error)?.into_object()?;
                shared
                    .register(saved, &username, &password)
                    .await
                    .map(Payload::Object)
            }))
        })
        .with_static("become", move |_ctx, _receiver, args| {
            let token = string_arg(&args, 0, "session token")?;
            let shared = Arc::clone(&become_user);
            Ok(Box::pin(async move {
                shared.become_user(&token).await.map(Payload::Object)
            }))
        })
        .with_static("current_async", move |_ctx, _receiver, _args| {
            let shared = Arc::clone(&current);
            Ok(Box::pin(async move {
                Ok(Payload::MaybeObject(shared.current_user().await))
            }))
        })
        .with_static("enable_revocable_session", move |_ctx, _receiver, _args| {
            let shared = Arc::clone(&revocable);
            Ok(Box::pin(async move {
                shared.enable_revocable_sessions().await;
                Ok(Payload::Unit)
            }))
        })
        .with_static("log_in", move |_ctx, _receiver, args| {
            let username = string_arg(&args, 0, "username")?;
            let password = string_arg(&args, 1, "password")?;
            let shared = Arc::clone(&log_in_static);
            Ok(Box::pin(async move {
                shared
                    .log_in(&username, &password)
                    .await
                    .map(Payload::Object)
            }))
        })
        .with_static("log_out", move |_ctx, _receiver, _args| {
            let shared = Arc::clone(&log_out);
            Ok(Box::pin(async move {
                shared.log_out().await;
                Ok(Payload::Unit)
            }))
        })
        .with_static("request_password_reset", move |_ctx, _receiver, args| {
            let email = string_arg(&args, 0, "email")?;
            let shared = Arc::clone(&reset);
            Ok(Box::pin(async move {
                shared
                    .request_password_reset(&email)
                    .await
                    .map(|()| Payload::Unit)
            }))
        })
        .with_static("sign_up", |ctx, _receiver, args| {
            let username = string_arg(&args, 0, "username")?;
            let password = string_arg(&args, 1, "password")?;
            let mut user = SdkObject::new(USER_CLASS)
                .with("username", username)
                .with("password", password);
            if let Value::Object(attrs) = json_arg(&args, 2) {
                for (key, value) in attrs {
                    user.set(key, value);
                }
            }
            let call =
                MethodCall::on_instance(EntityType::User, "sign_up", Receiver::Object(user), vec![]);
            let ctx = ctx.clone();
            Ok(Box::pin(async move { ctx.invoke(call).await.map_err(|e| e.error) }))
        })
}

pub(super) fn cloud_table(shared: &Arc<Shared>) -> MethodTable {
    let shared = Arc::clone(shared);
    MethodTable::new().with_static("run", move |_ctx, _receiver, args| {
        let name = string_arg(&args, 0, "function name")?;
        let params = json_arg(&args, 1);
        let function = shared.cloud_function(&name)?;
        Ok(Box::pin(async move { function(params).await.map(Payload::Json) }))
    })
}

pub(super) fn config_table(shared: &Arc<Shared>) -> MethodTable {
    let shared = Arc::clone(shared);
    MethodTable::new().with_static("get", move |_ctx, _receiver, _args| {
        ready(Payload::Json(shared.config()))
    })
}

pub(super) fn file_table(shared: &Arc<Shared>) -> MethodTable {
    let shared = Arc::clone(shared);
    MethodTable::new().with_instance("save", move |_ctx, receiver, _args| {
        let file: SdkFile = receiver
            .as_file()
            .cloned()
            .ok_or_else(|| SdkError::other("method must be called on a file"))?;
        if file.name.trim().is_empty() {
            return Err(SdkError::other("Invalid filename."));
        }
        let shared = Arc::clone(&shared);
        Ok(Box::pin(async move {
            shared.save_file(file).await.map(Payload::File)
        }))
    })
}

pub(super) fn session_table(shared: &Arc<Shared>) -> MethodTable {
    let shared = Arc::clone(shared);
    MethodTable::new().with_static("current", move |_ctx, _receiver, _args| {
        let shared = Arc::clone(&shared);
        Ok(Box::pin(async move {
            shared.current_session().await.map(Payload::Object)
        }))
    })
}

pub(super) fn push_table(shared: &Arc<Shared>) -> MethodTable {
    let shared = Arc::clone(shared);
    MethodTable::new().with_static("send", move |_ctx, _receiver, args| {
        let data = json_arg(&args, 0);
        if !data.is_object() {
            return Err(SdkError::other("Push data must be an object"));
        }
        let shared = Arc::clone(&shared);
        Ok(Box::pin(async move {
            shared.record_push(data).await;
            Ok(Payload::Unit)
        }))
    })
}

pub(super) fn geo_point_table(shared: &Arc<Shared>) -> MethodTable {
    let shared = Arc::clone(shared);
    MethodTable::new().with_static("current", move |_ctx, _receiver, _args| {
        let location = shared.location();
        Ok(Box::pin(async move { location.map(Payload::GeoPoint) }))
    })
}

pub(super) fn analytics_table(shared: &Arc<Shared>) -> MethodTable {
    let shared = Arc::clone(shared);
    MethodTable::new().with_static("track", move |_ctx, _receiver, args| {
        let name = string_arg(&args, 0, "event name")?;
        if name.trim().is_empty() {
            return Err(SdkError::other(
                "A name for the custom event must be provided",
            ));
        }
        let dimensions = json_arg(&args, 1);
        let shared = Arc::clone(&shared);
        Ok(Box::pin(async move {
            shared.record_event(name, dimensions).await;
            Ok(Payload::Unit)
        }))
    })
}
