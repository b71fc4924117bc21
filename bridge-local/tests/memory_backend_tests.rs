//! Exercises the in-memory backend through a plain, non-bridging dispatcher.

use bridge_local::MemoryBackend;
use bridge_traits::model::USER_CLASS;
use bridge_traits::{
    BackendSdk, CallContext, CallResult, Dispatch, EntityType, GeoPoint, Invocation, MethodCall,
    Payload, Query, Receiver, SdkError, SdkFile, SdkObject, SteppingClock,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;

struct Direct {
    sdk: MemoryBackend,
}

impl Dispatch for Direct {
    fn dispatch(&self, ctx: &CallContext, call: MethodCall) -> Invocation {
        let table = self.sdk.method_table(call.entity).expect("table");
        let method = table.method(call.kind, &call.method).expect("method").clone();
        match method(&ctx.to_internal(), call.receiver, call.args) {
            Ok(future) => Invocation::Native(future),
            Err(err) => Invocation::Native(Box::pin(async move { Err(err) })),
        }
    }
}

fn context(sdk: &MemoryBackend) -> CallContext {
    CallContext::outer(Arc::new(Direct { sdk: sdk.clone() }))
}

async fn run(ctx: &CallContext, call: MethodCall) -> CallResult<Payload> {
    ctx.invoke(call).await
}

fn save(object: SdkObject) -> MethodCall {
    MethodCall::on_instance(EntityType::Object, "save", Receiver::Object(object), vec![])
}

fn query_call(method: &str, query: Query, args: Vec<Payload>) -> MethodCall {
    MethodCall::on_instance(EntityType::Query, method, Receiver::Query(query), args)
}

fn sign_up(username: &str, password: &str, attrs: serde_json::Value) -> MethodCall {
    MethodCall::on_class(
        EntityType::User,
        "sign_up",
        vec![username.into(), password.into(), attrs.into()],
    )
}

#[test]
fn test_initialize_records_arguments() {
    let sdk = MemoryBackend::new();
    assert!(sdk.init_args().is_none());

    sdk.initialize(&[json!("app-id"), json!("js-key")]).unwrap();
    assert_eq!(sdk.init_args(), Some(vec![json!("app-id"), json!("js-key")]));
}

#[test]
fn test_initialize_requires_application_id() {
    let err = MemoryBackend::new().initialize(&[]).unwrap_err();
    assert_eq!(err.code, SdkError::OTHER_CAUSE);
}

#[core_async::test]
async fn test_save_assigns_identity_and_timestamps() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let sdk = MemoryBackend::new().with_clock(Arc::new(SteppingClock::new(
        start,
        Duration::seconds(1),
    )));
    let ctx = context(&sdk);

    let saved = run(&ctx, save(SdkObject::new("GameScore").with("score", 10)))
        .await
        .unwrap()
        .into_object()
        .unwrap();
    assert!(saved.id.is_some());
    assert_eq!(saved.created_at, Some(start));

    let resaved = run(&ctx, save(saved.clone().with("score", 11)))
        .await
        .unwrap()
        .into_object()
        .unwrap();
    assert_eq!(resaved.id, saved.id);
    assert_eq!(resaved.created_at, Some(start));
    assert!(resaved.updated_at > saved.updated_at);
    assert_eq!(sdk.object_count("GameScore").await, 1);
}

#[core_async::test]
async fn test_fetch_and_destroy() {
    let sdk = MemoryBackend::new();
    let ctx = context(&sdk);
    let saved = run(&ctx, save(SdkObject::new("Note").with("text", "hi")))
        .await
        .unwrap()
        .into_object()
        .unwrap();

    let pointer = SdkObject::new("Note").with_id(saved.id.clone().unwrap());
    let fetched = run(
        &ctx,
        MethodCall::on_instance(EntityType::Object, "fetch", Receiver::Object(pointer.clone()), vec![]),
    )
    .await
    .unwrap()
    .into_object()
    .unwrap();
    assert_eq!(fetched.get_str("text"), Some("hi"));

    run(
        &ctx,
        MethodCall::on_instance(EntityType::Object, "destroy", Receiver::Object(pointer.clone()), vec![]),
    )
    .await
    .unwrap();

    let err = run(
        &ctx,
        MethodCall::on_instance(EntityType::Object, "fetch", Receiver::Object(pointer), vec![]),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), SdkError::OBJECT_NOT_FOUND);
}

#[core_async::test]
async fn test_fetch_without_id_fails_synchronously() {
    let sdk = MemoryBackend::new();
    let table = sdk.method_table(EntityType::Object).unwrap();
    let fetch = table
        .method(bridge_traits::MethodKind::Instance, "fetch")
        .unwrap();
    let ctx = context(&sdk).to_internal();

    let result = fetch(&ctx, Receiver::Object(SdkObject::new("Note")), vec![]);
    assert_eq!(result.err().map(|e| e.code), Some(SdkError::MISSING_OBJECT_ID));
}

#[core_async::test]
async fn test_save_all_and_fetch_all_if_needed() {
    let sdk = MemoryBackend::new();
    let ctx = context(&sdk);
    let objects: Vec<SdkObject> = (0..3)
        .map(|i| SdkObject::new("Item").with("n", i))
        .collect();

    let saved = run(
        &ctx,
        MethodCall::on_class(EntityType::Object, "save_all", vec![objects.into()]),
    )
    .await
    .unwrap()
    .into_objects()
    .unwrap();
    assert_eq!(saved.len(), 3);

    let pointer = SdkObject::new("Item").with_id(saved[0].id.clone().unwrap());
    let loaded = saved[1].clone();
    let result = run(
        &ctx,
        MethodCall::on_class(
            EntityType::Object,
            "fetch_all_if_needed",
            vec![vec![pointer, loaded.clone()].into()],
        ),
    )
    .await
    .unwrap()
    .into_objects()
    .unwrap();
    assert_eq!(result[0].get("n"), Some(&json!(0)));
    assert_eq!(result[1], loaded);

    run(
        &ctx,
        MethodCall::on_class(EntityType::Object, "destroy_all", vec![saved.into()]),
    )
    .await
    .unwrap();
    assert_eq!(sdk.object_count("Item").await, 0);
}

#[core_async::test]
async fn test_query_operations() {
    let sdk = MemoryBackend::new();
    let ctx = context(&sdk);
    for score in [30, 10, 20] {
        run(&ctx, save(SdkObject::new("GameScore").with("score", score)))
            .await
            .unwrap();
    }
    let query = Query::new("GameScore").ascending("score");

    let count = run(&ctx, query_call("count", query.clone(), vec![]))
        .await
        .unwrap()
        .into_count()
        .unwrap();
    assert_eq!(count, 3);

    let found = run(&ctx, query_call("find", query.clone().limit(2), vec![]))
        .await
        .unwrap()
        .into_objects()
        .unwrap();
    let scores: Vec<_> = found.iter().filter_map(|o| o.get("score").cloned()).collect();
    assert_eq!(scores, vec![json!(10), json!(20)]);

    let first = run(&ctx, query_call("first", query.clone().greater_than("score", 15), vec![]))
        .await
        .unwrap()
        .into_maybe_object()
        .unwrap();
    assert_eq!(first.and_then(|o| o.get("score").cloned()), Some(json!(20)));

    let id = found[0].id.clone().unwrap();
    let got = run(&ctx, query_call("get", query.clone(), vec![id.into()]))
        .await
        .unwrap()
        .into_object()
        .unwrap();
    assert_eq!(got.get("score"), Some(&json!(10)));

    let missing = run(&ctx, query_call("get", query, vec!["nope".into()]))
        .await
        .unwrap_err();
    assert_eq!(missing.code(), SdkError::OBJECT_NOT_FOUND);
}

#[core_async::test]
async fn test_sign_up_log_in_and_sessions() {
    let sdk = MemoryBackend::new();
    let ctx = context(&sdk);

    let user = run(&ctx, sign_up("ada", "s3cret", json!({ "email": "ada@example.com" })))
        .await
        .unwrap()
        .into_object()
        .unwrap();
    assert!(user.is_user());
    assert!(!user.has("password"));
    let token = user.get_str("sessionToken").unwrap().to_string();
    assert_eq!(sdk.object_count(USER_CLASS).await, 1);

    let taken = run(&ctx, sign_up("ada", "other", json!({}))).await.unwrap_err();
    assert_eq!(taken.code(), SdkError::USERNAME_TAKEN);

    let current = run(&ctx, MethodCall::on_class(EntityType::User, "current_async", vec![]))
        .await
        .unwrap()
        .into_maybe_object()
        .unwrap();
    assert_eq!(current.and_then(|u| u.id), user.id);

    let session = run(&ctx, MethodCall::on_class(EntityType::Session, "current", vec![]))
        .await
        .unwrap()
        .into_object()
        .unwrap();
    assert_eq!(session.get_str("sessionToken"), Some(token.as_str()));

    run(&ctx, MethodCall::on_class(EntityType::User, "log_out", vec![]))
        .await
        .unwrap();
    let after = run(&ctx, MethodCall::on_class(EntityType::User, "current_async", vec![]))
        .await
        .unwrap()
        .into_maybe_object()
        .unwrap();
    assert!(after.is_none());

    let wrong = run(
        &ctx,
        MethodCall::on_class(EntityType::User, "log_in", vec!["ada".into(), "bad".into()]),
    )
    .await
    .unwrap_err();
    assert_eq!(wrong.code(), SdkError::OBJECT_NOT_FOUND);

    let logged_in = run(
        &ctx,
        MethodCall::on_class(EntityType::User, "log_in", vec!["ada".into(), "s3cret".into()]),
    )
    .await
    .unwrap()
    .into_object()
    .unwrap();
    let new_token = logged_in.get_str("sessionToken").unwrap().to_string();

    let became = run(
        &ctx,
        MethodCall::on_class(EntityType::User, "become", vec![new_token.into()]),
    )
    .await
    .unwrap()
    .into_object()
    .unwrap();
    assert_eq!(became.id, user.id);
}

#[core_async::test]
async fn test_revocable_session_upgrade() {
    let sdk = MemoryBackend::new();
    let ctx = context(&sdk);
    let user = run(&ctx, sign_up("grace", "pw", json!({})))
        .await
        .unwrap()
        .into_object()
        .unwrap();
    let legacy = user.get_str("sessionToken").unwrap().to_string();
    assert!(!legacy.starts_with("r:"));

    let upgraded = run(
        &ctx,
        MethodCall::on_instance(
            EntityType::User,
            "upgrade_to_revocable_session",
            Receiver::Object(user),
            vec![],
        ),
    )
    .await
    .unwrap()
    .into_object()
    .unwrap();
    assert!(upgraded.get_str("sessionToken").unwrap().starts_with("r:"));

    let stale = run(
        &ctx,
        MethodCall::on_class(EntityType::User, "become", vec![legacy.into()]),
    )
    .await
    .unwrap_err();
    assert_eq!(stale.code(), SdkError::INVALID_SESSION_TOKEN);

    run(
        &ctx,
        MethodCall::on_class(EntityType::User, "enable_revocable_session", vec![]),
    )
    .await
    .unwrap();
    let next = run(
        &ctx,
        MethodCall::on_class(EntityType::User, "log_in", vec!["grace".into(), "pw".into()]),
    )
    .await
    .unwrap()
    .into_object()
    .unwrap();
    assert!(next.get_str("sessionToken").unwrap().starts_with("r:"));
}

#[core_async::test]
async fn test_password_reset() {
    let sdk = MemoryBackend::new();
    let ctx = context(&sdk);
    run(&ctx, sign_up("lin", "pw", json!({ "email": "lin@example.com" })))
        .await
        .unwrap();

    run(
        &ctx,
        MethodCall::on_class(
            EntityType::User,
            "request_password_reset",
            vec!["lin@example.com".into()],
        ),
    )
    .await
    .unwrap();
    assert_eq!(sdk.password_resets().await, vec!["lin@example.com"]);

    let err = run(
        &ctx,
        MethodCall::on_class(
            EntityType::User,
            "request_password_reset",
            vec!["nobody@example.com".into()],
        ),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), SdkError::EMAIL_NOT_FOUND);
}

#[core_async::test]
async fn test_cloud_config_push_analytics_geo_and_files() {
    let sdk = MemoryBackend::new()
        .with_config("motd", "hello")
        .with_location(GeoPoint::new(52.5, 13.4))
        .with_cloud_function("double", |params| {
            Box::pin(async move {
                let n = params["n"].as_i64().unwrap_or_default();
                Ok(json!(n * 2))
            })
        });
    let ctx = context(&sdk);

    let doubled = run(
        &ctx,
        MethodCall::on_class(EntityType::Cloud, "run", vec!["double".into(), json!({ "n": 21 }).into()]),
    )
    .await
    .unwrap();
    assert_eq!(doubled, Payload::Json(json!(42)));

    let unknown = run(
        &ctx,
        MethodCall::on_class(EntityType::Cloud, "run", vec!["missing".into()]),
    )
    .await
    .unwrap_err();
    assert_eq!(unknown.code(), SdkError::SCRIPT_FAILED);

    let config = run(&ctx, MethodCall::on_class(EntityType::Config, "get", vec![]))
        .await
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(config["motd"], json!("hello"));

    run(
        &ctx,
        MethodCall::on_class(EntityType::Push, "send", vec![json!({ "channels": ["news"] }).into()]),
    )
    .await
    .unwrap();
    assert_eq!(sdk.pushes().await.len(), 1);

    run(
        &ctx,
        MethodCall::on_class(EntityType::Analytics, "track", vec!["open".into(), json!({ "src": "push" }).into()]),
    )
    .await
    .unwrap();
    assert_eq!(sdk.tracked_events().await[0].0, "open");

    let here = run(&ctx, MethodCall::on_class(EntityType::GeoPoint, "current", vec![]))
        .await
        .unwrap()
        .into_geo_point()
        .unwrap();
    assert_eq!(here, GeoPoint::new(52.5, 13.4));

    let file = run(
        &ctx,
        MethodCall::on_instance(
            EntityType::File,
            "save",
            Receiver::File(SdkFile::new("a.txt", b"abc".to_vec())),
            vec![],
        ),
    )
    .await
    .unwrap()
    .into_file()
    .unwrap();
    let url = file.url.clone().unwrap();
    assert!(file.name.ends_with("_a.txt"));
    assert_eq!(sdk.file_data(&url).await.as_deref(), Some(&b"abc"[..]));
}

#[core_async::test]
async fn test_analytics_rejects_blank_event_name() {
    let sdk = MemoryBackend::new();
    let ctx = context(&sdk);
    let err = run(
        &ctx,
        MethodCall::on_class(EntityType::Analytics, "track", vec!["  ".into()]),
    )
    .await
    .unwrap_err();
    assert!(err.message().contains("custom event"));
}

#[core_async::test]
async fn test_geo_point_unavailable() {
    let sdk = MemoryBackend::new();
    let ctx = context(&sdk);
    let err = run(&ctx, MethodCall::on_class(EntityType::GeoPoint, "current", vec![]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), SdkError::OTHER_CAUSE);
}
