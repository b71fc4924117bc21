//! In-memory backend SDK

mod methods;
mod store;

use bridge_traits::error::Result;
use bridge_traits::model::{SESSION_CLASS, USER_CLASS};
use bridge_traits::{
    BackendSdk, Clock, EntityType, GeoPoint, MethodTable, Query, SdkError, SdkFile, SdkObject,
    SystemClock,
};
use bytes::Bytes;
use core_async::sync::{Mutex, MutexGuard};
use futures_util::future::BoxFuture;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard};
use tracing::{debug, info};
use uuid::Uuid;

use store::{hash_password, Credential, SessionRecord, Store};

/// A cloud function: receives the call parameters and resolves with a JSON
/// result.
pub type CloudFunction = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

struct Settings {
    clock: Arc<dyn Clock>,
    config: Map<String, Value>,
    functions: HashMap<String, CloudFunction>,
    location: Option<GeoPoint>,
}

pub(crate) struct Shared {
    store: Mutex<Store>,
    settings: RwLock<Settings>,
    init_args: RwLock<Option<Vec<Value>>>,
}

/// A [`BackendSdk`] that keeps everything in process memory.
///
/// Cheap to clone; clones share the same data.
#[derive(Clone)]
pub struct MemoryBackend {
    shared: Arc<Shared>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            shared: Arc::new(Shared {
                store: Mutex::new(Store::default()),
                settings: RwLock::new(Settings {
                    clock,
                    config: Map::new(),
                    functions: HashMap::new(),
                    location: None,
                }),
                init_args: RwLock::new(None),
            }),
        }
    }

    /// Use a custom clock for `createdAt`/`updatedAt` stamps.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        self.shared.settings_mut(|settings| settings.clock = clock);
        self
    }

    /// Add a value to the remote config returned by `Config.get`.
    pub fn with_config(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let (key, value) = (key.into(), value.into());
        self.shared
            .settings_mut(|settings| settings.config.insert(key, value));
        self
    }

    /// Set the location reported by `GeoPoint.current`.
    pub fn with_location(self, location: GeoPoint) -> Self {
        self.shared
            .settings_mut(|settings| settings.location = Some(location));
        self
    }

    pub fn with_cloud_function<F>(self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync + 'static,
    {
        self.define_function(name, function);
        self
    }

    /// Register (or replace) a cloud function.
    pub fn define_function<F>(&self, name: impl Into<String>, function: F)
    where
        F: Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync + 'static,
    {
        let name = name.into();
        let function: CloudFunction = Arc::new(function);
        self.shared
            .settings_mut(|settings| settings.functions.insert(name, function));
    }

    /// Arguments of the last successful `initialize` call.
    pub fn init_args(&self) -> Option<Vec<Value>> {
        self.shared
            .init_args
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub async fn object_count(&self, class_name: &str) -> usize {
        self.shared.lock().await.class(class_name).len()
    }

    pub async fn pushes(&self) -> Vec<Value> {
        self.shared.lock().await.pushes.clone()
    }

    /// Analytics events as `(name, dimensions)`.
    pub async fn tracked_events(&self) -> Vec<(String, Value)> {
        self.shared.lock().await.events.clone()
    }

    /// Emails a password reset was requested for.
    pub async fn password_resets(&self) -> Vec<String> {
        self.shared.lock().await.password_resets.clone()
    }

    pub async fn file_data(&self, url: &str) -> Option<Bytes> {
        self.shared.lock().await.files.get(url).cloned()
    }
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("initialized", &self.init_args().is_some())
            .finish_non_exhaustive()
    }
}

impl BackendSdk for MemoryBackend {
    fn initialize(&self, args: &[Value]) -> Result<()> {
        let app_id = args
            .first()
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SdkError::other("Application ID is required"))?;
        info!(app_id, arg_count = args.len(), "Local backend initialized");
        *self
            .shared
            .init_args
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(args.to_vec());
        Ok(())
    }

    fn method_table(&self, entity: EntityType) -> Option<MethodTable> {
        let shared = &self.shared;
        Some(match entity {
            EntityType::Object => methods::object_table(shared),
            EntityType::Query => methods::query_table(shared),
            EntityType::Cloud => methods::cloud_table(shared),
            EntityType::User => methods::user_table(shared),
            EntityType::Config => methods::config_table(shared),
            EntityType::File => methods::file_table(shared),
            EntityType::Session => methods::session_table(shared),
            EntityType::Push => methods::push_table(shared),
            EntityType::GeoPoint => methods::geo_point_table(shared),
            EntityType::Analytics => methods::analytics_table(shared),
        })
    }
}

fn new_object_id() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_string()
}

fn invalid_login() -> SdkError {
    SdkError::object_not_found("Invalid username/password.")
}

impl Shared {
    async fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().await
    }

    fn settings(&self) -> RwLockReadGuard<'_, Settings> {
        self.settings.read().unwrap_or_else(|e| e.into_inner())
    }

    fn settings_mut<R>(&self, update: impl FnOnce(&mut Settings) -> R) -> R {
        let mut settings = self.settings.write().unwrap_or_else(|e| e.into_inner());
        update(&mut settings)
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.settings().clock.now()
    }

    // ---------------------------------------------------------------------
    // Objects and queries
    // ---------------------------------------------------------------------

    pub(crate) async fn save_object(&self, mut object: SdkObject) -> Result<SdkObject> {
        let now = self.now();
        let mut store = self.lock().await;
        if object.id.is_none() {
            object.id = Some(new_object_id());
            object.created_at = Some(now);
        } else if let Some(id) = object.id.as_deref() {
            let existing = store.find_by_id(&object.class_name, id);
            object.created_at = existing.and_then(|e| e.created_at).or(Some(now));
        }
        object.updated_at = Some(now);
        debug!(class = %object.class_name, id = ?object.id, "Saved object");
        store.upsert(object.clone());
        Ok(object)
    }

    pub(crate) async fn fetch_object(&self, class_name: &str, id: &str) -> Result<SdkObject> {
        self.lock()
            .await
            .find_by_id(class_name, id)
            .cloned()
            .ok_or_else(|| SdkError::object_not_found(format!("{class_name} {id} not found")))
    }

    pub(crate) async fn destroy_object(&self, class_name: &str, id: &str) -> Result<SdkObject> {
        self.lock()
            .await
            .remove(class_name, id)
            .ok_or_else(|| SdkError::object_not_found(format!("{class_name} {id} not found")))
    }

    pub(crate) async fn find(&self, query: &Query) -> Vec<SdkObject> {
        self.lock().await.window(query)
    }

    pub(crate) async fn count(&self, query: &Query) -> u64 {
        self.lock().await.matching(query).len() as u64
    }

    // ---------------------------------------------------------------------
    // Users and sessions
    // ---------------------------------------------------------------------

    pub(crate) async fn ensure_username_free(&self, username: &str) -> Result<()> {
        if self.lock().await.credentials.contains_key(username) {
            return Err(SdkError::new(
                SdkError::USERNAME_TAKEN,
                "Account already exists for this username.",
            ));
        }
        Ok(())
    }

    /// Store credentials for a saved user and log them in.
    pub(crate) async fn register(
        &self,
        mut user: SdkObject,
        username: &str,
        password: &str,
    ) -> Result<SdkObject> {
        let user_id = user
            .id
            .clone()
            .ok_or_else(|| SdkError::new(SdkError::MISSING_OBJECT_ID, "User was not saved"))?;
        let now = self.now();
        let mut store = self.lock().await;
        store.credentials.insert(
            username.to_string(),
            Credential {
                user_id: user_id.clone(),
                password_hash: hash_password(username, password),
            },
        );
        let token = open_session(&mut store, user_id, now);
        user.set("sessionToken", token);
        Ok(user)
    }

    pub(crate) async fn log_in(&self, username: &str, password: &str) -> Result<SdkObject> {
        let now = self.now();
        let mut store = self.lock().await;
        let credential = store.credentials.get(username).ok_or_else(invalid_login)?;
        if credential.password_hash != hash_password(username, password) {
            return Err(invalid_login());
        }
        let user_id = credential.user_id.clone();
        let mut user = store
            .find_by_id(USER_CLASS, &user_id)
            .cloned()
            .ok_or_else(invalid_login)?;
        let token = open_session(&mut store, user_id, now);
        user.set("sessionToken", token);
        debug!(username, "User logged in");
        Ok(user)
    }

    pub(crate) async fn become_user(&self, token: &str) -> Result<SdkObject> {
        let mut store = self.lock().await;
        let user = user_for_token(&store, token)?;
        store.current_token = Some(token.to_string());
        Ok(user)
    }

    pub(crate) async fn current_user(&self) -> Option<SdkObject> {
        let store = self.lock().await;
        let token = store.current_token.as_deref()?;
        user_for_token(&store, token).ok()
    }

    pub(crate) async fn log_out(&self) {
        let mut store = self.lock().await;
        if let Some(token) = store.current_token.take() {
            store.sessions.remove(&token);
        }
    }

    pub(crate) async fn enable_revocable_sessions(&self) {
        self.lock().await.revocable_sessions = true;
    }

    /// Exchange a legacy session token for a revocable one.
    pub(crate) async fn upgrade_session(&self, mut user: SdkObject) -> Result<SdkObject> {
        let token = user
            .get_str("sessionToken")
            .map(str::to_string)
            .ok_or_else(|| SdkError::new(SdkError::SESSION_MISSING, "No session to upgrade."))?;
        if token.starts_with("r:") {
            return Ok(user);
        }
        let mut store = self.lock().await;
        let record = store.sessions.remove(&token).ok_or_else(invalid_session)?;
        let revocable = format!("r:{}", Uuid::new_v4().simple());
        if store.current_token.as_deref() == Some(token.as_str()) {
            store.current_token = Some(revocable.clone());
        }
        store.sessions.insert(revocable.clone(), record);
        user.set("sessionToken", revocable);
        Ok(user)
    }

    pub(crate) async fn request_password_reset(&self, email: &str) -> Result<()> {
        let mut store = self.lock().await;
        let known = store
            .class(USER_CLASS)
            .iter()
            .any(|user| user.get_str("email") == Some(email));
        if !known {
            return Err(SdkError::new(
                SdkError::EMAIL_NOT_FOUND,
                format!("No user found with email {email}."),
            ));
        }
        store.password_resets.push(email.to_string());
        Ok(())
    }

    pub(crate) async fn current_session(&self) -> Result<SdkObject> {
        let store = self.lock().await;
        let token = store
            .current_token
            .as_deref()
            .ok_or_else(|| SdkError::new(SdkError::SESSION_MISSING, "There is no current user."))?;
        let record = store.sessions.get(token).ok_or_else(invalid_session)?;
        let mut session = SdkObject::new(SESSION_CLASS)
            .with_id(record.id.clone())
            .with("sessionToken", token)
            .with("user", record.user_id.clone());
        session.created_at = Some(record.created_at);
        session.updated_at = Some(record.created_at);
        Ok(session)
    }

    // ---------------------------------------------------------------------
    // Everything else
    // ---------------------------------------------------------------------

    pub(crate) fn cloud_function(&self, name: &str) -> Result<CloudFunction> {
        self.settings()
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| {
                SdkError::new(SdkError::SCRIPT_FAILED, format!("Invalid function: \"{name}\""))
            })
    }

    pub(crate) fn config(&self) -> Value {
        Value::Object(self.settings().config.clone())
    }

    pub(crate) fn location(&self) -> Result<GeoPoint> {
        self.settings()
            .location
            .ok_or_else(|| SdkError::other("Geolocation is unavailable"))
    }

    pub(crate) async fn record_push(&self, data: Value) {
        self.lock().await.pushes.push(data);
    }

    pub(crate) async fn record_event(&self, name: String, dimensions: Value) {
        self.lock().await.events.push((name, dimensions));
    }

    pub(crate) async fn save_file(&self, mut file: SdkFile) -> Result<SdkFile> {
        let name = format!("{}_{}", Uuid::new_v4().simple(), file.name);
        let url = format!("memory://files/{name}");
        self.lock()
            .await
            .files
            .insert(url.clone(), file.data.clone());
        file.name = name;
        file.url = Some(url);
        Ok(file)
    }
}

fn invalid_session() -> SdkError {
    SdkError::new(SdkError::INVALID_SESSION_TOKEN, "Invalid session token")
}

fn open_session(store: &mut Store, user_id: String, now: chrono::DateTime<chrono::Utc>) -> String {
    let token = if store.revocable_sessions {
        format!("r:{}", Uuid::new_v4().simple())
    } else {
        Uuid::new_v4().simple().to_string()
    };
    store.sessions.insert(
        token.clone(),
        SessionRecord {
            id: new_object_id(),
            user_id,
            created_at: now,
        },
    );
    store.current_token = Some(token.clone());
    token
}

fn user_for_token(store: &Store, token: &str) -> Result<SdkObject> {
    let record = store.sessions.get(token).ok_or_else(invalid_session)?;
    let mut user = store
        .find_by_id(USER_CLASS, &record.user_id)
        .cloned()
        .ok_or_else(invalid_session)?;
    user.set("sessionToken", token);
    Ok(user)
}
