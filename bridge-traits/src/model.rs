//! SDK value types
//!
//! Plain data carried between the SDK, the interceptor chain, and callers.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SdkError;
use crate::sdk::EntityType;

/// Class name the SDK uses for user objects.
pub const USER_CLASS: &str = "_User";

/// Class name the SDK uses for session objects.
pub const SESSION_CLASS: &str = "_Session";

/// A backend object: a class name, an optional server id, and a bag of
/// JSON attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkObject {
    pub class_name: String,
    #[serde(rename = "objectId")]
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    attributes: Map<String, Value>,
}

impl SdkObject {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            id: None,
            created_at: None,
            updated_at: None,
            attributes: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn unset(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Replace every attribute with the given set, keeping identity fields.
    pub fn replace_attributes(&mut self, attributes: Map<String, Value>) {
        self.attributes = attributes;
    }

    /// True until the object has been saved and received a server id.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_user(&self) -> bool {
        self.class_name == USER_CLASS
    }
}

/// A single query constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    EqualTo(String, Value),
    NotEqualTo(String, Value),
    GreaterThan(String, Value),
    GreaterThanOrEqualTo(String, Value),
    LessThan(String, Value),
    LessThanOrEqualTo(String, Value),
    Exists(String),
    DoesNotExist(String),
}

impl Constraint {
    pub fn key(&self) -> &str {
        match self {
            Self::EqualTo(key, _)
            | Self::NotEqualTo(key, _)
            | Self::GreaterThan(key, _)
            | Self::GreaterThanOrEqualTo(key, _)
            | Self::LessThan(key, _)
            | Self::LessThanOrEqualTo(key, _)
            | Self::Exists(key)
            | Self::DoesNotExist(key) => key,
        }
    }
}

/// Sort direction for a query key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending(String),
    Descending(String),
}

/// A query description: the class, its constraints, ordering, and window.
///
/// `limit` of `None` means the SDK default applies (the SDK's `-1` sentinel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub class_name: String,
    pub constraints: Vec<Constraint>,
    pub order: Vec<SortOrder>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

impl Query {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            constraints: Vec::new(),
            order: Vec::new(),
            limit: None,
            skip: None,
        }
    }

    pub fn equal_to(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints
            .push(Constraint::EqualTo(key.into(), value.into()));
        self
    }

    pub fn not_equal_to(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints
            .push(Constraint::NotEqualTo(key.into(), value.into()));
        self
    }

    pub fn greater_than(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints
            .push(Constraint::GreaterThan(key.into(), value.into()));
        self
    }

    pub fn greater_than_or_equal_to(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.constraints
            .push(Constraint::GreaterThanOrEqualTo(key.into(), value.into()));
        self
    }

    pub fn less_than(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints
            .push(Constraint::LessThan(key.into(), value.into()));
        self
    }

    pub fn less_than_or_equal_to(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints
            .push(Constraint::LessThanOrEqualTo(key.into(), value.into()));
        self
    }

    pub fn exists(mut self, key: impl Into<String>) -> Self {
        self.constraints.push(Constraint::Exists(key.into()));
        self
    }

    pub fn does_not_exist(mut self, key: impl Into<String>) -> Self {
        self.constraints.push(Constraint::DoesNotExist(key.into()));
        self
    }

    pub fn ascending(mut self, key: impl Into<String>) -> Self {
        self.order.push(SortOrder::Ascending(key.into()));
        self
    }

    pub fn descending(mut self, key: impl Into<String>) -> Self {
        self.order.push(SortOrder::Descending(key.into()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }
}

/// A file handle: the name it was created with, its contents, and the URL
/// assigned once saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkFile {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
    pub url: Option<String>,
}

impl SdkFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            data: data.into(),
            url: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_saved(&self) -> bool {
        self.url.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// The value a bridged call resolves with.
///
/// Interceptors see every call's result through this one type, so a single
/// success handler can observe saves, queries, and cloud calls alike. Typed
/// façades convert the final payload back with the `into_*` accessors.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Unit,
    Object(SdkObject),
    Objects(Vec<SdkObject>),
    MaybeObject(Option<SdkObject>),
    Count(u64),
    File(SdkFile),
    GeoPoint(GeoPoint),
    Json(Value),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Object(_) => "object",
            Self::Objects(_) => "objects",
            Self::MaybeObject(_) => "maybe-object",
            Self::Count(_) => "count",
            Self::File(_) => "file",
            Self::GeoPoint(_) => "geo-point",
            Self::Json(_) => "json",
        }
    }

    pub fn into_unit(self) -> Result<(), SdkError> {
        match self {
            Self::Unit => Ok(()),
            other => Err(SdkError::unexpected_payload("unit", other.kind())),
        }
    }

    pub fn into_object(self) -> Result<SdkObject, SdkError> {
        match self {
            Self::Object(object) => Ok(object),
            Self::MaybeObject(Some(object)) => Ok(object),
            other => Err(SdkError::unexpected_payload("object", other.kind())),
        }
    }

    pub fn into_objects(self) -> Result<Vec<SdkObject>, SdkError> {
        match self {
            Self::Objects(objects) => Ok(objects),
            other => Err(SdkError::unexpected_payload("objects", other.kind())),
        }
    }

    pub fn into_maybe_object(self) -> Result<Option<SdkObject>, SdkError> {
        match self {
            Self::MaybeObject(object) => Ok(object),
            Self::Object(object) => Ok(Some(object)),
            other => Err(SdkError::unexpected_payload("maybe-object", other.kind())),
        }
    }

    pub fn into_count(self) -> Result<u64, SdkError> {
        match self {
            Self::Count(count) => Ok(count),
            other => Err(SdkError::unexpected_payload("count", other.kind())),
        }
    }

    pub fn into_file(self) -> Result<SdkFile, SdkError> {
        match self {
            Self::File(file) => Ok(file),
            other => Err(SdkError::unexpected_payload("file", other.kind())),
        }
    }

    pub fn into_geo_point(self) -> Result<GeoPoint, SdkError> {
        match self {
            Self::GeoPoint(point) => Ok(point),
            other => Err(SdkError::unexpected_payload("geo-point", other.kind())),
        }
    }

    pub fn into_json(self) -> Result<Value, SdkError> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Unit => Ok(Value::Null),
            other => Err(SdkError::unexpected_payload("json", other.kind())),
        }
    }

    /// Read a string argument, as passed to static methods like `log_in`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl From<SdkObject> for Payload {
    fn from(object: SdkObject) -> Self {
        Self::Object(object)
    }
}

impl From<Vec<SdkObject>> for Payload {
    fn from(objects: Vec<SdkObject>) -> Self {
        Self::Objects(objects)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self::Json(Value::String(value.to_string()))
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Self::Json(Value::String(value))
    }
}

/// The object a method was invoked on.
///
/// Static methods are invoked on their class, recorded as
/// [`Receiver::Class`].
#[derive(Debug, Clone, PartialEq)]
pub enum Receiver {
    Object(SdkObject),
    Query(Query),
    File(SdkFile),
    Class(EntityType),
}

impl Receiver {
    pub fn as_object(&self) -> Option<&SdkObject> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_query(&self) -> Option<&Query> {
        match self {
            Self::Query(query) => Some(query),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&SdkFile> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_attributes() {
        let mut obj = SdkObject::new("GameScore").with("score", 10);
        assert_eq!(obj.get("score"), Some(&json!(10)));
        assert!(obj.is_new());

        obj.set("player", "sean");
        assert_eq!(obj.get_str("player"), Some("sean"));
        assert!(obj.has("player"));

        assert_eq!(obj.unset("player"), Some(json!("sean")));
        assert!(!obj.has("player"));
    }

    #[test]
    fn test_object_serializes_with_sdk_field_names() {
        let obj = SdkObject::new("GameScore").with_id("x1").with("score", 3);
        let value = serde_json::to_value(&obj).unwrap();
        assert_eq!(value["className"], json!("GameScore"));
        assert_eq!(value["objectId"], json!("x1"));
        assert_eq!(value["attributes"]["score"], json!(3));
    }

    #[test]
    fn test_query_builder() {
        let query = Query::new("GameScore")
            .equal_to("player", "sean")
            .greater_than("score", 5)
            .ascending("score")
            .limit(10)
            .skip(20);

        assert_eq!(query.constraints.len(), 2);
        assert_eq!(query.constraints[1].key(), "score");
        assert_eq!(query.order, vec![SortOrder::Ascending("score".to_string())]);
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.skip, Some(20));
    }

    #[test]
    fn test_payload_conversions() {
        let obj = SdkObject::new("A");
        assert_eq!(Payload::from(obj.clone()).into_object().unwrap(), obj);
        assert_eq!(Payload::Count(4).into_count().unwrap(), 4);
        assert_eq!(
            Payload::MaybeObject(None).into_maybe_object().unwrap(),
            None
        );
        assert_eq!(Payload::Unit.into_json().unwrap(), Value::Null);
    }

    #[test]
    fn test_payload_mismatch_is_error() {
        let err = Payload::Count(1).into_objects().unwrap_err();
        assert_eq!(err.code, SdkError::OTHER_CAUSE);
        assert!(err.message.contains("count"));
    }

    #[test]
    fn test_payload_as_str() {
        assert_eq!(Payload::from("name").as_str(), Some("name"));
        assert_eq!(Payload::Count(1).as_str(), None);
    }

    #[test]
    fn test_file_saved_state() {
        let mut file = SdkFile::new("a.txt", &b"hello"[..]).with_content_type("text/plain");
        assert!(!file.is_saved());
        file.url = Some("memory://files/a.txt".to_string());
        assert!(file.is_saved());
    }
}
