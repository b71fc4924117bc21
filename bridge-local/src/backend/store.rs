//! In-memory data and query evaluation

use bridge_traits::{Constraint, Query, SdkObject, SortOrder};
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Page size applied when a query carries no limit.
pub(crate) const DEFAULT_QUERY_LIMIT: usize = 100;

pub(crate) struct Credential {
    pub user_id: String,
    pub password_hash: String,
}

pub(crate) struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
pub(crate) struct Store {
    /// Objects per class, in insertion order.
    pub objects: HashMap<String, Vec<SdkObject>>,
    /// Username to credential.
    pub credentials: HashMap<String, Credential>,
    /// Session token to session.
    pub sessions: HashMap<String, SessionRecord>,
    pub current_token: Option<String>,
    pub revocable_sessions: bool,
    pub pushes: Vec<Value>,
    pub events: Vec<(String, Value)>,
    pub password_resets: Vec<String>,
    pub files: HashMap<String, Bytes>,
}

impl Store {
    pub fn class(&self, class_name: &str) -> &[SdkObject] {
        self.objects
            .get(class_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn find_by_id(&self, class_name: &str, id: &str) -> Option<&SdkObject> {
        self.class(class_name)
            .iter()
            .find(|object| object.id.as_deref() == Some(id))
    }

    /// Insert or replace by id.
    pub fn upsert(&mut self, object: SdkObject) {
        let class = self.objects.entry(object.class_name.clone()).or_default();
        match class.iter_mut().find(|existing| existing.id == object.id) {
            Some(existing) => *existing = object,
            None => class.push(object),
        }
    }

    pub fn remove(&mut self, class_name: &str, id: &str) -> Option<SdkObject> {
        let class = self.objects.get_mut(class_name)?;
        let index = class
            .iter()
            .position(|object| object.id.as_deref() == Some(id))?;
        Some(class.remove(index))
    }

    /// Objects matching every constraint, sorted, without the limit/skip
    /// window applied.
    pub fn matching(&self, query: &Query) -> Vec<SdkObject> {
        let mut results: Vec<SdkObject> = self
            .class(&query.class_name)
            .iter()
            .filter(|object| query.constraints.iter().all(|c| satisfies(object, c)))
            .cloned()
            .collect();
        if !query.order.is_empty() {
            results.sort_by(|a, b| compare_by(&query.order, a, b));
        }
        results
    }

    /// Matching objects with the query's skip and limit applied.
    pub fn window(&self, query: &Query) -> Vec<SdkObject> {
        self.matching(query)
            .into_iter()
            .skip(query.skip.unwrap_or(0))
            .take(query.limit.unwrap_or(DEFAULT_QUERY_LIMIT))
            .collect()
    }
}

pub(crate) fn hash_password(username: &str, password: &str) -> String {
    format!("{:x}", Sha256::digest(format!("{username}:{password}")))
}

/// A field as seen by queries, including the identity fields.
fn field(object: &SdkObject, key: &str) -> Option<Value> {
    let timestamp = |t: Option<DateTime<Utc>>| {
        t.map(|t| Value::String(t.to_rfc3339_opts(SecondsFormat::Micros, true)))
    };
    match key {
        "objectId" => object.id.clone().map(Value::String),
        "createdAt" => timestamp(object.created_at),
        "updatedAt" => timestamp(object.updated_at),
        _ => object.get(key).cloned(),
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn satisfies(object: &SdkObject, constraint: &Constraint) -> bool {
    let value = field(object, constraint.key());
    let ordered = |expected: &Value, accept: fn(Ordering) -> bool| {
        value
            .as_ref()
            .and_then(|v| compare_values(v, expected))
            .is_some_and(accept)
    };
    match constraint {
        Constraint::EqualTo(_, expected) => value.as_ref() == Some(expected),
        Constraint::NotEqualTo(_, expected) => value.as_ref() != Some(expected),
        Constraint::GreaterThan(_, expected) => ordered(expected, Ordering::is_gt),
        Constraint::GreaterThanOrEqualTo(_, expected) => ordered(expected, Ordering::is_ge),
        Constraint::LessThan(_, expected) => ordered(expected, Ordering::is_lt),
        Constraint::LessThanOrEqualTo(_, expected) => ordered(expected, Ordering::is_le),
        Constraint::Exists(_) => value.is_some(),
        Constraint::DoesNotExist(_) => value.is_none(),
    }
}

fn compare_by(order: &[SortOrder], a: &SdkObject, b: &SdkObject) -> Ordering {
    for sort in order {
        let (key, descending) = match sort {
            SortOrder::Ascending(key) => (key, false),
            SortOrder::Descending(key) => (key, true),
        };
        // Missing values sort first
        let ordering = match (field(a, key), field(b, key)) {
            (Some(x), Some(y)) => compare_values(&x, &y).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ordering = if descending {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
