//! Query operations

use crate::patcher::{CallFuture, PatchedSdk};
use bridge_traits::{CallResult, EntityType, MethodCall, Payload, Query, Receiver, SdkObject};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Run queries through the bridge.
#[derive(Debug, Clone)]
pub struct Queries {
    sdk: Arc<PatchedSdk>,
}

impl Queries {
    pub fn new(sdk: Arc<PatchedSdk>) -> Self {
        Self { sdk }
    }

    fn on_query(&self, method: &str, query: Query, args: Vec<Payload>) -> MethodCall {
        MethodCall::on_instance(EntityType::Query, method, Receiver::Query(query), args)
    }

    pub fn count(&self, query: Query) -> CallFuture<u64> {
        self.sdk
            .call_as(self.on_query("count", query, Vec::new()), Payload::into_count)
    }

    pub fn find(&self, query: Query) -> CallFuture<Vec<SdkObject>> {
        self.sdk
            .call_as(self.on_query("find", query, Vec::new()), Payload::into_objects)
    }

    /// The first match, if any.
    pub fn first(&self, query: Query) -> CallFuture<Option<SdkObject>> {
        self.sdk
            .call_as(self.on_query("first", query, Vec::new()), Payload::into_maybe_object)
    }

    /// The object with `id`, provided it also satisfies the query.
    pub fn get(&self, query: Query, id: impl Into<String>) -> CallFuture<SdkObject> {
        let call = self.on_query("get", query, vec![Payload::from(id.into())]);
        self.sdk.call_as(call, Payload::into_object)
    }

    /// Visit every match strictly in order.
    ///
    /// Matches are loaded with a single wrapped `find`. Each callback is
    /// awaited before the next one starts, and the first callback error
    /// stops the walk and is returned.
    pub async fn each<F, Fut>(&self, query: Query, mut callback: F) -> CallResult<()>
    where
        F: FnMut(SdkObject) -> Fut,
        Fut: Future<Output = CallResult<()>>,
    {
        let items = self.find(query).await?;
        debug!(items = items.len(), "Visiting query results");
        for item in items {
            callback(item).await?;
        }
        Ok(())
    }
}
