//! Incremental query loading

use bridge_traits::{CallResult, Query, SdkObject};
use core_patch::Queries;
use tracing::debug;

/// Batch size used when the query has no limit of its own.
pub const DEFAULT_LIMIT: usize = 100;

/// A query that loads its results a batch at a time.
///
/// Every batch goes through the wrapped `find`, so each load is bridged and
/// intercepted like any other call. Loaded batches accumulate in
/// [`collection`](Self::collection).
///
/// ```ignore
/// let mut scores = PagedQuery::new(queries, Query::new("GameScore").limit(20));
/// scores.load_more_while(|page| page.collection().len() < 60).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PagedQuery {
    queries: Queries,
    query: Query,
    snapshot: Option<Query>,
    collection: Vec<SdkObject>,
    last_batch: Option<Vec<SdkObject>>,
    has_more: bool,
}

impl PagedQuery {
    pub fn new(queries: Queries, query: Query) -> Self {
        Self {
            queries,
            query,
            snapshot: None,
            collection: Vec::new(),
            last_batch: None,
            has_more: true,
        }
    }

    /// The configured limit, or [`DEFAULT_LIMIT`] when unset or zero.
    pub fn get_limit(&self) -> usize {
        self.query
            .limit
            .filter(|&limit| limit > 0)
            .unwrap_or(DEFAULT_LIMIT)
    }

    /// The configured skip, or 0 when unset.
    pub fn get_skip(&self) -> usize {
        self.query.skip.unwrap_or(0)
    }

    /// Load the next batch and append it to the collection.
    ///
    /// Resolves with the batch just loaded. A batch shorter than the limit
    /// marks the end of the results; after that no query is sent and the
    /// final batch is returned again without being appended.
    pub async fn load_more(&mut self) -> CallResult<&[SdkObject]> {
        if !self.has_more_to_load() {
            return Ok(self.last_batch.as_deref().unwrap_or_default());
        }
        if self.last_batch.is_none() && self.snapshot.is_none() {
            self.snapshot = Some(self.query.clone());
        }

        let limit = self.get_limit();
        let skip = self.get_skip();
        self.query.limit = Some(limit);
        self.query.skip = Some(skip);

        let batch = self.queries.find(self.query.clone()).await?;
        self.has_more = !batch.is_empty() && batch.len() == limit;
        if self.has_more {
            self.query.skip = Some(skip + limit);
        }
        debug!(
            class = %self.query.class_name,
            skip,
            limit,
            loaded = batch.len(),
            has_more = self.has_more,
            "Loaded query batch"
        );

        self.collection.extend(batch.iter().cloned());
        Ok(self.last_batch.insert(batch).as_slice())
    }

    /// True before the first load and after every load that filled the
    /// limit.
    pub fn has_more_to_load(&self) -> bool {
        self.last_batch.is_none() || self.has_more
    }

    /// Keep loading while `predicate` holds and more results are available.
    pub async fn load_more_while<P>(&mut self, mut predicate: P) -> CallResult<&mut Self>
    where
        P: FnMut(&Self) -> bool,
    {
        while self.has_more_to_load() && predicate(self) {
            self.load_more().await?;
        }
        Ok(self)
    }

    /// Forget every loaded batch and restore the query as it was before the
    /// first load.
    pub fn reset(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.query = snapshot;
        }
        self.collection.clear();
        self.last_batch = None;
        self.has_more = true;
    }

    /// Every object loaded so far, in load order.
    pub fn collection(&self) -> &[SdkObject] {
        &self.collection
    }

    pub fn last_batch(&self) -> Option<&[SdkObject]> {
        self.last_batch.as_deref()
    }

    /// The query as it will be sent by the next load.
    pub fn query(&self) -> &Query {
        &self.query
    }
}
