//! Abstracts the persistence layer behind the six graph-store operations the
//! pipeline needs. Keeping this as a trait (rather than depending on a
//! concrete database client) lets the aggregator, watch correlator, and
//! pipeline stay testable against an in-memory fake.

use futures::Stream;
use serde_json::Value;
use std::pin::Pin;

/// A live-query notification stream, as returned by [`Store::live`].
pub type LiveStream = Pin<Box<dyn Stream<Item = Value> + Send>>;

#[async_trait::async_trait]
pub trait Store {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates a record in `table`, returning the stored (possibly
    /// server-assigned-id) form.
    async fn create(&self, table: &str, record: Value) -> Result<Value, Self::Error>;

    /// Patches an existing record by id.
    async fn update(&self, record_id: &str, patch: Value) -> Result<Value, Self::Error>;

    /// Runs a graph query statement (e.g. a `SELECT` with a `count(->edge)`
    /// projection, or a nested existence check) with bound parameters.
    async fn query(&self, statement: &str, params: Value) -> Result<Vec<Value>, Self::Error>;

    /// Creates a directional edge between two records, with optional
    /// properties carried on the edge itself.
    async fn relate(
        &self,
        from: &str,
        edge: &str,
        to: &str,
        props: Option<Value>,
    ) -> Result<Value, Self::Error>;

    /// Deletes a record by id.
    async fn delete(&self, id: &str) -> Result<(), Self::Error>;

    /// Opens a live-query subscription against `table`, yielding one
    /// notification per change. Used by the pending-products workflow to
    /// pick up queued archive products without polling.
    async fn live(&self, table: &str) -> Result<LiveStream, Self::Error>;
}
