//! Port interfaces for the replication pipeline

use async_trait::async_trait;
use syncline_domain::{EventAction, Product, ProductPatch, ProductPayload, UpstreamResult};

/// Trait for the partner-facing product API.
///
/// Implemented by the infra layer over HTTP; replay schedulers and the
/// application mutation path both talk to the upstream exclusively through
/// this port.
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    /// Fetch every product known upstream
    async fn fetch_products(&self) -> UpstreamResult<Vec<Product>>;

    /// Fetch one product by id
    async fn fetch_product(&self, product_id: &str) -> UpstreamResult<Product>;

    /// Create a product upstream, returning the persisted entity
    async fn create_product(&self, payload: &ProductPayload) -> UpstreamResult<Product>;

    /// Apply a partial update to an existing product
    async fn update_product(&self, patch: &ProductPatch, product_id: &str)
        -> UpstreamResult<Product>;

    /// Delete a product by id
    async fn delete_product(&self, product_id: &str) -> UpstreamResult<()>;
}

/// Trait for recording a mutation as a replication event.
///
/// Notification is an in-memory queue append and cannot fail; which queue
/// and which replay reason an implementation targets is fixed at
/// construction time.
pub trait ReplayNotifier: Send + Sync {
    /// Record `snapshot` as a pending `action` mutation.
    fn notify(&self, snapshot: &ProductPayload, action: EventAction);
}
