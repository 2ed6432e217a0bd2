//! Resilient implementation of the upstream product port
//!
//! Composes the raw HTTP client with the guarded call executor: reads go
//! through the breaker with bounded retries, mutations go through the
//! breaker with the replay fallback. Updates and deletes verify the target
//! exists before mutating, so an invalid id surfaces as a client rejection
//! instead of queueing a replay event that can never succeed.

use std::sync::Arc;

use async_trait::async_trait;
use syncline_common::resilience::{Clock, SystemClock};
use syncline_core::CallExecutor;
use syncline_domain::{
    EventAction, Product, ProductPatch, ProductPayload, UpstreamError, UpstreamResult,
};
use tracing::instrument;

use super::client::UpstreamClient;

/// [`UpstreamApi`](syncline_core::UpstreamApi) implementation over HTTP
pub struct UpstreamIntegration<C: Clock = SystemClock> {
    client: Arc<UpstreamClient>,
    executor: Arc<CallExecutor<C>>,
}

impl<C: Clock> UpstreamIntegration<C> {
    pub fn new(client: Arc<UpstreamClient>, executor: Arc<CallExecutor<C>>) -> Self {
        Self { client, executor }
    }

    /// Verify the product exists upstream before mutating it.
    ///
    /// A client rejection from the lookup is re-raised with a message naming
    /// the id; other failures propagate unchanged. This check runs on the
    /// read path, outside the replay fallback: an update or delete issued
    /// while the upstream is down fails here without queueing a retry
    /// event, unlike a create. The asymmetry is deliberate: a mutation
    /// against an id that was never confirmed to exist is not worth
    /// replaying.
    async fn ensure_exists(&self, product_id: &str) -> UpstreamResult<Product> {
        self.executor.execute_guarded_read(|| self.client.get_product(product_id)).await.map_err(
            |error| {
                if error.is_client_rejection() {
                    UpstreamError::ClientRejected(format!("no valid product with id {product_id}"))
                } else {
                    error
                }
            },
        )
    }
}

#[async_trait]
impl<C: Clock> syncline_core::UpstreamApi for UpstreamIntegration<C> {
    #[instrument(skip(self))]
    async fn fetch_products(&self) -> UpstreamResult<Vec<Product>> {
        self.executor.execute_guarded_read(|| self.client.get_products()).await
    }

    #[instrument(skip(self))]
    async fn fetch_product(&self, product_id: &str) -> UpstreamResult<Product> {
        self.executor.execute_guarded_read(|| self.client.get_product(product_id)).await
    }

    #[instrument(skip(self, payload))]
    async fn create_product(&self, payload: &ProductPayload) -> UpstreamResult<Product> {
        payload.validate()?;
        self.executor
            .execute_guarded_with_fallback(
                || self.client.post_product(payload),
                payload,
                EventAction::Create,
            )
            .await
    }

    #[instrument(skip(self, patch))]
    async fn update_product(
        &self,
        patch: &ProductPatch,
        product_id: &str,
    ) -> UpstreamResult<Product> {
        let current = self.ensure_exists(product_id).await?;
        let merged = ProductPayload::from(&current).apply_patch(patch);
        merged.validate()?;
        self.executor
            .execute_guarded_with_fallback(
                || self.client.patch_product(patch, product_id),
                &merged,
                EventAction::Update,
            )
            .await
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, product_id: &str) -> UpstreamResult<()> {
        self.ensure_exists(product_id).await?;
        let snapshot = ProductPayload::for_delete(product_id);
        self.executor
            .execute_guarded_with_fallback(
                || self.client.delete_product(product_id),
                &snapshot,
                EventAction::Delete,
            )
            .await
    }
}
