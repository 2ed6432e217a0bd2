//! Product data types used throughout the replication pipeline

use serde::{Deserialize, Serialize};

use crate::errors::{UpstreamError, UpstreamResult};

/// A product as materialized by the upstream dependency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

/// Wire snapshot of a product used for create payloads, replication events,
/// and replay reconstruction.
///
/// All fields are optional and `None` fields are omitted from JSON. A create
/// payload has no `id` (the upstream assigns one); a delete snapshot carries
/// only the `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl ProductPayload {
    /// Build a snapshot carrying only the id, for delete replay events.
    pub fn for_delete(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), ..Self::default() }
    }

    /// Validate the payload before it is sent upstream.
    ///
    /// A negative price is a caller mistake rather than a dependency fault,
    /// so it maps to [`UpstreamError::ClientRejected`].
    pub fn validate(&self) -> UpstreamResult<()> {
        if let Some(price) = self.price {
            if price < 0.0 {
                return Err(UpstreamError::ClientRejected(format!(
                    "price must not be negative, got {price}"
                )));
            }
        }
        Ok(())
    }

    /// Merge a patch over this snapshot, keeping existing values where the
    /// patch is silent.
    #[must_use]
    pub fn apply_patch(&self, patch: &ProductPatch) -> Self {
        Self {
            id: self.id.clone(),
            name: patch.name.clone().or_else(|| self.name.clone()),
            price: patch.price.or(self.price),
            quantity: patch.quantity.or(self.quantity),
        }
    }
}

impl From<&Product> for ProductPayload {
    fn from(product: &Product) -> Self {
        Self {
            id: Some(product.id.clone()),
            name: Some(product.name.clone()),
            price: Some(product.price),
            quantity: Some(product.quantity),
        }
    }
}

/// Partial update for an existing product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl ProductPatch {
    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.quantity.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        Product { id: "p-1".to_string(), name: "widget".to_string(), price: 9.99, quantity: 3 }
    }

    /// Validates payload construction from a product.
    ///
    /// Assertions:
    /// - Confirms every snapshot field mirrors the product.
    #[test]
    fn test_payload_from_product() {
        let payload = ProductPayload::from(&sample_product());
        assert_eq!(payload.id.as_deref(), Some("p-1"));
        assert_eq!(payload.name.as_deref(), Some("widget"));
        assert_eq!(payload.price, Some(9.99));
        assert_eq!(payload.quantity, Some(3));
    }

    /// Validates `ProductPayload::for_delete` carries only the id.
    #[test]
    fn test_payload_for_delete() {
        let payload = ProductPayload::for_delete("p-9");
        assert_eq!(payload.id.as_deref(), Some("p-9"));
        assert!(payload.name.is_none());
        assert!(payload.price.is_none());
        assert!(payload.quantity.is_none());
    }

    /// Validates that `None` fields are omitted from the JSON body.
    #[test]
    fn test_payload_serialization_skips_none() {
        let payload = ProductPayload::for_delete("p-9");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({ "id": "p-9" }));
    }

    /// Validates negative-price rejection.
    ///
    /// Assertions:
    /// - A negative price maps to `ClientRejected`.
    /// - A zero price is accepted.
    #[test]
    fn test_payload_validate_price() {
        let mut payload = ProductPayload::from(&sample_product());
        payload.price = Some(-1.0);
        assert!(matches!(payload.validate(), Err(UpstreamError::ClientRejected(_))));

        payload.price = Some(0.0);
        assert!(payload.validate().is_ok());
    }

    /// Validates patch merging keeps untouched fields.
    #[test]
    fn test_apply_patch_keeps_existing_fields() {
        let snapshot = ProductPayload::from(&sample_product());
        let patch = ProductPatch { price: Some(12.5), ..ProductPatch::default() };

        let merged = snapshot.apply_patch(&patch);
        assert_eq!(merged.id.as_deref(), Some("p-1"));
        assert_eq!(merged.name.as_deref(), Some("widget"));
        assert_eq!(merged.price, Some(12.5));
        assert_eq!(merged.quantity, Some(3));
    }

    /// Validates `ProductPatch::is_empty`.
    #[test]
    fn test_patch_is_empty() {
        assert!(ProductPatch::default().is_empty());
        let patch = ProductPatch { quantity: Some(1), ..ProductPatch::default() };
        assert!(!patch.is_empty());
    }
}
