use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Order created at the gateway for a checkout.
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub receipt: String,
    pub status: String,
}

/// Payment as reported by the gateway's payment-status lookup.
#[derive(Debug, Clone)]
pub struct GatewayPayment {
    pub id: String,
    pub order_id: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
    pub method: Option<String>,
}

impl GatewayPayment {
    /// Whether the gateway considers the funds secured.
    pub fn is_settled(&self) -> bool {
        self.status == "captured" || self.status == "authorized"
    }
}

/// Error types for gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Payment gateway is not configured")]
    NotConfigured,
    #[error("Gateway request failed: {0}")]
    Upstream(String),
    #[error("Gateway returned unexpected payload: {0}")]
    BadResponse(String),
}

/// Client for the external payment gateway: order issuance, payment-status
/// lookup, and confirmation signature verification.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order to be paid from the client-side checkout.
    async fn create_order(
        &self,
        amount_cents: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError>;

    /// Fetch the current state of a payment by gateway payment id.
    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError>;

    /// Verify the HMAC confirmation signature over `order_id|payment_id`.
    fn verify_payment_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}
