use super::ports::{GatewayError, GatewayOrder, GatewayPayment, PaymentGateway};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Razorpay REST client. Orders are created server-side; the checkout runs
/// client-side and posts back `payment_id`/`order_id`/`signature`, where the
/// signature is HMAC-SHA256 over `"{order_id}|{payment_id}"` keyed with the
/// key secret.
pub struct RazorpayClient {
    key_id: String,
    key_secret: String,
    base_url: String,
    http_client: reqwest::Client,
}

#[derive(serde::Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(serde::Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
    receipt: Option<String>,
    status: String,
}

#[derive(serde::Deserialize)]
struct PaymentResponse {
    id: String,
    order_id: Option<String>,
    amount: i64,
    currency: String,
    status: String,
    method: Option<String>,
}

impl RazorpayClient {
    pub fn new(key_id: String, key_secret: String, base_url: String) -> Self {
        Self {
            key_id,
            key_secret,
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    fn ensure_configured(&self) -> Result<(), GatewayError> {
        if self.key_id.is_empty() || self.key_secret.is_empty() {
            return Err(GatewayError::NotConfigured);
        }
        Ok(())
    }

    /// Compute the expected confirmation signature for an order/payment pair.
    pub fn payment_signature(key_secret: &str, order_id: &str, payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(key_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_order(
        &self,
        amount_cents: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        self.ensure_configured()?;

        let url = format!("{}/v1/orders", self.base_url);
        tracing::debug!(
            "Creating gateway order: amount_cents={}, currency={}, receipt={}",
            amount_cents,
            currency,
            receipt
        );

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderBody {
                amount: amount_cents,
                currency,
                receipt,
            })
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Upstream(format!(
                "order creation failed with status {}: {}",
                status, body
            )));
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::BadResponse(e.to_string()))?;

        tracing::info!("Gateway order created: order_id={}", order.id);

        Ok(GatewayOrder {
            id: order.id,
            amount_cents: order.amount,
            currency: order.currency,
            receipt: order.receipt.unwrap_or_default(),
            status: order.status,
        })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        self.ensure_configured()?;

        let url = format!("{}/v1/payments/{}", self.base_url, payment_id);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Upstream(format!(
                "payment lookup failed with status {}: {}",
                status, body
            )));
        }

        let payment: PaymentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::BadResponse(e.to_string()))?;

        Ok(GatewayPayment {
            id: payment.id,
            order_id: payment.order_id,
            amount_cents: payment.amount,
            currency: payment.currency,
            status: payment.status,
            method: payment.method,
        })
    }

    fn verify_payment_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        if self.key_secret.is_empty() {
            return false;
        }
        let expected = Self::payment_signature(&self.key_secret, order_id, payment_id);
        // Constant-time comparison
        subtle::ConstantTimeEq::ct_eq(expected.as_bytes(), signature.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(secret: &str) -> RazorpayClient {
        RazorpayClient::new(
            "rzp_test_key".to_string(),
            secret.to_string(),
            "https://api.razorpay.com".to_string(),
        )
    }

    #[test]
    fn test_verify_payment_signature_valid() {
        let client = test_client("test_secret");
        let sig = RazorpayClient::payment_signature("test_secret", "order_abc", "pay_xyz");
        assert!(client.verify_payment_signature("order_abc", "pay_xyz", &sig));
    }

    #[test]
    fn test_verify_payment_signature_invalid() {
        let client = test_client("test_secret");
        assert!(!client.verify_payment_signature("order_abc", "pay_xyz", "deadbeef"));
    }

    #[test]
    fn test_verify_payment_signature_wrong_pair() {
        let client = test_client("test_secret");
        let sig = RazorpayClient::payment_signature("test_secret", "order_abc", "pay_xyz");
        // Signature for one pair must not verify another
        assert!(!client.verify_payment_signature("order_other", "pay_xyz", &sig));
    }

    #[test]
    fn test_verify_with_empty_secret_refuses() {
        let client = test_client("");
        assert!(!client.verify_payment_signature("order_abc", "pay_xyz", ""));
    }

    #[test]
    fn test_settled_statuses() {
        let mut payment = GatewayPayment {
            id: "pay_1".to_string(),
            order_id: Some("order_1".to_string()),
            amount_cents: 49900,
            currency: "INR".to_string(),
            status: "captured".to_string(),
            method: None,
        };
        assert!(payment.is_settled());
        payment.status = "authorized".to_string();
        assert!(payment.is_settled());
        payment.status = "failed".to_string();
        assert!(!payment.is_settled());
    }
}
