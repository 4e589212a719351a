//! Server-side payment verification.
//!
//! The storefront hands amount, email and reference to the hosted payment
//! widget; before an order is written the reference is verified here against
//! the provider, so a client-reported success is never trusted on its own.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::{config::PaystackConfig, error::AppError};

#[derive(Debug, Error)]
pub enum PaymentError {
    /// Transport failure talking to the provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a server-side failure.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Provider does not recognise the reference.
    #[error("payment rejected: {0}")]
    Rejected(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Rejected(reason) => AppError::Validation(vec![
                crate::error::FieldError::new("paymentReference", reason),
            ]),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentVerification {
    pub reference: String,
    pub succeeded: bool,
    /// Amount actually charged, in minor units.
    pub amount: i64,
    pub email: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn verify(&self, reference: &str) -> Result<PaymentVerification, PaymentError>;
}

#[derive(Clone)]
pub struct PaystackGateway {
    client: reqwest::Client,
    base_url: String,
}

impl PaystackGateway {
    /// # Errors
    ///
    /// Returns error if the secret key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &PaystackConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| PaymentError::Parse(format!("Invalid secret key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn verify(&self, reference: &str) -> Result<PaymentVerification, PaymentError> {
        if !is_safe_reference(reference) {
            return Err(PaymentError::Rejected("malformed payment reference".into()));
        }
        let url = format!("{}/transaction/verify/{reference}", self.base_url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status.is_server_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        interpret(reference, status.is_success(), body)
    }
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<VerifyData>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    reference: String,
    amount: i64,
    customer: Option<VerifyCustomer>,
}

#[derive(Debug, Deserialize)]
struct VerifyCustomer {
    email: Option<String>,
}

fn interpret(
    reference: &str,
    http_ok: bool,
    body: VerifyResponse,
) -> Result<PaymentVerification, PaymentError> {
    if !http_ok || !body.status {
        let reason = if body.message.is_empty() {
            "payment could not be verified".to_string()
        } else {
            body.message
        };
        return Err(PaymentError::Rejected(reason));
    }
    let data = body
        .data
        .ok_or_else(|| PaymentError::Parse("verification response has no data".into()))?;
    if data.reference != reference {
        return Err(PaymentError::Rejected(
            "provider returned a different reference".into(),
        ));
    }

    Ok(PaymentVerification {
        reference: data.reference,
        succeeded: data.status == "success",
        amount: data.amount,
        email: data.customer.and_then(|c| c.email),
    })
}

pub fn is_safe_reference(reference: &str) -> bool {
    !reference.is_empty()
        && reference.len() <= 100
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: serde_json::Value) -> VerifyResponse {
        serde_json::from_value(json).expect("decode verify response")
    }

    #[test]
    fn successful_charge_is_reported() {
        let verified = interpret(
            "ref_123",
            true,
            body(serde_json::json!({
                "status": true,
                "message": "Verification successful",
                "data": {
                    "status": "success",
                    "reference": "ref_123",
                    "amount": 25000,
                    "currency": "NGN",
                    "customer": { "email": "buyer@example.com" }
                }
            })),
        )
        .expect("verified");
        assert!(verified.succeeded);
        assert_eq!(verified.amount, 25000);
        assert_eq!(verified.email.as_deref(), Some("buyer@example.com"));
    }

    #[test]
    fn abandoned_charge_is_not_successful() {
        let verified = interpret(
            "ref_123",
            true,
            body(serde_json::json!({
                "status": true,
                "message": "Verification successful",
                "data": { "status": "abandoned", "reference": "ref_123", "amount": 25000 }
            })),
        )
        .expect("verified");
        assert!(!verified.succeeded);
    }

    #[test]
    fn unknown_reference_is_rejected() {
        let err = interpret(
            "ref_404",
            false,
            body(serde_json::json!({
                "status": false,
                "message": "Transaction reference not found"
            })),
        )
        .unwrap_err();
        assert!(matches!(err, PaymentError::Rejected(msg) if msg.contains("not found")));
    }

    #[test]
    fn mismatched_reference_is_rejected() {
        let err = interpret(
            "ref_a",
            true,
            body(serde_json::json!({
                "status": true,
                "data": { "status": "success", "reference": "ref_b", "amount": 1 }
            })),
        )
        .unwrap_err();
        assert!(matches!(err, PaymentError::Rejected(_)));
    }

    #[test]
    fn reference_charset_is_restricted() {
        assert!(is_safe_reference("T1234-abc_9.x"));
        assert!(!is_safe_reference(""));
        assert!(!is_safe_reference("../admin"));
        assert!(!is_safe_reference("a b"));
    }
}
