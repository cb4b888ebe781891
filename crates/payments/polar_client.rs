use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::domain::value_objects::payments::{
    CheckoutSession, CheckoutSessionRequest, CheckoutWebhookEvent, ProductChanges, ProductDraft,
};
use crate::payments::webhook_signature::{StandardWebhookVerifier, WebhookHeaders};

const PRICE_CURRENCY: &str = "usd";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolarEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl PolarEnvironment {
    pub fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => PolarEnvironment::Production,
            _ => PolarEnvironment::Sandbox,
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            PolarEnvironment::Sandbox => "https://sandbox-api.polar.sh",
            PolarEnvironment::Production => "https://api.polar.sh",
        }
    }
}

/// Minimal Polar client built on reqwest.
pub struct PolarClient {
    http: reqwest::Client,
    access_token: String,
    base_url: String,
    organization_id: Option<String>,
    verifier: StandardWebhookVerifier,
}

#[derive(Debug, Deserialize)]
struct PolarErrorEnvelope {
    detail: Option<serde_json::Value>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct FixedPrice {
    amount_type: &'static str,
    price_amount: i64,
    price_currency: &'static str,
}

impl FixedPrice {
    fn new(price_minor: i64) -> Self {
        Self {
            amount_type: "fixed",
            price_amount: price_minor,
            price_currency: PRICE_CURRENCY,
        }
    }
}

impl PolarClient {
    pub fn new(
        access_token: String,
        webhook_secret: &str,
        environment: PolarEnvironment,
        organization_id: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            access_token,
            base_url: environment.base_url().to_string(),
            organization_id,
            verifier: StandardWebhookVerifier::new(webhook_secret)?,
        })
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (polar_error, polar_detail) = match serde_json::from_str::<PolarErrorEnvelope>(&body) {
            Ok(envelope) => (envelope.error, envelope.detail),
            Err(_) => (None, None),
        };

        error!(
            status = %status,
            polar_error = ?polar_error,
            polar_detail = ?polar_detail,
            response_body = %body,
            context = %context,
            "polar api request failed"
        );

        anyhow::bail!("Polar API request failed: {} (status {})", context, status);
    }

    /// Opens a hosted checkout for the given products.
    pub async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession> {
        let body = json!({
            "products": request.product_ids,
            "customer_email": request.customer_email,
            "success_url": request.success_url,
            "metadata": request.metadata,
        });

        let resp = self
            .http
            .post(format!("{}/v1/checkouts/", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create checkout session").await?;

        #[derive(Deserialize)]
        struct CheckoutResp {
            id: String,
            url: String,
            #[serde(default)]
            amount: Option<i64>,
            #[serde(default)]
            tax_amount: Option<i64>,
            #[serde(default)]
            expires_at: Option<DateTime<Utc>>,
        }

        let parsed: CheckoutResp = resp.json().await?;
        Ok(CheckoutSession {
            id: parsed.id,
            url: parsed.url,
            amount_minor: parsed.amount.unwrap_or_default(),
            tax_amount_minor: parsed.tax_amount.unwrap_or_default(),
            expires_at: parsed.expires_at,
        })
    }

    /// Creates a one-time product with a single fixed price and returns its id.
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<String> {
        let mut body = json!({
            "name": draft.name,
            "description": draft.description,
            "prices": [FixedPrice::new(draft.price_minor)],
        });
        if let Some(organization_id) = self.organization_id.as_deref() {
            body["organization_id"] = json!(organization_id);
        }

        let resp = self
            .http
            .post(format!("{}/v1/products/", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create product").await?;

        #[derive(Deserialize)]
        struct ProductResp {
            id: String,
        }

        let parsed: ProductResp = resp.json().await?;
        Ok(parsed.id)
    }

    pub async fn update_product(&self, product_id: &str, changes: &ProductChanges) -> Result<()> {
        let mut body = serde_json::Map::new();
        if let Some(name) = changes.name.as_ref() {
            body.insert("name".to_string(), json!(name));
        }
        if let Some(description) = changes.description.as_ref() {
            body.insert("description".to_string(), json!(description));
        }
        if let Some(price_minor) = changes.price_minor {
            body.insert("prices".to_string(), json!([FixedPrice::new(price_minor)]));
        }

        self.patch_product(product_id, serde_json::Value::Object(body), "update product")
            .await
    }

    pub async fn archive_product(&self, product_id: &str) -> Result<()> {
        self.patch_product(product_id, json!({ "is_archived": true }), "archive product")
            .await
    }

    async fn patch_product(
        &self,
        product_id: &str,
        body: serde_json::Value,
        context: &str,
    ) -> Result<()> {
        let resp = self
            .http
            .patch(format!("{}/v1/products/{}", self.base_url, product_id))
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .json(&body)
            .send()
            .await?;
        Self::ensure_success(resp, context).await?;

        Ok(())
    }

    /// Checks the Standard Webhooks signature against the current time.
    pub fn verify_webhook(&self, headers: &WebhookHeaders, payload: &[u8]) -> Result<()> {
        self.verifier.verify(headers, payload, Utc::now())
    }

    pub fn parse_checkout_event(payload: &[u8]) -> Result<CheckoutWebhookEvent> {
        serde_json::from_slice(payload).context("invalid checkout webhook payload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_selects_server() {
        assert_eq!(
            PolarEnvironment::from_str("production").base_url(),
            "https://api.polar.sh"
        );
        assert_eq!(
            PolarEnvironment::from_str("sandbox").base_url(),
            "https://sandbox-api.polar.sh"
        );
        assert_eq!(PolarEnvironment::from_str(""), PolarEnvironment::Sandbox);
    }

    #[test]
    fn verify_webhook_accepts_signed_event() {
        let client = PolarClient::new(
            "token".to_string(),
            "polar-webhook-secret",
            PolarEnvironment::Sandbox,
            None,
        )
        .unwrap();
        let body = br#"{"type":"checkout.updated","data":{"id":"6f1b3c1e-0f43-4d0a-9a8e-2a4b1d9c7e55","status":"succeeded","metadata":{"payment_type":"new"}}}"#;
        let ts = Utc::now().timestamp();
        let signature = StandardWebhookVerifier::new("polar-webhook-secret")
            .unwrap()
            .sign("msg_1", ts, body)
            .unwrap();

        let headers = WebhookHeaders {
            id: "msg_1".to_string(),
            timestamp: ts.to_string(),
            signature,
        };
        client.verify_webhook(&headers, body).unwrap();
        assert!(client.verify_webhook(&headers, b"{}").is_err());

        let event = PolarClient::parse_checkout_event(body).unwrap();

        assert_eq!(event.data.status, "succeeded");
        assert_eq!(
            event.data.metadata.get("payment_type").map(String::as_str),
            Some("new")
        );
    }
}
