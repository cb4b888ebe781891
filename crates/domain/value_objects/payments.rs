use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionRequest {
    pub product_ids: Vec<String>,
    pub customer_email: String,
    pub success_url: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
    pub amount_minor: i64,
    pub tax_amount_minor: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price_minor: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_minor: Option<i64>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.price_minor.is_none()
    }
}

/// Inbound checkout webhook. Only the fields the completion flow reads are modelled.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutWebhookEvent {
    #[serde(rename = "type")]
    pub type_: String,
    pub data: CheckoutWebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutWebhookData {
    pub id: String,
    pub status: String,
    #[serde(default, deserialize_with = "string_metadata")]
    pub metadata: HashMap<String, String>,
}

// Provider metadata values may be strings, numbers or booleans.
fn string_metadata<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<HashMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}
