use anyhow::{Context, Result, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

pub const WEBHOOK_ID_HEADER: &str = "webhook-id";
pub const WEBHOOK_TIMESTAMP_HEADER: &str = "webhook-timestamp";
pub const WEBHOOK_SIGNATURE_HEADER: &str = "webhook-signature";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

/// Verifies Standard Webhooks signatures: `v1,<base64 hmac-sha256("{id}.{timestamp}.{body}")>`.
///
/// A `whsec_`-prefixed secret is base64 decoded, any other secret is used as raw bytes.
#[derive(Clone)]
pub struct StandardWebhookVerifier {
    key: Vec<u8>,
    tolerance: Duration,
}

impl StandardWebhookVerifier {
    pub fn new(secret: &str) -> Result<Self> {
        let key = match secret.strip_prefix(SECRET_PREFIX) {
            Some(encoded) => STANDARD
                .decode(encoded)
                .context("webhook secret is not valid base64")?,
            None => secret.as_bytes().to_vec(),
        };

        if key.is_empty() {
            bail!("webhook secret is empty");
        }

        Ok(Self {
            key,
            tolerance: Duration::minutes(5),
        })
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn sign(&self, id: &str, timestamp: i64, payload: &[u8]) -> Result<String> {
        let mac = self.mac(id, &timestamp.to_string(), payload)?;
        let digest = mac.finalize().into_bytes();
        Ok(format!("{},{}", SIGNATURE_VERSION, STANDARD.encode(digest)))
    }

    pub fn verify(
        &self,
        headers: &WebhookHeaders,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let timestamp: i64 = headers
            .timestamp
            .trim()
            .parse()
            .context("webhook timestamp is not an integer")?;
        let sent_at = DateTime::<Utc>::from_timestamp(timestamp, 0)
            .context("webhook timestamp is out of range")?;

        if now - sent_at > self.tolerance || sent_at - now > self.tolerance {
            bail!("webhook timestamp outside tolerance");
        }

        // The header may carry several space separated signatures during secret rotation.
        for candidate in headers.signature.split_whitespace() {
            let Some((version, encoded)) = candidate.split_once(',') else {
                continue;
            };
            if version != SIGNATURE_VERSION {
                continue;
            }
            let Ok(provided) = STANDARD.decode(encoded) else {
                continue;
            };

            let mac = self.mac(&headers.id, headers.timestamp.trim(), payload)?;
            if mac.verify_slice(&provided).is_ok() {
                return Ok(());
            }
        }

        bail!("invalid webhook signature");
    }

    fn mac(&self, id: &str, timestamp: &str, payload: &[u8]) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }
}
