use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use tracing::{error, info};

use crate::notifications::dispatcher::EmailSender;

const RESEND_EMAILS_URL: &str = "https://api.resend.com/emails";

pub struct ResendClient {
    http: reqwest::Client,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

impl ResendClient {
    pub fn new(api_key: String, from_address: &str, from_name: Option<&str>) -> Self {
        let from = match from_name {
            Some(name) if !name.trim().is_empty() => format!("{} <{}>", name.trim(), from_address),
            _ => from_address.to_string(),
        };

        Self {
            http: reqwest::Client::new(),
            api_key,
            from,
        }
    }

    pub async fn send_email(&self, to: &str, subject: &str, text: &str) -> Result<()> {
        let body = SendEmailBody {
            from: &self.from,
            to: [to],
            subject,
            text,
        };

        let resp = self
            .http
            .post(RESEND_EMAILS_URL)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let response_body = resp.text().await.unwrap_or_default();
            error!(
                status = %status,
                response_body = %response_body,
                subject,
                "resend: send email failed"
            );
            anyhow::bail!("Resend API request failed (status {})", status);
        }

        info!(subject, "resend: email accepted");
        Ok(())
    }
}

pub fn checkout_email_body(checkout_url: &str) -> String {
    format!(
        "Thanks for joining!\n\n\
         Complete your membership payment here:\n{}\n\n\
         The link expires soon, so finish checkout at your earliest convenience.",
        checkout_url
    )
}

pub fn welcome_email_body(email: &str, password: &str, login_url: &str) -> String {
    format!(
        "Your membership is active.\n\n\
         Sign in at {}\n\
         Email: {}\n\
         Temporary password: {}\n\n\
         Please change your password after your first sign-in.",
        login_url, email, password
    )
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send_checkout_link(&self, to: &str, checkout_url: &str) -> Result<()> {
        self.send_email(
            to,
            "Complete your membership payment",
            &checkout_email_body(checkout_url),
        )
        .await
    }

    async fn send_welcome_credentials(
        &self,
        to: &str,
        password: &str,
        login_url: &str,
    ) -> Result<()> {
        self.send_email(
            to,
            "Welcome! Your account is ready",
            &welcome_email_body(to, password, login_url),
        )
        .await
    }
}
