use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use crates::domain::value_objects::enums::visit_intents::VisitIntent;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

const ACCESS_TOKEN_TYPE: &str = "access";
const REFRESH_TOKEN_TYPE: &str = "refresh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTtl {
    Access,
    Refresh,
    Qr,
}

impl TokenTtl {
    pub fn duration(&self) -> Duration {
        match self {
            TokenTtl::Access => Duration::minutes(10),
            TokenTtl::Refresh => Duration::days(7),
            TokenTtl::Qr => Duration::seconds(60),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountClaims {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrClaims {
    pub uid: Uuid,
    pub mid: Uuid,
    #[serde(rename = "type")]
    pub intent: VisitIntent,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies every token the service hands out with one shared HMAC secret.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Only the HMAC family; anything else in the header is rejected before verification.
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue_access(
        &self,
        subject: &TokenSubject,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        self.issue_account(subject, ACCESS_TOKEN_TYPE, TokenTtl::Access, issued_at)
    }

    pub fn issue_refresh(
        &self,
        subject: &TokenSubject,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        self.issue_account(subject, REFRESH_TOKEN_TYPE, TokenTtl::Refresh, issued_at)
    }

    pub fn issue_qr(
        &self,
        user_id: Uuid,
        member_id: Uuid,
        intent: VisitIntent,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        let expires_at = issued_at + TokenTtl::Qr.duration();
        let claims = QrClaims {
            uid: user_id,
            mid: member_id,
            intent,
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
        };

        Ok(IssuedToken {
            token: self.sign(&claims)?,
            expires_at,
        })
    }

    pub fn validate_access(&self, token: &str) -> Result<AccountClaims, TokenError> {
        self.validate_account(token, ACCESS_TOKEN_TYPE)
    }

    pub fn validate_refresh(&self, token: &str) -> Result<AccountClaims, TokenError> {
        self.validate_account(token, REFRESH_TOKEN_TYPE)
    }

    pub fn validate_qr(&self, token: &str) -> Result<QrClaims, TokenError> {
        self.verify::<QrClaims>(token)
    }

    fn issue_account(
        &self,
        subject: &TokenSubject,
        token_type: &str,
        ttl: TokenTtl,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        let expires_at = issued_at + ttl.duration();
        let claims = AccountClaims {
            id: subject.user_id,
            email: subject.email.clone(),
            role: subject.role.clone(),
            token_type: token_type.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
        };

        Ok(IssuedToken {
            token: self.sign(&claims)?,
            expires_at,
        })
    }

    fn validate_account(&self, token: &str, token_type: &str) -> Result<AccountClaims, TokenError> {
        let claims = self.verify::<AccountClaims>(token)?;
        if claims.token_type != token_type {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .context("failed to sign token")
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        decode::<T>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}
