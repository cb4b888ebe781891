use anyhow::{Context, Result, anyhow};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::{Rng, distributions::Alphanumeric, rngs::OsRng};

pub const TEMPORARY_PASSWORD_LEN: usize = 12;

pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

pub fn verify_password(plain: &str, password_hash: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(password_hash).map_err(|err| anyhow!("invalid password hash: {err}"))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// [`hash_password`] on the blocking pool.
pub async fn spawn_hash_password(plain: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .context("password hashing task failed")?
}

pub async fn spawn_verify_password(plain: String, password_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &password_hash))
        .await
        .context("password verification task failed")?
}

pub fn generate_temporary_password() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TEMPORARY_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = hash_password("correct horse").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[tokio::test]
    async fn blocking_pool_variants_agree_with_inline_ones() {
        let hash = spawn_hash_password("correct horse".to_string()).await.unwrap();

        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(
            spawn_verify_password("correct horse".to_string(), hash.clone())
                .await
                .unwrap()
        );
        assert!(
            !spawn_verify_password("battery staple".to_string(), hash)
                .await
                .unwrap()
        );
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("anything", "plaintext").is_err());
    }

    #[test]
    fn temporary_passwords_are_alphanumeric_and_distinct() {
        let first = generate_temporary_password();
        let second = generate_temporary_password();

        assert_eq!(first.len(), TEMPORARY_PASSWORD_LEN);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }
}
