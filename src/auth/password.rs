//! Argon2id password hashing. Both entry points run on the blocking pool.

use anyhow::{anyhow, Context};
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

fn argon2_error(what: &'static str) -> impl FnOnce(password_hash::Error) -> anyhow::Error {
    move |e| anyhow!("{what}: {e}")
}

fn hash_sync(plain: &[u8]) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain, &salt)
        .map(|h| h.to_string())
        .map_err(argon2_error("hash password"))
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is unusable.
fn verify_sync(plain: &[u8], stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(argon2_error("parse stored hash"))?;
    match Argon2::default().verify_password(plain, &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(argon2_error("verify password")(e)),
    }
}

/// PHC string for `plain` under a fresh random salt.
pub async fn hash_password(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_sync(plain.as_bytes()))
        .await
        .context("password hashing task failed")?
}

pub async fn verify_password(plain: String, stored: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_sync(plain.as_bytes(), &stored))
        .await
        .context("password verification task failed")?
}
