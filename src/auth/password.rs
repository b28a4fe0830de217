use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use tracing::{error, warn};

use crate::config::AppConfig;
use crate::error::ApiError;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Checks a candidate password and returns one message per violated rule.
pub fn validate_password(password: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "Must be at least {MIN_PASSWORD_LENGTH} characters long."
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Must contain at least one uppercase letter.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Must contain at least one lowercase letter.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Must contain at least one digit.".to_string());
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        errors.push("Must contain at least one special character (!@#$%^&* etc.).".to_string());
    }
    errors
}

/// Fails with a 400 listing every violated rule.
pub fn ensure_strong_password(password: &str) -> Result<(), ApiError> {
    let violations = validate_password(password);
    if violations.is_empty() {
        Ok(())
    } else {
        warn!("Password rejected: {} rule(s) violated", violations.len());
        Err(ApiError::bad_request_with_details(
            "Password does not meet requirements",
            violations,
        ))
    }
}

/// Hashes with Argon2id using the configured cost, off the async workers.
pub async fn hash_password(password: &str, config: &AppConfig) -> Result<String, ApiError> {
    let password = password.to_string();
    let (memory_kib, iterations) = (config.argon2_memory_kib, config.argon2_iterations);
    tokio::task::spawn_blocking(move || hash_with_cost(&password, memory_kib, iterations))
        .await
        .map_err(|e| {
            error!("Password hashing task failed: {}", e);
            ApiError::Internal(format!("Password hashing task failed: {e}"))
        })?
}

/// Verifies against a stored PHC string; the cost is read from the hash itself.
pub async fn verify_password(password: &str, stored_hash: &str) -> bool {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    match tokio::task::spawn_blocking(move || verify_against(&password, &stored_hash)).await {
        Ok(matches) => matches,
        Err(e) => {
            error!("Password verification task failed: {}", e);
            false
        }
    }
}

fn hash_with_cost(password: &str, memory_kib: u32, iterations: u32) -> Result<String, ApiError> {
    let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None).map_err(|e| {
        error!("Invalid argon2 parameters: {}", e);
        ApiError::Internal(format!("Invalid argon2 parameters: {e}"))
    })?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {e}")))
}

fn verify_against(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}
