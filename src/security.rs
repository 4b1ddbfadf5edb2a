use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::models::TokenClaim;

/// Hashes `password` into an argon2 PHC string with a fresh salt
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub fn verify_password(password: &str, hashed: &str) -> bool {
    match PasswordHash::new(hashed) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

/// Session lifetime bounds, in days
pub const MIN_SESSION_DAYS: i64 = 1;
pub const MAX_SESSION_DAYS: i64 = 365;

/// Random anti-forgery token, bound to one login session
pub fn new_csrf_token() -> String {
    SaltString::generate(&mut OsRng).as_str().to_owned()
}

/// Signs a session JWT for `email`. The lifetime is clamped to
/// [`MIN_SESSION_DAYS`]..=[`MAX_SESSION_DAYS`].
pub fn issue_session_token(
    email: &str,
    csrf: &str,
    secret: &str,
    maxage_days: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let lifetime = Duration::days(maxage_days.clamp(MIN_SESSION_DAYS, MAX_SESSION_DAYS));
    let exp = (now + lifetime).timestamp() as usize;

    let claims = TokenClaim {
        sub: email.to_owned(),
        csrf: csrf.to_owned(),
        iat,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn decode_session_token(
    token: &str,
    secret: &str,
) -> Result<TokenClaim, jsonwebtoken::errors::Error> {
    let data = decode::<TokenClaim>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hashed = hash_password("s3cret").unwrap();
        assert!(hashed.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hashed));
        assert!(!verify_password("wrong", &hashed));
        assert!(!verify_password("s3cret", "not a phc string"));
    }

    #[test]
    fn csrf_tokens_are_distinct() {
        let first = new_csrf_token();
        let second = new_csrf_token();
        assert!(!first.is_empty());
        assert_ne!(first, second);
    }

    #[test]
    fn session_token_carries_claims() {
        let token = issue_session_token("admin@admin.com", "tok", "secret", 7).unwrap();
        let claims = decode_session_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "admin@admin.com");
        assert_eq!(claims.csrf, "tok");
        assert!(claims.exp > claims.iat);

        assert!(decode_session_token(&token, "other-secret").is_err());
    }

    #[test]
    fn session_lifetime_is_clamped() {
        let token = issue_session_token("a@b.c", "tok", "secret", i64::MAX).unwrap();
        let claims = decode_session_token(&token, "secret").unwrap();
        let max = (MAX_SESSION_DAYS * 24 * 60 * 60) as usize;
        assert!(claims.exp - claims.iat <= max + 1);

        let token = issue_session_token("a@b.c", "tok", "secret", -5).unwrap();
        let claims = decode_session_token(&token, "secret").unwrap();
        assert!(claims.exp > claims.iat);
    }
}
