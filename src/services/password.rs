// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing.
//!
//! New hashes are Argon2 PHC strings. Databases carried over from the older
//! deployment may still hold `pbkdf2:<digest>[:<iterations>]$<salt>$<hex>`
//! hashes; those verify here and are replaced with Argon2 on the next login.

use argon2::{
    password_hash::{Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier},
    password_hash::SaltString,
    Argon2,
};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;

const SALT_LEN: usize = 16;

/// Iteration count assumed when a legacy PBKDF2 hash omits it.
const LEGACY_PBKDF2_ITERATIONS: u32 = 600_000;

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let mut salt_bytes = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt_bytes)
        .map_err(|_| anyhow::anyhow!("System RNG unavailable"))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| anyhow::anyhow!("Salt encoding failed: {}", e))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Check a password against a stored hash.
///
/// A wrong password is `Ok(false)`; a malformed or unsupported stored hash is
/// an error.
pub fn verify_password(password: &str, hashed: &str) -> anyhow::Result<bool> {
    if hashed.starts_with("pbkdf2:") {
        return verify_legacy_pbkdf2(password, hashed);
    }

    let parsed =
        PasswordHash::new(hashed).map_err(|e| anyhow::anyhow!("Invalid hash format: {}", e))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e)),
    }
}

/// True when the stored hash should be replaced with a fresh Argon2 hash.
pub fn needs_rehash(hashed: &str) -> bool {
    !hashed.starts_with("$argon2")
}

fn verify_legacy_pbkdf2(password: &str, hashed: &str) -> anyhow::Result<bool> {
    let mut parts = hashed.splitn(3, '$');
    let (method, salt, hex_hash) = match (parts.next(), parts.next(), parts.next()) {
        (Some(m), Some(s), Some(h)) => (m, s, h),
        _ => anyhow::bail!("Invalid PBKDF2 hash format"),
    };

    let mut method_parts = method.split(':').skip(1);
    let algorithm = match method_parts.next() {
        Some("sha256") => pbkdf2::PBKDF2_HMAC_SHA256,
        Some("sha512") => pbkdf2::PBKDF2_HMAC_SHA512,
        Some("sha1") => pbkdf2::PBKDF2_HMAC_SHA1,
        other => anyhow::bail!("Unsupported PBKDF2 digest: {:?}", other),
    };
    let iterations = match method_parts.next() {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid PBKDF2 iteration count: {:?}", raw))?,
        None => LEGACY_PBKDF2_ITERATIONS,
    };
    let iterations = NonZeroU32::new(iterations)
        .ok_or_else(|| anyhow::anyhow!("PBKDF2 iteration count must be positive"))?;

    let expected =
        hex::decode(hex_hash).map_err(|e| anyhow::anyhow!("Invalid PBKDF2 digest: {}", e))?;
    if expected.is_empty() {
        anyhow::bail!("Empty PBKDF2 digest");
    }

    Ok(pbkdf2::verify(
        algorithm,
        iterations,
        salt.as_bytes(),
        password.as_bytes(),
        &expected,
    )
    .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hashed = hash_password("correct horse").unwrap();
        assert!(hashed.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hashed).unwrap());
        assert!(!verify_password("battery staple", &hashed).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("pw", "not-a-phc-string").is_err());
        assert!(verify_password("pw", "pbkdf2:md5:1000$salt$00").is_err());
        assert!(verify_password("pw", "pbkdf2:sha256:zero$salt$00").is_err());
        assert!(verify_password("pw", "pbkdf2:sha256:1000$salt$nothex").is_err());
        assert!(verify_password("pw", "scrypt:32768:8:1$salt$00").is_err());
    }

    #[test]
    fn test_verify_legacy_pbkdf2_hashes() {
        let sha256 = "pbkdf2:sha256:1000$abcdEFGH12345678$\
            23020f6dff74af118c3b2dc604bb06caab6760b10a752c60206a7d790c9e94a5";
        assert!(verify_password("hunter22", sha256).unwrap());
        assert!(!verify_password("hunter23", sha256).unwrap());

        let sha512 = "pbkdf2:sha512:2000$NaCl$\
            64abc8a0bdd1052668b5a80386d5f88a8ead8bd66a114ed3c7f0007f83d89ee7\
            0be0e9b3e652f4fcf9e47071440d1a84216d81b5e6893eb98f14075dd023074a";
        assert!(verify_password("correct horse", sha512).unwrap());
        assert!(!verify_password("battery staple", sha512).unwrap());
    }

    #[test]
    fn test_needs_rehash() {
        assert!(needs_rehash("pbkdf2:sha256:1000$salt$00"));
        assert!(!needs_rehash(&hash_password("pw").unwrap()));
    }
}
