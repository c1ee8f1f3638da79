use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::error::{Error, Result};

/// One-way hash for an employee credential. The raw password is never stored.
pub fn hash_password(plain: &str) -> Result<String> {
    if plain.is_empty() {
        return Err(Error::InvalidArgument("password must not be empty".into()));
    }
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(plain: &str, hashed: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hashed)?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_not_the_raw_password_and_verifies() {
        let hashed = hash_password("s3cret!").unwrap();
        assert_ne!(hashed, "s3cret!");
        assert!(hashed.starts_with("$argon2"));
        assert!(verify_password("s3cret!", &hashed).unwrap());
        assert!(!verify_password("wrong", &hashed).unwrap());
    }

    #[test]
    fn empty_password_is_rejected() {
        assert!(matches!(hash_password(""), Err(Error::InvalidArgument(_))));
    }
}
