use crate::core::types::{HashedPassword, Password, Token, TokenDigest};

use super::random::FromRandom;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

const ARGON2_PREFIX: &str = "$argon2";

#[derive(Debug)]
pub struct Salt(pub String);

pub trait HashTo: AsRef<str> {
    type HashedType;
}

impl HashTo for Password {
    type HashedType = HashedPassword;
}

pub struct HashingService {
    secret_key: String,
}

impl std::fmt::Debug for HashingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HashingService {{ ... }}")
    }
}

impl HashingService {
    pub fn with_secret_key(secret_key: String) -> Self {
        Self { secret_key }
    }

    fn get_config(&self) -> argon2::Config<'_> {
        let mut config = argon2::Config::default();
        config.secret = self.secret_key.as_bytes();
        config
    }

    pub fn hash<T, H>(&self, to_hash: &T) -> Result<H, argon2::Error>
    where
        T: HashTo<HashedType = H>,
        H: From<String>,
    {
        let salt = Salt::from_random();
        let hash = argon2::hash_encoded(
            to_hash.as_ref().as_bytes(),
            salt.0.as_bytes(),
            &self.get_config(),
        )?;

        Ok(hash.into())
    }

    pub fn verify<T, H>(&self, secret: &T, hashed: &H) -> Result<bool, argon2::Error>
    where
        T: HashTo<HashedType = H>,
        H: AsRef<str>,
    {
        argon2::verify_encoded_ext(
            hashed.as_ref(),
            secret.as_ref().as_bytes(),
            self.secret_key.as_bytes(),
            &[],
        )
    }

    /// Checks a presented password against a credential table entry, which
    /// may be an Argon2 encoded hash or a plain password.
    pub fn check_password(&self, presented: &Password, stored: &str) -> bool {
        if stored.starts_with(ARGON2_PREFIX) {
            self.verify(presented, &HashedPassword(stored.to_string()))
                .unwrap_or(false)
        } else {
            presented.as_ref() == stored
        }
    }

    /// Unsalted digest used to key stored records. Not a secret.
    pub fn digest<T: Token>(&self, token: &T) -> TokenDigest {
        use sha2::Digest;

        let digest = sha2::Sha256::digest(token.as_ref().as_bytes());
        URL_SAFE_NO_PAD.encode(digest).into()
    }
}
